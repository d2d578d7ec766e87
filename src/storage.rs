use std::io::Cursor;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, timeout::TimeoutConfig, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use tracing::debug;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Formats accepted for recipe images.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// An image file received with a create or update request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub body: Bytes,
    pub content_type: String,
}

/// Location of an uploaded image: the public URL and the reference needed
/// to delete it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

impl ImageUpload {
    /// Builds an upload from raw file bytes. The format is detected from the
    /// magic bytes; the client-declared content type is not trusted.
    pub fn sniffed(body: Bytes) -> Result<Self, String> {
        let format = ImageReader::new(Cursor::new(body.as_ref()))
            .with_guessed_format()
            .map_err(|e| format!("Failed to read image: {e}"))?
            .format()
            .ok_or_else(|| "Could not detect image format".to_string())?;
        if !ALLOWED_FORMATS.contains(&format) {
            return Err(format!(
                "Unsupported image format: {format:?}. Allowed: JPEG, PNG, GIF, WebP"
            ));
        }
        Ok(Self {
            content_type: format.to_mime_type().to_string(),
            body,
        })
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> anyhow::Result<StoredImage>;
    async fn destroy(&self, public_id: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl Storage {
    pub async fn new(config: &StorageConfig, timeout: Duration) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                &config.access_key,
                &config.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&config.endpoint)
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for Storage {
    async fn upload(&self, image: ImageUpload) -> anyhow::Result<StoredImage> {
        let key = object_key(Uuid::new_v4(), &image.content_type);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image.body))
            .content_type(&image.content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {key}"))?;
        debug!(key = %key, "image uploaded");

        Ok(StoredImage {
            url: format!("{}/{}", self.public_url, key),
            public_id: key,
        })
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {public_id}"))?;
        debug!(key = %public_id, "image deleted");
        Ok(())
    }
}

fn object_key(id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("recipes/{id}.{ext}")
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
