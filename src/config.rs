use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_IMAGE_URL: &str =
    "https://res.cloudinary.com/djidbbhk1/image/upload/v1693072469/default_image_lv6ume.png";
pub const DEFAULT_IMAGE_PUBLIC_ID: &str = "default_image_lv6ume";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSearchConfig {
    pub api_key: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_url: String,
}

/// Placeholder attached to recipes that have no uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultImage {
    pub url: String,
    pub public_id: String,
}

impl Default for DefaultImage {
    fn default() -> Self {
        Self {
            url: DEFAULT_IMAGE_URL.into(),
            public_id: DEFAULT_IMAGE_PUBLIC_ID.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub openai: OpenAiConfig,
    pub image_search: ImageSearchConfig,
    pub storage: StorageConfig,
    pub default_image: DefaultImage,
    pub upstream_timeout: Duration,
    /// Return generated recipes without an image when the image lookup fails.
    pub image_optional: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").ok(),
            audience: std::env::var("JWT_AUDIENCE").ok(),
        };
        let openai = OpenAiConfig {
            api_key: required("OPENAI_API_KEY")?,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            temperature: parsed("OPENAI_TEMPERATURE").unwrap_or(0.4),
            max_tokens: parsed("OPENAI_MAX_TOKENS").unwrap_or(750),
        };
        let image_search = ImageSearchConfig {
            api_key: required("BING_IMAGE_SEARCH_API_KEY")?,
            endpoint: std::env::var("BING_IMAGE_SEARCH_ENDPOINT")
                .unwrap_or_else(|_| "https://api.bing.microsoft.com/v7.0/images/search".into()),
        };

        let endpoint = required("S3_ENDPOINT")?;
        let bucket = required("S3_BUCKET")?;
        let public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| {
            format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
        });
        let storage = StorageConfig {
            access_key: required("S3_ACCESS_KEY")?,
            secret_key: required("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            endpoint,
            bucket,
            public_url,
        };

        let fallback = DefaultImage::default();
        let default_image = DefaultImage {
            url: std::env::var("DEFAULT_IMAGE_URL").unwrap_or(fallback.url),
            public_id: std::env::var("DEFAULT_IMAGE_PUBLIC_ID").unwrap_or(fallback.public_id),
        };

        Ok(Self {
            database_url,
            jwt,
            openai,
            image_search,
            storage,
            default_image,
            upstream_timeout: Duration::from_secs(parsed("UPSTREAM_TIMEOUT_SECS").unwrap_or(30)),
            image_optional: parsed("RECIPE_IMAGE_OPTIONAL").unwrap_or(false),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
