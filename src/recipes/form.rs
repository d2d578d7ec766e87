use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::dto::LIST_FIELDS;
use crate::{
    error::{AppError, AppResult},
    storage::ImageUpload,
};

/// Recipe fields from either a JSON body or a multipart form, plus the
/// optional image file. The file stays in memory and is dropped with the
/// request; anything that is not a JPEG, PNG, GIF or WebP is refused.
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub fields: Map<String, Value>,
    pub image: Option<ImageUpload>,
}

impl RecipeForm {
    pub fn into_parts<T: DeserializeOwned>(self) -> AppResult<(T, Option<ImageUpload>)> {
        let payload = serde_json::from_value(Value::Object(self.fields))
            .map_err(|e| AppError::Validation(format!("Invalid recipe fields: {e}")))?;
        Ok((payload, self.image))
    }
}

#[async_trait]
impl<S> FromRequest<S> for RecipeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(fields) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(Self {
                fields,
                image: None,
            });
        }

        let mut mp = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut form = Self::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                // browsers send an empty part when no file was picked
                if !body.is_empty() {
                    form.image = Some(ImageUpload::sniffed(body).map_err(AppError::Validation)?);
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            insert_text_field(&mut form.fields, &name, text)?;
        }

        Ok(form)
    }
}

/// Adds one multipart text part. List fields accumulate across repeated
/// parts (`name` or `name[]`) and also accept a JSON array string.
fn insert_text_field(fields: &mut Map<String, Value>, name: &str, text: String) -> AppResult<()> {
    let name = name.trim_end_matches("[]");
    if name.is_empty() {
        return Ok(());
    }

    if !LIST_FIELDS.contains(&name) {
        fields.insert(name.to_string(), Value::String(text));
        return Ok(());
    }

    let items: Vec<Value> = if text.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<String>>(&text)
            .map_err(|e| AppError::Validation(format!("{name} must be a list of strings: {e}")))?
            .into_iter()
            .map(Value::String)
            .collect()
    } else {
        vec![Value::String(text)]
    };

    match fields
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(list) => list.extend(items),
        other => *other = Value::Array(items),
    }
    Ok(())
}
