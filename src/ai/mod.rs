//! Recipe generation: prompt construction, the language-model and
//! image-search clients, and the orchestrator that sequences them.

pub mod generator;
pub mod image_search;
pub mod openai;
pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use generator::{GenerationSettings, RecipeGenerator};
pub use image_search::{BingImageSearch, ImageHit, ImageSearch};
pub use openai::{ChatCompletions, OpenAiClient};

/// Failure of an outbound call to a third-party provider.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        source: reqwest::Error,
    },

    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("malformed {provider} response: {reason}")]
    Parse {
        provider: &'static str,
        reason: String,
    },
}

/// Recipe returned by the language model through the `create_recipe`
/// function call. Keys the model left out stay out of the response; fields
/// the schema does not name are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_diets: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A generated recipe with the image found for it; `image` is empty when
/// the search had no hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipeResponse {
    #[serde(flatten)]
    pub recipe: GeneratedRecipe,
    #[serde(default)]
    pub image: String,
}
