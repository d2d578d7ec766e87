use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    openai::ChatResponse, prompt, ChatCompletions, GeneratedRecipe, GeneratedRecipeResponse,
    ImageSearch, UpstreamError,
};
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// When set, an image-search failure yields an empty `image` instead of
    /// failing the whole generation.
    pub image_optional: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: 0.4,
            max_tokens: 750,
            image_optional: false,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.openai.model.clone(),
            temperature: config.openai.temperature,
            max_tokens: config.openai.max_tokens,
            image_optional: config.image_optional,
        }
    }
}

pub struct RecipeGenerator {
    chat: Arc<dyn ChatCompletions>,
    images: Arc<dyn ImageSearch>,
    settings: GenerationSettings,
}

impl RecipeGenerator {
    pub fn new(
        chat: Arc<dyn ChatCompletions>,
        images: Arc<dyn ImageSearch>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            chat,
            images,
            settings,
        }
    }

    /// Asks the model for a recipe and attaches the first matching image.
    /// Each provider is called at most once.
    #[instrument(skip(self, options), fields(options = options.len()))]
    pub async fn generate(
        &self,
        query: &str,
        options: &[String],
    ) -> AppResult<GeneratedRecipeResponse> {
        if query.trim().is_empty() {
            return Err(AppError::Validation("Please provide a query.".into()));
        }

        let request = prompt::chat_request(query, options, &self.settings);
        let response = self.chat.create(&request).await?;
        let mut recipe = parse_recipe(&response)?;

        let image = self.find_image(&recipe).await?;
        recipe.extra.remove("image");
        info!(title = %recipe.title, has_image = !image.is_empty(), "recipe generated");

        Ok(GeneratedRecipeResponse { recipe, image })
    }

    async fn find_image(&self, recipe: &GeneratedRecipe) -> Result<String, UpstreamError> {
        let query = prompt::image_search_query(recipe);
        match self.images.search(&query).await {
            Ok(hits) => Ok(hits
                .into_iter()
                .next()
                .map(|hit| hit.content_url)
                .unwrap_or_default()),
            Err(e) if self.settings.image_optional => {
                warn!(error = %e, "image search failed; returning recipe without image");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

fn parse_recipe(response: &ChatResponse) -> Result<GeneratedRecipe, UpstreamError> {
    let arguments = response
        .function_arguments()
        .ok_or_else(|| UpstreamError::Parse {
            provider: "openai",
            reason: "first choice has no function call".into(),
        })?;
    serde_json::from_str(arguments).map_err(|e| UpstreamError::Parse {
        provider: "openai",
        reason: e.to_string(),
    })
}
