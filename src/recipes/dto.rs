use serde::{Deserialize, Serialize};

use super::repo_types::Recipe;
use crate::error::{AppError, AppResult};

/// Fields that hold lists; multipart bodies may repeat them or send a JSON
/// array string.
pub const LIST_FIELDS: &[&str] = &[
    "recipeIngredients",
    "recipeInstructions",
    "recipeTags",
    "recipeSpecialDiets",
];

/// Request body for `POST /recipes/ai`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecipeQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub option_values: Vec<String>,
}

/// Client-editable recipe fields used on create. Owner and image fields are
/// not accepted from clients.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFields {
    pub recipe_title: String,
    #[serde(default)]
    pub recipe_description: Option<String>,
    pub recipe_ingredients: Vec<String>,
    pub recipe_instructions: Vec<String>,
    #[serde(default)]
    pub recipe_tags: Vec<String>,
    #[serde(default)]
    pub recipe_special_diets: Vec<String>,
}

impl RecipeFields {
    pub fn validate(mut self) -> AppResult<Self> {
        self.recipe_title = self.recipe_title.trim().to_string();
        if self.recipe_title.is_empty() {
            return Err(AppError::Validation("Recipe title cannot be empty".into()));
        }
        Ok(self)
    }
}

/// Partial update. `None` leaves the stored value alone; a present list
/// replaces the stored one, so an empty list clears it. The same goes for
/// an empty description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    pub recipe_title: Option<String>,
    pub recipe_description: Option<String>,
    pub recipe_ingredients: Option<Vec<String>>,
    pub recipe_instructions: Option<Vec<String>>,
    pub recipe_tags: Option<Vec<String>>,
    pub recipe_special_diets: Option<Vec<String>>,
}

impl RecipePatch {
    pub fn validate(mut self) -> AppResult<Self> {
        if let Some(title) = self.recipe_title.take() {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("Recipe title cannot be empty".into()));
            }
            self.recipe_title = Some(title);
        }
        Ok(self)
    }

    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(tags) = self.recipe_tags {
            recipe.recipe_tags = tags;
        }
        if let Some(diets) = self.recipe_special_diets {
            recipe.recipe_special_diets = diets;
        }
        if let Some(title) = self.recipe_title {
            recipe.recipe_title = title;
        }
        // an empty description clears it
        if let Some(description) = self.recipe_description {
            let description = description.trim();
            recipe.recipe_description =
                (!description.is_empty()).then(|| description.to_string());
        }
        if let Some(ingredients) = self.recipe_ingredients {
            recipe.recipe_ingredients = ingredients;
        }
        if let Some(instructions) = self.recipe_instructions {
            recipe.recipe_instructions = instructions;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedRecipeResponse {
    pub recipe: Recipe,
}

#[derive(Debug, Serialize)]
pub struct SavedAiRecipeResponse {
    pub data: Recipe,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<Recipe>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
