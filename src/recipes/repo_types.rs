use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::RecipeFields;
use crate::storage::StoredImage;

/// Recipe record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub recipe_title: String,
    pub recipe_description: Option<String>,
    pub recipe_ingredients: Vec<String>,
    pub recipe_instructions: Vec<String>,
    pub recipe_tags: Vec<String>,
    pub recipe_special_diets: Vec<String>,
    pub recipe_image: String,        // public URL
    pub recipe_image_public: String, // storage reference, paired with recipe_image
    pub recipe_created_by: String,   // owner, never changes
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Everything needed to insert a recipe; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub owner: String,
    pub fields: RecipeFields,
    pub image: StoredImage,
}
