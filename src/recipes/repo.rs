use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewRecipe, Recipe};

/// Recipe persistence. Every read and write is filtered by owner.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert(&self, recipe: NewRecipe) -> anyhow::Result<Recipe>;
    /// Oldest first.
    async fn list_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Recipe>>;
    async fn find_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Writes the mutable columns back; `None` when the row is gone.
    async fn save(&self, recipe: &Recipe) -> anyhow::Result<Option<Recipe>>;
    async fn delete_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>>;
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn insert(&self, recipe: NewRecipe) -> anyhow::Result<Recipe> {
        let NewRecipe {
            owner,
            fields,
            image,
        } = recipe;
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (
                id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                recipe_tags, recipe_special_diets, recipe_image, recipe_image_public, recipe_created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                      recipe_tags, recipe_special_diets, recipe_image, recipe_image_public,
                      recipe_created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.recipe_title)
        .bind(fields.recipe_description)
        .bind(fields.recipe_ingredients)
        .bind(fields.recipe_instructions)
        .bind(fields.recipe_tags)
        .bind(fields.recipe_special_diets)
        .bind(image.url)
        .bind(image.public_id)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                   recipe_tags, recipe_special_diets, recipe_image, recipe_image_public,
                   recipe_created_by, created_at, updated_at
              FROM recipes
             WHERE recipe_created_by = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list recipes by owner")?;
        Ok(rows)
    }

    async fn find_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                   recipe_tags, recipe_special_diets, recipe_image, recipe_image_public,
                   recipe_created_by, created_at, updated_at
              FROM recipes
             WHERE id = $1 AND recipe_created_by = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("find recipe")?;
        Ok(row)
    }

    async fn save(&self, recipe: &Recipe) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET recipe_title = $3,
                   recipe_description = $4,
                   recipe_ingredients = $5,
                   recipe_instructions = $6,
                   recipe_tags = $7,
                   recipe_special_diets = $8,
                   recipe_image = $9,
                   recipe_image_public = $10,
                   updated_at = now()
             WHERE id = $1 AND recipe_created_by = $2
            RETURNING id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                      recipe_tags, recipe_special_diets, recipe_image, recipe_image_public,
                      recipe_created_by, created_at, updated_at
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.recipe_created_by)
        .bind(&recipe.recipe_title)
        .bind(&recipe.recipe_description)
        .bind(&recipe.recipe_ingredients)
        .bind(&recipe.recipe_instructions)
        .bind(&recipe.recipe_tags)
        .bind(&recipe.recipe_special_diets)
        .bind(&recipe.recipe_image)
        .bind(&recipe.recipe_image_public)
        .fetch_optional(&self.db)
        .await
        .context("update recipe")?;
        Ok(row)
    }

    async fn delete_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            DELETE FROM recipes
             WHERE id = $1 AND recipe_created_by = $2
            RETURNING id, recipe_title, recipe_description, recipe_ingredients, recipe_instructions,
                      recipe_tags, recipe_special_diets, recipe_image, recipe_image_public,
                      recipe_created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("delete recipe")?;
        Ok(row)
    }
}
