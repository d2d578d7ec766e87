use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{RecipeFields, RecipePatch},
    repo::RecipeStore,
    repo_types::{NewRecipe, Recipe},
};
use crate::{
    config::DefaultImage,
    error::{AppError, AppResult},
    storage::{ImageStore, ImageUpload, StoredImage},
};

/// Owner-scoped recipe operations, including the lifecycle of the image
/// asset each recipe points at.
pub struct RecipeService {
    store: Arc<dyn RecipeStore>,
    images: Arc<dyn ImageStore>,
    default_image: DefaultImage,
}

impl RecipeService {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        images: Arc<dyn ImageStore>,
        default_image: DefaultImage,
    ) -> Self {
        Self {
            store,
            images,
            default_image,
        }
    }

    #[instrument(skip(self, fields, upload), fields(has_image = upload.is_some()))]
    pub async fn create_manual(
        &self,
        owner: &str,
        fields: RecipeFields,
        upload: Option<ImageUpload>,
    ) -> AppResult<Recipe> {
        const CONTEXT: &str = "Error uploading image or creating recipe";
        let fields = fields.validate()?;

        let (image, uploaded) = match upload {
            Some(upload) => {
                let stored = self
                    .images
                    .upload(upload)
                    .await
                    .map_err(AppError::persistence(CONTEXT))?;
                (stored, true)
            }
            None => (self.default_stored(), false),
        };

        let new = NewRecipe {
            owner: owner.to_string(),
            fields,
            image: image.clone(),
        };
        match self.store.insert(new).await {
            Ok(recipe) => {
                info!(recipe_id = %recipe.id, "recipe created");
                Ok(recipe)
            }
            Err(e) => {
                if uploaded {
                    self.discard_image(&image.public_id).await;
                }
                Err(AppError::persistence(CONTEXT)(e))
            }
        }
    }

    #[instrument(skip(self, fields))]
    pub async fn create_from_generated(&self, owner: &str, fields: RecipeFields) -> AppResult<Recipe> {
        let fields = fields.validate()?;
        let new = NewRecipe {
            owner: owner.to_string(),
            fields,
            image: self.default_stored(),
        };
        let recipe = self
            .store
            .insert(new)
            .await
            .map_err(AppError::persistence("Error creating recipe"))?;
        info!(recipe_id = %recipe.id, "generated recipe saved");
        Ok(recipe)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner: &str) -> AppResult<Vec<Recipe>> {
        self.store
            .list_by_owner(owner)
            .await
            .map_err(AppError::persistence("Error retrieving recipes"))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, owner: &str, id: &str) -> AppResult<Recipe> {
        self.load_owned(owner, id, "Error retrieving recipe").await
    }

    /// Merges `patch` into the owned recipe. A new image replaces the old
    /// pair; the old asset is removed only once the save went through.
    #[instrument(skip(self, patch, upload), fields(has_image = upload.is_some()))]
    pub async fn update(
        &self,
        owner: &str,
        id: &str,
        patch: RecipePatch,
        upload: Option<ImageUpload>,
    ) -> AppResult<Recipe> {
        const CONTEXT: &str = "Error updating recipe";
        let patch = patch.validate()?;
        let mut recipe = self.load_owned(owner, id, CONTEXT).await?;

        let mut replaced: Option<String> = None;
        let mut fresh: Option<String> = None;
        if let Some(upload) = upload {
            let stored = self
                .images
                .upload(upload)
                .await
                .map_err(AppError::persistence(CONTEXT))?;
            replaced = Some(std::mem::replace(
                &mut recipe.recipe_image_public,
                stored.public_id.clone(),
            ));
            recipe.recipe_image = stored.url;
            fresh = Some(stored.public_id);
        }

        patch.apply_to(&mut recipe);

        let saved = match self.store.save(&recipe).await {
            Ok(Some(saved)) => saved,
            Ok(None) => {
                if let Some(public_id) = &fresh {
                    self.discard_image(public_id).await;
                }
                return Err(AppError::NotFound);
            }
            Err(e) => {
                if let Some(public_id) = &fresh {
                    self.discard_image(public_id).await;
                }
                return Err(AppError::persistence(CONTEXT)(e));
            }
        };

        if let Some(old) = replaced {
            self.discard_image(&old).await;
        }
        info!(recipe_id = %saved.id, "recipe updated");
        Ok(saved)
    }

    /// Removes the owned recipe and then its image asset.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner: &str, id: &str) -> AppResult<()> {
        let id = parse_id(id)?;
        let deleted = self
            .store
            .delete_owned(owner, id)
            .await
            .map_err(AppError::persistence("Error deleting recipe"))?
            .ok_or(AppError::NotFound)?;

        self.discard_image(&deleted.recipe_image_public).await;
        info!(recipe_id = %deleted.id, "recipe deleted");
        Ok(())
    }

    async fn load_owned(&self, owner: &str, id: &str, context: &'static str) -> AppResult<Recipe> {
        let id = parse_id(id)?;
        self.store
            .find_owned(owner, id)
            .await
            .map_err(AppError::persistence(context))?
            .ok_or(AppError::NotFound)
    }

    fn default_stored(&self) -> StoredImage {
        StoredImage {
            url: self.default_image.url.clone(),
            public_id: self.default_image.public_id.clone(),
        }
    }

    /// Best-effort asset removal; the placeholder is shared and never removed.
    async fn discard_image(&self, public_id: &str) {
        if public_id.is_empty() || public_id == self.default_image.public_id {
            return;
        }
        if let Err(e) = self.images.destroy(public_id).await {
            warn!(error = ?e, public_id, "failed to delete image asset");
        }
    }
}

/// Malformed ids cannot name an existing recipe.
fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::NotFound)
}
