use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::ai::{BingImageSearch, GenerationSettings, OpenAiClient, RecipeGenerator};
use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::recipes::{repo::PgRecipeStore, services::RecipeService};
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub recipes: Arc<RecipeService>,
    pub generator: Arc<RecipeGenerator>,
}

impl AppState {
    /// Wires the real clients from configuration. Returns the pool as well
    /// so the caller can run migrations.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = Storage::new(&config.storage, config.upstream_timeout).await?;

        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("build http client")?;

        let recipes = RecipeService::new(
            Arc::new(PgRecipeStore::new(db.clone())),
            Arc::new(storage),
            config.default_image.clone(),
        );
        let generator = RecipeGenerator::new(
            Arc::new(OpenAiClient::new(http.clone(), &config.openai)),
            Arc::new(BingImageSearch::new(http, &config.image_search)),
            GenerationSettings::from_config(config),
        );

        Ok((
            Self::from_parts(JwtKeys::from_config(&config.jwt), recipes, generator),
            db,
        ))
    }

    pub fn from_parts(jwt: JwtKeys, recipes: RecipeService, generator: RecipeGenerator) -> Self {
        Self {
            jwt,
            recipes: Arc::new(recipes),
            generator: Arc::new(generator),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
