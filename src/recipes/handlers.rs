use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        AiRecipeQuery, CreatedRecipeResponse, MessageResponse, RecipeFields, RecipeListResponse,
        RecipePatch, SavedAiRecipeResponse,
    },
    form::RecipeForm,
    repo_types::Recipe,
    transform::transform_generated,
};
use crate::{
    ai::{GeneratedRecipe, GeneratedRecipeResponse},
    auth::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// --- public routers ---

pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/recipes/ai", post(generate_recipe))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/ai/save", post(save_generated_recipe))
        .route(
            "/recipes/:id",
            axum::routing::put(update_recipe).delete(delete_recipe),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

// --- handlers ---

/// POST /recipes/ai { query, optionValues[] }
#[instrument(skip(state, payload))]
pub async fn generate_recipe(
    State(state): State<AppState>,
    payload: Result<Json<AiRecipeQuery>, JsonRejection>,
) -> AppResult<Json<GeneratedRecipeResponse>> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let recipe = state
        .generator
        .generate(&body.query, &body.option_values)
        .await?;
    Ok(Json(recipe))
}

/// POST /recipes/ai/save, body is a recipe returned by /recipes/ai
#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn save_generated_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<GeneratedRecipe>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SavedAiRecipeResponse>)> {
    let Json(generated) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let recipe = state
        .recipes
        .create_from_generated(&user.user_id, transform_generated(generated))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SavedAiRecipeResponse {
            data: recipe,
            message: "Recipe created successfully",
        }),
    ))
}

/// POST /recipes (JSON or multipart with an optional image file)
#[instrument(skip(state, user, form), fields(user_id = %user.user_id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    form: RecipeForm,
) -> AppResult<(StatusCode, Json<CreatedRecipeResponse>)> {
    let (fields, image) = form.into_parts::<RecipeFields>()?;
    let recipe = state
        .recipes
        .create_manual(&user.user_id, fields, image)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedRecipeResponse { recipe })))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_recipes(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<RecipeListResponse>> {
    let recipes = state.recipes.list(&user.user_id).await?;
    info!(count = recipes.len(), "recipes listed");
    Ok(Json(RecipeListResponse {
        count: recipes.len(),
        recipes,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(state.recipes.get(&user.user_id, &id).await?))
}

/// PUT /recipes/:id (JSON or multipart with an optional replacement image)
#[instrument(skip(state, user, form), fields(user_id = %user.user_id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    form: RecipeForm,
) -> AppResult<Json<Recipe>> {
    let (patch, image) = form.into_parts::<RecipePatch>()?;
    let recipe = state
        .recipes
        .update(&user.user_id, &id, patch, image)
        .await?;
    Ok(Json(recipe))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.recipes.delete(&user.user_id, &id).await?;
    Ok(Json(MessageResponse {
        message: "Recipe deleted successfully",
    }))
}
