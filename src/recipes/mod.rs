pub mod dto;
pub mod form;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod transform;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::generate_routes())
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
