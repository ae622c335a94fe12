use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::onboarding::register_runner;
use crate::error::AppError;
use crate::models::profile::{Role, UserProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/runners", post(create_runner).get(list_runners))
}

#[derive(Deserialize)]
pub struct RegisterRunnerRequest {
    pub phone: String,
    pub name: String,
}

async fn create_runner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRunnerRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = register_runner(&state, &payload.phone, &payload.name)?;
    Ok(Json(profile))
}

async fn list_runners(State(state): State<Arc<AppState>>) -> Json<Vec<UserProfile>> {
    let runners = state
        .profiles
        .iter()
        .filter(|entry| entry.value().role == Role::Runner)
        .map(|entry| entry.value().clone())
        .collect();
    Json(runners)
}
