//! Token refresh.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::Result;
use crate::routes::ApiJson;
use crate::services::auth::{AuthService, TokenPair};
use crate::state::AppState;

/// Body of `POST /auth/token/refresh`.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Exchange a refresh token for a new token pair.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = AuthService::new(state.pool(), state.tokens())
        .refresh(&request.refresh)
        .await?;

    Ok(Json(tokens))
}
