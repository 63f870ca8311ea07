// handlers/public/auth.rs - POST /api/auth/login handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::payload::{JwtAuthResponse, LoginRequest};

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// Unknown users and wrong passwords both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<JwtAuthResponse> {
    let token = state.services.auth.login(request).await?;
    Ok(ApiResponse::success(token))
}
