// handlers/protected/logs.rs - /api/v1/logs/*

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::LogEntry;
use crate::database::Page;
use crate::middleware::{AdminAccess, ApiResponse, ApiResult, ValidatedQuery};
use crate::payload::SearchRequest;

use super::non_empty;

/// GET /api/v1/logs/getAll - audit rows, newest first
pub async fn get_all_logs(
    State(state): State<AppState>,
    _: AdminAccess,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<LogEntry>> {
    let page = state.services.logs.get_all_logs(search.page_request()).await?;
    Ok(ApiResponse::success(non_empty(page, "log entries")?))
}
