// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/v1/*
// Middleware: request log → JWT validation, then a role gate extractor per handler

pub mod borrowing;
pub mod device;
pub mod employee;
pub mod logs;

use crate::database::Page;
use crate::error::ApiError;

/// Empty pages are reported as 404, the same way empty lists are
pub(crate) fn non_empty<T>(page: Page<T>, what: &str) -> Result<Page<T>, ApiError> {
    if page.is_empty() {
        return Err(ApiError::not_found(format!("No {} found", what)));
    }
    Ok(page)
}
