// handlers/protected/employee.rs - /api/v1/employee/*

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{AdminAccess, ApiResponse, ApiResult, Params, ReadAccess, ValidatedJson};
use crate::payload::request::IdParam;
use crate::payload::{EmployeeRequest, EmployeeResponse, EmployeeUpdateResponse};

/// GET /api/v1/employee/get?id
pub async fn get_employee(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<EmployeeResponse> {
    let employee = state.services.employees.get_employee_by_id(params.get()?).await?;
    Ok(ApiResponse::success(employee))
}

/// GET /api/v1/employee/getAll
pub async fn get_all_employees(State(state): State<AppState>, _: ReadAccess) -> ApiResult<Vec<EmployeeResponse>> {
    let employees = state.services.employees.get_all_employees().await?;
    if employees.is_empty() {
        return Err(ApiError::not_found("No employees found"));
    }
    Ok(ApiResponse::success(employees))
}

/// DELETE /api/v1/employee/delete?id
pub async fn delete_employee(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<Value> {
    let id = params.get()?;
    state.services.employees.delete_employee(id).await?;
    Ok(ApiResponse::deleted(id))
}

/// POST /api/v1/employee/create
pub async fn create_employee(
    State(state): State<AppState>,
    _: AdminAccess,
    ValidatedJson(request): ValidatedJson<EmployeeRequest>,
) -> ApiResult<EmployeeResponse> {
    let employee = state.services.employees.create_employee(request).await?;
    Ok(ApiResponse::created(employee))
}

/// PUT /api/v1/employee/update?id
pub async fn update_employee(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
    ValidatedJson(request): ValidatedJson<EmployeeRequest>,
) -> ApiResult<EmployeeUpdateResponse> {
    let employee = state.services.employees.update_employee(params.get()?, request).await?;
    Ok(ApiResponse::success(employee))
}
