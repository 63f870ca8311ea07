// handlers/protected/device.rs - /api/v1/device/*

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::Device;
use crate::database::Page;
use crate::middleware::{AdminAccess, ApiResponse, ApiResult, Params, ReadAccess, ValidatedJson, ValidatedQuery};
use crate::payload::request::{required, DateRangeParam, IdParam, ItemNameParam, RateTypeParam, TypeParam};
use crate::payload::{DeviceRequest, SearchRequest, SortRequest};

use super::non_empty;

const DEVICES: &str = "devices";

/// POST /api/v1/device/create
pub async fn create_device(
    State(state): State<AppState>,
    _: AdminAccess,
    ValidatedJson(request): ValidatedJson<DeviceRequest>,
) -> ApiResult<Device> {
    let device = state.services.devices.create_device(request.to_draft()?).await?;
    Ok(ApiResponse::created(device))
}

/// GET /api/v1/device/get?id
pub async fn get_device(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<Device> {
    let device = state.services.devices.get_device_by_id(params.get()?).await?;
    Ok(ApiResponse::success(device))
}

/// GET /api/v1/device/getAll
pub async fn get_all_devices(
    State(state): State<AppState>,
    _: ReadAccess,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<Device>> {
    let page = state.services.devices.get_all_devices(search.page_request()).await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// GET /api/v1/device/getDevicesSortBy?sortString&sortDirection
pub async fn get_devices_sort_by(
    State(state): State<AppState>,
    _: ReadAccess,
    ValidatedQuery(sort): ValidatedQuery<SortRequest>,
) -> ApiResult<Page<Device>> {
    let page = state
        .services
        .devices
        .get_devices_sorted_by(sort.page_request::<Device>()?)
        .await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// GET /api/v1/device/findByItemName?itemName
pub async fn find_by_item_name(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<ItemNameParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<Device>> {
    let item_name = required(params.item_name, "itemName")?;
    let page = state
        .services
        .devices
        .find_device_by_item_name(&item_name, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// GET /api/v1/device/findByCreatedDate?startDate&endDate
pub async fn find_by_created_date(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<DateRangeParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<Device>> {
    let (start, end) = params.range()?;
    let page = state
        .services
        .devices
        .find_device_by_date(start, end, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// GET /api/v1/device/findByType?type
pub async fn find_by_type(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<TypeParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<Device>> {
    let page = state
        .services
        .devices
        .find_device_by_type(params.get()?, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// GET /api/v1/device/findByRateType?rateType
pub async fn find_by_rate_type(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<RateTypeParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<Device>> {
    let page = state
        .services
        .devices
        .find_device_by_rate_type(params.get()?, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, DEVICES)?))
}

/// PUT /api/v1/device/update?id
pub async fn update_device(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
    ValidatedJson(request): ValidatedJson<DeviceRequest>,
) -> ApiResult<Device> {
    let device = state
        .services
        .devices
        .update_device(params.get()?, request.to_draft()?)
        .await?;
    Ok(ApiResponse::success(device))
}

/// DELETE /api/v1/device/delete?id
pub async fn delete_device(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<Value> {
    let id = params.get()?;
    state.services.devices.delete_device(id).await?;
    Ok(ApiResponse::deleted(id))
}
