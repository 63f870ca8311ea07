// handlers/protected/borrowing.rs - /api/v1/borrowing/*

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::database::Page;
use crate::middleware::{AdminAccess, ApiResponse, ApiResult, Params, ReadAccess, ValidatedJson, ValidatedQuery};
use crate::payload::request::{required, DateRangeParam, IdParam, ItemNameParam, TotalPriceParam, TransferParams, TypeParam};
use crate::payload::{BorrowingRequest, BorrowingResponse, SearchRequest, SortRequest};

use super::non_empty;

const BORROWINGS: &str = "borrowings";

/// GET /api/v1/borrowing/get?id
pub async fn get_borrowing(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<BorrowingResponse> {
    let borrowing = state.services.borrowings.get_borrowing_by_id(params.get()?).await?;
    Ok(ApiResponse::success(borrowing))
}

/// GET /api/v1/borrowing/getAll
pub async fn get_all_borrowings(
    State(state): State<AppState>,
    _: ReadAccess,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let page = state.services.borrowings.get_all_borrowing(search.page_request()).await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// GET /api/v1/borrowing/getBorrowingsSortedBy?sortString&sortDirection
pub async fn get_borrowings_sorted_by(
    State(state): State<AppState>,
    _: ReadAccess,
    ValidatedQuery(sort): ValidatedQuery<SortRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let page = state
        .services
        .borrowings
        .get_borrowings_sorted_by(sort.page_request::<BorrowingResponse>()?)
        .await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// DELETE /api/v1/borrowing/delete?id
pub async fn delete_borrowing(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
) -> ApiResult<Value> {
    let id = params.get()?;
    state.services.borrowings.delete_borrowing(id).await?;
    Ok(ApiResponse::deleted(id))
}

/// POST /api/v1/borrowing/create
pub async fn create_borrowing(
    State(state): State<AppState>,
    _: AdminAccess,
    ValidatedJson(request): ValidatedJson<BorrowingRequest>,
) -> ApiResult<BorrowingResponse> {
    let borrowing = state.services.borrowings.create_borrowing(request).await?;
    Ok(ApiResponse::created(borrowing))
}

/// PUT /api/v1/borrowing/update?id
pub async fn update_borrowing(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<IdParam>,
    ValidatedJson(request): ValidatedJson<BorrowingRequest>,
) -> ApiResult<BorrowingResponse> {
    let borrowing = state
        .services
        .borrowings
        .update_borrowing(params.get()?, request)
        .await?;
    Ok(ApiResponse::success(borrowing))
}

/// GET /api/v1/borrowing/findByItemName?itemName
pub async fn find_by_item_name(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<ItemNameParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let item_name = required(params.item_name, "itemName")?;
    let page = state
        .services
        .borrowings
        .find_by_device_name(&item_name, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// GET /api/v1/borrowing/findByHandOverDate?startDate&endDate
pub async fn find_by_hand_over_date(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<DateRangeParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let (start, end) = params.range()?;
    let page = state
        .services
        .borrowings
        .find_by_hand_over_date(start, end, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// GET /api/v1/borrowing/findByItemType?type
pub async fn find_by_item_type(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<TypeParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let page = state
        .services
        .borrowings
        .find_by_device_type(params.get()?, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// GET /api/v1/borrowing/findByTotalPrice?totalPrice
pub async fn find_by_total_price(
    State(state): State<AppState>,
    _: ReadAccess,
    Params(params): Params<TotalPriceParam>,
    ValidatedQuery(search): ValidatedQuery<SearchRequest>,
) -> ApiResult<Page<BorrowingResponse>> {
    let total_price = required(params.total_price, "totalPrice")?;
    let page = state
        .services
        .borrowings
        .find_by_total_price(total_price, search.page_request())
        .await?;
    Ok(ApiResponse::success(non_empty(page, BORROWINGS)?))
}

/// PUT /api/v1/borrowing/transferDevice?borrowingIdFrom&borrowingIdTo&deviceId
///
/// Returns both borrowings after the move, source first.
pub async fn transfer_device(
    State(state): State<AppState>,
    _: AdminAccess,
    Params(params): Params<TransferParams>,
) -> ApiResult<Vec<BorrowingResponse>> {
    let (from, to, device) = params.get()?;
    let borrowings = state.services.borrowings.transfer_device(from, to, device).await?;
    Ok(ApiResponse::success(borrowings))
}
