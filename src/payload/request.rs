use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::DeviceDraft;
use crate::database::repository::PageRequest;
use crate::error::ApiError;
use crate::types::{DeviceType, NamedEnum, RateType, SortDirection};
use crate::validation::{
    validate_device_type, validate_phone_number, validate_rate_type, validate_roles, validate_sort_direction,
    Sortable, SortOrder,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub user_name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub full_name: String,
    pub address: String,
    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,
    #[validate(range(min = 0.0, message = "Account balance cannot be negative"))]
    pub account_balance: f64,
    #[serde(default)]
    #[validate(custom = "validate_roles")]
    pub roles: HashSet<String>,
}

impl EmployeeRequest {
    /// Requested role names in a stable order
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roles.iter().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    #[serde(rename = "type")]
    #[validate(custom = "validate_device_type")]
    pub device_type: String,
    #[validate(range(min = 0.0, message = "Unit price must be non-negative"))]
    pub unit_price: f64,
    #[validate(custom = "validate_rate_type")]
    pub rate_type: String,
    pub branch_name: String,
    pub item_name: String,
    pub version: String,
    #[validate(range(min = 0.0, message = "Original price must be non-negative"))]
    pub original_price: f64,
}

impl DeviceRequest {
    /// Column values for a validated request
    pub fn to_draft(&self) -> Result<DeviceDraft, ApiError> {
        Ok(DeviceDraft {
            device_type: parse_enum("type", &self.device_type)?,
            unit_price: self.unit_price,
            rate_type: parse_enum("rateType", &self.rate_type)?,
            branch_name: self.branch_name.clone(),
            item_name: self.item_name.clone(),
            version: Some(self.version.clone()),
            original_price: self.original_price,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingRequest {
    #[validate(range(min = 0, message = "There is no employee id that is negative"))]
    pub employee_id: i32,
    #[validate(length(min = 1, message = "At least one device is required"))]
    pub devices_id: Vec<i32>,
}

impl BorrowingRequest {
    /// Device ids in request order with repeats dropped
    pub fn unique_device_ids(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.devices_id.iter().copied().filter(|id| seen.insert(*id)).collect()
    }
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(range(min = 0, max = 4294967295, message = "Page number must be between 0 and 4294967295"))]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000"))]
    pub page_size: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self { page_number: 0, page_size: default_page_size() }
    }
}

impl SearchRequest {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page_number as u32, self.page_size as u32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    #[serde(default)]
    #[validate(range(min = 0, max = 4294967295, message = "Page number must be between 0 and 4294967295"))]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000"))]
    pub page_size: i64,
    #[serde(default)]
    pub sort_string: String,
    #[validate(custom = "validate_sort_direction")]
    pub sort_direction: Option<String>,
}

impl SortRequest {
    /// Resolve `sortString` against the allow-list of `S`
    pub fn sort_order<S: Sortable>(&self) -> Result<SortOrder, ApiError> {
        let explicit = match &self.sort_direction {
            Some(direction) => Some(parse_enum::<SortDirection>("sortDirection", direction)?),
            None => None,
        };

        S::sort_fields()
            .check(&self.sort_string, explicit)
            .map_err(|message| ApiError::field_error("sortString", message))
    }

    pub fn page_request<S: Sortable>(&self) -> Result<PageRequest, ApiError> {
        let page = PageRequest::new(self.page_number as u32, self.page_size as u32);
        Ok(page.sorted(self.sort_order::<S>()?))
    }
}

fn parse_enum<E: NamedEnum>(field: &str, value: &str) -> Result<E, ApiError> {
    E::from_name(value).ok_or_else(|| {
        ApiError::field_error(
            field,
            format!(
                "Invalid value: '{}'. Accepted values for {} are: {}",
                value,
                E::TYPE_NAME,
                E::names().join(", ")
            ),
        )
    })
}

/// Unwrap a query parameter or report it as missing
pub fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("The {} parameter is required", name)))
}

/// `YYYY-MM-DD` (start of that day) or a full ISO date-time, with or without
/// an offset
pub fn parse_date_time(name: &str, value: &str) -> Result<NaiveDateTime, ApiError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(start) = date.and_hms_opt(0, 0, 0) {
            return Ok(start);
        }
    }
    if let Ok(date_time) = value.parse::<NaiveDateTime>() {
        return Ok(date_time);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Ok(date_time.naive_utc());
    }
    Err(ApiError::bad_request(format!(
        "Invalid {}: '{}'. Expected YYYY-MM-DD or an ISO date-time",
        name, value
    )))
}

#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<i32>,
}

impl IdParam {
    pub fn get(&self) -> Result<i32, ApiError> {
        required(self.id, "id")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemNameParam {
    pub item_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParam {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeParam {
    pub fn range(&self) -> Result<(NaiveDateTime, NaiveDateTime), ApiError> {
        let start = parse_date_time("startDate", required(self.start_date.as_deref(), "startDate")?)?;
        let end = parse_date_time("endDate", required(self.end_date.as_deref(), "endDate")?)?;
        Ok((start, end))
    }
}

#[derive(Debug, Deserialize)]
pub struct TypeParam {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
}

impl TypeParam {
    pub fn get(&self) -> Result<DeviceType, ApiError> {
        parse_enum("type", required(self.device_type.as_deref(), "type")?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTypeParam {
    pub rate_type: Option<String>,
}

impl RateTypeParam {
    pub fn get(&self) -> Result<RateType, ApiError> {
        parse_enum("rateType", required(self.rate_type.as_deref(), "rateType")?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPriceParam {
    pub total_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub borrowing_id_from: Option<i32>,
    pub borrowing_id_to: Option<i32>,
    pub device_id: Option<i32>,
}

impl TransferParams {
    /// `(from, to, device)`
    pub fn get(&self) -> Result<(i32, i32, i32), ApiError> {
        Ok((
            required(self.borrowing_id_from, "borrowingIdFrom")?,
            required(self.borrowing_id_to, "borrowingIdTo")?,
            required(self.device_id, "deviceId")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Device;
    use crate::validation::field_errors;

    fn employee_request() -> EmployeeRequest {
        EmployeeRequest {
            user_name: "jdoe".to_string(),
            password: "secret1".to_string(),
            full_name: "John Doe".to_string(),
            address: "123 Street".to_string(),
            phone_number: "0912345678".to_string(),
            account_balance: 1000.0,
            roles: ["ROLE_USER".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn valid_employee_request_passes() {
        assert!(employee_request().validate().is_ok());
    }

    #[test]
    fn employee_errors_are_keyed_by_wire_name() {
        let mut request = employee_request();
        request.user_name = "jd".to_string();
        request.phone_number = "12345".to_string();
        request.roles.clear();

        let errors = field_errors(&request.validate().unwrap_err());
        assert_eq!(errors["userName"], "Username must be between 3 and 50 characters");
        assert_eq!(errors["phoneNumber"], "Invalid phone number: '12345'");
        assert!(errors.contains_key("roles"));
    }

    #[test]
    fn device_request_parses_enum_names() {
        let request: DeviceRequest = serde_json::from_value(serde_json::json!({
            "type": "LAPTOP",
            "unitPrice": 5.0,
            "rateType": "USED",
            "branchName": "Dell",
            "itemName": "XPS",
            "version": "13",
            "originalPrice": 1200.0
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let draft = request.to_draft().unwrap();
        assert_eq!(draft.device_type, DeviceType::Laptop);
        assert_eq!(draft.rate_type, RateType::Used);
    }

    #[test]
    fn device_request_rejects_unknown_type() {
        let request = DeviceRequest {
            device_type: "TABLET".to_string(),
            unit_price: 1.0,
            rate_type: "NEW".to_string(),
            branch_name: "b".to_string(),
            item_name: "i".to_string(),
            version: "v".to_string(),
            original_price: 1.0,
        };
        let errors = field_errors(&request.validate().unwrap_err());
        assert!(errors["type"].starts_with("Invalid value: 'TABLET'. Accepted values for Type are"));
    }

    #[test]
    fn borrowing_request_needs_devices_and_drops_repeats() {
        let empty = BorrowingRequest { employee_id: 1, devices_id: vec![] };
        assert!(empty.validate().is_err());

        let repeated = BorrowingRequest { employee_id: 1, devices_id: vec![3, 1, 3, 2, 1] };
        assert_eq!(repeated.unique_device_ids(), vec![3, 1, 2]);
    }

    #[test]
    fn search_defaults_and_bounds() {
        let search: SearchRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(search.page_size, 10);
        assert_eq!(search.page_number, 0);

        let too_big = SearchRequest { page_number: 0, page_size: 1001 };
        assert!(too_big.validate().is_err());
        let negative = SearchRequest { page_number: -1, page_size: 10 };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn page_numbers_beyond_u32_are_rejected() {
        let last = SearchRequest { page_number: u32::MAX as i64, page_size: 10 };
        assert!(last.validate().is_ok());
        assert_eq!(last.page_request().offset(), u32::MAX as i64 * 10);

        let overflow: SearchRequest =
            serde_json::from_value(serde_json::json!({ "pageNumber": 4294967296i64, "pageSize": 10 })).unwrap();
        let errors = field_errors(&overflow.validate().unwrap_err());
        assert_eq!(errors["pageNumber"], "Page number must be between 0 and 4294967295");

        let sorted = SortRequest {
            page_number: 4294967296,
            page_size: 10,
            sort_string: "itemName".to_string(),
            sort_direction: None,
        };
        assert!(sorted.validate().is_err());
    }

    #[test]
    fn sort_request_resolves_against_allow_list() {
        let request = SortRequest {
            page_number: 0,
            page_size: 10,
            sort_string: "dateAudit.createdAt.desc".to_string(),
            sort_direction: None,
        };
        let page = request.page_request::<Device>().unwrap();
        let sort = page.sort.unwrap();
        assert_eq!(sort.column, "d.created_at");
        assert_eq!(sort.direction, SortDirection::Desc);

        let bad = SortRequest { sort_string: "devices".to_string(), ..request };
        let err = bad.sort_order::<Device>().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn parses_dates_and_date_times() {
        let start = parse_date_time("startDate", "2024-03-01").unwrap();
        assert_eq!(start.to_string(), "2024-03-01 00:00:00");

        let exact = parse_date_time("startDate", "2024-03-01T10:15:30").unwrap();
        assert_eq!(exact.to_string(), "2024-03-01 10:15:30");

        let offset = parse_date_time("startDate", "2024-03-01T10:15:30+02:00").unwrap();
        assert_eq!(offset.to_string(), "2024-03-01 08:15:30");

        assert!(parse_date_time("startDate", "March 1st").is_err());
    }

    #[test]
    fn missing_parameters_are_named() {
        let params = DateRangeParam { start_date: Some("2024-01-01".to_string()), end_date: None };
        let err = params.range().unwrap_err();
        assert_eq!(err.message(), "The endDate parameter is required");
    }
}
