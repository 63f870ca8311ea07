use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::database::models::date_audit::DATE_AUDIT_SCHEMA;
use crate::database::models::{Borrowing, DateAudit, Device, Employee, Role};
use crate::validation::sort::{Field, FieldSchema, SortFields, Sortable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthResponse {
    pub access_token: String,
    pub token_type: String,
}

impl JwtAuthResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Employee as exposed over the API; never carries the password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: i32,
    pub user_name: String,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
    pub account_balance: f64,
    pub roles: Vec<Role>,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            user_name: employee.user_name,
            full_name: employee.full_name,
            address: employee.address,
            phone_number: employee.phone_number,
            account_balance: employee.account_balance,
            roles: employee.roles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdateResponse {
    #[serde(flatten)]
    pub employee: EmployeeResponse,
    pub update_password: bool,
}

impl From<Employee> for EmployeeUpdateResponse {
    fn from(employee: Employee) -> Self {
        Self {
            employee: employee.into(),
            update_password: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingResponse {
    pub id: i32,
    pub date_audit: DateAudit,
    pub total_price: f64,
    pub employee: EmployeeResponse,
    pub devices: Vec<Device>,
}

impl From<Borrowing> for BorrowingResponse {
    fn from(borrowing: Borrowing) -> Self {
        Self {
            id: borrowing.id,
            date_audit: borrowing.date_audit,
            total_price: borrowing.total_price,
            employee: borrowing.employee.into(),
            devices: borrowing.devices,
        }
    }
}

pub static EMPLOYEE_RESPONSE_SCHEMA: FieldSchema = FieldSchema {
    name: "EmployeeResponse",
    fields: &[
        Field::column("id", "id"),
        Field::column("userName", "user_name"),
        Field::column("fullName", "full_name"),
        Field::column("address", "address"),
        Field::column("phoneNumber", "phone_number"),
        Field::column("accountBalance", "account_balance"),
        Field::collection("roles"),
    ],
};

pub static BORROWING_RESPONSE_SCHEMA: FieldSchema = FieldSchema {
    name: "BorrowingResponse",
    fields: &[
        Field::column("id", "id"),
        Field::embedded("dateAudit", &DATE_AUDIT_SCHEMA),
        Field::column("totalPrice", "total_price"),
        Field::joined("employee", &EMPLOYEE_RESPONSE_SCHEMA, "e"),
        Field::collection("devices"),
    ],
};

static BORROWING_SORT_FIELDS: Lazy<SortFields> =
    Lazy::new(|| SortFields::build(&BORROWING_RESPONSE_SCHEMA, BorrowingResponse::TABLE_ALIAS));

impl Sortable for BorrowingResponse {
    const TABLE_ALIAS: &'static str = "b";

    fn schema() -> &'static FieldSchema {
        &BORROWING_RESPONSE_SCHEMA
    }

    fn sort_fields() -> &'static SortFields {
        &BORROWING_SORT_FIELDS
    }
}
