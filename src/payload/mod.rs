//! Request and response bodies as they appear on the wire.

pub mod request;
pub mod response;

pub use request::{
    BorrowingRequest, DeviceRequest, EmployeeRequest, LoginRequest, SearchRequest, SortRequest,
};
pub use response::{BorrowingResponse, EmployeeResponse, EmployeeUpdateResponse, JwtAuthResponse};
