use std::sync::Arc;

use thiserror::Error;

use crate::auth::JwtError;
use crate::config::AppConfig;
use crate::database::manager::DatabaseError;
use crate::database::repository::{HealthCheck, Repositories};

pub mod auth_service;
pub mod borrowing_service;
pub mod device_service;
pub mod employee_service;
pub mod log_service;

pub use auth_service::AuthService;
pub use borrowing_service::BorrowingService;
pub use device_service::DeviceService;
pub use employee_service::EmployeeService;
pub use log_service::LogService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

/// Every service wired to one set of repositories
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub employees: EmployeeService,
    pub devices: DeviceService,
    pub borrowings: BorrowingService,
    pub logs: LogService,
    pub health: Arc<dyn HealthCheck>,
}

impl Services {
    pub fn new(repositories: &Repositories, config: &AppConfig) -> Self {
        Self {
            auth: AuthService::new(repositories, config.security.clone()),
            employees: EmployeeService::new(repositories, config.security.bcrypt_cost),
            devices: DeviceService::new(repositories),
            borrowings: BorrowingService::new(repositories),
            logs: LogService::new(repositories),
            health: repositories.health.clone(),
        }
    }
}
