use std::sync::Arc;

use crate::auth::roles;
use crate::config::AppConfig;
use crate::database::models::Device;
use crate::database::repository::Repositories;
use crate::database::MemoryStore;
use crate::payload::{DeviceRequest, EmployeeRequest, EmployeeResponse};
use crate::services::Services;

/// Services over a fresh in-memory store, with cheap password hashing
pub struct TestContext {
    pub config: AppConfig,
    pub repositories: Repositories,
    pub services: Services,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "test-secret".to_string();
        config.security.bcrypt_cost = 4;

        let repositories = Repositories::from_store(Arc::new(MemoryStore::new()));
        let services = Services::new(&repositories, &config);

        Self {
            config,
            repositories,
            services,
        }
    }

    pub fn employee_request(user_name: &str, role_names: &[&str]) -> EmployeeRequest {
        EmployeeRequest {
            user_name: user_name.to_string(),
            password: "password1".to_string(),
            full_name: format!("{} Full", user_name),
            address: "1 Main Street".to_string(),
            phone_number: "0912345678".to_string(),
            account_balance: 500.0,
            roles: role_names.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn device_request(item_name: &str, device_type: &str, rate_type: &str, original_price: f64) -> DeviceRequest {
        DeviceRequest {
            device_type: device_type.to_string(),
            unit_price: 10.0,
            rate_type: rate_type.to_string(),
            branch_name: "Main".to_string(),
            item_name: item_name.to_string(),
            version: "1.0".to_string(),
            original_price,
        }
    }

    pub async fn create_employee(&self, user_name: &str) -> EmployeeResponse {
        self.services
            .employees
            .create_employee(Self::employee_request(user_name, &[roles::USER]))
            .await
            .expect("create employee")
    }

    pub async fn create_device(&self, item_name: &str, device_type: &str, rate_type: &str, original_price: f64) -> Device {
        self.services
            .devices
            .create_device(
                Self::device_request(item_name, device_type, rate_type, original_price)
                    .to_draft()
                    .expect("valid device"),
            )
            .await
            .expect("create device")
    }
}
