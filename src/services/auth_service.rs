use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{generate_jwt, validate_jwt, verify_password, AuthUser, Claims};
use crate::config::SecurityConfig;
use crate::database::repository::{EmployeeRepository, Repositories};
use crate::payload::{JwtAuthResponse, LoginRequest};
use crate::services::ServiceError;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    employees: Arc<dyn EmployeeRepository>,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(repositories: &Repositories, security: SecurityConfig) -> Self {
        Self {
            employees: repositories.employees.clone(),
            security,
        }
    }

    /// Check credentials and issue a bearer token carrying the employee's roles
    pub async fn login(&self, request: LoginRequest) -> Result<JwtAuthResponse, ServiceError> {
        let employee = self
            .employees
            .find_by_user_name(&request.user_name)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(request.password, employee.password.clone()).await? {
            debug!("Rejected password for '{}'", employee.user_name);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let claims = Claims::new(
            employee.user_name.clone(),
            employee.role_names(),
            self.security.jwt_expiry_hours,
        )?;
        let token = generate_jwt(&claims, &self.security)?;

        info!("Employee '{}' logged in", employee.user_name);
        Ok(JwtAuthResponse::bearer(token))
    }

    /// Resolve a bearer token to the employee it names. Roles come from the
    /// store, not the token, so revocations apply immediately.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let claims = validate_jwt(token, &self.security)?;

        let employee = self
            .employees
            .find_by_user_name(&claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User no longer exists".to_string()))?;

        Ok(AuthUser {
            employee_id: employee.id,
            roles: employee.role_names(),
            user_name: employee.user_name,
        })
    }
}
