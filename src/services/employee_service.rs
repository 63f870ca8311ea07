use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{hash_password, roles};
use crate::database::manager::DatabaseError;
use crate::database::models::{Employee, EmployeeDraft, Role};
use crate::database::repository::{EmployeeRepository, Repositories, RoleRepository};
use crate::payload::{EmployeeRequest, EmployeeResponse, EmployeeUpdateResponse};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepository>,
    roles: Arc<dyn RoleRepository>,
    bcrypt_cost: u32,
}

impl EmployeeService {
    pub fn new(repositories: &Repositories, bcrypt_cost: u32) -> Self {
        Self {
            employees: repositories.employees.clone(),
            roles: repositories.roles.clone(),
            bcrypt_cost,
        }
    }

    fn not_found(id: i32) -> ServiceError {
        ServiceError::NotFound(format!("Employee with ID {} not found", id))
    }

    /// Every requested role must exist
    async fn resolve_roles(&self, names: &[String]) -> Result<Vec<Role>, ServiceError> {
        let found = self.roles.find_by_names(names).await?;
        if let Some(missing) = names.iter().find(|n| !found.iter().any(|r| &r.name == *n)) {
            return Err(ServiceError::BadRequest(format!("Role '{}' does not exist", missing)));
        }
        Ok(found)
    }

    async fn draft(&self, request: EmployeeRequest) -> Result<EmployeeDraft, ServiceError> {
        let roles = self.resolve_roles(&request.role_names()).await?;
        let password_hash = hash_password(request.password, self.bcrypt_cost).await?;

        Ok(EmployeeDraft {
            user_name: request.user_name,
            password_hash,
            full_name: request.full_name,
            address: request.address,
            phone_number: request.phone_number,
            account_balance: request.account_balance,
            roles,
        })
    }

    fn taken(user_name: &str) -> ServiceError {
        ServiceError::Conflict(format!("Username '{}' is already taken", user_name))
    }

    pub async fn create_employee(&self, request: EmployeeRequest) -> Result<EmployeeResponse, ServiceError> {
        if self.employees.find_by_user_name(&request.user_name).await?.is_some() {
            return Err(Self::taken(&request.user_name));
        }

        let user_name = request.user_name.clone();
        let draft = self.draft(request).await?;
        let employee = match self.employees.insert(draft).await {
            Err(DatabaseError::Conflict(_)) => return Err(Self::taken(&user_name)),
            other => other?,
        };

        info!("Created employee {} ({})", employee.id, employee.user_name);
        Ok(employee.into())
    }

    /// Replace every field of an employee, re-hashing the password
    pub async fn update_employee(&self, id: i32, request: EmployeeRequest) -> Result<EmployeeUpdateResponse, ServiceError> {
        if self.employees.find_by_id(id).await?.is_none() {
            return Err(Self::not_found(id));
        }
        if let Some(other) = self.employees.find_by_user_name(&request.user_name).await? {
            if other.id != id {
                return Err(Self::taken(&request.user_name));
            }
        }

        let draft = self.draft(request).await?;
        let employee = self.employees.update(id, draft).await?;

        info!("Updated employee {}", id);
        Ok(employee.into())
    }

    pub async fn get_employee_by_id(&self, id: i32) -> Result<EmployeeResponse, ServiceError> {
        self.employees
            .find_by_id(id)
            .await?
            .map(EmployeeResponse::from)
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn get_all_employees(&self) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let employees = self.employees.find_all().await?;
        Ok(employees.into_iter().map(EmployeeResponse::from).collect())
    }

    pub async fn delete_employee(&self, id: i32) -> Result<(), ServiceError> {
        match self.employees.delete(id).await {
            Ok(true) => {
                info!("Deleted employee {}", id);
                Ok(())
            }
            Ok(false) => Err(Self::not_found(id)),
            Err(DatabaseError::Conflict(_)) => Err(ServiceError::Conflict(format!(
                "Employee with ID {} still has borrowings",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored employee with password hash, for authentication
    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Employee>, ServiceError> {
        Ok(self.employees.find_by_user_name(user_name).await?)
    }

    /// Seed an administrator holding both roles; a no-op when the user name
    /// is already present. Returns whether an account was created.
    pub async fn ensure_admin(&self, user_name: &str, password: &str) -> Result<bool, ServiceError> {
        if let Some(existing) = self.employees.find_by_user_name(user_name).await? {
            if !existing.has_role(roles::ADMIN) {
                warn!("Bootstrap user '{}' exists without {}", user_name, roles::ADMIN);
            }
            return Ok(false);
        }

        let request = EmployeeRequest {
            user_name: user_name.to_string(),
            password: password.to_string(),
            full_name: "Administrator".to_string(),
            address: "-".to_string(),
            phone_number: "0100000000".to_string(),
            account_balance: 0.0,
            roles: roles::ALL.iter().map(|r| r.to_string()).collect(),
        };
        self.create_employee(request).await?;

        info!("Seeded administrator '{}'", user_name);
        Ok(true)
    }
}
