use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i32,
    pub user_name: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password: String,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
    pub account_balance: f64,
    pub roles: Vec<Role>,
}

impl Employee {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}

/// Column values for inserting or replacing an employee
#[derive(Debug, Clone)]
pub struct EmployeeDraft {
    pub user_name: String,
    pub password_hash: String,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
    pub account_balance: f64,
    pub roles: Vec<Role>,
}
