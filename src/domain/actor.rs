use serde::{Deserialize, Serialize};

/// Role of an already-authenticated caller. Authentication itself happens
/// upstream; the core only checks ownership and processing rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Employee,
    Admin,
}

impl Role {
    /// Staff roles may approve or reject pending payments.
    pub fn can_process_payments(&self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }

    /// Privileged roles may read records they do not own.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }
}

/// The authenticated caller identity every entry point receives.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn customer(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn employee(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Employee)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }
}
