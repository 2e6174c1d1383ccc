//! Users, roles and the per-request actor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::UserId;

/// Role of a user in the reimbursement process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Files claims for their own expenses
    Applicant,
    /// Reviews and exports claims of their department
    Lead,
    /// Manages accounts; does not handle claim content
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Lead => "lead",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applicant" => Ok(Role::Applicant),
            "lead" => Ok(Role::Lead),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Full name shown on documents; may be blank
    pub full_name: String,
    /// Student or staff number printed in the expense summary
    pub student_id: Option<String>,
    pub role: Role,
    pub department: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with a blank full name
    pub fn new(username: impl Into<String>, role: Role, department: impl Into<String>) -> Self {
        Self {
            id: UserId::new_v7(),
            username: username.into(),
            full_name: String::new(),
            student_id: None,
            role,
            department: department.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// Name used on generated documents, falling back to the login name
    pub fn display_name(&self) -> &str {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            &self.username
        } else {
            full_name
        }
    }

    /// The request context for this user
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            role: self.role,
            department: self.department.clone(),
        }
    }
}

/// Who is performing an operation
///
/// Built once per request by the authentication layer and passed explicitly
/// into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub department: String,
}

impl Actor {
    pub fn is_lead(&self) -> bool {
        self.role == Role::Lead
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Applicants and leads may file claims; admins only manage accounts
    pub fn can_file_claims(&self) -> bool {
        matches!(self.role, Role::Applicant | Role::Lead)
    }
}
