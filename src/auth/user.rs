use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::permissions::DefaultPermissions;
use crate::constants::MANAGE_SYSTEM_PERMISSION;

/// Role record as held by the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier
    pub id: String,
    /// Display name, unique per store
    pub name: String,
    pub description: Option<String>,
    /// Granted permissions; `None` means the role inherits the defaults
    pub permissions: Option<Vec<String>>,
    /// Seeded roles are marked as system roles
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new role with a fresh identifier
    pub fn new(name: impl Into<String>, permissions: Option<Vec<String>>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            permissions,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a system role (seeded, not user-defined)
    pub fn system(name: impl Into<String>, permissions: Vec<String>) -> Self {
        let mut role = Self::new(name, Some(permissions));
        role.is_system = true;
        role
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Resolve the permission set used at evaluation time.
    ///
    /// A role stored without permissions receives a copy of the process-wide
    /// defaults, so the result never carries an absent set.
    pub fn grant(&self, defaults: &DefaultPermissions) -> GrantedRole {
        let permissions = match &self.permissions {
            Some(list) => list.iter().cloned().collect(),
            None => defaults.as_set().clone(),
        };

        GrantedRole {
            id: self.id.clone(),
            name: self.name.clone(),
            permissions,
            is_system: self.is_system,
        }
    }
}

/// Role with its effective permission set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedRole {
    pub id: String,
    pub name: String,
    pub permissions: BTreeSet<String>,
    pub is_system: bool,
}

impl GrantedRole {
    /// Check if the role holds a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the role carries the superuser bypass
    pub fn is_superuser(&self) -> bool {
        self.has_permission(MANAGE_SYSTEM_PERMISSION)
    }
}

/// User record as held by the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: String,
    /// Full name for display
    pub name: String,
    /// Login name, unique per store
    pub username: String,
    pub email: String,
    /// Reference to the user's role
    pub role_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a fresh identifier
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: username.clone(),
            username,
            email: email.into(),
            role_id: role_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Authenticated identity attached to an authorized request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role_id: String,
    pub role: GrantedRole,
}

impl Principal {
    /// Assemble a principal from its resolved records
    pub fn from_parts(user: &User, role: GrantedRole) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role_id: user.role_id.clone(),
            role,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.has_permission(permission)
    }
}
