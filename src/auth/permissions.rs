//! Route requirements and the permission evaluator
//!
//! Permission checks are "any-of": a route listing several permissions is
//! reachable by a role holding at least one of them. A role holding
//! `manage:system` passes every non-public route.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::auth::decision::{Decision, DenyReason};
use crate::auth::user::GrantedRole;
use crate::error::{Result, WardenError};

/// Process-wide default permission set, loaded once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultPermissions {
    permissions: Arc<BTreeSet<String>>,
}

/// On-disk shape of the permission catalog file
#[derive(Debug, Deserialize)]
struct PermissionCatalogFile {
    default_permission: Vec<String>,
}

impl DefaultPermissions {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: Arc::new(permissions.into_iter().map(Into::into).collect()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a comma separated list, ignoring blanks
    pub fn from_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty()),
        )
    }

    /// Parse a catalog document of the form `{"default_permission": [...]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: PermissionCatalogFile = serde_json::from_str(json)?;
        Ok(Self::new(catalog.default_permission))
    }

    /// Load a catalog document from disk
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WardenError::ConfigError(format!(
                "Failed to read permissions file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

/// Static access requirement attached to a route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    pub is_public: bool,
    pub required_permissions: BTreeSet<String>,
}

impl RouteRequirement {
    /// Public route with no permission requirement
    pub fn public() -> Self {
        Self {
            is_public: true,
            required_permissions: BTreeSet::new(),
        }
    }

    /// Any authenticated principal may pass
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Principal must hold at least one of `permissions`
    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_public: false,
            required_permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Mark the route public
    pub fn mark_public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

/// Applies route requirements to resolved roles
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    defaults: DefaultPermissions,
}

impl PermissionEvaluator {
    pub fn new(defaults: DefaultPermissions) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &DefaultPermissions {
        &self.defaults
    }

    /// Whether a route is exempt from authentication.
    ///
    /// A public flag only holds when every required permission is part of
    /// the default set. A public-marked route that requires anything beyond
    /// the defaults is evaluated as a protected route. Partial overlap with
    /// the defaults is not enough: one privileged permission makes it protected.
    pub fn is_public(&self, requirement: &RouteRequirement) -> bool {
        requirement.is_public
            && requirement
                .required_permissions
                .iter()
                .all(|p| self.defaults.contains(p))
    }

    /// Decide whether `role` satisfies `requirement`
    pub fn authorize(&self, role: &GrantedRole, requirement: &RouteRequirement) -> Decision {
        if self.is_public(requirement) {
            return Decision::Allow;
        }

        if role.is_superuser() {
            return Decision::Allow;
        }

        if requirement.required_permissions.is_empty() {
            return Decision::Allow;
        }

        let granted = requirement
            .required_permissions
            .iter()
            .any(|p| role.permissions.contains(p));

        if granted {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::InsufficientPermissions)
        }
    }
}
