//! Startup seeding of the identity store from a JSON document
//!
//! Seeding is idempotent: roles are matched by name and users by username,
//! and records that already exist are left untouched.

use serde::Deserialize;
use std::path::Path;

use crate::auth::user::{Role, User};
use crate::error::{Result, WardenError};
use crate::storage::traits::IdentityStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Omit to make the role inherit the default permission set
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    /// Name of a role, seeded or pre-existing
    pub role: String,
}

/// Outcome of a seeding pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub roles_skipped: usize,
    pub users_created: usize,
    pub users_skipped: usize,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WardenError::ConfigError(format!(
                "Failed to read seed file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Write missing roles, then missing users, into `store`
    pub async fn apply(&self, store: &dyn IdentityStore) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for seed in &self.roles {
            if store.get_role_by_name(&seed.name).await?.is_some() {
                log::info!("Role {} already exists, skipping", seed.name);
                report.roles_skipped += 1;
                continue;
            }

            let mut role = Role::new(seed.name.clone(), seed.permissions.clone());
            role.description = seed.description.clone();
            role.is_system = true;
            store.put_role(role).await?;
            log::info!("Seeded role: {}", seed.name);
            report.roles_created += 1;
        }

        for seed in &self.users {
            if store.get_user_by_username(&seed.username).await?.is_some() {
                log::info!("User {} already exists, skipping", seed.username);
                report.users_skipped += 1;
                continue;
            }

            let role = store.get_role_by_name(&seed.role).await?.ok_or_else(|| {
                WardenError::ValidationError(format!(
                    "Seed user '{}' references unknown role '{}'",
                    seed.username, seed.role
                ))
            })?;

            let mut user = User::new(seed.username.clone(), seed.email.clone(), role.id);
            if let Some(id) = &seed.id {
                user = user.with_id(id.clone());
            }
            if let Some(name) = &seed.name {
                user = user.with_name(name.clone());
            }

            store.put_user(user).await?;
            log::info!("Seeded user: {}", seed.username);
            report.users_created += 1;
        }

        Ok(report)
    }
}
