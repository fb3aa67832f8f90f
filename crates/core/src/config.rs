//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Nothing in the core reads environment variables or global state
//! during an invocation; hosts build a [`ServiceConfig`] and share it behind an `Arc`.

use crate::constants::DEFAULT_MAX_COMMIT_RETRIES;
use crate::policy::Role;
use crate::{CitizenError, CitizenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which sub-record shape a deployment stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordVariant {
    Health,
    Academic,
}

impl RecordVariant {
    /// Blood group is a health-only demographic.
    pub fn has_blood_group(self) -> bool {
        matches!(self, RecordVariant::Health)
    }
}

impl std::fmt::Display for RecordVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordVariant::Health => write!(f, "health"),
            RecordVariant::Academic => write!(f, "academic"),
        }
    }
}

/// Attested `role` attribute values and the [`Role`] each one maps to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleMapping {
    #[serde(rename = "self")]
    pub subject: String,
    pub domain_user: String,
    pub domain_admin: String,
    pub registry_admin: String,
}

impl RoleMapping {
    /// Attribute names used by health deployments.
    pub fn health() -> Self {
        Self {
            subject: "person".into(),
            domain_user: "healthcare_user".into(),
            domain_admin: "healthcare_admin".into(),
            registry_admin: "govt_admin".into(),
        }
    }

    /// Attribute names used by academic deployments.
    pub fn academic() -> Self {
        Self {
            subject: "person".into(),
            domain_user: "institute_user".into(),
            domain_admin: "institute_admin".into(),
            registry_admin: "govt_admin".into(),
        }
    }

    pub fn for_variant(variant: RecordVariant) -> Self {
        match variant {
            RecordVariant::Health => Self::health(),
            RecordVariant::Academic => Self::academic(),
        }
    }

    /// Maps an attested attribute value to a role; unknown values map to nothing.
    pub fn role_for(&self, attribute: &str) -> Option<Role> {
        if attribute == self.subject {
            Some(Role::Subject)
        } else if attribute == self.domain_user {
            Some(Role::DomainUser)
        } else if attribute == self.domain_admin {
            Some(Role::DomainAdmin)
        } else if attribute == self.registry_admin {
            Some(Role::RegistryAdmin)
        } else {
            None
        }
    }

    fn validate(&self) -> CitizenResult<()> {
        let names = [
            &self.subject,
            &self.domain_user,
            &self.domain_admin,
            &self.registry_admin,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(CitizenError::InvalidInput(
                "role attribute names cannot be empty".into(),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(CitizenError::InvalidInput(format!(
                    "role attribute '{name}' is mapped to more than one role"
                )));
            }
        }
        Ok(())
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    variant: RecordVariant,
    roles: RoleMapping,
    max_commit_retries: u32,
}

/// On-disk YAML form of [`ServiceConfig`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceConfigFile {
    variant: RecordVariant,
    #[serde(default)]
    roles: Option<RoleMapping>,
    #[serde(default)]
    max_commit_retries: Option<u32>,
}

impl ServiceConfig {
    /// Create a new `ServiceConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::InvalidInput`] if a role attribute name is empty or two roles
    /// share the same attribute name.
    pub fn new(
        variant: RecordVariant,
        roles: RoleMapping,
        max_commit_retries: u32,
    ) -> CitizenResult<Self> {
        roles.validate()?;
        Ok(Self {
            variant,
            roles,
            max_commit_retries,
        })
    }

    /// Default configuration for a deployment of `variant`.
    pub fn for_variant(variant: RecordVariant) -> Self {
        Self {
            variant,
            roles: RoleMapping::for_variant(variant),
            max_commit_retries: DEFAULT_MAX_COMMIT_RETRIES,
        }
    }

    /// Parse configuration from YAML text.
    ///
    /// Omitted `roles` fall back to the variant's defaults, omitted `max_commit_retries` to
    /// [`DEFAULT_MAX_COMMIT_RETRIES`].
    pub fn from_yaml_str(yaml: &str) -> CitizenResult<Self> {
        let file: ServiceConfigFile =
            serde_yaml::from_str(yaml).map_err(CitizenError::ConfigParse)?;
        Self::new(
            file.variant,
            file.roles
                .unwrap_or_else(|| RoleMapping::for_variant(file.variant)),
            file.max_commit_retries.unwrap_or(DEFAULT_MAX_COMMIT_RETRIES),
        )
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> CitizenResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(CitizenError::ConfigRead)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn variant(&self) -> RecordVariant {
        self.variant
    }

    pub fn roles(&self) -> &RoleMapping {
        &self.roles
    }

    pub fn max_commit_retries(&self) -> u32 {
        self.max_commit_retries
    }
}
