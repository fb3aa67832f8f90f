//! Caller identity resolution from ledger attestation attributes.

use crate::config::RoleMapping;
use crate::constants::{ROLE_ATTRIBUTE, USERNAME_ATTRIBUTE};
use crate::ledger::Ledger;
use crate::policy::Role;
use crate::{CitizenError, CitizenResult};

/// The resolved caller of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
    /// Raw attested role string, kept for messages and logs.
    pub role_attribute: String,
    /// `None` when the attested string maps to no configured role.
    pub role: Option<Role>,
}

pub struct IdentityResolver<'a> {
    roles: &'a RoleMapping,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(roles: &'a RoleMapping) -> Self {
        Self { roles }
    }

    /// Reads `username` and `role` from the caller's attestation.
    ///
    /// An attested role that maps to no configured role still resolves; it simply belongs to
    /// no permission set.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::Identity`] if either attribute is absent, unreadable or empty.
    pub fn resolve<L: Ledger + ?Sized>(&self, ledger: &L) -> CitizenResult<Caller> {
        let name = attribute(ledger, USERNAME_ATTRIBUTE)?;
        let role_attribute = attribute(ledger, ROLE_ATTRIBUTE)?;
        let role = self.roles.role_for(&role_attribute);
        Ok(Caller {
            name,
            role_attribute,
            role,
        })
    }
}

fn attribute<L: Ledger + ?Sized>(ledger: &L, name: &'static str) -> CitizenResult<String> {
    let value = ledger
        .caller_attribute(name)
        .map_err(|e| CitizenError::Identity {
            attribute: name,
            reason: e.to_string(),
        })?;
    if value.trim().is_empty() {
        return Err(CitizenError::Identity {
            attribute: name,
            reason: "attribute is empty".into(),
        });
    }
    Ok(value)
}
