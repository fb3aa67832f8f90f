//! Role-based access policy.
//!
//! Every operation has one fixed set of permitted roles. There are no per-record or
//! per-field exceptions: a caller either holds a role in the set or is denied.

use crate::config::RecordVariant;
use crate::identity::Caller;
use crate::operation::Operation;
use crate::{CitizenError, CitizenResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The citizen acting as themselves.
    Subject,
    DomainUser,
    DomainAdmin,
    /// The only role that may create citizens.
    RegistryAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Subject => "self",
            Role::DomainUser => "domain-user",
            Role::DomainAdmin => "domain-admin",
            Role::RegistryAdmin => "registry-admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may perform an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allowed {
    /// Any caller whose identity resolved, whatever their role.
    AnyCaller,
    Roles(&'static [Role]),
}

impl Allowed {
    pub fn permits(self, role: Option<Role>) -> bool {
        match self {
            Allowed::AnyCaller => true,
            Allowed::Roles(roles) => role.is_some_and(|r| roles.contains(&r)),
        }
    }
}

/// The operation → role table for one deployment.
#[derive(Clone, Copy, Debug)]
pub struct AccessPolicy {
    variant: RecordVariant,
}

impl AccessPolicy {
    pub fn new(variant: RecordVariant) -> Self {
        Self { variant }
    }

    pub fn allowed(&self, operation: Operation) -> Allowed {
        use Role::*;
        match operation {
            Operation::Create | Operation::SetExternalId => Allowed::Roles(&[RegistryAdmin]),
            Operation::SetName | Operation::SetAddress => {
                Allowed::Roles(&[RegistryAdmin, Subject])
            }
            Operation::SetBloodGroup => Allowed::Roles(&[DomainAdmin, Subject]),
            Operation::AddSubRecord | Operation::CloseSubRecord => {
                Allowed::Roles(&[DomainAdmin, DomainUser])
            }
            Operation::GetRedactedEntity | Operation::GetFullEntity | Operation::ListAll => {
                Allowed::Roles(&[Subject])
            }
            Operation::CheckUnique
            | Operation::ReadKey
            | Operation::WriteKey
            | Operation::GetCredential
            | Operation::Heartbeat => Allowed::AnyCaller,
        }
    }

    /// Fails unless `caller` may perform `operation` in this deployment.
    ///
    /// # Errors
    ///
    /// - [`CitizenError::UnknownOperation`] if the operation does not exist for this variant
    /// - [`CitizenError::PermissionDenied`] if the caller's role is outside the allowed set
    pub fn check(&self, operation: Operation, caller: &Caller) -> CitizenResult<()> {
        if !operation.available_in(self.variant) {
            return Err(CitizenError::UnknownOperation(operation.name().to_string()));
        }
        if self.allowed(operation).permits(caller.role) {
            return Ok(());
        }
        tracing::warn!(
            operation = operation.name(),
            caller = %caller.name,
            role = %caller.role_attribute,
            "permission denied"
        );
        Err(CitizenError::PermissionDenied {
            operation: operation.name(),
            role: caller.role_attribute.clone(),
        })
    }
}
