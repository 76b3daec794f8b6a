use tracing::debug;

use super::identity::IdentityClaim;
use crate::error::AppError;
use crate::model::Role;
use crate::service::EmployeeDirectory;

/// Proof that the current requester holds the admin role.
///
/// Only [`RoleGuard::require_admin`] can build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCapability {
    _private: (),
}

/// Resolves roles through the employee directory.
#[derive(Clone)]
pub struct RoleGuard {
    directory: EmployeeDirectory,
}

impl RoleGuard {
    pub fn new(directory: EmployeeDirectory) -> Self {
        Self { directory }
    }

    /// Answer for `GET /users/admin/{email}`.
    ///
    /// Asking about any identity but one's own is `false` without a lookup.
    pub async fn is_admin(&self, claim: &IdentityClaim, email: &str) -> Result<bool, AppError> {
        if claim.email() != Some(email) {
            debug!(requested = %email, "Admin query for another identity");
            return Ok(false);
        }
        Ok(self.directory.role_of(email).await?.is_admin())
    }

    pub async fn require_admin(&self, claim: &IdentityClaim) -> Result<AdminCapability, AppError> {
        let Some(email) = claim.email() else {
            return Err(AppError::Forbidden);
        };

        match self.directory.role_of(email).await? {
            Role::Admin => Ok(AdminCapability { _private: () }),
            role => {
                debug!(email = %email, role = %role, "Admin required");
                Err(AppError::Forbidden)
            }
        }
    }
}
