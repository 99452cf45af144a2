//! Typed session claims and permission checks
//!
//! Roles arrive from the identity provider as claim strings; they are parsed
//! into a closed enum once at session decode time so every later check is a
//! typed comparison instead of string matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{BudgetError, BudgetResult};

/// Capabilities a session can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read linked payment accounts
    ViewAccounts,
    /// Read payment activities and reconciliation data
    ViewActivities,
    /// Confirm, reject, ignore, or reopen matches
    Reconcile,
    /// Link, relink, and revoke payment accounts
    ManageAccounts,
    /// Initiate synchronization runs
    RunSync,
}

/// Roles granted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Read-only access to accounts and activities
    Viewer,
    /// Regular user; may reconcile activities
    Member,
    /// Full access including account management and sync
    Admin,
}

impl Role {
    /// The permissions this role grants
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Viewer => &[Permission::ViewAccounts, Permission::ViewActivities],
            Role::Member => &[
                Permission::ViewAccounts,
                Permission::ViewActivities,
                Permission::Reconcile,
            ],
            Role::Admin => &[
                Permission::ViewAccounts,
                Permission::ViewActivities,
                Permission::Reconcile,
                Permission::ManageAccounts,
                Permission::RunSync,
            ],
        }
    }
}

impl FromStr for Role {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(BudgetError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Decoded claims of an authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity-provider subject identifier
    pub subject: String,
    /// Roles granted to the subject
    pub roles: Vec<Role>,
    /// When the session expires
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Create claims from already-typed roles
    pub fn new(subject: String, roles: Vec<Role>, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject,
            roles,
            expires_at,
        }
    }

    /// Parse claims from identity-provider role strings
    ///
    /// Fails on any unknown role rather than silently dropping it.
    pub fn from_role_strings<I, S>(
        subject: String,
        roles: I,
        expires_at: DateTime<Utc>,
    ) -> BudgetResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = roles
            .into_iter()
            .map(|role| role.as_ref().parse())
            .collect::<BudgetResult<Vec<Role>>>()?;
        Ok(Self::new(subject, roles, expires_at))
    }

    /// Whether the session has passed its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether any granted role carries the permission
    pub fn has(&self, permission: Permission) -> bool {
        self.roles
            .iter()
            .any(|role| role.permissions().contains(&permission))
    }

    /// Require a permission, failing on expired sessions or missing grants
    pub fn require(&self, permission: Permission) -> BudgetResult<()> {
        if self.is_expired() {
            return Err(BudgetError::Unauthorized);
        }
        if !self.has(permission) {
            return Err(BudgetError::Forbidden(format!(
                "Subject '{}' lacks {:?}",
                self.subject, permission
            )));
        }
        Ok(())
    }
}
