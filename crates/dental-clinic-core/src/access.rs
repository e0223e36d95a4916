//! Administrator checks and the debug context.
//!
//! There is no role schema: an account is an administrator if its email is
//! in the configured list. With an empty list every session may run every
//! operation.

use thiserror::Error;

use crate::config::{ClinicConfig, DebugConfig};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("{action} requires an administrator account")]
    PermissionDenied { action: String },
}

/// Who may run destructive operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessPolicy {
    admin_emails: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ClinicConfig) -> Self {
        Self::new(&config.admin_emails)
    }

    pub fn is_enforced(&self) -> bool {
        !self.admin_emails.is_empty()
    }

    pub fn is_admin(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }

    /// Allow `action` for administrators, everyone when not enforced, or a debug bypass.
    pub fn require_admin(
        &self,
        session_email: Option<&str>,
        debug: &DebugContext,
        action: &str,
    ) -> Result<(), AccessError> {
        if !self.is_enforced() || debug.bypasses_auth() || self.is_admin(session_email) {
            return Ok(());
        }
        Err(AccessError::PermissionDenied {
            action: action.to_string(),
        })
    }
}

/// Diagnostics switches, passed explicitly to whatever needs them.
///
/// Release builds always get a disabled context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugContext {
    enabled: bool,
    auth_bypass: bool,
}

impl DebugContext {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DebugConfig) -> Self {
        let enabled = config.enabled && cfg!(debug_assertions);
        Self {
            enabled,
            auth_bypass: enabled && config.auth_bypass,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bypasses_auth(&self) -> bool {
        self.enabled && self.auth_bypass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy_allows_everyone() {
        let policy = AccessPolicy::default();
        assert!(policy
            .require_admin(None, &DebugContext::disabled(), "delete patient")
            .is_ok());
    }

    #[test]
    fn test_enforced_policy() {
        let policy = AccessPolicy::new(["Admin@Clinic.es"]);
        let debug = DebugContext::disabled();

        assert!(policy.is_admin(Some("admin@clinic.es ")));
        assert!(policy.require_admin(Some("admin@clinic.es"), &debug, "delete patient").is_ok());
        assert_eq!(
            policy.require_admin(Some("recepcion@clinic.es"), &debug, "delete patient"),
            Err(AccessError::PermissionDenied {
                action: "delete patient".into()
            })
        );
        assert!(policy.require_admin(None, &debug, "delete patient").is_err());
    }

    #[test]
    fn test_debug_bypass_needs_both_flags() {
        let only_bypass = DebugContext::from_config(&DebugConfig {
            enabled: false,
            auth_bypass: true,
        });
        assert!(!only_bypass.bypasses_auth());

        let both = DebugContext::from_config(&DebugConfig {
            enabled: true,
            auth_bypass: true,
        });
        // Tests run with debug assertions
        assert_eq!(both.bypasses_auth(), cfg!(debug_assertions));

        let policy = AccessPolicy::new(["admin@clinic.es"]);
        assert_eq!(
            policy.require_admin(None, &both, "delete invoice").is_ok(),
            cfg!(debug_assertions)
        );
    }
}
