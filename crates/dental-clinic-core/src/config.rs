//! Runtime configuration and logging setup.
//!
//! Configuration comes from an optional JSON file, then `DENTAL_CLINIC_*`
//! environment variables override individual fields.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::schedule::{ConflictPolicy, ScheduleResult, TimeOfDay};

/// Application-level constants
pub const APP_NAME: &str = "Dental Clinic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dental_clinic_core=info"
}

/// Clinic configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// SQLite file; `None` keeps everything in memory
    pub database_path: Option<PathBuf>,
    /// `tracing` filter directive
    pub log_filter: String,
    pub scheduling: SchedulingConfig,
    /// Accounts allowed to run destructive operations. Empty disables the check.
    pub admin_emails: Vec<String>,
    pub debug: DebugConfig,
    pub poll: PollConfig,
}

/// Business hours and double-booking behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// `HH:MM`
    pub business_open: String,
    /// `HH:MM`
    pub business_close: String,
    pub slot_minutes: u16,
    pub conflict_policy: ConflictPolicy,
}

/// Development-only diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Skip the administrator check; only honoured in debug builds
    pub auth_bypass: bool,
}

/// Fallback polling intervals, used only when no invalidation signal is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub base_secs: u64,
    pub max_secs: u64,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: default_log_filter().to_string(),
            scheduling: SchedulingConfig::default(),
            admin_emails: Vec::new(),
            debug: DebugConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            business_open: "08:00".to_string(),
            business_close: "19:00".to_string(),
            slot_minutes: 30,
            conflict_policy: ConflictPolicy::Reject,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_secs: 30,
            max_secs: 600,
        }
    }
}

impl SchedulingConfig {
    /// Parsed opening and closing times.
    pub fn business_hours(&self) -> ScheduleResult<(TimeOfDay, TimeOfDay)> {
        Ok((self.business_open.parse()?, self.business_close.parse()?))
    }
}

impl ClinicConfig {
    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DENTAL_CLINIC_*` overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DENTAL_CLINIC_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup("DENTAL_CLINIC_LOG") {
            self.log_filter = filter;
        }
        if let Some(policy) = lookup("DENTAL_CLINIC_CONFLICT_POLICY") {
            self.scheduling.conflict_policy =
                serde_json::from_value(serde_json::Value::String(policy.to_lowercase()))
                    .with_context(|| format!("unknown conflict policy '{}'", policy))?;
        }
        if let Some(emails) = lookup("DENTAL_CLINIC_ADMIN_EMAILS") {
            self.admin_emails = emails
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(flag) = lookup("DENTAL_CLINIC_DEBUG") {
            self.debug.enabled = parse_flag(&flag);
        }
        if let Some(flag) = lookup("DENTAL_CLINIC_AUTH_BYPASS") {
            self.debug.auth_bypass = parse_flag(&flag);
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        let (open, close) = self
            .scheduling
            .business_hours()
            .context("invalid business hours")?;
        anyhow::ensure!(
            open < close,
            "business_open {} must be before business_close {}",
            open,
            close
        );
        anyhow::ensure!(self.scheduling.slot_minutes > 0, "slot_minutes must be positive");
        anyhow::ensure!(
            self.poll.base_secs > 0 && self.poll.base_secs <= self.poll.max_secs,
            "poll.base_secs must be positive and not exceed poll.max_secs"
        );
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `filter`. Returns false if a subscriber was already
/// installed (tests, embedding applications).
pub fn init_tracing(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init()
        .is_ok()
}
