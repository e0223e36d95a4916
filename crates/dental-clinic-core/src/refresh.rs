//! Keeping caller-side copies fresh.
//!
//! Callers hold transient copies of records. After a local mutation they
//! invalidate the affected queries and refetch; responses for a request that
//! was superseded (a newer request for the same query, or an invalidation)
//! are dropped instead of overwriting newer state. Polling is only a
//! fallback, with exponential backoff while nothing changes.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::debug;

/// Query keys used by the FFI layer.
pub mod keys {
    pub const PATIENTS: &str = "patients";
    pub const APPOINTMENTS: &str = "appointments";
    pub const TREATMENTS: &str = "treatments";
    pub const INVOICES: &str = "invoices";
    pub const INVENTORY: &str = "inventory";
    pub const ODONTOGRAMS: &str = "odontograms";
    pub const DASHBOARD: &str = "dashboard";

    /// Key for one record or sub-list, e.g. `appointments/2025-01-10`.
    pub fn scoped(base: &str, scope: &str) -> String {
        format!("{}/{}", base, scope)
    }
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: String,
    generation: u64,
}

impl RequestTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Latest-request bookkeeping per logical query.
#[derive(Debug, Default)]
pub struct QueryTracker {
    generations: HashMap<String, u64>,
    stale: HashSet<String>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, key: &str) -> u64 {
        let generation = self.generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Register a new request; earlier tickets for `key` become stale.
    pub fn begin(&mut self, key: &str) -> RequestTicket {
        let generation = self.bump(key);
        self.stale.remove(key);
        RequestTicket {
            key: key.to_string(),
            generation,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.is_latest(&ticket.key, ticket.generation)
    }

    /// Same check for callers that only carry the key and generation across FFI.
    pub fn is_latest(&self, key: &str, generation: u64) -> bool {
        self.generations.get(key) == Some(&generation)
    }

    /// Hand back `value` only if the ticket is still the latest for its query.
    pub fn complete<T>(&self, ticket: &RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(
                key = %ticket.key,
                generation = ticket.generation,
                "Discarding superseded response"
            );
            None
        }
    }

    /// Mark a query as needing a refetch and supersede any in-flight request.
    pub fn invalidate(&mut self, key: &str) {
        self.bump(key);
        self.stale.insert(key.to_string());
    }

    /// Invalidate `prefix` and every key scoped under it. Returns how many keys were touched.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let scoped = format!("{}/", prefix);
        let mut matching: Vec<String> = self
            .generations
            .keys()
            .filter(|key| key.as_str() == prefix || key.starts_with(&scoped))
            .cloned()
            .collect();
        if !matching.iter().any(|key| key == prefix) {
            matching.push(prefix.to_string());
        }
        for key in &matching {
            self.invalidate(key);
        }
        matching.len()
    }

    /// Whether the caller should refetch `key`.
    pub fn needs_refresh(&self, key: &str) -> bool {
        self.stale.contains(key)
    }
}

/// Polling interval with exponential backoff while nothing changes.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl PollBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Wait before the next poll, given whether the last poll saw a change.
    pub fn next_interval(&mut self, changed: bool) -> Duration {
        self.current = if changed {
            self.base
        } else {
            (self.current * 2).min(self.max)
        };
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut tracker = QueryTracker::new();
        let first = tracker.begin(keys::APPOINTMENTS);
        let second = tracker.begin(keys::APPOINTMENTS);

        assert_eq!(tracker.complete(&first, "old"), None);
        assert_eq!(tracker.complete(&second, "new"), Some("new"));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = QueryTracker::new();
        let appointments = tracker.begin(keys::APPOINTMENTS);
        let _patients = tracker.begin(keys::PATIENTS);
        assert!(tracker.is_current(&appointments));
    }

    #[test]
    fn test_invalidation_discards_in_flight_and_flags_refresh() {
        let mut tracker = QueryTracker::new();
        let ticket = tracker.begin(keys::INVOICES);
        assert!(!tracker.needs_refresh(keys::INVOICES));

        tracker.invalidate(keys::INVOICES);
        assert!(tracker.needs_refresh(keys::INVOICES));
        assert_eq!(tracker.complete(&ticket, 1), None);

        let refetch = tracker.begin(keys::INVOICES);
        assert!(!tracker.needs_refresh(keys::INVOICES));
        assert_eq!(tracker.complete(&refetch, 2), Some(2));
    }

    #[test]
    fn test_invalidate_prefix() {
        let mut tracker = QueryTracker::new();
        let day = keys::scoped(keys::APPOINTMENTS, "2025-01-10");
        let day_ticket = tracker.begin(&day);
        let patients = tracker.begin(keys::PATIENTS);

        let touched = tracker.invalidate_prefix(keys::APPOINTMENTS);
        assert_eq!(touched, 2);
        assert!(!tracker.is_current(&day_ticket));
        assert!(tracker.needs_refresh(&day));
        assert!(tracker.needs_refresh(keys::APPOINTMENTS));
        assert!(tracker.is_current(&patients));
    }

    #[test]
    fn test_prefix_does_not_match_similar_names() {
        let mut tracker = QueryTracker::new();
        let other = tracker.begin("appointments_archive");
        tracker.invalidate_prefix(keys::APPOINTMENTS);
        assert!(tracker.is_current(&other));
    }

    #[test]
    fn test_poll_backoff() {
        let mut backoff = PollBackoff::new(Duration::from_secs(30), Duration::from_secs(100));
        assert_eq!(backoff.next_interval(false), Duration::from_secs(60));
        assert_eq!(backoff.next_interval(false), Duration::from_secs(100));
        assert_eq!(backoff.next_interval(false), Duration::from_secs(100));
        assert_eq!(backoff.next_interval(true), Duration::from_secs(30));
    }
}
