//! Participant records and clock helpers.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Render a millisecond timestamp as local `HH:MM:SS`.
#[must_use]
pub fn format_clock(millis: u64) -> String {
    match Local.timestamp_millis_opt(millis as i64).single() {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None => Local::now().format("%H:%M:%S").to_string(),
    }
}

/// A registered chat identity.
///
/// The name is the participant's only credential; there is no session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique display name.
    pub name: String,
    /// Milliseconds since epoch of the latest registration or heartbeat.
    pub last_status: u64,
}

impl Participant {
    /// Create a participant last seen at `last_status`.
    #[must_use]
    pub fn new(name: impl Into<String>, last_status: u64) -> Self {
        Self {
            name: name.into(),
            last_status,
        }
    }

    /// Whether this participant's last heartbeat is at or before `cutoff`.
    #[must_use]
    pub fn is_stale(&self, cutoff: u64) -> bool {
        self.last_status <= cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_staleness() {
        let alice = Participant::new("alice", 1_000);

        assert!(alice.is_stale(1_000));
        assert!(alice.is_stale(2_000));
        assert!(!alice.is_stale(999));
    }

    #[test]
    fn test_participant_wire_names() {
        let json = serde_json::to_value(Participant::new("bob", 42)).unwrap();
        assert_eq!(json["name"], "bob");
        assert_eq!(json["lastStatus"], 42);
    }

    #[test]
    fn test_format_clock_shape() {
        let clock = format_clock(now_millis());
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }
}
