//! Participant presence for Parlor.
//!
//! Presence is detection-based: a participant stays active as long as it keeps
//! sending heartbeats, and the periodic sweep evicts anyone who stops.

use crate::error::{ChatError, StoreError};
use crate::message::{Message, JOINED_TEXT, LEFT_TEXT};
use crate::participant::{format_clock, now_millis, Participant};
use crate::store::{ParticipantFilter, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default inactivity timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Participants last seen at or before this instant were considered stale.
    pub cutoff: u64,
    /// Names actually removed by this pass.
    pub evicted: Vec<String>,
}

impl SweepReport {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }
}

/// Owns the participant lifecycle: registration, heartbeats, and eviction.
#[derive(Clone)]
pub struct PresenceManager {
    store: Arc<dyn Store>,
}

impl PresenceManager {
    /// Create a presence manager over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new participant at the current time.
    ///
    /// # Errors
    ///
    /// See [`PresenceManager::register_at`].
    pub async fn register(&self, name: &str) -> Result<Participant, ChatError> {
        self.register_at(name, now_millis()).await
    }

    /// Register a new participant as seen at `now`.
    ///
    /// The participant record is written before its `joined` notice.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] for an empty name,
    /// [`ChatError::Conflict`] if the name is taken, or
    /// [`ChatError::Storage`] if the store fails.
    pub async fn register_at(&self, name: &str, now: u64) -> Result<Participant, ChatError> {
        if name.is_empty() {
            return Err(ChatError::invalid("name", "must not be empty"));
        }

        let participant = Participant::new(name, now);
        self.store
            .insert_participant(participant.clone())
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(name) => ChatError::Conflict(name),
                other => ChatError::Storage(other),
            })?;

        self.store
            .insert_message(Message::status(name, JOINED_TEXT, format_clock(now)))
            .await?;

        debug!(participant = %name, "Participant joined");
        Ok(participant)
    }

    /// Refresh a participant's heartbeat to the current time.
    ///
    /// # Errors
    ///
    /// See [`PresenceManager::heartbeat_at`].
    pub async fn heartbeat(&self, name: &str) -> Result<(), ChatError> {
        self.heartbeat_at(name, now_millis()).await
    }

    /// Refresh a participant's heartbeat to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotFound`] if the participant is not active, or
    /// [`ChatError::Storage`] if the store fails.
    pub async fn heartbeat_at(&self, name: &str, now: u64) -> Result<(), ChatError> {
        if self.store.update_participant_status(name, now).await? {
            debug!(participant = %name, "Heartbeat");
            Ok(())
        } else {
            Err(ChatError::NotFound(name.to_string()))
        }
    }

    /// All active participants, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the store fails.
    pub async fn list_active(&self) -> Result<Vec<Participant>, ChatError> {
        Ok(self
            .store
            .list_participants(&ParticipantFilter::all())
            .await?)
    }

    /// Check whether `name` is an active participant.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the store fails.
    pub async fn is_active(&self, name: &str) -> Result<bool, ChatError> {
        Ok(self.store.find_participant(name).await?.is_some())
    }

    /// Evict every participant last seen at or before `now - timeout`.
    ///
    /// One `left` notice is written per stale participant, then each selected
    /// record is deleted by name. Selection always re-reads the store, so a
    /// repeated pass never evicts the same participant twice.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the store fails. Writes made before
    /// the failure are kept.
    pub async fn sweep(&self, now: u64, timeout: Duration) -> Result<SweepReport, ChatError> {
        let cutoff = now.saturating_sub(timeout.as_millis() as u64);
        let stale = self
            .store
            .list_participants(&ParticipantFilter::stale(cutoff))
            .await?;

        let mut report = SweepReport {
            cutoff,
            evicted: Vec::new(),
        };
        if stale.is_empty() {
            return Ok(report);
        }

        let time = format_clock(now);
        let notices = stale
            .iter()
            .map(|p| Message::status(p.name.as_str(), LEFT_TEXT, time.as_str()))
            .collect();
        self.store.insert_messages(notices).await?;

        // Every notice written above is matched by a removal, even if the
        // participant heartbeats in between.
        for participant in stale {
            let filter = ParticipantFilter::named(participant.name.as_str());
            if self.store.delete_participants(&filter).await? > 0 {
                debug!(participant = %participant.name, "Participant timed out");
                report.evicted.push(participant.name);
            }
        }

        info!(evicted = report.evicted.len(), cutoff, "Sweep complete");
        Ok(report)
    }
}
