//! Storage abstraction for Parlor.
//!
//! The presence manager and the message router share one [`Store`] handle and
//! keep no state of their own, so every decision re-reads the store.

use crate::error::StoreError;
use crate::message::Message;
use crate::participant::Participant;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::trace;

/// Selects participant records.
///
/// An empty filter matches every participant. Set fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantFilter {
    /// Exact, case-sensitive name.
    pub name: Option<String>,
    /// Match only records with `last_status <= stale_at`.
    pub stale_at: Option<u64>,
}

impl ParticipantFilter {
    /// Match every participant.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the participant with this name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            stale_at: None,
        }
    }

    /// Match participants last seen at or before `cutoff`.
    #[must_use]
    pub fn stale(cutoff: u64) -> Self {
        Self {
            name: None,
            stale_at: Some(cutoff),
        }
    }

    /// Additionally restrict to `name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check a record against this filter.
    #[must_use]
    pub fn matches(&self, participant: &Participant) -> bool {
        self.name.as_deref().map_or(true, |n| n == participant.name)
            && self.stale_at.map_or(true, |c| participant.is_stale(c))
    }
}

/// Persistence for participants and messages.
///
/// Every method may suspend. Implementations must preserve message insertion
/// order and must reject a second participant with the same name.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up an active participant by name.
    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, StoreError>;

    /// Insert a participant.
    ///
    /// Fails with [`StoreError::Duplicate`] if the name is taken.
    async fn insert_participant(&self, participant: Participant) -> Result<(), StoreError>;

    /// Set a participant's `last_status`.
    ///
    /// Returns `false` if no participant has that name.
    async fn update_participant_status(
        &self,
        name: &str,
        last_status: u64,
    ) -> Result<bool, StoreError>;

    /// List participants matching `filter`, in no particular order.
    async fn list_participants(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Delete participants matching `filter` and return how many were removed.
    async fn delete_participants(&self, filter: &ParticipantFilter) -> Result<usize, StoreError>;

    /// Append a message.
    async fn insert_message(&self, message: Message) -> Result<(), StoreError>;

    /// Append several messages, keeping their relative order.
    async fn insert_messages(&self, messages: Vec<Message>) -> Result<(), StoreError>;

    /// All messages in insertion order.
    async fn list_messages(&self) -> Result<Vec<Message>, StoreError>;
}

/// In-process store.
///
/// Participants sit in a concurrent map so the uniqueness check and the insert
/// happen under the same shard lock. Messages are an append-only log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    participants: DashMap<String, Participant>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active participants.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, StoreError> {
        Ok(self.participants.get(name).map(|p| p.value().clone()))
    }

    async fn insert_participant(&self, participant: Participant) -> Result<(), StoreError> {
        match self.participants.entry(participant.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(participant.name)),
            Entry::Vacant(slot) => {
                trace!(participant = %participant.name, "Inserted participant");
                slot.insert(participant);
                Ok(())
            }
        }
    }

    async fn update_participant_status(
        &self,
        name: &str,
        last_status: u64,
    ) -> Result<bool, StoreError> {
        match self.participants.get_mut(name) {
            Some(mut participant) => {
                participant.last_status = last_status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_participants(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .participants
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_participants(&self, filter: &ParticipantFilter) -> Result<usize, StoreError> {
        if let Some(name) = &filter.name {
            let removed = self
                .participants
                .remove_if(name.as_str(), |_, participant| filter.matches(participant));
            return Ok(usize::from(removed.is_some()));
        }

        let before = self.participants.len();
        self.participants
            .retain(|_, participant| !filter.matches(participant));
        Ok(before.saturating_sub(self.participants.len()))
    }

    async fn insert_message(&self, message: Message) -> Result<(), StoreError> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn insert_messages(&self, messages: Vec<Message>) -> Result<(), StoreError> {
        self.messages.write().await.extend(messages);
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, JOINED_TEXT, LEFT_TEXT};

    #[test]
    fn test_filter_matching() {
        let alice = Participant::new("alice", 100);

        assert!(ParticipantFilter::all().matches(&alice));
        assert!(ParticipantFilter::named("alice").matches(&alice));
        assert!(!ParticipantFilter::named("Alice").matches(&alice));
        assert!(ParticipantFilter::stale(100).matches(&alice));
        assert!(!ParticipantFilter::stale(99).with_name("alice").matches(&alice));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_name() {
        let store = MemoryStore::new();
        store
            .insert_participant(Participant::new("alice", 1))
            .await
            .unwrap();

        let err = store
            .insert_participant(Participant::new("alice", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(name) if name == "alice"));

        let stored = store.find_participant("alice").await.unwrap().unwrap();
        assert_eq!(stored.last_status, 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = MemoryStore::new();
        store
            .insert_participant(Participant::new("alice", 1))
            .await
            .unwrap();

        assert!(store.update_participant_status("alice", 50).await.unwrap());
        assert!(!store.update_participant_status("bob", 50).await.unwrap());
        assert_eq!(
            store.find_participant("alice").await.unwrap().unwrap().last_status,
            50
        );
    }

    #[tokio::test]
    async fn test_delete_by_filter() {
        let store = MemoryStore::new();
        for (name, seen) in [("alice", 10), ("bob", 20), ("carol", 30)] {
            store
                .insert_participant(Participant::new(name, seen))
                .await
                .unwrap();
        }

        // Named delete honours the stale cutoff too
        let kept = ParticipantFilter::stale(15).with_name("bob");
        assert_eq!(store.delete_participants(&kept).await.unwrap(), 0);

        assert_eq!(
            store
                .delete_participants(&ParticipantFilter::stale(20))
                .await
                .unwrap(),
            2
        );
        assert_eq!(store.participant_count(), 1);
        assert!(store.find_participant("carol").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .insert_message(Message::status("alice", JOINED_TEXT, "10:00:00"))
            .await
            .unwrap();
        store
            .insert_messages(vec![
                Message::status("bob", LEFT_TEXT, "10:00:01"),
                Message::status("carol", LEFT_TEXT, "10:00:01"),
            ])
            .await
            .unwrap();

        let senders: Vec<_> = store
            .list_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.from)
            .collect();
        assert_eq!(senders, vec!["alice", "bob", "carol"]);
        assert_eq!(store.message_count().await, 3);
    }
}
