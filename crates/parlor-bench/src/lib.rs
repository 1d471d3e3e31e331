//! Shared fixtures for the Parlor benchmarks.

use parlor_core::{MemoryStore, Message, MessageKind, Participant, Store, BROADCAST};
use std::sync::Arc;

/// Build a single-threaded runtime for driving async store calls.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Participant name used by the fixtures.
#[must_use]
pub fn participant_name(i: usize) -> String {
    format!("user-{i}")
}

/// Fill a store with `participants` records last seen at `last_status` and
/// `messages` messages cycling through public, private, and status kinds.
///
/// # Panics
///
/// Panics if the store rejects a fixture write.
pub async fn seed(store: &MemoryStore, participants: usize, messages: usize, last_status: u64) {
    for i in 0..participants {
        store
            .insert_participant(Participant::new(participant_name(i), last_status))
            .await
            .expect("seed participant");
    }

    let batch = (0..messages)
        .map(|i| {
            let from = participant_name(i % participants.max(1));
            let (to, kind) = match i % 3 {
                0 => (BROADCAST.to_string(), MessageKind::Message),
                1 => (
                    participant_name((i + 1) % participants.max(1)),
                    MessageKind::PrivateMessage,
                ),
                _ => (BROADCAST.to_string(), MessageKind::Status),
            };
            Message {
                from,
                to,
                text: format!("message {i}"),
                kind,
                time: "12:00:00".to_string(),
            }
        })
        .collect();
    store.insert_messages(batch).await.expect("seed messages");
}

/// A seeded store behind a shared handle.
pub async fn seeded_store(participants: usize, messages: usize) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, participants, messages, 0).await;
    store
}
