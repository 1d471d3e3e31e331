//! Message routing for Parlor.
//!
//! The router validates and persists client messages and computes what each
//! viewer is allowed to read. It reads participant existence but never
//! modifies participants.

use crate::error::ChatError;
use crate::message::{Message, MessageDraft};
use crate::participant::{format_clock, now_millis};
use crate::store::Store;
use std::num::IntErrorKind;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parse a raw `limit` value as supplied by a client.
///
/// # Errors
///
/// Returns [`ChatError::Validation`] if the value is present but not an
/// integer. Range checks happen in [`MessageRouter::list_visible`].
pub fn parse_limit(raw: Option<&str>) -> Result<Option<i64>, ChatError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(limit) => Ok(Some(limit)),
        // Too large to count, so it cannot cut anything off.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(Some(i64::MAX)),
        Err(_) => Err(ChatError::invalid("limit", "must be a positive integer")),
    }
}

/// Validates, stores, and filters chat messages.
#[derive(Clone)]
pub struct MessageRouter {
    store: Arc<dyn Store>,
}

impl MessageRouter {
    /// Create a router over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and store a client message.
    ///
    /// Input is validated before the sender is looked up, so a malformed post
    /// from an unknown sender reports the validation problems.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] listing every bad field,
    /// [`ChatError::Unauthenticated`] if the sender is not active, or
    /// [`ChatError::Storage`] if the store fails.
    pub async fn post_message(&self, draft: MessageDraft) -> Result<Message, ChatError> {
        let valid = draft.validate()?;

        if self.store.find_participant(valid.sender()).await?.is_none() {
            return Err(ChatError::Unauthenticated(valid.sender().to_string()));
        }

        let message = valid.into_message(format_clock(now_millis()));
        self.store.insert_message(message.clone()).await?;

        debug!(from = %message.from, to = %message.to, kind = %message.kind, "Message stored");
        Ok(message)
    }

    /// Messages visible to `viewer`, in insertion order.
    ///
    /// With a `limit`, only the most recent `limit` visible messages are
    /// returned, still oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] if `limit` is zero or negative, or
    /// [`ChatError::Storage`] if the store fails.
    pub async fn list_visible(
        &self,
        viewer: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatError> {
        let limit = match limit {
            None => None,
            Some(n) if n > 0 => Some(usize::try_from(n).unwrap_or(usize::MAX)),
            Some(_) => return Err(ChatError::invalid("limit", "must be a positive integer")),
        };

        let mut visible: Vec<Message> = self
            .store
            .list_messages()
            .await?
            .into_iter()
            .filter(|m| m.is_visible_to(viewer))
            .collect();

        if let Some(limit) = limit {
            let skip = visible.len().saturating_sub(limit);
            visible.drain(..skip);
        }

        trace!(viewer = %viewer, count = visible.len(), "Listed visible messages");
        Ok(visible)
    }
}
