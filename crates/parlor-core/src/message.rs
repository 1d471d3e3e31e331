//! Message types for Parlor.
//!
//! Messages are immutable once stored. Their [`MessageKind`] alone decides who
//! may see them.

use crate::error::{ChatError, Violation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The reserved `to` value addressing every participant.
pub const BROADCAST: &str = "Todos";

/// Text of the synthetic notice recorded on registration.
pub const JOINED_TEXT: &str = "joined";

/// Text of the synthetic notice recorded on eviction.
pub const LEFT_TEXT: &str = "left";

/// Message classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Public message, visible to everyone.
    Message,
    /// Message aimed at a single participant.
    PrivateMessage,
    /// Join/leave notice produced by the server.
    Status,
}

impl MessageKind {
    /// Wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// Whether clients may post messages of this kind.
    #[must_use]
    pub fn is_client_postable(&self) -> bool {
        !matches!(self, MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            _ => Err("Unknown message type"),
        }
    }
}

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender name.
    pub from: String,
    /// Recipient name or [`BROADCAST`].
    pub to: String,
    /// Message body.
    pub text: String,
    /// Classification.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Local time of persistence, `HH:MM:SS`.
    pub time: String,
}

impl Message {
    /// Build a synthetic status notice broadcast on behalf of `name`.
    #[must_use]
    pub fn status(name: impl Into<String>, text: &str, time: impl Into<String>) -> Self {
        Self {
            from: name.into(),
            to: BROADCAST.to_string(),
            text: text.to_string(),
            kind: MessageKind::Status,
            time: time.into(),
        }
    }

    /// Whether `viewer` is allowed to see this message.
    ///
    /// Public messages are visible to all. Anything else is visible when it is
    /// broadcast, addressed to the viewer, or sent by the viewer.
    #[must_use]
    pub fn is_visible_to(&self, viewer: &str) -> bool {
        self.kind == MessageKind::Message
            || self.to == BROADCAST
            || self.to == viewer
            || self.from == viewer
    }
}

/// Raw, unvalidated input for a client-posted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    /// Sender name, supplied by the transport.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Body.
    pub text: String,
    /// Requested kind, as sent by the client.
    pub kind: String,
}

impl MessageDraft {
    /// Create a new draft.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind: kind.into(),
        }
    }

    /// Check every constraint and return a validated draft.
    ///
    /// All violations are collected before failing.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] listing each violated field.
    pub fn validate(self) -> Result<ValidDraft, ChatError> {
        let mut violations = Vec::new();

        if self.from.is_empty() {
            violations.push(Violation::new("from", "must not be empty"));
        }
        if self.to.is_empty() {
            violations.push(Violation::new("to", "must not be empty"));
        }
        if self.text.is_empty() {
            violations.push(Violation::new("text", "must not be empty"));
        }
        let kind = match self.kind.parse::<MessageKind>() {
            Ok(kind) if kind.is_client_postable() => Some(kind),
            _ => {
                violations.push(Violation::new(
                    "type",
                    "must be one of message, private_message",
                ));
                None
            }
        };

        match kind {
            Some(kind) if violations.is_empty() => Ok(ValidDraft {
                from: self.from,
                to: self.to,
                text: self.text,
                kind,
            }),
            _ => Err(ChatError::Validation(violations)),
        }
    }
}

/// A draft that passed validation. Only [`MessageDraft::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    from: String,
    to: String,
    text: String,
    kind: MessageKind,
}

impl ValidDraft {
    /// Sender name.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Stamp the draft with its persistence time.
    #[must_use]
    pub fn into_message(self, time: impl Into<String>) -> Message {
        Message {
            from: self.from,
            to: self.to,
            text: self.text,
            kind: self.kind,
            time: time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: &str, to: &str, kind: MessageKind) -> Message {
        Message {
            from: from.to_string(),
            to: to.to_string(),
            text: "hi".to_string(),
            kind,
            time: "12:00:00".to_string(),
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("message".parse::<MessageKind>(), Ok(MessageKind::Message));
        assert_eq!("private_message".parse::<MessageKind>(), Ok(MessageKind::PrivateMessage));
        assert_eq!("status".parse::<MessageKind>(), Ok(MessageKind::Status));
        assert!("bogus".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_value(message("alice", "bob", MessageKind::PrivateMessage))
            .unwrap();
        assert_eq!(json["type"], "private_message");
        assert_eq!(json["from"], "alice");
        assert_eq!(json["time"], "12:00:00");
    }

    #[test]
    fn test_visibility() {
        let public = message("bob", "carol", MessageKind::Message);
        let to_alice = message("bob", "alice", MessageKind::PrivateMessage);
        let from_alice = message("alice", "bob", MessageKind::PrivateMessage);
        let broadcast = message("dave", BROADCAST, MessageKind::PrivateMessage);

        for msg in [&public, &to_alice, &from_alice, &broadcast] {
            assert!(msg.is_visible_to("alice"));
        }
        assert!(public.is_visible_to("carol"));
        assert!(!to_alice.is_visible_to("carol"));
        assert!(!from_alice.is_visible_to("carol"));
        assert!(broadcast.is_visible_to("carol"));
    }

    #[test]
    fn test_status_notice_is_broadcast() {
        let notice = Message::status("alice", LEFT_TEXT, "10:00:00");
        assert_eq!(notice.kind, MessageKind::Status);
        assert_eq!(notice.to, BROADCAST);
        assert!(notice.is_visible_to("anyone"));
    }

    #[test]
    fn test_validate_accepts_private_message() {
        let valid = MessageDraft::new("alice", "bob", "psst", "private_message")
            .validate()
            .unwrap();
        assert_eq!(valid.sender(), "alice");

        let stored = valid.into_message("08:15:00");
        assert_eq!(stored.kind, MessageKind::PrivateMessage);
        assert_eq!(stored.text, "psst");
    }

    #[test]
    fn test_validate_collects_every_violation() {
        let err = MessageDraft::new("", "", "", "bogus").validate().unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["from", "to", "text", "type"]);
    }

    #[test]
    fn test_validate_rejects_status_kind() {
        let err = MessageDraft::new("alice", BROADCAST, "left", "status")
            .validate()
            .unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "type");
    }
}
