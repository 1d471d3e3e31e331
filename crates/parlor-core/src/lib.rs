//! # parlor-core
//!
//! Presence and message model for the Parlor chat relay.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Store** - Storage trait shared by every component, plus an in-memory store
//! - **Presence** - Participant registration, heartbeats, and eviction
//! - **Router** - Message validation, persistence, and per-viewer visibility
//! - **Sweep** - Fixed-interval background eviction
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │  Transport  │──┬─▶│  Presence   │──┐
//! └─────────────┘  │  └─────────────┘  │  ┌─────────────┐
//!                  │         ▲         ├─▶│    Store    │
//!                  │  ┌─────────────┐  │  └─────────────┘
//!                  │  │    Sweep    │  │
//!                  │  └─────────────┘  │
//!                  │  ┌─────────────┐  │
//!                  └─▶│   Router    │──┘
//!                     └─────────────┘
//! ```

pub mod error;
pub mod message;
pub mod participant;
pub mod presence;
pub mod router;
pub mod store;
pub mod sweep;

pub use error::{ChatError, StoreError, Violation};
pub use message::{Message, MessageDraft, MessageKind, BROADCAST};
pub use participant::Participant;
pub use presence::{PresenceManager, SweepReport};
pub use router::{parse_limit, MessageRouter};
pub use store::{MemoryStore, ParticipantFilter, Store};
pub use sweep::{SweepConfig, SweepHandle, SweepScheduler};
