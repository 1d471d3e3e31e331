//! # parlor-protocol
//!
//! HTTP wire types for the Parlor chat relay.
//!
//! This crate defines the JSON bodies exchanged between clients and the
//! Parlor server. It performs no I/O.
//!
//! ## Endpoints
//!
//! - `POST /participants` - [`RegisterRequest`]
//! - `POST /messages` - [`PostMessageRequest`], sender in the [`USER_HEADER`]
//! - `GET /messages` - [`MessagesQuery`], viewer in the [`USER_HEADER`]
//! - `POST /status` - heartbeat for the [`USER_HEADER`] participant
//!
//! Failures carry an [`ErrorBody`].
//!
//! ## Example
//!
//! ```rust
//! use parlor_protocol::PostMessageRequest;
//!
//! let body: PostMessageRequest =
//!     serde_json::from_str(r#"{"to": "Todos", "text": "hi", "type": "message"}"#).unwrap();
//! assert_eq!(body.kind, "message");
//! ```

pub mod errors;
pub mod requests;

pub use errors::{ErrorBody, FieldError};
pub use requests::{MessagesQuery, PostMessageRequest, RegisterRequest, USER_HEADER};
