//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.
//! - Property names follow the legacy client's camelCase, except for users.

pub mod event;
pub mod id;
pub mod range;
pub mod timestamp;
pub mod user;
pub mod vote;
