//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//! - Each stored record is a `...Core` flattened next to its `_id`.

mod event;
pub use event::{Event, EventChanges, EventCore, NewEvent};

mod user;
pub use user::{NewUser, User, UserCore};

mod vote;
pub use vote::{NewVote, Vote, VoteCore};
