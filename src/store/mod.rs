//! The storage collaborator.
//!
//! Handlers and the vote transaction talk to storage only through [`Store`]
//! and [`Transaction`], so the same logic runs on MongoDB in production and
//! on the in-memory adapter in tests.

use std::ops::{Deref, Range};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    State,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    db::{Event, EventChanges, NewEvent, NewUser, NewVote, User, Vote},
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// What happens to an event's votes when the event is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteRetention {
    /// Votes stay as a permanent audit trail.
    #[default]
    Keep,
    /// Votes are deleted along with their event.
    Cascade,
}

/// Durable records for users, events, and votes.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Insert a user, returning it with its new ID.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Id) -> Result<Option<User>>;

    /// All users, in insertion order.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Atomically delete a user together with every event they own.
    /// Returns whether the user existed.
    async fn delete_user(&self, id: Id, retention: VoteRetention) -> Result<bool>;

    /// Insert an event, returning it with its new ID.
    async fn insert_event(&self, event: NewEvent) -> Result<Event>;

    async fn find_event(&self, id: Id) -> Result<Option<Event>>;

    async fn count_events(&self) -> Result<u64>;

    /// The events at positions `range` in insertion order.
    async fn list_events(&self, range: Range<u64>) -> Result<Vec<Event>>;

    /// Apply `changes` to an event, returning the updated event, or `None`
    /// if it does not exist.
    async fn update_event(&self, id: Id, changes: EventChanges) -> Result<Option<Event>>;

    /// Delete an event. Returns whether it existed.
    async fn delete_event(&self, id: Id, retention: VoteRetention) -> Result<bool>;

    /// Every vote whose timestamp lies in `[start, end]`, in insertion order.
    async fn votes_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Vote>>;

    /// Open a serializable unit of work.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// A unit of work over the rows a vote touches.
///
/// Reads observe the transaction's own staged writes. Nothing is visible to
/// other readers until [`Transaction::commit`] succeeds; dropping the
/// transaction without committing discards every staged write.
#[rocket::async_trait]
pub trait Transaction: Send {
    async fn event(&mut self, id: Id) -> Result<Option<Event>>;

    async fn user(&mut self, id: Id) -> Result<Option<User>>;

    /// Stage a new ledger entry, returning its ID.
    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id>;

    /// Stage a decrease of a user's credits.
    /// Fails with `InsufficientCredits` rather than going below zero.
    async fn debit_credits(&mut self, user_id: Id, amount: u32) -> Result<()>;

    /// Stage an increase of an event's tally.
    async fn credit_tally(&mut self, event_id: Id, amount: u32) -> Result<()>;

    /// Apply every staged write at once.
    async fn commit(&mut self) -> Result<()>;
}

/// Shared handle on the configured store, placed in managed state and
/// available to handlers as a request guard.
#[derive(Clone)]
pub struct Storage(Arc<dyn Store>);

impl Storage {
    pub fn new(store: impl Store + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Storage {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Storage {
    type Error = ();

    /// Get the store from the managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.guard::<&State<Storage>>().await {
            request::Outcome::Success(storage) => request::Outcome::Success(storage.inner().clone()),
            _ => {
                error!("Storage requested but not present in managed state");
                request::Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
