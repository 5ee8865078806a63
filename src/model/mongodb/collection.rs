use std::ops::Deref;

use mongodb::{bson::doc, error::Error as DbError, Collection, Database, IndexModel};

use crate::model::db::{Event, User, Vote};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}

const EVENTS: &str = "events";
impl MongoCollection for Event {
    const NAME: &'static str = EVENTS;
}

const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Event collection: owner lookups for cascading deletes.
    let owner_index = IndexModel::builder().keys(doc! {"user_id": 1}).build();
    Coll::<Event>::from_db(db)
        .create_index(owner_index, None)
        .await?;

    // Vote collection: per-event lookups and time-range audits.
    let event_index = IndexModel::builder().keys(doc! {"event_id": 1}).build();
    let time_index = IndexModel::builder().keys(doc! {"timestamp": 1}).build();
    let votes = Coll::<Vote>::from_db(db);
    votes.create_index(event_index, None).await?;
    votes.create_index(time_index, None).await?;

    Ok(())
}
