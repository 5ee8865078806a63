use std::ops::Range;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    error::Error as DbError,
    options::{
        Acknowledgment, FindOneAndUpdateOptions, FindOptions, ReadConcern, ReturnDocument,
        TransactionOptions, WriteConcern,
    },
    Client, ClientSession, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    db::{Event, EventChanges, NewEvent, NewUser, NewVote, User, Vote},
    mongodb::{ensure_indexes_exist, is_unknown_commit_result, Coll, Id},
};

use super::{Store, Transaction, VoteRetention};

/// A store backed by a MongoDB replica set.
/// Multi-document transactions require a replica set or sharded cluster.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    users: Coll<User>,
    events: Coll<Event>,
    votes: Coll<Vote>,
}

impl MongoStore {
    /// Connect to the given database and make sure its indexes exist.
    pub async fn connect(db_uri: &str, db_name: &str) -> Result<Self, DbError> {
        let client = Client::with_uri_str(db_uri).await?;
        let db = client.database(db_name);
        ensure_indexes_exist(&db).await?;
        Ok(Self::from_db(client, &db))
    }

    pub fn from_db(client: Client, db: &Database) -> Self {
        Self {
            client,
            users: Coll::from_db(db),
            events: Coll::from_db(db),
            votes: Coll::from_db(db),
        }
    }

    /// Snapshot reads and majority writes: a transaction either sees every
    /// write of a concurrent committed transaction or none of them, and two
    /// transactions writing the same document cannot both commit.
    fn transaction_options() -> TransactionOptions {
        TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build()
    }

    async fn start_transaction(&self) -> Result<ClientSession, DbError> {
        let mut session = self.client.start_session(None).await?;
        session
            .start_transaction(Self::transaction_options())
            .await?;
        Ok(session)
    }

    /// Insertion order. ObjectIds generated by one process increase
    /// monotonically, which is as close as MongoDB gets without a counter.
    fn insertion_order() -> Document {
        doc! { "_id": 1 }
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = User { id: Id::new(), user };
        self.users.insert_one(&user, None).await?;
        Ok(user)
    }

    async fn find_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.users.find_one(id.as_doc(), None).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let options = FindOptions::builder()
            .sort(Self::insertion_order())
            .build();
        Ok(self.users.find(None, options).await?.try_collect().await?)
    }

    async fn delete_user(&self, id: Id, retention: VoteRetention) -> Result<bool> {
        let mut session = self.start_transaction().await?;

        let result = self
            .users
            .delete_one_with_session(id.as_doc(), None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        // Find the owned events before removing them, for the vote cascade.
        let owned_filter = doc! { "user_id": id };
        let mut owned = Vec::new();
        let mut cursor = self
            .events
            .find_with_session(owned_filter.clone(), None, &mut session)
            .await?;
        while let Some(event) = cursor.next(&mut session).await {
            owned.push(event?.id);
        }
        drop(cursor);

        self.events
            .delete_many_with_session(owned_filter, None, &mut session)
            .await?;
        if retention == VoteRetention::Cascade && !owned.is_empty() {
            let filter = doc! { "event_id": { "$in": owned } };
            self.votes
                .delete_many_with_session(filter, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(true)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        let event = Event {
            id: Id::new(),
            event,
        };
        self.events.insert_one(&event, None).await?;
        Ok(event)
    }

    async fn find_event(&self, id: Id) -> Result<Option<Event>> {
        Ok(self.events.find_one(id.as_doc(), None).await?)
    }

    async fn count_events(&self) -> Result<u64> {
        Ok(self.events.count_documents(None, None).await?)
    }

    async fn list_events(&self, range: Range<u64>) -> Result<Vec<Event>> {
        // A limit of zero means "no limit" to MongoDB.
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(range.end - range.start).unwrap_or(i64::MAX);
        let options = FindOptions::builder()
            .sort(Self::insertion_order())
            .skip(range.start)
            .limit(limit)
            .build();
        Ok(self.events.find(None, options).await?.try_collect().await?)
    }

    async fn update_event(&self, id: Id, changes: EventChanges) -> Result<Option<Event>> {
        // An empty `$set` is an error to MongoDB.
        if changes.is_empty() {
            return self.find_event(id).await;
        }
        let mut set = Document::new();
        if let Some(name) = changes.name {
            set.insert("name", name);
        }
        if let Some(keyword) = changes.keyword {
            set.insert("keyword", keyword);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .events
            .find_one_and_update(id.as_doc(), doc! { "$set": set }, options)
            .await?)
    }

    async fn delete_event(&self, id: Id, retention: VoteRetention) -> Result<bool> {
        if retention == VoteRetention::Keep {
            let result = self.events.delete_one(id.as_doc(), None).await?;
            return Ok(result.deleted_count == 1);
        }

        let mut session = self.start_transaction().await?;
        let result = self
            .events
            .delete_one_with_session(id.as_doc(), None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }
        self.votes
            .delete_many_with_session(doc! { "event_id": id }, None, &mut session)
            .await?;
        session.commit_transaction().await?;
        Ok(true)
    }

    async fn votes_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Vote>> {
        let filter = doc! {
            "timestamp": {
                "$gte": BsonDateTime::from_chrono(start),
                "$lte": BsonDateTime::from_chrono(end),
            }
        };
        let options = FindOptions::builder()
            .sort(Self::insertion_order())
            .build();
        Ok(self.votes.find(filter, options).await?.try_collect().await?)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let session = self.start_transaction().await?;
        Ok(Box::new(MongoTransaction {
            session,
            users: self.users.clone(),
            events: self.events.clone(),
            votes: self.votes.clone(),
        }))
    }
}

/// A vote transaction on a MongoDB client session.
/// Dropping the session without committing aborts the transaction.
struct MongoTransaction {
    session: ClientSession,
    users: Coll<User>,
    events: Coll<Event>,
    votes: Coll<Vote>,
}

#[rocket::async_trait]
impl Transaction for MongoTransaction {
    async fn event(&mut self, id: Id) -> Result<Option<Event>> {
        Ok(self
            .events
            .find_one_with_session(id.as_doc(), None, &mut self.session)
            .await?)
    }

    async fn user(&mut self, id: Id) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one_with_session(id.as_doc(), None, &mut self.session)
            .await?)
    }

    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id> {
        let vote = Vote {
            id: Id::new(),
            vote: vote.clone(),
        };
        self.votes
            .insert_one_with_session(&vote, None, &mut self.session)
            .await?;
        Ok(vote.id)
    }

    async fn debit_credits(&mut self, user_id: Id, amount: u32) -> Result<()> {
        let amount_i64 = i64::from(amount);
        // The balance condition lives in the filter so the update can never
        // take the balance below zero, whatever the caller checked earlier.
        let filter = doc! {
            "_id": user_id,
            "vote_credits": { "$gte": amount_i64 },
        };
        let update = doc! {
            "$inc": { "vote_credits": -amount_i64 },
        };
        let result = self
            .users
            .update_one_with_session(filter, update, None, &mut self.session)
            .await?;
        if result.matched_count == 1 {
            return Ok(());
        }
        match self.user(user_id).await? {
            Some(user) => Err(Error::InsufficientCredits {
                requested: u64::from(amount),
                available: user.vote_credits,
            }),
            None => Err(Error::not_found(format!("User {user_id}"))),
        }
    }

    async fn credit_tally(&mut self, event_id: Id, amount: u32) -> Result<()> {
        let update = doc! {
            "$inc": { "vote_tally": i64::from(amount) },
        };
        let result = self
            .events
            .update_one_with_session(event_id.as_doc(), update, None, &mut self.session)
            .await?;
        if result.matched_count != 1 {
            return Err(Error::not_found(format!("Event {event_id}")));
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        commit_with_retry(&mut self.session).await?;
        Ok(())
    }
}

/// How many times a commit with an unknown outcome is attempted.
const COMMIT_ATTEMPTS: usize = 3;

/// A transaction that can be committed, and can tell when a failed commit
/// may in fact have applied.
#[rocket::async_trait]
trait Commit {
    type Error: Send;

    async fn try_commit(&mut self) -> Result<(), Self::Error>;

    fn outcome_unknown(err: &Self::Error) -> bool;
}

#[rocket::async_trait]
impl Commit for ClientSession {
    type Error = DbError;

    async fn try_commit(&mut self) -> Result<(), DbError> {
        self.commit_transaction().await
    }

    fn outcome_unknown(err: &DbError) -> bool {
        is_unknown_commit_result(err)
    }
}

/// Commit, retrying while the server cannot say whether the commit applied.
async fn commit_with_retry<C: Commit + Send>(session: &mut C) -> Result<(), C::Error> {
    let mut attempt = 1;
    loop {
        match session.try_commit().await {
            Err(err) if C::outcome_unknown(&err) && attempt < COMMIT_ATTEMPTS => {
                warn!("Commit outcome unknown, retrying (attempt {attempt} of {COMMIT_ATTEMPTS})");
                attempt += 1;
            }
            result => return result,
        }
    }
}
