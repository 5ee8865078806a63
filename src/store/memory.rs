use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Error, Result};
use crate::model::{
    db::{Event, EventChanges, NewEvent, NewUser, NewVote, User, Vote},
    mongodb::Id,
};

use super::{Store, Transaction, VoteRetention};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    votes: Vec<Vote>,
    #[cfg(test)]
    fail_next_commit: bool,
}

impl Tables {
    fn user(&self, id: Id) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn event(&self, id: Id) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Remove the given events, and their votes if requested.
    fn drop_events(&mut self, ids: &[Id], retention: VoteRetention) {
        self.events.retain(|event| !ids.contains(&event.id));
        if retention == VoteRetention::Cascade {
            self.votes.retain(|vote| !ids.contains(&vote.event_id));
        }
    }
}

/// A store that keeps everything in memory, owned by a single Rocket
/// instance. Every transaction holds the one lock for its whole lifetime, so
/// transactions are trivially serializable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next transaction commit fail, as if the backing store had
    /// gone away mid-write.
    #[cfg(test)]
    pub async fn fail_next_commit(&self) {
        self.tables.lock().await.fail_next_commit = true;
    }

    /// Every stored vote, in insertion order.
    #[cfg(test)]
    pub async fn all_votes(&self) -> Vec<Vote> {
        self.tables.lock().await.votes.clone()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = User { id: Id::new(), user };
        self.tables.lock().await.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.tables.lock().await.user(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn delete_user(&self, id: Id, retention: VoteRetention) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.users.len();
        tables.users.retain(|user| user.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        let owned: Vec<Id> = tables
            .events
            .iter()
            .filter(|event| event.user_id == id)
            .map(|event| event.id)
            .collect();
        tables.drop_events(&owned, retention);
        Ok(true)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        let event = Event {
            id: Id::new(),
            event,
        };
        self.tables.lock().await.events.push(event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: Id) -> Result<Option<Event>> {
        Ok(self.tables.lock().await.event(id).cloned())
    }

    async fn count_events(&self) -> Result<u64> {
        Ok(self.tables.lock().await.events.len() as u64)
    }

    async fn list_events(&self, range: Range<u64>) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let skip = usize::try_from(range.start).unwrap_or(usize::MAX);
        let take = usize::try_from(range.end.saturating_sub(range.start)).unwrap_or(usize::MAX);
        Ok(tables.events.iter().skip(skip).take(take).cloned().collect())
    }

    async fn update_event(&self, id: Id, changes: EventChanges) -> Result<Option<Event>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .map(|event| {
                changes.apply(event);
                event.clone()
            }))
    }

    async fn delete_event(&self, id: Id, retention: VoteRetention) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.event(id).is_none() {
            return Ok(false);
        }
        tables.drop_events(&[id], retention);
        Ok(true)
    }

    async fn votes_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Vote>> {
        Ok(self
            .tables
            .lock()
            .await
            .votes
            .iter()
            .filter(|vote| start <= vote.timestamp && vote.timestamp <= end)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tables = self.tables.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            tables,
            votes: Vec::new(),
            debits: HashMap::new(),
            credits: HashMap::new(),
        }))
    }
}

/// Staged writes over a locked [`MemoryStore`].
struct MemoryTransaction {
    tables: OwnedMutexGuard<Tables>,
    votes: Vec<Vote>,
    debits: HashMap<Id, u32>,
    credits: HashMap<Id, u64>,
}

impl MemoryTransaction {
    #[cfg(test)]
    fn injected_failure(&mut self) -> Result<()> {
        if std::mem::take(&mut self.tables.fail_next_commit) {
            return Err(Error::Conflict("injected commit failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn injected_failure(&mut self) -> Result<()> {
        Ok(())
    }
}

#[rocket::async_trait]
impl Transaction for MemoryTransaction {
    async fn event(&mut self, id: Id) -> Result<Option<Event>> {
        Ok(self.tables.event(id).cloned().map(|mut event| {
            event.vote_tally += self.credits.get(&id).copied().unwrap_or(0);
            event
        }))
    }

    async fn user(&mut self, id: Id) -> Result<Option<User>> {
        Ok(self.tables.user(id).cloned().map(|mut user| {
            user.vote_credits -= self.debits.get(&id).copied().unwrap_or(0);
            user
        }))
    }

    async fn insert_vote(&mut self, vote: &NewVote) -> Result<Id> {
        let id = Id::new();
        self.votes.push(Vote {
            id,
            vote: vote.clone(),
        });
        Ok(id)
    }

    async fn debit_credits(&mut self, user_id: Id, amount: u32) -> Result<()> {
        let user = self
            .user(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("User {user_id}")))?;
        if user.vote_credits < amount {
            return Err(Error::InsufficientCredits {
                requested: u64::from(amount),
                available: user.vote_credits,
            });
        }
        *self.debits.entry(user_id).or_default() += amount;
        Ok(())
    }

    async fn credit_tally(&mut self, event_id: Id, amount: u32) -> Result<()> {
        if self.tables.event(event_id).is_none() {
            return Err(Error::not_found(format!("Event {event_id}")));
        }
        *self.credits.entry(event_id).or_default() += u64::from(amount);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.injected_failure()?;

        let debits = std::mem::take(&mut self.debits);
        let credits = std::mem::take(&mut self.credits);
        let votes = std::mem::take(&mut self.votes);
        for user in self.tables.users.iter_mut() {
            if let Some(amount) = debits.get(&user.id) {
                user.vote_credits -= amount;
            }
        }
        for event in self.tables.events.iter_mut() {
            if let Some(amount) = credits.get(&event.id) {
                event.vote_tally += amount;
            }
        }
        self.tables.votes.extend(votes);
        Ok(())
    }
}
