use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core event data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCore {
    pub name: String,
    pub keyword: String,
    /// The user who registered this event.
    pub user_id: Id,
    /// Sum of every vote amount cast on this event.
    pub vote_tally: u64,
}

impl EventCore {
    /// A fresh event with an empty tally.
    pub fn new(name: String, keyword: String, user_id: Id) -> Self {
        Self {
            name,
            keyword,
            user_id,
            vote_tally: 0,
        }
    }
}

/// An event without an ID.
pub type NewEvent = EventCore;

/// An event from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub event: EventCore,
}

impl Deref for Event {
    type Target = EventCore;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl DerefMut for Event {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.event
    }
}

/// A partial update to an event's descriptive fields.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChanges {
    pub name: Option<String>,
    pub keyword: Option<String>,
}

impl EventChanges {
    /// Whether applying these changes would modify anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.keyword.is_none()
    }

    /// Apply the changes to an event in place.
    pub fn apply(&self, event: &mut EventCore) {
        if let Some(ref name) = self.name {
            event.name = name.clone();
        }
        if let Some(ref keyword) = self.keyword {
            event.keyword = keyword.clone();
        }
    }
}
