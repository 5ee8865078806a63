use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{Event, EventChanges, NewEvent},
    validation::{self, ValidationError},
};

/// A request to register a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpec {
    pub event_name: String,
    pub keyword: String,
    pub user_id: ApiId,
}

impl EventSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::non_empty("eventName", &self.event_name)?;
        validation::non_empty("keyword", &self.keyword)?;
        Ok(())
    }
}

impl From<EventSpec> for NewEvent {
    fn from(spec: EventSpec) -> Self {
        NewEvent::new(spec.event_name, spec.keyword, spec.user_id.into())
    }
}

/// A partial update to an event. The `userId` names the caller, who must
/// own the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub user_id: Option<ApiId>,
}

impl EventPatch {
    /// The descriptive changes this patch requests.
    /// Empty strings count as absent, matching what legacy clients send.
    pub fn changes(&self) -> EventChanges {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        EventChanges {
            name: present(&self.event_name),
            keyword: present(&self.keyword),
        }
    }
}

/// An event as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescription {
    pub id: ApiId,
    pub event_name: String,
    pub keyword: String,
    pub user_id: ApiId,
    pub vote_num: u64,
}

impl From<Event> for EventDescription {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.into(),
            event_name: event.event.name,
            keyword: event.event.keyword,
            user_id: event.event.user_id.into(),
            vote_num: event.event.vote_tally,
        }
    }
}
