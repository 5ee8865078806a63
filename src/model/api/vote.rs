use serde::{Deserialize, Serialize};

use crate::model::{
    api::{id::ApiId, timestamp::Timestamp},
    db::Vote,
};

/// A request to cast a vote on the event named in the URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSpec {
    /// Requested amount; signed so that negative amounts reach validation
    /// rather than failing deserialization.
    pub vote_num: i64,
    pub user_id: ApiId,
    pub vote_time: Timestamp,
}

/// A ledger entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDescription {
    pub id: ApiId,
    pub vote_num: u32,
    pub user_id: ApiId,
    pub event_id: ApiId,
    pub vote_time: Timestamp,
}

impl From<Vote> for VoteDescription {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.into(),
            vote_num: vote.vote.amount,
            user_id: vote.vote.user_id.into(),
            event_id: vote.vote.event_id.into(),
            vote_time: vote.vote.timestamp.into(),
        }
    }
}
