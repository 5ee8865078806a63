//! Casting votes.
//!
//! A vote moves credits from a user to an event. The ledger entry, the debit,
//! and the credit are staged in one [`crate::store::Transaction`] and
//! committed together, so either all three become visible or none do.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::error::{Error, INVALID_PARAM};
use crate::model::{
    db::{NewVote, Vote, VoteCore},
    mongodb::Id,
};
use crate::store::Store;

/// How a vote of zero credits is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroVotePolicy {
    /// Record a ledger entry that moves nothing.
    #[default]
    Allow,
    /// Refuse the vote.
    Reject,
}

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("Event {0} does not exist")]
    EventNotFound(Id),
    #[error("Voter {0} does not exist")]
    VoterNotFound(Id),
    #[error("Vote of {0} credits is negative")]
    NegativeAmount(i64),
    #[error("Vote of {requested} exceeds the {available} credits available")]
    InsufficientCredits { requested: u64, available: u32 },
    #[error("Votes of zero credits are not accepted")]
    ZeroAmount,
    #[error(transparent)]
    Storage(Error),
}

impl From<Error> for VoteError {
    fn from(err: Error) -> Self {
        // The store enforces the balance on its own; report it the same way.
        match err {
            Error::InsufficientCredits {
                requested,
                available,
            } => Self::InsufficientCredits {
                requested: u64::from(requested),
                available,
            },
            err => Self::Storage(err),
        }
    }
}

impl From<VoteError> for Error {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::EventNotFound(id) => Error::not_found(format!("Event {id}")),
            VoteError::VoterNotFound(id) => Error::not_found(format!("User {id}")),
            VoteError::InsufficientCredits {
                requested,
                available,
            } => Error::InsufficientCredits {
                requested,
                available,
            },
            VoteError::NegativeAmount(_) | VoteError::ZeroAmount => {
                Error::invalid_param(INVALID_PARAM)
            }
            VoteError::Storage(err) => err,
        }
    }
}

/// Spend `amount` of the voter's credits on an event.
///
/// Preconditions are checked in order (event exists, voter exists, amount is
/// not negative, zero-vote policy, balance) and the first failure is returned
/// before anything is written.
pub async fn cast_vote(
    store: &dyn Store,
    event_id: Id,
    voter_id: Id,
    amount: i64,
    timestamp: DateTime<Utc>,
    zero_votes: ZeroVotePolicy,
) -> Result<Vote, VoteError> {
    let mut tx = store.begin().await?;

    if tx.event(event_id).await?.is_none() {
        debug!("Vote rejected: event {event_id} not found");
        return Err(VoteError::EventNotFound(event_id));
    }
    let voter = match tx.user(voter_id).await? {
        Some(voter) => voter,
        None => {
            debug!("Vote rejected: voter {voter_id} not found");
            return Err(VoteError::VoterNotFound(voter_id));
        }
    };

    if amount < 0 {
        debug!("Vote rejected: {voter_id} asked to spend {amount} credits");
        return Err(VoteError::NegativeAmount(amount));
    }

    if amount == 0 {
        match zero_votes {
            ZeroVotePolicy::Allow => {
                warn!("Recording zero-credit vote by {voter_id} on {event_id}")
            }
            ZeroVotePolicy::Reject => {
                debug!("Vote rejected: zero credits from {voter_id}");
                return Err(VoteError::ZeroAmount);
            }
        }
    }

    let amount = match u32::try_from(amount) {
        Ok(amount) if amount <= voter.vote_credits => amount,
        _ => {
            warn!(
                "Vote rejected: {voter_id} asked to spend {amount} with {} credits left",
                voter.vote_credits
            );
            return Err(VoteError::InsufficientCredits {
                requested: amount.unsigned_abs(),
                available: voter.vote_credits,
            });
        }
    };

    let vote: NewVote = VoteCore {
        amount,
        user_id: voter_id,
        event_id,
        timestamp,
    };
    let id = tx.insert_vote(&vote).await?;
    tx.debit_credits(voter_id, amount).await?;
    tx.credit_tally(event_id, amount).await?;
    tx.commit().await?;

    info!("Vote {id}: {voter_id} spent {amount} on {event_id}");
    Ok(Vote { id, vote })
}
