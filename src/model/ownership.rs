//! Who may modify an event.
//!
//! Updates consult an [`EventAuthorizer`] instead of comparing IDs inline, so
//! that a real authentication scheme can replace [`ClaimedOwner`] without
//! touching the update path.

use crate::model::{db::Event, mongodb::Id};

pub trait EventAuthorizer: Send + Sync {
    /// Whether the caller identified by `claimed` may modify `event`.
    fn may_modify(&self, claimed: Option<Id>, event: &Event) -> bool;
}

/// Trusts the user ID the caller claims in the request body, and allows the
/// change only when it names the event's registrant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimedOwner;

impl EventAuthorizer for ClaimedOwner {
    fn may_modify(&self, claimed: Option<Id>, event: &Event) -> bool {
        claimed == Some(event.user_id)
    }
}
