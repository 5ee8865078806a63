use mongodb::bson::oid;
use rocket::{form, response::status::Created, serde::json::Json, Route, State};

use crate::{
    api::events::path_id,
    error::{Error, Result, INVALID_PARAM},
    model::{
        api::{
            range::TimeRange,
            vote::{VoteDescription, VoteSpec},
        },
        mongodb::Id,
    },
    store::Storage,
    voting::cast_vote,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![vote, votes_between]
}

/// Cast a vote on an event. Not idempotent: every accepted call records a new
/// ledger entry and spends more credits.
#[post("/rs/vote/<event_id>", data = "<spec>", format = "json")]
async fn vote(
    event_id: std::result::Result<Id, oid::Error>,
    spec: Json<VoteSpec>,
    store: Storage,
    config: &State<Config>,
) -> Result<Created<Json<VoteDescription>>> {
    let event_id = path_id(event_id)?;
    let vote = cast_vote(
        &*store,
        event_id,
        spec.user_id.into(),
        spec.vote_num,
        spec.vote_time.into(),
        config.zero_votes(),
    )
    .await?;

    // Votes have no resource of their own; point at the event they went to.
    let location = format!("/rs/{event_id}");
    Ok(Created::new(location).body(Json(vote.into())))
}

/// Every vote cast within `[startTime, endTime]`.
#[get("/rs/votes?<range..>")]
async fn votes_between(
    range: form::Result<'_, TimeRange>,
    store: Storage,
) -> Result<Json<Vec<VoteDescription>>> {
    let range = range.map_err(|errs| {
        debug!("Rejected vote query: {errs}");
        Error::invalid_param(INVALID_PARAM)
    })?;
    let votes = store
        .votes_between(range.start_time.into(), range.end_time.into())
        .await?;
    Ok(Json(votes.into_iter().map(Into::into).collect()))
}
