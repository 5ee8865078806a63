use mongodb::bson::oid;
use rocket::{response::status::Created, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result, INVALID_PARAM},
    model::{
        api::{
            event::{EventDescription, EventPatch, EventSpec},
            range::{ListQuery, ListRange},
        },
        mongodb::Id,
        ownership::EventAuthorizer,
    },
    store::Storage,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![
        get_event,
        all_events,
        list_events,
        create_event,
        update_event,
        delete_event,
    ]
}

/// A path ID, with malformed IDs reported the same way as unknown ones.
pub(crate) fn path_id(id: std::result::Result<Id, oid::Error>) -> Result<Id> {
    id.map_err(|err| Error::not_found(format!("Malformed ID: {err}")))
}

#[get("/rs/<id>")]
async fn get_event(
    id: std::result::Result<Id, oid::Error>,
    store: Storage,
) -> Result<Json<EventDescription>> {
    let id = path_id(id)?;
    let event = store
        .find_event(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Event {id}")))?;
    Ok(Json(event.into()))
}

#[get("/rs")]
async fn all_events(store: Storage) -> Result<Json<Vec<EventDescription>>> {
    list_events(ListQuery::default(), store).await
}

#[get("/rs/list?<range..>")]
async fn list_events(range: ListQuery, store: Storage) -> Result<Json<Vec<EventDescription>>> {
    let range = ListRange::try_from(range)?;
    let total = store.count_events().await?;
    let range = range.resolve(total)?;
    let events = store.list_events(range).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

#[post("/rs", data = "<spec>", format = "json")]
async fn create_event(
    spec: Json<EventSpec>,
    store: Storage,
) -> Result<Created<Json<EventDescription>>> {
    spec.validate().map_err(|err| {
        debug!("Rejected event: {err}");
        Error::invalid_param(INVALID_PARAM)
    })?;

    // Only registered users may submit events.
    let owner: Id = spec.user_id.into();
    if store.find_user(owner).await?.is_none() {
        return Err(Error::invalid_param("invalid user id"));
    }

    let event = store.insert_event(spec.0.into()).await?;
    info!("Created event {} for {owner}", event.id);
    let location = uri!(get_event(event.id)).to_string();
    Ok(Created::new(location).body(Json(event.into())))
}

#[patch("/rs/<id>", data = "<patch>", format = "json")]
async fn update_event(
    id: std::result::Result<Id, oid::Error>,
    patch: Json<EventPatch>,
    store: Storage,
    authorizer: &State<Box<dyn EventAuthorizer>>,
) -> Result<Json<EventDescription>> {
    let id = path_id(id)?;
    let event = store
        .find_event(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Event {id}")))?;

    let claimed = patch.user_id.map(Id::from);
    if !authorizer.may_modify(claimed, &event) {
        return Err(Error::Forbidden(format!(
            "{} may not modify event {id}",
            claimed.map_or_else(|| "Anonymous caller".to_string(), |user| user.to_string())
        )));
    }

    let updated = store
        .update_event(id, patch.changes())
        .await?
        .ok_or_else(|| Error::not_found(format!("Event {id}")))?;
    Ok(Json(updated.into()))
}

/// Deleting an event that does not exist still succeeds.
#[delete("/rs/<id>")]
async fn delete_event(
    id: std::result::Result<Id, oid::Error>,
    store: Storage,
    config: &State<Config>,
) -> Result<()> {
    let id = path_id(id)?;
    if store.delete_event(id, config.vote_retention()).await? {
        info!("Deleted event {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::api::id::ApiId;
    use crate::model::db::Event;
    use crate::store::{MemoryStore, Store};

    use super::*;

    async fn seeded_events(store: &MemoryStore) -> Vec<Event> {
        store.list_events(0..3).await.unwrap()
    }

    async fn error_message(response: rocket::local::asynchronous::LocalResponse<'_>) -> String {
        let body: Value = response.into_json().await.unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[backend_test(seeded)]
    async fn get_one(client: Client, store: MemoryStore) {
        let event = seeded_events(&store).await.remove(1);

        let response = client.get(uri!(get_event(event.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let description: EventDescription = response.into_json().await.unwrap();
        assert_eq!(description, EventDescription::from(event));
        assert_eq!(description.event_name, "second event");
        assert_eq!(description.vote_num, 0);

        // Unknown and malformed IDs look the same.
        let response = client.get(uri!(get_event(Id::new()))).dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid id");

        let response = client.get("/rs/42").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid id");
    }

    #[backend_test(seeded)]
    async fn list_all_and_ranges(client: Client, store: MemoryStore) {
        let events = seeded_events(&store).await;
        let expected: Vec<EventDescription> = events.into_iter().map(Into::into).collect();

        for uri in ["/rs", "/rs/list"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(Status::Ok, response.status());
            let listed: Vec<EventDescription> = response.into_json().await.unwrap();
            assert_eq!(listed, expected);
        }

        let response = client.get("/rs/list?start=1&end=3").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<EventDescription> = response.into_json().await.unwrap();
        assert_eq!(listed, expected[1..3]);

        let response = client.get("/rs/list?start=1&end=4").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid request param");

        for uri in [
            "/rs/list?start=2&end=1",
            "/rs/list?start=-1&end=2",
            "/rs/list?start=abc",
            "/rs/list?end=x",
        ] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(Status::BadRequest, response.status());
            assert_eq!(error_message(response).await, "invalid request param");
        }
    }

    #[backend_test(seeded)]
    async fn create(client: Client, store: MemoryStore) {
        let owner = store.list_users().await.unwrap().remove(0);
        let spec = EventSpec::example(owner.id.into());

        let response = client
            .post(uri!(create_event))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let location = response.headers().get_one("Location").unwrap().to_string();
        let created: EventDescription = response.into_json().await.unwrap();
        assert_eq!(created.event_name, spec.event_name);
        assert_eq!(created.keyword, spec.keyword);
        assert_eq!(created.user_id, spec.user_id);
        assert_eq!(created.vote_num, 0);
        assert_eq!(location, format!("/rs/{}", created.id));
        assert_eq!(store.count_events().await.unwrap(), 4);

        // The new event comes last.
        let stored = store.list_events(3..4).await.unwrap().remove(0);
        assert_eq!(EventDescription::from(stored), created);
    }

    #[backend_test(seeded)]
    async fn bad_create(client: Client, store: MemoryStore) {
        // Unregistered user.
        let spec = EventSpec::example(ApiId::from(Id::new()));
        let response = client
            .post(uri!(create_event))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid user id");

        // Empty name.
        let owner = store.list_users().await.unwrap().remove(0);
        let mut spec = EventSpec::example(owner.id.into());
        spec.event_name = String::new();
        let response = client
            .post(uri!(create_event))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid param");

        // Missing fields.
        let response = client
            .post(uri!(create_event))
            .header(ContentType::JSON)
            .body(json!({ "eventName": "no keyword" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_message(response).await, "invalid param");

        assert_eq!(store.count_events().await.unwrap(), 3);
    }

    #[backend_test(seeded)]
    async fn patch_by_owner(client: Client, store: MemoryStore) {
        let event = seeded_events(&store).await.remove(0);

        let response = client
            .patch(uri!(update_event(event.id)))
            .header(ContentType::JSON)
            .body(json!({ "eventName": "renamed", "userId": event.user_id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let stored = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.keyword, event.keyword);

        // Empty strings leave fields alone too.
        let response = client
            .patch(uri!(update_event(event.id)))
            .header(ContentType::JSON)
            .body(
                json!({ "eventName": "", "keyword": "music", "userId": event.user_id.to_string() })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: EventDescription = response.into_json().await.unwrap();
        assert_eq!(updated.event_name, "renamed");
        assert_eq!(updated.keyword, "music");
    }

    #[backend_test(seeded)]
    async fn patch_by_stranger(client: Client, store: MemoryStore) {
        let event = seeded_events(&store).await.remove(0);

        for body in [
            json!({ "eventName": "hijacked", "userId": Id::new().to_string() }),
            json!({ "eventName": "hijacked" }),
        ] {
            let response = client
                .patch(uri!(update_event(event.id)))
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Forbidden, response.status());
        }

        let stored = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored, event);
    }

    #[backend_test(seeded)]
    async fn delete_is_idempotent(client: Client, store: MemoryStore) {
        let event = seeded_events(&store).await.remove(2);

        for _ in 0..2 {
            let response = client.delete(uri!(delete_event(event.id))).dispatch().await;
            assert_eq!(Status::Ok, response.status());
        }
        assert!(store.find_event(event.id).await.unwrap().is_none());
        assert_eq!(store.count_events().await.unwrap(), 2);
    }
}
