use mongodb::bson::oid;
use rocket::{response::status::Created, serde::json::Json, Route, State};

use crate::{
    api::events::path_id,
    error::{Error, Result},
    model::{
        api::user::{UserDescription, UserSpec},
        mongodb::Id,
    },
    store::Storage,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![get_users, get_user, register, delete_user]
}

#[get("/user")]
async fn get_users(store: Storage) -> Result<Json<Vec<UserDescription>>> {
    let users = store.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[get("/user/<id>")]
async fn get_user(
    id: std::result::Result<Id, oid::Error>,
    store: Storage,
) -> Result<Json<UserDescription>> {
    let id = path_id(id)?;
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {id}")))?;
    Ok(Json(user.into()))
}

#[post("/user", data = "<spec>", format = "json")]
async fn register(
    spec: Json<UserSpec>,
    store: Storage,
    config: &State<Config>,
) -> Result<Created<Json<UserDescription>>> {
    let new_user = spec
        .0
        .into_new_user(config.initial_vote_credits())
        .map_err(|err| {
            debug!("Rejected registration: {err}");
            Error::invalid_param("invalid user")
        })?;

    let user = store.insert_user(new_user).await?;
    info!("Registered user {} with {} credits", user.id, user.vote_credits);
    let location = uri!(get_user(user.id)).to_string();
    Ok(Created::new(location).body(Json(user.into())))
}

/// Deletes the user and every event they registered. Deleting a user that
/// does not exist still succeeds.
#[delete("/user/<id>")]
async fn delete_user(
    id: std::result::Result<Id, oid::Error>,
    store: Storage,
    config: &State<Config>,
) -> Result<()> {
    let id = path_id(id)?;
    if store.delete_user(id, config.vote_retention()).await? {
        info!("Deleted user {id} and their events");
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

    use crate::model::db::UserCore;
    use crate::store::{MemoryStore, Store};

    use super::*;

    #[backend_test]
    async fn register_and_fetch(client: Client, store: MemoryStore) {
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(UserSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let location = response.headers().get_one("Location").unwrap().to_string();
        let created: UserDescription = response.into_json().await.unwrap();
        assert_eq!(created.user_name, "Tom");
        assert_eq!(created.user_age, 19);
        assert_eq!(created.user_vote_num, 10);
        assert_eq!(location, format!("/user/{}", created.id));

        let response = client.get(location).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let fetched: UserDescription = response.into_json().await.unwrap();
        assert_eq!(fetched, created);

        client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(UserSpec::example2()).to_string())
            .dispatch()
            .await;
        let response = client.get(uri!(get_users)).dispatch().await;
        let listed: Vec<UserDescription> = response.into_json().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|user| user.user_name.as_str()).collect();
        assert_eq!(names, vec!["Tom", "Bob"]);
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[backend_test]
    async fn response_uses_legacy_names(client: Client) {
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(UserSpec::example()).to_string())
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["user_name"], json!("Tom"));
        assert_eq!(body["user_gender"], json!("male"));
        assert_eq!(body["user_email"], json!("123@qq.com"));
        assert_eq!(body["user_phone"], json!("12345678901"));
        assert_eq!(body["user_vote_num"], json!(10));
    }

    #[backend_test]
    async fn bad_registration(client: Client, store: MemoryStore) {
        let bodies = [
            json!({ "userName": "Tom123456", "age": 19, "gender": "male" }),
            json!({ "userName": "Tom", "age": 17, "gender": "male" }),
            json!({ "userName": "Tom", "age": 101, "gender": "male" }),
            json!({ "userName": "Tom", "age": 19, "gender": "" }),
            json!({ "userName": "Tom", "age": 19, "gender": "male", "email": "123" }),
            json!({ "userName": "Tom", "age": 19, "gender": "male", "phone": "22345678901" }),
        ];
        for body in bodies {
            let response = client
                .post(uri!(register))
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status());
            let body: Value = response.into_json().await.unwrap();
            assert_eq!(body["error"], json!("invalid user"));
        }

        // Missing required fields never reach validation.
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!({ "age": 19 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], json!("invalid param"));

        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[backend_test(seeded)]
    async fn missing_user(client: Client) {
        let response = client.get(uri!(get_user(Id::new()))).dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], json!("invalid id"));
    }

    #[backend_test(seeded)]
    async fn delete_cascades_to_events(client: Client, store: MemoryStore) {
        let owner = store.list_users().await.unwrap().remove(0);
        let other = store.insert_user(UserCore::example2()).await.unwrap();
        let spec = crate::model::api::event::EventSpec::example(other.id.into());
        store.insert_event(spec.into()).await.unwrap();
        assert_eq!(store.count_events().await.unwrap(), 4);

        for _ in 0..2 {
            let response = client.delete(uri!(delete_user(owner.id))).dispatch().await;
            assert_eq!(Status::Ok, response.status());
        }
        assert!(store.find_user(owner.id).await.unwrap().is_none());
        let remaining = store.list_events(0..1).await.unwrap();
        assert_eq!(store.count_events().await.unwrap(), 1);
        assert_eq!(remaining[0].user_id, other.id);
    }
}
