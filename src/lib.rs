#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::model::ownership::{ClaimedOwner, EventAuthorizer};
use crate::store::Storage;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

pub use config::Config;

/// Build the server, opening whichever store `Rocket.toml` selects.
pub fn build() -> Rocket<Build> {
    with_routes(rocket::build()).attach(StoreFairing)
}

/// Build the server on top of an already open store.
pub fn rocket_for_store(storage: Storage) -> Rocket<Build> {
    with_routes(rocket::build()).manage(storage)
}

fn with_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage::<Box<dyn EventAuthorizer>>(Box::new(ClaimedOwner))
        .attach(ConfigFairing)
        .attach(LoggerFairing)
}
