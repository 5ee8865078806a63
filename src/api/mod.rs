use rocket::{Catcher, Route};

mod catchers;
mod events;
mod users;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(events::routes());
    routes.extend(votes::routes());
    routes.extend(users::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers::catchers()
}
