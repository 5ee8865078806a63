use rocket::{
    http::Status,
    serde::json::{Json, Value},
    Catcher, Request,
};

use crate::error::{error_body, INVALID_PARAM};

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, not_found, unprocessable, internal_error]
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    error_body(INVALID_PARAM)
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    debug!("No route for {} {}", req.method(), req.uri());
    error_body("not found")
}

/// Bodies that parse but do not fit the request type are reported like any
/// other invalid parameter.
#[catch(422)]
fn unprocessable() -> (Status, Json<Value>) {
    (Status::BadRequest, error_body(INVALID_PARAM))
}

#[catch(500)]
fn internal_error() -> Json<Value> {
    error_body("internal error")
}
