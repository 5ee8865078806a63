use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request, Response,
};
use thiserror::Error;

use crate::model::mongodb::is_transient_transaction_error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message returned when a requested entity does not exist.
pub const INVALID_ID: &str = "invalid id";
/// Message returned when a request body or parameter fails validation.
pub const INVALID_PARAM: &str = "invalid param";
/// Message returned when list bounds fall outside the stored range.
pub const INVALID_RANGE: &str = "invalid request param";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Insufficient vote credits: requested {requested}, available {available}")]
    InsufficientCredits { requested: u64, available: u32 },
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Conflicting concurrent update: {0}")]
    Conflict(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_param(what: impl Into<String>) -> Self {
        Self::InvalidParam(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_)
            | Self::InvalidParam(_)
            | Self::InsufficientCredits { .. }
            | Self::InvalidRange(_) => Status::BadRequest,
            Self::Forbidden(_) => Status::Forbidden,
            Self::Conflict(_) => Status::Conflict,
            Self::Db(err) if is_transient_transaction_error(err) => Status::Conflict,
            Self::Db(_) => Status::InternalServerError,
        }
    }

    /// The short machine-readable message placed in the response body.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(_) => INVALID_ID.to_string(),
            Self::InvalidParam(msg) => msg.clone(),
            Self::Forbidden(_) => "forbidden".to_string(),
            Self::InsufficientCredits { .. } => "insufficient vote credits".to_string(),
            Self::InvalidRange(_) => INVALID_RANGE.to_string(),
            Self::Conflict(_) => "conflict".to_string(),
            Self::Db(err) if is_transient_transaction_error(err) => "conflict".to_string(),
            Self::Db(_) => "internal error".to_string(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.class().is_server_error() {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        Response::build_from(error_body(self.message()).respond_to(req)?)
            .status(status)
            .ok()
    }
}

/// The JSON body used for every error response.
pub fn error_body(message: impl Into<String>) -> Json<rocket::serde::json::Value> {
    Json(json!({ "error": message.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(Error::not_found("event").status(), Status::BadRequest);
        assert_eq!(Error::invalid_param("x").status(), Status::BadRequest);
        assert_eq!(Error::Forbidden("x".into()).status(), Status::Forbidden);
        assert_eq!(
            Error::InsufficientCredits {
                requested: 6,
                available: 5
            }
            .status(),
            Status::BadRequest
        );
        assert_eq!(Error::InvalidRange("x".into()).status(), Status::BadRequest);
        assert_eq!(Error::Conflict("x".into()).status(), Status::Conflict);
    }

    #[test]
    fn messages_are_short() {
        assert_eq!(Error::not_found("event 1").message(), INVALID_ID);
        assert_eq!(Error::InvalidRange("1..9".into()).message(), INVALID_RANGE);
        assert_eq!(Error::invalid_param("invalid user").message(), "invalid user");
    }
}
