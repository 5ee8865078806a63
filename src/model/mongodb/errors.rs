//! The mongodb crate exposes error labels as bare strings.
//! This module names the ones we care about.

use mongodb::error::{
    Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT,
};

/// Return true if the given error aborted a transaction because another
/// transaction touched the same documents first.
pub fn is_transient_transaction_error(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}

/// Return true if the server could not report whether a commit applied.
/// Committing the same transaction again is safe in that case.
pub fn is_unknown_commit_result(err: &DbError) -> bool {
    err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
}
