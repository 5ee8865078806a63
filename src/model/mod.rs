//! Data types shared between the API, the storage adapters, and the vote
//! transaction.

pub mod api;
pub mod db;
pub mod mongodb;
pub mod ownership;
pub mod validation;
