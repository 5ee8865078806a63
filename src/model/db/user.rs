use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core user data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Remaining vote credits. Only ever decreased, and only by a vote.
    pub vote_credits: u32,
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl UserCore {
        pub fn example() -> Self {
            Self {
                name: "Tom".to_string(),
                age: 19,
                gender: "male".to_string(),
                email: Some("tom@example.com".to_string()),
                phone: Some("13012345678".to_string()),
                vote_credits: 10,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Alice".to_string(),
                age: 30,
                gender: "female".to_string(),
                email: None,
                phone: None,
                vote_credits: 10,
            }
        }
    }
}
