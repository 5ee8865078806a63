use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{NewUser, User},
    validation::{self, ValidationError},
};

/// A registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub user_name: String,
    pub age: i32,
    pub gender: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserSpec {
    /// Check every field constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::user_name(&self.user_name)?;
        validation::age(self.age)?;
        validation::gender(&self.gender)?;
        if let Some(ref email) = self.email {
            validation::email(email)?;
        }
        if let Some(ref phone) = self.phone {
            validation::phone(phone)?;
        }
        Ok(())
    }

    /// Validate the request and turn it into a storable user holding the
    /// given credit allotment.
    pub fn into_new_user(self, vote_credits: u32) -> Result<NewUser, ValidationError> {
        self.validate()?;
        let age = u8::try_from(self.age).map_err(|_| ValidationError::AgeOutOfRange {
            min: validation::AGE_MIN,
            max: validation::AGE_MAX,
        })?;
        Ok(NewUser {
            name: self.user_name,
            age,
            gender: self.gender,
            email: self.email,
            phone: self.phone,
            vote_credits,
        })
    }
}

/// A user as returned by the API, using the legacy `user_`-prefixed
/// property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: ApiId,
    pub user_name: String,
    pub user_age: u8,
    pub user_gender: String,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub user_vote_num: u32,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            user_name: user.user.name,
            user_age: user.user.age,
            user_gender: user.user.gender,
            user_email: user.user.email,
            user_phone: user.user.phone,
            user_vote_num: user.user.vote_credits,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl UserSpec {
        pub fn example() -> Self {
            Self {
                user_name: "Tom".to_string(),
                age: 19,
                gender: "male".to_string(),
                email: Some("123@qq.com".to_string()),
                phone: Some("12345678901".to_string()),
            }
        }

        pub fn example2() -> Self {
            Self {
                user_name: "Bob".to_string(),
                age: 20,
                gender: "male".to_string(),
                email: Some("234@qq.com".to_string()),
                phone: Some("12345678902".to_string()),
            }
        }
    }
}
