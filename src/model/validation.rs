//! Field-level checks applied to registration requests.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Longest accepted user name, in characters.
pub const USER_NAME_MAX: usize = 8;
/// Youngest accepted registrant.
pub const AGE_MIN: i32 = 18;
/// Oldest accepted registrant.
pub const AGE_MAX: i32 = 100;

/// Reasons a registration field can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyUserName,
    UserNameTooLong { max: usize },
    EmptyGender,
    AgeOutOfRange { min: i32, max: i32 },
    InvalidEmail,
    InvalidPhone,
    EmptyField(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserName => write!(f, "user name must not be empty"),
            Self::UserNameTooLong { max } => {
                write!(f, "user name must be at most {max} characters")
            }
            Self::EmptyGender => write!(f, "gender must not be empty"),
            Self::AgeOutOfRange { min, max } => write!(f, "age must be between {min} and {max}"),
            Self::InvalidEmail => write!(f, "email is malformed"),
            Self::InvalidPhone => write!(f, "phone must be 11 digits starting with 1"),
            Self::EmptyField(name) => write!(f, "{name} must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^1\d{10}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

pub fn user_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyUserName);
    }
    if name.chars().count() > USER_NAME_MAX {
        return Err(ValidationError::UserNameTooLong {
            max: USER_NAME_MAX,
        });
    }
    Ok(())
}

pub fn gender(gender: &str) -> Result<(), ValidationError> {
    if gender.trim().is_empty() {
        return Err(ValidationError::EmptyGender);
    }
    Ok(())
}

pub fn age(age: i32) -> Result<(), ValidationError> {
    if !(AGE_MIN..=AGE_MAX).contains(&age) {
        return Err(ValidationError::AgeOutOfRange {
            min: AGE_MIN,
            max: AGE_MAX,
        });
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), ValidationError> {
    if !email_regex().is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn phone(phone: &str) -> Result<(), ValidationError> {
    if !phone_regex().is_match(phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}

/// Require a free-text field to contain something other than whitespace.
pub fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
