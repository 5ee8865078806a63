use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rocket::form::{self, FromFormField, ValueField};
use serde::{Deserialize, Serialize};

/// An instant as seen on the wire.
///
/// Accepts either RFC 3339 (`2020-08-01T10:00:00Z`) or a zone-less ISO-8601
/// local datetime (`2020-08-01T10:00:00`), which is taken to be UTC.
/// Always serializes as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DateTime::parse_from_rfc3339(s) {
            Ok(datetime) => Ok(Self(datetime.with_timezone(&Utc))),
            Err(_) => s
                .parse::<NaiveDateTime>()
                .map(|naive| Self(Utc.from_utc_datetime(&naive))),
        }
    }
}

impl TryFrom<String> for Timestamp {
    type Error = chrono::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.to_string()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for Timestamp {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse::<Timestamp>()
            .map_err(|err| form::Error::validation(err.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_forms() {
        let expected = Utc.with_ymd_and_hms(2020, 8, 1, 10, 0, 0).unwrap();
        let zoned: Timestamp = "2020-08-01T10:00:00Z".parse().unwrap();
        let local: Timestamp = "2020-08-01T10:00:00".parse().unwrap();
        let offset: Timestamp = "2020-08-01T12:00:00+02:00".parse().unwrap();
        assert_eq!(*zoned, expected);
        assert_eq!(*local, expected);
        assert_eq!(*offset, expected);
    }

    #[test]
    fn displays_as_rfc3339() {
        let timestamp: Timestamp = "2020-08-01T10:00:00".parse().unwrap();
        assert_eq!(timestamp.to_string(), "2020-08-01T10:00:00Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!("yesterday".parse::<Timestamp>().is_err());
        assert!("2020-13-01T10:00:00".parse::<Timestamp>().is_err());
    }
}
