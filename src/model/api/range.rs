use std::ops::Range;

use crate::error::{Error, Result};
use crate::model::api::timestamp::Timestamp;

/// Optional `start`/`end` bounds on an event listing.
///
/// Bounds are 0-based and half-open: `start=1&end=3` selects the second and
/// third events. A missing `start` means 0; a missing `end` means "to the end".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// The raw `start`/`end` query parameters of an event listing.
///
/// Kept as text so that a bound which is not a non-negative integer is
/// reported as a bad range rather than dropped as if it were missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromForm)]
pub struct ListQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TryFrom<ListQuery> for ListRange {
    type Error = Error;

    fn try_from(query: ListQuery) -> Result<Self> {
        fn bound(name: &str, value: Option<String>) -> Result<Option<u64>> {
            value
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| Error::InvalidRange(format!("{name}={value}")))
                })
                .transpose()
        }

        Ok(Self {
            start: bound("start", query.start)?,
            end: bound("end", query.end)?,
        })
    }
}

impl ListRange {
    /// Resolve the bounds against the number of stored events.
    pub fn resolve(self, total: u64) -> Result<Range<u64>> {
        let start = self.start.unwrap_or(0);
        let end = self.end.unwrap_or(total);
        if start > end || end > total {
            return Err(Error::InvalidRange(format!(
                "{start}..{end} outside 0..{total}"
            )));
        }
        Ok(start..end)
    }
}

/// An inclusive time window for the vote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromForm)]
pub struct TimeRange {
    #[field(name = "startTime")]
    pub start_time: Timestamp,
    #[field(name = "endTime")]
    pub end_time: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<u64>, end: Option<u64>) -> ListRange {
        ListRange { start, end }
    }

    #[test]
    fn defaults_cover_everything() {
        assert_eq!(ListRange::default().resolve(3).unwrap(), 0..3);
        assert_eq!(ListRange::default().resolve(0).unwrap(), 0..0);
    }

    #[test]
    fn half_open_bounds() {
        assert_eq!(range(Some(1), Some(3)).resolve(3).unwrap(), 1..3);
        assert_eq!(range(Some(1), None).resolve(3).unwrap(), 1..3);
        assert_eq!(range(None, Some(2)).resolve(3).unwrap(), 0..2);
        assert_eq!(range(Some(3), Some(3)).resolve(3).unwrap(), 3..3);
    }

    fn query(start: Option<&str>, end: Option<&str>) -> Result<ListRange> {
        ListRange::try_from(ListQuery {
            start: start.map(String::from),
            end: end.map(String::from),
        })
    }

    #[test]
    fn query_bounds_must_be_counts() {
        assert_eq!(query(None, None).unwrap(), ListRange::default());
        assert_eq!(query(Some("1"), Some("3")).unwrap(), range(Some(1), Some(3)));
        for (start, end) in [
            (Some("-1"), Some("2")),
            (Some("abc"), None),
            (None, Some("2.5")),
            (Some(""), None),
        ] {
            assert!(matches!(query(start, end), Err(Error::InvalidRange(_))));
        }
    }

    #[test]
    fn out_of_bounds() {
        assert!(matches!(
            range(Some(1), Some(4)).resolve(3),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            range(Some(2), Some(1)).resolve(3),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            range(Some(4), None).resolve(3),
            Err(Error::InvalidRange(_))
        ));
    }
}
