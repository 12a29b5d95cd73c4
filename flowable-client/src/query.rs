//! Query-string building shared by every list endpoint.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use std::fmt::Display;

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Paging and sorting options accepted by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Index of the first row.
    pub start: Option<u64>,
    /// Maximum number of rows.
    pub size: Option<u64>,
    /// Field to sort on.
    pub sort: Option<String>,
    /// Sort direction.
    pub order: Option<SortOrder>,
}

impl Pagination {
    /// Page starting at `start` with `size` rows.
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start: Some(start),
            size: Some(size),
            ..Default::default()
        }
    }

    /// Sort on `field` in `order`.
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.order = Some(order);
        self
    }
}

/// A date filter value.
///
/// Accepts a pre-formatted string, a date-time (sent as RFC 3339) or a plain
/// date (sent as `YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParam {
    /// Sent as given.
    Formatted(String),
    /// Sent as RFC 3339.
    DateTime(String),
    /// Sent as `YYYY-MM-DD`.
    Date(NaiveDate),
}

impl DateParam {
    /// Wire representation.
    pub fn to_param(&self) -> String {
        match self {
            Self::Formatted(s) | Self::DateTime(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for DateParam {
    fn from(s: &str) -> Self {
        Self::Formatted(s.to_string())
    }
}

impl From<String> for DateParam {
    fn from(s: String) -> Self {
        Self::Formatted(s)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateParam
where
    Tz::Offset: Display,
{
    fn from(dt: DateTime<Tz>) -> Self {
        Self::DateTime(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<NaiveDateTime> for DateParam {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<NaiveDate> for DateParam {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// Ordered query parameters. Unset options are never added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter unconditionally.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a parameter only when it is set.
    #[must_use]
    pub fn opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Add a date parameter only when it is set.
    #[must_use]
    pub fn date(self, key: &str, value: Option<&DateParam>) -> Self {
        self.opt(key, value.map(DateParam::to_param))
    }

    /// Append paging and sorting options.
    #[must_use]
    pub fn page(self, page: &Pagination) -> Self {
        self.opt("start", page.start)
            .opt("size", page.size)
            .opt("sort", page.sort.as_deref())
            .opt("order", page.order.map(SortOrder::as_str))
    }

    /// Parameters in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_unset_options_are_absent() {
        let query = Query::new()
            .opt("key", Some("orderCase"))
            .opt::<&str>("name", None)
            .opt("latest", Some(true))
            .opt::<u32>("version", None)
            .page(&Pagination::default());

        assert_eq!(
            query.pairs(),
            &[
                ("key".to_string(), "orderCase".to_string()),
                ("latest".to_string(), "true".to_string()),
            ]
        );
        assert!(query.get("name").is_none());
    }

    #[test]
    fn test_pagination() {
        let query = Query::new().page(&Pagination::new(10, 25).sorted_by("name", SortOrder::Desc));
        assert_eq!(query.get("start"), Some("10"));
        assert_eq!(query.get("size"), Some("25"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get("order"), Some("desc"));
    }

    #[test]
    fn test_date_params() {
        let formatted = DateParam::from("2024-01-15T10:00:00Z");
        assert_eq!(formatted.to_param(), "2024-01-15T10:00:00Z");

        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(DateParam::from(utc).to_param(), "2024-01-15T10:00:00.000Z");

        let offset = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .unwrap();
        assert_eq!(
            DateParam::from(offset).to_param(),
            "2024-01-15T12:00:00.000+02:00"
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(DateParam::from(date).to_param(), "2024-03-01");

        let query = Query::new().date("dueBefore", Some(&DateParam::from(date)));
        assert_eq!(query.get("dueBefore"), Some("2024-03-01"));
        assert!(Query::new().date("dueAfter", None).is_empty());
    }
}
