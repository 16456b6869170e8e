//! Journal domain models

use crate::error::{JournalError, JournalResult};
use chrono::{DateTime, NaiveDate, Utc};
use pagination::{PageQuery, PaginationParams};
use pubsub::Event;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection holding the journal.
pub const LOGS_COLLECTION: &str = "logs";

/// A persisted event. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Store-assigned identifier (ObjectId hex for MongoDB)
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub payload: Map<String, Value>,

    /// Producer timestamp
    pub timestamp: DateTime<Utc>,

    pub service: String,

    /// When the journal stored the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An entry about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub created_at: DateTime<Utc>,
}

impl NewLogEntry {
    /// Entry for `event`, stamped with the current time as `created_at`.
    pub fn from_event(event: &Event) -> JournalResult<Self> {
        let timestamp = event.occurred_at().ok_or_else(|| {
            JournalError::Validation(format!("timestamp {} is out of range", event.timestamp))
        })?;
        Ok(Self {
            event_type: event.event_type.clone(),
            payload: event.payload.clone(),
            timestamp,
            service: event.service.clone(),
            created_at: Utc::now(),
        })
    }

    pub fn into_entry(self, id: impl Into<String>) -> LogEntry {
        LogEntry {
            id: id.into(),
            event_type: self.event_type,
            payload: self.payload,
            timestamp: self.timestamp,
            service: self.service,
            created_at: Some(self.created_at),
        }
    }
}

/// Inclusive time window; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| *instant >= from) && self.to.is_none_or(|to| *instant <= to)
    }
}

/// Filter for paginated reads. Empty means match-all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub event_type: Option<String>,
    pub range: TimeRange,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.event_type
            .as_ref()
            .is_none_or(|t| *t == entry.event_type)
            && self.range.contains(&entry.timestamp)
    }
}

/// `?type=&from=&to=&page=&limit=` on `GET /logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl LogQuery {
    pub fn filter(&self) -> JournalResult<LogFilter> {
        Ok(LogFilter {
            event_type: self.event_type.clone().filter(|t| !t.is_empty()),
            range: parse_range(self.from.as_deref(), self.to.as_deref())?,
        })
    }

    pub fn pagination(&self) -> PaginationParams {
        self.page.into()
    }
}

/// `?from=&to=&format=` on `GET /logs/report`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

impl ReportQuery {
    pub fn range(&self) -> JournalResult<TimeRange> {
        parse_range(self.from.as_deref(), self.to.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Base64,
}

/// Number of entries of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: u64,
}

fn parse_range(from: Option<&str>, to: Option<&str>) -> JournalResult<TimeRange> {
    let from = from.filter(|s| !s.trim().is_empty()).map(parse_instant).transpose()?;
    let to = to.filter(|s| !s.trim().is_empty()).map(parse_instant).transpose()?;
    Ok(TimeRange::new(from, to))
}

/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`), a bare date (`2024-01-01`,
/// read as midnight UTC) or epoch milliseconds.
pub fn parse_instant(raw: &str) -> JournalResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Some(dt) = raw
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
    {
        return Ok(dt);
    }

    Err(JournalError::Validation(format!("'{}' is not a valid date", raw)))
}
