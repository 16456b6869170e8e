//! MongoDB implementation of LogStore

use crate::error::{JournalError, JournalResult};
use crate::models::{LOGS_COLLECTION, LogEntry, LogFilter, NewLogEntry, TimeRange};
use crate::store::LogStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};
use pagination::PageCursor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Storage shape of a log entry.
///
/// `timestamp` and `createdAt` are BSON dates so range queries and the
/// timestamp indexes work natively.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,

    #[serde(rename = "type")]
    event_type: String,

    #[serde(default)]
    payload: Document,

    timestamp: bson::DateTime,

    service: String,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<bson::DateTime>,
}

impl LogDocument {
    fn from_new(entry: &NewLogEntry) -> JournalResult<Self> {
        Ok(Self {
            id: None,
            event_type: entry.event_type.clone(),
            payload: bson::to_document(&entry.payload)?,
            timestamp: to_bson_datetime(entry.timestamp),
            service: entry.service.clone(),
            created_at: Some(to_bson_datetime(entry.created_at)),
        })
    }

    fn into_entry(self) -> LogEntry {
        let payload = match Bson::Document(self.payload).into_relaxed_extjson() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        LogEntry {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            event_type: self.event_type,
            payload,
            timestamp: from_bson_datetime(self.timestamp),
            service: self.service,
            created_at: self.created_at.map(from_bson_datetime),
        }
    }
}

/// MongoDB-backed journal over the `logs` collection
#[derive(Clone)]
pub struct MongoLogStore {
    database: Database,
    collection: Collection<LogDocument>,
}

impl MongoLogStore {
    pub fn new(database: &Database) -> Self {
        Self::with_collection(database, LOGS_COLLECTION)
    }

    pub fn with_collection(database: &Database, name: &str) -> Self {
        Self {
            database: database.clone(),
            collection: database.collection(name),
        }
    }

    /// Create indexes for the read paths: newest-first scans and
    /// type-filtered scans.
    pub async fn create_indexes(&self) -> JournalResult<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "timestamp": -1 }).build(),
            IndexModel::builder()
                .keys(doc! { "type": 1, "timestamp": -1 })
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        debug!(collection = %self.collection.name(), "Log indexes ensured");
        Ok(())
    }

    async fn find(&self, filter: Document, options: FindOptions) -> JournalResult<Vec<LogEntry>> {
        let cursor = self.collection.find(filter).with_options(options).await?;
        let docs: Vec<LogDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(LogDocument::into_entry).collect())
    }
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

/// `{"timestamp": {"$gte": from, "$lte": to}}` with either bound optional;
/// empty when the range is unbounded.
pub(crate) fn range_filter(range: &TimeRange) -> Document {
    let mut bounds = Document::new();
    if let Some(from) = range.from {
        bounds.insert("$gte", to_bson_datetime(from));
    }
    if let Some(to) = range.to {
        bounds.insert("$lte", to_bson_datetime(to));
    }

    let mut filter = Document::new();
    if !bounds.is_empty() {
        filter.insert("timestamp", bounds);
    }
    filter
}

pub(crate) fn build_filter(filter: &LogFilter) -> Document {
    let mut doc = range_filter(&filter.range);
    if let Some(event_type) = &filter.event_type {
        doc.insert("type", event_type);
    }
    doc
}

#[async_trait]
impl LogStore for MongoLogStore {
    #[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
    async fn append(&self, entry: NewLogEntry) -> JournalResult<LogEntry> {
        let mut doc = LogDocument::from_new(&entry)?;
        let result = self.collection.insert_one(&doc).await?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_entry())
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        filter: &LogFilter,
        cursor: PageCursor,
    ) -> JournalResult<(Vec<LogEntry>, u64)> {
        let query = build_filter(filter);
        let total = self.collection.count_documents(query.clone()).await?;

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .skip(cursor.skip)
            .limit(i64::try_from(cursor.limit).unwrap_or(i64::MAX))
            .build();
        let entries = self.find(query, options).await?;

        Ok((entries, total))
    }

    #[instrument(skip(self))]
    async fn query_range(&self, range: &TimeRange) -> JournalResult<Vec<LogEntry>> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": 1 })
            .build();
        self.find(range_filter(range), options).await
    }

    async fn ping(&self) -> JournalResult<()> {
        database::mongodb::ping(&self.database)
            .await
            .map_err(|e| JournalError::StorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(build_filter(&LogFilter::default()).is_empty());
    }

    #[test]
    fn test_filter_with_type_and_both_bounds() {
        let filter = LogFilter {
            event_type: Some("data.fetch.failed".to_string()),
            range: TimeRange::new(Some(at(1)), Some(at(2))),
        };
        assert_eq!(
            build_filter(&filter),
            doc! {
                "timestamp": {
                    "$gte": bson::DateTime::from_millis(at(1).timestamp_millis()),
                    "$lte": bson::DateTime::from_millis(at(2).timestamp_millis()),
                },
                "type": "data.fetch.failed",
            }
        );
    }

    #[test]
    fn test_range_filter_with_only_upper_bound() {
        let doc = range_filter(&TimeRange::new(None, Some(at(3))));
        let bounds = doc.get_document("timestamp").unwrap();
        assert!(bounds.get("$gte").is_none());
        assert!(bounds.get("$lte").is_some());
    }

    #[test]
    fn test_document_round_trip_keeps_payload() {
        let mut payload = Map::new();
        payload.insert("count".to_string(), Value::from(3));
        payload.insert("query".to_string(), Value::from("sensor*"));
        let new = NewLogEntry {
            event_type: "data.search.completed".to_string(),
            payload: payload.clone(),
            timestamp: at(4),
            service: "data-pipeline".to_string(),
            created_at: at(5),
        };

        let mut doc = LogDocument::from_new(&new).unwrap();
        let oid = ObjectId::new();
        doc.id = Some(oid);
        let entry = doc.into_entry();

        assert_eq!(entry.id, oid.to_hex());
        assert_eq!(entry.payload, payload);
        assert_eq!(entry.timestamp, at(4));
        assert_eq!(entry.created_at, Some(at(5)));
    }
}
