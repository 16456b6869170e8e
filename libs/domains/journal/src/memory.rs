//! In-process log store for tests and local runs without MongoDB

use crate::error::{JournalError, JournalResult};
use crate::models::{LogEntry, LogFilter, NewLogEntry, TimeRange};
use crate::store::LogStore;
use async_trait::async_trait;
use pagination::PageCursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Vec-backed [`LogStore`] with the same query semantics as the MongoDB one.
///
/// Can be switched "offline" to exercise unavailability paths.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    entries: RwLock<Vec<LogEntry>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable every operation fails with `StorageUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> JournalResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(JournalError::StorageUnavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LogEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LogEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn append(&self, entry: NewLogEntry) -> JournalResult<LogEntry> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = entry.into_entry(format!("{:024x}", id));
        self.write().push(entry.clone());
        debug!(id = %entry.id, event_type = %entry.event_type, "Appended log entry");
        Ok(entry)
    }

    async fn query(
        &self,
        filter: &LogFilter,
        cursor: PageCursor,
    ) -> JournalResult<(Vec<LogEntry>, u64)> {
        self.check()?;
        let mut matches: Vec<LogEntry> = self
            .read()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matches.len() as u64;
        let skip = usize::try_from(cursor.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(cursor.limit).unwrap_or(usize::MAX);
        let page = matches.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }

    async fn query_range(&self, range: &TimeRange) -> JournalResult<Vec<LogEntry>> {
        self.check()?;
        let mut matches: Vec<LogEntry> = self
            .read()
            .iter()
            .filter(|e| range.contains(&e.timestamp))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(matches)
    }

    async fn ping(&self) -> JournalResult<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use pagination::PaginationParams;
    use serde_json::Map;
    use test_utils::TestDataBuilder;
    use test_utils::assertions::assert_descending;

    fn base() -> DateTime<Utc> {
        TestDataBuilder::from_test_name("in_memory_log_store").base_time()
    }

    fn new_entry(event_type: &str, minutes: i64) -> NewLogEntry {
        NewLogEntry {
            event_type: event_type.to_string(),
            payload: Map::new(),
            timestamp: base() + Duration::minutes(minutes),
            service: "data-pipeline".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_then_query_by_type_finds_once() {
        let store = InMemoryLogStore::new();
        store.append(new_entry("data.fetch.started", 0)).await.unwrap();
        let stored = store.append(new_entry("data.fetch.completed", 1)).await.unwrap();

        let filter = LogFilter {
            event_type: Some("data.fetch.completed".to_string()),
            ..LogFilter::default()
        };
        let (entries, total) = store
            .query(&filter, PaginationParams::default().cursor())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(entries, vec![stored]);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let store = InMemoryLogStore::new();
        let a = store.append(new_entry("data.upload.started", 0)).await.unwrap();
        let b = store.append(new_entry("data.upload.started", 0)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_query_pages_newest_first() {
        let store = InMemoryLogStore::new();
        for minute in 0..30 {
            store.append(new_entry("data.fetch.failed", minute)).await.unwrap();
        }

        let params = PaginationParams::new(Some(2), Some(25));
        let (entries, total) = store
            .query(&LogFilter::default(), params.cursor())
            .await
            .unwrap();
        assert_eq!(total, 30);
        assert_eq!(entries.len(), 5);
        assert_descending(&entries, |e| e.timestamp, "page 2");
        assert_eq!(entries[0].timestamp, base() + Duration::minutes(4));
        assert_eq!(entries[4].timestamp, base());
    }

    #[tokio::test]
    async fn test_query_range_is_ascending_and_inclusive() {
        let store = InMemoryLogStore::new();
        for minute in [5, 1, 3, 9] {
            store.append(new_entry("data.search.started", minute)).await.unwrap();
        }

        let range = TimeRange::new(
            Some(base() + Duration::minutes(1)),
            Some(base() + Duration::minutes(5)),
        );
        let entries = store.query_range(&range).await.unwrap();
        let minutes: Vec<i64> = entries
            .iter()
            .map(|e| (e.timestamp - base()).num_minutes())
            .collect();
        assert_eq!(minutes, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let store = InMemoryLogStore::new();
        store.set_available(false);

        assert!(store.ping().await.unwrap_err().is_unavailable());
        assert!(
            store
                .append(new_entry("data.fetch.started", 0))
                .await
                .unwrap_err()
                .is_unavailable()
        );

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
