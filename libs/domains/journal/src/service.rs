//! Journal service layer

use crate::error::JournalResult;
use crate::models::{LogEntry, LogQuery, TimeRange};
use crate::report::{ReportComposer, ReportEnvelope};
use crate::store::LogStore;
use pagination::Paginated;
use std::sync::Arc;
use tracing::{info, instrument};

/// Read side of the journal: paginated queries and reports.
pub struct JournalService<S: LogStore> {
    store: Arc<S>,
    composer: ReportComposer,
}

impl<S: LogStore> JournalService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            composer: ReportComposer::default(),
        }
    }

    /// Replace the default raster chart + PDF composer
    pub fn with_composer(mut self, composer: ReportComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Filtered page of entries, newest first.
    #[instrument(skip(self))]
    pub async fn get_logs(&self, query: &LogQuery) -> JournalResult<Paginated<LogEntry>> {
        let filter = query.filter()?;
        let params = query.pagination();
        let (entries, total) = self.store.query(&filter, params.cursor()).await?;
        Ok(Paginated::new(entries, total, &params))
    }

    /// Report document bytes for everything in `range`.
    #[instrument(skip(self))]
    pub async fn report(&self, range: TimeRange) -> JournalResult<Vec<u8>> {
        let entries = self.store.query_range(&range).await?;
        let bytes = self.composer.compose(range, &entries)?;
        info!(entries = entries.len(), bytes = bytes.len(), "Report generated");
        Ok(bytes)
    }

    #[instrument(skip(self))]
    pub async fn report_envelope(&self, range: TimeRange) -> JournalResult<ReportEnvelope> {
        let bytes = self.report(range).await?;
        Ok(ReportEnvelope::encode(&bytes))
    }

    pub async fn ping(&self) -> JournalResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;
    use crate::memory::InMemoryLogStore;
    use crate::models::NewLogEntry;
    use crate::store::mock::MockLogStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pagination::PageQuery;
    use serde_json::Map;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap()
    }

    fn new_entry(event_type: &str, minutes: i64) -> NewLogEntry {
        NewLogEntry {
            event_type: event_type.to_string(),
            payload: Map::new(),
            timestamp: base() + Duration::minutes(minutes),
            service: "data-pipeline".to_string(),
            created_at: base(),
        }
    }

    fn query(event_type: Option<&str>, page: i64, limit: i64) -> LogQuery {
        LogQuery {
            event_type: event_type.map(str::to_string),
            page: PageQuery {
                page: Some(page),
                limit: Some(limit),
            },
            ..LogQuery::default()
        }
    }

    #[tokio::test]
    async fn test_get_logs_second_page() {
        let store = Arc::new(InMemoryLogStore::new());
        for minute in 0..30 {
            store.append(new_entry("data.fetch.failed", minute)).await.unwrap();
        }
        store.append(new_entry("data.fetch.started", 99)).await.unwrap();

        let service = JournalService::new(store);
        let page = service
            .get_logs(&query(Some("data.fetch.failed"), 2, 25))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 5);
        assert_eq!(page.meta.total, 30);
        assert_eq!(page.meta.total_pages, 2);
        assert!(page.data.iter().all(|e| e.event_type == "data.fetch.failed"));
    }

    #[tokio::test]
    async fn test_get_logs_rejects_bad_date() {
        let service = JournalService::new(Arc::new(InMemoryLogStore::new()));
        let mut q = query(None, 1, 10);
        q.from = Some("yesterday".to_string());

        let err = service.get_logs(&q).await.unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_logs_empty_store() {
        let service = JournalService::new(Arc::new(InMemoryLogStore::new()));
        let page = service.get_logs(&LogQuery::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.total, 0);
        assert_eq!(page.meta.total_pages, 0);
    }

    #[tokio::test]
    async fn test_report_for_empty_range() {
        let store = Arc::new(InMemoryLogStore::new());
        store.append(new_entry("data.fetch.started", 0)).await.unwrap();
        let service = JournalService::new(store);

        let later = TimeRange::new(Some(base() + Duration::days(1)), None);
        let bytes = service.report(later).await.unwrap();
        let pdf = crate::report::decoded_text(&bytes);
        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains("No events found for the specified period"));
    }

    #[tokio::test]
    async fn test_report_envelope_decodes_to_pdf() {
        let store = Arc::new(InMemoryLogStore::new());
        store.append(new_entry("data.search.completed", 0)).await.unwrap();
        let service = JournalService::new(store);

        let envelope = service.report_envelope(TimeRange::unbounded()).await.unwrap();
        assert!(envelope.decode().unwrap().starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_report_surfaces_unavailable_store() {
        let mut store = MockLogStore::new();
        store
            .expect_query_range()
            .times(1)
            .returning(|_| Err(JournalError::StorageUnavailable("timeout".to_string())));

        let service = JournalService::new(Arc::new(store));
        let err = service.report(TimeRange::unbounded()).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
