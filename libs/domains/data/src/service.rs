//! Search service with lifecycle events

use crate::error::DataResult;
use crate::repository::DataRepository;
use crate::search::build_filter;
use mongodb::bson::Document;
use pagination::{Paginated, PaginationParams};
use pubsub::{DEFAULT_CHANNEL, Event, EventPublisher, EventSeries, event_types};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// `service` field on every event this crate publishes.
pub const SERVICE_NAME: &str = "data-pipeline";

pub struct DataService<R: DataRepository> {
    repository: Arc<R>,
    publisher: Option<Arc<dyn EventPublisher>>,
    series: Option<Arc<dyn EventSeries>>,
    channel: String,
}

impl<R: DataRepository> DataService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            publisher: None,
            series: None,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    /// Publish `data.search.*` events to `channel`.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>, channel: impl Into<String>) -> Self {
        self.publisher = Some(publisher);
        self.channel = channel.into();
        self
    }

    /// Count each published event in its per-type series.
    pub fn with_series(mut self, series: Arc<dyn EventSeries>) -> Self {
        self.series = Some(series);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Search the collection. Emits `data.search.started` first, then
    /// `completed` or `failed`.
    #[instrument(skip(self, params), fields(page = params.page(), limit = params.limit()))]
    pub async fn search(
        &self,
        query: &str,
        params: PaginationParams,
    ) -> DataResult<Paginated<Document>> {
        self.publish(
            event_types::DATA_SEARCH_STARTED,
            json!({ "query": query, "page": params.page(), "limit": params.limit() }),
        )
        .await;

        match self.run_search(query, params).await {
            Ok(page) => {
                self.publish(
                    event_types::DATA_SEARCH_COMPLETED,
                    json!({
                        "query": query,
                        "page": params.page(),
                        "limit": params.limit(),
                        "total": page.meta.total,
                        "found": page.data.len(),
                    }),
                )
                .await;
                info!(total = page.meta.total, found = page.data.len(), "Search completed");
                Ok(page)
            }
            Err(e) => {
                self.publish(
                    event_types::DATA_SEARCH_FAILED,
                    json!({ "query": query, "error": e.to_string() }),
                )
                .await;
                Err(e)
            }
        }
    }

    async fn run_search(
        &self,
        query: &str,
        params: PaginationParams,
    ) -> DataResult<Paginated<Document>> {
        let filter = build_filter(self.repository.as_ref(), query).await?;
        let total = self.repository.count(&filter).await?;
        let data = self.repository.find(&filter, params.cursor()).await?;
        Ok(Paginated::new(data, total, &params))
    }

    pub async fn ping(&self) -> DataResult<()> {
        self.repository.ping().await
    }

    /// Best effort: failures are logged and never fail the search. An event
    /// that could not be published is not counted.
    async fn publish(&self, event_type: &str, payload: Value) {
        if let Some(publisher) = &self.publisher {
            let payload = match payload {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            let event = Event::new(event_type, SERVICE_NAME, payload);
            if let Err(e) = publisher.publish(&self.channel, &event).await {
                warn!(error = %e, event_type, "Failed to publish event");
                return;
            }
        }
        if let Some(series) = &self.series {
            if let Err(e) = series.record(event_type).await {
                warn!(error = %e, event_type, "Failed to record event series");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::memory::InMemoryDataRepository;
    use crate::repository::MockDataRepository;
    use async_trait::async_trait;
    use mockall::{Sequence, mock, predicate};
    use mongodb::bson::doc;
    use pubsub::PubSubError;

    mock! {
        pub Publisher {}

        #[async_trait]
        impl EventPublisher for Publisher {
            async fn publish(&self, channel: &str, event: &Event) -> Result<(), PubSubError>;
        }
    }

    mock! {
        pub Series {}

        #[async_trait]
        impl EventSeries for Series {
            async fn record(&self, event_type: &str) -> Result<(), PubSubError>;
        }
    }

    fn redis_down() -> PubSubError {
        PubSubError::Connection(database::DatabaseError::ConnectionFailed(
            "redis down".to_string(),
        ))
    }

    fn repo() -> Arc<InMemoryDataRepository> {
        Arc::new(InMemoryDataRepository::with_documents(vec![
            doc! { "title": "Example", "id": 1 },
            doc! { "title": "Another example", "id": 2 },
            doc! { "title": "Unrelated", "id": 3 },
        ]))
    }

    fn expect_event(publisher: &mut MockPublisher, seq: &mut Sequence, event_type: &'static str) {
        publisher
            .expect_publish()
            .with(
                predicate::eq("events"),
                predicate::function(move |e: &Event| {
                    e.event_type == event_type && e.service == SERVICE_NAME
                }),
            )
            .times(1)
            .in_sequence(seq)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_search_matches_case_insensitively() {
        let service = DataService::new(repo());
        let page = service
            .search("exa", PaginationParams::default())
            .await
            .unwrap();

        assert_eq!(page.meta.total, 2);
        let titles: Vec<&str> = page
            .data
            .iter()
            .map(|d| d.get_str("title").unwrap())
            .collect();
        assert_eq!(titles, vec!["Example", "Another example"]);
    }

    #[tokio::test]
    async fn test_blank_query_returns_everything_paginated() {
        let service = DataService::new(repo());
        let page = service
            .search("", PaginationParams::new(Some(2), Some(2)))
            .await
            .unwrap();

        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn test_search_publishes_started_then_completed() {
        let mut publisher = MockPublisher::new();
        let mut seq = Sequence::new();
        expect_event(&mut publisher, &mut seq, event_types::DATA_SEARCH_STARTED);
        expect_event(&mut publisher, &mut seq, event_types::DATA_SEARCH_COMPLETED);

        let service = DataService::new(repo()).with_publisher(Arc::new(publisher), "events");
        service.search("exa", PaginationParams::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_query_publishes_failed() {
        let mut publisher = MockPublisher::new();
        let mut seq = Sequence::new();
        expect_event(&mut publisher, &mut seq, event_types::DATA_SEARCH_STARTED);
        expect_event(&mut publisher, &mut seq, event_types::DATA_SEARCH_FAILED);

        let service = DataService::new(repo()).with_publisher(Arc::new(publisher), "events");
        let err = service
            .search("*exa", PaginationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_search() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(2).returning(|_, _| Err(redis_down()));

        let service = DataService::new(repo()).with_publisher(Arc::new(publisher), "events");
        let page = service.search("exa", PaginationParams::default()).await.unwrap();
        assert_eq!(page.meta.total, 2);
    }

    #[tokio::test]
    async fn test_each_published_event_is_counted_by_type() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(2).returning(|_, _| Ok(()));

        let mut series = MockSeries::new();
        let mut seq = Sequence::new();
        for event_type in [event_types::DATA_SEARCH_STARTED, event_types::DATA_SEARCH_COMPLETED] {
            series
                .expect_record()
                .with(predicate::eq(event_type))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        let service = DataService::new(repo())
            .with_publisher(Arc::new(publisher), "events")
            .with_series(Arc::new(series));
        service.search("exa", PaginationParams::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_series_failure_does_not_fail_search() {
        let mut series = MockSeries::new();
        series.expect_record().times(2).returning(|_| Err(redis_down()));

        let service = DataService::new(repo()).with_series(Arc::new(series));
        let page = service.search("exa", PaginationParams::default()).await.unwrap();
        assert_eq!(page.meta.total, 2);
    }

    #[tokio::test]
    async fn test_unpublished_event_is_not_counted() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(2).returning(|_, _| Err(redis_down()));
        let mut series = MockSeries::new();
        series.expect_record().never();

        let service = DataService::new(repo())
            .with_publisher(Arc::new(publisher), "events")
            .with_series(Arc::new(series));
        service.search("exa", PaginationParams::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_unavailable_repository_surfaces() {
        let mut repository = MockDataRepository::new();
        repository
            .expect_sample()
            .returning(|| Err(DataError::StorageUnavailable("no primary".to_string())));
        repository.expect_count().never();

        let service = DataService::new(Arc::new(repository));
        let err = service
            .search("exa", PaginationParams::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("MongoDB is not connected"));
    }
}
