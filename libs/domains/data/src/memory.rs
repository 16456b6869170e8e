//! Vec-backed data repository

use crate::error::{DataError, DataResult};
use crate::repository::DataRepository;
use crate::search::SearchFilter;
use async_trait::async_trait;
use mongodb::bson::Document;
use pagination::PageCursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// In-process [`DataRepository`] evaluating filters with
/// [`SearchFilter::matches`]. Insertion order is natural order.
#[derive(Debug, Default)]
pub struct InMemoryDataRepository {
    documents: RwLock<Vec<Document>>,
    offline: AtomicBool,
}

impl InMemoryDataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
            offline: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, document: Document) {
        self.documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(document);
    }

    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn snapshot(&self) -> DataResult<Vec<Document>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DataError::StorageUnavailable(
                "in-memory repository is offline".to_string(),
            ));
        }
        Ok(self
            .documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

#[async_trait]
impl DataRepository for InMemoryDataRepository {
    async fn sample(&self) -> DataResult<Option<Document>> {
        Ok(self.snapshot()?.into_iter().next())
    }

    async fn count(&self, filter: &SearchFilter) -> DataResult<u64> {
        Ok(self.snapshot()?.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn find(&self, filter: &SearchFilter, cursor: PageCursor) -> DataResult<Vec<Document>> {
        let skip = usize::try_from(cursor.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(cursor.limit).unwrap_or(usize::MAX);
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|d| filter.matches(d))
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn ping(&self) -> DataResult<()> {
        self.snapshot().map(|_| ())
    }
}
