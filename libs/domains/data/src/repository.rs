use async_trait::async_trait;
use mongodb::bson::Document;
use pagination::PageCursor;

use crate::error::DataResult;
use crate::search::SearchFilter;

/// Read access to the schemaless `data` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataRepository: Send + Sync {
    /// Any one document, used to infer searchable fields
    async fn sample(&self) -> DataResult<Option<Document>>;

    /// Number of documents matching `filter`
    async fn count(&self, filter: &SearchFilter) -> DataResult<u64>;

    /// One page of documents matching `filter`, in natural order
    async fn find(&self, filter: &SearchFilter, cursor: PageCursor) -> DataResult<Vec<Document>>;

    /// Connectivity check
    async fn ping(&self) -> DataResult<()>;
}
