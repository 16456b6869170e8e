//! MongoDB implementation of DataRepository

use crate::error::DataResult;
use crate::models::{DATA_COLLECTION, TEXT_INDEX_NAME};
use crate::repository::DataRepository;
use crate::search::SearchFilter;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use pagination::PageCursor;
use tracing::{debug, instrument, warn};

/// MongoDB-backed repository over the schemaless `data` collection
#[derive(Clone)]
pub struct MongoDataRepository {
    database: Database,
    collection: Collection<Document>,
}

impl MongoDataRepository {
    pub fn new(database: &Database) -> Self {
        Self::with_collection(database, DATA_COLLECTION)
    }

    pub fn with_collection(database: &Database, name: &str) -> Self {
        Self {
            database: database.clone(),
            collection: database.collection(name),
        }
    }

    /// Wildcard text index over every string field, created once.
    pub async fn create_indexes(&self) -> DataResult<()> {
        let existing = index_names_or_empty(self.collection.list_index_names().await);
        if existing.iter().any(|name| name == TEXT_INDEX_NAME) {
            return Ok(());
        }

        let index = IndexModel::builder()
            .keys(doc! { "$**": "text" })
            .options(
                IndexOptions::builder()
                    .name(TEXT_INDEX_NAME.to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        debug!(collection = %self.collection.name(), "Text index created");
        Ok(())
    }
}

/// listIndexes fails on a collection that does not exist yet, so a failed
/// listing is logged and treated as "no indexes".
fn index_names_or_empty(listed: mongodb::error::Result<Vec<String>>) -> Vec<String> {
    listed.unwrap_or_else(|e| {
        warn!(error = %e, "Could not list indexes on data collection");
        Vec::new()
    })
}

#[async_trait]
impl DataRepository for MongoDataRepository {
    #[instrument(skip(self))]
    async fn sample(&self) -> DataResult<Option<Document>> {
        Ok(self.collection.find_one(doc! {}).await?)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &SearchFilter) -> DataResult<u64> {
        Ok(self.collection.count_documents(filter.to_document()).await?)
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: &SearchFilter, cursor: PageCursor) -> DataResult<Vec<Document>> {
        let options = FindOptions::builder()
            .skip(cursor.skip)
            .limit(i64::try_from(cursor.limit).unwrap_or(i64::MAX))
            .build();
        let found = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;
        Ok(found.try_collect().await?)
    }

    async fn ping(&self) -> DataResult<()> {
        database::mongodb::ping(&self.database).await?;
        Ok(())
    }
}
