//! Data domain models

use mongodb::bson::{Bson, Document};
use pagination::{PageQuery, PaginationParams};
use serde::Deserialize;
use serde_json::Value;

/// Collection searched by `/data/search`.
pub const DATA_COLLECTION: &str = "data";

/// Name of the wildcard text index on [`DATA_COLLECTION`].
pub const TEXT_INDEX_NAME: &str = "text_index";

/// `?query=&page=&limit=` on `GET /data/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl SearchQuery {
    pub fn pagination(&self) -> PaginationParams {
        self.page.into()
    }
}

/// Relaxed extended JSON: `ObjectId` becomes `{"$oid": ...}`, plain numbers stay numbers.
pub fn document_to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}
