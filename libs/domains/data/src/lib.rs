//! Data Domain
//!
//! Search over the schemaless `data` collection. Searchable fields are
//! inferred per request from a sample document (see [`search`]), and every
//! search emits `data.search.*` lifecycle events on the bus.

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod search;
pub mod service;

pub use error::{DataError, DataResult, LEADING_WILDCARD};
pub use handlers::{DataState, data_router};
pub use memory::InMemoryDataRepository;
pub use models::{DATA_COLLECTION, SearchQuery, TEXT_INDEX_NAME};
pub use mongodb::MongoDataRepository;
pub use repository::DataRepository;
pub use search::{SearchFilter, build_filter};
pub use service::{DataService, SERVICE_NAME};
