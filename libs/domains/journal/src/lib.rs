//! Journal Domain
//!
//! Persists every event seen on the bus and serves it back:
//! - [`LogStoreHandler`] appends decoded events to a [`LogStore`]
//! - [`JournalService`] answers paginated queries and builds activity reports
//! - [`logs_router`] exposes `GET /logs` and `GET /logs/report`
//!
//! ```text
//! Redis channel ──► EventSubscriber ──► LogStoreHandler ──► LogStore (MongoDB)
//!                                                             │
//!          GET /logs ◄──── JournalService ◄───────────────────┘
//!   GET /logs/report ◄──── ReportComposer (buckets ─► chart ─► PDF)
//! ```

pub mod buckets;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod report;
pub mod service;
pub mod store;

pub use buckets::{Granularity, TimeBucket, TimeBucketPolicy};
pub use error::{JournalError, JournalResult, RenderError};
pub use handlers::{JournalState, logs_router};
pub use ingest::LogStoreHandler;
pub use memory::InMemoryLogStore;
pub use models::{
    LOGS_COLLECTION, LogEntry, LogFilter, LogQuery, NewLogEntry, ReportFormat, ReportQuery,
    TimeRange, TypeCount,
};
pub use mongodb::MongoLogStore;
pub use report::{
    PdfDocumentRenderer, RasterChartRenderer, ReportComposer, ReportDocument, ReportEnvelope,
};
pub use service::JournalService;
pub use store::LogStore;
