//! Log store trait

use crate::error::JournalResult;
use crate::models::{LogEntry, LogFilter, NewLogEntry, TimeRange};
use async_trait::async_trait;
use pagination::PageCursor;

/// Persistence boundary for the append-only journal.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Insert one entry. No dedup: the same event appended twice is stored twice.
    async fn append(&self, entry: NewLogEntry) -> JournalResult<LogEntry>;

    /// Page of matching entries, newest first, plus the unpaginated match count.
    async fn query(
        &self,
        filter: &LogFilter,
        cursor: PageCursor,
    ) -> JournalResult<(Vec<LogEntry>, u64)>;

    /// Every entry in `range`, oldest first.
    async fn query_range(&self, range: &TimeRange) -> JournalResult<Vec<LogEntry>>;

    /// Connectivity check.
    async fn ping(&self) -> JournalResult<()>;
}
