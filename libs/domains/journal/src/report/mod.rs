//! Activity report composition.
//!
//! [`ReportComposer`] turns a time-ordered slice of the journal into a
//! [`ReportDocument`] and hands it to a [`DocumentRenderer`]. Charting and
//! document output are collaborators so either can be swapped.

mod chart;
mod envelope;
mod pdf;

pub use chart::{
    CHART_HEIGHT, CHART_WIDTH, ChartImage, ChartRenderer, ChartSeries, RasterChartRenderer,
};
pub use envelope::ReportEnvelope;
pub use pdf::PdfDocumentRenderer;

#[cfg(test)]
pub(crate) use pdf::decoded_text;

use crate::buckets::{Granularity, TimeBucketPolicy};
use crate::error::RenderError;
use crate::models::{LogEntry, TimeRange, TypeCount};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Listing length in the "Recent Events" section.
pub const RECENT_LIMIT: usize = 50;

pub const NO_EVENTS_NOTICE: &str = "No events found for the specified period";
pub const CHART_FAILED_NOTICE: &str = "Failed to generate line chart";
pub const CHART_TITLE: &str = "Events Over Time";

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSection {
    Rendered(ChartImage),
    /// Chart could not be produced; carries the reason.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total: u64,
    /// Count descending, then type ascending
    pub by_type: Vec<TypeCount>,
    pub chart: ChartSection,
    /// Newest first
    pub recent: Vec<LogEntry>,
    /// Entries in range not shown in `recent`
    pub omitted: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBody {
    Empty,
    Summary(ReportSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub range: TimeRange,
    pub body: ReportBody,
}

pub struct ReportComposer {
    chart: Box<dyn ChartRenderer>,
    document: Box<dyn DocumentRenderer>,
    policy: TimeBucketPolicy,
    recent_limit: usize,
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new(
            Box::new(RasterChartRenderer::default()),
            Box::new(PdfDocumentRenderer::new()),
        )
    }
}

impl ReportComposer {
    pub fn new(chart: Box<dyn ChartRenderer>, document: Box<dyn DocumentRenderer>) -> Self {
        Self {
            chart,
            document,
            policy: TimeBucketPolicy::default(),
            recent_limit: RECENT_LIMIT,
        }
    }

    pub fn with_policy(mut self, policy: TimeBucketPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Build the document model for `entries`, which must be oldest first.
    ///
    /// Chart failures are folded into [`ChartSection::Failed`].
    pub fn summarize(
        &self,
        range: TimeRange,
        entries: &[LogEntry],
        generated_at: DateTime<Utc>,
    ) -> ReportDocument {
        if entries.is_empty() {
            return ReportDocument {
                generated_at,
                range,
                body: ReportBody::Empty,
            };
        }

        let timestamps: Vec<DateTime<Utc>> = entries.iter().map(|e| e.timestamp).collect();
        let series = ChartSeries {
            title: CHART_TITLE.to_string(),
            granularity: self
                .policy
                .granularity_of(&timestamps)
                .unwrap_or(Granularity::Minute),
            buckets: self.policy.aggregate(&timestamps),
        };
        let chart = match self.chart.render(&series) {
            Ok(image) => ChartSection::Rendered(image),
            Err(e) => {
                warn!(error = %e, "Chart rendering failed, continuing without chart");
                ChartSection::Failed(e.to_string())
            }
        };

        let recent: Vec<LogEntry> = entries.iter().rev().take(self.recent_limit).cloned().collect();
        let total = entries.len() as u64;

        ReportDocument {
            generated_at,
            range,
            body: ReportBody::Summary(ReportSummary {
                total,
                by_type: count_by_type(entries),
                chart,
                omitted: total - recent.len() as u64,
                recent,
            }),
        }
    }

    /// Render the report for `entries` (oldest first) to document bytes.
    pub fn compose(&self, range: TimeRange, entries: &[LogEntry]) -> Result<Vec<u8>, RenderError> {
        let document = self.summarize(range, entries, Utc::now());
        let bytes = self.document.render(&document)?;
        debug!(entries = entries.len(), bytes = bytes.len(), "Report composed");
        Ok(bytes)
    }
}

pub fn count_by_type(entries: &[LogEntry]) -> Vec<TypeCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.event_type.as_str()).or_default() += 1;
    }

    let mut by_type: Vec<TypeCount> = counts
        .into_iter()
        .map(|(event_type, count)| TypeCount {
            event_type: event_type.to_string(),
            count,
        })
        .collect();
    by_type.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.event_type.cmp(&b.event_type)));
    by_type
}
