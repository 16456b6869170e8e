//! HTTP handlers for the journal read API

use crate::error::JournalError;
use crate::models::{LogEntry, LogQuery, ReportFormat, ReportQuery};
use crate::service::JournalService;
use crate::store::LogStore;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pagination::Paginated;
use std::sync::Arc;
use tracing::instrument;

/// Journal router state
pub type JournalState<S> = Arc<JournalService<S>>;

const REPORT_FILENAME: &str = "events-report.pdf";

/// `GET /logs` and `GET /logs/report`
pub fn logs_router<S: LogStore + 'static>() -> Router<JournalState<S>> {
    Router::new()
        .route("/logs", get(list_logs::<S>))
        .route("/logs/report", get(get_report::<S>))
}

#[instrument(skip(state))]
pub async fn list_logs<S: LogStore>(
    State(state): State<JournalState<S>>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Paginated<LogEntry>>, JournalError> {
    let page = state.get_logs(&query).await?;
    Ok(Json(page))
}

/// PDF by default, `{pdf: base64}` with `?format=base64`.
#[instrument(skip(state))]
pub async fn get_report<S: LogStore>(
    State(state): State<JournalState<S>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, JournalError> {
    let range = query.range()?;
    match query.format {
        ReportFormat::Pdf => {
            let bytes = state.report(range).await?;
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{}\"", REPORT_FILENAME),
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        ReportFormat::Base64 => {
            let envelope = state.report_envelope(range).await?;
            Ok(Json(envelope).into_response())
        }
    }
}
