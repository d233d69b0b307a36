use super::store_failure;
use crate::attendance::{ReportError, ReportFilter};
use crate::model::attendance::{DailyAttendanceRecord, RangeSummaryRecord};
use crate::model::punch::RawPunchEvent;
use crate::state::AppState;
use crate::sync::IngestOutcome;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use utoipa::IntoParams;

const DEFAULT_LOG_LIMIT: u32 = 100;
const MAX_LOG_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Device the pushed punches belong to
    pub device_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    /// Newest first; defaults to 100, capped at 1000
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyReportQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = Date, example = "2026-01-05")]
    pub date: Option<NaiveDate>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeReportQuery {
    #[param(value_type = String, format = Date, example = "2026-01-01")]
    pub start: NaiveDate,
    #[param(value_type = String, format = Date, example = "2026-01-31")]
    pub end: NaiveDate,
    pub position: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
}

fn filter(position: Option<String>, department: Option<String>, search: Option<String>) -> ReportFilter {
    ReportFilter {
        position,
        department,
        search,
    }
}

/// Push upload from a terminal
///
/// Accepts one punch object or an array of them. Cursors are not touched.
#[utoipa::path(
    post,
    path = "/api/attendance/upload",
    params(UploadQuery),
    request_body(content = Object, example = json!([
        { "user_id": "42", "time": "2026-01-05T08:10:00" }
    ])),
    responses(
        (status = 200, description = "Batch ingested", body = IngestOutcome),
        (status = 400, description = "Body is neither an object nor an array"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn upload_logs(
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let device_id = query.into_inner().device_id;
    if device_id.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "device_id is required"
        })));
    }

    let records = match body.into_inner() {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Expected a punch object or an array of punches"
            })));
        }
    };

    let outcome = state
        .ingestor
        .ingest(&device_id, &records)
        .await
        .map_err(|e| store_failure(e, "ingest pushed punches"))?;
    info!(
        device_id = %device_id,
        received = outcome.received,
        inserted = outcome.inserted,
        "Pushed punches ingested"
    );
    Ok(HttpResponse::Ok().json(outcome))
}

/// Most recently received punch events
#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Punch events, newest first", body = [RawPunchEvent]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_logs(
    state: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let events = state
        .punches
        .list_recent(limit)
        .await
        .map_err(|e| store_failure(e, "list punch events"))?;
    Ok(HttpResponse::Ok().json(events))
}

/// Daily attendance report
#[utoipa::path(
    get,
    path = "/api/attendance/report/daily",
    params(DailyReportQuery),
    responses(
        (status = 200, description = "One record per employee", body = [DailyAttendanceRecord]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn daily_report(
    state: web::Data<AppState>,
    query: web::Query<DailyReportQuery>,
) -> actix_web::Result<impl Responder> {
    let DailyReportQuery {
        date,
        position,
        department,
        search,
    } = query.into_inner();
    let today = Local::now().date_naive();
    let date = date.unwrap_or(today);

    let records = state
        .reports
        .daily(date, &filter(position, department, search), today)
        .await
        .map_err(|e| store_failure(e, "build daily report"))?;
    Ok(HttpResponse::Ok().json(records))
}

/// Attendance summary over a date range
#[utoipa::path(
    get,
    path = "/api/attendance/report/range",
    params(RangeReportQuery),
    responses(
        (status = 200, description = "One summary per employee; empty when start is after end", body = [RangeSummaryRecord]),
        (status = 400, description = "Range spans more than 366 days"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn range_report(
    state: web::Data<AppState>,
    query: web::Query<RangeReportQuery>,
) -> actix_web::Result<impl Responder> {
    let RangeReportQuery {
        start,
        end,
        position,
        department,
        search,
    } = query.into_inner();

    let result = state
        .reports
        .range(
            start,
            end,
            &filter(position, department, search),
            Local::now().date_naive(),
        )
        .await;

    match result {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(e @ ReportError::RangeTooLong { .. }) => Ok(HttpResponse::BadRequest().json(json!({
            "message": e.to_string()
        }))),
        Err(ReportError::Store(e)) => Err(store_failure(e, "build range summary")),
    }
}
