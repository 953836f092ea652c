use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::aggregate::build_roster;
use crate::auth::Session;
use crate::error::AppError;
use crate::model::{AttendanceDraft, AttendanceRecord, AttendanceStats, YearLevel};
use crate::snapshot::Snapshot;
use crate::store::Store;
use crate::write_path::mark_attendance;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub subject_id: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    pub year: YearLevel,
    pub subject_id: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    pub records: Vec<AttendanceDraft>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub records: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("date", Query, description = "Only marks for this day (YYYY-MM-DD)"),
        ("subjectId", Query, description = "Only marks for this subject"),
        ("studentId", Query, description = "Only marks for this student")
    ),
    responses(
        (status = 200, description = "Records, newest date first", body = [AttendanceRecord]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_attendance(
    store: web::Data<dyn Store>,
    session: Session,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let records = store.list_attendance(user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "Failed to list attendance");
        AppError::from(e)
    })?;

    let records: Vec<AttendanceRecord> = records
        .into_iter()
        .filter(|r| query.date.is_none_or(|d| r.date == d))
        .filter(|r| query.subject_id.as_ref().is_none_or(|id| &r.subject_id == id))
        .filter(|r| query.student_id.as_ref().is_none_or(|id| &r.student_id == id))
        .collect();
    Ok(HttpResponse::Ok().json(records))
}

/// Save a batch of attendance marks
///
/// Each mark replaces whatever was recorded for the same student, subject and
/// date. If the store fails part-way the response is a 500 whose `journal`
/// lists the marks that were applied, the one that failed and those never
/// attempted.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Marks saved", body = MarkAttendanceResponse),
        (status = 400, description = "Empty batch"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Batch stopped part-way", body = Object, example = json!({
            "error": "Saved 1 of 3 attendance marks: connection reset",
            "journal": {"entries": []}
        }))
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok(), count = payload.records.len()))]
pub async fn save_attendance(
    store: web::Data<dyn Store>,
    session: Session,
    payload: web::Json<MarkAttendance>,
) -> Result<HttpResponse, AppError> {
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let outcome = mark_attendance(store.get_ref(), &session, &payload.records).await?;

    let snapshot = snapshot.with_marked(&outcome.keys(), outcome.records.clone());
    info!(saved = outcome.records.len(), "Attendance batch applied");

    Ok(HttpResponse::Ok().json(MarkAttendanceResponse {
        stats: snapshot.daily_stats(today()),
        records: outcome.records,
    }))
}

/// Marking sheet for one class on one day
#[utoipa::path(
    get,
    path = "/api/attendance/roster",
    params(
        ("year", Query, description = "Year level, e.g. `Year 7`"),
        ("subjectId", Query, description = "Subject being marked"),
        ("date", Query, description = "Day being marked, defaults to today"),
        ("search", Query, description = "Case-insensitive name filter")
    ),
    responses(
        (status = 200, description = "Students with their current mark", body = crate::model::Roster),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn roster(
    store: web::Data<dyn Store>,
    session: Session,
    query: web::Query<RosterQuery>,
) -> Result<HttpResponse, AppError> {
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let roster = build_roster(
        &snapshot.students,
        &snapshot.records,
        query.year,
        &query.subject_id,
        query.date.unwrap_or_else(today),
        query.search.as_deref().unwrap_or_default(),
    );
    Ok(HttpResponse::Ok().json(roster))
}
