use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::attendance::today;
use crate::aggregate::{
    ReportFilter, compute_filtered_stats, compute_student_summaries, compute_trend,
    compute_year_summaries, filter_records, report_rows, student_report,
};
use crate::auth::Session;
use crate::config::Config;
use crate::error::AppError;
use crate::model::{ReportStats, StudentSummary, YearLevel, YearSummary};
use crate::snapshot::Snapshot;
use crate::store::Store;

const RECENT_RECORDS: usize = 10;
const ALL: &str = "All";

/// Report selection as sent by the client. `year` and `subjectId` accept
/// `All` to disable that filter.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[schema(value_type = Option<String>, format = "date")]
    pub start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end: Option<NaiveDate>,
    #[schema(example = "Year 8")]
    pub year: Option<String>,
    pub subject_id: Option<String>,
}

impl ReportQuery {
    pub fn to_filter(&self, today: NaiveDate, window_days: i64) -> Result<ReportFilter, AppError> {
        let end = self.end.unwrap_or(today);
        let mut filter = match self.start {
            Some(start) => ReportFilter {
                start,
                end,
                year: None,
                subject_id: None,
            },
            None => ReportFilter::trailing(end, window_days).ok_or_else(|| {
                AppError::Validation(format!(
                    "Report window of {window_days} days before {end} is out of range"
                ))
            })?,
        };
        if filter.start > filter.end {
            return Err(AppError::Validation(format!(
                "Report start {} is after end {}",
                filter.start, filter.end
            )));
        }

        filter.year = match self.year.as_deref().map(str::trim) {
            None | Some("") | Some(ALL) => None,
            Some(label) => Some(
                YearLevel::from_str(label)
                    .map_err(|_| AppError::Validation(format!("Unknown year level {label:?}")))?,
            ),
        };
        filter.subject_id = match self.subject_id.as_deref().map(str::trim) {
            None | Some("") | Some(ALL) => None,
            Some(id) => Some(id.to_string()),
        };
        Ok(filter)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportOverview {
    pub stats: ReportStats,
    /// Every student, best attendance first, over all records on file.
    pub students: Vec<StudentSummary>,
    pub years: Vec<YearSummary>,
}

fn filter_for(query: &ReportQuery, config: &Config) -> Result<ReportFilter, AppError> {
    query.to_filter(today(), config.report_window_days)
}

/// Filtered totals with per-student and per-year summaries
#[utoipa::path(
    get,
    path = "/api/reports/overview",
    params(
        ("start", Query, description = "First day, defaults to end minus the report window"),
        ("end", Query, description = "Last day, defaults to today"),
        ("year", Query, description = "Year level or `All`"),
        ("subjectId", Query, description = "Subject id or `All`")
    ),
    responses(
        (status = 200, description = "Report overview", body = ReportOverview),
        (status = 400, description = "Bad date window or year level")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn overview(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = filter_for(&query, &config)?;
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let index = snapshot.students_by_id();

    let students = compute_student_summaries(&snapshot.students, &snapshot.records);
    let years = compute_year_summaries(&students);
    Ok(HttpResponse::Ok().json(ReportOverview {
        stats: compute_filtered_stats(&snapshot.records, &filter, &index),
        students,
        years,
    }))
}

/// Daily attendance rate over the filtered records
#[utoipa::path(
    get,
    path = "/api/reports/trend",
    params(
        ("start", Query, description = "First day, defaults to end minus the report window"),
        ("end", Query, description = "Last day, defaults to today"),
        ("year", Query, description = "Year level or `All`"),
        ("subjectId", Query, description = "Subject id or `All`")
    ),
    responses(
        (status = 200, description = "One point per day with records, oldest first", body = [crate::model::TrendPoint]),
        (status = 400, description = "Bad date window or year level")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn trend(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = filter_for(&query, &config)?;
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let index = snapshot.students_by_id();

    let points = compute_trend(filter_records(&snapshot.records, &filter, &index));
    Ok(HttpResponse::Ok().json(points))
}

/// Filtered records as flat rows for export
#[utoipa::path(
    get,
    path = "/api/reports/rows",
    params(
        ("start", Query, description = "First day, defaults to end minus the report window"),
        ("end", Query, description = "Last day, defaults to today"),
        ("year", Query, description = "Year level or `All`"),
        ("subjectId", Query, description = "Subject id or `All`")
    ),
    responses(
        (status = 200, description = "Report rows", body = [crate::model::ReportRow]),
        (status = 400, description = "Bad date window or year level")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rows(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = filter_for(&query, &config)?;
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let index = snapshot.students_by_id();

    let rows = report_rows(filter_records(&snapshot.records, &filter, &index), &index);
    Ok(HttpResponse::Ok().json(rows))
}

/// One student's totals and latest marks
#[utoipa::path(
    get,
    path = "/api/reports/students/{id}",
    params(
        ("id", Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Student report", body = crate::model::StudentReport),
        (status = 404, description = "Student not found")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn student(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let student = snapshot
        .student(&id)
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))?;

    Ok(HttpResponse::Ok().json(student_report(student, &snapshot.records, RECENT_RECORDS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn empty_query_is_the_trailing_window() {
        let filter = ReportQuery::default().to_filter(day(31), 30).unwrap();
        assert_eq!(Some(filter.clone()), ReportFilter::trailing(day(31), 30));
        assert_eq!(filter.start, day(1));
    }

    #[test]
    fn all_disables_year_and_subject() {
        let query = ReportQuery {
            year: Some("All".into()),
            subject_id: Some("All".into()),
            ..Default::default()
        };
        let filter = query.to_filter(day(10), 5).unwrap();
        assert!(filter.year.is_none());
        assert!(filter.subject_id.is_none());

        let query = ReportQuery {
            year: Some("Year 11".into()),
            subject_id: Some("MATH".into()),
            ..Default::default()
        };
        let filter = query.to_filter(day(10), 5).unwrap();
        assert_eq!(filter.year, Some(YearLevel::Year11));
        assert_eq!(filter.subject_id.as_deref(), Some("MATH"));
    }

    #[test]
    fn bad_windows_and_years_are_rejected() {
        let inverted = ReportQuery {
            start: Some(day(20)),
            end: Some(day(10)),
            ..Default::default()
        };
        assert!(matches!(inverted.to_filter(day(31), 30), Err(AppError::Validation(_))));

        let off_calendar = ReportQuery {
            end: Some(NaiveDate::MIN),
            ..Default::default()
        };
        assert!(matches!(off_calendar.to_filter(day(31), 30), Err(AppError::Validation(_))));

        let explicit_start = ReportQuery {
            start: Some(NaiveDate::MIN),
            end: Some(NaiveDate::MIN),
            ..Default::default()
        };
        assert_eq!(explicit_start.to_filter(day(31), 30).unwrap().start, NaiveDate::MIN);

        let bad_year = ReportQuery {
            year: Some("Year 13".into()),
            ..Default::default()
        };
        assert!(matches!(bad_year.to_filter(day(31), 30), Err(AppError::Validation(_))));
    }
}
