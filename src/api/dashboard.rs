use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;

use super::attendance::today;
use crate::auth::Session;
use crate::error::AppError;
use crate::snapshot::Snapshot;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

/// Headline figures
///
/// Day counts cover `date` (today by default); `attendanceRate` covers every
/// record on file.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(
        ("date", Query, description = "Day to count (YYYY-MM-DD), defaults to today")
    ),
    responses(
        (status = 200, description = "Dashboard stats", body = crate::model::AttendanceStats),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Dashboard",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn dashboard(
    store: web::Data<dyn Store>,
    session: Session,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, AppError> {
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    let as_of = query.date.unwrap_or_else(today);
    Ok(HttpResponse::Ok().json(snapshot.daily_stats(as_of)))
}
