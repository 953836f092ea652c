use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::{AttendanceRecord, AttendanceStatus};
use super::student::{Student, YearLevel};

/// Dashboard figures. The `*_today` counts cover one day while
/// `attendance_rate` covers every record the user has.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_students: usize,
    pub present_today: usize,
    pub absent_today: usize,
    pub late_today: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub year: YearLevel,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub total: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total_records: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: YearLevel,
    pub student_count: usize,
    pub average_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub summary: StudentSummary,
    pub recent: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: Student,
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterCounts {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub unmarked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub counts: RosterCounts,
}

/// One line of the tabular report handed to exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub student: String,
    pub year: String,
    pub subject: String,
    pub status: AttendanceStatus,
}
