use crate::api::attendance::{AttendanceQuery, MarkAttendance, MarkAttendanceResponse, RosterQuery};
use crate::api::report::{ReportOverview, ReportQuery};
use crate::api::subject::{AssignStudents, SubjectMembers};
use crate::model::{
    AttendanceDraft, AttendanceRecord, AttendanceStats, AttendanceStatus, NaturalKey, NewStudent,
    NewSubject, ReportRow, ReportStats, Roster, RosterCounts, RosterEntry, SettingsUpdate, Student,
    StudentReport, StudentSummary, StudentUpdate, Subject, SubjectUpdate, Theme, TrendPoint,
    UserSettings, YearLevel, YearSummary,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rollcall API",
        version = "1.0.0",
        description = r#"
## School attendance tracking

Teachers keep their students and subjects, mark attendance per class and day,
and read dashboards and reports computed from those marks.

### Security
Every endpoint except `/health` needs a **JWT Bearer** access token. Data is
scoped to the user in the token.

### Errors
Errors are `{"error": "<message>"}`. A batch of attendance marks that stops
part-way answers 500 with a `journal` naming applied, failed and pending marks.
"#,
    ),
    paths(
        crate::routes::health,

        crate::api::student::list_students,
        crate::api::student::create_student,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::subject::list_subjects,
        crate::api::subject::create_subject,
        crate::api::subject::update_subject,
        crate::api::subject::delete_subject,
        crate::api::subject::list_subject_students,
        crate::api::subject::assign_subject_students,

        crate::api::attendance::list_attendance,
        crate::api::attendance::save_attendance,
        crate::api::attendance::roster,

        crate::api::dashboard::dashboard,

        crate::api::report::overview,
        crate::api::report::trend,
        crate::api::report::rows,
        crate::api::report::student,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings
    ),
    components(
        schemas(
            YearLevel,
            Student,
            NewStudent,
            StudentUpdate,
            Subject,
            NewSubject,
            SubjectUpdate,
            AssignStudents,
            SubjectMembers,
            AttendanceStatus,
            NaturalKey,
            AttendanceDraft,
            AttendanceRecord,
            AttendanceQuery,
            MarkAttendance,
            MarkAttendanceResponse,
            RosterQuery,
            Roster,
            RosterEntry,
            RosterCounts,
            AttendanceStats,
            ReportQuery,
            ReportOverview,
            ReportStats,
            ReportRow,
            StudentSummary,
            StudentReport,
            TrendPoint,
            YearSummary,
            Theme,
            UserSettings,
            SettingsUpdate
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Student", description = "Student management APIs"),
        (name = "Subject", description = "Subject and class list APIs"),
        (name = "Attendance", description = "Attendance marking APIs"),
        (name = "Dashboard", description = "Headline attendance figures"),
        (name = "Report", description = "Attendance reports"),
        (name = "Settings", description = "Per-user preferences"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
