pub mod attendance;
pub mod role;
pub mod settings;
pub mod stats;
pub mod student;
pub mod subject;

pub use attendance::{AttendanceDraft, AttendanceRecord, AttendanceStatus, NaturalKey};
pub use settings::{SettingsUpdate, Theme, UserSettings};
pub use stats::{
    AttendanceStats, ReportRow, ReportStats, Roster, RosterCounts, RosterEntry, StudentReport,
    StudentSummary, TrendPoint, YearSummary,
};
pub use student::{NewStudent, Student, StudentUpdate, YearLevel};
pub use subject::{NewSubject, Subject, SubjectUpdate};
