//! External (storage) representation of each table row. Columns are
//! snake_case; the conversions to and from the internal models are total and
//! carry every field across.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    AttendanceRecord, AttendanceStatus, Student, Subject, Theme, UserSettings, YearLevel,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub year: YearLevel,
    pub subjects: Vec<String>,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRow {
    pub id: String,
    pub name: String,
    pub code: String,
    pub year: YearLevel,
    pub description: String,
    pub academic_year: String,
    pub term: String,
    pub room_number: Option<String>,
    pub schedule_days: Vec<String>,
    pub schedule_time: Option<String>,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: u64,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub student_id: String,
    pub subject_id: String,
    pub user_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRow {
    pub user_id: u64,
    pub school_year: String,
    pub default_year_level: YearLevel,
    pub attendance_reminder_time: String,
    pub email_notifications: bool,
    pub theme: Theme,
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            name: row.name,
            year: row.year,
            subjects: row.subjects,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<Student> for StudentRow {
    fn from(s: Student) -> Self {
        StudentRow {
            id: s.id,
            name: s.name,
            year: s.year,
            subjects: s.subjects,
            user_id: s.user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            code: row.code,
            year: row.year,
            description: row.description,
            academic_year: row.academic_year,
            term: row.term,
            room_number: row.room_number,
            schedule_days: row.schedule_days,
            schedule_time: row.schedule_time,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<Subject> for SubjectRow {
    fn from(s: Subject) -> Self {
        SubjectRow {
            id: s.id,
            name: s.name,
            code: s.code,
            year: s.year,
            description: s.description,
            academic_year: s.academic_year,
            term: s.term,
            room_number: s.room_number,
            schedule_days: s.schedule_days,
            schedule_time: s.schedule_time,
            user_id: s.user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            id: row.id,
            student_id: row.student_id,
            subject_id: row.subject_id,
            date: row.date,
            status: row.status,
            marked_by: row.marked_by,
            marked_at: row.created_at,
            user_id: row.user_id,
        }
    }
}

impl From<AttendanceRecord> for AttendanceRow {
    fn from(r: AttendanceRecord) -> Self {
        AttendanceRow {
            id: r.id,
            student_id: r.student_id,
            subject_id: r.subject_id,
            date: r.date,
            status: r.status,
            marked_by: r.marked_by,
            user_id: r.user_id,
            created_at: r.marked_at,
        }
    }
}

impl From<SettingsRow> for UserSettings {
    fn from(row: SettingsRow) -> Self {
        UserSettings {
            user_id: row.user_id,
            school_year: row.school_year,
            default_year_level: row.default_year_level,
            attendance_reminder_time: row.attendance_reminder_time,
            email_notifications: row.email_notifications,
            theme: row.theme,
            timezone: row.timezone,
            updated_at: row.updated_at,
        }
    }
}

impl From<UserSettings> for SettingsRow {
    fn from(s: UserSettings) -> Self {
        SettingsRow {
            user_id: s.user_id,
            school_year: s.school_year,
            default_year_level: s.default_year_level,
            attendance_reminder_time: s.attendance_reminder_time,
            email_notifications: s.email_notifications,
            theme: s.theme,
            timezone: s.timezone,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, h, 0, 0).unwrap()
    }

    fn sample_subject() -> Subject {
        Subject {
            id: "sub-1".into(),
            name: "Mathematics".into(),
            code: "MATH9".into(),
            year: YearLevel::Year9,
            description: String::new(),
            academic_year: "2024-2025".into(),
            term: "1st Term".into(),
            room_number: None,
            schedule_days: vec!["Monday".into(), "Thursday".into()],
            schedule_time: Some("10:30".into()),
            user_id: 4,
            created_at: at(8),
            updated_at: at(9),
        }
    }

    #[test]
    fn subject_survives_translation_both_ways() {
        let subject = sample_subject();
        let back = Subject::from(SubjectRow::from(subject.clone()));
        assert_eq!(back, subject);
    }

    #[test]
    fn student_survives_translation_both_ways() {
        let student = Student {
            id: "s2".into(),
            name: "Mia".into(),
            year: YearLevel::Year8,
            subjects: vec!["sub-1".into(), "sub-2".into()],
            user_id: 4,
            created_at: at(8),
            updated_at: at(11),
        };
        let row = StudentRow::from(student.clone());
        assert_eq!(row.subjects, student.subjects);
        assert_eq!(row.updated_at, at(11));

        let wire = serde_json::to_value(&row).unwrap();
        assert_eq!(wire["year"], "Year 8");
        assert!(wire.get("user_id").is_some());

        assert_eq!(Student::from(row), student);
    }

    #[test]
    fn attendance_marked_at_maps_to_created_at_column() {
        let record = AttendanceRecord {
            id: "r1".into(),
            student_id: "s1".into(),
            subject_id: "sub-1".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: AttendanceStatus::Late,
            marked_by: 4,
            marked_at: at(10),
            user_id: 4,
        };
        let row = AttendanceRow::from(record.clone());
        assert_eq!(row.created_at, record.marked_at);

        let wire = serde_json::to_value(&row).unwrap();
        assert!(wire.get("student_id").is_some());
        assert!(wire.get("studentId").is_none());

        assert_eq!(AttendanceRecord::from(row), record);
    }

    #[test]
    fn internal_models_serialize_camel_case() {
        let student = Student {
            id: "s1".into(),
            name: "Noah".into(),
            year: YearLevel::Year12,
            subjects: vec!["sub-1".into()],
            user_id: 4,
            created_at: at(8),
            updated_at: at(8),
        };
        let wire = serde_json::to_value(&student).unwrap();
        assert!(wire.get("createdAt").is_some());
        assert_eq!(wire["year"], "Year 12");

        let row_wire = serde_json::to_value(StudentRow::from(student.clone())).unwrap();
        assert!(row_wire.get("created_at").is_some());
        assert_eq!(Student::from(StudentRow::from(student.clone())), student);
    }

    #[test]
    fn settings_survive_translation_both_ways() {
        let settings = UserSettings {
            theme: Theme::Dark,
            ..UserSettings::defaults(9)
        };
        assert_eq!(
            UserSettings::from(SettingsRow::from(settings.clone())),
            settings
        );
    }
}
