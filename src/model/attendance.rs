use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

/// The (student, subject, date) triple identifying one attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NaturalKey {
    pub student_id: String,
    pub subject_id: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
}

impl NaturalKey {
    /// Deterministic identity for a mark that has not been stored yet.
    pub fn record_id(&self) -> String {
        format!("{}_{}_{}", self.student_id, self.date, self.subject_id)
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "student {} / subject {} / {}",
            self.student_id, self.subject_id, self.date
        )
    }
}

/// A mark as submitted by a teacher, before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "studentId": "5b0c6f1e-8a57-4c39-9a51-5c1f6a0d2f11",
    "subjectId": "b1f0c2aa-0f7e-4d4e-8d8c-41b0a6d0e9c3",
    "date": "2024-09-02",
    "status": "present"
}))]
pub struct AttendanceDraft {
    pub student_id: String,
    pub subject_id: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl AttendanceDraft {
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            student_id: self.student_id.clone(),
            subject_id: self.subject_id.clone(),
            date: self.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// User who recorded the mark.
    pub marked_by: u64,
    #[schema(value_type = String, format = "date-time")]
    pub marked_at: DateTime<Utc>,
    pub user_id: u64,
}

impl AttendanceRecord {
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            student_id: self.student_id.clone(),
            subject_id: self.subject_id.clone(),
            date: self.date,
        }
    }

    pub fn has_key(&self, key: &NaturalKey) -> bool {
        self.date == key.date && self.student_id == key.student_id && self.subject_id == key.subject_id
    }
}
