use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::student::YearLevel;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "b1f0c2aa-0f7e-4d4e-8d8c-41b0a6d0e9c3",
    "name": "Mathematics",
    "code": "MATH9",
    "year": "Year 9",
    "description": "",
    "academicYear": "2024-2025",
    "term": "1st Term",
    "roomNumber": "B12",
    "scheduleDays": ["Monday", "Wednesday"],
    "scheduleTime": "09:00",
    "userId": 7,
    "createdAt": "2024-09-02T08:00:00Z",
    "updatedAt": "2024-09-02T08:00:00Z"
}))]
pub struct Subject {
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
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    #[schema(example = "Mathematics")]
    pub name: String,
    #[schema(example = "MATH9")]
    pub code: String,
    pub year: YearLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub academic_year: String,
    #[schema(example = "1st Term")]
    pub term: String,
    pub room_number: Option<String>,
    #[serde(default)]
    pub schedule_days: Vec<String>,
    pub schedule_time: Option<String>,
}

impl NewSubject {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.code.trim().is_empty() {
            return Err(AppError::Validation(
                "Subject name and code must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub year: Option<YearLevel>,
    pub description: Option<String>,
    pub academic_year: Option<String>,
    pub term: Option<String>,
    pub room_number: Option<String>,
    pub schedule_days: Option<Vec<String>>,
    pub schedule_time: Option<String>,
}

impl SubjectUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |v: &Option<String>| matches!(v, Some(s) if s.trim().is_empty());
        if blank(&self.name) || blank(&self.code) {
            return Err(AppError::Validation(
                "Subject name and code must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Applies the present fields onto `subject`, leaving the rest untouched.
    pub fn apply_to(&self, subject: &mut Subject) {
        if let Some(v) = &self.name {
            subject.name = v.clone();
        }
        if let Some(v) = &self.code {
            subject.code = v.clone();
        }
        if let Some(v) = self.year {
            subject.year = v;
        }
        if let Some(v) = &self.description {
            subject.description = v.clone();
        }
        if let Some(v) = &self.academic_year {
            subject.academic_year = v.clone();
        }
        if let Some(v) = &self.term {
            subject.term = v.clone();
        }
        if let Some(v) = &self.room_number {
            subject.room_number = Some(v.clone());
        }
        if let Some(v) = &self.schedule_days {
            subject.schedule_days = v.clone();
        }
        if let Some(v) = &self.schedule_time {
            subject.schedule_time = Some(v.clone());
        }
    }
}
