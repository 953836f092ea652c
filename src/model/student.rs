use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

/// School grade used to group students and scope subject cohorts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
pub enum YearLevel {
    #[serde(rename = "Year 7")]
    #[strum(serialize = "Year 7")]
    Year7,
    #[serde(rename = "Year 8")]
    #[strum(serialize = "Year 8")]
    Year8,
    #[serde(rename = "Year 9")]
    #[strum(serialize = "Year 9")]
    Year9,
    #[serde(rename = "Year 10")]
    #[strum(serialize = "Year 10")]
    Year10,
    #[serde(rename = "Year 11")]
    #[strum(serialize = "Year 11")]
    Year11,
    #[serde(rename = "Year 12")]
    #[strum(serialize = "Year 12")]
    Year12,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "5b0c6f1e-8a57-4c39-9a51-5c1f6a0d2f11",
    "name": "Ava Thompson",
    "year": "Year 9",
    "subjects": ["b1f0c2aa-0f7e-4d4e-8d8c-41b0a6d0e9c3"],
    "userId": 7,
    "createdAt": "2024-09-02T08:00:00Z",
    "updatedAt": "2024-09-02T08:00:00Z"
}))]
pub struct Student {
    pub id: String,
    pub name: String,
    pub year: YearLevel,
    /// Ids of the subjects this student is enrolled in.
    pub subjects: Vec<String>,
    pub user_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[schema(example = "Ava Thompson")]
    pub name: String,
    #[schema(example = "Year 9")]
    pub year: YearLevel,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Student name must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub year: Option<YearLevel>,
    pub subjects: Option<Vec<String>>,
}

impl StudentUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::Validation("Student name must not be empty".into()));
        }
        Ok(())
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}
