use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::student::YearLevel;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Per-teacher preferences, one row per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: u64,
    #[schema(example = "2024-2025")]
    pub school_year: String,
    pub default_year_level: YearLevel,
    #[schema(example = "09:00")]
    pub attendance_reminder_time: String,
    pub email_notifications: bool,
    pub theme: Theme,
    #[schema(example = "UTC")]
    pub timezone: String,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn defaults(user_id: u64) -> Self {
        Self {
            user_id,
            school_year: "2024-2025".to_string(),
            default_year_level: YearLevel::Year7,
            attendance_reminder_time: "09:00".to_string(),
            email_notifications: true,
            theme: Theme::Light,
            timezone: "UTC".to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn apply(mut self, update: &SettingsUpdate) -> Self {
        if let Some(v) = &update.school_year {
            self.school_year = v.clone();
        }
        if let Some(v) = update.default_year_level {
            self.default_year_level = v;
        }
        if let Some(v) = &update.attendance_reminder_time {
            self.attendance_reminder_time = v.clone();
        }
        if let Some(v) = update.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = update.theme {
            self.theme = v;
        }
        if let Some(v) = &update.timezone {
            self.timezone = v.clone();
        }
        self.updated_at = Utc::now();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub school_year: Option<String>,
    pub default_year_level: Option<YearLevel>,
    pub attendance_reminder_time: Option<String>,
    pub email_notifications: Option<bool>,
    pub theme: Option<Theme>,
    pub timezone: Option<String>,
}
