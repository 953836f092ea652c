use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::rows::{AttendanceRow, SettingsRow, StudentRow, SubjectRow};
use super::{Store, StoreError};
use crate::model::student::distinct_ids;
use crate::model::{
    AttendanceDraft, AttendanceRecord, NewStudent, NewSubject, Student, StudentUpdate, Subject,
    SubjectUpdate, UserSettings,
};

const STUDENT_COLUMNS: &str = "id, name, year, user_id, created_at, updated_at";
const SUBJECT_COLUMNS: &str = "id, name, code, year, description, academic_year, term, \
     room_number, schedule_days, schedule_time, user_id, created_at, updated_at";
const ATTENDANCE_COLUMNS: &str =
    "id, student_id, subject_id, date, status, marked_by, user_id, created_at";
const SETTINGS_COLUMNS: &str = "user_id, school_year, default_year_level, \
     attendance_reminder_time, email_notifications, theme, timezone, updated_at";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// MySQL keeps whole seconds; trimming up front makes returned values match
/// what a later read sees.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn parse_column<T: FromStr>(row: &MySqlRow, column: &'static str) -> Result<T, StoreError> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| StoreError::Decode { column, value: raw })
}

fn student_row(row: &MySqlRow, subjects: Vec<String>) -> Result<StudentRow, StoreError> {
    Ok(StudentRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        year: parse_column(row, "year")?,
        subjects,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn subject_row(row: &MySqlRow) -> Result<SubjectRow, StoreError> {
    let days: Json<Vec<String>> = row.try_get("schedule_days")?;
    Ok(SubjectRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        year: parse_column(row, "year")?,
        description: row.try_get("description")?,
        academic_year: row.try_get("academic_year")?,
        term: row.try_get("term")?,
        room_number: row.try_get("room_number")?,
        schedule_days: days.0,
        schedule_time: row.try_get("schedule_time")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn attendance_row(row: &MySqlRow) -> Result<AttendanceRow, StoreError> {
    Ok(AttendanceRow {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        subject_id: row.try_get("subject_id")?,
        date: row.try_get("date")?,
        status: parse_column(row, "status")?,
        marked_by: row.try_get("marked_by")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn settings_row(row: &MySqlRow) -> Result<SettingsRow, StoreError> {
    Ok(SettingsRow {
        user_id: row.try_get("user_id")?,
        school_year: row.try_get("school_year")?,
        default_year_level: parse_column(row, "default_year_level")?,
        attendance_reminder_time: row.try_get("attendance_reminder_time")?,
        email_notifications: row.try_get("email_notifications")?,
        theme: parse_column(row, "theme")?,
        timezone: row.try_get("timezone")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn student_subjects(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    student_id: &str,
) -> Result<Vec<String>, StoreError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT subject_id FROM student_subjects WHERE user_id = ? AND student_id = ? ORDER BY id",
    )
    .bind(user_id)
    .bind(student_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(ids)
}

async fn set_student_subjects(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    student_id: &str,
    subjects: &[String],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM student_subjects WHERE user_id = ? AND student_id = ?")
        .bind(user_id)
        .bind(student_id)
        .execute(&mut **tx)
        .await?;

    for subject_id in distinct_ids(subjects) {
        sqlx::query(
            "INSERT INTO student_subjects (user_id, student_id, subject_id) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(student_id)
        .bind(subject_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl Store for MySqlStore {
    async fn list_students(&self, user_id: u64) -> Result<Vec<Student>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = ? ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let links = sqlx::query_as::<_, (String, String)>(
            "SELECT student_id, subject_id FROM student_subjects WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_student: HashMap<String, Vec<String>> = HashMap::new();
        for (student_id, subject_id) in links {
            by_student.entry(student_id).or_default().push(subject_id);
        }

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let subjects = by_student.remove(&id).unwrap_or_default();
                student_row(row, subjects).map(Student::from)
            })
            .collect()
    }

    async fn insert_student(
        &self,
        user_id: u64,
        new: &NewStudent,
    ) -> Result<Student, StoreError> {
        let created = now();
        let id = Uuid::new_v4().to_string();
        let name = new.name.trim().to_string();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO students (id, name, year, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(new.year.as_ref())
        .bind(user_id)
        .bind(created)
        .bind(created)
        .execute(&mut *tx)
        .await?;
        set_student_subjects(&mut tx, user_id, &id, &new.subjects).await?;
        tx.commit().await?;

        debug!(user_id, student_id = %id, "Student inserted");
        Ok(Student {
            id,
            name,
            year: new.year,
            subjects: distinct_ids(&new.subjects),
            user_id,
            created_at: created,
            updated_at: created,
        })
    }

    async fn update_student(
        &self,
        user_id: u64,
        id: &str,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = ? AND user_id = ? FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut student = Student::from(student_row(&existing, Vec::new())?);
        if let Some(name) = &update.name {
            student.name = name.trim().to_string();
        }
        if let Some(year) = update.year {
            student.year = year;
        }
        student.updated_at = now();

        sqlx::query("UPDATE students SET name = ?, year = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(&student.name)
            .bind(student.year.as_ref())
            .bind(student.updated_at)
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if let Some(subjects) = &update.subjects {
            set_student_subjects(&mut tx, user_id, id, subjects).await?;
        }
        student.subjects = student_subjects(&mut tx, user_id, id).await?;
        tx.commit().await?;
        Ok(Some(student))
    }

    async fn delete_student(&self, user_id: u64, id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM attendance_records WHERE user_id = ? AND student_id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM student_subjects WHERE user_id = ? AND student_id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM students WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_subjects(&self, user_id: u64) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE user_id = ? ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| subject_row(row).map(Subject::from))
            .collect()
    }

    async fn insert_subject(
        &self,
        user_id: u64,
        new: &NewSubject,
    ) -> Result<Subject, StoreError> {
        let created = now();
        let subject = Subject {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            code: new.code.trim().to_string(),
            year: new.year,
            description: new.description.clone(),
            academic_year: new.academic_year.clone(),
            term: new.term.clone(),
            room_number: new.room_number.clone(),
            schedule_days: new.schedule_days.clone(),
            schedule_time: new.schedule_time.clone(),
            user_id,
            created_at: created,
            updated_at: created,
        };
        let row = SubjectRow::from(subject.clone());

        sqlx::query(&format!(
            "INSERT INTO subjects ({SUBJECT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.code)
        .bind(row.year.as_ref())
        .bind(&row.description)
        .bind(&row.academic_year)
        .bind(&row.term)
        .bind(&row.room_number)
        .bind(Json(&row.schedule_days))
        .bind(&row.schedule_time)
        .bind(row.user_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id, subject_id = %subject.id, "Subject inserted");
        Ok(subject)
    }

    async fn update_subject(
        &self,
        user_id: u64,
        id: &str,
        update: &SubjectUpdate,
    ) -> Result<Option<Subject>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ? AND user_id = ? FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut subject = Subject::from(subject_row(&existing)?);
        update.apply_to(&mut subject);
        subject.updated_at = now();
        let row = SubjectRow::from(subject.clone());

        sqlx::query(
            "UPDATE subjects SET name = ?, code = ?, year = ?, description = ?, \
             academic_year = ?, term = ?, room_number = ?, schedule_days = ?, \
             schedule_time = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&row.name)
        .bind(&row.code)
        .bind(row.year.as_ref())
        .bind(&row.description)
        .bind(&row.academic_year)
        .bind(&row.term)
        .bind(&row.room_number)
        .bind(Json(&row.schedule_days))
        .bind(&row.schedule_time)
        .bind(row.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(subject))
    }

    async fn delete_subject(&self, user_id: u64, id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM attendance_records WHERE user_id = ? AND subject_id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM student_subjects WHERE user_id = ? AND subject_id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM subjects WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_attendance(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE user_id = ? ORDER BY date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| attendance_row(row).map(AttendanceRecord::from))
            .collect()
    }

    async fn replace_attendance(
        &self,
        user_id: u64,
        marked_by: u64,
        draft: &AttendanceDraft,
    ) -> Result<AttendanceRecord, StoreError> {
        let row = AttendanceRow {
            id: Uuid::new_v4().to_string(),
            student_id: draft.student_id.clone(),
            subject_id: draft.subject_id.clone(),
            date: draft.date,
            status: draft.status,
            marked_by,
            user_id,
            created_at: now(),
        };

        // REPLACE deletes the row holding the same unique natural key, then inserts.
        sqlx::query(&format!(
            "REPLACE INTO attendance_records ({ATTENDANCE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.student_id)
        .bind(&row.subject_id)
        .bind(row.date)
        .bind(row.status.as_ref())
        .bind(row.marked_by)
        .bind(row.user_id)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(AttendanceRecord::from(row))
    }

    async fn list_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT student_id FROM student_subjects WHERE user_id = ? AND subject_id = ? ORDER BY id",
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn replace_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
        student_ids: &[String],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM student_subjects WHERE user_id = ? AND subject_id = ?")
            .bind(user_id)
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;

        for student_id in student_ids {
            sqlx::query(
                "INSERT INTO student_subjects (user_id, student_id, subject_id) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(student_id)
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_settings(&self, user_id: u64) -> Result<Option<UserSettings>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(|r| settings_row(r).map(UserSettings::from))
            .transpose()
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings, StoreError> {
        let mut saved = settings.clone();
        saved.updated_at = saved.updated_at.trunc_subsecs(0);
        let row = SettingsRow::from(saved.clone());

        sqlx::query(&format!(
            "INSERT INTO user_settings ({SETTINGS_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE \
             school_year = VALUES(school_year), \
             default_year_level = VALUES(default_year_level), \
             attendance_reminder_time = VALUES(attendance_reminder_time), \
             email_notifications = VALUES(email_notifications), \
             theme = VALUES(theme), \
             timezone = VALUES(timezone), \
             updated_at = VALUES(updated_at)"
        ))
        .bind(row.user_id)
        .bind(&row.school_year)
        .bind(row.default_year_level.as_ref())
        .bind(&row.attendance_reminder_time)
        .bind(row.email_notifications)
        .bind(row.theme.as_ref())
        .bind(&row.timezone)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(saved)
    }
}
