//! Data access layer. Every operation is scoped to the owning user id; rows of
//! other users are never visible.

pub mod memory;
pub mod mysql;
pub mod rows;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::{
    AttendanceDraft, AttendanceRecord, NewStudent, NewSubject, Student, StudentUpdate, Subject,
    SubjectUpdate, UserSettings,
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "unexpected value {:?} in column {}", value, column)]
    Decode { column: &'static str, value: String },

    #[display(fmt = "{}", _0)]
    Rejected(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Students ordered by name, each with its current enrollments.
    async fn list_students(&self, user_id: u64) -> Result<Vec<Student>, StoreError>;

    async fn insert_student(&self, user_id: u64, new: &NewStudent)
    -> Result<Student, StoreError>;

    /// `None` when the student does not exist for this user.
    async fn update_student(
        &self,
        user_id: u64,
        id: &str,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, StoreError>;

    /// Removes the student with its enrollments and attendance.
    async fn delete_student(&self, user_id: u64, id: &str) -> Result<bool, StoreError>;

    async fn list_subjects(&self, user_id: u64) -> Result<Vec<Subject>, StoreError>;

    async fn insert_subject(&self, user_id: u64, new: &NewSubject)
    -> Result<Subject, StoreError>;

    async fn update_subject(
        &self,
        user_id: u64,
        id: &str,
        update: &SubjectUpdate,
    ) -> Result<Option<Subject>, StoreError>;

    /// Removes the subject with its enrollments and attendance.
    async fn delete_subject(&self, user_id: u64, id: &str) -> Result<bool, StoreError>;

    /// Every record of the user, newest date first.
    async fn list_attendance(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Atomically replaces whatever record holds the draft's natural key with a
    /// fresh one. Nothing of the previous mark survives.
    async fn replace_attendance(
        &self,
        user_id: u64,
        marked_by: u64,
        draft: &AttendanceDraft,
    ) -> Result<AttendanceRecord, StoreError>;

    async fn list_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Overwrites the full membership of `subject_id` with `student_ids`.
    /// Callers pass distinct ids.
    async fn replace_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
        student_ids: &[String],
    ) -> Result<(), StoreError>;

    async fn get_settings(&self, user_id: u64) -> Result<Option<UserSettings>, StoreError>;

    async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings, StoreError>;
}
