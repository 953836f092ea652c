//! A request-scoped view of one user's data. Handlers load it, answer from it
//! and reconcile writes into it; nothing outlives the request.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::aggregate::{compute_daily_stats, index_students};
use crate::auth::Session;
use crate::error::AppError;
use crate::model::{AttendanceRecord, AttendanceStats, NaturalKey, Student, Subject};
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub records: Vec<AttendanceRecord>,
}

impl Snapshot {
    /// Fetches students, subjects and attendance of the session user
    /// concurrently.
    pub async fn load(store: &dyn Store, session: &Session) -> Result<Self, AppError> {
        let user_id = session.user_id()?;
        let (students, subjects, records) = futures::try_join!(
            store.list_students(user_id),
            store.list_subjects(user_id),
            store.list_attendance(user_id),
        )
        .map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to load data");
            AppError::from(e)
        })?;

        Ok(Self {
            students,
            subjects,
            records,
        })
    }

    /// Drops every record holding one of `keys` and appends `marked`.
    pub fn with_marked(mut self, keys: &[NaturalKey], marked: Vec<AttendanceRecord>) -> Self {
        let keys: HashSet<&NaturalKey> = keys.iter().collect();
        self.records.retain(|r| !keys.contains(&r.key()));
        self.records.extend(marked);
        self
    }

    /// Makes `student_ids` the exact membership of `subject_id`.
    pub fn with_subject_members(mut self, subject_id: &str, student_ids: &[String]) -> Self {
        let members: HashSet<&str> = student_ids.iter().map(String::as_str).collect();
        for student in &mut self.students {
            let enrolled = members.contains(student.id.as_str());
            let listed = student.subjects.iter().any(|s| s == subject_id);
            if enrolled && !listed {
                student.subjects.push(subject_id.to_string());
            } else if !enrolled && listed {
                student.subjects.retain(|s| s != subject_id);
            }
        }
        self
    }

    /// Students enrolled in `subject_id`.
    pub fn student_count(&self, subject_id: &str) -> usize {
        self.students
            .iter()
            .filter(|s| s.subjects.iter().any(|id| id == subject_id))
            .count()
    }

    pub fn students_by_id(&self) -> HashMap<&str, &Student> {
        index_students(&self.students)
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn daily_stats(&self, as_of: NaiveDate) -> AttendanceStats {
        compute_daily_stats(self.students.len(), &self.records, as_of)
    }
}
