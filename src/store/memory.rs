//! In-process store keeping the same rows the database would, for development
//! runs without MySQL and for tests.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::rows::{AttendanceRow, MembershipRow, SettingsRow, StudentRow, SubjectRow};
use super::{Store, StoreError};
use crate::model::student::distinct_ids;
use crate::model::{
    AttendanceDraft, AttendanceRecord, NewStudent, NewSubject, Student, StudentUpdate, Subject,
    SubjectUpdate, UserSettings,
};

#[derive(Default)]
struct Tables {
    students: Vec<StudentRow>,
    subjects: Vec<SubjectRow>,
    attendance: Vec<AttendanceRow>,
    memberships: Vec<MembershipRow>,
    settings: Vec<SettingsRow>,
}

impl Tables {
    fn subjects_of(&self, user_id: u64, student_id: &str) -> Vec<String> {
        self.memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.student_id == student_id)
            .map(|m| m.subject_id.clone())
            .collect()
    }

    fn student(&self, user_id: u64, row: &StudentRow) -> Student {
        let mut row = row.clone();
        row.subjects = self.subjects_of(user_id, &row.id);
        Student::from(row)
    }

    fn set_student_subjects(&mut self, user_id: u64, student_id: &str, subjects: &[String]) {
        self.memberships
            .retain(|m| !(m.user_id == user_id && m.student_id == student_id));
        for subject_id in distinct_ids(subjects) {
            self.memberships.push(MembershipRow {
                student_id: student_id.to_string(),
                subject_id,
                user_id,
            });
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    rejected_students: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every attendance write for `student_id` fail, so callers can
    /// observe how a batch behaves when the store gives up half-way.
    pub fn reject_attendance_for(&self, student_id: &str) {
        if let Ok(mut rejected) = self.rejected_students.write() {
            rejected.insert(student_id.to_string());
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Rejected("memory store poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Rejected("memory store poisoned".into()))
    }

    fn is_rejected(&self, student_id: &str) -> bool {
        self.rejected_students
            .read()
            .map(|r| r.contains(student_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_students(&self, user_id: u64) -> Result<Vec<Student>, StoreError> {
        let tables = self.read()?;
        let mut students: Vec<Student> = tables
            .students
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| tables.student(user_id, s))
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn insert_student(
        &self,
        user_id: u64,
        new: &NewStudent,
    ) -> Result<Student, StoreError> {
        let now = Utc::now();
        let row = StudentRow {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            year: new.year,
            subjects: Vec::new(),
            user_id,
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.write()?;
        tables.set_student_subjects(user_id, &row.id, &new.subjects);
        let student = tables.student(user_id, &row);
        tables.students.push(row);
        Ok(student)
    }

    async fn update_student(
        &self,
        user_id: u64,
        id: &str,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, StoreError> {
        let mut tables = self.write()?;
        let Some(pos) = tables
            .students
            .iter()
            .position(|s| s.user_id == user_id && s.id == id)
        else {
            return Ok(None);
        };

        {
            let row = &mut tables.students[pos];
            if let Some(name) = &update.name {
                row.name = name.trim().to_string();
            }
            if let Some(year) = update.year {
                row.year = year;
            }
            row.updated_at = Utc::now();
        }
        if let Some(subjects) = &update.subjects {
            tables.set_student_subjects(user_id, id, subjects);
        }

        let row = tables.students[pos].clone();
        Ok(Some(tables.student(user_id, &row)))
    }

    async fn delete_student(&self, user_id: u64, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let before = tables.students.len();
        tables
            .students
            .retain(|s| !(s.user_id == user_id && s.id == id));
        if tables.students.len() == before {
            return Ok(false);
        }
        tables
            .memberships
            .retain(|m| !(m.user_id == user_id && m.student_id == id));
        tables
            .attendance
            .retain(|r| !(r.user_id == user_id && r.student_id == id));
        Ok(true)
    }

    async fn list_subjects(&self, user_id: u64) -> Result<Vec<Subject>, StoreError> {
        let tables = self.read()?;
        let mut subjects: Vec<Subject> = tables
            .subjects
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .map(Subject::from)
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn insert_subject(
        &self,
        user_id: u64,
        new: &NewSubject,
    ) -> Result<Subject, StoreError> {
        let now = Utc::now();
        let row = SubjectRow {
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
            created_at: now,
            updated_at: now,
        };
        self.write()?.subjects.push(row.clone());
        Ok(Subject::from(row))
    }

    async fn update_subject(
        &self,
        user_id: u64,
        id: &str,
        update: &SubjectUpdate,
    ) -> Result<Option<Subject>, StoreError> {
        let mut tables = self.write()?;
        let Some(row) = tables
            .subjects
            .iter_mut()
            .find(|s| s.user_id == user_id && s.id == id)
        else {
            return Ok(None);
        };

        let mut subject = Subject::from(row.clone());
        update.apply_to(&mut subject);
        subject.updated_at = Utc::now();
        *row = SubjectRow::from(subject.clone());
        Ok(Some(subject))
    }

    async fn delete_subject(&self, user_id: u64, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let before = tables.subjects.len();
        tables
            .subjects
            .retain(|s| !(s.user_id == user_id && s.id == id));
        if tables.subjects.len() == before {
            return Ok(false);
        }
        tables
            .memberships
            .retain(|m| !(m.user_id == user_id && m.subject_id == id));
        tables
            .attendance
            .retain(|r| !(r.user_id == user_id && r.subject_id == id));
        Ok(true)
    }

    async fn list_attendance(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.read()?;
        let mut records: Vec<AttendanceRecord> = tables
            .attendance
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .map(AttendanceRecord::from)
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn replace_attendance(
        &self,
        user_id: u64,
        marked_by: u64,
        draft: &AttendanceDraft,
    ) -> Result<AttendanceRecord, StoreError> {
        if self.is_rejected(&draft.student_id) {
            return Err(StoreError::Rejected(format!(
                "attendance write refused for {}",
                draft.key()
            )));
        }

        let row = AttendanceRow {
            id: Uuid::new_v4().to_string(),
            student_id: draft.student_id.clone(),
            subject_id: draft.subject_id.clone(),
            date: draft.date,
            status: draft.status,
            marked_by,
            user_id,
            created_at: Utc::now(),
        };

        let mut tables = self.write()?;
        tables.attendance.retain(|r| {
            !(r.user_id == user_id
                && r.student_id == draft.student_id
                && r.subject_id == draft.subject_id
                && r.date == draft.date)
        });
        tables.attendance.push(row.clone());
        Ok(AttendanceRecord::from(row))
    }

    async fn list_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.subject_id == subject_id)
            .map(|m| m.student_id.clone())
            .collect())
    }

    async fn replace_subject_members(
        &self,
        user_id: u64,
        subject_id: &str,
        student_ids: &[String],
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables
            .memberships
            .retain(|m| !(m.user_id == user_id && m.subject_id == subject_id));
        for student_id in student_ids {
            tables.memberships.push(MembershipRow {
                student_id: student_id.clone(),
                subject_id: subject_id.to_string(),
                user_id,
            });
        }
        Ok(())
    }

    async fn get_settings(&self, user_id: u64) -> Result<Option<UserSettings>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .settings
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
            .map(UserSettings::from))
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings, StoreError> {
        let row = SettingsRow::from(settings.clone());
        let mut tables = self.write()?;
        match tables.settings.iter_mut().find(|s| s.user_id == row.user_id) {
            Some(existing) => *existing = row,
            None => tables.settings.push(row),
        }
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceStatus, YearLevel};
    use chrono::NaiveDate;

    fn new_student(name: &str, subjects: &[&str]) -> NewStudent {
        NewStudent {
            name: name.into(),
            year: YearLevel::Year8,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[actix_web::test]
    async fn rows_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        store.insert_student(1, &new_student("Ava", &[])).await.unwrap();
        store.insert_student(2, &new_student("Ben", &[])).await.unwrap();

        let mine = store.list_students(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Ava");

        let id = mine[0].id.clone();
        assert!(!store.delete_student(2, &id).await.unwrap());
        assert_eq!(store.list_students(1).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn student_subjects_come_from_memberships() {
        let store = MemoryStore::new();
        let ava = store
            .insert_student(1, &new_student("Ava", &["MATH", "ICT", "MATH"]))
            .await
            .unwrap();
        assert_eq!(ava.subjects, vec!["MATH".to_string(), "ICT".to_string()]);

        store.replace_subject_members(1, "MATH", &[]).await.unwrap();
        let ava = store.list_students(1).await.unwrap().remove(0);
        assert_eq!(ava.subjects, vec!["ICT".to_string()]);
    }

    #[actix_web::test]
    async fn replace_attendance_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let draft = AttendanceDraft {
            student_id: "s1".into(),
            subject_id: "MATH".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: AttendanceStatus::Late,
        };
        let first = store.replace_attendance(1, 1, &draft).await.unwrap();
        let second = store
            .replace_attendance(
                1,
                1,
                &AttendanceDraft {
                    status: AttendanceStatus::Absent,
                    ..draft.clone()
                },
            )
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        let all = store.list_attendance(1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, AttendanceStatus::Absent);
    }
}
