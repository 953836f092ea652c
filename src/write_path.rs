//! Attendance marking and class enrollment writes.

use serde::Serialize;
use tracing::{error, info};

use crate::auth::Session;
use crate::error::AppError;
use crate::model::student::distinct_ids;
use crate::model::{AttendanceDraft, AttendanceRecord, NaturalKey};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum KeyOutcome {
    Applied {
        #[serde(rename = "recordId")]
        record_id: String,
    },
    Failed { message: String },
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub key: NaturalKey,
    #[serde(flatten)]
    pub outcome: KeyOutcome,
}

/// What happened to each key of a batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteJournal {
    pub entries: Vec<JournalEntry>,
}

impl WriteJournal {
    fn push(&mut self, key: NaturalKey, outcome: KeyOutcome) {
        self.entries.push(JournalEntry { key, outcome });
    }

    fn keys_where(&self, pred: impl Fn(&KeyOutcome) -> bool) -> Vec<&NaturalKey> {
        self.entries
            .iter()
            .filter(|e| pred(&e.outcome))
            .map(|e| &e.key)
            .collect()
    }

    pub fn applied(&self) -> Vec<&NaturalKey> {
        self.keys_where(|o| matches!(o, KeyOutcome::Applied { .. }))
    }

    pub fn failed(&self) -> Vec<&NaturalKey> {
        self.keys_where(|o| matches!(o, KeyOutcome::Failed { .. }))
    }

    pub fn pending(&self) -> Vec<&NaturalKey> {
        self.keys_where(|o| matches!(o, KeyOutcome::Pending))
    }

    pub fn is_complete(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.outcome, KeyOutcome::Applied { .. }))
    }
}

#[derive(Debug, Clone)]
pub struct MarkOutcome {
    /// Canonical records, one per distinct key, in submission order of each
    /// key's last occurrence.
    pub records: Vec<AttendanceRecord>,
    pub journal: WriteJournal,
}

impl MarkOutcome {
    pub fn keys(&self) -> Vec<NaturalKey> {
        self.records.iter().map(AttendanceRecord::key).collect()
    }
}

/// Stores a batch of marks, one natural-key replace per draft.
///
/// The batch is not a transaction: when the store rejects a draft the keys
/// before it stay written, and the returned [`AppError::PartialWrite`] lists
/// which keys were applied, which one failed and which were never tried.
pub async fn mark_attendance(
    store: &dyn Store,
    session: &Session,
    drafts: &[AttendanceDraft],
) -> Result<MarkOutcome, AppError> {
    let user = session.require()?;
    if drafts.is_empty() {
        return Err(AppError::Validation("No attendance to save".into()));
    }

    let mut journal = WriteJournal::default();
    let mut records: Vec<AttendanceRecord> = Vec::with_capacity(drafts.len());

    for (i, draft) in drafts.iter().enumerate() {
        match store
            .replace_attendance(user.user_id, user.user_id, draft)
            .await
        {
            Ok(record) => {
                journal.push(
                    draft.key(),
                    KeyOutcome::Applied {
                        record_id: record.id.clone(),
                    },
                );
                // a key repeated within the batch: the later mark wins
                records.retain(|r| !r.has_key(&record.key()));
                records.push(record);
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    user_id = user.user_id,
                    key = %draft.key(),
                    applied = i,
                    error = %message,
                    "Attendance batch stopped"
                );
                journal.push(draft.key(), KeyOutcome::Failed { message });
                for rest in &drafts[i + 1..] {
                    journal.push(rest.key(), KeyOutcome::Pending);
                }
                return Err(AppError::PartialWrite {
                    message: format!(
                        "Saved {} of {} attendance marks: {}",
                        i,
                        drafts.len(),
                        e
                    ),
                    journal,
                });
            }
        }
    }

    info!(
        user_id = user.user_id,
        count = drafts.len(),
        complete = journal.is_complete(),
        "Attendance saved"
    );
    Ok(MarkOutcome { records, journal })
}

/// Overwrites the enrollment of `subject_id` with `student_ids`. Duplicates
/// collapse to their first occurrence; an empty list leaves the class empty.
/// Returns the ids that were stored.
pub async fn assign_students_to_subject(
    store: &dyn Store,
    session: &Session,
    subject_id: &str,
    student_ids: &[String],
) -> Result<Vec<String>, AppError> {
    let user_id = session.user_id()?;
    let members = distinct_ids(student_ids);

    store
        .replace_subject_members(user_id, subject_id, &members)
        .await
        .map_err(|e| {
            error!(user_id, subject_id, error = %e, "Failed to assign students");
            AppError::from(e)
        })?;

    info!(user_id, subject_id, count = members.len(), "Class enrollment replaced");
    Ok(members)
}
