use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::auth::Session;
use crate::error::AppError;
use crate::model::{NewSubject, SubjectUpdate};
use crate::snapshot::Snapshot;
use crate::store::Store;
use crate::write_path::assign_students_to_subject;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignStudents {
    #[schema(example = json!(["5b0c6f1e-8a57-4c39-9a51-5c1f6a0d2f11"]))]
    pub student_ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMembers {
    pub subject_id: String,
    pub student_ids: Vec<String>,
    pub student_count: usize,
}

/// List subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses(
        (status = 200, description = "Subjects ordered by name", body = [crate::model::Subject]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subjects(
    store: web::Data<dyn Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let subjects = store.list_subjects(user_id).await.map_err(|e| {
        error!(user_id, error = %e, "Failed to list subjects");
        AppError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(subjects))
}

/// Add a subject
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = NewSubject,
    responses(
        (status = 201, description = "Subject created", body = crate::model::Subject),
        (status = 400, description = "Empty name or code")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn create_subject(
    store: web::Data<dyn Store>,
    session: Session,
    payload: web::Json<NewSubject>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    payload.validate()?;

    let subject = store
        .insert_subject(user_id, &payload)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create subject");
            AppError::from(e)
        })?;
    info!(subject_id = %subject.id, code = %subject.code, "Subject created");
    Ok(HttpResponse::Created().json(subject))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(
        ("id", Path, description = "Subject id")
    ),
    request_body = SubjectUpdate,
    responses(
        (status = 200, description = "Updated subject", body = crate::model::Subject),
        (status = 404, description = "Subject not found")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn update_subject(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
    payload: web::Json<SubjectUpdate>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    payload.validate()?;
    let id = path.into_inner();

    match store
        .update_subject(user_id, &id, &payload)
        .await
        .map_err(|e| {
            error!(subject_id = %id, error = %e, "Failed to update subject");
            AppError::from(e)
        })? {
        Some(subject) => Ok(HttpResponse::Ok().json(subject)),
        None => Err(AppError::NotFound(format!("Subject {id} not found"))),
    }
}

/// Delete a subject with its enrollments and attendance
#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(
        ("id", Path, description = "Subject id")
    ),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 404, description = "Subject not found")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session), fields(user_id = ?session.user_id().ok()))]
pub async fn delete_subject(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let id = path.into_inner();

    let removed = store.delete_subject(user_id, &id).await.map_err(|e| {
        error!(subject_id = %id, error = %e, "Failed to delete subject");
        AppError::from(e)
    })?;
    if !removed {
        return Err(AppError::NotFound(format!("Subject {id} not found")));
    }
    info!(subject_id = %id, "Subject deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Students enrolled in a subject
#[utoipa::path(
    get,
    path = "/api/subjects/{id}/students",
    params(
        ("id", Path, description = "Subject id")
    ),
    responses(
        (status = 200, description = "Current class list", body = SubjectMembers),
        (status = 404, description = "Subject not found")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subject_students(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let subject_id = path.into_inner();
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    require_subject(&snapshot, &subject_id)?;

    let student_ids: Vec<String> = snapshot
        .students
        .iter()
        .filter(|s| s.subjects.contains(&subject_id))
        .map(|s| s.id.clone())
        .collect();
    Ok(HttpResponse::Ok().json(SubjectMembers {
        student_count: student_ids.len(),
        subject_id,
        student_ids,
    }))
}

/// Replace the class list of a subject
///
/// Every current enrollment of the subject is dropped and one is created per
/// distinct id in the body. An empty list empties the class.
#[utoipa::path(
    put,
    path = "/api/subjects/{id}/students",
    params(
        ("id", Path, description = "Subject id")
    ),
    request_body = AssignStudents,
    responses(
        (status = 200, description = "Class list replaced", body = SubjectMembers),
        (status = 404, description = "Subject not found")
    ),
    tag = "Subject",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn assign_subject_students(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
    payload: web::Json<AssignStudents>,
) -> Result<HttpResponse, AppError> {
    let subject_id = path.into_inner();
    let snapshot = Snapshot::load(store.get_ref(), &session).await?;
    require_subject(&snapshot, &subject_id)?;

    let student_ids =
        assign_students_to_subject(store.get_ref(), &session, &subject_id, &payload.student_ids)
            .await?;
    let snapshot = snapshot.with_subject_members(&subject_id, &student_ids);

    Ok(HttpResponse::Ok().json(SubjectMembers {
        student_count: snapshot.student_count(&subject_id),
        subject_id,
        student_ids,
    }))
}

fn require_subject(snapshot: &Snapshot, subject_id: &str) -> Result<(), AppError> {
    if snapshot.subjects.iter().any(|s| s.id == subject_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Subject {subject_id} not found")))
    }
}
