use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

use crate::auth::Session;
use crate::error::AppError;
use crate::model::{NewStudent, StudentUpdate};
use crate::store::Store;

/// List students
#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "Students ordered by name", body = [crate::model::Student]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_students(
    store: web::Data<dyn Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let students = store.list_students(user_id).await.map_err(|e| {
        error!(user_id, error = %e, "Failed to list students");
        AppError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(students))
}

/// Add a student
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = NewStudent,
    responses(
        (status = 201, description = "Student created", body = crate::model::Student),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn create_student(
    store: web::Data<dyn Store>,
    session: Session,
    payload: web::Json<NewStudent>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    payload.validate()?;

    let student = store
        .insert_student(user_id, &payload)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create student");
            AppError::from(e)
        })?;
    info!(student_id = %student.id, "Student created");
    Ok(HttpResponse::Created().json(student))
}

/// Update a student
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(
        ("id", Path, description = "Student id")
    ),
    request_body = StudentUpdate,
    responses(
        (status = 200, description = "Updated student", body = crate::model::Student),
        (status = 400, description = "Empty name"),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn update_student(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
    payload: web::Json<StudentUpdate>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    payload.validate()?;
    let id = path.into_inner();

    let updated = store
        .update_student(user_id, &id, &payload)
        .await
        .map_err(|e| {
            error!(student_id = %id, error = %e, "Failed to update student");
            AppError::from(e)
        })?;

    match updated {
        Some(student) => Ok(HttpResponse::Ok().json(student)),
        None => Err(AppError::NotFound(format!("Student {id} not found"))),
    }
}

/// Delete a student with its enrollments and attendance
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(
        ("id", Path, description = "Student id")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session), fields(user_id = ?session.user_id().ok()))]
pub async fn delete_student(
    store: web::Data<dyn Store>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let id = path.into_inner();

    let removed = store.delete_student(user_id, &id).await.map_err(|e| {
        error!(student_id = %id, error = %e, "Failed to delete student");
        AppError::from(e)
    })?;

    if !removed {
        return Err(AppError::NotFound(format!("Student {id} not found")));
    }
    info!(student_id = %id, "Student deleted");
    Ok(HttpResponse::NoContent().finish())
}
