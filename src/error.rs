use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::store::StoreError;
use crate::write_path::WriteJournal;

/// Errors surfaced to API callers. Messages are shown to the user verbatim.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Not authenticated")]
    NotAuthenticated,

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Store(StoreError),

    /// A batch stopped part-way; keys already applied stay applied.
    #[display(fmt = "{}", message)]
    PartialWrite {
        message: String,
        journal: WriteJournal,
    },
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::PartialWrite { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::PartialWrite { message, journal } => json!({
                "error": message,
                "journal": journal,
            }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
