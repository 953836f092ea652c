use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

use crate::auth::Session;
use crate::error::AppError;
use crate::model::{SettingsUpdate, UserSettings};
use crate::store::Store;

async fn current(store: &dyn Store, user_id: u64) -> Result<UserSettings, AppError> {
    let stored = store.get_settings(user_id).await.map_err(|e| {
        error!(user_id, error = %e, "Failed to load settings");
        AppError::from(e)
    })?;
    Ok(stored.unwrap_or_else(|| UserSettings::defaults(user_id)))
}

/// Settings of the signed-in user, defaults when none were saved
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "User settings", body = UserSettings),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Settings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_settings(
    store: web::Data<dyn Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    Ok(HttpResponse::Ok().json(current(store.get_ref(), user_id).await?))
}

/// Change settings
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Saved settings", body = UserSettings),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Settings",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(skip(store, session, payload), fields(user_id = ?session.user_id().ok()))]
pub async fn update_settings(
    store: web::Data<dyn Store>,
    session: Session,
    payload: web::Json<SettingsUpdate>,
) -> Result<HttpResponse, AppError> {
    let user_id = session.user_id()?;
    let next = current(store.get_ref(), user_id).await?.apply(&payload);

    let saved = store.save_settings(&next).await.map_err(|e| {
        error!(error = %e, "Failed to save settings");
        AppError::from(e)
    })?;
    info!("Settings saved");
    Ok(HttpResponse::Ok().json(saved))
}
