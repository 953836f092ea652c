use crate::{
    api::{attendance, dashboard, report, settings, student, subject},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, middleware::from_fn, web};
use anyhow::Context;
use serde_json::json;

pub type Limiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Shared across workers; build it once.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limit configuration")
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({"status": "ok"}))
    ),
    tag = "Health"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &Limiter) {
    // Public
    cfg.service(
        web::resource(format!("{}/health", config.api_prefix)).route(web::get().to(health)),
    );

    // Session-scoped
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(limiter))
            .service(
                web::scope("/students")
                    .service(
                        web::resource("")
                            .route(web::get().to(student::list_students))
                            .route(web::post().to(student::create_student)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            )
            .service(
                web::scope("/subjects")
                    .service(
                        web::resource("")
                            .route(web::get().to(subject::list_subjects))
                            .route(web::post().to(subject::create_subject)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(subject::update_subject))
                            .route(web::delete().to(subject::delete_subject)),
                    )
                    .service(
                        web::resource("/{id}/students")
                            .route(web::get().to(subject::list_subject_students))
                            .route(web::put().to(subject::assign_subject_students)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::save_attendance)),
                    )
                    .service(web::resource("/roster").route(web::get().to(attendance::roster))),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(
                web::scope("/reports")
                    .service(web::resource("/overview").route(web::get().to(report::overview)))
                    .service(web::resource("/trend").route(web::get().to(report::trend)))
                    .service(web::resource("/rows").route(web::get().to(report::rows)))
                    .service(
                        web::resource("/students/{id}").route(web::get().to(report::student)),
                    ),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::put().to(settings::update_settings)),
            ),
    );
}
