#![allow(dead_code)]

use actix_web::http::{Method, StatusCode};
use actix_web::test;
use actix_web::test::TestRequest;
use rollcall::auth::jwt::generate_access_token;
use rollcall::config::Config;
use serde_json::{Value, json};

pub const SECRET: &str = "integration-secret";

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        "DATA_STORE" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn token(user_id: u64) -> String {
    generate_access_token(user_id, format!("teacher{user_id}"), 2, SECRET, 3600).unwrap()
}

/// A request from a fixed peer, signed in as `user_id` when given.
pub fn request(method: Method, uri: &str, user_id: Option<u64>) -> TestRequest {
    let req = TestRequest::default()
        .method(method)
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap());
    match user_id {
        Some(id) => req.insert_header(("Authorization", format!("Bearer {}", token(id)))),
        None => req,
    }
}

pub fn new_student(name: &str, year: &str) -> Value {
    json!({ "name": name, "year": year, "subjects": [] })
}

pub fn new_subject(name: &str, code: &str, year: &str) -> Value {
    json!({
        "name": name,
        "code": code,
        "year": year,
        "term": "1st Term",
        "academicYear": "2024-2025",
        "scheduleDays": ["Monday", "Wednesday"]
    })
}

/// One Year 7 subject with Ava, Ben and Cai enrolled.
pub async fn seed_class<S, B>(app: &S, user: u64) -> (String, Vec<String>)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let subject: Value = test::call_and_read_body_json(
        app,
        request(Method::POST, "/api/subjects", Some(user))
            .set_json(new_subject("Mathematics", "MATH7", "Year 7"))
            .to_request(),
    )
    .await;
    let subject_id = subject["id"].as_str().unwrap().to_string();

    let mut ids = Vec::new();
    for name in ["Ava", "Ben", "Cai"] {
        let student: Value = test::call_and_read_body_json(
            app,
            request(Method::POST, "/api/students", Some(user))
                .set_json(new_student(name, "Year 7"))
                .to_request(),
        )
        .await;
        ids.push(student["id"].as_str().unwrap().to_string());
    }

    let resp = test::call_service(
        app,
        request(Method::PUT, &format!("/api/subjects/{subject_id}/students"), Some(user))
            .set_json(json!({ "studentIds": ids }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    (subject_id, ids)
}

pub fn marks(subject_id: &str, date: &str, statuses: &[(&str, &str)]) -> Value {
    let records: Vec<Value> = statuses
        .iter()
        .map(|(student, status)| {
            json!({
                "studentId": student,
                "subjectId": subject_id,
                "date": date,
                "status": status
            })
        })
        .collect();
    json!({ "records": records })
}

/// Builds the service over the given store with the routes and middleware
/// the binary uses.
macro_rules! app {
    ($store:expr) => {{
        let store: std::sync::Arc<dyn rollcall::store::Store> = $store;
        let config = common::config();
        let limiter = rollcall::routes::build_limiter(config.rate_protected_per_min).unwrap();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| rollcall::routes::configure(cfg, &config, &limiter)),
        )
        .await
    }};
}
