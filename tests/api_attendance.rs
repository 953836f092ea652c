#[macro_use]
mod common;

use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::test;
use chrono::Utc;
use common::{marks, request, seed_class};
use rollcall::store::MemoryStore;
use serde_json::{Value, json};

const USER: u64 = 1;

#[actix_web::test]
async fn requests_without_a_token_are_not_authenticated() {
    let app = app!(Arc::new(MemoryStore::new()));

    let resp = test::call_service(&app, request(Method::GET, "/api/students", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authenticated");

    let resp = test::call_service(
        &app,
        request(Method::POST, "/api/attendance", None)
            .set_json(json!({ "records": [] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn bad_tokens_are_rejected_by_middleware() {
    let app = app!(Arc::new(MemoryStore::new()));

    let req = request(Method::GET, "/api/students", None)
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = request(Method::GET, "/api/students", None)
        .insert_header(("Authorization", "Token abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_is_public() {
    let app = app!(Arc::new(MemoryStore::new()));
    let body: Value =
        test::call_and_read_body_json(&app, request(Method::GET, "/api/health", None).to_request())
            .await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn saving_a_class_returns_todays_stats() {
    let app = app!(Arc::new(MemoryStore::new()));
    let (subject_id, ids) = seed_class(&app, USER).await;
    let today = Utc::now().date_naive().to_string();

    let body: Value = test::call_and_read_body_json(
        &app,
        request(Method::POST, "/api/attendance", Some(USER))
            .set_json(marks(
                &subject_id,
                &today,
                &[(ids[0].as_str(), "present"), (ids[1].as_str(), "present"), (ids[2].as_str(), "absent")],
            ))
            .to_request(),
    )
    .await;

    assert_eq!(body["records"].as_array().unwrap().len(), 3);
    assert_eq!(body["stats"]["totalStudents"], 3);
    assert_eq!(body["stats"]["presentToday"], 2);
    assert_eq!(body["stats"]["absentToday"], 1);
    assert_eq!(body["stats"]["lateToday"], 0);
    assert_eq!(body["records"][0]["markedBy"], USER);
}

#[actix_web::test]
async fn remarking_overwrites_instead_of_adding() {
    let app = app!(Arc::new(MemoryStore::new()));
    let (subject_id, ids) = seed_class(&app, USER).await;

    for status in ["late", "present"] {
        let resp = test::call_service(
            &app,
            request(Method::POST, "/api/attendance", Some(USER))
                .set_json(marks(&subject_id, "2024-01-01", &[(ids[0].as_str(), status)]))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let records: Value = test::call_and_read_body_json(
        &app,
        request(
            Method::GET,
            &format!("/api/attendance?date=2024-01-01&studentId={}", ids[0]),
            Some(USER),
        )
        .to_request(),
    )
    .await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "present");
}

#[actix_web::test]
async fn store_failure_mid_batch_returns_the_journal() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(store.clone());
    let (subject_id, ids) = seed_class(&app, USER).await;
    store.reject_attendance_for(&ids[1]);

    let resp = test::call_service(
        &app,
        request(Method::POST, "/api/attendance", Some(USER))
            .set_json(marks(
                &subject_id,
                "2024-02-05",
                &[(ids[0].as_str(), "present"), (ids[1].as_str(), "late"), (ids[2].as_str(), "absent")],
            ))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    let entries = body["journal"]["entries"].as_array().unwrap();
    let outcomes: Vec<&str> = entries.iter().map(|e| e["outcome"].as_str().unwrap()).collect();
    assert_eq!(outcomes, vec!["applied", "failed", "pending"]);
    assert_eq!(entries[1]["key"]["studentId"], ids[1].as_str());
    assert!(entries[0]["recordId"].is_string());

    let records: Value = test::call_and_read_body_json(
        &app,
        request(Method::GET, "/api/attendance?date=2024-02-05", Some(USER)).to_request(),
    )
    .await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["studentId"], ids[0].as_str());
}

#[actix_web::test]
async fn empty_batch_is_a_bad_request() {
    let app = app!(Arc::new(MemoryStore::new()));
    let resp = test::call_service(
        &app,
        request(Method::POST, "/api/attendance", Some(USER))
            .set_json(json!({ "records": [] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn roster_pairs_students_with_their_marks() {
    let app = app!(Arc::new(MemoryStore::new()));
    let (subject_id, ids) = seed_class(&app, USER).await;

    test::call_service(
        &app,
        request(Method::POST, "/api/attendance", Some(USER))
            .set_json(marks(&subject_id, "2024-03-04", &[(ids[1].as_str(), "late")]))
            .to_request(),
    )
    .await;

    let roster: Value = test::call_and_read_body_json(
        &app,
        request(
            Method::GET,
            &format!("/api/attendance/roster?year=Year%207&subjectId={subject_id}&date=2024-03-04"),
            Some(USER),
        )
        .to_request(),
    )
    .await;
    assert_eq!(roster["entries"].as_array().unwrap().len(), 3);
    assert_eq!(roster["counts"]["late"], 1);
    assert_eq!(roster["counts"]["unmarked"], 2);

    let searched: Value = test::call_and_read_body_json(
        &app,
        request(
            Method::GET,
            &format!(
                "/api/attendance/roster?year=Year%207&subjectId={subject_id}&date=2024-03-04&search=ben"
            ),
            Some(USER),
        )
        .to_request(),
    )
    .await;
    let entries = searched["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "late");
}

#[actix_web::test]
async fn users_only_see_their_own_marks() {
    let app = app!(Arc::new(MemoryStore::new()));
    let (subject_id, ids) = seed_class(&app, USER).await;
    test::call_service(
        &app,
        request(Method::POST, "/api/attendance", Some(USER))
            .set_json(marks(&subject_id, "2024-01-02", &[(ids[0].as_str(), "present")]))
            .to_request(),
    )
    .await;

    let other: Value = test::call_and_read_body_json(
        &app,
        request(Method::GET, "/api/attendance", Some(2)).to_request(),
    )
    .await;
    assert!(other.as_array().unwrap().is_empty());
}
