//! Drives the full router (extractors, envelopes, status codes) over the
//! in-memory store.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::Harness;
use school_events_server::auth::{USER_ID_HEADER, USER_ROLES_HEADER};
use school_events_server::config::Config;
use school_events_server::routes::create_routes;

const TEACHER: Option<(&str, &str)> = Some(("teacher@school.com", "Teacher"));
const STUDENT: Option<(&str, &str)> = Some(("student@school.com", "Student"));

fn app() -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    create_routes(Harness::new().state, &config)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    who: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some((user, roles)) = who {
        request = request
            .header(USER_ID_HEADER, user)
            .header(USER_ROLES_HEADER, roles);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_organizer(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/organizers",
        TEACHER,
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_event(app: &Router, organizer_id: &str, body: Value) -> (StatusCode, Value) {
    let mut body = body;
    body["organizer_id"] = json!(organizer_id);
    send(app, Method::POST, "/events", TEACHER, Some(body)).await
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_organizers_need_authentication_and_role() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/organizers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, body) = send(&app, Method::GET, "/organizers", STUDENT, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_registration_flow() {
    let app = app();
    let organizer_id = create_organizer(&app, "Coach Dimitrov").await;

    let (status, body) = create_event(
        &app,
        &organizer_id,
        json!({
            "title": "Football cup",
            "start_at": "2025-06-12T10:00:00",
            "end_at": "2025-06-12T12:00:00",
            "type": "Sports",
            "capacity": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "Sports");
    let event_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/events/{event_id}/registrations");
    let ana = json!({ "full_name": "Ana", "email": "ana@school.com", "class_name": "10B" });

    let (status, body) = send(&app, Method::POST, &uri, STUDENT, Some(ana.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["outcome"], "registered");

    // capacity is checked before the duplicate, and the only seat is taken
    let (status, body) = send(&app, Method::POST, &uri, STUDENT, Some(ana)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CAPACITY_EXCEEDED");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/events/{event_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["seats_left"], 0);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/events/{event_id}"),
        TEACHER,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_duplicate_registration_is_informational() {
    let app = app();
    let organizer_id = create_organizer(&app, "Ms. Georgieva").await;
    let (_, body) = create_event(
        &app,
        &organizer_id,
        json!({
            "title": "Poetry evening",
            "start_at": "2025-06-14T18:00:00",
            "end_at": "2025-06-14T20:00:00"
        }),
    )
    .await;
    assert_eq!(body["data"]["capacity"], 30);
    assert_eq!(body["data"]["type"], "Other");
    let event_id = body["data"]["id"].as_str().unwrap();
    let uri = format!("/events/{event_id}/registrations");
    let ana = json!({ "full_name": "Ana", "email": "ana@school.com" });

    send(&app, Method::POST, &uri, STUDENT, Some(ana.clone())).await;
    let (status, body) = send(&app, Method::POST, &uri, STUDENT, Some(ana)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["outcome"], "already_registered");
}

#[tokio::test]
async fn test_invalid_schedule_names_end_at() {
    let app = app();
    let organizer_id = create_organizer(&app, "Ms. Petrova").await;

    let (status, body) = create_event(
        &app,
        &organizer_id,
        json!({
            "title": "Backwards",
            "start_at": "2025-06-12T10:00:00",
            "end_at": "2025-06-12T09:00:00"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], "end_at");
}

#[tokio::test]
async fn test_event_listing_and_calendar_queries() {
    let app = app();
    let organizer_id = create_organizer(&app, "Coach Dimitrov").await;
    for (title, kind, start, end) in [
        ("Relay", "Sports", "2025-06-15T10:00:00", "2025-06-15T11:00:00"),
        ("Debate", "Academic", "2025-06-15T09:00:00", "2025-06-15T10:00:00"),
        ("Swim meet", "Sports", "2025-07-02T10:00:00", "2025-07-02T12:00:00"),
    ] {
        let (status, _) = create_event(
            &app,
            &organizer_id,
            json!({ "title": title, "type": kind, "start_at": start, "end_at": end }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/events?from=2025-06-10&to=2025-06-20&type=Sports",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = body["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Relay");

    let (status, body) = send(&app, Method::GET, "/calendar?year=2025&month=6", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let day = body["data"]["events_by_day"]["2025-06-15"].as_array().unwrap();
    let titles: Vec<_> = day.iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Debate", "Relay"]);
    assert!(body["data"]["events_by_day"].get("2025-07-02").is_none());

    let (status, body) = send(
        &app,
        Method::GET,
        "/calendar?year=2025&month=13",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "month");
}

#[tokio::test]
async fn test_stale_organizer_update_conflicts() {
    let app = app();
    let organizer_id = create_organizer(&app, "Ms. Petrova").await;
    let uri = format!("/organizers/{organizer_id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        TEACHER,
        Some(json!({ "name": "Ms. Petrova-Ivanova", "version": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], 2);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        TEACHER,
        Some(json!({ "name": "Someone else", "version": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONCURRENCY_CONFLICT");

    let (status, _) = send(&app, Method::DELETE, &uri, TEACHER, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, TEACHER, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn assert_rejected(status: StatusCode, body: &Value, field: &str) {
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], field);
}

#[tokio::test]
async fn test_blank_filter_fields_are_ignored() {
    let app = app();
    let organizer_id = create_organizer(&app, "Coach Dimitrov").await;
    create_event(
        &app,
        &organizer_id,
        json!({
            "title": "Relay",
            "type": "Sports",
            "start_at": "2025-06-15T10:00:00",
            "end_at": "2025-06-15T11:00:00"
        }),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/events?from=&to=&type=&search=",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["filter"]["from"], Value::Null);

    let (status, body) = send(&app, Method::GET, "/calendar?year=&month=", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["month"].is_u64());
}

#[tokio::test]
async fn test_malformed_query_gets_error_envelope() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/events?type=party", None, None).await;
    assert_rejected(status, &body, "query");

    let (status, body) = send(&app, Method::GET, "/events?from=June", None, None).await;
    assert_rejected(status, &body, "query");

    let (status, body) = send(&app, Method::GET, "/calendar?month=abc", None, None).await;
    assert_rejected(status, &body, "query");
}

#[tokio::test]
async fn test_malformed_path_gets_error_envelope() {
    let (status, body) = send(&app(), Method::GET, "/events/not-a-uuid", None, None).await;
    assert_rejected(status, &body, "path");
}

#[tokio::test]
async fn test_malformed_body_gets_error_envelope() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/organizers")
        .header(USER_ID_HEADER, "teacher@school.com")
        .header(USER_ROLES_HEADER, "Teacher")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_rejected(status, &body, "body");

    // well-formed JSON of the wrong shape
    let (status, body) = send(
        &app,
        Method::POST,
        "/organizers",
        TEACHER,
        Some(json!({ "name": 42 })),
    )
    .await;
    assert_rejected(status, &body, "body");
}
