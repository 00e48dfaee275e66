use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test, test::TestRequest, web, App, HttpResponse};

use super::{
    helpers::{gate_with, json, send_request, user_session, AUTH_HEADER},
    mocks::{mock_api, MockPusher, MockStore},
};
use crate::{
    authority::AuthorityError,
    gate::{testing::SpyAuthority, SessionGate},
    routes::SessionRoute,
};

crate::route!(admin_only => Get "/admin_only" requires ["admin"]);
async fn admin_only() -> HttpResponse {
    HttpResponse::Ok().body("welcome, admin")
}

async fn call_admin_only(gate: SessionGate, header: &str) -> StatusCode {
    let app = App::new().app_data(web::Data::new(gate)).service(AdminOnlyRoute::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/admin_only").insert_header(("Authorization", header)).to_request();
    test::call_service(&service, req).await.status()
}

fn untouched_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_notifications().never();
    store
}

#[actix_web::test]
async fn missing_header() {
    let _ = env_logger::try_init().ok();
    let (gate, spy) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/");
    let (status, body) = send_request(req, mock_api(untouched_store(), MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Unauthorized"}"#);
    assert_eq!(spy.call_count(), 0);
}

#[actix_web::test]
async fn unknown_session() {
    let _ = env_logger::try_init().ok();
    let (gate, spy) = gate_with(None);
    let req = TestRequest::get().uri("/").insert_header(("Authorization", AUTH_HEADER));
    let (status, _) = send_request(req, mock_api(untouched_store(), MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(spy.call_count(), 1);
}

#[actix_web::test]
async fn opaque_header_bytes_reach_the_authority() {
    let _ = env_logger::try_init().ok();
    let (gate, spy) = gate_with(None);
    let header = actix_web::http::header::HeaderValue::from_bytes(b"Bearer tok\xe9A tokB").unwrap();
    let req = TestRequest::get().uri("/").insert_header(("Authorization", header));
    let (status, _) = send_request(req, mock_api(untouched_store(), MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(spy.call_count(), 1);
    let calls = spy.calls();
    assert_eq!(calls[0].authorization.access_token.as_deref(), Some("tok\u{fffd}A"));
    assert_eq!(calls[0].authorization.refresh_token.as_deref(), Some("tokB"));
}

#[actix_web::test]
async fn authority_timeout() {
    let _ = env_logger::try_init().ok();
    let spy = Arc::new(SpyAuthority::failing(AuthorityError::Timeout(Duration::from_secs(5))));
    let gate = SessionGate::new(spy.clone());
    let req = TestRequest::get().uri("/").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(untouched_store(), MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.contains("5000"), "Transport details must not leak: {body}");
    assert_eq!(spy.call_count(), 1);
}

#[actix_web::test]
async fn insufficient_role_collapses_to_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (gate, spy) = gate_with(Some(user_session()));
    assert_eq!(call_admin_only(gate, AUTH_HEADER).await, StatusCode::UNAUTHORIZED);
    assert_eq!(spy.call_count(), 1);
}

#[actix_web::test]
async fn insufficient_role_can_be_forbidden() {
    let _ = env_logger::try_init().ok();
    let (gate, _) = gate_with(Some(user_session()));
    let gate = gate.distinguish_forbidden(true);
    assert_eq!(call_admin_only(gate.clone(), AUTH_HEADER).await, StatusCode::FORBIDDEN);
    assert_eq!(call_admin_only(gate, "").await, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_role() {
    let _ = env_logger::try_init().ok();
    let (gate, _) = gate_with(Some(crate::gate::SessionData::new("admin")));
    assert_eq!(call_admin_only(gate, AUTH_HEADER).await, StatusCode::OK);
}

#[actix_web::test]
async fn session_is_returned() {
    let _ = env_logger::try_init().ok();
    let (gate, _) = gate_with(Some(user_session()));
    let app = App::new().app_data(web::Data::new(gate)).service(SessionRoute::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/session").insert_header(("Authorization", AUTH_HEADER)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    let body = json(&String::from_utf8_lossy(&body));
    assert_eq!(body["role"], "user");
    assert_eq!(body["userUid"], "u-1");
}
