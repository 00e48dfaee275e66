use actix_web::{http::StatusCode, test::TestRequest};
use mockall::predicate::eq;
use push_engine::{
    db_types::{NewNotification, NotificationUpdate},
    NotificationQueryFilter,
    NotificationStoreError,
    PushDeliveryError,
    PushMessage,
    MAX_LISTED_NOTIFICATIONS,
};
use serde_json::json as js;

use super::{
    helpers::{gate_with, json, send_request, user_session, AUTH_HEADER},
    mocks::{mock_api, receipt, record, MockPusher, MockStore},
};
use crate::gate::{AuthRequest, Credentials};

fn welcome() -> NewNotification {
    NewNotification::new("u-1", "Welcome", "Thanks for signing up", "dZ1z9Lx_YN4")
}

#[actix_web::test]
async fn create_notification() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_notification().with(eq(welcome())).times(1).returning(|n| Ok(record(7, &n)));
    let mut pusher = MockPusher::new();
    pusher
        .expect_send()
        .with(eq(PushMessage::new("Welcome", "Thanks for signing up", "dZ1z9Lx_YN4")))
        .times(1)
        .returning(|_| Ok(receipt()));
    let (gate, spy) = gate_with(Some(user_session()));
    let req = TestRequest::post().uri("/").insert_header(("Authorization", AUTH_HEADER)).set_json(welcome());
    let (status, body) = send_request(req, mock_api(store, pusher), gate).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["id"], 7);
    assert_eq!(body["userUid"], "u-1");
    assert_eq!(body["deviceToken"], "dZ1z9Lx_YN4");
    assert_eq!(body["isView"], false);
    assert_eq!(spy.calls(), vec![AuthRequest::new(Credentials {
        access_token: Some("tokA".into()),
        refresh_token: Some("tokB".into()),
    })]);
}

#[actix_web::test]
async fn create_notification_when_push_fails() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_notification().times(1).returning(|n| Ok(record(8, &n)));
    let mut pusher = MockPusher::new();
    pusher
        .expect_send()
        .times(1)
        .returning(|_| Err(PushDeliveryError::Rejected { status: 404, message: "UNREGISTERED".into() }));
    let (gate, _spy) = gate_with(Some(user_session()));
    let req = TestRequest::post().uri("/").insert_header(("Authorization", AUTH_HEADER)).set_json(welcome());
    let (status, body) = send_request(req, mock_api(store, pusher), gate).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["id"], 8);
}

#[actix_web::test]
async fn create_invalid_notification() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_notification().never();
    let mut pusher = MockPusher::new();
    pusher.expect_send().never();
    let api = mock_api(store, pusher);

    let (gate, _) = gate_with(Some(user_session()));
    let payload = js!({"title": "", "message": "Hi", "deviceToken": "d", "userUid": "u-1"});
    let req = TestRequest::post().uri("/").insert_header(("Authorization", AUTH_HEADER)).set_json(payload);
    let (status, body) = send_request(req, api.clone(), gate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("title must not be empty"));

    let (gate, _) = gate_with(Some(user_session()));
    let payload = js!({"title": "Hi", "message": "Hi"});
    let req = TestRequest::post().uri("/").insert_header(("Authorization", AUTH_HEADER)).set_json(payload);
    let (status, body) = send_request(req, api, gate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn list_all_notifications() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .with(eq(NotificationQueryFilter::default().with_limit(MAX_LISTED_NOTIFICATIONS)))
        .times(1)
        .returning(|_| Ok(vec![record(1, &welcome()), record(2, &welcome())]));
    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[1]["id"], 2);
    assert_eq!(body[0]["createdAt"], "2024-06-01T12:00:00Z");
}

#[actix_web::test]
async fn my_notifications() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .with(eq(NotificationQueryFilter::default().with_user_uid("u-1")))
        .times(1)
        .returning(|_| Ok(vec![record(3, &welcome())]));
    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/user_uid").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["userUid"], "u-1");
}

#[actix_web::test]
async fn my_notifications_without_user_uid() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_notifications().never();
    let (gate, _) = gate_with(Some(crate::gate::SessionData::new("service")));
    let req = TestRequest::get().uri("/user_uid").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The session does not carry a userUid"}"#);
}

#[actix_web::test]
async fn fetch_by_id() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_notification().with(eq(4)).returning(|id| Ok(Some(record(id, &welcome()))));
    store.expect_fetch_notification().with(eq(5)).returning(|_| Ok(None));
    let api = mock_api(store, MockPusher::new());

    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/4").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, api.clone(), gate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["title"], "Welcome");

    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/5").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, api.clone(), gate).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Notification #5 does not exist"}"#);

    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::get().uri("/not-a-number").insert_header(("Authorization", AUTH_HEADER));
    let (status, _) = send_request(req, api, gate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_notification() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_update_notification()
        .with(eq(6), eq(NotificationUpdate::default().with_title("Updated")))
        .times(1)
        .returning(|id, update| {
            let mut n = record(id, &welcome());
            n.title = update.title.unwrap_or_default();
            Ok(n)
        });
    let (gate, _) = gate_with(Some(user_session()));
    let req =
        TestRequest::put().uri("/6").insert_header(("Authorization", AUTH_HEADER)).set_json(js!({"title": "Updated"}));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["id"], 6);
    assert_eq!(body["title"], "Updated");
    assert_eq!(body["message"], "Thanks for signing up");
}

#[actix_web::test]
async fn mark_viewed() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_update_notification().with(eq(9), eq(NotificationUpdate::mark_viewed())).times(1).returning(
        |id, _| {
            let mut n = record(id, &welcome());
            n.is_view = true;
            Ok(n)
        },
    );
    store
        .expect_update_notification()
        .with(eq(10), eq(NotificationUpdate::mark_viewed()))
        .times(1)
        .returning(|id, _| Err(NotificationStoreError::NotificationNotFound(id)));
    let api = mock_api(store, MockPusher::new());

    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::put().uri("/view/9").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, api.clone(), gate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);

    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::put().uri("/view/10").insert_header(("Authorization", AUTH_HEADER));
    let (status, _) = send_request(req, api, gate).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_notification() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_delete_notification().with(eq(11)).times(1).returning(|_| Ok(()));
    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::delete().uri("/11").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn backend_failures_are_opaque() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_delete_notification()
        .returning(|_| Err(NotificationStoreError::DatabaseError("database is locked".into())));
    let (gate, _) = gate_with(Some(user_session()));
    let req = TestRequest::delete().uri("/12").insert_header(("Authorization", AUTH_HEADER));
    let (status, body) = send_request(req, mock_api(store, MockPusher::new()), gate).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"An error occurred on the backend of the server."}"#);
}
