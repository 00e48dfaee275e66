use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use mockall::predicate::eq;
use push_engine::{
    db_types::{NewNotification, NotificationUpdate},
    NotificationApi,
    NotificationApiError,
    NotificationStoreError,
    PushMessage,
};

use super::{
    helpers::gate_with,
    mocks::{receipt, record, MockPusher, MockStore},
};
use crate::broker::{handle_with_retries, BrokerHandlerError, MessageRouter, RetryPolicy, CREATE_TOPIC, VIEW_TOPIC};

const CREATE_PAYLOAD: &[u8] = br#"{"title":"Order shipped","message":"Your order is on its way","deviceToken":"fcm-7","userUid":"u-9"}"#;

fn fast_retries(retries: u32) -> RetryPolicy {
    RetryPolicy { retries, initial_backoff: Duration::from_millis(1), max_backoff: Duration::from_millis(5) }
}

#[tokio::test]
async fn create_over_the_broker_skips_the_authority() {
    let _ = env_logger::try_init().ok();
    let expected = NewNotification::new("u-9", "Order shipped", "Your order is on its way", "fcm-7");
    let mut store = MockStore::new();
    store.expect_insert_notification().with(eq(expected)).times(1).returning(|n| Ok(record(21, &n)));
    let mut pusher = MockPusher::new();
    pusher
        .expect_send()
        .with(eq(PushMessage::new("Order shipped", "Your order is on its way", "fcm-7")))
        .times(1)
        .returning(|_| Ok(receipt()));
    // The authority would refuse everything, but it must not even be asked
    let (gate, spy) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, pusher), gate);
    let value = router.dispatch(CREATE_TOPIC, CREATE_PAYLOAD).await.unwrap();
    assert_eq!(value["id"], 21);
    assert_eq!(value["userUid"], "u-9");
    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn view_over_the_broker() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_update_notification()
        .with(eq(21), eq(NotificationUpdate::mark_viewed()))
        .times(1)
        .returning(|id, _| Ok(record(id, &NewNotification::new("u-9", "t", "m", "d"))));
    let (gate, spy) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, MockPusher::new()), gate);
    let value = router.dispatch(VIEW_TOPIC, br#"{"id":21}"#).await.unwrap();
    assert_eq!(value, serde_json::json!({"success": true}));
    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn bad_messages() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_notification().never();
    let (gate, _) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, MockPusher::new()), gate);
    let err = router.dispatch("push.delete", b"{}").await.unwrap_err();
    assert!(matches!(err, BrokerHandlerError::UnknownTopic(t) if t == "push.delete"));
    let err = router.dispatch(CREATE_TOPIC, b"not json").await.unwrap_err();
    assert!(matches!(err, BrokerHandlerError::InvalidPayload(_)));
    let err = router.dispatch(CREATE_TOPIC, br#"{"title":"","message":"m","deviceToken":"d","userUid":"u"}"#).await;
    assert!(matches!(err, Err(BrokerHandlerError::ApiError(NotificationApiError::ValidationError(_)))));
}

#[tokio::test]
async fn retriable_failures_are_retried() {
    let _ = env_logger::try_init().ok();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let mut store = MockStore::new();
    store.expect_insert_notification().times(3).returning(move |n| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(NotificationStoreError::DatabaseError("database is locked".into()))
        } else {
            Ok(record(22, &n))
        }
    });
    let mut pusher = MockPusher::new();
    pusher.expect_send().times(1).returning(|_| Ok(receipt()));
    let (gate, _) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, pusher), gate);
    let value = handle_with_retries(&router, CREATE_TOPIC, CREATE_PAYLOAD, &fast_retries(5)).await.unwrap();
    assert_eq!(value["id"], 22);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retries_run_out() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_insert_notification()
        .times(3)
        .returning(|_| Err(NotificationStoreError::DatabaseError("disk full".into())));
    let (gate, _) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, MockPusher::new()), gate);
    let err = handle_with_retries(&router, CREATE_TOPIC, CREATE_PAYLOAD, &fast_retries(2)).await.unwrap_err();
    assert!(err.is_retriable());
}

#[tokio::test]
async fn permanent_failures_are_not_retried() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_update_notification()
        .times(1)
        .returning(|id, _| Err(NotificationStoreError::NotificationNotFound(id)));
    let (gate, _) = gate_with(None);
    let router = MessageRouter::new(NotificationApi::new(store, MockPusher::new()), gate);
    let err = handle_with_retries(&router, VIEW_TOPIC, br#"{"id":99}"#, &fast_retries(5)).await.unwrap_err();
    assert!(matches!(err, BrokerHandlerError::ApiError(NotificationApiError::NotificationNotFound(99))));
}
