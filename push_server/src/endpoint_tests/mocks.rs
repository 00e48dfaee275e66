use actix_web::web;
use chrono::{TimeZone, Utc};
use mockall::mock;
use push_engine::{
    db_types::{NewNotification, Notification, NotificationId, NotificationUpdate},
    DeliveryReceipt,
    NotificationApi,
    NotificationManagement,
    NotificationQueryFilter,
    NotificationStoreError,
    PushDelivery,
    PushDeliveryError,
    PushMessage,
};

mock! {
    pub Store {}
    impl NotificationManagement for Store {
        async fn fetch_notifications(&self, filter: NotificationQueryFilter) -> Result<Vec<Notification>, NotificationStoreError>;
        async fn fetch_notification(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError>;
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError>;
        async fn update_notification(&self, id: NotificationId, update: NotificationUpdate) -> Result<Notification, NotificationStoreError>;
        async fn delete_notification(&self, id: NotificationId) -> Result<(), NotificationStoreError>;
    }
}

mock! {
    pub Pusher {}
    impl PushDelivery for Pusher {
        async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt, PushDeliveryError>;
    }
}

/// The record a store would return after saving `new` under `id`.
pub fn record(id: NotificationId, new: &NewNotification) -> Notification {
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Notification {
        id,
        user_uid: new.user_uid.clone(),
        title: new.title.clone(),
        message: new.message.clone(),
        device_token: new.device_token.clone(),
        is_view: false,
        created_at: t,
        updated_at: t,
    }
}

pub fn receipt() -> DeliveryReceipt {
    DeliveryReceipt { message_id: "projects/push-demo/messages/0:1718000000000000%31bd1c9631bd1c96".into() }
}

pub fn mock_api(store: MockStore, pusher: MockPusher) -> web::Data<NotificationApi<MockStore, MockPusher>> {
    web::Data::new(NotificationApi::new(store, pusher))
}
