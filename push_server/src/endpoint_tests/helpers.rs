use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use push_engine::{NotificationApi, NotificationManagement, PushDelivery};
use serde_json::Value;

use crate::{
    gate::{testing::SpyAuthority, SessionData, SessionGate},
    server::notification_routes,
};

pub const AUTH_HEADER: &str = "Bearer tokA tokB";

pub fn user_session() -> SessionData {
    SessionData::new("user").with_user_uid("u-1")
}

/// A gate whose authority answers every request with `session`.
pub fn gate_with(session: Option<SessionData>) -> (SessionGate, Arc<SpyAuthority>) {
    let spy = Arc::new(SpyAuthority::replying(session));
    (SessionGate::new(spy.clone()), spy)
}

/// Sends `req` to an app serving the notification routes and returns the status and body.
pub async fn send_request<B, P>(
    req: TestRequest,
    api: web::Data<NotificationApi<B, P>>,
    gate: SessionGate,
) -> (StatusCode, String)
where
    B: NotificationManagement + 'static,
    P: PushDelivery + 'static,
{
    let app = App::new()
        .app_data(api)
        .app_data(web::Data::new(gate))
        .configure(notification_routes::<B, P>);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
