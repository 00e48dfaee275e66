use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use log::*;
use push_engine::{
    push::ServiceAccountKey,
    FcmClient,
    NotificationApi,
    NotificationManagement,
    PushDelivery,
    SqliteDatabase,
};

use crate::{
    authority::{AuthorityClient, KafkaTransport},
    broker::{BrokerConsumer, MessageRouter},
    config::{PushConfig, ServerConfig},
    errors::ServerError,
    gate::{RemoteSessionAuthority, SessionGate},
    routes::{
        health,
        AllNotificationsRoute,
        CreateNotificationRoute,
        DeleteNotificationRoute,
        MarkViewedRoute,
        MyNotificationsRoute,
        NotificationByIdRoute,
        SessionRoute,
        UpdateNotificationRoute,
    },
};

/// Connects to the store, the push provider and the broker, starts the broker consumer, and then serves HTTP until
/// the server is stopped.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🚀️ Connected to database at {}", db.url());
    let push = build_push_client(&config.push)?;
    let gate = build_session_gate(&config)?;
    let api = NotificationApi::new(db, push);

    let router = MessageRouter::new(api.clone(), gate.clone());
    let consumer = BrokerConsumer::new(&config.kafka, &config.broker, router)?;
    actix_web::rt::spawn(consumer.run());
    info!("🚀️ Broker consumer started");

    let srv = create_server_instance(config, api, gate)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    api: NotificationApi<SqliteDatabase, FcmClient>,
    gate: SessionGate,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("push::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(gate.clone()))
            .service(health)
            .configure(notification_routes::<SqliteDatabase, FcmClient>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the gated notification routes, along with the extractor settings they rely on.
///
/// The application must provide a `web::Data<NotificationApi<B, P>>` and a `web::Data<SessionGate>`.
/// Literal paths are registered ahead of `/{id}` so that they are not shadowed by it.
pub fn notification_routes<B, P>(cfg: &mut ServiceConfig)
where
    B: NotificationManagement + 'static,
    P: PushDelivery + 'static,
{
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
    let path_config = web::PathConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into());
    cfg.app_data(json_config)
        .app_data(path_config)
        .service(SessionRoute::new())
        .service(MyNotificationsRoute::<B, P>::new())
        .service(MarkViewedRoute::<B, P>::new())
        .service(AllNotificationsRoute::<B, P>::new())
        .service(CreateNotificationRoute::<B, P>::new())
        .service(NotificationByIdRoute::<B, P>::new())
        .service(UpdateNotificationRoute::<B, P>::new())
        .service(DeleteNotificationRoute::<B, P>::new());
}

fn build_push_client(config: &PushConfig) -> Result<FcmClient, ServerError> {
    match &config.service_account {
        Some(path) => {
            let key = ServiceAccountKey::from_file(path).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
            info!("🚀️ Push notifications will be delivered through Firebase project {}", key.project_id);
            FcmClient::new(key).map_err(|e| ServerError::ConfigurationError(e.to_string()))
        },
        None => {
            warn!("🚀️ Push delivery is disabled");
            Ok(FcmClient::disabled())
        },
    }
}

fn build_session_gate(config: &ServerConfig) -> Result<SessionGate, ServerError> {
    let (transport, replies) = KafkaTransport::connect(&config.kafka, &config.auth)?;
    let client = AuthorityClient::new(transport, replies, config.auth.timeout);
    let authority = RemoteSessionAuthority::new(client, config.auth.topic.as_str());
    info!("🚀️ Sessions are checked on {} (timeout {} ms)", config.auth.topic, config.auth.timeout.as_millis());
    Ok(SessionGate::new(Arc::new(authority)).distinguish_forbidden(config.auth.distinguish_forbidden))
}
