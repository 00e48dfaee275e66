//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//! Keep this module neat and tidy 🙏
//!
//! Every notification route is wrapped in the session gate. The roles a route requires are declared next to it in
//! its `route!` invocation.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use push_engine::{
    db_types::{NewNotification, NotificationId, NotificationUpdate},
    NotificationApi,
    NotificationManagement,
    PushDelivery,
};

use crate::{
    errors::ServerError,
    gate::{SessionData, ROLE_ALL},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::SessionGateFactory::new(stringify!($name), &[$($roles),*]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::SessionGateFactory::new(stringify!($name), &[$($roles),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Session  ---------------------------------------------------
route!(session => Get "/session" requires []);
/// Returns the session the authority issued for the caller's tokens. Handy for checking credentials.
pub async fn session(session: SessionData) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET session for role '{}'", session.role);
    Ok(HttpResponse::Ok().json(session))
}

// ----------------------------------------------   Notifications  ---------------------------------------------
route!(all_notifications => Get "/" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
/// Lists the notifications in the store, up to [`push_engine::MAX_LISTED_NOTIFICATIONS`] of them.
pub async fn all_notifications<B, P>(api: web::Data<NotificationApi<B, P>>) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    debug!("💻️ GET all notifications");
    let notifications = api.all_notifications().await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(my_notifications => Get "/user_uid" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
/// Lists the notifications addressed to the user the caller's session belongs to.
pub async fn my_notifications<B, P>(
    session: SessionData,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let user_uid = session.user_uid.as_deref().ok_or(ServerError::InvalidSession("userUid"))?;
    debug!("💻️ GET notifications for user {user_uid}");
    let notifications = api.notifications_for_user(user_uid).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(notification_by_id => Get "/{id}" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
pub async fn notification_by_id<B, P>(
    path: web::Path<NotificationId>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let id = path.into_inner();
    debug!("💻️ GET notification #{id}");
    let notification = api
        .notification_by_id(id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Notification #{id} does not exist")))?;
    Ok(HttpResponse::Ok().json(notification))
}

route!(create_notification => Post "/" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
/// Saves a notification and pushes it to the device it is addressed to.
///
/// The response waits for the push for at most the push timeout. A failed or stalled delivery is logged, and the saved
/// record is returned regardless.
pub async fn create_notification<B, P>(
    body: web::Json<NewNotification>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let notification = body.into_inner();
    debug!("💻️ POST notification for user {}", notification.user_uid);
    let record = api.create_notification(notification).await?;
    Ok(HttpResponse::Created().json(record))
}

route!(update_notification => Put "/{id}" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
pub async fn update_notification<B, P>(
    path: web::Path<NotificationId>,
    body: web::Json<NotificationUpdate>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let id = path.into_inner();
    debug!("💻️ PUT notification #{id}");
    let record = api.update_notification(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

route!(mark_viewed => Put "/view/{id}" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
pub async fn mark_viewed<B, P>(
    path: web::Path<NotificationId>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let id = path.into_inner();
    debug!("💻️ PUT view notification #{id}");
    let result = api.mark_viewed(id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(delete_notification => Delete "/{id}" impl NotificationManagement, PushDelivery where requires [ROLE_ALL]);
pub async fn delete_notification<B, P>(
    path: web::Path<NotificationId>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let id = path.into_inner();
    debug!("💻️ DELETE notification #{id}");
    let result = api.delete_notification(id).await?;
    Ok(HttpResponse::Ok().json(result))
}
