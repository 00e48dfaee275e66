//! Session gate middleware.
//!
//! Wrap any route or service with [`SessionGateFactory`] to run every request through the [`SessionGate`] stored in
//! the application data. The request's `Authorization` header is checked with the session authority, and the
//! resulting [`SessionData`] is attached to the request so that handlers can take it as an extractor.
//!
//! Rejected requests are answered directly with a 401 (or 403) response and never reach the handler.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use futures::future::{ok, ready, Ready};
use log::*;

use crate::{
    errors::ServerError,
    gate::{Authorization, IncomingCall, RequiredRoles, SessionData, SessionGate},
};

pub struct SessionGateFactory {
    handler: &'static str,
    required_roles: RequiredRoles,
}

impl SessionGateFactory {
    pub fn new(handler: &'static str, required_roles: &'static [&'static str]) -> Self {
        Self { handler, required_roles: RequiredRoles::new(required_roles) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGateFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionGateService {
            handler: self.handler,
            required_roles: self.required_roles,
            service: Rc::new(service),
        })
    }
}

pub struct SessionGateService<S> {
    handler: &'static str,
    required_roles: RequiredRoles,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let handler = self.handler;
        let required_roles = self.required_roles;
        Box::pin(async move {
            let Some(gate) = req.app_data::<web::Data<SessionGate>>().cloned() else {
                error!("🔐️ No session gate has been configured, but {handler} requires one");
                let err = ServerError::ConfigurationError("Session gate is missing".into());
                return Ok(req.error_response(err).map_into_right_body());
            };
            // Headers that are not valid UTF-8 still go to the authority, which decides whether they are valid
            let credentials =
                req.headers().get(AUTHORIZATION).map(|h| String::from_utf8_lossy(h.as_bytes()).into_owned());
            let call = IncomingCall::external(handler, required_roles, credentials);
            match gate.authorize(&call).await {
                Ok(Authorization::Session(session)) => {
                    req.extensions_mut().insert(session);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Ok(Authorization::Trusted) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => {
                    debug!("🔐️ Request for {handler} was rejected. {e}");
                    Ok(req.error_response(ServerError::from(e)).map_into_right_body())
                },
            }
        })
    }
}

/// Handlers behind a [`SessionGateFactory`] can take the caller's session as an argument.
impl FromRequest for SessionData {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<SessionData>().cloned().ok_or_else(|| {
            warn!("🔐️ {} was called without a session. Is it missing the session gate?", req.path());
            ServerError::Unauthorized
        });
        ready(session)
    }
}
