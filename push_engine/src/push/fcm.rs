use std::{fs, path::Path, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::*;
use push_common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{DeliveryReceipt, PushDelivery, PushDeliveryError, PushMessage};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const FCM_BASE_URL: &str = "https://fcm.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
// Google caps assertion lifetimes at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh the access token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
// Applies to every call made to Google, token exchange included.
const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a Firebase service-account key file that is needed to mint access tokens.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: Secret<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, PushDeliveryError> {
        serde_json::from_str(json).map_err(|e| PushDeliveryError::InvalidCredentials(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PushDeliveryError> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            PushDeliveryError::InvalidCredentials(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    notification: FcmNotification<'a>,
    token: &'a str,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct FcmResponse {
    name: String,
}

struct FcmInner {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

/// Firebase Cloud Messaging client. Cheap to clone; clones share the HTTP client and the cached access token.
///
/// A client built with [`FcmClient::disabled`] fails every send with [`PushDeliveryError::NotConfigured`].
#[derive(Clone)]
pub struct FcmClient {
    inner: Option<Arc<FcmInner>>,
}

impl std::fmt::Debug for FcmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(inner) => write!(f, "FcmClient ({})", inner.key.project_id),
            None => write!(f, "FcmClient (disabled)"),
        }
    }
}

impl FcmClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self, PushDeliveryError> {
        Self::with_base_url(key, FCM_BASE_URL)
    }

    pub fn with_base_url(key: ServiceAccountKey, base_url: &str) -> Result<Self, PushDeliveryError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.reveal().as_bytes())
            .map_err(|e| PushDeliveryError::InvalidCredentials(format!("Invalid private key. {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PushDeliveryError::Transport(format!("Could not build the HTTP client. {e}")))?;
        let inner = FcmInner {
            key,
            encoding_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        };
        Ok(Self { inner: Some(Arc::new(inner)) })
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl FcmInner {
    fn send_url(&self) -> String {
        format!("{}/v1/projects/{}/messages:send", self.base_url, self.key.project_id)
    }

    async fn access_token(&self) -> Result<String, PushDeliveryError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.token.reveal().clone());
            }
            trace!("📲️ FCM access token has expired");
        }
        let fresh = self.fetch_access_token().await?;
        let token = fresh.token.reveal().clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn fetch_access_token(&self) -> Result<CachedToken, PushDeliveryError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FCM_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| PushDeliveryError::TokenError(format!("Could not sign assertion. {e}")))?;
        debug!("📲️ Requesting a new FCM access token for {}", self.key.client_email);
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PushDeliveryError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushDeliveryError::TokenError(format!("Status {status}. {message}")));
        }
        let token: TokenResponse = response.json().await.map_err(|e| PushDeliveryError::TokenError(e.to_string()))?;
        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        Ok(CachedToken { token: Secret::new(token.access_token), expires_at: now + Duration::seconds(lifetime) })
    }
}

impl PushDelivery for FcmClient {
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt, PushDeliveryError> {
        let inner = self.inner.as_ref().ok_or(PushDeliveryError::NotConfigured)?;
        let token = inner.access_token().await?;
        let request = FcmRequest {
            message: FcmMessage {
                notification: FcmNotification { title: &message.title, body: &message.body },
                token: &message.device_token,
            },
        };
        let response = inner
            .http
            .post(inner.send_url())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PushDeliveryError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushDeliveryError::Rejected { status: status.as_u16(), message });
        }
        let receipt: FcmResponse = response.json().await.map_err(|e| PushDeliveryError::Transport(e.to_string()))?;
        Ok(DeliveryReceipt { message_id: receipt.name })
    }
}
