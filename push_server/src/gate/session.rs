use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The session returned by the remote authority for a valid pair of tokens.
///
/// Only `role` and `userUid` are interpreted here. Every other claim is kept as-is so that handlers can read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uid: Option<String>,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl SessionData {
    pub fn new<S: Into<String>>(role: S) -> Self {
        Self { role: role.into(), ..Default::default() }
    }

    pub fn with_user_uid<S: Into<String>>(mut self, user_uid: S) -> Self {
        self.user_uid = Some(user_uid.into());
        self
    }
}

/// The access/refresh token pair taken from an `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Splits a header of the form `<scheme> <accessToken> <refreshToken>` on single spaces.
    ///
    /// Headers with missing parts are not rejected; the missing tokens are simply left out and the authority decides.
    pub fn from_header(header: &str) -> Self {
        let mut parts = header.split(' ').skip(1).map(String::from);
        let access_token = parts.next();
        let refresh_token = parts.next();
        Self { access_token, refresh_token }
    }
}

/// The payload published on the session topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub authorization: Credentials,
}

impl AuthRequest {
    pub fn new(authorization: Credentials) -> Self {
        Self { authorization }
    }

    pub fn from_header(header: &str) -> Self {
        Self::new(Credentials::from_header(header))
    }
}
