use std::fmt::Display;

/// The sentinel role. A handler that requires it admits every authenticated session, whatever its role.
pub const ROLE_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The call arrived over HTTP.
    External,
    /// The call was dispatched from the message broker.
    Internal,
}

impl Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::External => write!(f, "external"),
            Origin::Internal => write!(f, "internal"),
        }
    }
}

/// The roles a handler declares when it is registered. An empty set places no restriction on the session role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredRoles(&'static [&'static str]);

impl RequiredRoles {
    pub const fn new(roles: &'static [&'static str]) -> Self {
        Self(roles)
    }

    pub fn roles(&self) -> &'static [&'static str] {
        self.0
    }

    pub fn permits(&self, role: &str) -> bool {
        self.0.is_empty() || self.0.contains(&ROLE_ALL) || self.0.contains(&role)
    }
}

impl Display for RequiredRoles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A unit of work entering the service. It lives for the duration of one HTTP request or broker message.
#[derive(Debug, Clone)]
pub struct IncomingCall {
    pub origin: Origin,
    /// The raw authorization header. Only ever present for external calls.
    pub credentials: Option<String>,
    pub required_roles: RequiredRoles,
    pub handler: &'static str,
}

impl IncomingCall {
    pub fn external(handler: &'static str, required_roles: RequiredRoles, credentials: Option<String>) -> Self {
        Self { origin: Origin::External, credentials, required_roles, handler }
    }

    pub fn internal(handler: &'static str, required_roles: RequiredRoles) -> Self {
        Self { origin: Origin::Internal, credentials: None, required_roles, handler }
    }
}
