mod call;
mod session;
mod session_gate;

#[cfg(test)]
pub(crate) mod testing;

pub use call::{IncomingCall, Origin, RequiredRoles, ROLE_ALL};
pub use session::{AuthRequest, Credentials, SessionData};
pub use session_gate::{
    Authorization,
    GateError,
    RemoteSessionAuthority,
    SessionAuthority,
    SessionGate,
    SharedAuthority,
};
