//! Session handling: where credentials live, what happens on a 401, and the
//! gate that protected screens consult before rendering.

pub mod gate;
pub mod redirect;
pub mod store;

pub use gate::{AuthGate, GateDecision};
pub use redirect::{LoginRedirect, TerminalRedirect};
#[cfg(test)]
pub use store::MemoryCredentialStore;
pub use store::{CredentialStore, FileCredentialStore};

/// Storage key of the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
