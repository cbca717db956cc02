use tracing::warn;

/// Navigation side effect fired by the API client after a 401 has cleared
/// the stored credentials. Implementations must not issue API requests.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Terminal "navigation": tell the operator to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self) {
        warn!("Session expired or rejected; run `resumeit-admin login` to sign in again");
    }
}
