//! Protocol constants

/// Value sent as `state` on every authorization request.
///
/// Constant and never checked on callback, so it offers no CSRF protection.
pub const STATE: &str = "helloworld";

/// `response_type` for the authorization code grant (RFC 6749 §4.1.1)
pub const RESPONSE_TYPE_CODE: &str = "code";

/// `grant_type` for the code exchange (RFC 6749 §4.1.3)
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/callback";

/// Port the service listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 8888;

/// Redirect URI registered with the authorization server for a local listener.
pub fn callback_uri(port: u16) -> String {
    format!("http://localhost:{port}{CALLBACK_PATH}")
}
