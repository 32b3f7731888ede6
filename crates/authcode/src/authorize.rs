//! Authorization request construction (RFC 6749 §4.1.1)
//!
//! The user agent is redirected to the authorization endpoint with the
//! client's identity, the callback it expects to be sent back to, and an
//! opaque `state` value. Parameters already present on the configured
//! endpoint are kept unless they collide with one of ours.

use reqwest::Url;

use crate::constants::RESPONSE_TYPE_CODE;
use crate::error::{Error, Result};

/// Query keys this client owns on the authorization request.
const MANAGED_KEYS: [&str; 4] = ["response_type", "client_id", "redirect_uri", "state"];

/// Build the authorization URL for `endpoint`.
///
/// Query parameters are serialized sorted by key with form-urlencoding, so
/// the same inputs always produce the same URL.
pub fn build_authorization_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| Error::InvalidUrl {
        field: "authorization endpoint",
        reason: e.to_string(),
    })?;

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !MANAGED_KEYS.contains(&&**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.extend(
        [
            ("response_type", RESPONSE_TYPE_CODE),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned())),
    );
    // Stable: repeated foreign keys keep their relative order
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    url.set_query(None);
    url.query_pairs_mut().extend_pairs(&pairs);
    Ok(url)
}
