//! Authorization code flow handlers
//!
//! - `GET /`         landing text pointing at `/login`
//! - `GET /login`    307 to the authorization endpoint
//! - `GET /callback` exchange `code` and relay the token endpoint's body

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, info};

use crate::AppState;
use crate::error::HandlerError;
use crate::metrics;

pub async fn landing(State(state): State<AppState>) -> String {
    format!(
        "try login via http://localhost:{}{}",
        state.port,
        authcode::LOGIN_PATH
    )
}

/// Redirect the user agent to the authorization server.
///
/// The full URL is logged, which includes the client id and state.
pub async fn login(State(state): State<AppState>) -> Result<Redirect, HandlerError> {
    let url = authcode::build_authorization_url(
        &state.client.auth_url,
        &state.client.client_id,
        &state.client.callback_uri,
        authcode::STATE,
    )
    .inspect_err(|_| state.stats.error())?;

    info!(redirect_url = %url, "redirecting to authorization endpoint");
    metrics::record_login();

    Ok(Redirect::temporary(url.as_str()))
}

/// Exchange the authorization code and write back whatever the token
/// endpoint returned, with a 200 regardless of its status.
///
/// `state` is not checked. A missing `code` is exchanged as the empty string.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, HandlerError> {
    let code = params
        .into_iter()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value)
        .unwrap_or_default();
    debug!(code_len = code.len(), "callback received");

    let started = Instant::now();
    let result = state.exchanger.exchange_code(&code).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(token) => {
            metrics::record_exchange(Some(token.status.as_u16()), elapsed);
            state.stats.callback_served();
            info!(
                upstream_status = %token.status,
                body_len = token.body.len(),
                "relaying token endpoint response"
            );
            Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], token.body).into_response())
        }
        Err(e) => {
            metrics::record_exchange(None, elapsed);
            state.stats.error();
            Err(e.into())
        }
    }
}
