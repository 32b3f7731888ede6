//! Authorization code exchange (RFC 6749 §4.1.3)
//!
//! POSTs the code to the token endpoint with the client's credentials in an
//! HTTP Basic `Authorization` header (RFC 6749 §2.3.1). The response body is
//! handed back untouched: success and error payloads are not told apart,
//! and the HTTP status is reported only so the caller can log it.
//!
//! One attempt per call. There is no retry or backoff.

use std::sync::Arc;

use bytes::Bytes;
use common::Secret;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument, warn};

use crate::constants::GRANT_TYPE_AUTHORIZATION_CODE;
use crate::error::{Error, Result};

/// Identity of the confidential client at the authorization server.
#[derive(Debug)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
}

/// Raw token endpoint reply.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Exchanges authorization codes at a single token endpoint.
///
/// Cheap to clone; the HTTP client and credentials are shared.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    client: reqwest::Client,
    token_url: String,
    redirect_uri: String,
    credentials: Arc<ClientCredentials>,
}

impl TokenExchanger {
    /// `redirect_uri` must be byte-identical to the one sent on the
    /// authorization request or the server will reject the exchange.
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        redirect_uri: impl Into<String>,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            redirect_uri: redirect_uri.into(),
            credentials: Arc::new(credentials),
        }
    }

    /// Exchange `code` for a token. The code is sent as-is, even when empty.
    #[instrument(skip_all, fields(token_url = %self.token_url))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let url = Url::parse(&self.token_url).map_err(|e| Error::InvalidUrl {
            field: "token endpoint",
            reason: e.to_string(),
        })?;

        // .form() sets Content-Type: application/x-www-form-urlencoded
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.expose()),
            )
            .form(&[
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", GRANT_TYPE_AUTHORIZATION_CODE),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Http(format!("token exchange request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(e.to_string())
            } else {
                Error::Body(e.to_string())
            }
        })?;

        if status.is_success() {
            debug!(%status, body_len = body.len(), "token endpoint responded");
        } else {
            warn!(%status, body_len = body.len(), "token endpoint returned non-success status, relaying body");
        }

        Ok(TokenResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// What the mock token endpoint saw for one request.
    #[derive(Debug, Clone)]
    struct Captured {
        headers: HeaderMap,
        form: HashMap<String, String>,
    }

    /// Start a token endpoint that records every request and replies with
    /// the given status and body.
    async fn start_token_endpoint(
        status: u16,
        body: &'static str,
    ) -> (String, Arc<Mutex<Vec<Captured>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/token",
                axum::routing::post(
                    move |headers: HeaderMap,
                          axum::Form(form): axum::Form<HashMap<String, String>>| {
                        let sink = sink.clone();
                        async move {
                            sink.lock().unwrap().push(Captured { headers, form });
                            (axum::http::StatusCode::from_u16(status).unwrap(), body)
                        }
                    },
                ),
            );
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/token"), captured)
    }

    fn exchanger(token_url: &str) -> TokenExchanger {
        TokenExchanger::new(
            reqwest::Client::new(),
            token_url,
            "http://localhost:8888/callback",
            ClientCredentials {
                client_id: "abc".into(),
                client_secret: Secret::new("s3cr3t".into()),
            },
        )
    }

    #[tokio::test]
    async fn exchange_posts_form_with_basic_auth() {
        let (url, captured) = start_token_endpoint(200, r#"{"access_token":"xyz"}"#).await;

        exchanger(&url).exchange_code("abc123").await.unwrap();

        let requests = captured.lock().unwrap().clone();
        assert_eq!(requests.len(), 1, "exactly one POST per exchange");
        let req = &requests[0];

        assert_eq!(req.form["code"], "abc123");
        assert_eq!(req.form["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(req.form["grant_type"], "authorization_code");
        assert_eq!(req.form.len(), 3);

        assert_eq!(req.headers["accept"], "application/json");
        assert_eq!(
            req.headers["content-type"],
            "application/x-www-form-urlencoded"
        );

        let auth = req.headers["authorization"].to_str().unwrap();
        let encoded = auth.strip_prefix("Basic ").expect("basic scheme");
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, "abc:s3cr3t");
    }

    #[tokio::test]
    async fn empty_code_is_sent_unvalidated() {
        let (url, captured) = start_token_endpoint(200, "{}").await;

        exchanger(&url).exchange_code("").await.unwrap();

        let requests = captured.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].form["code"], "");
    }

    #[tokio::test]
    async fn error_payload_is_returned_not_raised() {
        let (url, _captured) = start_token_endpoint(400, r#"{"error":"invalid_grant"}"#).await;

        let response = exchanger(&url).exchange_code("expired").await.unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(&response.body[..], br#"{"error":"invalid_grant"}"#);
    }

    #[tokio::test]
    async fn unparseable_token_url_is_an_error() {
        let err = exchanger("::not-a-url::")
            .exchange_code("abc")
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { field: "token endpoint", .. }),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        let err = exchanger("http://127.0.0.1:1/token")
            .exchange_code("abc")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn slow_endpoint_times_out_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(Mutex::new(0u32));
        let counter = accepted.clone();

        tokio::spawn(async move {
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                *counter.lock().unwrap() += 1;
                tokio::spawn(async move {
                    // Accept but never answer
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(socket);
                });
            }
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let exchanger = TokenExchanger::new(
            client,
            format!("http://{addr}/token"),
            "http://localhost:8888/callback",
            ClientCredentials {
                client_id: "abc".into(),
                client_secret: Secret::new("s3cr3t".into()),
            },
        );

        let err = exchanger.exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "got: {err:?}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*accepted.lock().unwrap(), 1, "no retry after timeout");
    }
}
