//! The shared HTTP wrapper.
//!
//! Every backend call except `/api/v1/stats` goes through
//! `ApiClient::fetch_json`, which:
//!
//! 1. short-circuits with `DemoMode` when the session holds the demo token,
//! 2. attaches the bearer token and JSON body,
//! 3. cancels the whole exchange after the configured timeout,
//! 4. maps 401/403 (outside login) to `Unauthorized` after clearing the token.
//!
//! There are no retries.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use veil_contracts::error::{VeilError, VeilResult};

use crate::{
    config::ClientConfig,
    session::{Session, DEMO_TOKEN},
};

/// The endpoint whose 401/403 means "bad credentials", not "expired session".
pub const LOGIN_ENDPOINT: &str = "/auth/login";

/// HTTP client for the governance backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: Client,
    pub(crate) origin: String,
    pub(crate) api_base: String,
    pub(crate) timeout: Duration,
    pub(crate) session: Session,
}

impl ApiClient {
    /// Build a client for `config`, sharing `session` with the caller.
    pub fn new(config: &ClientConfig, session: Session) -> VeilResult<Self> {
        config.validate()?;
        let http = Client::builder().build().map_err(|e| VeilError::ConfigError {
            reason: format!("failed to build http client: {}", e),
        })?;
        Ok(Self {
            http,
            origin: config.origin(),
            api_base: config.api_base(),
            timeout: config.timeout(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request to `endpoint` (relative to the API base) and decode
    /// the JSON response.
    ///
    /// An empty 2xx body decodes as JSON `null`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> VeilResult<T> {
        let token = self.session.token();
        if token.as_deref() == Some(DEMO_TOKEN) {
            debug!(endpoint = %endpoint, "demo token present; skipping backend call");
            return Err(VeilError::DemoMode);
        }

        let url = format!("{}{}", self.api_base, endpoint);
        debug!(method = %method, url = %url, "api request");

        let mut request = self.http.request(method, &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Err(_) => {
                warn!(endpoint = %endpoint, timeout_ms = self.timeout.as_millis() as u64, "api request timed out");
                return Err(VeilError::TimedOut {
                    endpoint: endpoint.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                warn!(endpoint = %endpoint, error = %e, "api request failed");
                return Err(VeilError::Http {
                    reason: e.to_string(),
                });
            }
            Ok(Ok(pair)) => pair,
        };

        if !status.is_success() {
            return Err(self.status_error(endpoint, status));
        }

        decode_body(endpoint, &bytes)
    }

    fn status_error(&self, endpoint: &str, status: StatusCode) -> VeilError {
        let auth_failure = status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;
        if auth_failure && endpoint != LOGIN_ENDPOINT {
            warn!(endpoint = %endpoint, status = status.as_u16(), "token rejected; clearing session");
            self.session.clear();
            return VeilError::Unauthorized;
        }
        VeilError::Api {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    // ========== Method helpers ==========

    pub(crate) async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> VeilResult<T> {
        self.fetch_json(Method::GET, endpoint, None).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> VeilResult<T> {
        self.fetch_json(Method::POST, endpoint, Some(to_body(body)?))
            .await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> VeilResult<T> {
        self.fetch_json(Method::PUT, endpoint, Some(to_body(body)?))
            .await
    }

    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> VeilResult<T> {
        self.fetch_json(Method::PATCH, endpoint, Some(to_body(body)?))
            .await
    }

    /// DELETE, discarding whatever the backend returns.
    pub(crate) async fn delete(&self, endpoint: &str) -> VeilResult<()> {
        self.fetch_json::<Value>(Method::DELETE, endpoint, None)
            .await
            .map(|_| ())
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> VeilResult<Value> {
    serde_json::to_value(body).map_err(|e| VeilError::Decode {
        reason: format!("request body is not serializable: {}", e),
    })
}

fn decode_body<T: DeserializeOwned>(endpoint: &str, bytes: &[u8]) -> VeilResult<T> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| VeilError::Decode {
        reason: format!("unexpected response from '{}': {}", endpoint, e),
    })
}
