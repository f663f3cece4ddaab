//! Authenticated request dispatcher
//!
//! [`GatewayClient`] joins a path onto the configured base URL, injects the
//! active credential into the header shape of the request's [`RouteClass`],
//! and normalizes every outcome into a JSON value or an [`ApiError`].

use super::envelope;
use super::error::{ApiError, Result};
use super::route::ApiRequest;
use crate::config::SecretString;
use crate::i18n::{self, Locale, Message};
use crate::utils::truncate_str;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default remote API.
pub const DEFAULT_BASE_URL: &str = "https://api.zuckzapgo.com";

/// Credential snapshot used for a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<SecretString>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: impl Into<SecretString>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// HTTP client for the gateway API.
///
/// Clones share the token cell, so a login performed through one handle is
/// seen by every other. [`GatewayClient::with_auth`] returns a handle with its
/// own cell instead.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    http: Client,
    locale: Locale,
    token: Arc<RwLock<Option<SecretString>>>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .field("authenticated", &self.has_token())
            .finish()
    }
}

impl GatewayClient {
    /// Create a client for `base_url` with the HTTP stack's default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional total request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, http))
    }

    /// Create with a custom HTTP client.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            locale: Locale::default(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Locale used for generated error messages.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Replace the active credential.
    pub fn set_token(&self, token: impl Into<SecretString>) {
        let token = token.into();
        tracing::debug!("Gateway token set ({})", token.masked());
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    /// Drop the active credential.
    pub fn clear_token(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            tracing::debug!("Gateway token cleared");
        }
    }

    pub fn token(&self) -> Option<SecretString> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Snapshot of the credential as it is right now.
    pub fn auth_context(&self) -> AuthContext {
        AuthContext { token: self.token() }
    }

    /// A handle sharing the HTTP pool but carrying its own credential.
    pub fn with_auth(&self, ctx: AuthContext) -> Self {
        Self {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            locale: self.locale,
            token: Arc::new(RwLock::new(ctx.token)),
        }
    }

    /// The shared HTTP pool, for raw pass-through requests.
    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform the request and return the unwrapped JSON payload.
    ///
    /// The credential is read here, not when the request was built.
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let auth = self.auth_context();
        self.dispatch(request, &auth).await
    }

    /// Perform the request and decode the payload into `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.send(request).await?;
        envelope::decode(value)
    }

    /// Perform the request, discarding any payload.
    pub async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// Perform the request under an explicit credential.
    pub async fn dispatch(&self, request: ApiRequest, auth: &AuthContext) -> Result<Value> {
        let url = self.url(&request.path);
        tracing::debug!(
            "{} {} ({}, auth: {})",
            request.method,
            request.path,
            request.class.as_str(),
            auth.is_authenticated()
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = auth.token() {
            builder = builder.header(request.class.auth_header(), token.expose_secret());
        }

        if let Some(ref body) = request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| envelope::error_message(&body))
                .unwrap_or_else(|| i18n::http_error(status.as_u16(), self.locale));
            tracing::warn!("{} {} failed with {}", request.method, request.path, status);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            let raw = String::from_utf8_lossy(&bytes);
            tracing::debug!("undecodable body from {}: {}", request.path, truncate_str(&raw, 200));
            ApiError::Decode(e.to_string())
        })?;
        envelope::unwrap_envelope(body, self.locale)
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_builder() {
            return ApiError::InvalidRequest(err.to_string());
        }
        tracing::warn!("Gateway unreachable: {}", err);
        ApiError::Transport {
            message: Message::ConnectionError.text(self.locale).to_string(),
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::Method;
    use serde_json::json;

    fn client(url: &str) -> GatewayClient {
        GatewayClient::new(url).unwrap().with_locale(Locale::En)
    }

    #[tokio::test]
    async fn test_admin_route_uses_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/users")
            .match_header("Authorization", "adm-token-123")
            .match_header("token", Matcher::Missing)
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"[{"id": "1", "name": "alpha"}]"#)
            .create_async()
            .await;

        let api = client(&server.url());
        api.set_token("adm-token-123");
        let users = api
            .send(ApiRequest::admin(Method::GET, "/admin/users"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(users[0]["name"], "alpha");
    }

    #[tokio::test]
    async fn test_tenant_route_uses_token_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/session/status")
            .match_header("token", "inst-token-456")
            .match_header("Authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"code": 200, "success": true, "data": {"connected": true}}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        api.set_token("inst-token-456");
        let status = api
            .send(ApiRequest::tenant(Method::GET, "/session/status"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(status, json!({"connected": true}));
    }

    #[tokio::test]
    async fn test_no_token_sends_no_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header("token", Matcher::Missing)
            .match_header("Authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        api.send(ApiRequest::tenant(Method::GET, "/health"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_uses_body_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("DELETE", "/admin/users/9")
            .with_status(404)
            .with_body(r#"{"message": "user not found"}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        let err = api
            .execute(ApiRequest::admin(Method::DELETE, "/admin/users/9"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "user not found");
    }

    #[tokio::test]
    async fn test_http_error_without_json_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/qr")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let api = client(&server.url());
        let err = api
            .send(ApiRequest::tenant(Method::GET, "/session/qr"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn test_failed_envelope_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/session/connect")
            .with_status(200)
            .with_body(r#"{"code": 500, "success": false, "error": "already connected"}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        let err = api
            .execute(ApiRequest::tenant(Method::POST, "/session/connect"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Envelope(_)));
        assert_eq!(err.to_string(), "already connected");
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/session/disconnect")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let api = client(&server.url());
        let value = api
            .send(ApiRequest::tenant(Method::POST, "/session/disconnect"))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/webhook")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let api = client(&server.url());
        let err = api
            .send(ApiRequest::tenant(Method::GET, "/webhook"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_translated() {
        // Nothing listens on port 1.
        let api = GatewayClient::new("http://127.0.0.1:1")
            .unwrap()
            .with_locale(Locale::Pt);
        let err = api
            .send(ApiRequest::tenant(Method::GET, "/session/status"))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(
            err.to_string(),
            Message::ConnectionError.text(Locale::Pt)
        );
        assert!(!err.to_string().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_token_read_at_dispatch_time() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/session/status")
            .match_header("token", "second")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = client(&server.url());
        api.set_token("first");
        let request = ApiRequest::tenant(Method::GET, "/session/status");
        api.set_token("second");
        api.send(request).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_clones_share_token_but_with_auth_does_not() {
        let api = client("http://localhost");
        let shared = api.clone();
        api.set_token("shared-token");
        assert_eq!(
            shared.token().map(|t| t.expose_secret().to_string()),
            Some("shared-token".to_string())
        );

        let scoped = api.with_auth(AuthContext::with_token("scoped-token"));
        api.clear_token();
        assert!(shared.token().is_none());
        assert_eq!(
            scoped.token().map(|t| t.expose_secret().to_string()),
            Some("scoped-token".to_string())
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = client("https://api.example.com/");
        assert_eq!(api.url("/health"), "https://api.example.com/health");
    }
}
