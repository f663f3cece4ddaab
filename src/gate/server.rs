//! Console HTTP server
//!
//! Serves the gated console pages as JSON views, the cookie login/logout
//! endpoints, and (in development) the same-origin `/api/*` rewrite to the
//! remote API. Every request authenticates from its own cookies; nothing is
//! shared between requests but the HTTP pool.

use super::{GateDecision, GateState, evaluate, login_path};
use crate::api::{AuthContext, GatewayClient, RouteClass};
use crate::api::route::TOKEN_HEADER;
use crate::auth::cookies::{
    DEFAULT_MAX_AGE_SECS, clear_credential_cookies, credential_cookies,
};
use crate::auth::{CookiePair, Credential, Role};
use crate::error::ConsoleError;
use crate::i18n::{Locale, Message};
use crate::settings::validation;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Extension, Request, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::{any, get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct ConsoleState {
    client: GatewayClient,
    cookie_max_age: u64,
    rewrite_api: bool,
}

impl ConsoleState {
    /// `client` must not carry a token of its own; each request gets a
    /// handle with the credential from its cookies.
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client,
            cookie_max_age: DEFAULT_MAX_AGE_SECS,
            rewrite_api: false,
        }
    }

    pub fn with_cookie_max_age(mut self, secs: u64) -> Self {
        self.cookie_max_age = secs;
        self
    }

    /// Forward `/api/*` to the remote API (development mode).
    pub fn with_api_rewrite(mut self, enabled: bool) -> Self {
        self.rewrite_api = enabled;
        self
    }

    fn client_for(&self, headers: &HeaderMap) -> GatewayClient {
        let cookies = CookiePair::from_headers(headers);
        let ctx = match cookies.token {
            Some(token) => AuthContext::with_token(token),
            None => AuthContext::anonymous(),
        };
        self.client.with_auth(ctx)
    }

    fn locale(&self) -> Locale {
        self.client.locale()
    }
}

pub fn router(state: ConsoleState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/*rest", any(api_rewrite))
        .route("/:locale", get(locale_home))
        .route("/:locale/dashboard", get(dashboard))
        .route("/:locale/auth/login", get(login_page))
        .route("/:locale/admin/dashboard", get(admin_dashboard))
        .route("/:locale/instance/dashboard", get(instance_dashboard))
        .with_state(state)
        .layer(middleware::from_fn(route_gate))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Bind and serve until `shutdown` fires.
pub async fn serve(
    state: ConsoleState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind console server to {}", addr))?;
    tracing::info!("Console listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Console server failed")?;

    tracing::info!("Console server stopped");
    Ok(())
}

async fn route_gate(mut request: Request, next: Next) -> Response {
    let cookies = CookiePair::from_headers(request.headers());
    match evaluate(request.uri().path(), &cookies) {
        GateDecision::Bypass => next.run(request).await,
        GateDecision::Redirect { location } => {
            let location = match request.uri().query() {
                Some(query) if !location.ends_with("/auth/login") => {
                    format!("{}?{}", location, query)
                }
                _ => location,
            };
            tracing::debug!("Gate: {} -> {}", request.uri().path(), location);
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Proceed { locale, state } => {
            request.extensions_mut().insert(locale);
            request.extensions_mut().insert(state);
            next.run(request).await
        }
    }
}

fn error_response(status: StatusCode, error: &ConsoleError) -> Response {
    (status, Json(error.to_json())).into_response()
}

fn append_set_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("Dropping unencodable cookie: {}", e),
    }
}

fn status_for(error: &ConsoleError) -> StatusCode {
    match error {
        ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
        ConsoleError::Api(e) if e.is_transport() => StatusCode::BAD_GATEWAY,
        ConsoleError::Api(e) if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
        ConsoleError::Api(_) => StatusCode::BAD_GATEWAY,
        ConsoleError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
        ConsoleError::WrongRole { .. } => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginForm {
    token: String,
    #[serde(rename = "type")]
    role: Role,
}

async fn login(State(state): State<ConsoleState>, Json(form): Json<LoginForm>) -> Response {
    if let Err(e) = validation::validate_login(&form.token) {
        return error_response(StatusCode::BAD_REQUEST, &ConsoleError::from(e));
    }

    let credential = Credential::new(form.token, form.role);
    let api = state
        .client
        .with_auth(AuthContext::with_token(credential.token.clone()));
    let validated = match credential.role {
        Role::Admin => api.get_users().await.map(|_| None),
        Role::Instance => api.session_status().await.map(Some),
    };

    match validated {
        Ok(user) => {
            tracing::info!("Console login as {} ({})", credential.role, credential.token.masked());
            let mut response = Json(json!({
                "success": true,
                "type": credential.role,
                "user": user,
            }))
            .into_response();
            for cookie in credential_cookies(&credential, state.cookie_max_age) {
                append_set_cookie(&mut response, &cookie);
            }
            response
        }
        Err(e) => {
            let error = ConsoleError::from(e);
            tracing::warn!("Console login as {} rejected: {}", credential.role, error);
            let status = match status_for(&error) {
                StatusCode::BAD_GATEWAY => StatusCode::BAD_GATEWAY,
                _ => StatusCode::UNAUTHORIZED,
            };
            error_response(status, &error)
        }
    }
}

async fn logout() -> Response {
    let mut response = Json(json!({ "success": true })).into_response();
    for cookie in clear_credential_cookies() {
        append_set_cookie(&mut response, &cookie);
    }
    response
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

async fn locale_home(Extension(locale): Extension<Locale>) -> Redirect {
    Redirect::temporary(&format!("/{}/dashboard", locale))
}

async fn dashboard(
    Extension(locale): Extension<Locale>,
    Extension(gate): Extension<GateState>,
) -> Redirect {
    let target = match gate {
        GateState::AuthenticatedAdmin => format!("/{}/admin/dashboard", locale),
        GateState::AuthenticatedInstance => format!("/{}/instance/dashboard", locale),
        GateState::Unauthenticated => login_path(locale),
    };
    Redirect::temporary(&target)
}

async fn login_page(
    Extension(locale): Extension<Locale>,
    Extension(gate): Extension<GateState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "page": "login",
        "locale": locale,
        "authenticated": gate != GateState::Unauthenticated,
    }))
}

async fn admin_dashboard(
    State(state): State<ConsoleState>,
    Extension(locale): Extension<Locale>,
    headers: HeaderMap,
) -> Response {
    let stats = state.client_for(&headers).admin_dashboard_stats().await;
    Json(json!({
        "page": "admin/dashboard",
        "locale": locale,
        "stats": stats,
    }))
    .into_response()
}

async fn instance_dashboard(
    State(state): State<ConsoleState>,
    Extension(locale): Extension<Locale>,
    headers: HeaderMap,
) -> Response {
    match state.client_for(&headers).session_status().await {
        Ok(status) => Json(json!({
            "page": "instance/dashboard",
            "locale": locale,
            "state": status.state_label(),
            "status": status,
        }))
        .into_response(),
        Err(e) => {
            let error = ConsoleError::from(e);
            error_response(status_for(&error), &error)
        }
    }
}

// ---------------------------------------------------------------------------
// Same-origin API rewrite
// ---------------------------------------------------------------------------

async fn api_rewrite(
    State(state): State<ConsoleState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.rewrite_api {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response();
    }

    let path = uri.path().strip_prefix("/api").unwrap_or(uri.path());
    let target = match uri.query() {
        Some(query) => format!("{}?{}", state.client.url(path), query),
        None => state.client.url(path),
    };

    let mut request = state.client.http().request(method.clone(), &target).body(body);
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        request = request.header(CONTENT_TYPE, content_type);
    }

    let explicit: Vec<_> = ["authorization", TOKEN_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name).map(|value| (name, value.clone())))
        .collect();
    if explicit.is_empty() {
        if let Some(token) = CookiePair::from_headers(&headers).token {
            request = request.header(RouteClass::of_path(path).auth_header(), token);
        }
    } else {
        for (name, value) in explicit {
            request = request.header(name, value);
        }
    }

    tracing::debug!("Rewrite {} {} -> {}", method, uri.path(), target);
    match request.send().await {
        Ok(upstream) => {
            let status = upstream.status();
            let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
            match upstream.bytes().await {
                Ok(bytes) => {
                    let mut response = (status, bytes).into_response();
                    if let Some(content_type) = content_type {
                        response.headers_mut().insert(CONTENT_TYPE, content_type);
                    }
                    response
                }
                Err(e) => {
                    tracing::warn!("Rewrite of {} failed reading body: {}", target, e);
                    bad_gateway(state.locale())
                }
            }
        }
        Err(e) => {
            tracing::warn!("Rewrite of {} failed: {}", target, e);
            bad_gateway(state.locale())
        }
    }
}

fn bad_gateway(locale: Locale) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": Message::ConnectionError.text(locale) })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::header::{COOKIE, LOCATION};
    use http_body_util::BodyExt;
    use mockito::Matcher;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(url: &str) -> Router {
        let client = GatewayClient::new(url).unwrap().with_locale(Locale::En);
        router(ConsoleState::new(client).with_api_rewrite(true))
    }

    async fn read_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_unauthenticated_admin_page_redirects() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get("/en/admin/dashboard", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/en/auth/login");
    }

    #[tokio::test]
    async fn test_instance_cookie_on_admin_page_redirects() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get(
                "/es/admin/dashboard",
                Some("auth-token=inst; user-type=instance"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/es/auth/login");
    }

    #[tokio::test]
    async fn test_dashboard_routes_by_role() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get("/pt/dashboard", Some("auth-token=t; user-type=admin")))
            .await
            .unwrap();
        assert_eq!(location(&response), "/pt/admin/dashboard");

        let response = app("http://127.0.0.1:1")
            .oneshot(get("/", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/pt");
    }

    #[tokio::test]
    async fn test_login_sets_cookie_pair() {
        let mut server = mockito::Server::new_async().await;
        let users = server
            .mock("GET", "/admin/users")
            .match_header("authorization", "adm-secret")
            .with_status(200)
            .with_body(r#"{"code": 200, "success": true, "data": []}"#)
            .create_async()
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"token": "adm-secret", "type": "admin"}"#))
            .unwrap();
        let response = app(&server.url()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("auth-token=adm-secret;"));
        assert!(cookies[1].starts_with("user-type=admin;"));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=604800")));
        users.assert_async().await;

        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["type"], "admin");
    }

    #[tokio::test]
    async fn test_rejected_login_sets_no_cookies() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .with_status(401)
            .with_body(r#"{"error": "invalid token"}"#)
            .create_async()
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"token": "nope", "type": "instance"}"#))
            .unwrap();
        let response = app(&server.url()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        let body = read_json(response).await;
        assert_eq!(body["error"], "invalid token");
    }

    #[tokio::test]
    async fn test_logout_expires_cookies() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();
        let response = app("http://127.0.0.1:1").oneshot(request).await.unwrap();
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_admin_dashboard_uses_cookie_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/admin/global/stats")
            .match_header("authorization", "adm")
            .with_status(200)
            .with_body(r#"{"total_instances": 12, "active_instances": 9}"#)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(get("/en/admin/dashboard", Some("auth-token=adm; user-type=admin")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["stats"]["total_instances"], 12);
        assert_eq!(body["stats"]["active_instances"], 9);
        assert_eq!(body["locale"], "en");
    }

    #[tokio::test]
    async fn test_api_rewrite_injects_tenant_header() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .match_header("token", "inst")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code": 200, "success": true, "data": {"connected": true}}"#)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(get("/api/session/status", Some("auth-token=inst; user-type=instance")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["connected"], true);
    }

    #[tokio::test]
    async fn test_api_rewrite_disabled_in_production() {
        let client = GatewayClient::new("http://127.0.0.1:1").unwrap();
        let app = router(ConsoleState::new(client));
        let response = app.oneshot(get("/api/session/status", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
