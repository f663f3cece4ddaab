//! Route classification and request description
//!
//! The gateway authenticates administrators and instances with different
//! header shapes, so every request carries an explicit [`RouteClass`].

use super::error::{ApiError, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Path prefix of administrative endpoints.
pub const ADMIN_PREFIX: &str = "/admin/";

/// Header carrying the instance token on tenant routes.
pub const TOKEN_HEADER: &str = "token";

/// Which auth scheme a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// `Authorization: <token>`
    Admin,
    /// `token: <token>`
    Tenant,
}

impl RouteClass {
    /// Classify a raw path. Only used for untyped requests; the façade names
    /// the class explicitly.
    pub fn of_path(path: &str) -> Self {
        if path.starts_with(ADMIN_PREFIX) {
            RouteClass::Admin
        } else {
            RouteClass::Tenant
        }
    }

    /// Name of the header the credential goes into.
    pub fn auth_header(self) -> &'static str {
        match self {
            RouteClass::Admin => "Authorization",
            RouteClass::Tenant => TOKEN_HEADER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteClass::Admin => "admin",
            RouteClass::Tenant => "tenant",
        }
    }
}

/// One call against the gateway: verb, path, class, optional JSON body and
/// extra headers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub class: RouteClass,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Request whose class is derived from the path prefix.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let class = RouteClass::of_path(&path);
        Self::with_class(method, path, class)
    }

    pub fn admin(method: Method, path: impl Into<String>) -> Self {
        Self::with_class(method, path.into(), RouteClass::Admin)
    }

    pub fn tenant(method: Method, path: impl Into<String>) -> Self {
        Self::with_class(method, path.into(), RouteClass::Tenant)
    }

    fn with_class(method: Method, path: String, class: RouteClass) -> Self {
        Self {
            method,
            path,
            class,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach an already built JSON value.
    pub fn body(mut self, value: Value) -> Self {
        self.body = Some(value);
        self
    }

    /// Add an extra header. Auth headers are always set by the dispatcher.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
