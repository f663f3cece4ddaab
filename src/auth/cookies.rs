//! The `auth-token` / `user-type` cookie pair
//!
//! The console server gates routes purely on these two cookies. The CLI keeps
//! a [`CookieJar`] mirror so it can present the same pair to the server.

use super::credential::{Credential, Role};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

pub const AUTH_TOKEN_COOKIE: &str = "auth-token";
pub const USER_TYPE_COOKIE: &str = "user-type";

/// Seven days.
pub const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// `Set-Cookie` value for one cookie, path `/`.
pub fn set_cookie(name: &str, value: &str, max_age_secs: u64) -> String {
    let value = urlencoding::encode(value);
    format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

/// `Set-Cookie` value that expires a cookie immediately.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; SameSite=Lax; Max-Age=0")
}

/// Both `Set-Cookie` values for a credential.
pub fn credential_cookies(credential: &Credential, max_age_secs: u64) -> [String; 2] {
    [
        set_cookie(
            AUTH_TOKEN_COOKIE,
            credential.token.expose_secret(),
            max_age_secs,
        ),
        set_cookie(USER_TYPE_COOKIE, credential.role.as_str(), max_age_secs),
    ]
}

/// Both `Set-Cookie` values clearing the pair.
pub fn clear_credential_cookies() -> [String; 2] {
    [clear_cookie(AUTH_TOKEN_COOKIE), clear_cookie(USER_TYPE_COOKIE)]
}

/// Find a cookie in a raw `Cookie:` header. Empty values count as absent.
pub fn cookie_value(raw: &str, name: &str) -> Option<String> {
    for part in raw.split(';') {
        let mut pieces = part.trim().splitn(2, '=');
        let key = pieces.next()?.trim();
        let value = pieces.next().unwrap_or_default().trim();

        if key == name {
            if value.is_empty() {
                return None;
            }
            return Some(
                urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string()),
            );
        }
    }

    None
}

/// Find a cookie across all `Cookie` headers of a request.
pub fn extract_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|raw| raw.to_str().ok())
        .find_map(|raw| cookie_value(raw, name))
}

/// Token and role cookies as seen on a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookiePair {
    pub token: Option<String>,
    pub user_type: Option<String>,
}

impl CookiePair {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            token: extract_cookie_value(headers, AUTH_TOKEN_COOKIE),
            user_type: extract_cookie_value(headers, USER_TYPE_COOKIE),
        }
    }

    /// Role named by `user-type`, when recognised.
    pub fn role(&self) -> Option<Role> {
        self.user_type.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JarEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Client-side cookie mirror with max-age expiry.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: BTreeMap<String, JarEntry>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie. A zero max-age removes it.
    pub fn set(&mut self, name: &str, value: &str, max_age_secs: u64) {
        self.set_at(name, value, max_age_secs, Utc::now());
    }

    fn set_at(&mut self, name: &str, value: &str, max_age_secs: u64, now: DateTime<Utc>) {
        if max_age_secs == 0 {
            self.entries.remove(name);
            return;
        }
        let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
        let expires_at = now
            .checked_add_signed(Duration::seconds(max_age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            name.to_string(),
            JarEntry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, Utc::now())
    }

    fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<&str> {
        self.entries
            .get(name)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.as_str())
    }

    /// Mirror a credential into the pair.
    pub fn store_credential(&mut self, credential: &Credential, max_age_secs: u64) {
        self.set(
            AUTH_TOKEN_COOKIE,
            credential.token.expose_secret(),
            max_age_secs,
        );
        self.set(USER_TYPE_COOKIE, credential.role.as_str(), max_age_secs);
    }

    pub fn clear_credential(&mut self) {
        self.remove(AUTH_TOKEN_COOKIE);
        self.remove(USER_TYPE_COOKIE);
    }

    /// Live cookies formatted for a `Cookie:` request header.
    pub fn header_value(&self) -> Option<String> {
        let now = Utc::now();
        let parts: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(name, entry)| format!("{}={}", name, urlencoding::encode(&entry.value)))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}
