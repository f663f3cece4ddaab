//! Route access gate
//!
//! Decides, from the path and the `auth-token` / `user-type` cookies alone,
//! whether a console page request proceeds, bypasses the gate, or is
//! redirected. No token is validated here; an expired token is only found
//! out when the API rejects it.

pub mod server;

use crate::auth::{CookiePair, Role};
use crate::i18n::Locale;

/// Who is asking, as far as the cookies tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    AuthenticatedInstance,
    AuthenticatedAdmin,
}

impl GateState {
    /// A token cookie with any `user-type` other than `admin` counts as an
    /// instance operator.
    pub fn from_cookies(cookies: &CookiePair) -> Self {
        match (&cookies.token, cookies.role()) {
            (None, _) => GateState::Unauthenticated,
            (Some(_), Some(Role::Admin)) => GateState::AuthenticatedAdmin,
            (Some(_), _) => GateState::AuthenticatedInstance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Static assets and API calls: not gated, not localized.
    Bypass,
    /// Render the page in `locale`.
    Proceed { locale: Locale, state: GateState },
    /// Send the browser elsewhere (307).
    Redirect { location: String },
}

/// Unprefixed shortcuts kept from the old console URLs.
const CONVENIENCE_REDIRECTS: [(&str, &str); 3] = [
    ("/dashboard", "/pt/dashboard"),
    ("/admin", "/pt/admin/dashboard"),
    ("/login", "/pt/auth/login"),
];

pub fn is_bypassed(path: &str) -> bool {
    path.starts_with("/api")
        || path.starts_with("/_next")
        || path.contains('.')
        || path == "/favicon.ico"
}

pub fn is_protected(path: &str) -> bool {
    path.contains("/admin") || path.contains("/instance")
}

pub fn is_admin_path(path: &str) -> bool {
    path.contains("/admin")
}

/// Locale named by the first path segment, if it is one we support.
pub fn path_locale(path: &str) -> Option<Locale> {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .and_then(Locale::from_segment)
}

/// Locale of a path, falling back to the default.
pub fn resolve_locale(path: &str) -> Locale {
    path_locale(path).unwrap_or_default()
}

pub fn login_path(locale: Locale) -> String {
    format!("/{}/auth/login", locale)
}

/// Gate one page request.
pub fn evaluate(path: &str, cookies: &CookiePair) -> GateDecision {
    if is_bypassed(path) {
        return GateDecision::Bypass;
    }

    if let Some((_, target)) = CONVENIENCE_REDIRECTS.iter().find(|(from, _)| *from == path) {
        return GateDecision::Redirect {
            location: target.to_string(),
        };
    }

    let locale = resolve_locale(path);
    let state = GateState::from_cookies(cookies);

    if is_protected(path) && state == GateState::Unauthenticated {
        return GateDecision::Redirect {
            location: login_path(locale),
        };
    }

    if is_admin_path(path) && state != GateState::AuthenticatedAdmin {
        return GateDecision::Redirect {
            location: login_path(locale),
        };
    }

    if path_locale(path).is_none() {
        let rest = if path == "/" { "" } else { path };
        return GateDecision::Redirect {
            location: format!("/{}{}", locale, rest),
        };
    }

    GateDecision::Proceed { locale, state }
}
