//! Locales and user-facing messages
//!
//! The console speaks English, Portuguese and Spanish. Only the handful of
//! fixed messages produced by the library live here; everything else is
//! plain output of the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported console locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Pt,
    Es,
}

/// All supported locales, in URL-prefix order.
pub const LOCALES: [Locale; 3] = [Locale::En, Locale::Pt, Locale::Es];

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pt => "pt",
            Locale::Es => "es",
        }
    }

    /// Parse a path segment into a supported locale.
    pub fn from_segment(segment: &str) -> Option<Self> {
        LOCALES.into_iter().find(|l| l.as_str() == segment)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segment(&s.trim().to_lowercase())
            .ok_or_else(|| format!("Unsupported locale: {} (expected en, pt or es)", s))
    }
}

/// Fixed messages surfaced to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// The request never reached the API (offline, DNS, TLS, refused).
    ConnectionError,
    /// Envelope with `success: false` and no `error` text.
    RequestFailed,
    /// Operation needs a logged-in operator.
    NotAuthenticated,
    /// The API rejected the token.
    TokenInvalid,
}

impl Message {
    pub fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Message::ConnectionError, Locale::En) => {
                "Connection error: check that the API is reachable or whether there are CORS problems"
            }
            (Message::ConnectionError, Locale::Pt) => {
                "Erro de conexão: Verifique se a API está acessível ou se há problemas de CORS"
            }
            (Message::ConnectionError, Locale::Es) => {
                "Error de conexión: verifique que la API sea accesible o si hay problemas de CORS"
            }
            (Message::RequestFailed, Locale::En) => "API request failed",
            (Message::RequestFailed, Locale::Pt) => "Falha na requisição à API",
            (Message::RequestFailed, Locale::Es) => "La solicitud a la API falló",
            (Message::NotAuthenticated, Locale::En) => "User not authenticated",
            (Message::NotAuthenticated, Locale::Pt) => "Usuário não autenticado",
            (Message::NotAuthenticated, Locale::Es) => "Usuario no autenticado",
            (Message::TokenInvalid, Locale::En) => "Token invalid or expired",
            (Message::TokenInvalid, Locale::Pt) => "Token inválido ou expirado",
            (Message::TokenInvalid, Locale::Es) => "Token inválido o caducado",
        }
    }
}

/// Generic message for an HTTP error status without a parseable body.
pub fn http_error(status: u16, locale: Locale) -> String {
    match locale {
        Locale::En => format!("HTTP error! status: {}", status),
        Locale::Pt => format!("Erro HTTP! status: {}", status),
        Locale::Es => format!("¡Error HTTP! estado: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_is_portuguese() {
        assert_eq!(Locale::default(), Locale::Pt);
    }

    #[test]
    fn test_from_segment() {
        assert_eq!(Locale::from_segment("en"), Some(Locale::En));
        assert_eq!(Locale::from_segment("es"), Some(Locale::Es));
        assert_eq!(Locale::from_segment("fr"), None);
        assert_eq!(Locale::from_segment("admin"), None);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("PT".parse::<Locale>().unwrap(), Locale::Pt);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_connection_error_is_translated() {
        let en = Message::ConnectionError.text(Locale::En);
        let pt = Message::ConnectionError.text(Locale::Pt);
        assert_ne!(en, pt);
        assert!(pt.starts_with("Erro de conexão"));
    }

    #[test]
    fn test_http_error_contains_status() {
        assert!(http_error(502, Locale::En).contains("502"));
        assert!(http_error(404, Locale::Pt).contains("404"));
    }
}
