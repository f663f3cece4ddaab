//! Client-side form constraints
//!
//! Every validator collects all violations instead of stopping at the first
//! one, keyed by field path (`s3.bucket`, `options[2]`). A form that fails
//! validation is never sent.

use super::draft::{GeneralSettings, InstanceSettingsDraft};
use crate::api::{
    MessagePayload, ProxyConfig, RabbitMqConfig, S3Config, SkipSettings, TextStatus,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

static PHONE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\+?\d{10,15}$").ok());
static PROXY_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(socks5|http|https)://.+").ok());
static AMQP_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^amqp://.+").ok());
static COLOR_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").ok());

pub const MEDIA_DELIVERY: &[&str] = &["base64", "s3", "both"];
pub const EXCHANGE_TYPES: &[&str] = &["topic", "direct", "fanout", "headers"];
pub const QUEUE_TYPES: &[&str] = &["classic", "quorum", "stream"];
pub const CALL_REJECT_TYPES: &[&str] = &["busy", "declined", "unavailable"];

/// Per-field validation failures.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{}", summarize(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

fn summarize(fields: &BTreeMap<String, Vec<String>>) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect();
    format!("Invalid input ({})", parts.join("; "))
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Fold another form's errors in under `prefix.`.
    pub fn merge(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.fields {
            let key = if prefix.is_empty() {
                field
            } else {
                format!("{}.{}", prefix, field)
            };
            self.fields.entry(key).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.add(field, "is required");
            } else {
                self.add(field, format!("must be at least {} characters", min));
            }
        } else if len > max {
            self.add(field, format!("must be at most {} characters", max));
        }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    fn optional_url(&mut self, field: &str, value: &str) {
        if !value.is_empty() && reqwest::Url::parse(value).is_err() {
            self.add(field, "must be a valid URL");
        }
    }

    fn pattern(&mut self, field: &str, value: &str, re: &Lazy<Option<Regex>>, message: &str) {
        if !matches(re, value) {
            self.add(field, message);
        }
    }

    fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.add(field, format!("must be one of: {}", allowed.join(", ")));
        }
    }

    fn range<T: PartialOrd + std::fmt::Display>(&mut self, field: &str, value: T, min: T, max: T) {
        if value < min || value > max {
            self.add(field, format!("must be between {} and {}", min, max));
        }
    }
}

fn matches(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

/// `+5511999999999` style number: optional `+`, 10 to 15 digits.
pub fn is_phone(value: &str) -> bool {
    matches(&PHONE_RE, value)
}

// ---------------------------------------------------------------------------
// Authentication and pairing
// ---------------------------------------------------------------------------

pub fn validate_login(token: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("token", token, 1, usize::MAX);
    errors.into_result()
}

/// Phone number for code pairing: 10 to 15 characters, digits only.
pub fn validate_pair_phone(phone: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("phone", phone, 10, 15);
    if !phone.is_empty() && !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.add("phone", "must contain digits only");
    }
    errors.into_result()
}

// ---------------------------------------------------------------------------
// Instance settings sections
// ---------------------------------------------------------------------------

pub fn validate_general(general: &GeneralSettings) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("name", &general.name, 1, 50);
    errors.optional_url("webhook", &general.webhook);
    errors.length("events", &general.events, 1, usize::MAX);
    errors.into_result()
}

/// A webhook URL set on its own, outside the settings form.
pub fn validate_webhook(url: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("webhook", url);
    errors.optional_url("webhook", url);
    errors.into_result()
}

pub fn validate_proxy(proxy: &ProxyConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !proxy.proxy_url.is_empty() {
        errors.pattern(
            "proxy_url",
            &proxy.proxy_url,
            &PROXY_RE,
            "must start with socks5://, http:// or https://",
        );
    }
    if proxy.enabled {
        errors.required("proxy_url", &proxy.proxy_url);
    }
    errors.into_result()
}

pub fn validate_s3(s3: &S3Config) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.optional_url("endpoint", &s3.endpoint);
    errors.optional_url("public_url", &s3.public_url);
    errors.one_of("media_delivery", &s3.media_delivery, MEDIA_DELIVERY);
    errors.range("retention_days", s3.retention_days, 1, 365);

    if s3.enabled {
        errors.required("endpoint", &s3.endpoint);
        errors.required("region", &s3.region);
        errors.required("bucket", &s3.bucket);
        errors.required("access_key", &s3.access_key);
        errors.required("secret_key", &s3.secret_key);
    }
    errors.into_result()
}

pub fn validate_rabbitmq(rabbitmq: &RabbitMqConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !rabbitmq.url.is_empty() {
        errors.pattern("url", &rabbitmq.url, &AMQP_RE, "must start with amqp://");
    }
    errors.one_of("exchange_type", &rabbitmq.exchange_type, EXCHANGE_TYPES);
    errors.one_of("queue_type", &rabbitmq.queue_type, QUEUE_TYPES);
    errors.length("events", &rabbitmq.events, 1, usize::MAX);
    errors.range("delivery_mode", rabbitmq.delivery_mode, 1, 2);

    if rabbitmq.enabled {
        errors.required("url", &rabbitmq.url);
        errors.required("exchange", &rabbitmq.exchange);
        errors.required("queue", &rabbitmq.queue);
        errors.required("routing_key", &rabbitmq.routing_key);
    }
    errors.into_result()
}

pub fn validate_skips(skips: &SkipSettings) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("call_reject_message", &skips.call_reject_message, 0, 200);
    errors.one_of("call_reject_type", &skips.call_reject_type, CALL_REJECT_TYPES);
    errors.into_result()
}

/// Every section of a draft, with errors prefixed by section name.
pub fn validate_draft(draft: &InstanceSettingsDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let form = draft.form();
    let sections = [
        ("general", validate_general(&form.general)),
        ("proxy", validate_proxy(&form.proxy)),
        ("s3", validate_s3(&form.s3)),
        ("rabbitmq", validate_rabbitmq(&form.rabbitmq)),
        ("skips", validate_skips(&form.skips)),
    ];
    for (section, result) in sections {
        if let Err(e) = result {
            errors.merge(section, e);
        }
    }
    errors.into_result()
}

// ---------------------------------------------------------------------------
// Messaging payloads
// ---------------------------------------------------------------------------

pub fn validate_message(message: &MessagePayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.pattern(
        "phone",
        &message.phone,
        &PHONE_RE,
        "must be a phone number with 10 to 15 digits",
    );
    errors.length("body", message.body.as_deref().unwrap_or_default(), 1, usize::MAX);
    errors.into_result()
}

pub fn validate_group(name: &str, participants: &[String]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("name", name, 1, 25);
    if participants.is_empty() {
        errors.add("participants", "at least one participant is required");
    }
    for (i, phone) in participants.iter().enumerate() {
        if !is_phone(phone) {
            errors.add(
                format!("participants[{}]", i),
                "must be a phone number with 10 to 15 digits",
            );
        }
    }
    errors.into_result()
}

pub fn validate_newsletter(name: &str, description: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("name", name, 1, 100);
    errors.length("description", description, 1, 500);
    errors.into_result()
}

pub fn validate_text_status(status: &TextStatus) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("text", &status.text, 1, 139);
    for (field, color) in [
        ("background_color", &status.background_color),
        ("text_color", &status.text_color),
    ] {
        if let Some(color) = color {
            errors.pattern(field, color, &COLOR_RE, "must be a #RRGGBB color");
        }
    }
    if let Some(font) = status.font {
        errors.range("font", font, 0, 5);
    }
    errors.into_result()
}

pub fn validate_poll(question: &str, options: &[String]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.length("question", question, 1, 256);
    if options.len() < 2 || options.len() > 12 {
        errors.add("options", "a poll needs between 2 and 12 options");
    }
    for (i, option) in options.iter().enumerate() {
        errors.length(&format!("options[{}]", i), option, 1, 100);
    }
    errors.into_result()
}

pub fn validate_location(latitude: f64, longitude: f64) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.range("latitude", latitude, -90.0, 90.0);
    errors.range("longitude", longitude, -180.0, 180.0);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_token() {
        assert!(validate_login("abc").is_ok());
        let err = validate_login("").unwrap_err();
        assert_eq!(err.get("token"), Some(&["is required".to_string()][..]));
    }

    #[test]
    fn test_pair_phone() {
        assert!(validate_pair_phone("5511999999999").is_ok());
        assert!(validate_pair_phone("123").is_err());
        assert!(validate_pair_phone("+5511999999999").is_err());
        assert!(validate_pair_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_general_section() {
        let ok = GeneralSettings {
            name: "Loja".to_string(),
            webhook: String::new(),
            events: "Message".to_string(),
        };
        assert!(validate_general(&ok).is_ok());

        let bad = GeneralSettings {
            name: "x".repeat(51),
            webhook: "not a url".to_string(),
            events: String::new(),
        };
        let err = validate_general(&bad).unwrap_err();
        assert!(err.has("name"));
        assert!(err.has("webhook"));
        assert!(err.has("events"));
    }

    #[test]
    fn test_proxy_scheme() {
        let mut proxy = ProxyConfig::default();
        assert!(validate_proxy(&proxy).is_ok());
        proxy.proxy_url = "socks5://10.0.0.1:1080".to_string();
        assert!(validate_proxy(&proxy).is_ok());
        proxy.proxy_url = "ftp://10.0.0.1".to_string();
        assert!(validate_proxy(&proxy).is_err());
    }

    #[test]
    fn test_s3_required_when_enabled() {
        let mut s3 = S3Config {
            media_delivery: "both".to_string(),
            retention_days: 30,
            ..Default::default()
        };
        assert!(validate_s3(&s3).is_ok());

        s3.enabled = true;
        let err = validate_s3(&s3).unwrap_err();
        for field in ["endpoint", "region", "bucket", "access_key", "secret_key"] {
            assert!(err.has(field), "missing error for {}", field);
        }

        s3.retention_days = 400;
        s3.media_delivery = "ftp".to_string();
        let err = validate_s3(&s3).unwrap_err();
        assert!(err.has("retention_days"));
        assert!(err.has("media_delivery"));
    }

    #[test]
    fn test_rabbitmq_rules() {
        let mut rabbitmq = RabbitMqConfig {
            exchange_type: "topic".to_string(),
            queue_type: "classic".to_string(),
            events: "All".to_string(),
            durable: true,
            delivery_mode: 2,
            ..Default::default()
        };
        assert!(validate_rabbitmq(&rabbitmq).is_ok());

        rabbitmq.url = "http://broker".to_string();
        rabbitmq.delivery_mode = 3;
        let err = validate_rabbitmq(&rabbitmq).unwrap_err();
        assert!(err.has("url"));
        assert!(err.has("delivery_mode"));
    }

    #[test]
    fn test_message_and_group() {
        assert!(validate_message(&MessagePayload::text("+5511999999999", "oi")).is_ok());
        let err = validate_message(&MessagePayload::text("12ab", "")).unwrap_err();
        assert_eq!(err.len(), 2);

        let err = validate_group("", &["5511999999999".to_string(), "bad".to_string()])
            .unwrap_err();
        assert!(err.has("name"));
        assert!(err.has("participants[1]"));
        assert!(!err.has("participants[0]"));
    }

    #[test]
    fn test_status_poll_location() {
        let status = TextStatus {
            text: "hello".to_string(),
            background_color: Some("#00FF00".to_string()),
            text_color: Some("green".to_string()),
            font: Some(7),
        };
        let err = validate_text_status(&status).unwrap_err();
        assert!(err.has("text_color"));
        assert!(err.has("font"));
        assert!(!err.has("background_color"));

        assert!(validate_poll("Lunch?", &["Yes".to_string()]).is_err());
        assert!(validate_poll("Lunch?", &["Yes".to_string(), "No".to_string()]).is_ok());

        assert!(validate_location(-23.5, -46.6).is_ok());
        assert!(validate_location(91.0, 0.0).is_err());
    }

    #[test]
    fn test_display_and_merge() {
        let mut errors = ValidationErrors::new();
        let mut inner = ValidationErrors::new();
        inner.add("bucket", "is required");
        errors.merge("s3", inner);
        assert!(errors.has("s3.bucket"));
        assert_eq!(errors.to_string(), "Invalid input (s3.bucket: is required)");
    }
}
