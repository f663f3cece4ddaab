//! Response envelope unwrapping
//!
//! Some gateway endpoints answer `{code, success, data, error}`, others answer
//! the bare payload. Both are normalized here.

use super::error::{ApiError, Result};
use crate::i18n::{Locale, Message};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// True when `body` is an object carrying both `code` and `success` keys.
pub fn is_envelope(body: &Value) -> bool {
    body.as_object()
        .is_some_and(|obj| obj.contains_key("code") && obj.contains_key("success"))
}

/// Unwrap an enveloped body or pass a bare body through unchanged.
///
/// `success` is judged by truthiness, so `0`, `""` and `null` count as failure.
pub fn unwrap_envelope(body: Value, locale: Locale) -> Result<Value> {
    if !is_envelope(&body) {
        return Ok(body);
    }

    let Value::Object(mut obj) = body else {
        return Err(ApiError::Decode("envelope is not an object".to_string()));
    };

    let success = obj.get("success").is_some_and(is_truthy);
    if !success {
        let message = obj
            .get("error")
            .filter(|v| is_truthy(v))
            .map(value_text)
            .unwrap_or_else(|| Message::RequestFailed.text(locale).to_string());
        return Err(ApiError::Envelope(message));
    }

    Ok(obj.remove("data").unwrap_or(Value::Null))
}

/// Extract the operator-facing message of an error body, if any.
///
/// Prefers `error`, then `message`; empty strings are skipped.
pub fn error_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find(|v| is_truthy(v))
        .map(value_text)
}

/// Decode an unwrapped payload into a typed result.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_unwraps_data() {
        let body = json!({"code": 200, "success": true, "data": {"Connected": true}});
        let data = unwrap_envelope(body, Locale::En).unwrap();
        assert_eq!(data, json!({"Connected": true}));
    }

    #[test]
    fn test_success_envelope_without_data_is_null() {
        let body = json!({"code": 200, "success": true});
        assert_eq!(unwrap_envelope(body, Locale::En).unwrap(), Value::Null);
    }

    #[test]
    fn test_failed_envelope_uses_error_field() {
        let body = json!({"code": 400, "success": false, "error": "no session"});
        let err = unwrap_envelope(body, Locale::En).unwrap_err();
        assert_eq!(err.to_string(), "no session");
    }

    #[test]
    fn test_failed_envelope_falls_back() {
        let body = json!({"code": 500, "success": false});
        let err = unwrap_envelope(body, Locale::En).unwrap_err();
        assert_eq!(err.to_string(), "API request failed");

        let body = json!({"code": 500, "success": false, "error": ""});
        let err = unwrap_envelope(body, Locale::Pt).unwrap_err();
        assert_eq!(err.to_string(), Message::RequestFailed.text(Locale::Pt));
    }

    #[test]
    fn test_bare_payloads_pass_through() {
        let bare = json!({"status": "ok"});
        assert_eq!(unwrap_envelope(bare.clone(), Locale::En).unwrap(), bare);

        let only_code = json!({"code": 200, "data": 1});
        assert_eq!(unwrap_envelope(only_code.clone(), Locale::En).unwrap(), only_code);

        let list = json!([{"id": "1"}]);
        assert_eq!(unwrap_envelope(list.clone(), Locale::En).unwrap(), list);
    }

    #[test]
    fn test_error_message_prefers_error_then_message() {
        assert_eq!(
            error_message(&json!({"error": "bad token", "message": "x"})),
            Some("bad token".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": "", "message": "denied"})),
            Some("denied".to_string())
        );
        assert_eq!(error_message(&json!({"detail": "x"})), None);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z ]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_success_envelope_returns_data(code in any::<u16>(), data in scalar()) {
            let body = json!({"code": code, "success": true, "data": data.clone()});
            prop_assert_eq!(unwrap_envelope(body, Locale::En).unwrap(), data);
        }

        #[test]
        fn prop_failed_envelope_errors(code in any::<u16>(), error in "[a-z]{1,16}") {
            let body = json!({"code": code, "success": false, "error": error.clone()});
            let err = unwrap_envelope(body, Locale::En).unwrap_err();
            prop_assert_eq!(err.to_string(), error);
        }

        #[test]
        fn prop_non_envelope_is_identity(
            key in "[a-z]{1,8}".prop_filter("not an envelope key", |k| k != "code" && k != "success"),
            value in scalar(),
            has_code in any::<bool>(),
        ) {
            let mut obj = serde_json::Map::new();
            obj.insert(key, value);
            if has_code {
                obj.insert("code".to_string(), json!(200));
            } else {
                obj.insert("success".to_string(), json!(true));
            }
            let body = Value::Object(obj);
            prop_assert_eq!(unwrap_envelope(body.clone(), Locale::En).unwrap(), body);
        }
    }
}
