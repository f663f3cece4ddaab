//! Chat, contact, status and call endpoints

use super::client::GatewayClient;
use super::error::{ApiError, Result};
use super::route::ApiRequest;
use super::types::{
    CallReject, ChatPresence, ContactInfo, MediaKind, MessagePayload, MessageResponse, TextStatus,
    UserAvatar, UserCheck, UserPresence,
};
use crate::settings::validation;
use reqwest::Method;
use serde_json::{Value, json};

/// Drop `null` members so optional arguments are omitted from the body.
fn compact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}

fn post(path: impl Into<String>, body: Value) -> ApiRequest {
    ApiRequest::tenant(Method::POST, path).body(compact(body))
}

impl GatewayClient {
    /// `POST /chat/send/text`
    pub async fn send_text(&self, payload: &MessagePayload) -> Result<MessageResponse> {
        validation::validate_message(payload)?;
        self.call(ApiRequest::tenant(Method::POST, "/chat/send/text").json(payload)?)
            .await
    }

    /// Send a base64 or URL media item. Documents use `caption` as file name.
    pub async fn send_media(
        &self,
        kind: MediaKind,
        phone: &str,
        media: &str,
        caption: Option<&str>,
    ) -> Result<MessageResponse> {
        let mut body = json!({ "phone": phone });
        body[kind.as_str()] = Value::String(media.to_string());
        match kind {
            MediaKind::Image | MediaKind::Video => body["caption"] = json!(caption),
            MediaKind::Document => body["filename"] = json!(caption),
            MediaKind::Audio => {}
        }
        let path = format!("/chat/send/{}", kind.as_str());
        self.call(post(path, body)).await
    }

    pub async fn send_location(
        &self,
        phone: &str,
        latitude: f64,
        longitude: f64,
        name: Option<&str>,
    ) -> Result<MessageResponse> {
        validation::validate_location(latitude, longitude)?;
        let body = json!({
            "phone": phone,
            "latitude": latitude,
            "longitude": longitude,
            "name": name,
        });
        self.call(post("/chat/send/location", body)).await
    }

    pub async fn send_poll(
        &self,
        phone: &str,
        question: &str,
        options: &[String],
    ) -> Result<MessageResponse> {
        validation::validate_poll(question, options)?;
        let body = json!({
            "phone": phone,
            "poll_name": question,
            "poll_options": options,
        });
        self.call(post("/chat/send/poll", body)).await
    }

    pub async fn delete_message(&self, phone: &str, message_id: &str) -> Result<()> {
        self.execute(post("/chat/delete", json!({"phone": phone, "id": message_id})))
            .await
    }

    pub async fn react_to_message(&self, phone: &str, message_id: &str, emoji: &str) -> Result<()> {
        let body = json!({"phone": phone, "id": message_id, "emoji": emoji});
        self.execute(post("/chat/react", body)).await
    }

    pub async fn mark_read(&self, phone: &str) -> Result<()> {
        self.execute(post("/chat/markread", json!({"phone": phone})))
            .await
    }

    pub async fn send_chat_presence(&self, phone: &str, presence: ChatPresence) -> Result<()> {
        let body = json!({"phone": phone, "presence": presence});
        self.execute(post("/chat/presence", body)).await
    }

    // --- users -------------------------------------------------------------

    pub async fn contacts(&self) -> Result<Vec<ContactInfo>> {
        self.call(ApiRequest::tenant(Method::GET, "/user/contacts"))
            .await
    }

    pub async fn user_info(&self, phone: &str) -> Result<ContactInfo> {
        self.call(post("/user/info", json!({"phone": phone}))).await
    }

    /// Which of `phones` have a WhatsApp account.
    pub async fn check_users(&self, phones: &[String]) -> Result<Vec<UserCheck>> {
        self.call(post("/user/check", json!({"phones": phones})))
            .await
    }

    pub async fn user_avatar(&self, phone: &str, preview: bool) -> Result<UserAvatar> {
        self.call(post("/user/avatar", json!({"Phone": phone, "Preview": preview})))
            .await
    }

    pub async fn set_user_presence(&self, presence: UserPresence) -> Result<()> {
        self.execute(post("/user/presence", json!({"presence": presence})))
            .await
    }

    // --- status ------------------------------------------------------------

    pub async fn send_text_status(&self, status: &TextStatus) -> Result<()> {
        validation::validate_text_status(status)?;
        self.execute(ApiRequest::tenant(Method::POST, "/status/send/text").json(status)?)
            .await
    }

    /// Image, video or audio status. Audio ignores `caption`.
    pub async fn send_media_status(
        &self,
        kind: MediaKind,
        media: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        let mut body = json!({});
        body[kind.as_str()] = Value::String(media.to_string());
        match kind {
            MediaKind::Image | MediaKind::Video => body["caption"] = json!(caption),
            MediaKind::Audio => {}
            MediaKind::Document => {
                return Err(ApiError::InvalidRequest(
                    "documents cannot be posted as status".to_string(),
                ));
            }
        }
        let path = format!("/status/send/{}", kind.as_str());
        self.execute(post(path, body)).await
    }

    // --- calls -------------------------------------------------------------

    pub async fn reject_call(&self, reject: &CallReject) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/call/reject/send").json(reject)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::CallRejectType;
    use mockito::Matcher;

    fn client(url: &str) -> GatewayClient {
        let api = GatewayClient::new(url).unwrap();
        api.set_token("inst-tok");
        api
    }

    #[test]
    fn test_compact_drops_nulls() {
        let body = compact(json!({"phone": "1", "caption": null, "n": 0}));
        assert_eq!(body, json!({"phone": "1", "n": 0}));
    }

    #[tokio::test]
    async fn test_send_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/send/text")
            .match_header("token", "inst-tok")
            .match_body(Matcher::Json(json!({"phone": "5511999990000", "body": "Olá"})))
            .with_status(200)
            .with_body(
                r#"{"code": 200, "success": true, "data": {"id": "3EB0", "timestamp": "1700000000", "status": "sent"}}"#,
            )
            .create_async()
            .await;

        let sent = client(&server.url())
            .send_text(&MessagePayload::text("5511999990000", "Olá"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(sent.id, "3EB0");
        assert_eq!(sent.status, "sent");
    }

    #[tokio::test]
    async fn test_send_image_omits_missing_caption() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/send/image")
            .match_body(Matcher::Json(json!({"phone": "5511999990000", "image": "data:image/png;base64,AAAA"})))
            .with_status(200)
            .with_body(r#"{"id": "1"}"#)
            .create_async()
            .await;

        client(&server.url())
            .send_media(
                MediaKind::Image,
                "5511999990000",
                "data:image/png;base64,AAAA",
                None,
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_poll_uses_wire_names() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/send/poll")
            .match_body(Matcher::PartialJson(json!({
                "poll_name": "Pizza?",
                "poll_options": ["sim", "não"]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server.url())
            .send_poll("5511999990000", "Pizza?", &["sim".to_string(), "não".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_location_range_checked_locally() {
        let err = client("http://127.0.0.1:1")
            .send_location("5511999990000", 91.0, 0.0, None)
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert!(errors.has("latitude")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_text_is_never_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/send/text")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server.url())
            .send_text(&MessagePayload::text("12ab", ""))
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.has("phone"));
                assert!(errors.has("body"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_text_status_validated_before_send() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/status/send/text")
            .expect(0)
            .create_async()
            .await;

        let status = TextStatus {
            text: "Promoção".to_string(),
            background_color: Some("red".to_string()),
            text_color: None,
            font: None,
        };
        let err = client(&server.url())
            .send_text_status(&status)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reject_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/call/reject/send")
            .match_body(Matcher::Json(json!({
                "call_id": "c1",
                "call_from": "5511@s.whatsapp.net",
                "reject_type": "unavailable"
            })))
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        client(&server.url())
            .reject_call(&CallReject {
                call_id: "c1".to_string(),
                call_from: "5511@s.whatsapp.net".to_string(),
                reject_type: CallRejectType::Unavailable,
                message: None,
            })
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
