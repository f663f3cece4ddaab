//! Tenant session endpoints: lifecycle, pairing, delivery settings, filters
//!
//! All of these authenticate with the instance token (`token` header).

use super::client::GatewayClient;
use super::error::{ApiError, Result};
use super::route::ApiRequest;
use super::types::{
    ConnectRequest, ConnectionTest, HealthStatus, PairPhoneRequest, PairPhoneResponse,
    ProxyRequest, QrCode, RabbitMqConfig, S3Config, SessionStatus, SkipCallsConfig, SkipFilter,
    SkipSettings, WebhookConfig,
};
use reqwest::Method;
use serde_json::{Map, Value};

impl GatewayClient {
    // --- lifecycle ---------------------------------------------------------

    /// `GET /session/status`
    pub async fn session_status(&self) -> Result<SessionStatus> {
        self.call(ApiRequest::tenant(Method::GET, "/session/status"))
            .await
    }

    /// `POST /session/connect`
    pub async fn connect_session(&self, request: &ConnectRequest) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/session/connect").json(request)?)
            .await
    }

    pub async fn disconnect_session(&self) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/session/disconnect"))
            .await
    }

    /// Unlinks the device; a new pairing is needed afterwards.
    pub async fn logout_session(&self) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/session/logout"))
            .await
    }

    pub async fn qr_code(&self) -> Result<QrCode> {
        self.call(ApiRequest::tenant(Method::GET, "/session/qr"))
            .await
    }

    /// Request a linking code for phone-number pairing.
    pub async fn pair_phone(&self, phone: &str) -> Result<PairPhoneResponse> {
        let body = PairPhoneRequest {
            phone: phone.to_string(),
        };
        self.call(ApiRequest::tenant(Method::POST, "/session/pairphone").json(&body)?)
            .await
    }

    pub async fn set_proxy(&self, proxy_url: &str) -> Result<()> {
        let body = ProxyRequest {
            proxy_url: proxy_url.to_string(),
        };
        self.execute(ApiRequest::tenant(Method::POST, "/session/proxy").json(&body)?)
            .await
    }

    // --- webhook -----------------------------------------------------------

    pub async fn get_webhook(&self) -> Result<WebhookConfig> {
        self.call(ApiRequest::tenant(Method::GET, "/webhook")).await
    }

    pub async fn set_webhook(&self, config: &WebhookConfig) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/webhook").json(config)?)
            .await
    }

    pub async fn update_webhook(&self, config: &WebhookConfig) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::PUT, "/webhook").json(config)?)
            .await
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::DELETE, "/webhook"))
            .await
    }

    // --- S3 ----------------------------------------------------------------

    pub async fn get_s3_config(&self) -> Result<S3Config> {
        self.call(ApiRequest::tenant(Method::GET, "/session/s3/config"))
            .await
    }

    pub async fn set_s3_config(&self, config: &S3Config) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, "/session/s3/config").json(config)?)
            .await
    }

    pub async fn delete_s3_config(&self) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::DELETE, "/session/s3/config"))
            .await
    }

    pub async fn test_s3_connection(&self) -> Result<ConnectionTest> {
        self.call(ApiRequest::tenant(Method::POST, "/session/s3/test"))
            .await
    }

    // --- RabbitMQ ----------------------------------------------------------

    pub async fn get_rabbitmq_config(&self) -> Result<RabbitMqConfig> {
        self.call(ApiRequest::tenant(Method::GET, "/session/rabbitmq/config"))
            .await
    }

    pub async fn set_rabbitmq_config(&self, config: &RabbitMqConfig) -> Result<()> {
        self.execute(
            ApiRequest::tenant(Method::POST, "/session/rabbitmq/config").json(config)?,
        )
        .await
    }

    pub async fn delete_rabbitmq_config(&self) -> Result<()> {
        self.execute(ApiRequest::tenant(
            Method::DELETE,
            "/session/rabbitmq/config",
        ))
        .await
    }

    pub async fn test_rabbitmq_connection(&self) -> Result<ConnectionTest> {
        self.call(ApiRequest::tenant(Method::POST, "/session/rabbitmq/test"))
            .await
    }

    // --- skip filters ------------------------------------------------------

    /// Current state of one filter.
    pub async fn get_skip(&self, filter: SkipFilter) -> Result<bool> {
        let value = self
            .send(ApiRequest::tenant(Method::GET, filter.path()))
            .await?;
        match value.get(filter.key()) {
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(Value::Null) | None => Ok(false),
            Some(other) => Err(ApiError::Decode(format!(
                "{} is not a boolean: {}",
                filter.key(),
                other
            ))),
        }
    }

    /// Toggle one filter. For [`SkipFilter::Calls`] use
    /// [`GatewayClient::set_skip_calls`] to also send the rejection policy.
    pub async fn set_skip(&self, filter: SkipFilter, enabled: bool) -> Result<()> {
        if filter == SkipFilter::Calls {
            return self
                .set_skip_calls(&SkipCallsConfig {
                    skip_calls: enabled,
                    ..Default::default()
                })
                .await;
        }
        let mut body = Map::new();
        body.insert(filter.key().to_string(), Value::Bool(enabled));
        self.execute(ApiRequest::tenant(Method::POST, filter.path()).body(Value::Object(body)))
            .await
    }

    /// Call filter plus its rejection policy.
    pub async fn get_skip_calls(&self) -> Result<SkipSettings> {
        self.call(ApiRequest::tenant(Method::GET, SkipFilter::Calls.path()))
            .await
    }

    pub async fn set_skip_calls(&self, config: &SkipCallsConfig) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::POST, SkipFilter::Calls.path()).json(config)?)
            .await
    }

    /// Push all six filters, one request each, stopping at the first error.
    pub async fn apply_skip_settings(&self, skips: &SkipSettings) -> Result<()> {
        for filter in SkipFilter::ALL {
            if filter == SkipFilter::Calls {
                let reject_type = skips.call_reject_type.parse().ok();
                let message = Some(skips.call_reject_message.clone()).filter(|m| !m.is_empty());
                self.set_skip_calls(&SkipCallsConfig {
                    skip_calls: skips.skip_calls,
                    call_reject_message: message,
                    call_reject_type: reject_type,
                })
                .await?;
            } else {
                self.set_skip(filter, filter.get(skips)).await?;
            }
        }
        Ok(())
    }

    // --- health ------------------------------------------------------------

    /// `GET /health`; works without a credential.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.call(ApiRequest::tenant(Method::GET, "/health")).await
    }
}
