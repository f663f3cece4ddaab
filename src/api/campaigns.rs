//! Campaign endpoints (`/campaigns`)
//!
//! Served by a companion service behind the same base URL; authenticated with
//! the instance token like every other non-admin route.

use super::client::GatewayClient;
use super::error::Result;
use super::route::ApiRequest;
use super::types::{Campaign, CampaignStats};
use reqwest::Method;

fn campaign_path(id: &str) -> String {
    format!("/campaigns/{}", urlencoding::encode(id))
}

impl GatewayClient {
    pub async fn campaigns(&self) -> Result<Vec<Campaign>> {
        self.call(ApiRequest::tenant(Method::GET, "/campaigns"))
            .await
    }

    pub async fn campaign(&self, id: &str) -> Result<Campaign> {
        self.call(ApiRequest::tenant(Method::GET, campaign_path(id)))
            .await
    }

    pub async fn create_campaign(&self, campaign: &Campaign) -> Result<Campaign> {
        self.call(ApiRequest::tenant(Method::POST, "/campaigns").json(campaign)?)
            .await
    }

    pub async fn update_campaign(&self, id: &str, campaign: &Campaign) -> Result<Campaign> {
        self.call(ApiRequest::tenant(Method::PUT, campaign_path(id)).json(campaign)?)
            .await
    }

    pub async fn delete_campaign(&self, id: &str) -> Result<()> {
        self.execute(ApiRequest::tenant(Method::DELETE, campaign_path(id)))
            .await
    }

    pub async fn start_campaign(&self, id: &str) -> Result<()> {
        let path = format!("{}/start", campaign_path(id));
        self.execute(ApiRequest::tenant(Method::POST, path)).await
    }

    pub async fn pause_campaign(&self, id: &str) -> Result<()> {
        let path = format!("{}/pause", campaign_path(id));
        self.execute(ApiRequest::tenant(Method::POST, path)).await
    }

    pub async fn campaign_stats(&self, id: &str) -> Result<CampaignStats> {
        let path = format!("{}/stats", campaign_path(id));
        self.call(ApiRequest::tenant(Method::GET, path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{CampaignKind, CampaignState};

    #[tokio::test]
    async fn test_list_campaigns() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/campaigns")
            .with_status(200)
            .with_body(
                r#"[{"id": "c1", "name": "Black Friday", "type": "drip", "status": "running",
                     "schedule": {"type": "immediate", "timezone": "America/Sao_Paulo"}}]"#,
            )
            .create_async()
            .await;

        let api = GatewayClient::new(server.url()).unwrap();
        let campaigns = api.campaigns().await.unwrap();
        assert_eq!(campaigns[0].kind, CampaignKind::Drip);
        assert_eq!(campaigns[0].status, CampaignState::Running);
        assert_eq!(campaigns[0].schedule.timezone, "America/Sao_Paulo");
    }

    #[tokio::test]
    async fn test_campaign_stats() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/campaigns/c-42/stats")
            .with_status(200)
            .with_body(r#"{"campaign_id": "c-42", "messages_sent": 10, "success_rate": 0.9}"#)
            .create_async()
            .await;

        let api = GatewayClient::new(server.url()).unwrap();
        let stats = api.campaign_stats("c-42").await.unwrap();
        mock.assert_async().await;
        assert_eq!(stats.messages_sent, 10);
    }
}
