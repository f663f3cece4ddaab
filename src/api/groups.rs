//! Group and newsletter endpoints

use super::client::GatewayClient;
use super::error::Result;
use super::route::ApiRequest;
use super::types::{GroupInfo, NewsletterInfo, ParticipantAction};
use crate::settings::validation;
use reqwest::Method;
use serde_json::json;

impl GatewayClient {
    pub async fn groups(&self) -> Result<Vec<GroupInfo>> {
        self.call(ApiRequest::tenant(Method::GET, "/group/list"))
            .await
    }

    pub async fn group_info(&self, jid: &str) -> Result<GroupInfo> {
        let request = ApiRequest::tenant(Method::POST, "/group/info").body(json!({"jid": jid}));
        self.call(request).await
    }

    pub async fn create_group(&self, name: &str, participants: &[String]) -> Result<GroupInfo> {
        validation::validate_group(name, participants)?;
        let request = ApiRequest::tenant(Method::POST, "/group/create")
            .body(json!({"name": name, "participants": participants}));
        self.call(request).await
    }

    pub async fn leave_group(&self, jid: &str) -> Result<()> {
        let request = ApiRequest::tenant(Method::POST, "/group/leave").body(json!({"jid": jid}));
        self.execute(request).await
    }

    pub async fn update_group_participants(
        &self,
        jid: &str,
        participants: &[String],
        action: ParticipantAction,
    ) -> Result<()> {
        let request = ApiRequest::tenant(Method::POST, "/group/updateparticipants").body(json!({
            "jid": jid,
            "participants": participants,
            "action": action,
        }));
        self.execute(request).await
    }

    // --- newsletters -------------------------------------------------------

    pub async fn newsletters(&self) -> Result<Vec<NewsletterInfo>> {
        self.call(ApiRequest::tenant(Method::GET, "/newsletter/list"))
            .await
    }

    pub async fn newsletter_info(&self, jid: &str) -> Result<NewsletterInfo> {
        let request =
            ApiRequest::tenant(Method::POST, "/newsletter/info").body(json!({"jid": jid}));
        self.call(request).await
    }

    pub async fn create_newsletter(&self, name: &str, description: &str) -> Result<NewsletterInfo> {
        validation::validate_newsletter(name, description)?;
        let request = ApiRequest::tenant(Method::POST, "/newsletter/create")
            .body(json!({"name": name, "description": description}));
        self.call(request).await
    }

    pub async fn follow_newsletter(&self, jid: &str) -> Result<()> {
        let request =
            ApiRequest::tenant(Method::POST, "/newsletter/follow").body(json!({"jid": jid}));
        self.execute(request).await
    }

    pub async fn unfollow_newsletter(&self, jid: &str) -> Result<()> {
        let request =
            ApiRequest::tenant(Method::POST, "/newsletter/unfollow").body(json!({"jid": jid}));
        self.execute(request).await
    }

    pub async fn mute_newsletter(&self, jid: &str, mute: bool) -> Result<()> {
        let request = ApiRequest::tenant(Method::POST, "/newsletter/mute")
            .body(json!({"jid": jid, "mute": mute}));
        self.execute(request).await
    }
}
