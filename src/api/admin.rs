//! Administrative endpoints (`/admin/...`)

use super::client::GatewayClient;
use super::error::Result;
use super::route::ApiRequest;
use super::types::{AdminDashboardStats, NewInstance, UserInstance};
use reqwest::Method;
use serde_json::Value;

fn user_path(id: &str) -> String {
    format!("/admin/users/{}", urlencoding::encode(id))
}

impl GatewayClient {
    /// `GET /admin/users`
    pub async fn get_users(&self) -> Result<Vec<UserInstance>> {
        self.call(ApiRequest::admin(Method::GET, "/admin/users"))
            .await
    }

    /// `GET /admin/users/{id}`
    pub async fn get_user(&self, id: &str) -> Result<UserInstance> {
        self.call(ApiRequest::admin(Method::GET, user_path(id))).await
    }

    /// `POST /admin/users`
    pub async fn create_user(&self, instance: &NewInstance) -> Result<UserInstance> {
        self.call(ApiRequest::admin(Method::POST, "/admin/users").json(instance)?)
            .await
    }

    /// `DELETE /admin/users/{id}`: removes the record, keeps gateway data.
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.execute(ApiRequest::admin(Method::DELETE, user_path(id)))
            .await
    }

    /// `DELETE /admin/users/{id}/full`: removes the record and everything
    /// stored for it.
    pub async fn delete_user_full(&self, id: &str) -> Result<()> {
        let path = format!("{}/full", user_path(id));
        self.execute(ApiRequest::admin(Method::DELETE, path)).await
    }

    pub async fn global_stats(&self) -> Result<Value> {
        self.send(ApiRequest::admin(Method::GET, "/admin/global/stats"))
            .await
    }

    /// Dashboard numbers. Never fails: an unreachable or rejecting API
    /// yields zeroed stats and a warning in the log.
    pub async fn admin_dashboard_stats(&self) -> AdminDashboardStats {
        match self.global_stats().await {
            Ok(stats) => AdminDashboardStats::from_stats(&stats),
            Err(e) => {
                tracing::warn!("Failed to fetch admin stats: {}", e);
                AdminDashboardStats::default()
            }
        }
    }

    pub async fn test_global_systems(&self) -> Result<Value> {
        self.send(ApiRequest::admin(Method::POST, "/admin/global/test"))
            .await
    }

    pub async fn global_config(&self) -> Result<Value> {
        self.send(ApiRequest::admin(Method::GET, "/admin/global/config"))
            .await
    }

    pub async fn reload_global_config(&self) -> Result<Value> {
        self.send(ApiRequest::admin(
            Method::POST,
            "/admin/global/config/reload",
        ))
        .await
    }

    pub async fn send_global_test_event(&self, event: &Value) -> Result<Value> {
        self.send(ApiRequest::admin(Method::POST, "/admin/global/event/test").body(event.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::SystemHealth;
    use crate::i18n::Locale;
    use mockito::Matcher;

    fn client(url: &str) -> GatewayClient {
        let api = GatewayClient::new(url).unwrap().with_locale(Locale::En);
        api.set_token("admin-secret");
        api
    }

    #[tokio::test]
    async fn test_get_users_decodes_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/users")
            .match_header("Authorization", "admin-secret")
            .with_status(200)
            .with_body(
                r#"{"code": 200, "success": true, "data": [
                    {"id": "1", "name": "alpha", "connected": true, "loggedIn": true},
                    {"id": "2", "name": "beta"}
                ]}"#,
            )
            .create_async()
            .await;

        let users = client(&server.url()).get_users().await.unwrap();
        mock.assert_async().await;
        assert_eq!(users.len(), 2);
        assert!(users[0].logged_in);
        assert!(!users[1].connected);
    }

    #[tokio::test]
    async fn test_create_user_posts_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/admin/users")
            .match_body(Matcher::PartialJsonString(
                r#"{"name": "loja-centro", "webhook": ""}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"id": "77", "name": "loja-centro", "token": "generated"}"#)
            .create_async()
            .await;

        let created = client(&server.url())
            .create_user(&NewInstance {
                name: "loja-centro".to_string(),
                webhook: Some(String::new()),
                ..Default::default()
            })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(created.id, "77");
    }

    #[tokio::test]
    async fn test_delete_user_full_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/admin/users/42/full")
            .with_status(200)
            .with_body(r#"{"code": 200, "success": true}"#)
            .create_async()
            .await;

        client(&server.url()).delete_user_full("42").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dashboard_stats_default_on_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/admin/global/stats")
            .with_status(500)
            .with_body(r#"{"error": "db down"}"#)
            .create_async()
            .await;

        let stats = client(&server.url()).admin_dashboard_stats().await;
        assert_eq!(stats, AdminDashboardStats::default());
        assert_eq!(stats.system_health, SystemHealth::Healthy);
    }

    #[tokio::test]
    async fn test_dashboard_stats_maps_fields() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/admin/global/stats")
            .with_status(200)
            .with_body(
                r#"{"total_instances": 5, "active_instances": 3, "messages_last_day": 900,
                    "recent_activity": [{"id": "a1", "type": "instance_created", "description": "x", "timestamp": "t"}]}"#,
            )
            .create_async()
            .await;

        let stats = client(&server.url()).admin_dashboard_stats().await;
        assert_eq!(stats.total_instances, 5);
        assert_eq!(stats.messages_last_day, 900);
        assert_eq!(stats.recent_activity[0].kind, "instance_created");
    }
}
