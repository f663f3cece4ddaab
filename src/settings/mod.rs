//! Instance settings: the local draft, its validation, and pushing it to the
//! API.

pub mod draft;
pub mod validation;

pub use draft::{
    GeneralSettings, InstanceSettingsDraft, SessionActions, SettingsForm, SettingsSection,
    SettingsTab,
};
pub use validation::ValidationErrors;

use crate::api::{ConnectRequest, GatewayClient, WebhookConfig};
use crate::error::Result;

/// Split a comma separated event list, dropping blanks.
pub fn split_events(events: &str) -> Vec<String> {
    events
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate the draft and push every section that differs from its
/// baseline, then run the requested session actions. A renamed instance is
/// rejected before any request. On success the draft
/// is committed; on failure it is left untouched so it can be retried.
pub async fn apply_draft(client: &GatewayClient, draft: &mut InstanceSettingsDraft) -> Result<()> {
    validation::validate_draft(draft)?;

    let form = draft.form().clone();
    let baseline = draft.baseline().clone();

    // The gateway has no endpoint for renaming an instance.
    if form.general.name != baseline.general.name {
        let mut errors = ValidationErrors::new();
        errors.add("general.name", "cannot be changed from instance settings");
        return Err(errors.into());
    }

    if form.general.webhook != baseline.general.webhook
        || form.general.events != baseline.general.events
    {
        let config = WebhookConfig {
            webhook: form.general.webhook.clone(),
            events: split_events(&form.general.events),
        };
        if config.webhook.is_empty() {
            client.delete_webhook().await?;
        } else {
            client.set_webhook(&config).await?;
        }
    }

    if form.proxy != baseline.proxy {
        let url = if form.proxy.enabled {
            form.proxy.proxy_url.as_str()
        } else {
            ""
        };
        client.set_proxy(url).await?;
    }

    if form.s3 != baseline.s3 {
        if form.s3.enabled {
            client.set_s3_config(&form.s3).await?;
        } else if baseline.s3.enabled {
            client.delete_s3_config().await?;
        }
    }

    if form.rabbitmq != baseline.rabbitmq {
        if form.rabbitmq.enabled {
            client.set_rabbitmq_config(&form.rabbitmq).await?;
        } else if baseline.rabbitmq.enabled {
            client.delete_rabbitmq_config().await?;
        }
    }

    if form.skips != baseline.skips {
        client.apply_skip_settings(&form.skips).await?;
    }

    let session = form.session;
    if session.logout {
        client.logout_session().await?;
    } else if session.disconnect {
        client.disconnect_session().await?;
    } else if session.connect {
        client.connect_session(&ConnectRequest::default()).await?;
    }

    draft.commit();
    tracing::info!("Applied settings draft");
    Ok(())
}
