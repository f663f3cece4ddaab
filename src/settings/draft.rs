//! Instance settings draft
//!
//! The locally edited copy of an instance's settings. The draft remembers the
//! snapshot it was last loaded from; it has unsaved changes exactly when the
//! form differs from that snapshot.

use crate::api::{ProxyConfig, RabbitMqConfig, S3Config, SessionStatus, SkipSettings};
use crate::storage::{KvStore, SETTINGS_NAMESPACE, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub name: String,
    pub webhook: String,
    pub events: String,
}

/// Lifecycle actions to run when the draft is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionActions {
    pub connect: bool,
    pub disconnect: bool,
    pub logout: bool,
}

/// All sections of the settings form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub general: GeneralSettings,
    pub session: SessionActions,
    pub proxy: ProxyConfig,
    pub s3: S3Config,
    pub rabbitmq: RabbitMqConfig,
    pub skips: SkipSettings,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            session: SessionActions::default(),
            proxy: ProxyConfig::default(),
            s3: default_s3(),
            rabbitmq: default_rabbitmq(),
            skips: default_skips(),
        }
    }
}

fn default_s3() -> S3Config {
    S3Config {
        region: "us-east-1".to_string(),
        media_delivery: "both".to_string(),
        retention_days: 30,
        ..Default::default()
    }
}

fn default_rabbitmq() -> RabbitMqConfig {
    RabbitMqConfig {
        exchange_type: "topic".to_string(),
        queue_type: "classic".to_string(),
        events: "All".to_string(),
        durable: true,
        delivery_mode: 2,
        ..Default::default()
    }
}

fn default_skips() -> SkipSettings {
    SkipSettings {
        call_reject_type: "busy".to_string(),
        ..Default::default()
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// One replacement section for [`InstanceSettingsDraft::update_section`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsSection {
    General(GeneralSettings),
    Session(SessionActions),
    Proxy(ProxyConfig),
    S3(S3Config),
    RabbitMq(RabbitMqConfig),
    Skips(SkipSettings),
}

/// The tabs of the settings form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsTab {
    #[default]
    General,
    Session,
    Proxy,
    S3,
    Rabbitmq,
    Skips,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 6] = [
        SettingsTab::General,
        SettingsTab::Session,
        SettingsTab::Proxy,
        SettingsTab::S3,
        SettingsTab::Rabbitmq,
        SettingsTab::Skips,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsTab::General => "general",
            SettingsTab::Session => "session",
            SettingsTab::Proxy => "proxy",
            SettingsTab::S3 => "s3",
            SettingsTab::Rabbitmq => "rabbitmq",
            SettingsTab::Skips => "skips",
        }
    }
}

impl fmt::Display for SettingsTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingsTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| format!("Unknown settings tab: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceSettingsDraft {
    form_data: SettingsForm,
    baseline: SettingsForm,
    active_tab: SettingsTab,
}

impl InstanceSettingsDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form_data
    }

    pub fn baseline(&self) -> &SettingsForm {
        &self.baseline
    }

    pub fn active_tab(&self) -> SettingsTab {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, tab: SettingsTab) {
        self.active_tab = tab;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.form_data != self.baseline
    }

    /// Replace one section of the form.
    pub fn update_section(&mut self, section: SettingsSection) {
        let form = &mut self.form_data;
        match section {
            SettingsSection::General(general) => form.general = general,
            SettingsSection::Session(session) => form.session = session,
            SettingsSection::Proxy(proxy) => form.proxy = proxy,
            SettingsSection::S3(s3) => form.s3 = s3,
            SettingsSection::RabbitMq(rabbitmq) => form.rabbitmq = rabbitmq,
            SettingsSection::Skips(skips) => form.skips = skips,
        }
    }

    /// Set one field by dotted path (`s3.bucket`, `skips.skip_calls`).
    ///
    /// The value is taken as JSON when it parses as such (`true`, `30`),
    /// otherwise as a plain string.
    pub fn set_field(&mut self, path: &str, raw: &str) -> Result<(), String> {
        let mut form = serde_json::to_value(&self.form_data).map_err(|e| e.to_string())?;
        let pointer = format!("/{}", path.replace('.', "/"));
        let slot = form
            .pointer_mut(&pointer)
            .filter(|slot| !slot.is_object())
            .ok_or_else(|| format!("Unknown settings field: {}", path))?;

        let value = match &*slot {
            Value::String(_) => Value::String(raw.to_string()),
            _ => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        *slot = value;

        self.form_data = serde_json::from_value(form)
            .map_err(|e| format!("Invalid value for {}: {}", path, e))?;
        Ok(())
    }

    /// Load the form from a session status snapshot; the snapshot becomes
    /// the new baseline.
    pub fn load_from_status(&mut self, status: &SessionStatus) {
        let proxy = if status.proxy_config.proxy_url.is_empty() && !status.proxy_url.is_empty() {
            ProxyConfig {
                enabled: true,
                proxy_url: status.proxy_url.clone(),
            }
        } else {
            status.proxy_config.clone()
        };

        let defaults_s3 = default_s3();
        let mut s3 = status.s3_config.clone();
        s3.region = or_default(s3.region, &defaults_s3.region);
        s3.media_delivery = or_default(s3.media_delivery, &defaults_s3.media_delivery);
        if s3.retention_days == 0 {
            s3.retention_days = defaults_s3.retention_days;
        }

        let defaults_mq = default_rabbitmq();
        let mut rabbitmq = status.rabbitmq_config.clone();
        rabbitmq.exchange_type = or_default(rabbitmq.exchange_type, &defaults_mq.exchange_type);
        rabbitmq.queue_type = or_default(rabbitmq.queue_type, &defaults_mq.queue_type);
        rabbitmq.events = or_default(rabbitmq.events, &defaults_mq.events);
        if rabbitmq.delivery_mode == 0 {
            rabbitmq.delivery_mode = defaults_mq.delivery_mode;
        }

        let mut skips = status.skips.clone();
        skips.call_reject_type = or_default(skips.call_reject_type, "busy");

        let form = SettingsForm {
            general: GeneralSettings {
                name: status.name.clone(),
                webhook: status.webhook.clone(),
                events: status.events.clone(),
            },
            session: SessionActions::default(),
            proxy,
            s3,
            rabbitmq,
            skips,
        };

        self.baseline = form.clone();
        self.form_data = form;
    }

    /// Record the form as pushed to the API: it becomes the baseline, with
    /// the one-shot session actions cleared.
    pub fn commit(&mut self) {
        self.form_data.session = SessionActions::default();
        self.baseline = self.form_data.clone();
    }

    /// Discard edits, back to the last loaded snapshot.
    pub fn reset(&mut self) {
        self.form_data = self.baseline.clone();
    }

    /// Forget everything, back to the built-in defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Read the persisted draft. A missing or unreadable entry yields a
    /// fresh draft.
    pub fn load(storage: &dyn KvStore) -> Result<Self, StorageError> {
        match storage.get::<Self>(SETTINGS_NAMESPACE) {
            Ok(draft) => Ok(draft.unwrap_or_default()),
            Err(StorageError::Corrupt { message, .. }) => {
                tracing::warn!("Discarding unreadable settings draft: {}", message);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, storage: &dyn KvStore) -> Result<(), StorageError> {
        storage.put(SETTINGS_NAMESPACE, self)
    }
}
