//! Wire types of the gateway API
//!
//! Every field is optional on the wire and defaults when absent. Names follow
//! the gateway's JSON exactly, including its mixed casing.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A tenant session as listed by the admin endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInstance {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub token: String,
    pub webhook: String,
    pub jid: String,
    pub qrcode: String,
    pub connected: bool,
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    pub expiration: i64,
    pub proxy_url: String,
    pub events: String,

    #[serde(flatten)]
    pub skips: SkipSettings,

    pub proxy_config: ProxyConfig,
    pub s3_config: S3Config,
    pub rabbitmq_config: RabbitMqConfig,
}

/// Result of `GET /session/status`; same shape as an instance record.
pub type SessionStatus = UserInstance;

impl UserInstance {
    /// Short human label for listings.
    pub fn state_label(&self) -> &'static str {
        match (self.connected, self.logged_in) {
            (true, true) => "online",
            (true, false) => "awaiting pairing",
            (false, true) => "disconnected",
            (false, false) => "offline",
        }
    }
}

/// The six event filters plus the call rejection policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipSettings {
    pub skip_media_download: bool,
    pub skip_groups: bool,
    pub skip_newsletters: bool,
    pub skip_broadcasts: bool,
    pub skip_own_messages: bool,
    pub skip_calls: bool,
    pub call_reject_message: String,
    pub call_reject_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub proxy_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub enabled: bool,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
    pub public_url: String,
    pub media_delivery: String,
    pub retention_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RabbitMqConfig {
    pub enabled: bool,
    pub url: String,
    pub exchange: String,
    pub exchange_type: String,
    pub queue: String,
    pub queue_type: String,
    pub routing_key: String,
    pub events: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub exclusive: bool,
    pub no_wait: bool,
    pub delivery_mode: i64,
}

/// Payload of `POST /admin/users`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_media_download: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_groups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_newsletters: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_broadcasts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_own_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_config: Option<ProxyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_config: Option<S3Config>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rabbitmq_config: Option<RabbitMqConfig>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Body of `POST /session/connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    #[serde(rename = "Subscribe")]
    pub subscribe: Vec<String>,
    #[serde(rename = "Immediate")]
    pub immediate: bool,
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self {
            subscribe: vec!["All".to_string()],
            immediate: true,
        }
    }
}

impl ConnectRequest {
    /// Build from optional overrides. Only a missing list falls back to
    /// `["All"]`; an explicit empty list is sent as is.
    pub fn new(subscribe: Option<Vec<String>>, immediate: Option<bool>) -> Self {
        let defaults = Self::default();
        Self {
            subscribe: subscribe.unwrap_or(defaults.subscribe),
            immediate: immediate.unwrap_or(defaults.immediate),
        }
    }
}

/// Result of `GET /session/qr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrCode {
    /// PNG image as a `data:image/png;base64,...` URL.
    #[serde(rename = "QRCode")]
    pub image: String,
    /// Raw pairing payload encoded in the image.
    pub code: String,
}

impl QrCode {
    /// Decode the embedded PNG, accepting both data URLs and bare base64.
    pub fn png_bytes(&self) -> Option<Vec<u8>> {
        let encoded = match self.image.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => self.image.as_str(),
        };
        if encoded.is_empty() {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.code.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPhoneRequest {
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairPhoneResponse {
    #[serde(rename = "LinkingCode")]
    pub linking_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub proxy_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub webhook: String,
    pub events: Vec<String>,
}

// ---------------------------------------------------------------------------
// Skip filters
// ---------------------------------------------------------------------------

/// One of the per-instance event filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipFilter {
    Media,
    Groups,
    Newsletters,
    Broadcasts,
    OwnMessages,
    Calls,
}

impl SkipFilter {
    pub const ALL: [SkipFilter; 6] = [
        SkipFilter::Media,
        SkipFilter::Groups,
        SkipFilter::Newsletters,
        SkipFilter::Broadcasts,
        SkipFilter::OwnMessages,
        SkipFilter::Calls,
    ];

    /// Endpoint path of this filter's config.
    pub fn path(self) -> &'static str {
        match self {
            SkipFilter::Media => "/session/skipmedia/config",
            SkipFilter::Groups => "/session/skipgroups/config",
            SkipFilter::Newsletters => "/session/skipnewsletters/config",
            SkipFilter::Broadcasts => "/session/skipbroadcasts/config",
            SkipFilter::OwnMessages => "/session/skipownmessages/config",
            SkipFilter::Calls => "/session/skipcalls/config",
        }
    }

    /// JSON key carrying the flag.
    pub fn key(self) -> &'static str {
        match self {
            SkipFilter::Media => "skip_media_download",
            SkipFilter::Groups => "skip_groups",
            SkipFilter::Newsletters => "skip_newsletters",
            SkipFilter::Broadcasts => "skip_broadcasts",
            SkipFilter::OwnMessages => "skip_own_messages",
            SkipFilter::Calls => "skip_calls",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkipFilter::Media => "media",
            SkipFilter::Groups => "groups",
            SkipFilter::Newsletters => "newsletters",
            SkipFilter::Broadcasts => "broadcasts",
            SkipFilter::OwnMessages => "own-messages",
            SkipFilter::Calls => "calls",
        }
    }

    /// Read this filter's flag out of a settings block.
    pub fn get(self, skips: &SkipSettings) -> bool {
        match self {
            SkipFilter::Media => skips.skip_media_download,
            SkipFilter::Groups => skips.skip_groups,
            SkipFilter::Newsletters => skips.skip_newsletters,
            SkipFilter::Broadcasts => skips.skip_broadcasts,
            SkipFilter::OwnMessages => skips.skip_own_messages,
            SkipFilter::Calls => skips.skip_calls,
        }
    }
}

impl fmt::Display for SkipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkipFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkipFilter::ALL
            .into_iter()
            .find(|f| f.name() == s || f.key() == s)
            .ok_or_else(|| format!("Unknown skip filter: {}", s))
    }
}

/// How incoming calls are rejected when `skip_calls` is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRejectType {
    #[default]
    Busy,
    Declined,
    Unavailable,
}

impl CallRejectType {
    pub fn as_str(self) -> &'static str {
        match self {
            CallRejectType::Busy => "busy",
            CallRejectType::Declined => "declined",
            CallRejectType::Unavailable => "unavailable",
        }
    }
}

impl FromStr for CallRejectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "busy" => Ok(CallRejectType::Busy),
            "declined" => Ok(CallRejectType::Declined),
            "unavailable" => Ok(CallRejectType::Unavailable),
            other => Err(format!("Unknown call reject type: {}", other)),
        }
    }
}

/// Body of `POST /session/skipcalls/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCallsConfig {
    pub skip_calls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_reject_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_reject_type: Option<CallRejectType>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    #[default]
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    pub description: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Dashboard numbers derived from `GET /admin/global/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminDashboardStats {
    pub total_instances: u64,
    pub active_instances: u64,
    pub messages_last_hour: u64,
    pub messages_last_day: u64,
    pub system_health: SystemHealth,
    pub recent_activity: Vec<Activity>,
}

impl AdminDashboardStats {
    /// Map the free-form stats payload; missing or malformed fields default.
    pub fn from_stats(stats: &Value) -> Self {
        let count = |key: &str| stats.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            total_instances: count("total_instances"),
            active_instances: count("active_instances"),
            messages_last_hour: count("messages_last_hour"),
            messages_last_day: count("messages_last_day"),
            system_health: stats
                .get("system_health")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default(),
            recent_activity: stats
                .get("recent_activity")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_once: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention_info: Option<MentionInfo>,
}

impl MessagePayload {
    pub fn text(phone: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            body: Some(body.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextInfo {
    #[serde(rename = "stanzaId", skip_serializing_if = "Option::is_none")]
    pub stanza_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(rename = "quotedMessage", skip_serializing_if = "Option::is_none")]
    pub quoted_message: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionInfo {
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    pub id: String,
    pub timestamp: String,
    pub status: String,
}

/// Media kinds accepted by `/chat/send/{kind}` and `/status/send/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatPresence {
    Composing,
    Recording,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPresence {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub jid: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    #[serde(rename = "lastSeen")]
    pub last_seen: String,
    pub groups: Vec<String>,
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCheck {
    pub exists: bool,
    pub jid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAvatar {
    pub url: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub direct_path: String,
}

/// Body of `POST /status/send/text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStatus {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReject {
    pub call_id: String,
    pub call_from: String,
    pub reject_type: CallRejectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Groups and newsletters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GroupParticipant {
    #[serde(rename = "JID")]
    pub jid: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub joined_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GroupInfo {
    #[serde(rename = "JID")]
    pub jid: String,
    pub name: String,
    pub topic: String,
    #[serde(rename = "OwnerJID")]
    pub owner_jid: String,
    pub group_created: i64,
    #[serde(rename = "ParticipantVersionID")]
    pub participant_version_id: String,
    pub participants: Vec<GroupParticipant>,
    pub is_ephemeral: bool,
    pub is_announce: bool,
    pub is_locked: bool,
    pub is_incognito: bool,
    pub is_parent: bool,
    pub is_default_sub: bool,
    pub created: i64,
    pub participant_count: i64,
    pub pending_participants: Vec<GroupParticipant>,
    pub member_add_mode: String,
    #[serde(rename = "LinkedParentJID")]
    pub linked_parent_jid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterInfo {
    pub jid: String,
    pub name: String,
    pub description: String,
    pub subscribers: i64,
    pub muted: bool,
    pub invite_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignKind {
    #[default]
    Bulk,
    Sequence,
    Drip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignState {
    #[default]
    Draft,
    Scheduled,
    Running,
    Completed,
    Paused,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CampaignKind,
    pub status: CampaignState,
    pub targets: Vec<CampaignTarget>,
    pub messages: Vec<CampaignMessage>,
    pub schedule: CampaignSchedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CampaignStats>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignTarget {
    /// `phone`, `group`, `newsletter` or `contact_list`.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignSchedule {
    /// `immediate`, `scheduled` or `recurring`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_delays: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignStats {
    pub campaign_id: String,
    pub total_targets: i64,
    pub messages_sent: i64,
    pub messages_delivered: i64,
    pub messages_read: i64,
    pub messages_failed: i64,
    pub success_rate: f64,
    pub delivery_rate: f64,
    pub read_rate: f64,
    pub avg_delivery_time: f64,
}
