//! Gateway API client
//!
//! [`GatewayClient`] is the single dispatcher; the typed operations live in
//! `impl GatewayClient` blocks grouped by area:
//!
//! - `admin` for `/admin/...` (Authorization header)
//! - `session` for lifecycle, pairing, webhook, S3, RabbitMQ, filters, health
//! - `messaging` for chat, users, status and calls
//! - `groups` for groups and newsletters
//! - `campaigns` for `/campaigns`

pub mod admin;
pub mod campaigns;
pub mod client;
pub mod envelope;
pub mod error;
pub mod groups;
pub mod messaging;
pub mod route;
pub mod session;
pub mod types;

pub use client::{AuthContext, DEFAULT_BASE_URL, GatewayClient};
pub use error::{ApiError, Result};
pub use route::{ApiRequest, RouteClass};
pub use types::*;
