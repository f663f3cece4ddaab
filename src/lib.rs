//! zapconsole - Admin console for a WhatsApp Business API gateway
//!
//! Operators hold either an instance token (one WhatsApp session) or an admin
//! token (every instance). zapconsole validates the token against the gateway,
//! keeps it across runs, and drives the gateway's session, webhook, storage
//! and event-publishing settings from the command line or a small console
//! server.
//!
//! ## Features
//!
//! - **Role-aware dispatch:** `Authorization` header for `/admin/*`, `token` header elsewhere
//! - **Envelope decoding:** `{code, success, data, error}` responses unwrapped transparently
//! - **Persistent login:** credential kept in a state file or the OS keyring
//! - **Route gate:** locale-prefixed console paths gated on the `auth-token`/`user-type` cookies
//! - **Settings draft:** edit instance settings locally, validate, then push only what changed
//! - **Pairing:** terminal QR rendering with automatic refresh until the phone is linked
//!
//! ## Quick Start
//!
//! ```bash
//! # Log in with an instance token
//! zapconsole login "$TOKEN"
//!
//! # Pair the session
//! zapconsole qr --watch
//!
//! # Run the console server
//! zapconsole serve --port 3000
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod i18n;
pub mod logging;
pub mod poller;
pub mod settings;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use error::{ConsoleError, ErrorCode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
