//! CLI Module
//!
//! Command-line interface for zapconsole using Clap v4.

mod commands;
pub mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::{ApiError, SkipFilter};
use crate::auth::Role;
use crate::config::Config;
use crate::error::{ConsoleError, ErrorCode};
use crate::i18n::Locale;
use crate::settings::{SettingsTab, ValidationErrors};
use crate::storage::StorageError;

pub use commands::load_config;
use commands::*;

/// zapconsole - Admin console for a WhatsApp Business API gateway
#[derive(Parser, Debug)]
#[command(name = "zapconsole")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .zapconsole/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Language for API error messages (pt, en, es)
    #[arg(long, global = true)]
    pub locale: Option<Locale>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a token against the gateway and store it
    Login {
        /// Access token (prompted for when omitted)
        #[arg(env = "ZAPCONSOLE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Log in as an administrator
        #[arg(long, conflicts_with = "role")]
        admin: bool,

        /// Token role
        #[arg(long, default_value = "instance")]
        role: Role,
    },

    /// Forget the stored credential
    Logout,

    /// Show the stored credential
    Whoami,

    /// Check gateway health
    Health,

    /// Show the instance session status
    Status {
        /// Keep polling until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Connect the instance session
    Connect {
        /// Event to subscribe to (repeatable, default All)
        #[arg(long = "event")]
        events: Vec<String>,

        /// Do not connect immediately
        #[arg(long)]
        no_immediate: bool,
    },

    /// Disconnect the instance session (keeps pairing)
    Disconnect,

    /// Log the instance out of WhatsApp (drops pairing)
    SessionLogout,

    /// Show the pairing QR code
    Qr {
        /// Refresh the code until the session is paired
        #[arg(short, long)]
        watch: bool,

        /// Write the PNG image to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Request a phone pairing code
    Pair {
        /// Phone number with country code, digits only
        phone: String,
    },

    /// Webhook configuration
    Webhook {
        #[command(subcommand)]
        operation: WebhookCommands,
    },

    /// S3 media storage configuration
    S3 {
        #[command(subcommand)]
        operation: S3Commands,
    },

    /// RabbitMQ event publishing configuration
    Rabbitmq {
        #[command(subcommand)]
        operation: RabbitMqCommands,
    },

    /// Event skip filters
    Skip {
        #[command(subcommand)]
        operation: SkipCommands,
    },

    /// Set the session proxy (empty URL disables it)
    Proxy {
        /// http(s):// or socks5:// proxy URL
        url: String,
    },

    /// Administrative operations (admin token required)
    Admin {
        #[command(subcommand)]
        operation: AdminCommands,
    },

    /// Locally persisted instance settings draft
    Draft {
        #[command(subcommand)]
        operation: DraftCommands,
    },

    /// Run the console server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config,

    /// Log management operations
    Logs {
        #[command(subcommand)]
        operation: LogCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Show the webhook URL and events
    Get,
    /// Set the webhook
    Set {
        url: String,
        /// Event to deliver (repeatable)
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Update the existing webhook
    Update {
        url: String,
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Remove the webhook
    Delete,
}

#[derive(clap::Args, Debug)]
pub struct S3Args {
    #[arg(long)]
    pub endpoint: String,
    #[arg(long, default_value = "us-east-1")]
    pub region: String,
    #[arg(long)]
    pub bucket: String,
    #[arg(long)]
    pub access_key: String,
    #[arg(long, env = "ZAPCONSOLE_S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,
    #[arg(long)]
    pub path_style: bool,
    #[arg(long, default_value = "")]
    pub public_url: String,
    /// base64, url or both
    #[arg(long, default_value = "base64")]
    pub media_delivery: String,
    #[arg(long, default_value = "30")]
    pub retention_days: i64,
}

#[derive(Subcommand, Debug)]
pub enum S3Commands {
    /// Show the S3 configuration
    Get,
    /// Enable S3 with these settings
    Set(S3Args),
    /// Remove the S3 configuration
    Delete,
    /// Test the stored S3 configuration
    Test,
}

#[derive(clap::Args, Debug)]
pub struct RabbitMqArgs {
    /// amqp:// or amqps:// URL
    #[arg(long, env = "ZAPCONSOLE_RABBITMQ_URL", hide_env_values = true)]
    pub url: String,
    #[arg(long)]
    pub exchange: String,
    #[arg(long, default_value = "topic")]
    pub exchange_type: String,
    #[arg(long)]
    pub queue: String,
    #[arg(long, default_value = "classic")]
    pub queue_type: String,
    #[arg(long)]
    pub routing_key: String,
    #[arg(long, default_value = "All")]
    pub events: String,
    /// Declare a transient exchange/queue
    #[arg(long)]
    pub transient: bool,
    #[arg(long)]
    pub auto_delete: bool,
    #[arg(long)]
    pub exclusive: bool,
    #[arg(long)]
    pub no_wait: bool,
    /// 1 = non-persistent, 2 = persistent
    #[arg(long, default_value = "2")]
    pub delivery_mode: i64,
}

#[derive(Subcommand, Debug)]
pub enum RabbitMqCommands {
    /// Show the RabbitMQ configuration
    Get,
    /// Enable RabbitMQ with these settings
    Set(RabbitMqArgs),
    /// Remove the RabbitMQ configuration
    Delete,
    /// Test the stored RabbitMQ configuration
    Test,
}

#[derive(Subcommand, Debug)]
pub enum SkipCommands {
    /// Show all skip filters
    Get,
    /// Turn one filter on or off
    Set {
        /// media, groups, newsletters, broadcasts, own-messages or calls
        filter: SkipFilter,
        /// on/off
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
        /// Message sent to rejected callers (calls only)
        #[arg(long)]
        reject_message: Option<String>,
        /// busy, declined or unavailable (calls only)
        #[arg(long)]
        reject_type: Option<crate::api::CallRejectType>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// List instances
    Users,
    /// Show one instance
    User { id: String },
    /// Create an instance
    Create {
        name: String,
        /// Instance token (generated by the gateway when omitted)
        #[arg(long)]
        token: Option<String>,
        /// Generate a random token locally and print it
        #[arg(long, conflicts_with = "token")]
        generate_token: bool,
        #[arg(long)]
        webhook: Option<String>,
        /// Comma-separated events
        #[arg(long)]
        events: Option<String>,
        /// Expiration as a unix timestamp
        #[arg(long)]
        expiration: Option<i64>,
    },
    /// Delete an instance
    Delete {
        id: String,
        /// Also delete the instance's stored data
        #[arg(long)]
        full: bool,
    },
    /// Global statistics
    Stats,
    /// Global configuration
    Config,
    /// Reload global configuration
    Reload,
    /// Test global systems, or send a test event
    Test {
        /// JSON event to send instead of the system test
        #[arg(long)]
        event: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Show the draft and whether it has unsaved changes
    Show,
    /// Load the draft from the current session status
    Load,
    /// Set one field, e.g. `general.webhook` or `s3.retention_days`
    Set { field: String, value: String },
    /// Discard edits (or with --defaults, the whole draft)
    Reset {
        #[arg(long)]
        defaults: bool,
    },
    /// Switch the active tab
    Tab { tab: SettingsTab },
    /// Validate and push the draft to the gateway
    Apply,
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Show log file location and status
    Status,
    /// View recent log entries (requires debug mode)
    View {
        /// Number of lines to show (default: 50)
        #[arg(short, long, default_value = "50")]
        lines: usize,
    },
    /// Clean up old log files
    Clean {
        /// Maximum age in days (default: 7)
        #[arg(short = 'a', long, default_value = "7")]
        days: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Classify an error for the exit status and the JSON error body.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ConsoleError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<ApiError>() {
            return Some(ErrorCode::of_api(e));
        }
        if cause.downcast_ref::<ValidationErrors>().is_some() {
            return Some(ErrorCode::Validation);
        }
        if cause.downcast_ref::<StorageError>().is_some() {
            return Some(ErrorCode::Storage);
        }
        None
    })
}

/// Main CLI entry point
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    let locale = cli.locale.unwrap_or_else(|| config.console.locale());
    let format = cli.format;

    match cli.command {
        Commands::Init { force } => cmd_init(force).await,
        Commands::Config => cmd_config(&config, format),
        Commands::Logs { operation } => cmd_logs(operation).await,
        Commands::Serve { bind, port } => cmd_serve(&config, locale, bind, port).await,
        command => {
            let console = Console::open(&config, locale, format).await?;
            dispatch(&console, command).await
        }
    }
}

async fn dispatch(console: &Console, command: Commands) -> Result<()> {
    match command {
        Commands::Login { token, admin, role } => {
            let role = if admin { Role::Admin } else { role };
            cmd_login(console, token, role).await
        }
        Commands::Logout => cmd_logout(console),
        Commands::Whoami => cmd_whoami(console),
        Commands::Health => cmd_health(console).await,
        Commands::Status { watch } => cmd_status(console, watch).await,
        Commands::Connect {
            events,
            no_immediate,
        } => cmd_connect(console, events, no_immediate).await,
        Commands::Disconnect => cmd_disconnect(console).await,
        Commands::SessionLogout => cmd_session_logout(console).await,
        Commands::Qr { watch, save } => cmd_qr(console, watch, save).await,
        Commands::Pair { phone } => cmd_pair(console, &phone).await,
        Commands::Webhook { operation } => cmd_webhook(console, operation).await,
        Commands::S3 { operation } => cmd_s3(console, operation).await,
        Commands::Rabbitmq { operation } => cmd_rabbitmq(console, operation).await,
        Commands::Skip { operation } => cmd_skip(console, operation).await,
        Commands::Proxy { url } => cmd_proxy(console, &url).await,
        Commands::Admin { operation } => cmd_admin(console, operation).await,
        Commands::Draft { operation } => cmd_draft(console, operation).await,
        Commands::Init { .. }
        | Commands::Config
        | Commands::Logs { .. }
        | Commands::Serve { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zapconsole", "status", "--watch", "--format", "json", "--locale", "en"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.locale, Some(Locale::En));
        assert!(matches!(cli.command, Commands::Status { watch: true }));
    }

    #[test]
    fn test_login_admin_flag() {
        let cli = Cli::try_parse_from(["zapconsole", "login", "tok", "--admin"]).unwrap();
        match cli.command {
            Commands::Login { token, admin, .. } => {
                assert_eq!(token.as_deref(), Some("tok"));
                assert!(admin);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["zapconsole", "login", "tok", "--role", "admin"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { role: Role::Admin, .. }));
    }

    #[test]
    fn test_connect_events_repeat() {
        let cli = Cli::try_parse_from([
            "zapconsole", "connect", "--event", "Message", "--event", "ReadReceipt", "--no-immediate",
        ])
        .unwrap();
        match cli.command {
            Commands::Connect { events, no_immediate } => {
                assert_eq!(events, vec!["Message", "ReadReceipt"]);
                assert!(no_immediate);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_skip_set_parses_filter_and_switch() {
        let cli = Cli::try_parse_from(["zapconsole", "skip", "set", "own-messages", "on"]).unwrap();
        match cli.command {
            Commands::Skip {
                operation: SkipCommands::Set { filter, enabled, .. },
            } => {
                assert_eq!(filter, SkipFilter::OwnMessages);
                assert!(enabled);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["zapconsole", "skip", "set", "stickers", "on"]).is_err());
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert!(Cli::try_parse_from(["zapconsole", "health", "--locale", "fr"]).is_err());
    }

    #[test]
    fn test_error_code_classification() {
        let err = anyhow::Error::new(ConsoleError::NotAuthenticated("no".into()));
        assert_eq!(error_code(&err), Some(ErrorCode::NotAuthenticated));

        let err = anyhow::Error::new(ValidationErrors::new()).context("Invalid draft");
        assert_eq!(error_code(&err), Some(ErrorCode::Validation));

        let err = anyhow::anyhow!("plain");
        assert_eq!(error_code(&err), None);
    }
}
