use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use zapconsole::cli::{self, Commands, OutputFormat};
use zapconsole::{ConsoleError, logging};

#[tokio::main]
async fn main() {
    // Load .env file before anything else (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli_args = cli::Cli::parse();
    let format = cli_args.format;

    if let Err(e) = start(cli_args).await {
        let code = cli::error_code(&e);
        match format {
            OutputFormat::Json => {
                let body = serde_json::json!({
                    "error": format!("{:#}", e),
                    "code": code.map(|c| c.as_str()),
                });
                eprintln!("{}", body);
            }
            OutputFormat::Text => eprintln!("❌ {:#}", e),
        }
        std::process::exit(code.map(|c| c.exit_code()).unwrap_or(1));
    }
}

async fn start(cli_args: cli::Cli) -> anyhow::Result<()> {
    // Config first so its log level and file apply from the start
    let config = cli::load_config(cli_args.config.as_deref())
        .map_err(|e| ConsoleError::Config(format!("{:#}", e)))?;

    let mut log_config = logging::LogConfig::new()
        .with_debug_mode(cli_args.debug)
        .with_level(config.logging.level.clone())
        .with_file(config.logging.file.clone());

    if matches!(cli_args.command, Commands::Serve { .. }) {
        log_config = log_config.with_stderr_level(LevelFilter::INFO);
    }

    // Custom log directory from env
    if let Ok(log_dir) = std::env::var("DEBUG_LOGS_LOCATION") {
        log_config = log_config.with_log_dir(std::path::PathBuf::from(log_dir));
    }

    let _guard = logging::init_logging(log_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Clean up old log files (keep last 7 days)
    if cli_args.debug
        && let Ok(removed) = logging::cleanup_old_logs(7)
        && removed > 0
    {
        tracing::info!("🧹 Cleaned up {} old log file(s)", removed);
    }

    cli::run(cli_args, config).await
}
