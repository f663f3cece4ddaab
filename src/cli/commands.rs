//! CLI subcommands and config loading.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::{
    ConnectRequest, GatewayClient, NewInstance, QrCode, RabbitMqConfig, S3Config, SkipCallsConfig,
    SkipFilter, WebhookConfig,
};
use crate::auth::{CredentialStore, Role};
use crate::config::Config;
use crate::gate::server::{self, ConsoleState};
use crate::i18n::Locale;
use crate::poller::{PairingState, QrRefresher, StatusPoller};
use crate::settings::{self, InstanceSettingsDraft, validation};
use crate::storage::{self, KvStore};

use super::ui;
use super::{
    AdminCommands, DraftCommands, LogCommands, OutputFormat, RabbitMqArgs, RabbitMqCommands,
    S3Args, S3Commands, SkipCommands, WebhookCommands,
};

/// Load configuration from file or defaults
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;

    Ok(config)
}

/// Everything a gateway command needs: the dispatcher, the hydrated
/// credential store and the local state backend.
pub(crate) struct Console {
    pub(crate) client: GatewayClient,
    pub(crate) store: CredentialStore,
    pub(crate) storage: Arc<dyn KvStore>,
    pub(crate) format: OutputFormat,
    status_every: std::time::Duration,
    qr_every: std::time::Duration,
}

impl Console {
    pub(crate) async fn open(config: &Config, locale: Locale, format: OutputFormat) -> Result<Self> {
        let client = GatewayClient::with_timeout(&config.api.base_url, config.api.request_timeout())
            .context("Failed to build API client")?
            .with_locale(locale);
        let storage = storage::open(&config.storage.backend, &config.storage.dir)
            .context("Failed to open local state")?;

        let store = CredentialStore::new(client.clone(), storage.clone())
            .with_cookie_max_age(config.console.cookie_max_age_secs);
        store.rehydrate()?;
        store.hydration().sync(&store).await;

        Ok(Self {
            client,
            store,
            storage,
            format,
            status_every: config.console.status_poll_interval(),
            qr_every: config.console.qr_refresh_interval(),
        })
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// The dispatcher, once an instance credential is stored.
    fn instance(&self) -> Result<&GatewayClient> {
        self.store.require_role(Role::Instance)?;
        Ok(&self.client)
    }

    fn admin(&self) -> Result<&GatewayClient> {
        self.store.require_role(Role::Admin)?;
        Ok(&self.client)
    }

    fn done(&self, message: &str) -> Result<()> {
        if self.json() {
            ui::print_json(&serde_json::json!({ "success": true, "message": message }))
        } else {
            println!("✅ {}", message);
            Ok(())
        }
    }
}

/// Initialize configuration file
pub(crate) async fn cmd_init(force: bool) -> Result<()> {
    println!("📱 zapconsole Configuration Initialization\n");

    let config_path =
        Config::system_config_path().context("Could not determine config directory")?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    Config::default().save(&config_path)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set [api] base_url to your gateway (or ZAPCONSOLE_API_URL)");
    println!("   2. Run 'zapconsole login' with an instance or admin token");
    println!("   3. Run 'zapconsole status' to check the session");

    Ok(())
}

/// Show configuration
pub(crate) fn cmd_config(config: &Config, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return ui::print_json(config);
    }

    println!("📱 zapconsole Configuration\n");
    println!("API URL: {}", config.api.base_url);
    println!("Environment: {}", config.api.environment);
    if let Some(timeout) = config.api.request_timeout_secs {
        println!("Request timeout: {}s", timeout);
    }
    println!("Console: {}:{}", config.console.bind, config.console.port);
    println!("Locale: {}", config.console.locale);
    println!(
        "Polling: status every {}s, QR every {}s",
        config.console.status_poll_secs, config.console.qr_refresh_secs
    );
    println!(
        "Storage: {} ({})",
        config.storage.backend,
        config.storage.dir.display()
    );
    println!("Log level: {}", config.logging.level);
    if let Some(file) = &config.logging.file {
        println!("Log file: {}", file.display());
    }

    Ok(())
}

pub(crate) async fn cmd_login(console: &Console, token: Option<String>, role: Role) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => ui::prompt_token()?,
    };
    validation::validate_login(&token)?;

    let credential = console.store.authenticate(token, role).await?;

    if console.json() {
        return ui::print_json(&serde_json::json!({
            "authenticated": true,
            "type": credential.role,
            "token": credential.token.masked(),
            "user": console.store.user(),
        }));
    }

    println!("✅ Logged in as {} ({})", credential.role, credential.token.masked());
    if let Some(user) = console.store.user()
        && !user.name.is_empty()
    {
        println!("   Instance: {} ({})", user.name, user.state_label());
    }
    Ok(())
}

pub(crate) fn cmd_logout(console: &Console) -> Result<()> {
    console.store.logout()?;
    console.done("Logged out")
}

pub(crate) fn cmd_whoami(console: &Console) -> Result<()> {
    let credential = console.store.credential();

    if console.json() {
        return ui::print_json(&serde_json::json!({
            "authenticated": credential.is_some(),
            "type": credential.as_ref().map(|c| c.role),
            "token": credential.as_ref().map(|c| c.token.masked()),
            "user": console.store.user(),
        }));
    }

    match credential {
        Some(credential) => {
            println!("🔐 {} ({})", credential.role, credential.token.masked());
            if let Some(user) = console.store.user()
                && !user.name.is_empty()
            {
                println!("   Instance: {}", user.name);
            }
        }
        None => {
            println!("❌ Not logged in");
            println!("\n💡 Run 'zapconsole login <token>' to authenticate");
        }
    }
    Ok(())
}

pub(crate) async fn cmd_health(console: &Console) -> Result<()> {
    let health = console.client.health().await?;

    if console.json() {
        return ui::print_json(&health);
    }

    if health.is_ok() {
        println!("✅ Gateway healthy ({})", console.client.base_url());
    } else {
        println!("⚠️  Gateway status: {}", health.status);
    }
    if let Some(message) = &health.message {
        println!("   {}", message);
    }
    Ok(())
}

pub(crate) async fn cmd_status(console: &Console, watch: bool) -> Result<()> {
    let client = console.instance()?;

    if !watch {
        let status = client.session_status().await?;
        console.store.update_user(status.clone())?;
        if console.json() {
            return ui::print_json(&status);
        }
        println!("📊 Session Status\n");
        ui::print_status(&status);
        return Ok(());
    }

    let poller = StatusPoller::new(client.clone(), console.status_every);
    let mut updates = poller.subscribe();
    let cancel = CancellationToken::new();
    let handle = poller.spawn(cancel.clone(), Some(console.store.hydration()));

    if !console.json() {
        println!(
            "📊 Watching session status every {}s (Ctrl+C to stop)",
            console.status_every.as_secs()
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    if console.json() {
                        ui::print_json(&snapshot.value)?;
                    } else {
                        println!("\n[{}]", snapshot.received_at.format("%H:%M:%S"));
                        ui::print_status(&snapshot.value);
                    }
                }
            }
        }
    }

    cancel.cancel();
    handle.await.context("Status poller panicked")?;
    Ok(())
}

pub(crate) async fn cmd_connect(
    console: &Console,
    events: Vec<String>,
    no_immediate: bool,
) -> Result<()> {
    let client = console.instance()?;
    let events = (!events.is_empty()).then_some(events);
    let request = ConnectRequest::new(events, Some(!no_immediate));
    client.connect_session(&request).await?;
    console.done(&format!("Connecting (events: {})", request.subscribe.join(", ")))
}

pub(crate) async fn cmd_disconnect(console: &Console) -> Result<()> {
    console.instance()?.disconnect_session().await?;
    console.done("Disconnected")
}

pub(crate) async fn cmd_session_logout(console: &Console) -> Result<()> {
    console.instance()?.logout_session().await?;
    console.done("Session logged out; scan a new QR code to pair again")
}

pub(crate) async fn cmd_qr(console: &Console, watch: bool, save: Option<PathBuf>) -> Result<()> {
    let client = console.instance()?;

    if !watch {
        let status = client.session_status().await?;
        if status.connected {
            return console.done("Session already connected");
        }
        let qr = client.qr_code().await?;
        if let Some(path) = &save {
            save_qr_png(&qr, path)?;
        }
        if console.json() {
            return ui::print_json(&qr);
        }
        show_qr(&qr);
        return Ok(());
    }

    let refresher = QrRefresher::new(client.clone(), console.qr_every);
    let mut updates = refresher.subscribe();
    let cancel = CancellationToken::new();
    let handle = refresher.spawn(cancel.clone());

    if !console.json() {
        println!("📱 Waiting for pairing; the code refreshes every {}s", console.qr_every.as_secs());
    }

    let mut paired = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                match snapshot.map(|s| s.value) {
                    Some(PairingState::Waiting(qr)) => {
                        if let Some(path) = &save {
                            save_qr_png(&qr, path)?;
                        }
                        if console.json() {
                            ui::print_json(&qr)?;
                        } else {
                            show_qr(&qr);
                        }
                    }
                    Some(PairingState::Paired) => {
                        paired = true;
                        break;
                    }
                    None => {}
                }
            }
        }
    }

    cancel.cancel();
    handle.await.context("QR refresher panicked")?;

    if paired {
        console.done("Session paired")?;
    }
    Ok(())
}

fn show_qr(qr: &QrCode) {
    if qr.code.is_empty() {
        println!("⚠️  No pairing code to render; use --save to write the image");
        return;
    }
    match ui::pairing_qr_text(&qr.code) {
        Ok(rendered) => {
            println!("\n{}\n", rendered);
            println!("Scan with WhatsApp > Linked devices > Link a device");
        }
        Err(e) => println!("⚠️  {:#}; use --save to write the image", e),
    }
}

fn save_qr_png(qr: &QrCode, path: &Path) -> Result<()> {
    let png = qr
        .png_bytes()
        .context("QR response did not contain a PNG image")?;
    std::fs::write(path, png)
        .with_context(|| format!("Failed to write QR image to {}", path.display()))?;
    tracing::info!("Saved QR image to {}", path.display());
    Ok(())
}

pub(crate) async fn cmd_pair(console: &Console, phone: &str) -> Result<()> {
    validation::validate_pair_phone(phone)?;
    let response = console.instance()?.pair_phone(phone).await?;

    if console.json() {
        return ui::print_json(&response);
    }
    println!("🔗 Linking code: {}", response.linking_code);
    println!("   Enter it on the phone under Linked devices > Link with phone number");
    Ok(())
}

pub(crate) async fn cmd_webhook(console: &Console, operation: WebhookCommands) -> Result<()> {
    let client = console.instance()?;

    match operation {
        WebhookCommands::Get => {
            let webhook = client.get_webhook().await?;
            if console.json() {
                return ui::print_json(&webhook);
            }
            if webhook.webhook.is_empty() {
                println!("❌ No webhook configured");
            } else {
                println!("🔔 {}", webhook.webhook);
                println!("   Events: {}", webhook.events.join(", "));
            }
            Ok(())
        }
        WebhookCommands::Set { url, events } => {
            let config = webhook_config(url, events)?;
            client.set_webhook(&config).await?;
            console.done("Webhook set")
        }
        WebhookCommands::Update { url, events } => {
            let config = webhook_config(url, events)?;
            client.update_webhook(&config).await?;
            console.done("Webhook updated")
        }
        WebhookCommands::Delete => {
            client.delete_webhook().await?;
            console.done("Webhook removed")
        }
    }
}

fn webhook_config(url: String, events: Vec<String>) -> Result<WebhookConfig> {
    validation::validate_webhook(&url)?;
    Ok(WebhookConfig {
        webhook: url,
        events: if events.is_empty() {
            vec!["All".to_string()]
        } else {
            events
        },
    })
}

pub(crate) async fn cmd_s3(console: &Console, operation: S3Commands) -> Result<()> {
    let client = console.instance()?;

    match operation {
        S3Commands::Get => {
            let mut config = client.get_s3_config().await?;
            config.secret_key = crate::config::secrets::mask(&config.secret_key);
            if console.json() {
                return ui::print_json(&config);
            }
            println!("🪣 S3 {}", if config.enabled { "enabled" } else { "disabled" });
            println!("   Endpoint: {}", config.endpoint);
            println!("   Bucket: {} ({})", config.bucket, config.region);
            println!("   Access key: {}", config.access_key);
            println!("   Media delivery: {}", config.media_delivery);
            println!("   Retention: {} days", config.retention_days);
            Ok(())
        }
        S3Commands::Set(args) => {
            let config = s3_config(args);
            validation::validate_s3(&config)?;
            client.set_s3_config(&config).await?;
            console.done("S3 configuration saved")
        }
        S3Commands::Delete => {
            client.delete_s3_config().await?;
            console.done("S3 configuration removed")
        }
        S3Commands::Test => {
            let result = client.test_s3_connection().await?;
            if console.json() {
                return ui::print_json(&result);
            }
            ui::print_connection_test("S3", &result);
            Ok(())
        }
    }
}

fn s3_config(args: S3Args) -> S3Config {
    S3Config {
        enabled: true,
        endpoint: args.endpoint,
        region: args.region,
        bucket: args.bucket,
        access_key: args.access_key,
        secret_key: args.secret_key,
        path_style: args.path_style,
        public_url: args.public_url,
        media_delivery: args.media_delivery,
        retention_days: args.retention_days,
    }
}

pub(crate) async fn cmd_rabbitmq(console: &Console, operation: RabbitMqCommands) -> Result<()> {
    let client = console.instance()?;

    match operation {
        RabbitMqCommands::Get => {
            let config = client.get_rabbitmq_config().await?;
            if console.json() {
                return ui::print_json(&config);
            }
            println!("🐇 RabbitMQ {}", if config.enabled { "enabled" } else { "disabled" });
            println!("   Exchange: {} ({})", config.exchange, config.exchange_type);
            if !config.queue.is_empty() {
                println!("   Queue: {} ({})", config.queue, config.queue_type);
            }
            println!("   Events: {}", config.events);
            Ok(())
        }
        RabbitMqCommands::Set(args) => {
            let config = rabbitmq_config(args);
            validation::validate_rabbitmq(&config)?;
            client.set_rabbitmq_config(&config).await?;
            console.done("RabbitMQ configuration saved")
        }
        RabbitMqCommands::Delete => {
            client.delete_rabbitmq_config().await?;
            console.done("RabbitMQ configuration removed")
        }
        RabbitMqCommands::Test => {
            let result = client.test_rabbitmq_connection().await?;
            if console.json() {
                return ui::print_json(&result);
            }
            ui::print_connection_test("RabbitMQ", &result);
            Ok(())
        }
    }
}

fn rabbitmq_config(args: RabbitMqArgs) -> RabbitMqConfig {
    RabbitMqConfig {
        enabled: true,
        url: args.url,
        exchange: args.exchange,
        exchange_type: args.exchange_type,
        queue: args.queue,
        queue_type: args.queue_type,
        routing_key: args.routing_key,
        events: args.events,
        durable: !args.transient,
        auto_delete: args.auto_delete,
        exclusive: args.exclusive,
        no_wait: args.no_wait,
        delivery_mode: args.delivery_mode,
    }
}

pub(crate) async fn cmd_skip(console: &Console, operation: SkipCommands) -> Result<()> {
    let client = console.instance()?;

    match operation {
        SkipCommands::Get => {
            let filters: Vec<SkipFilter> = SkipFilter::ALL
                .into_iter()
                .filter(|f| *f != SkipFilter::Calls)
                .collect();
            let (mut skips, flags) = futures::try_join!(
                client.get_skip_calls(),
                futures::future::try_join_all(filters.iter().map(|f| client.get_skip(*f))),
            )?;
            for (filter, enabled) in filters.into_iter().zip(flags) {
                set_skip_flag(&mut skips, filter, enabled);
            }
            if console.json() {
                return ui::print_json(&skips);
            }
            println!("🚫 Skip Filters\n");
            for line in ui::skip_lines(&skips) {
                println!("{}", line);
            }
            Ok(())
        }
        SkipCommands::Set {
            filter: SkipFilter::Calls,
            enabled,
            reject_message,
            reject_type,
        } => {
            let config = SkipCallsConfig {
                skip_calls: enabled,
                call_reject_message: reject_message,
                call_reject_type: reject_type,
            };
            client.set_skip_calls(&config).await?;
            console.done(&format!("calls filter {}", on_off(enabled)))
        }
        SkipCommands::Set {
            filter, enabled, ..
        } => {
            client.set_skip(filter, enabled).await?;
            console.done(&format!("{} filter {}", filter, on_off(enabled)))
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn set_skip_flag(skips: &mut crate::api::SkipSettings, filter: SkipFilter, enabled: bool) {
    let flag = match filter {
        SkipFilter::Media => &mut skips.skip_media_download,
        SkipFilter::Groups => &mut skips.skip_groups,
        SkipFilter::Newsletters => &mut skips.skip_newsletters,
        SkipFilter::Broadcasts => &mut skips.skip_broadcasts,
        SkipFilter::OwnMessages => &mut skips.skip_own_messages,
        SkipFilter::Calls => &mut skips.skip_calls,
    };
    *flag = enabled;
}

pub(crate) async fn cmd_proxy(console: &Console, url: &str) -> Result<()> {
    let proxy = crate::api::ProxyConfig {
        enabled: !url.is_empty(),
        proxy_url: url.to_string(),
    };
    validation::validate_proxy(&proxy)?;
    console.instance()?.set_proxy(url).await?;
    if url.is_empty() {
        console.done("Proxy disabled")
    } else {
        console.done("Proxy set")
    }
}

pub(crate) async fn cmd_admin(console: &Console, operation: AdminCommands) -> Result<()> {
    let client = console.admin()?;

    match operation {
        AdminCommands::Users => {
            let users = client.get_users().await?;
            if console.json() {
                return ui::print_json(&users);
            }
            println!("👥 Instances ({})\n", users.len());
            print!("{}", ui::instance_table(&users));
            Ok(())
        }
        AdminCommands::User { id } => {
            let user = client.get_user(&id).await?;
            if console.json() {
                return ui::print_json(&user);
            }
            ui::print_status(&user);
            Ok(())
        }
        AdminCommands::Create {
            name,
            token,
            generate_token,
            webhook,
            events,
            expiration,
        } => {
            let token = if generate_token {
                Some(uuid::Uuid::new_v4().simple().to_string())
            } else {
                token
            };
            let general = settings::GeneralSettings {
                name: name.clone(),
                webhook: webhook.clone().unwrap_or_default(),
                events: events.clone().unwrap_or_else(|| "All".to_string()),
            };
            validation::validate_general(&general)?;

            let instance = NewInstance {
                name,
                token,
                webhook,
                events,
                expiration,
                ..Default::default()
            };
            let created = client.create_user(&instance).await?;
            if console.json() {
                return ui::print_json(&created);
            }
            println!("✅ Created instance {} ({})", created.name, created.id);
            if !created.token.is_empty() {
                println!("   Token: {}", created.token);
            }
            Ok(())
        }
        AdminCommands::Delete { id, full } => {
            if full {
                client.delete_user_full(&id).await?;
            } else {
                client.delete_user(&id).await?;
            }
            console.done(&format!("Deleted instance {}", id))
        }
        AdminCommands::Stats => {
            let stats = client.admin_dashboard_stats().await;
            if console.json() {
                return ui::print_json(&stats);
            }
            println!("📊 Gateway Statistics\n");
            println!("Instances: {} ({} active)", stats.total_instances, stats.active_instances);
            println!(
                "Messages: {} last hour, {} last day",
                stats.messages_last_hour, stats.messages_last_day
            );
            println!("System health: {:?}", stats.system_health);
            Ok(())
        }
        AdminCommands::Config => ui::print_json(&client.global_config().await?),
        AdminCommands::Reload => {
            let result = client.reload_global_config().await?;
            if console.json() {
                return ui::print_json(&result);
            }
            println!("✅ Global configuration reloaded");
            Ok(())
        }
        AdminCommands::Test { event } => {
            let result = match event {
                Some(raw) => {
                    let event: serde_json::Value =
                        serde_json::from_str(&raw).context("--event must be a JSON object")?;
                    client.send_global_test_event(&event).await?
                }
                None => client.test_global_systems().await?,
            };
            ui::print_json(&result)
        }
    }
}

pub(crate) async fn cmd_draft(console: &Console, operation: DraftCommands) -> Result<()> {
    let storage = console.storage.as_ref();
    let mut draft = InstanceSettingsDraft::load(storage)?;

    match operation {
        DraftCommands::Show => {
            if console.json() {
                return ui::print_json(&draft);
            }
            ui::print_draft(&draft);
            return Ok(());
        }
        DraftCommands::Load => {
            let status = console.instance()?.session_status().await?;
            draft.load_from_status(&status);
            console.store.update_user(status)?;
        }
        DraftCommands::Set { field, value } => {
            draft
                .set_field(&field, &value)
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        DraftCommands::Reset { defaults } => {
            if defaults {
                draft.clear();
            } else {
                draft.reset();
            }
        }
        DraftCommands::Tab { tab } => draft.set_active_tab(tab),
        DraftCommands::Apply => {
            let client = console.instance()?;
            if !draft.has_unsaved_changes() {
                return console.done("Nothing to apply");
            }
            settings::apply_draft(client, &mut draft).await?;
            draft.save(storage)?;
            return console.done("Settings applied");
        }
    }

    draft.save(storage)?;
    if console.json() {
        return ui::print_json(&draft);
    }
    ui::print_draft(&draft);
    Ok(())
}

pub(crate) async fn cmd_serve(
    config: &Config,
    locale: Locale,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut console = config.console.clone();
    if let Some(bind) = bind {
        console.bind = bind;
    }
    if let Some(port) = port {
        console.port = port;
    }
    let addr = console.socket_addr()?;

    let client = GatewayClient::with_timeout(&config.api.base_url, config.api.request_timeout())
        .context("Failed to build API client")?
        .with_locale(locale);
    let state = ConsoleState::new(client)
        .with_cookie_max_age(console.cookie_max_age_secs)
        .with_api_rewrite(config.api.is_development());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down console server");
        }
        signal.cancel();
    });

    println!("📱 zapconsole serving on http://{}", addr);
    server::serve(state, addr, shutdown).await
}

/// Log management commands
pub(crate) async fn cmd_logs(operation: LogCommands) -> Result<()> {
    use crate::logging;
    use std::io::{BufRead, BufReader};

    let log_dir = logging::default_log_dir();

    match operation {
        LogCommands::Status => {
            println!("📊 zapconsole Logging Status\n");
            println!("Log directory: {}", log_dir.display());

            if log_dir.exists() {
                let mut file_count = 0;
                let mut total_size = 0u64;
                for entry in std::fs::read_dir(&log_dir)? {
                    let entry = entry?;
                    if entry.path().is_file() {
                        file_count += 1;
                        total_size += entry.metadata().map(|m| m.len()).unwrap_or(0);
                    }
                }

                println!("Status: ✅ Active");
                println!("Log files: {}", file_count);
                println!("Total size: {:.2} MB", total_size as f64 / (1024.0 * 1024.0));

                if let Some(newest) = logging::get_log_path() {
                    println!("Latest log: {}", newest.display());
                }
            } else {
                println!("Status: ❌ No logs found");
                println!("\n💡 To enable debug logging, run with -d flag:");
                println!("   zapconsole -d status");
            }

            Ok(())
        }

        LogCommands::View { lines } => {
            if let Some(log_path) = logging::get_log_path() {
                println!("📜 Viewing last {} lines of: {}\n", lines, log_path.display());

                let file = std::fs::File::open(&log_path)?;
                let all_lines: Vec<String> =
                    BufReader::new(file).lines().map_while(Result::ok).collect();
                let start = all_lines.len().saturating_sub(lines);

                for line in &all_lines[start..] {
                    println!("{}", line);
                }

                if all_lines.is_empty() {
                    println!("(empty log file)");
                }
            } else {
                println!("❌ No log files found.\n");
                println!("💡 Run zapconsole with -d flag to enable debug logging");
            }

            Ok(())
        }

        LogCommands::Clean { days } => {
            println!("🧹 Cleaning up log files older than {} days...\n", days);

            match logging::cleanup_old_logs(days) {
                Ok(0) => println!("✅ No old log files to remove"),
                Ok(removed) => println!("✅ Removed {} old log file(s)", removed),
                Err(e) => println!("❌ Error cleaning logs: {}", e),
            }

            Ok(())
        }
    }
}
