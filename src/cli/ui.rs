//! Terminal rendering for CLI output

use anyhow::{Context, Result};
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use serde::Serialize;
use std::io::{BufRead, Write};

use crate::api::{ConnectionTest, SessionStatus, SkipFilter, SkipSettings, UserInstance};
use crate::settings::InstanceSettingsDraft;
use crate::utils::fit_column;

/// Terminal picture of a pairing code, two modules per character row with
/// the standard quiet zone.
pub fn pairing_qr_text(code: &str) -> Result<String> {
    let qr = QrCode::new(code.as_bytes()).context("Pairing code does not fit in a QR symbol")?;
    Ok(qr
        .render::<Dense1x2>()
        .quiet_zone(true)
        .module_dimensions(1, 1)
        .build())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

fn mark(flag: bool) -> &'static str {
    if flag { "✓" } else { "✗" }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub fn status_lines(status: &SessionStatus) -> Vec<String> {
    let mut lines = vec![
        format!("Instance:   {}", or_dash(&status.name)),
        format!("State:      {}", status.state_label()),
        format!("Connected:  {}", mark(status.connected)),
        format!("Logged in:  {}", mark(status.logged_in)),
    ];
    if !status.jid.is_empty() {
        lines.push(format!("JID:        {}", status.jid));
    }
    if !status.webhook.is_empty() {
        lines.push(format!("Webhook:    {}", status.webhook));
    }
    if !status.events.is_empty() {
        lines.push(format!("Events:     {}", status.events));
    }
    if !status.proxy_url.is_empty() {
        lines.push(format!("Proxy:      {}", status.proxy_url));
    }
    lines
}

pub fn print_status(status: &SessionStatus) {
    for line in status_lines(status) {
        println!("{}", line);
    }
}

pub fn instance_table(instances: &[UserInstance]) -> String {
    let mut out = format!("{:<24} {:<20} {:<18} {}\n", "ID", "NAME", "STATE", "WEBHOOK");
    for instance in instances {
        out.push_str(&format!(
            "{:<24} {:<20} {:<18} {}\n",
            fit_column(&instance.id, 24),
            fit_column(&instance.name, 20),
            instance.state_label(),
            fit_column(or_dash(&instance.webhook), 40),
        ));
    }
    out
}

pub fn skip_lines(skips: &SkipSettings) -> Vec<String> {
    let mut lines: Vec<String> = SkipFilter::ALL
        .iter()
        .map(|filter| format!("  {} {:<14}", mark(filter.get(skips)), filter.name()))
        .collect();
    if skips.skip_calls {
        lines.push(format!(
            "  Calls rejected as '{}'{}",
            or_dash(&skips.call_reject_type),
            if skips.call_reject_message.is_empty() {
                String::new()
            } else {
                format!(" with: {}", skips.call_reject_message)
            }
        ));
    }
    lines
}

pub fn print_connection_test(system: &str, result: &ConnectionTest) {
    if result.success {
        println!("✅ {} connection OK", system);
    } else {
        println!("❌ {} connection failed", system);
    }
    if !result.message.is_empty() {
        println!("   {}", result.message);
    }
}

pub fn print_draft(draft: &InstanceSettingsDraft) {
    let form = draft.form();
    println!("📝 Instance Settings Draft\n");
    println!("Active tab: {}", draft.active_tab());
    println!(
        "Unsaved changes: {}\n",
        if draft.has_unsaved_changes() { "yes" } else { "no" }
    );
    println!("[general]");
    println!("  name    = {}", or_dash(&form.general.name));
    println!("  webhook = {}", or_dash(&form.general.webhook));
    println!("  events  = {}", or_dash(&form.general.events));
    println!("[session]");
    println!(
        "  connect = {}  disconnect = {}  logout = {}",
        form.session.connect, form.session.disconnect, form.session.logout
    );
    println!("[proxy]");
    println!("  enabled = {}  url = {}", form.proxy.enabled, or_dash(&form.proxy.proxy_url));
    println!("[s3]");
    println!(
        "  enabled = {}  bucket = {}  endpoint = {}",
        form.s3.enabled,
        or_dash(&form.s3.bucket),
        or_dash(&form.s3.endpoint)
    );
    println!("[rabbitmq]");
    println!(
        "  enabled = {}  exchange = {} ({})",
        form.rabbitmq.enabled,
        or_dash(&form.rabbitmq.exchange),
        form.rabbitmq.exchange_type
    );
    println!("[skips]");
    for line in skip_lines(&form.skips) {
        println!("{}", line);
    }
}

/// Read a token from the first line of stdin.
pub fn prompt_token() -> Result<String> {
    print!("🔑 Token: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read token from stdin")?;
    Ok(line.trim().to_string())
}
