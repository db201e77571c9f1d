#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use strum::IntoEnumIterator;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use yansi::Paint;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::Message;
use crate::domain::models::Notification;
use crate::domain::models::Role;
use crate::domain::models::Sender;
use crate::domain::models::Severity;
use crate::domain::models::SlashCommand;
use crate::domain::models::Theme;
use crate::domain::services::SessionController;
use crate::infrastructure::backends::HttpBackend;

fn paint_message(message: &Message, theme: Theme) -> String {
    let line = message.as_line();
    if message.is_error() {
        return Paint::red(line).to_string();
    }

    match (message.sender, theme) {
        (Sender::User, Theme::Light) => return Paint::blue(line).to_string(),
        (Sender::User, Theme::Dark) => return Paint::white(line).bold().to_string(),
        (Sender::Assistant, _) => return Paint::cyan(line).to_string(),
    }
}

fn paint_notification(notification: &Notification) -> String {
    let text = format!("* {}", notification.text());
    match notification.severity() {
        Severity::Error => return Paint::red(text).bold().to_string(),
        Severity::Success => return Paint::green(text).to_string(),
        Severity::Info => return Paint::yellow(text).to_string(),
    }
}

fn prompt() {
    print!("{} ", Paint::magenta(">").bold());
    if let Err(err) = std::io::stdout().flush() {
        tracing::debug!(error = ?err, "Failed to flush stdout");
    }
}

async fn start_notifications(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        if notification.sound {
            print!("\x07");
        }
        println!("{}", paint_notification(&notification));
        tracing::debug!(
            kind = ?notification.kind,
            duration = ?notification.duration(),
            "Notification shown"
        );
    }
}

fn parse_health_check_interval(value: &str) -> Result<Duration> {
    let interval_ms = match value.parse::<u64>() {
        Ok(interval_ms) => interval_ms,
        Err(_) => bail!(format!(
            "Invalid health-check-interval '{value}', expected milliseconds"
        )),
    };
    if interval_ms == 0 {
        bail!("health-check-interval must be greater than zero");
    }

    return Ok(Duration::from_millis(interval_ms));
}

/// Feeds the environment's reachability into the session until cancelled.
async fn start_reachability_probe(
    controller: Arc<SessionController>,
    period: Duration,
    token: CancellationToken,
) {
    let backend = HttpBackend::default();
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                return;
            }
            _ = interval.tick() => {
                let online = backend.health_check().await.is_ok();
                controller.environment_online(online).await;
            }
        }
    }
}

async fn pick_role() -> Result<Option<Role>> {
    let roles = Role::iter().collect::<Vec<Role>>();
    let items = roles
        .iter()
        .map(|role| return role.to_string())
        .collect::<Vec<String>>();

    let idx = task::spawn_blocking(move || {
        return Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Who are you?")
            .default(0)
            .items(&items)
            .interact_opt();
    })
    .await??;

    return Ok(idx.map(|idx| return roles[idx]));
}

async fn print_presets(controller: &SessionController) {
    let presets = controller.presets().await;
    if presets.is_empty() {
        println!("No role selected. Pick one with /role to see suggested questions.");
        return;
    }

    for (idx, preset) in presets.iter().enumerate() {
        println!("  ({}) {preset}", idx + 1);
    }
}

/// Handles a slash command. Returns false when the session should end.
async fn handle_command(controller: &SessionController, cmd: SlashCommand) -> Result<bool> {
    if cmd.is_quit() {
        return Ok(false);
    }

    if cmd.is_help() {
        println!("{}", cli::help_text());
    } else if cmd.is_role() {
        match cmd.args.first().map(|arg| return arg.as_str()) {
            Some("clear") => {
                controller.clear_role().await;
                println!("Role cleared");
            }
            Some(value) => match value.parse::<Role>() {
                Ok(role) => {
                    controller.select_role(role).await;
                    print_presets(controller).await;
                }
                Err(_) => {
                    println!("Unknown role '{value}'");
                }
            },
            None => {
                if let Some(role) = pick_role().await? {
                    controller.select_role(role).await;
                    print_presets(controller).await;
                }
            }
        }
    } else if cmd.is_prompts() {
        print_presets(controller).await;
    } else if cmd.is_preset() {
        let presets = controller.presets().await;
        match cmd.preset_index().and_then(|idx| return presets.get(idx)) {
            Some(preset) => {
                println!("{}", Paint::blue(format!("You: {preset}")));
                send(controller, preset).await;
            }
            None => {
                println!("No suggested question with that number, see /prompts");
            }
        }
    } else if cmd.is_retry() {
        match controller.last_user_text().await {
            Some(text) => {
                println!("{}", Paint::blue(format!("You: {text}")));
                send(controller, &text).await;
            }
            None => println!("Nothing to retry"),
        }
    } else if cmd.is_clear() {
        controller.clear_history().await;
    } else if cmd.is_export() {
        let document = controller.export_history().await?;
        match cmd.args.first() {
            Some(path) => {
                fs::write(path, document).await?;
                println!("Saved chat history to {path}");
            }
            None => println!("{document}"),
        }
    } else if cmd.is_settings() {
        let settings = controller.settings().await;
        println!("notifications = {}", settings.notifications);
        println!("sound = {}", settings.sound_enabled);
        println!("theme = {}", settings.theme);
        println!("connection = {}", controller.connection_status());
    }

    return Ok(true);
}

async fn send(controller: &SessionController, text: &str) {
    println!("{}", Paint::default("Assistant is typing...").dimmed());
    controller.send(text).await;
}

/// Prints messages appended since the last call, starting over when the
/// history has been cleared.
async fn print_new_messages(controller: &SessionController, printed: &mut usize) {
    let messages = controller.messages().await;
    let theme = controller.settings().await.theme;
    if messages.len() < *printed {
        *printed = 0;
    }

    for message in messages.iter().skip(*printed) {
        // User lines are already on screen from the terminal echo.
        if message.sender == Sender::User {
            continue;
        }
        println!("{}", paint_message(message, theme));
    }
    *printed = messages.len();
}

pub async fn start(
    controller: Arc<SessionController>,
    rx: mpsc::UnboundedReceiver<Notification>,
) -> Result<()> {
    let period = parse_health_check_interval(&Config::get(ConfigKey::HealthCheckInterval))?;
    let token = CancellationToken::new();
    let notifications = tokio::spawn(start_notifications(rx));
    let probe = tokio::spawn(start_reachability_probe(
        controller.clone(),
        period,
        token.clone(),
    ));

    controller.open().await;
    let theme = controller.settings().await.theme;
    for message in controller.messages().await.iter() {
        println!("{}", paint_message(message, theme));
    }
    let mut printed = controller.messages().await.len();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        if let Some(cmd) = SlashCommand::parse(&line) {
            if !handle_command(&controller, cmd).await? {
                break;
            }
        } else if !line.trim().is_empty() {
            send(&controller, &line).await;
        }

        print_new_messages(&controller, &mut printed).await;
        prompt();
    }

    controller.close().await;
    token.cancel();
    probe.await?;
    notifications.abort();

    return Ok(());
}
