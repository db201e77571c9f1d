#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Notification;
use crate::domain::models::Role;
use crate::domain::models::SettingsPatch;
use crate::domain::models::StorageBox;
use crate::domain::models::Theme;
use crate::domain::services::PersistentStore;
use crate::domain::services::SessionController;
use crate::infrastructure::backends::HttpBackend;
use crate::infrastructure::storage::FileStorage;
use crate::infrastructure::storage::MemoryStorage;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /role (/r) [ROLE?] - Selects who you are (student, teacher, parent, general). Omit ROLE for an interactive picker, or pass `clear` to unset it.
- /prompts (/ps) - Lists suggested questions for the selected role.
- /preset (/p) [NUMBER] - Sends the suggested question with the given number from /prompts.
- /retry - Sends your last message again.
- /clear - Deletes the chat history.
- /export (/x) [FILE?] - Writes the chat history as JSON to FILE, or prints it when omitted.
- /settings (/s) - Shows the current widget settings.
- /quit /exit (/q) - Exit.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn parse_role(value: &str) -> Result<Role> {
    match value.parse::<Role>() {
        Ok(role) => return Ok(role),
        Err(_) => bail!(format!(
            "Unknown role '{value}'. Possible values are: {}",
            Role::VARIANTS.join(", ")
        )),
    }
}

fn configured_storage() -> StorageBox {
    if Config::get(ConfigKey::Ephemeral) == "true" {
        return Box::<MemoryStorage>::default();
    }

    return Box::new(FileStorage::new(path::PathBuf::from(Config::get(
        ConfigKey::StorageDir,
    ))));
}

fn configured_role() -> Result<Option<Role>> {
    let role = Config::get(ConfigKey::Role);
    if role.is_empty() {
        return Ok(None);
    }

    return Ok(Some(parse_role(&role)?));
}

/// Hydrates a session from `storage`. A given `role` is selected, which also
/// persists it.
async fn open_session(
    storage: StorageBox,
    timeout: Duration,
    tx: mpsc::UnboundedSender<Notification>,
    role: Option<Role>,
) -> SessionController {
    let controller = SessionController::new(
        Box::<HttpBackend>::default(),
        PersistentStore::new(storage),
        timeout,
        tx,
    )
    .await;

    if let Some(role) = role {
        controller.select_role(role).await;
    }

    return controller;
}

/// Interactive chat session, applying the configured role.
pub async fn create_session(
    tx: mpsc::UnboundedSender<Notification>,
) -> Result<SessionController> {
    let timeout = Duration::from_millis(Config::get(ConfigKey::Timeout).parse::<u64>()?);
    let controller = open_session(configured_storage(), timeout, tx, configured_role()?).await;

    return Ok(controller);
}

/// Session for one-shot subcommands. Notifications are not rendered and the
/// stored role is left as is.
async fn create_quiet_session() -> Result<SessionController> {
    let (tx, _rx) = mpsc::unbounded_channel::<Notification>();
    let timeout = Duration::from_millis(Config::get(ConfigKey::Timeout).parse::<u64>()?);

    return Ok(open_session(configured_storage(), timeout, tx, None).await);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn export_history(output: Option<&String>) -> Result<()> {
    let controller = create_quiet_session().await?;
    let document = controller.export_history().await?;

    if let Some(output) = output {
        let mut file = fs::File::create(output).await?;
        file.write_all(document.as_bytes()).await?;
        println!("Exported chat history to {output}");
    } else {
        println!("{document}");
    }

    return Ok(());
}

fn prompt_lines(presets: &[&str]) -> Vec<String> {
    if presets.is_empty() {
        return vec!["No role selected. Pass --role or pick one with /role in a chat.".to_string()];
    }

    return presets
        .iter()
        .enumerate()
        .map(|(idx, prompt)| return format!("- ({}) {prompt}", idx + 1))
        .collect();
}

async fn print_prompts(role: Option<&String>) -> Result<()> {
    let presets = match role {
        Some(role) => parse_role(role)?.presets(),
        None => create_quiet_session().await?.presets().await,
    };

    for line in prompt_lines(presets) {
        println!("{line}");
    }

    return Ok(());
}

async fn update_settings(matches: &ArgMatches) -> Result<()> {
    let controller = create_quiet_session().await?;
    let patch = SettingsPatch {
        notifications: matches.get_one::<bool>("notifications").copied(),
        sound_enabled: matches.get_one::<bool>("sound").copied(),
        theme: matches
            .get_one::<String>("theme")
            .and_then(|theme| return theme.parse::<Theme>().ok()),
    };

    let settings = if patch.is_empty() {
        controller.settings().await
    } else {
        controller.update_settings(patch).await
    };

    println!("notifications = {}", settings.notifications);
    println!("sound = {}", settings.sound_enabled);
    println!("theme = {}", settings.theme);

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_settings() -> Command {
    return Command::new("settings")
        .about("Show or change widget settings.")
        .arg(
            Arg::new("notifications")
                .long("notifications")
                .help("Show notifications.")
                .num_args(1)
                .value_parser(value_parser!(bool)),
        )
        .arg(
            Arg::new("sound")
                .long("sound")
                .help("Play a sound with notifications.")
                .num_args(1)
                .value_parser(value_parser!(bool)),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .help("Widget colour theme.")
                .num_args(1)
                .value_parser(PossibleValuesParser::new(Theme::VARIANTS)),
        );
}

fn arg_role() -> Arg {
    return Arg::new(ConfigKey::Role.to_string())
        .short('r')
        .long(ConfigKey::Role.to_string())
        .env("EMIS_ASSISTANT_ROLE")
        .num_args(1)
        .help("Who is asking. Selects the suggested questions and is sent as a hint to the assistant.")
        .value_parser(PossibleValuesParser::new(Role::VARIANTS))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("emis-assistant")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start chatting with the assistant (default)."))
        .subcommand(Command::new("clear").about("Delete the stored chat history."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(
            Command::new("export")
                .about("Export the chat history as JSON.")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("File to write to. Prints to stdout when omitted.")
                        .num_args(1),
                ),
        )
        .subcommand(Command::new("prompts").about("List suggested questions for a role."))
        .subcommand(subcommand_settings())
        .arg(arg_role())
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("EMIS_API_URL")
                .num_args(1)
                .help(format!("Base URL of the assistant service. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Timeout.to_string())
                .long(ConfigKey::Timeout.to_string())
                .env("EMIS_ASSISTANT_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the assistant to answer a message. [default: {}]", Config::default(ConfigKey::Timeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
                .long(ConfigKey::BackendHealthCheckTimeout.to_string())
                .env("EMIS_ASSISTANT_BACKEND_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when checking the assistant service is reachable. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::HealthCheckInterval.to_string())
                .long(ConfigKey::HealthCheckInterval.to_string())
                .env("EMIS_ASSISTANT_HEALTH_CHECK_INTERVAL")
                .num_args(1)
                .help(format!("Milliseconds between reachability checks while chatting. [default: {}]", Config::default(ConfigKey::HealthCheckInterval)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StorageDir.to_string())
                .long(ConfigKey::StorageDir.to_string())
                .env("EMIS_ASSISTANT_STORAGE_DIR")
                .num_args(1)
                .help(format!("Directory the chat history, role and settings are kept in. [default: {}]", Config::default(ConfigKey::StorageDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Ephemeral.to_string())
                .long(ConfigKey::Ephemeral.to_string())
                .help("Keep everything in memory, nothing is read from or written to disk.")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("EMIS_ASSISTANT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("clear", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            create_quiet_session().await?.clear_history().await;
            println!("Deleted chat history");
            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("export", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            export_history(subcmd_matches.get_one::<String>("output")).await?;
            return Ok(false);
        }
        Some(("prompts", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_prompts(subcmd_matches.get_one::<String>(&ConfigKey::Role.to_string())).await?;
            return Ok(false);
        }
        Some(("settings", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            update_settings(subcmd_matches).await?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
