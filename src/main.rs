#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::Error;
use domain::models::Notification;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! emis-assistant has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("EMIS_ASSISTANT_LOG_DIR").unwrap_or_else(|_| {
        return Config::log_dir().to_string_lossy().to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("emis_assistant")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    let (tx, rx) = mpsc::unbounded_channel::<Notification>();
    let controller = match cli::create_session(tx).await {
        Ok(controller) => Arc::new(controller),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    if let Err(err) = ui::start(controller, rx).await {
        handle_error(err);
    }

    process::exit(0);
}
