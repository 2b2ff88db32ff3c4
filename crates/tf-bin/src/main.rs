//! `textfield`: drives one text field from a command script.
//!
//! The field lives on its own UI thread; this async driver feeds it script
//! commands, sleeps for `wait` lines and collects `dump` snapshots through a
//! bounded synchronous wait.

mod host;
mod script;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use core_actions::PatternTask;
use core_events::{ChannelScheduler, sync_pair};
use host::UiCommand;
use script::Command;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Once;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "textfield.log";

#[derive(Parser, Debug)]
#[command(name = "textfield", version, about = "Script driver for the text field editing core")]
struct Args {
    /// Command script to run. Reads standard input when omitted.
    pub script: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `textfield.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("reading script from stdin"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    let config = core_config::load_from(args.config.clone())?;
    let commands = script::parse_script(&read_script(args.script.as_deref())?)?;
    info!(target: "runtime", commands = commands.len(), config_override = args.config.is_some(), "startup");

    let handle = tokio::runtime::Handle::current();
    let (ui_tx, ui_rx) = crossbeam_channel::unbounded::<UiCommand>();
    let ui_thread = std::thread::Builder::new()
        .name("textfield-ui".into())
        .spawn(move || {
            let (task_tx, task_rx) = crossbeam_channel::unbounded::<PatternTask>();
            let scheduler = Rc::new(ChannelScheduler::new(task_tx, handle));
            let pattern = host::build_pattern(config, scheduler);
            host::run_ui(pattern, ui_rx, task_rx);
        })
        .context("spawning ui thread")?;

    for command in commands {
        if !command.is_driver_local() {
            ui_tx
                .send(UiCommand::Run(command))
                .map_err(|_| anyhow!("ui thread exited early"))?;
            continue;
        }
        match command {
            Command::Wait(duration) => tokio::time::sleep(duration).await,
            Command::Dump => {
                let (reply, waiter) = sync_pair("dump");
                ui_tx
                    .send(UiCommand::Dump(reply))
                    .map_err(|_| anyhow!("ui thread exited early"))?;
                match tokio::task::spawn_blocking(move || waiter.wait_default()).await? {
                    Some(dump) => println!("{dump:#?}"),
                    None => warn!(target: "runtime", "dump_unavailable"),
                }
            }
            _ => {}
        }
    }

    let _ = ui_tx.send(UiCommand::Shutdown);
    ui_thread
        .join()
        .map_err(|_| anyhow!("ui thread panicked"))?;
    info!(target: "runtime", "shutdown");
    Ok(())
}
