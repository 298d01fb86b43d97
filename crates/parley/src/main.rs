// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a unified inbox for SMS, web chat, Messenger, Instagram and email.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;
mod render;
mod wiring;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::FilterArgs;

/// Parley - one inbox for every customer channel.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keep the inbox open and redraw it on every refresh.
    Watch {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the conversation list once.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Open a conversation and print its messages.
    Show {
        /// Conversation id, e.g. `sms-4790000001`.
        id: String,
    },
    /// Send a reply.
    Send { id: String, body: String },
    /// Hand a conversation to an operator or back to automation.
    Mode {
        id: String,
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Check that every configured endpoint is reachable.
    Doctor,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Manual,
    Automated,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging.level);

    let color = !cli.plain && std::io::stdout().is_terminal();
    let shutdown = parley_inbox::install_signal_handler();
    let wiring = match wiring::build(&config, shutdown.clone()) {
        Ok(wiring) => wiring,
        Err(e) => {
            eprintln!("parley: {e}");
            std::process::exit(1);
        }
    };
    let session = &wiring.session;

    let result = match cli.command {
        Commands::Watch { filter } => commands::run_watch(session, &filter, color, shutdown).await,
        Commands::List { filter, json } => commands::run_list(session, &filter, json, color).await,
        Commands::Show { id } => commands::run_show(session, &id, color).await,
        Commands::Send { id, body } => commands::run_send(session, &id, &body, color).await,
        Commands::Mode { id, mode } => commands::run_mode(session, &id, mode == ModeArg::Manual).await,
        Commands::Doctor => doctor::run_doctor(&wiring.adapters, color).await,
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_accepts_filter_flags() {
        let cli = Cli::try_parse_from([
            "parley", "list", "--channel", "sms", "--search", "kari", "--unread", "--json",
        ])
        .unwrap();
        let Commands::List { filter, json } = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(filter.channel, Some(parley_core::Channel::Sms));
        assert_eq!(filter.search, "kari");
        assert!(filter.unread);
        assert!(json);
    }

    #[test]
    fn mode_takes_manual_or_automated() {
        let cli = Cli::try_parse_from(["parley", "mode", "widget-s1", "automated"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mode {
                mode: ModeArg::Automated,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["parley", "mode", "widget-s1", "paused"]).is_err());
    }

    #[test]
    fn unknown_channel_is_rejected() {
        assert!(Cli::try_parse_from(["parley", "list", "--channel", "fax"]).is_err());
    }

    #[test]
    fn config_flag_reads_the_given_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(
            &path,
            "[account]\naccount_id = \"acct-7\"\n\n[poll]\nlist_interval_secs = 9\n",
        )
        .unwrap();

        let config = parley_config::load_and_validate_path(&path).unwrap();
        assert_eq!(config.account.account_id, "acct-7");
        assert_eq!(config.poll.list_interval_secs, 9);
    }

    #[test]
    fn config_with_account_validates() {
        let config = parley_config::load_and_validate_str("[account]\naccount_id = \"acct-1\"\n")
            .expect("config with an account id should be valid");
        assert_eq!(config.account.account_id, "acct-1");
    }
}
