mod cli;
mod clients;
mod commands;
mod config;
mod daemon;
mod fs;
mod ownership;
mod paths;
mod resource;
mod runner;
mod termination;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::DaemonConfig;
use std::io;
use std::process;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: DaemonConfig,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut logger = env_logger::Builder::from_default_env();
    if cli.quiet {
        logger.filter_level(log::LevelFilter::Error);
    } else if cli.verbose > 0 || std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log_level);
    }
    logger.format_timestamp(None).init();

    let config_path = cli.config.clone().unwrap_or_else(paths::config_path);
    let config = match DaemonConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            process::exit(1);
        }
    };

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
    };

    let result = match cli.command {
        Command::Check(args) => commands::check::run(&ctx, args),
        Command::Diff(args) => commands::diff::run(&ctx, args),
        Command::Update(args) => commands::update::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mcd", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        process::exit(report(&ctx, &e));
    }
}

/// Print an error and pick the exit code for it
fn report(ctx: &Context, err: &anyhow::Error) -> i32 {
    let message = format!("{:#}", err);
    let Some(daemon_err) = err.chain().find_map(|c| c.downcast_ref::<daemon::Error>()) else {
        ui::error(&message);
        return 1;
    };

    let category = daemon_err.category();
    if daemon_err.is_fatal() {
        termination::write_termination_error(&ctx.config.termination_log, &message);
    }
    ui::error(&format!("{}: {}", category.description(), message));
    if category.is_retryable() {
        ui::info("Nothing was rolled back; the update can be retried");
    }
    category.exit_code()
}
