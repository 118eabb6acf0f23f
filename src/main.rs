use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

mod config;
mod console;
mod daily_command;
mod datetime;
mod duplicate_command;
mod duplication;
mod error;
mod logger;
mod select_command;
mod time_entry;
mod toggl;

use config::Config;
use console::{ConsoleMarkdownList, ConsolePresenter};
use daily_command::{DailyArgs, DailyCommand};
use datetime::SystemClock;
use duplicate_command::{DuplicateCommand, WindowArgs};
use select_command::{SelectCommand, TerminalSelector};
use toggl::TogglClient;

/// time entryを別の日付に複製するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- daily
/// $ cargo run -- duplicate --from -7 --to 0
/// $ cargo run -- select --from -1 --to 0
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short, long, global = true, help = "Show debug logs")]
    verbose: bool,

    #[clap(short, long, global = true, help = "Show only warnings and errors")]
    quiet: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Show time entries of a day
    Daily(DailyArgs),
    /// Duplicate "public" time entries of a day onto another day
    Duplicate(WindowArgs),
    /// Choose time entries of a day to duplicate onto another day
    Select(WindowArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::setup_logger(logger::level_from_flags(args.verbose, args.quiet))?;

    let config = Config::load().context("Failed to load configuration")?;
    let client = TogglClient::new(&config).context("Failed to new toggl client")?;
    let clock = SystemClock;
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match args.subcommand {
        SubCommands::Daily(daily) => {
            let time_entries = DailyCommand::new(&client, &clock).run(daily).await?;
            presenter.show_time_entries(&time_entries)?;
        }
        SubCommands::Duplicate(duplicate) => {
            let report = DuplicateCommand::new(&client, &clock)
                .run(duplicate)
                .await
                .context("Failed to duplicate time entries")?;
            presenter.show_report(&report)?;
            report.ensure_not_total_failure()?;
            info!("Duplicated {} time entries", report.succeeded());
        }
        SubCommands::Select(select) => {
            let report = SelectCommand::new(&client, &clock, TerminalSelector)
                .run(select)
                .await?;
            presenter.show_report(&report)?;
            report.ensure_not_total_failure()?;
            info!("Duplicated {} time entries", report.succeeded());
        }
    }

    Ok(())
}
