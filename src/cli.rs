use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands::{self, CommandReport};
use crate::commands::reconcile::ReconcileOptions;

#[derive(Parser)]
#[command(name = "shelf-sync", version)]
#[command(about = "Link finished books to their year and tag recent to-read picks")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile once against the remote store (default)
    Run(RunArgs),
    /// Show the resolved configuration and flag missing settings
    Config,
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    /// Target year (defaults to the current local year)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    year: Option<i32>,

    /// Compute every write without sending it
    #[arg(long)]
    dry_run: bool,
}

impl From<RunArgs> for ReconcileOptions {
    fn from(args: RunArgs) -> Self {
        Self {
            year: args.year,
            dry_run: args.dry_run,
        }
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let report = match cli.command {
        Some(Command::Config) => commands::config::run()?,
        Some(Command::Run(args)) => commands::reconcile::run(&args.into())?,
        None => commands::reconcile::run(&cli.run.into())?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
