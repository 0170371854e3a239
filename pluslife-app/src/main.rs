use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pluslife_core::codec::parse_timestamp;
use std::path::PathBuf;
use tracing::info;

mod config;
mod plotting;
mod workflow;

#[derive(Parser)]
#[command(name = "pluslife-app")]
#[command(about = "Inspect, verify and plot Pluslife analyzer data")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Round-trip a persisted testrun and plot it
    Check {
        file: PathBuf,
        /// Start of the run; read from the file name when omitted
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        no_plot: bool,
        /// Where to save the plot, overriding the configuration
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Decode a webhook payload and print its result
    Webhook { file: PathBuf },
    /// Export the samples of a testrun as flat lines
    Flat {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the current state line of a testrun
    State { file: PathBuf },
}

fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pluslife_app=info,pluslife_core=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::HarnessConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Check {
            file,
            start,
            comment,
            no_plot,
            plot,
        } => {
            let options = workflow::CheckOptions {
                start,
                comment,
                plot: !no_plot,
                plot_path: plot,
            };
            let testrun = workflow::run_check(&file, &options, &config)?;
            println!("{}", testrun.get_current_human_readable_state());
        }
        Command::Webhook { file } => {
            workflow::run_webhook(&file)?;
        }
        Command::Flat { file, output } => {
            let written = workflow::run_flat(&file, output.as_deref())?;
            info!(file = ?file, samples = written, "flat export complete");
        }
        Command::State { file } => workflow::run_state(&file)?,
    }

    Ok(())
}
