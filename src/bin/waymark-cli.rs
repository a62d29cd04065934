use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;

use waymark::config::{load_config, AppConfig};
use waymark::context::Command;
use waymark::controller::ControllerSet;
use waymark::lifecycle::build_dispatcher;
use waymark::observability::logging;

#[derive(Parser)]
#[command(name = "waymark-cli")]
#[command(about = "Run waymark commands and scheduled jobs", long_about = None)]
struct Cli {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mark the run as scheduled so it is recorded in the run log
    #[arg(long)]
    cron: bool,

    /// Run every command whose schedule is due this minute
    #[arg(long, conflicts_with_all = ["command", "cron"])]
    due: bool,

    /// Command name
    #[arg(required_unless_present = "due")]
    command: Option<String>,

    /// Arguments passed to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    logging::init(Some(&config.observability.log_level));

    let dispatcher = build_dispatcher(&config, ControllerSet::builder())?;

    if cli.due {
        let results = dispatcher.run_due(Utc::now());
        let mut failed = Vec::new();
        for (name, result) in results {
            match result {
                Ok(report) => print!("{}", report.output),
                Err(e) => {
                    eprintln!("{e}");
                    failed.push(name);
                }
            }
        }
        if !failed.is_empty() {
            return Err(format!(
                "{} scheduled command(s) failed: {}",
                failed.len(),
                failed.join(", ")
            )
            .into());
        }
        return Ok(());
    }

    let Some(name) = cli.command else {
        return Err("no command given".into());
    };
    let mut command = Command::new(name).with_args(cli.args);
    if cli.cron {
        command = command.scheduled();
    }

    let report = dispatcher.run(&command)?;
    print!("{}", report.output);
    if report.timed_out {
        eprintln!(
            "warning: '{}' finished after its time limit ({} ms)",
            report.command,
            report.elapsed.as_millis()
        );
    }
    Ok(())
}
