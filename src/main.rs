mod cache;
mod calendar;
mod error;
mod fetcher;
mod parser;
mod report;
mod settings;
mod slurper;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use calendar::Interval;
use report::Layout;
use settings::Settings;
use slurper::RunOptions;

#[derive(Parser)]
#[command(
    name = "specialty_results",
    about = "Collect AKC specialty results for a breed and write them as CSV",
    after_help = "Example: specialty_results Basenji 2019"
)]
struct Cli {
    /// Breed whose specialties are collected
    #[arg(default_value = "Basenji")]
    breed: String,

    /// Year to scan (default: last calendar year)
    year: Option<i32>,

    /// Scan a single day instead of a whole year
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "year")]
    day: Option<NaiveDate>,

    /// File to write results into (default: stdout)
    #[arg(short, long, help_heading = "Output")]
    output: Option<PathBuf>,

    /// Format for publishing: combined "Name, Owner" column, upper-cased titles
    #[arg(long, help_heading = "Output")]
    format_publishing: bool,

    /// Emit result records as JSON instead of CSV
    #[arg(long, help_heading = "Output")]
    json: bool,

    /// Ignore cached pages (fresh responses are still cached)
    #[arg(long)]
    refresh: bool,

    /// Hide progress bars
    #[arg(long, help_heading = "Diagnostics")]
    no_progress: bool,

    /// Show debugging output (-vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, help_heading = "Diagnostics")]
    verbose: u8,

    /// Path of file for logging
    #[arg(short, long, help_heading = "Diagnostics")]
    log_file: Option<PathBuf>,
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,specialty_results={}", level)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_file.as_deref())?;

    let t0 = Instant::now();
    let settings = Settings::load()?;
    tracing::debug!(?settings, "settings loaded");

    let interval = match (cli.day, cli.year) {
        (Some(day), _) => Interval::single_day(day),
        (None, Some(year)) => Interval::year(year)?,
        (None, None) => Interval::previous_year(chrono::Utc::now().date_naive())?,
    };

    let opts = RunOptions {
        breed: cli.breed,
        interval,
        output: cli.output,
        layout: if cli.format_publishing {
            Layout::Publishing
        } else {
            Layout::Default
        },
        json: cli.json,
        refresh: cli.refresh,
        progress: !cli.no_progress,
    };

    let stats = slurper::run(&opts, &settings).await?;
    eprintln!(
        "Done: {} days, {} events, {} results pages ({} skipped) in {}",
        stats.days,
        stats.events,
        stats.results,
        stats.failed,
        format_duration(t0.elapsed())
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["specialty_results"]).unwrap();
        assert_eq!(cli.breed, "Basenji");
        assert_eq!(cli.year, None);
        assert!(!cli.format_publishing);
    }

    #[test]
    fn day_conflicts_with_year() {
        assert!(Cli::try_parse_from(["specialty_results", "Basenji", "2019", "--day", "2019-01-18"]).is_err());
        let cli = Cli::try_parse_from(["specialty_results", "--day", "2019-01-18", "-vv"]).unwrap();
        assert_eq!(cli.day, NaiveDate::from_ymd_opt(2019, 1, 18));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
    }
}
