use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use timewindow::config::TIMEZONE_ENV_VAR;
use timewindow::{
    parse_timezone, DateParser, DayBoundary, PermissiveDateParser, Settings, TimeRange, YearMonth,
};

mod logger;

#[derive(Parser)]
#[command(
    name = "timewindow",
    about = "Inspect timezone-aware time windows",
    version
)]
struct Cli {
    /// Process timezone (IANA name); defaults to $TIMEWINDOW_TIMEZONE, then UTC
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Log conversions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse two free-text dates into a range ending at the close of END's day
    Range { start: String, end: String },
    /// Validate start/end UNIX timestamps as request parameters would carry them
    Times {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Timezone the timestamps are expressed in, if not the process timezone
        #[arg(long)]
        input_timezone: Option<String>,
    },
    /// Validate start/end YYYY-MM-DD dates as request parameters would carry them
    Dates {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Print the calendar month around DATE (default: the current month)
    Timeframe { date: Option<String> },
    /// List month starts from --since (default: the configured epoch) through now
    Months {
        #[arg(long)]
        since: Option<YearMonth>,
    },
    /// Render an RFC 3339 instant in the process timezone
    Format { instant: String },
    /// Print the start (or --end) of the day containing a wall-clock reading
    Day {
        reading: String,
        #[arg(long)]
        end: bool,
        /// Leave the boundary without a timezone
        #[arg(long)]
        naive: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    // --timezone replaces TIMEWINDOW_TIMEZONE before it is validated
    let settings = Settings::from_lookup(|key| match (key, &cli.timezone) {
        (TIMEZONE_ENV_VAR, Some(tz)) => Some(tz.clone()),
        _ => std::env::var(key).ok(),
    })
    .context("reading settings")?;
    let window = settings.time_window()?;
    tracing::debug!(timezone = %window.timezone(), "process timezone");

    match cli.command {
        Command::Range { start, end } => {
            print_range(&window.parse_start_and_end_date(&start, &end)?)?;
        }
        Command::Times {
            start,
            end,
            input_timezone,
        } => {
            let input_timezone = input_timezone.as_deref().map(parse_timezone).transpose()?;
            print_range(&window.extract_times(&request(start, end), input_timezone)?)?;
        }
        Command::Dates { start, end } => {
            print_range(&window.extract_dates(&request(start, end))?)?;
        }
        Command::Timeframe { date } => {
            print_range(&window.get_month_timeframe(date.as_deref())?)?;
        }
        Command::Months { since } => {
            let months: Vec<String> = window
                .month_list(since)?
                .iter()
                .map(|m| m.to_rfc3339())
                .collect();
            println!("{}", serde_json::to_string_pretty(&months)?);
        }
        Command::Format { instant } => {
            let instant = DateTime::parse_from_rfc3339(&instant)
                .with_context(|| format!("'{instant}' is not an RFC 3339 instant"))?;
            println!("{}", window.format_datetime(&instant));
        }
        Command::Day {
            reading,
            end,
            naive,
        } => {
            let reading = PermissiveDateParser
                .parse(&reading)
                .with_context(|| format!("cannot parse '{reading}'"))?;
            let boundary = if end {
                window.end_of_the_day(reading, !naive)?
            } else {
                window.beginning_of_the_day(reading, !naive)?
            };
            match boundary {
                DayBoundary::Naive(n) => println!("{}", n.format("%Y-%m-%dT%H:%M:%S%.6f")),
                DayBoundary::Local(l) => println!("{}", l.to_rfc3339()),
            }
        }
    }

    Ok(())
}

/// Request parameters holding only the values that were supplied.
fn request(start: Option<String>, end: Option<String>) -> HashMap<String, String> {
    [("start", start), ("end", end)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
}

fn print_range(range: &TimeRange) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&range.to_serialized())?);
    Ok(())
}
