use clap::{Parser, Subcommand};
use time::{macros::format_description, Date};

#[derive(Debug, Parser)]
#[command(name = "attendance")]
#[command(about = "Clock in, track tasks and manage leave from the terminal")]
pub struct Cli {
    /// Employee id the session belongs to
    #[arg(long, global = true, default_value = "emp-1")]
    pub employee: String,

    /// Act as a reviewer: see every leave request and approve or reject them
    #[arg(long, global = true)]
    pub reviewer: bool,

    /// Business date (YYYY-MM-DD). Defaults to today in local time.
    #[arg(long, global = true, value_parser = parse_date)]
    pub date: Option<Date>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the interactive session against the in-memory dev store
    Run {
        /// Start with the store unreachable to exercise the cache fallback
        #[arg(long)]
        offline: bool,
    },
    /// Print config and cache locations
    ConfigPath,
}

pub fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{raw}': {e}"))
}
