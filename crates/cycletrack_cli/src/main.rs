//! Terminal front end for CycleTrack.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the cycle store.
//! - Map subcommands onto `CycleService` use-cases and print the results.
//!
//! # Invariants
//! - Every failure is reported on stderr with exit code 1; nothing panics.
//! - The store is closed explicitly before the process exits.

mod render;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use cycletrack_core::model::cycle::parse_iso_date;
use cycletrack_core::{init_from_config, AppConfig, CycleService, NewCycle, SqliteCycleStore};
use log::warn;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cycletrack", version, about = "Log periods and forecast the next cycle")]
struct Cli {
    /// Database file (overrides config and CYCLETRACK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a period
    Add {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Symptom tag; repeat for several
        #[arg(long = "symptom")]
        symptoms: Vec<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        flow: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List logged periods, newest first
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Averages over cycles with a known length
    Stats,
    /// Forecast the next period and fertility window
    Predict {
        /// Reference day for the countdown, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        today: Option<String>,
    },
    /// Symptom counts across the history window
    Symptoms,
    /// Cycle length distribution across the history window
    Histogram,
    /// Write the history window as CSV
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(err) = init_from_config(&config) {
        // Logging is diagnostics only; the command still runs.
        eprintln!("warning: logging disabled: {err}");
    }
    config.ensure_dirs()?;

    let store = SqliteCycleStore::open(&config.db_path)?;
    let service = CycleService::with_history_limit(store, config.history_limit);
    let result = dispatch(&service, cli.command, cli.json);

    if let Err(err) = service.into_store().close() {
        warn!("event=cli_exit module=cli status=error error={err}");
        if result.is_ok() {
            return Err(err.into());
        }
    }
    result
}

fn dispatch(
    service: &CycleService<SqliteCycleStore>,
    command: Commands,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Add {
            start,
            end,
            symptoms,
            mood,
            flow,
            notes,
        } => {
            let mut cycle = NewCycle::parse(&start, &end)?.with_symptoms(symptoms);
            cycle.mood = mood;
            cycle.flow_level = flow;
            cycle.notes = notes;
            let id = service.add_cycle(&cycle)?;
            if json {
                println!("{}", serde_json::json!({ "id": id }));
            } else {
                println!("Period logged. Cycle ID: {id}");
            }
        }
        Commands::History { limit } => {
            let cycles = service.history(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cycles)?);
            } else {
                print!("{}", render::history(&cycles));
            }
        }
        Commands::Stats => {
            let stats = service.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", render::stats(&stats));
            }
        }
        Commands::Predict { today } => {
            let today = match today {
                Some(value) => parse_iso_date("today", &value)?,
                None => Local::now().date_naive(),
            };
            predict(service, today, json)?;
        }
        Commands::Symptoms => {
            let frequency = service.symptom_frequency()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&frequency)?);
            } else {
                print!("{}", render::symptoms(&frequency));
            }
        }
        Commands::Histogram => {
            let buckets = service.cycle_length_histogram()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
            } else {
                print!("{}", render::histogram(&buckets));
            }
        }
        Commands::Export { output } => {
            let rows = match output {
                Some(path) => service.export_csv(BufWriter::new(File::create(&path)?))?,
                None => service.export_csv(io::stdout().lock())?,
            };
            eprintln!("Exported {rows} cycle(s).");
        }
    }
    Ok(())
}

fn predict(
    service: &CycleService<SqliteCycleStore>,
    today: NaiveDate,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    match service.fertility_outlook()? {
        Ok(outlook) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outlook)?);
            } else {
                print!("{}", render::outlook(&outlook, today));
            }
        }
        Err(reason) => {
            if json {
                println!("{}", serde_json::json!({ "reason": reason.message() }));
            } else {
                println!("{reason}");
                println!("Log at least 2 complete cycles to get accurate predictions.");
            }
        }
    }
    Ok(())
}
