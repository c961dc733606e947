//! Command-line calendar assistant over the slotwise engine.
//!
//! Events live in a local JSON store (`--store`); all date resolution
//! happens in the configured timezone (`--timezone`).

mod store;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use slotwise::{CancelOutcome, Event, Scheduler};
use store::JsonStoreBackend;

#[derive(Parser)]
#[command(name = "slotwise", version, about = "Natural-language calendar from the command line")]
struct Cli {
    /// Path of the JSON event store.
    #[arg(long, default_value = "slotwise-events.json")]
    store: PathBuf,

    /// IANA timezone for interpreting dates and day bounds.
    #[arg(long, default_value = "UTC")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an event from a natural-language instruction.
    QuickAdd {
        /// The instruction, e.g. "Team meeting tomorrow at 2pm".
        text: Vec<String>,
    },
    /// Show the next upcoming event.
    Next,
    /// Cancel the next upcoming event.
    CancelNext {
        /// Send a best-effort cancellation notice to attendees.
        #[arg(long)]
        notify: bool,
    },
    /// List today's free slots.
    FreeToday {
        /// Minimum slot length in minutes.
        #[arg(long, default_value_t = 30)]
        min_duration: u32,
    },
    /// List today's events.
    Agenda,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|_| anyhow!("unknown timezone '{}'", cli.timezone))?;
    let scheduler = Scheduler::new(JsonStoreBackend::new(cli.store), tz);
    let now = Utc::now();

    match cli.command {
        Command::QuickAdd { text } => {
            let text = text.join(" ");
            let event = scheduler
                .quick_add(&text, now)
                .with_context(|| format!("could not add '{text}'"))?;
            println!("Added: {}", describe(&event, tz));
        }
        Command::Next => match scheduler.next(now)? {
            Some(event) => println!("Next up: {}", describe(&event, tz)),
            None => println!("No upcoming events."),
        },
        Command::CancelNext { notify } => match scheduler.cancel_next(notify, now)? {
            CancelOutcome::Cancelled { event, warning } => {
                println!("Cancelled: {}", describe(&event, tz));
                if let Some(warning) = warning {
                    eprintln!("warning: {warning}");
                }
            }
            CancelOutcome::NoUpcoming => println!("No upcoming events to cancel."),
        },
        Command::FreeToday { min_duration } => {
            let min = Duration::minutes(i64::from(min_duration));
            let slots = scheduler.free_today(min, now)?;
            if slots.is_empty() {
                println!("No free slots of at least {min_duration} minutes today.");
            } else {
                println!("Free today:");
                for slot in slots {
                    println!(
                        "  {} - {}",
                        clock(slot.range.start(), tz),
                        clock(slot.range.end(), tz)
                    );
                }
            }
        }
        Command::Agenda => {
            let events = scheduler.events_today(now)?;
            if events.is_empty() {
                println!("Nothing scheduled today.");
            } else {
                for event in events {
                    println!("{}", describe(&event, tz));
                }
            }
        }
    }

    Ok(())
}

fn describe(event: &Event, tz: Tz) -> String {
    let mut line = format!(
        "{} ({} - {})",
        event.title,
        local(event.range.start(), tz),
        clock(event.range.end(), tz)
    );
    if !event.attendees.is_empty() {
        let names: Vec<&str> = event.attendees.iter().map(String::as_str).collect();
        line.push_str(&format!(" with {}", names.join(", ")));
    }
    line
}

fn local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%a %b %-d %H:%M").to_string()
}

fn clock(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}
