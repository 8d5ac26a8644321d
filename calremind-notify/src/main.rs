//! Schedule a reminder from the command line and deliver it as a
//! desktop notification when it comes due.
//!
//! This binary plays the presentation-layer role: it turns arguments
//! into `EventStore` calls and keeps the process alive until every
//! reminder has resolved.

mod notifier;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use calremind_core::{EventDraft, EventStore, LogNotifier, Notifier, Scheduler};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::notifier::DesktopNotifier;

/// Schedule reminders for calendar events and wait for them to fire.
#[derive(Parser)]
#[command(name = "calremind-notify", version, about)]
struct Cli {
    /// Event group as "text=...,at=...,remind=...[,date=...]".
    /// Repeatable; field values must not contain commas.
    #[arg(long = "event", value_name = "FIELDS")]
    events: Vec<String>,

    /// Event description (single-event shorthand for --event)
    #[arg(long, requires = "at", requires = "remind")]
    text: Option<String>,

    /// When the event takes place (RFC 3339, e.g. 2026-08-26T18:00:00Z)
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// When to fire the reminder: an RFC 3339 timestamp, or a relative
    /// offset like "5m" or "1h 30m"
    #[arg(long)]
    remind: Option<String>,

    /// Calendar date the event belongs to (defaults to the date of --at)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Delivery backend
    #[arg(long, value_enum, default_value = "desktop")]
    backend: Backend,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// System notification via the desktop environment
    Desktop,
    /// Log line only (no delivery channel needed)
    Log,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let drafts = drafts_from_cli(&cli, Utc::now())?;

    let notifier: Arc<dyn Notifier> = match cli.backend {
        Backend::Desktop => Arc::new(DesktopNotifier),
        Backend::Log => Arc::new(LogNotifier),
    };

    let store = EventStore::new();
    let scheduler = Scheduler::attach(store.clone(), notifier);

    for draft in drafts {
        store.add(draft)?;
    }

    // Stay alive until every reminder has reached a terminal state.
    while store
        .list()
        .iter()
        .any(|e| !e.reminder_state.is_terminal())
    {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    scheduler.shutdown();
    Ok(())
}

/// Collect event drafts from repeated --event groups plus the flat
/// single-event shorthand.
fn drafts_from_cli(cli: &Cli, now: DateTime<Utc>) -> Result<Vec<EventDraft>> {
    let mut drafts = Vec::new();
    for spec in &cli.events {
        drafts.push(parse_event_spec(spec, now)?);
    }
    if let (Some(text), Some(at), Some(remind)) = (&cli.text, cli.at, &cli.remind) {
        drafts.push(EventDraft {
            date: cli.date.unwrap_or_else(|| at.date_naive()),
            text: text.clone(),
            occurs_at: at,
            remind_at: parse_remind(remind, now)?,
        });
    }
    if drafts.is_empty() {
        anyhow::bail!("no events given: pass --event or --text/--at/--remind");
    }
    Ok(drafts)
}

/// Parse one --event group: comma-separated key=value fields with keys
/// text, at, remind, and optionally date.
fn parse_event_spec(spec: &str, now: DateTime<Utc>) -> Result<EventDraft> {
    let mut text = None;
    let mut at = None;
    let mut remind_at = None;
    let mut date = None;

    for field in spec.split(',') {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("malformed event field '{field}' (expected key=value)"))?;
        match key.trim() {
            "text" => text = Some(value.to_string()),
            "at" => {
                at = Some(
                    value
                        .parse::<DateTime<Utc>>()
                        .with_context(|| format!("invalid event time '{value}'"))?,
                )
            }
            "remind" => remind_at = Some(parse_remind(value, now)?),
            "date" => {
                date = Some(
                    value
                        .parse::<NaiveDate>()
                        .with_context(|| format!("invalid event date '{value}'"))?,
                )
            }
            other => anyhow::bail!("unknown event field '{other}'"),
        }
    }

    let text = text.context("event is missing 'text'")?;
    let at = at.context("event is missing 'at'")?;
    let remind_at = remind_at.context("event is missing 'remind'")?;
    Ok(EventDraft {
        date: date.unwrap_or_else(|| at.date_naive()),
        text,
        occurs_at: at,
        remind_at,
    })
}

/// Parse a reminder time: relative offsets first, absolute
/// timestamps second.
fn parse_remind(arg: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Ok(offset) = humantime::parse_duration(arg) {
        let offset =
            chrono::Duration::from_std(offset).context("reminder offset is too large")?;
        return Ok(now + offset);
    }
    arg.parse::<DateTime<Utc>>().with_context(|| {
        format!("invalid reminder time '{arg}' (expected RFC 3339 or an offset like \"5m\")")
    })
}
