use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use timeline_core::TimelineEntry;
use timeline_hass::{CatCardConfig, CatTimeline, ServerMonitor, ServerMonitorConfig, StateMap};

#[derive(Parser, Debug)]
#[command(
    name = "timeline-cli",
    about = "Replay a recorded history payload through a timeline card."
)]
struct Args {
    #[command(subcommand)]
    card: Card,
}

#[derive(Subcommand, Debug)]
enum Card {
    /// Cat activity timeline.
    Cat {
        /// Recorded history payload (JSON object keyed by entity id).
        #[arg(short = 'i', long)]
        history: PathBuf,
        /// Live state map to seed classification lookups.
        #[arg(short, long)]
        states: Option<PathBuf>,
        /// Card config JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Server error monitor.
    Server {
        /// Recorded history payload (JSON object keyed by entity id).
        #[arg(short = 'i', long)]
        history: PathBuf,
        /// Live state map backing level lookups.
        #[arg(short, long)]
        states: Option<PathBuf>,
        /// Card config JSON naming the message and level sensors.
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    match Args::parse().card {
        Card::Cat {
            history,
            states,
            config,
        } => {
            let config: CatCardConfig = match config {
                Some(path) => serde_json::from_value(read_json(&path)?)
                    .with_context(|| format!("{path:?} is not a valid card config"))?,
                None => CatCardConfig::default(),
            };
            let states = load_states(states.as_deref())?;
            let mut card = CatTimeline::new(config);

            let reconstructed = card
                .apply_history(&read_json(&history)?, &states)
                .context("could not replay the history payload")?;
            let payload = card.render_payload(Utc::now());

            print_entries(&payload.entries);
            println!("\n{reconstructed} events reconstructed, {} shown", real_count(&payload.entries));
        }
        Card::Server {
            history,
            states,
            config,
        } => {
            let config: ServerMonitorConfig = serde_json::from_value(read_json(&config)?)
                .with_context(|| format!("{config:?} is not a valid card config"))?;
            let states = load_states(states.as_deref())?;
            let mut card = ServerMonitor::new(config);

            let reconstructed = card
                .apply_history(&read_json(&history)?, &states)
                .context("could not replay the history payload")?;
            let payload = card.render_payload(Utc::now());

            println!("{}\n", payload.title);
            print_entries(&payload.entries);
            println!("\n{reconstructed} events reconstructed, {} shown", real_count(&payload.entries));
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file {path:?}"))?;
    serde_json::from_str(&data).with_context(|| format!("{path:?} is not valid JSON"))
}

fn load_states(path: Option<&Path>) -> anyhow::Result<StateMap> {
    match path {
        Some(path) => {
            StateMap::from_value(&read_json(path)?).context("could not read the state map")
        }
        None => Ok(StateMap::default()),
    }
}

fn print_entries(entries: &[TimelineEntry]) {
    for entry in entries {
        match entry {
            TimelineEntry::Event(event) => {
                println!("{:>12}  {}", event.formatted_time, event.message)
            }
            TimelineEntry::Ellipsis { .. } => println!("{:>12}  ...", ""),
        }
    }
}

fn real_count(entries: &[TimelineEntry]) -> usize {
    entries.iter().filter(|entry| !entry.is_ellipsis()).count()
}
