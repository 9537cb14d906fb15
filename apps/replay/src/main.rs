//! Swipe Replay
//!
//! Feeds pointer traces through the swipe engine and prints what it recognizes.

use anyhow::Result;
use std::path::Path;
use swipe_core::{EngineOutput, GestureState, PointerEvent, SwipeEngine};
use swipe_replay::cli::{Cli, Commands};
use swipe_replay::report::{self, Summary};
use swipe_replay::trace::{load_trace, synthesize_word_trace};
use swipe_replay::{build_engine, load_config, loader_for};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.strategy.as_deref())?;
    let engine = || build_engine(config.clone(), &loader_for(cli.data_dir.clone()), &cli.layout);

    match &cli.command {
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Replay { file } => run_replay(&mut engine()?, file, &cli)?,
        Commands::Word { words } => run_words(&mut engine()?, words, &cli)?,
        Commands::Keys { sequence } => {
            let candidates = engine()?.generate_candidates(sequence);
            if cli.json {
                println!("{}", serde_json::to_string(&candidates)?);
            } else {
                println!("keys '{sequence}'");
                print!("{}", report::format_candidates(&candidates, cli.limit));
            }
        }
    }

    Ok(())
}

fn emit(output: &EngineOutput, cli: &Cli) -> Result<()> {
    if cli.json {
        println!("{}", report::json_line(output, cli.limit)?);
    } else {
        print!("{}", report::format_output(output, cli.limit));
    }
    Ok(())
}

fn run_replay(engine: &mut SwipeEngine, file: &Path, cli: &Cli) -> Result<()> {
    let events = load_trace(file)?;
    info!(events = events.len(), path = %file.display(), "Replaying trace");

    let mut summary = Summary::default();
    for event in events {
        summary.events += 1;
        if let Some(output) = engine.handle(event) {
            summary.record(&output);
            emit(&output, cli)?;
        }
    }
    if engine.gesture_state() != GestureState::Idle {
        warn!("Trace ended with a gesture still in progress");
    }
    info!(
        events = summary.events,
        taps = summary.taps,
        swipes = summary.swipes,
        empty = summary.empty_swipes,
        "Replay finished"
    );
    Ok(())
}

fn run_words(engine: &mut SwipeEngine, words: &[String], cli: &Cli) -> Result<()> {
    let step = engine.config().gesture.resample_distance_px;
    let mut t = 0;
    for word in words {
        let events = synthesize_word_trace(engine.layout(), word, step, t);
        if events.is_empty() {
            warn!(word = %word, "No keys on this layout for word");
            continue;
        }
        if !cli.json {
            println!("word '{word}'");
        }
        for event in events {
            if let PointerEvent::Up(sample) = event {
                t = sample.timestamp_ms + 1000;
            }
            if let Some(output) = engine.handle(event) {
                emit(&output, cli)?;
            }
        }
    }
    Ok(())
}
