mod demos;
mod logging;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use demos::Demo;
use music_algebra::{
    perf, render, to_music1, Context, MEvent, MidiChannel, Music, Note1, Pitch, PlayerMap, PlayerRegistry,
    Rational, Score, Volume,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "music-perform")]
#[command(about = "Perform algebraic music scores into timed note events", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Source {
    /// JSON score: a serialized Music<Pitch> tree, where `Line` and `Chord`
    /// lists may stand in for nested `Seq` and `Par` pairs
    #[arg(short, long, conflicts_with = "demo")]
    score: Option<PathBuf>,

    /// Built-in piece, used when no score is given
    #[arg(long, value_enum, default_value = "phrygian")]
    demo: Demo,
}

impl Source {
    fn load(&self) -> Result<Music<Pitch>> {
        match &self.score {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read score '{}'", path.display()))?;
                parse_score(&text).with_context(|| format!("Invalid score in '{}'", path.display()))
            }
            None => Ok(self.demo.music()),
        }
    }
}

fn parse_score(text: &str) -> Result<Music<Pitch>> {
    let score: Score<Pitch> = serde_json::from_str(text)?;
    Ok(score.into_music())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Debug,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform a score and print its events
    Perform {
        #[command(flatten)]
        source: Source,

        /// Volume attached to every note
        #[arg(long, default_value = "116")]
        volume: Volume,

        /// Tempo ratio applied to the whole score, e.g. 3/2
        #[arg(short, long)]
        tempo: Option<Rational>,

        /// Semitones to transpose the whole score by
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        transpose: Pitch,

        /// Player that starts the performance
        #[arg(short, long, default_value = "Default")]
        player: String,

        /// MIDI channel, 1-16
        #[arg(short, long, default_value = "1")]
        channel: u8,

        /// Print exact event values instead of rendered floats
        #[arg(long)]
        exact: bool,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print the total duration of a score, in whole notes
    Delta {
        #[command(flatten)]
        source: Source,
    },
    /// List the registered players
    Players,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let registry = PlayerRegistry::new();

    match cli.command {
        Commands::Perform {
            source,
            volume,
            tempo,
            transpose,
            player,
            channel,
            exact,
            format,
        } => {
            let mut music = to_music1(&source.load()?, volume);
            if let Some(ratio) = tempo {
                music = music.tempo(ratio);
            }
            if transpose != 0 {
                music = music.transpose(transpose);
            }
            if !registry.contains(&player) {
                log::warn!("unknown player '{}', using default behaviour", player);
            }

            let players: &dyn PlayerMap<Note1> = &registry;
            let ctx = Context::default()
                .with_player(players.player(&player))
                .with_instrument(MidiChannel::new(channel)?);
            let (events, elapsed) = perf(players, &ctx, &music).context("Performance failed")?;
            log::info!("{} events over {} whole notes", events.len(), elapsed);

            print_events(&events, format, exact)?;
            Ok(())
        }
        Commands::Delta { source } => {
            let delta = source.load()?.delta()?;
            println!("{} ({:.4})", delta, delta.to_f64());
            Ok(())
        }
        Commands::Players => {
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn print_events(events: &[MEvent], format: OutputFormat, exact: bool) -> Result<()> {
    match (format, exact) {
        (OutputFormat::Json, true) => println!("{}", serde_json::to_string_pretty(events)?),
        (OutputFormat::Json, false) => println!("{}", serde_json::to_string_pretty(&render(events))?),
        (OutputFormat::Debug, true) => {
            println!("Events: {}", events.len());
            for (i, event) in events.iter().enumerate() {
                println!("  [{}] {:?}", i, event);
            }
        }
        (OutputFormat::Debug, false) => {
            let rendered = render(events);
            println!("Events: {}", rendered.len());
            for (i, event) in rendered.iter().enumerate() {
                println!("  [{}] {:?}", i, event);
            }
        }
        (OutputFormat::Table, _) => {
            println!("{:>10} {:>6} {:>4} {:>10} {:>3}", "time", "pitch", "vol", "dur", "ch");
            for event in events {
                if exact {
                    println!(
                        "{:>10} {:>6} {:>4} {:>10} {:>3}",
                        event.time.to_string(),
                        event.pitch,
                        event.volume,
                        event.duration.to_string(),
                        event.instrument.number()
                    );
                } else {
                    let b = event.rendered();
                    println!(
                        "{:>10.4} {:>6} {:>4} {:>10.4} {:>3}",
                        b.time, b.pitch, b.volume, b.duration, b.instrument
                    );
                }
            }
        }
    }
    Ok(())
}
