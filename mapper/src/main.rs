//! gesture-mapper - validate gesture configs and replay recorded keypoint streams.

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use gesture_mapper::hand::keypoints::landmark_label;
use gesture_mapper::logging::{self, LogFormat};
use gesture_mapper::{GestureConfig, GestureEngine, KeypointSource, LogEffector, ReplaySource};

#[derive(Parser, Debug)]
#[command(name = "gesture-mapper", about = "Map hand keypoint streams to commands", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a config file and print its gestures and mappings
    Check {
        /// Gesture config (JSON)
        config: PathBuf,
    },
    /// Run the engine over a recorded keypoint stream, logging every command
    Replay {
        /// Gesture config (JSON)
        #[arg(long)]
        config: PathBuf,

        /// JSON-lines frame recording, or `-` for stdin
        #[arg(long, default_value = "-")]
        frames: String,

        /// Print the engine status s-expression when the stream ends
        #[arg(long)]
        status: bool,

        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { config } => {
            logging::init(LogFormat::Pretty);
            check(&config)
        }
        Command::Replay {
            config,
            frames,
            status,
            json_logs,
        } => {
            logging::init(if json_logs { LogFormat::Json } else { LogFormat::Pretty });
            replay(&config, &frames, status)
        }
    }
}

fn check(path: &Path) -> anyhow::Result<()> {
    let config = GestureConfig::from_path(path)
        .with_context(|| format!("invalid gesture config {}", path.display()))?;

    let t = &config.transformations;
    println!(
        "transformations: displacement={} scale={} rotation={}",
        t.displacement_invariant, t.scale_invariant, t.rotation_invariant
    );
    let d = &config.debounce;
    println!(
        "debounce: activate={} deactivate={} cooldown={}ms  min_confidence={}",
        d.activate_frames, d.deactivate_frames, d.cooldown_ms, config.min_confidence
    );

    for gesture in &config.gestures {
        let binding = config
            .mapping(&gesture.name)
            .map(|m| {
                let mut s = m.command.describe();
                if let Some(a) = &m.analogue {
                    s.push_str(&format!(
                        " <- condition {} [{}, {}] -> [{}, {}]",
                        a.condition, a.input[0], a.input[1], a.output[0], a.output[1]
                    ));
                }
                s
            })
            .unwrap_or_else(|| "(unmapped)".to_string());
        println!("gesture {}: {}", gesture.name, binding);
        for condition in &gesture.conditions {
            println!("  {}", condition.describe());
        }
        let points: Vec<&str> = gesture
            .conditions
            .iter()
            .flat_map(|c| c.points())
            .map(landmark_label)
            .collect();
        info!(gesture = %gesture.name, "uses landmarks {}", points.join(", "));
    }

    println!(
        "ok: {} gestures, {} mappings",
        config.gestures.len(),
        config.mappings.len()
    );
    Ok(())
}

fn replay(config_path: &Path, frames: &str, status: bool) -> anyhow::Result<()> {
    let config = GestureConfig::from_path(config_path)
        .with_context(|| format!("invalid gesture config {}", config_path.display()))?;
    let mut engine = GestureEngine::new(config).context("failed to start engine")?;

    let reader: Box<dyn BufRead> = if frames == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = std::fs::File::open(frames)
            .with_context(|| format!("failed to open frame recording {}", frames))?;
        Box::new(BufReader::new(file))
    };
    let mut source = ReplaySource::new(reader);
    let mut effector = LogEffector::new();

    info!("gesture-mapper v{} replaying {}", env!("CARGO_PKG_VERSION"), frames);

    while let Some(observation) = source
        .poll()
        .with_context(|| format!("failed to read frame recording {}", frames))?
    {
        engine.process(observation.frame(), &mut effector);
    }

    let stats = engine.stats();
    info!(
        "Replay finished: {} frames, {} commands forwarded, {} failed",
        engine.frames_processed(),
        stats.forwarded,
        stats.failed
    );

    if status {
        println!("{}", engine.status_sexp());
    }
    Ok(())
}
