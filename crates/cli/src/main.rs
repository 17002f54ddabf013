#![deny(unsafe_code)]
//! CLI binary for the metaballs contour engine.
//!
//! Subcommands:
//! - `render` runs an engine N frames and writes a PNG
//! - `contour` runs an engine N frames and prints the contour as JSON
//! - `replay <seed.json>` re-renders a saved run
//! - `list` prints available engines and saddle policies
//!
//! Logging goes to stderr and is filtered by `RUST_LOG`.

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use metaballs_core::{chain_segments, Engine, SaddlePolicy, Seed};
use metaballs_engines::pixel::{Rgb, StrokeStyle};
use metaballs_engines::EngineKind;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,metaballs=info";

#[derive(Parser)]
#[command(name = "metaballs", about = "Metaball contours traced with marching squares")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// What to simulate and for how long.
#[derive(Args)]
struct SceneArgs {
    /// Engine name.
    #[arg(short, long, default_value = "metaballs")]
    engine: String,

    /// Canvas width in pixels.
    #[arg(short = 'W', long, default_value_t = 700)]
    width: usize,

    /// Canvas height in pixels.
    #[arg(short = 'H', long, default_value_t = 400)]
    height: usize,

    /// Number of frames to advance before output.
    #[arg(short, long, default_value_t = 120)]
    steps: usize,

    /// PRNG seed for deterministic output.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Engine parameters as a JSON string, e.g. '{"threshold": 1.0}'.
    #[arg(long, default_value = "{}")]
    params: String,
}

/// How the frame is painted.
#[derive(Args)]
struct StyleArgs {
    /// Contour stroke width in pixels.
    #[arg(long, default_value_t = 10.0)]
    stroke_width: f64,

    /// Contour and border colour.
    #[arg(long, default_value = "#14143c")]
    stroke: String,

    /// Background colour.
    #[arg(long, default_value = "#ececff")]
    background: String,

    /// Box blur radius in pixels (0 for none).
    #[arg(long, default_value_t = 2)]
    blur: usize,

    /// Skip the Perlin background wash.
    #[arg(long)]
    no_wash: bool,

    /// Skip the canvas border.
    #[arg(long)]
    no_border: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run an engine for N frames and write a PNG snapshot.
    Render {
        #[command(flatten)]
        scene: SceneArgs,

        #[command(flatten)]
        style: StyleArgs,

        /// Output file path.
        #[arg(short, long, default_value = "metaballs.png")]
        output: PathBuf,

        /// Also write a seed file that `replay` reproduces this run from.
        #[arg(long)]
        save_seed: Option<PathBuf>,
    },
    /// Run an engine for N frames and print the contour segments as JSON.
    Contour {
        #[command(flatten)]
        scene: SceneArgs,

        /// Include segments chained into polylines.
        #[arg(long)]
        polylines: bool,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-render a run described by a seed file.
    Replay {
        /// Path to a seed JSON file.
        seed_file: PathBuf,

        #[command(flatten)]
        style: StyleArgs,

        /// Output file path.
        #[arg(short, long, default_value = "replay.png")]
        output: PathBuf,
    },
    /// List available engines and saddle policies.
    List,
}

impl SceneArgs {
    fn to_seed(&self) -> Result<Seed, CliError> {
        let params: serde_json::Value = serde_json::from_str(&self.params)
            .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
        if !params.is_object() {
            return Err(CliError::Input("--params must be a JSON object".into()));
        }
        let mut seed = Seed::new(&self.engine, self.width, self.height, self.seed);
        seed.params = params;
        seed.steps = self.steps;
        Ok(seed)
    }
}

impl StyleArgs {
    fn to_style(&self) -> Result<StrokeStyle, CliError> {
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(CliError::Input(format!(
                "invalid --stroke-width {}",
                self.stroke_width
            )));
        }
        let defaults = StrokeStyle::default();
        Ok(StrokeStyle {
            background: Rgb::from_hex(&self.background)?,
            stroke: Rgb::from_hex(&self.stroke)?,
            stroke_width: self.stroke_width,
            border_width: if self.no_border { 0.0 } else { defaults.border_width },
            wash_alpha: if self.no_wash { 0.0 } else { defaults.wash_alpha },
            blur_radius: self.blur,
            ..defaults
        })
    }
}

/// Builds the engine a seed names and advances it `seed.steps` frames.
fn run_seed(seed: &Seed) -> Result<EngineKind, CliError> {
    seed.validate()?;
    let mut engine =
        EngineKind::from_name(&seed.engine, seed.width, seed.height, seed.seed, &seed.params)?;
    let _span = info_span!("run", engine = %seed.engine, seed = seed.seed).entered();
    (0..seed.steps).try_for_each(|_| engine.step())?;
    info!(
        frames = engine.frame(),
        segments = engine.contour().len(),
        "simulation finished"
    );
    Ok(engine)
}

fn render(
    seed: &Seed,
    style: &StrokeStyle,
    output: &Path,
    json: bool,
) -> Result<(), CliError> {
    let engine = run_seed(seed)?;
    metaballs_engines::snapshot::write_png(
        engine.contour(),
        &engine.canvas(),
        style,
        engine.frame(),
        output,
    )?;

    if json {
        let info = serde_json::json!({
            "engine": seed.engine,
            "width": seed.width,
            "height": seed.height,
            "steps": seed.steps,
            "seed": seed.seed,
            "segments": engine.contour().len(),
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} ({}x{}, {} frames, seed {}) -> {}",
            seed.engine,
            seed.width,
            seed.height,
            seed.steps,
            seed.seed,
            output.display()
        );
    }
    Ok(())
}

fn contour_json(engine: &EngineKind, polylines: bool) -> Result<serde_json::Value, CliError> {
    let contour = engine.contour();
    let canvas = engine.canvas();
    let mut out = serde_json::json!({
        "frame": engine.frame(),
        "width": canvas.width(),
        "height": canvas.height(),
        "params": engine.params(),
        "cells": contour.cells,
        "crossed_cells": contour.crossed_cells,
        "segments": serde_json::to_value(&contour.segments)?,
    });
    if polylines {
        out["polylines"] = serde_json::to_value(chain_segments(&contour.segments))?;
    }
    Ok(out)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let engines = EngineKind::list_engines();
            let policies = SaddlePolicy::list_names();
            if cli.json {
                let info = serde_json::json!({
                    "engines": engines,
                    "saddle_policies": policies,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Engines:");
                for name in engines {
                    println!("  {name}");
                }
                println!("Saddle policies:");
                println!("  {}", policies.join(", "));
            }
        }
        Command::Render {
            scene,
            style,
            output,
            save_seed,
        } => {
            let seed = scene.to_seed()?;
            let style = style.to_style()?;
            render(&seed, &style, &output, cli.json)?;
            if let Some(path) = save_seed {
                std::fs::write(&path, serde_json::to_string_pretty(&seed)?)?;
                debug!(path = %path.display(), "seed saved");
            }
        }
        Command::Contour {
            scene,
            polylines,
            output,
        } => {
            let seed = scene.to_seed()?;
            let engine = run_seed(&seed)?;
            let text = serde_json::to_string_pretty(&contour_json(&engine, polylines)?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    info!(path = %path.display(), "contour written");
                }
                None => println!("{text}"),
            }
        }
        Command::Replay {
            seed_file,
            style,
            output,
        } => {
            let text = std::fs::read_to_string(&seed_file)?;
            let seed: Seed = serde_json::from_str(&text).map_err(|e| {
                CliError::Input(format!("invalid seed file {}: {e}", seed_file.display()))
            })?;
            let style = style.to_style()?;
            render(&seed, &style, &output, cli.json)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
