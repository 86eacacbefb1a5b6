use std::path::PathBuf;
use std::process::ExitCode;

use boxmark::measure::{run_config, to_luma};
use boxmark::overlay::OverlayConfig;
use boxmark::sim::{MarkParams, MarkRenderer, Scene};
use clap::{Parser, Subcommand};
use nalgebra::Vector2;
use serde::Serialize;

#[cfg(not(feature = "tracing"))]
use log::{error, info};

#[cfg(feature = "tracing")]
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "boxmark", version, about = "Sub-pixel box-in-box overlay metrology")]
struct Cli {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure overlay errors for the images listed in a JSON config.
    Measure {
        #[arg(long)]
        config: PathBuf,
        /// Override the report path from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render a synthetic box-in-box mark to an image file.
    Simulate {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 640)]
        size: usize,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        shift_x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        shift_y: f64,
        /// Gaussian noise sigma in gray levels.
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        /// Rotation in degrees.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        angle: f64,
        /// Salt-and-pepper probability per pixel.
        #[arg(long, default_value_t = 0.0)]
        salt_pepper: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Write the ground truth as JSON.
        #[arg(long)]
        truth: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct GroundTruth {
    overlay_px: Vector2<f64>,
    outer_box: boxmark::Rect,
    inner_box: boxmark::Rect,
    params: MarkParams,
    scene: Scene,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: &str) {
    let _ = boxmark::core::init_with_level(boxmark::core::parse_level(level));
}

#[cfg(feature = "tracing")]
fn init_logging(level: &str) {
    let _ = tracing_log::LogTracer::init();
    boxmark::core::init_tracing(false, level);
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Measure { config, output } => {
            let cfg = OverlayConfig::load_json(&config)?;
            let report = run_config(&cfg, &config)?;
            let out = output.unwrap_or_else(|| {
                let path = cfg.output_path();
                if path.is_absolute() {
                    path
                } else {
                    config.parent().map(|p| p.join(&path)).unwrap_or(path)
                }
            });
            report.write_json(&out)?;
            info!(
                "{} measured, {} failed; report written to {}",
                report.stats.succeeded,
                report.stats.failed,
                out.display()
            );
            if report.stats.succeeded == 0 {
                return Err("no image could be measured".into());
            }
            Ok(())
        }
        Command::Simulate {
            output,
            size,
            shift_x,
            shift_y,
            noise,
            angle,
            salt_pepper,
            seed,
            truth,
        } => {
            let params = MarkParams {
                salt_pepper,
                seed,
                ..MarkParams::default()
            };
            let scene = Scene {
                size,
                shift: Vector2::new(shift_x, shift_y),
                noise,
                angle_deg: angle,
            };
            let mark = MarkRenderer::new(params).render(&scene);
            to_luma(&mark.image).save(&output)?;
            info!("mark written to {}", output.display());

            if let Some(path) = truth {
                let gt = GroundTruth {
                    overlay_px: mark.overlay,
                    outer_box: mark.outer_box,
                    inner_box: mark.inner_box,
                    params,
                    scene,
                };
                std::fs::write(&path, serde_json::to_string_pretty(&gt)?)?;
            }
            Ok(())
        }
    }
}
