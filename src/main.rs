use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use glider_simulation::*;

/// Sawtooth glide trajectory from steady-glide trim.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Vehicle configuration (TOML). Defaults to the built-in Slocum vehicle.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of alternating dive/climb phases.
    #[arg(long, default_value_t = DEFAULT_PHASES)]
    phases: usize,

    /// Glide-path angle magnitude in degrees, overriding the configuration.
    #[arg(long)]
    glide_angle: Option<f64>,

    /// Directory for trim records and the trajectory CSV.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GliderConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => GliderConfig::slocum(),
    };
    if let Some(angle) = args.glide_angle {
        config.glide.angle_deg = angle;
    }
    config.validate()?;
    info!(vehicle = %config.name, glide_angle_deg = config.glide.angle_deg, "Configuration ready");

    let envelope = feasible_envelope(&config);
    info!(
        lower_deg = envelope.lower.to_degrees(),
        upper_deg = envelope.upper.to_degrees(),
        "No steady glide between the envelope bounds"
    );

    let profile = GlideProfile::from_config(&config, args.phases);
    let mut recorder = args.output.as_ref().map(JsonTrimRecorder::new);

    let mut assembler = TrajectoryAssembler::new(&config)?;
    if let Some(recorder) = recorder.as_mut() {
        assembler = assembler.with_recorder(recorder);
    }
    let trajectory = assembler
        .build_trajectory(&profile, &RigidBodyKinematics)
        .context("building sawtooth trajectory")?;

    let telemetry = TrajectoryTelemetry::from_trajectory(&trajectory);
    telemetry.display_data();

    if let Some(dir) = &args.output {
        let path = dir.join("trajectory.csv");
        TrajectoryTelemetry::write_csv(&trajectory, &path)?;
        info!(path = %path.display(), "Trajectory exported");
    }

    Ok(())
}
