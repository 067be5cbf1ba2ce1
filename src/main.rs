use std::error::Error;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;

use clap::Parser;
use crossbeam_channel::bounded;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quakecast::cli::Args;
use quakecast::config::AppConfig;
use quakecast::infer::baseline::{EnergyAnomalyModel, PeakMagnitudeModel};
use quakecast::infer::{AnomalyModel, InferenceGateway, MagnitudeModel};
use quakecast::playback::state::Mode;
use quakecast::playback::{ControllerSettings, PlaybackController, Snapshot};
use quakecast::runner::{self, PlaybackCommand};
use quakecast::signal::GenerationParams;
use quakecast::signal::replay::ReplayBuffer;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load_or_default(&args.config);

    let length = config.stream.length;
    let interval_ms = args.interval_ms.unwrap_or(config.stream.interval_ms);
    let mode = args.mode.map(Mode::from).unwrap_or(config.stream.mode);
    let params = GenerationParams::new(
        args.magnitude.unwrap_or(config.signal.magnitude),
        args.noise.unwrap_or(config.signal.noise_level),
        length,
    );

    let anomaly: Box<dyn AnomalyModel> = match &config.models.anomaly_weights {
        Some(path) => Box::new(EnergyAnomalyModel::load(Path::new(path))?),
        None => Box::new(EnergyAnomalyModel::builtin()),
    };
    let magnitude: Option<Box<dyn MagnitudeModel>> = if config.models.single_model {
        None
    } else {
        Some(match &config.models.magnitude_weights {
            Some(path) => Box::new(PeakMagnitudeModel::load(Path::new(path))?),
            None => Box::new(PeakMagnitudeModel::builtin()),
        })
    };
    let gateway = InferenceGateway::new(anomaly, magnitude, length);

    let replay = match &config.replay.dataset_dir {
        Some(dir) => {
            let buffer = ReplayBuffer::load_wav_dir(Path::new(dir), length)?;
            info!("replay dataset loaded: {} records from {dir}", buffer.len());
            Some(Arc::new(buffer))
        }
        None => None,
    };

    let mut controller = PlaybackController::new(
        gateway,
        replay,
        ControllerSettings {
            mode,
            interval_ms,
            params,
            policy: config.risk.policy,
            seed: args.seed.or(config.signal.seed),
        },
    )?;

    if let Some(preset) = args.preset {
        controller.select_preset(preset.into());
    }

    // Initial reading so a snapshot exists before the stream starts.
    controller.advance_once()?;
    if let Some(snapshot) = controller.current_snapshot() {
        log_snapshot(snapshot);
    }

    if args.once {
        return Ok(());
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })?;

    let (command_tx, command_rx) = bounded::<PlaybackCommand>(16);
    let (snapshot_tx, snapshot_rx) = bounded::<Snapshot>(8);
    command_tx.send(PlaybackCommand::Start)?;

    let worker = thread::Builder::new().name("ticker".into()).spawn(move || {
        runner::run(controller, command_rx, snapshot_tx, stop_flag, args.ticks)
    })?;

    // Ends when the worker drops its sender.
    for snapshot in snapshot_rx.iter() {
        log_snapshot(&snapshot);
    }

    let controller = worker.join().map_err(|_| "tick worker panicked")?;
    info!(
        "playback finished at frame {}",
        controller.state().frame_index
    );
    Ok(())
}

fn log_snapshot(snapshot: &Snapshot) {
    let magnitude = snapshot
        .prediction
        .magnitude_estimate
        .map(|m| format!("{m:.2}"))
        .unwrap_or_else(|| "-".into());
    info!(
        "reading: anomaly={:.3} magnitude={magnitude} risk={} mode={:?}",
        snapshot.prediction.anomaly_score, snapshot.risk, snapshot.mode
    );
}
