use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use quakecast::infer::{AnomalyModel, InferenceGateway, MagnitudeModel};
use quakecast::playback::state::{Mode, Phase, Preset};
use quakecast::playback::{ControllerSettings, PlaybackController, Snapshot};
use quakecast::risk::RiskPolicy;
use quakecast::runner::{self, PlaybackCommand};
use quakecast::signal::GenerationParams;
use quakecast::signal::Waveform;

const LENGTH: usize = 8;

struct Flat;

impl AnomalyModel for Flat {
    fn score(&self, _waveform: &Waveform) -> f32 {
        0.2
    }
}

impl MagnitudeModel for Flat {
    fn estimate(&self, _waveform: &Waveform) -> f32 {
        4.0
    }
}

fn controller(interval_ms: u64) -> PlaybackController {
    let gateway = InferenceGateway::new(Box::new(Flat), Some(Box::new(Flat)), LENGTH);
    PlaybackController::new(
        gateway,
        None,
        ControllerSettings {
            mode: Mode::Synthetic,
            interval_ms,
            params: GenerationParams::new(5.0, 0.5, LENGTH),
            policy: RiskPolicy::TwoFactor,
            seed: Some(1),
        },
    )
    .expect("build controller")
}

#[test]
fn bounded_run_publishes_one_snapshot_per_tick() {
    // Use unbounded channels so try_send never drops in tests.
    let (command_tx, command_rx) = crossbeam_channel::unbounded::<PlaybackCommand>();
    let (snapshot_tx, snapshot_rx) = crossbeam_channel::unbounded::<Snapshot>();
    let stop_flag = Arc::new(AtomicBool::new(false));

    let handle = thread::spawn(move || {
        runner::run(controller(10), command_rx, snapshot_tx, stop_flag, Some(3))
    });
    command_tx.send(PlaybackCommand::Start).expect("send");

    let mut snapshots = Vec::new();
    while let Ok(snapshot) = snapshot_rx.recv_timeout(Duration::from_secs(2)) {
        snapshots.push(snapshot);
    }
    assert_eq!(snapshots.len(), 3, "tick limit bounds the stream");
    for snapshot in &snapshots {
        assert!(snapshot.running);
        assert_eq!(snapshot.waveform.len(), LENGTH);
        assert!(snapshot.error.is_none());
    }

    let finished = handle.join().expect("join worker");
    assert_eq!(finished.state().phase, Phase::Running);
}

#[test]
fn commands_apply_between_ticks() {
    let (command_tx, command_rx) = crossbeam_channel::unbounded::<PlaybackCommand>();
    let (snapshot_tx, snapshot_rx) = crossbeam_channel::unbounded::<Snapshot>();
    let stop_flag = Arc::new(AtomicBool::new(false));

    let handle = thread::spawn(move || {
        runner::run(controller(10), command_rx, snapshot_tx, stop_flag, None)
    });

    command_tx.send(PlaybackCommand::Start).expect("send");
    snapshot_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("first tick");

    // A parameter change queued while the stream runs stops it at the
    // next tick boundary; no tick ever runs with the new value.
    command_tx
        .send(PlaybackCommand::SetParameters {
            magnitude: 7.5,
            noise_level: 0.3,
        })
        .expect("send");

    // Drain whatever was in flight, then confirm the stream went quiet.
    while snapshot_rx.recv_timeout(Duration::from_millis(200)).is_ok() {}
    assert!(
        snapshot_rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "stopped stream must not publish"
    );

    command_tx.send(PlaybackCommand::Shutdown).expect("send");
    let finished = handle.join().expect("join worker");
    assert_eq!(finished.state().phase, Phase::Stopped);
    assert_eq!(finished.state().params.magnitude(), 7.5);
    assert_eq!(finished.state().params.noise_level(), 0.3);
    assert_eq!(finished.state().preset, None);
}

#[test]
fn advance_once_publishes_while_parked() {
    let (command_tx, command_rx) = crossbeam_channel::unbounded::<PlaybackCommand>();
    let (snapshot_tx, snapshot_rx) = crossbeam_channel::unbounded::<Snapshot>();
    let stop_flag = Arc::new(AtomicBool::new(false));

    let handle = thread::spawn(move || {
        runner::run(controller(500), command_rx, snapshot_tx, stop_flag, None)
    });

    command_tx.send(PlaybackCommand::AdvanceOnce).expect("send");
    let snapshot = snapshot_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("manual step snapshot");
    assert!(!snapshot.running, "stream never started");

    command_tx
        .send(PlaybackCommand::SelectPreset(Preset::Strong))
        .expect("send");
    command_tx.send(PlaybackCommand::Shutdown).expect("send");

    let finished = handle.join().expect("join worker");
    assert_eq!(finished.state().preset, Some(Preset::Strong));
    assert_eq!(finished.state().params.magnitude(), 7.0);
    assert_eq!(finished.state().params.noise_level(), 0.7);
}

#[test]
fn stop_flag_ends_the_loop() {
    let (_command_tx, command_rx) = crossbeam_channel::unbounded::<PlaybackCommand>();
    let (snapshot_tx, _snapshot_rx) = crossbeam_channel::unbounded::<Snapshot>();
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_worker = stop_flag.clone();

    let handle = thread::spawn(move || {
        runner::run(
            controller(10),
            command_rx,
            snapshot_tx,
            stop_flag_for_worker,
            None,
        )
    });

    thread::sleep(Duration::from_millis(50));
    stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
    handle.join().expect("worker exits on stop flag");
}
