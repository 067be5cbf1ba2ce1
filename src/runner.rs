//! Deadline-paced tick loop around a [`PlaybackController`].
//!
//! The controller itself never blocks; this worker owns pacing and acts
//! as the external tick source. Commands queue on a channel and drain at
//! tick boundaries only, so a change arriving mid-pipeline is applied
//! atomically before the next tick. Snapshots go out over a bounded
//! channel with `try_send`; the render side drains to the latest and a
//! slow reader costs frames, never correctness.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::playback::state::{Mode, Preset};
use crate::playback::{PlaybackController, Snapshot};

/// Commands accepted by the worker, applied between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Start,
    Stop,
    SetMode(Mode),
    SetParameters { magnitude: f32, noise_level: f32 },
    SelectPreset(Preset),
    SetIntervalMs(u64),
    AdvanceOnce,
    Shutdown,
}

/// How long a parked worker sleeps between command polls.
const POLL: Duration = Duration::from_millis(5);

/// Run the tick loop until `Shutdown`, the stop flag, or `max_ticks`
/// scheduled ticks. Returns the controller so callers can inspect the
/// final state.
pub fn run(
    mut controller: PlaybackController,
    commands: Receiver<PlaybackCommand>,
    snapshots: Sender<Snapshot>,
    stop_flag: Arc<AtomicBool>,
    max_ticks: Option<u64>,
) -> PlaybackController {
    let mut next_deadline = Instant::now();
    let mut ticks = 0u64;

    'worker: loop {
        if stop_flag.load(Ordering::SeqCst) {
            debug!("stop flag set, leaving tick loop");
            break;
        }

        // Tick boundary: apply everything that queued up during the
        // previous pipeline before any new tick may begin.
        for command in commands.try_iter() {
            match command {
                PlaybackCommand::Start => controller.start(),
                PlaybackCommand::Stop => controller.stop(),
                PlaybackCommand::SetMode(mode) => {
                    if let Err(err) = controller.set_mode(mode) {
                        warn!("mode change to {mode:?} rejected: {err}");
                    }
                }
                PlaybackCommand::SetParameters {
                    magnitude,
                    noise_level,
                } => controller.set_parameters(magnitude, noise_level),
                PlaybackCommand::SelectPreset(preset) => controller.select_preset(preset),
                PlaybackCommand::SetIntervalMs(interval_ms) => {
                    controller.set_interval_ms(interval_ms)
                }
                PlaybackCommand::AdvanceOnce => match controller.advance_once() {
                    Ok(()) => publish(&controller, &snapshots),
                    Err(err) => warn!("manual step failed: {err}"),
                },
                PlaybackCommand::Shutdown => break 'worker,
            }
        }

        if !controller.state().is_running() {
            // Parked: keep the deadline current so a restart ticks at once.
            next_deadline = Instant::now();
            thread::sleep(POLL);
            continue;
        }

        let now = Instant::now();
        if now < next_deadline {
            thread::sleep((next_deadline - now).min(POLL));
            continue;
        }

        match controller.tick() {
            Ok(true) => {
                publish(&controller, &snapshots);
                ticks += 1;
                if max_ticks.is_some_and(|max| ticks >= max) {
                    debug!("tick limit reached after {ticks} ticks");
                    break;
                }
            }
            Ok(false) => {}
            // The controller already flagged the retained snapshot.
            Err(err) => warn!("tick aborted: {err}"),
        }

        next_deadline += Duration::from_millis(controller.state().interval_ms);
        let now = Instant::now();
        if next_deadline < now {
            // Inference outran the cadence; degrade rather than pile up.
            trace!("tick overrun");
            next_deadline = now;
        }
    }

    controller
}

fn publish(controller: &PlaybackController, snapshots: &Sender<Snapshot>) {
    if let Some(snapshot) = controller.current_snapshot() {
        let _ = snapshots.try_send(snapshot.clone());
    }
}
