//! Frame-driven gesture engine.
//!
//! Each call to [`GestureEngine::process`] runs one frame through the whole
//! pipeline: confidence gate, normalization, condition evaluation, state
//! tracking, analogue mapping and dispatch. The config snapshot is shared
//! behind an `Arc` and only ever swapped whole between frames.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GestureConfig;
use crate::dispatch::{CommandDispatcher, DispatchReport, DispatchStats};
use crate::effector::{CommandPhase, Effector};
use crate::error::ConfigError;
use crate::hand::condition::evaluate;
use crate::hand::gesture::{GestureEvent, GesturePhase, GestureRuntimeState, GestureTracker};
use crate::hand::keypoints::HandFrame;
use crate::hand::normalize::normalize;

/// Everything that happened while processing one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Frame timestamp, or the last seen one for absent frames.
    pub timestamp_ms: f64,
    /// Whether a usable canonical frame was produced.
    pub hand_present: bool,
    /// Gestures whose conditions all passed on this frame.
    pub matched: Vec<String>,
    pub events: Vec<GestureEvent>,
    pub dispatches: Vec<DispatchReport>,
}

impl FrameReport {
    /// Dispatches the effector rejected.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchReport> {
        self.dispatches.iter().filter(|r| !r.succeeded())
    }
}

/// Owns the config snapshot, per-gesture state and dispatcher.
#[derive(Debug)]
pub struct GestureEngine {
    config: Arc<GestureConfig>,
    tracker: GestureTracker,
    dispatcher: CommandDispatcher,
    last_timestamp_ms: f64,
    frames: u64,
}

impl GestureEngine {
    /// Create an engine for a config, validating it first.
    pub fn new(config: GestureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = GestureTracker::new(&config.gestures);
        Ok(Self {
            config: Arc::new(config),
            tracker,
            dispatcher: CommandDispatcher::new(),
            last_timestamp_ms: 0.0,
            frames: 0,
        })
    }

    /// Current config snapshot.
    pub fn config(&self) -> Arc<GestureConfig> {
        Arc::clone(&self.config)
    }

    pub fn phase(&self, gesture: &str) -> GesturePhase {
        self.tracker.phase(gesture)
    }

    pub fn runtime_state(&self, gesture: &str) -> Option<&GestureRuntimeState> {
        self.tracker.state(gesture)
    }

    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Run one frame through the pipeline. `None` means no hand was detected.
    ///
    /// Never fails: effector errors are reported in the returned
    /// [`FrameReport`] and leave gesture state untouched.
    pub fn process<E: Effector + ?Sized>(
        &mut self,
        frame: Option<&HandFrame>,
        effector: &mut E,
    ) -> FrameReport {
        let config = Arc::clone(&self.config);
        self.frames += 1;

        let timestamp_ms = frame.map(|f| f.timestamp_ms).unwrap_or(self.last_timestamp_ms);
        self.last_timestamp_ms = timestamp_ms;

        let confident = frame.filter(|f| f.is_confident(config.min_confidence));
        if frame.is_some() && confident.is_none() {
            debug!(
                "Frame at {:.0}ms below confidence threshold, treated as absent",
                timestamp_ms
            );
        }
        let canonical = normalize(confident, &config.transformations);

        let mut report = FrameReport {
            timestamp_ms,
            hand_present: canonical.is_some(),
            ..FrameReport::default()
        };

        for gesture in &config.gestures {
            let result = evaluate(gesture, canonical.as_ref());
            if result.matched {
                report.matched.push(gesture.name.clone());
            }

            let events = self.tracker.observe(
                &gesture.name,
                result.matched,
                timestamp_ms,
                &config.debounce,
                config.hold_ms(&gesture.name),
            );
            report.events.extend(events);

            if !self.tracker.phase(&gesture.name).is_engaged() {
                continue;
            }
            let analogue = config.mapping(&gesture.name).and_then(|m| m.analogue.as_ref());
            if let Some(analogue) = analogue {
                let value = result.value(analogue.condition).map(|raw| analogue.map(raw));
                self.tracker.set_continuous(&gesture.name, value);
                if let Some(value) = value {
                    report.events.push(GestureEvent::Continuous {
                        gesture: gesture.name.clone(),
                        timestamp_ms,
                        value,
                    });
                }
            }
        }

        for event in &report.events {
            if let Some(dispatched) = self.dispatcher.dispatch(event, &config, effector) {
                report.dispatches.push(dispatched);
            }
        }

        report
    }

    /// Swap in a new config between frames.
    ///
    /// The new config is validated first; on failure the current snapshot
    /// stays in place. Gestures with an unchanged name and condition set keep
    /// their state. Any gesture interrupted mid-hold gets its old command
    /// released.
    pub fn reload<E: Effector + ?Sized>(
        &mut self,
        config: GestureConfig,
        effector: &mut E,
    ) -> Result<Vec<DispatchReport>, ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Gesture config reload rejected, keeping current config: {}", e);
            return Err(e);
        }

        let old = Arc::clone(&self.config);
        let mut reports = Vec::new();

        for name in self.tracker.reconcile(&old.gestures, &config.gestures) {
            if let Some(mapping) = old.mapping(&name) {
                reports.push(self.dispatcher.forward(
                    &name,
                    &mapping.command,
                    CommandPhase::Release,
                    effector,
                ));
            }
        }

        // Carried-over holds whose binding changed release the old command.
        for gesture in &config.gestures {
            if self.tracker.phase(&gesture.name) != GesturePhase::Holding {
                continue;
            }
            let before = old.mapping(&gesture.name).map(|m| &m.command);
            let after = config.mapping(&gesture.name).map(|m| &m.command);
            if before != after {
                if let Some(command) = before {
                    reports.push(self.dispatcher.forward(
                        &gesture.name,
                        command,
                        CommandPhase::Release,
                        effector,
                    ));
                }
                self.tracker.end_hold(&gesture.name);
            }
        }

        info!(
            "Gesture config reloaded: {} gestures, {} mappings",
            config.gestures.len(),
            config.mappings.len()
        );
        self.config = Arc::new(config);
        Ok(reports)
    }

    /// Return every gesture to inactive, releasing any hold in progress.
    pub fn reset<E: Effector + ?Sized>(&mut self, effector: &mut E) -> Vec<DispatchReport> {
        let config = Arc::clone(&self.config);
        let mut reports = Vec::new();
        for gesture in &config.gestures {
            if self.tracker.phase(&gesture.name) == GesturePhase::Holding {
                if let Some(mapping) = config.mapping(&gesture.name) {
                    reports.push(self.dispatcher.forward(
                        &gesture.name,
                        &mapping.command,
                        CommandPhase::Release,
                        effector,
                    ));
                }
            }
        }
        self.tracker.reset();
        reports
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        let stats = self.dispatcher.stats();
        format!(
            "(:frames {} :forwarded {} :failed {} :gestures {})",
            self.frames,
            stats.forwarded,
            stats.failed,
            self.tracker.status_sexp(&self.config.gestures),
        )
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn pinch_frame(timestamp_ms: f64, pinched: bool) -> HandFrame {
    use crate::hand::keypoints::LANDMARK_COUNT;

    let mut positions = vec![[0.5f32, 0.5, 0.0]; LANDMARK_COUNT];
    positions[4] = [0.10, 0.10, 0.0];
    positions[8] = if pinched { [0.12, 0.13, 0.0] } else { [0.30, 0.30, 0.0] };
    HandFrame::from_positions(&positions, timestamp_ms, 0.9).unwrap()
}

// ── Tests ──────────────────────────────────────────────────
