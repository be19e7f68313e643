//! Route gesture events to their mapped commands.

use tracing::{debug, warn};

use crate::config::{CommandSpec, GestureConfig};
use crate::effector::{CommandPhase, Effector};
use crate::error::EffectorError;
use crate::hand::gesture::GestureEvent;

/// Result of forwarding one command to the effector.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub gesture: String,
    pub command: CommandSpec,
    pub phase: CommandPhase,
    pub outcome: Result<(), EffectorError>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Running totals across the dispatcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub forwarded: u64,
    pub failed: u64,
}

/// Looks up mappings for gesture events and forwards them once.
///
/// Failed effector calls are reported and counted, never retried.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    stats: DispatchStats,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Dispatch one event. Returns `None` when the event maps to no command.
    pub fn dispatch<E: Effector + ?Sized>(
        &mut self,
        event: &GestureEvent,
        config: &GestureConfig,
        effector: &mut E,
    ) -> Option<DispatchReport> {
        let gesture = event.gesture();
        let Some(mapping) = config.mapping(gesture) else {
            debug!("No mapping for gesture {}, {} not forwarded", gesture, event.kind());
            return None;
        };
        let command = &mapping.command;
        let is_hold = matches!(command, CommandSpec::KeyHold { .. });

        let phase = match event {
            GestureEvent::Activated { .. } => CommandPhase::Activate,
            GestureEvent::HoldExpired { .. } if is_hold => CommandPhase::Release,
            GestureEvent::Deactivated { was_holding: true, .. } if is_hold => CommandPhase::Release,
            GestureEvent::Continuous { value, .. } => CommandPhase::Continuous { value: *value },
            GestureEvent::HoldExpired { .. } | GestureEvent::Deactivated { .. } => return None,
        };

        Some(self.forward(gesture, command, phase, effector))
    }

    /// Forward a command directly, bypassing mapping lookup.
    pub fn forward<E: Effector + ?Sized>(
        &mut self,
        gesture: &str,
        command: &CommandSpec,
        phase: CommandPhase,
        effector: &mut E,
    ) -> DispatchReport {
        let outcome = effector.execute(command, phase);
        self.stats.forwarded += 1;
        match &outcome {
            Ok(()) => {
                if !matches!(phase, CommandPhase::Continuous { .. }) {
                    debug!(
                        "Dispatched {} ({}) for {}",
                        command.describe(),
                        phase.as_str(),
                        gesture
                    );
                }
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!(
                    gesture,
                    command = command.kind(),
                    phase = phase.as_str(),
                    "effector failed: {}",
                    e
                );
            }
        }
        DispatchReport {
            gesture: gesture.to_string(),
            command: command.clone(),
            phase,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PINCH_CONFIG;
    use crate::effector::RecordingEffector;

    fn hold_config() -> GestureConfig {
        GestureConfig::from_json_str(
            r#"{
                "gestures": [
                    {
                        "name": "grab",
                        "conditions": [{"type": "distance", "points": [0, 12], "max": 0.1}]
                    },
                    {
                        "name": "fist",
                        "conditions": [{"type": "distance", "points": [0, 8], "max": 0.1}]
                    }
                ],
                "mappings": {
                    "grab": {"type": "key_hold", "key": "w", "duration": 0.5},
                    "fist": {"type": "volume", "analogue": {"condition": 0, "input": [0.0, 0.1]}}
                }
            }"#,
        )
        .unwrap()
    }

    fn activated(name: &str) -> GestureEvent {
        GestureEvent::Activated {
            gesture: name.into(),
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_activation_forwards_once() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new();

        let report = dispatcher.dispatch(&activated("pinch"), &config, &mut effector).unwrap();
        assert!(report.succeeded());
        assert_eq!(report.phase, CommandPhase::Activate);
        assert_eq!(
            effector.calls_in("activate"),
            vec![&CommandSpec::KeyPress { key: "space".into() }]
        );
        assert_eq!(dispatcher.stats().forwarded, 1);
    }

    #[test]
    fn test_unmapped_gesture_is_noop() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new();
        assert!(dispatcher.dispatch(&activated("wave"), &config, &mut effector).is_none());
        assert!(effector.calls().is_empty());
    }

    #[test]
    fn test_deactivation_of_key_press_is_noop() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new();
        let event = GestureEvent::Deactivated {
            gesture: "pinch".into(),
            timestamp_ms: 10.0,
            was_holding: false,
        };
        assert!(dispatcher.dispatch(&event, &config, &mut effector).is_none());
    }

    #[test]
    fn test_key_hold_release_paths() {
        let config = hold_config();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new();

        let expired = GestureEvent::HoldExpired {
            gesture: "grab".into(),
            timestamp_ms: 500.0,
            held_ms: 500.0,
        };
        let report = dispatcher.dispatch(&expired, &config, &mut effector).unwrap();
        assert_eq!(report.phase, CommandPhase::Release);

        let ended_after_expiry = GestureEvent::Deactivated {
            gesture: "grab".into(),
            timestamp_ms: 600.0,
            was_holding: false,
        };
        assert!(dispatcher.dispatch(&ended_after_expiry, &config, &mut effector).is_none());

        let ended_mid_hold = GestureEvent::Deactivated {
            gesture: "grab".into(),
            timestamp_ms: 100.0,
            was_holding: true,
        };
        let report = dispatcher.dispatch(&ended_mid_hold, &config, &mut effector).unwrap();
        assert_eq!(report.phase, CommandPhase::Release);
        assert_eq!(effector.calls_in("release").len(), 2);
    }

    #[test]
    fn test_continuous_value_forwarded() {
        let config = hold_config();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new();
        let event = GestureEvent::Continuous {
            gesture: "fist".into(),
            timestamp_ms: 0.0,
            value: 0.25,
        };
        let report = dispatcher.dispatch(&event, &config, &mut effector).unwrap();
        assert_eq!(report.phase, CommandPhase::Continuous { value: 0.25 });
        assert_eq!(report.command.kind(), "volume");
    }

    #[test]
    fn test_failure_reported_not_retried() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let mut dispatcher = CommandDispatcher::new();
        let mut effector = RecordingEffector::new().failing_on("key_press");

        let report = dispatcher.dispatch(&activated("pinch"), &config, &mut effector).unwrap();
        assert!(!report.succeeded());
        assert_eq!(effector.calls().len(), 1, "exactly one attempt");
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                forwarded: 1,
                failed: 1
            }
        );
    }
}
