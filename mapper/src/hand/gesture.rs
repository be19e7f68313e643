//! Per-gesture activation tracking with debounce and hysteresis.
//!
//! Turns noisy per-frame match results into edge-triggered events: a gesture
//! activates after N consecutive matching frames and deactivates after M
//! consecutive misses. Gestures bound to a timed key hold enter `Holding` on
//! activation and drop back to `Active` once the hold duration elapses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::condition::GestureDefinition;

// ── Phases ─────────────────────────────────────────────────

/// Activation phase of a single gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GesturePhase {
    #[default]
    Inactive,
    Active,
    /// Active and currently holding a timed command.
    Holding,
}

impl GesturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Holding => "holding",
        }
    }

    /// Whether the gesture is engaged (active or holding).
    pub fn is_engaged(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

// ── Events ─────────────────────────────────────────────────

/// Events emitted by gesture tracking.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// Gesture crossed the activation threshold.
    Activated { gesture: String, timestamp_ms: f64 },
    /// A timed hold ran its full duration while the gesture stayed engaged.
    HoldExpired {
        gesture: String,
        timestamp_ms: f64,
        held_ms: f64,
    },
    /// Gesture crossed the deactivation threshold.
    Deactivated {
        gesture: String,
        timestamp_ms: f64,
        was_holding: bool,
    },
    /// Analogue value for an engaged continuous gesture.
    Continuous {
        gesture: String,
        timestamp_ms: f64,
        value: f32,
    },
}

impl GestureEvent {
    /// Name of the gesture this event belongs to.
    pub fn gesture(&self) -> &str {
        match self {
            Self::Activated { gesture, .. }
            | Self::HoldExpired { gesture, .. }
            | Self::Deactivated { gesture, .. }
            | Self::Continuous { gesture, .. } => gesture,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Activated { .. } => "activated",
            Self::HoldExpired { .. } => "hold-expired",
            Self::Deactivated { .. } => "deactivated",
            Self::Continuous { .. } => "continuous",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Default minimum gap between two activations of the same gesture.
pub const DEFAULT_COOLDOWN_MS: f64 = 500.0;

/// Consecutive-frame thresholds for activation and deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Matching frames in a row before a gesture activates (N).
    pub activate_frames: u32,
    /// Missed frames in a row before an engaged gesture deactivates (M).
    pub deactivate_frames: u32,
    /// Milliseconds after an activation during which the same gesture may
    /// not activate again. Zero disables the cooldown.
    pub cooldown_ms: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            activate_frames: 2,
            deactivate_frames: 3,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

impl DebounceConfig {
    /// Whether an activation at `timestamp_ms` falls inside the cooldown
    /// window of the previous one.
    pub fn cooling_down(&self, last_trigger_ms: Option<f64>, timestamp_ms: f64) -> bool {
        last_trigger_ms
            .map(|last| timestamp_ms - last < self.cooldown_ms)
            .unwrap_or(false)
    }
}

// ── Per-gesture state ──────────────────────────────────────

/// Runtime bookkeeping for one gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureRuntimeState {
    pub phase: GesturePhase,
    pub consecutive_matches: u32,
    pub consecutive_misses: u32,
    /// Timestamp (ms) of the most recent activation.
    pub last_trigger_ms: Option<f64>,
    /// Latest analogue output while engaged.
    pub continuous_value: Option<f32>,
}

impl GestureRuntimeState {
    fn new() -> Self {
        Self::default()
    }
}

// ── Tracker ────────────────────────────────────────────────

/// Keyed store of runtime state, one entry per configured gesture.
#[derive(Debug, Default)]
pub struct GestureTracker {
    states: HashMap<String, GestureRuntimeState>,
}

impl GestureTracker {
    /// Create a tracker with a fresh inactive entry for every gesture.
    pub fn new(gestures: &[GestureDefinition]) -> Self {
        let states = gestures
            .iter()
            .map(|g| (g.name.clone(), GestureRuntimeState::new()))
            .collect();
        Self { states }
    }

    /// Feed one frame's match result for a gesture and return any transitions.
    ///
    /// `hold_ms` is the hold duration when the gesture is bound to a timed
    /// hold command.
    pub fn observe(
        &mut self,
        gesture: &str,
        matched: bool,
        timestamp_ms: f64,
        debounce: &DebounceConfig,
        hold_ms: Option<f64>,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        let st = self.states.entry(gesture.to_string()).or_default();

        if matched {
            st.consecutive_matches = st.consecutive_matches.saturating_add(1);
            st.consecutive_misses = 0;
        } else {
            st.consecutive_misses = st.consecutive_misses.saturating_add(1);
            st.consecutive_matches = 0;
        }

        match st.phase {
            GesturePhase::Inactive => {
                let ready = matched && st.consecutive_matches >= debounce.activate_frames;
                if ready && debounce.cooling_down(st.last_trigger_ms, timestamp_ms) {
                    debug!("Gesture cooling down: {} at {:.0}ms", gesture, timestamp_ms);
                } else if ready {
                    st.phase = if hold_ms.is_some() {
                        GesturePhase::Holding
                    } else {
                        GesturePhase::Active
                    };
                    st.last_trigger_ms = Some(timestamp_ms);
                    debug!(
                        "Gesture activated: {} ({}) at {:.0}ms",
                        gesture,
                        st.phase.as_str(),
                        timestamp_ms
                    );
                    events.push(GestureEvent::Activated {
                        gesture: gesture.to_string(),
                        timestamp_ms,
                    });
                }
            }
            GesturePhase::Active | GesturePhase::Holding => {
                if !matched && st.consecutive_misses >= debounce.deactivate_frames {
                    let was_holding = st.phase == GesturePhase::Holding;
                    st.phase = GesturePhase::Inactive;
                    st.continuous_value = None;
                    debug!("Gesture deactivated: {} at {:.0}ms", gesture, timestamp_ms);
                    events.push(GestureEvent::Deactivated {
                        gesture: gesture.to_string(),
                        timestamp_ms,
                        was_holding,
                    });
                } else if st.phase == GesturePhase::Holding {
                    let started = st.last_trigger_ms.unwrap_or(timestamp_ms);
                    let held_ms = timestamp_ms - started;
                    let expired = hold_ms.map(|limit| held_ms >= limit).unwrap_or(true);
                    if expired {
                        st.phase = GesturePhase::Active;
                        debug!("Gesture hold expired: {} after {:.0}ms", gesture, held_ms);
                        events.push(GestureEvent::HoldExpired {
                            gesture: gesture.to_string(),
                            timestamp_ms,
                            held_ms,
                        });
                    }
                }
            }
        }

        events
    }

    /// Record the latest analogue output for a gesture.
    pub fn set_continuous(&mut self, gesture: &str, value: Option<f32>) {
        if let Some(st) = self.states.get_mut(gesture) {
            st.continuous_value = value;
        }
    }

    /// Drop a gesture out of `Holding` without deactivating it.
    pub fn end_hold(&mut self, gesture: &str) {
        if let Some(st) = self.states.get_mut(gesture) {
            if st.phase == GesturePhase::Holding {
                st.phase = GesturePhase::Active;
            }
        }
    }

    /// Runtime state for a gesture, if it is tracked.
    pub fn state(&self, gesture: &str) -> Option<&GestureRuntimeState> {
        self.states.get(gesture)
    }

    /// Phase of a gesture; untracked gestures are inactive.
    pub fn phase(&self, gesture: &str) -> GesturePhase {
        self.states
            .get(gesture)
            .map(|s| s.phase)
            .unwrap_or_default()
    }

    /// Number of tracked gestures.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Carry state across a config swap.
    ///
    /// Gestures whose name and conditions are unchanged keep their state;
    /// changed or new gestures start fresh; removed gestures are dropped.
    /// Returns the names of discarded entries that were mid-hold, so the
    /// caller can release their commands.
    pub fn reconcile(
        &mut self,
        old: &[GestureDefinition],
        new: &[GestureDefinition],
    ) -> Vec<String> {
        let mut previous = std::mem::take(&mut self.states);
        let mut interrupted = Vec::new();

        for def in new {
            let unchanged = old
                .iter()
                .any(|o| o.name == def.name && o.conditions == def.conditions);
            let carried = if unchanged {
                previous.remove(&def.name)
            } else {
                None
            };
            self.states
                .insert(def.name.clone(), carried.unwrap_or_else(GestureRuntimeState::new));
        }

        for (name, st) in previous {
            if st.phase == GesturePhase::Holding {
                interrupted.push(name.clone());
            }
            debug!("Gesture state discarded on reload: {} ({})", name, st.phase.as_str());
        }
        interrupted.sort();
        interrupted
    }

    /// Reset every gesture to inactive with zero counters.
    pub fn reset(&mut self) {
        for st in self.states.values_mut() {
            *st = GestureRuntimeState::new();
        }
    }

    /// Generate s-expression for status reporting, in the given gesture order.
    pub fn status_sexp(&self, order: &[GestureDefinition]) -> String {
        if order.is_empty() {
            return "nil".to_string();
        }
        let mut s = String::from("(");
        for (i, def) in order.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            let st = self.states.get(&def.name).cloned().unwrap_or_default();
            let value = st
                .continuous_value
                .map(|v| format!("{:.3}", v))
                .unwrap_or_else(|| "nil".to_string());
            s.push_str(&format!(
                "(:gesture {} :phase {} :matches {} :misses {} :value {})",
                sexp_string(&def.name),
                st.phase.as_str(),
                st.consecutive_matches,
                st.consecutive_misses,
                value,
            ));
        }
        s.push(')');
        s
    }
}

/// Quote a string for an s-expression, escaping `\` and `"`.
pub fn sexp_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

// ── Tests ──────────────────────────────────────────────────
