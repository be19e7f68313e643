//! Effector seam: where resolved commands leave the engine.
//!
//! The engine never synthesizes input itself. An `Effector` receives each
//! command together with the phase it is delivered in and reports success or
//! failure. Continuous commands arrive once per frame and must not accumulate
//! side effects beyond the one intended per call.

use tracing::info;

use crate::config::CommandSpec;
use crate::error::EffectorError;

/// Phase a command is delivered in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandPhase {
    /// Gesture activation edge.
    Activate,
    /// End of a timed hold (deactivation, expiry or reload).
    Release,
    /// Per-frame analogue value while engaged.
    Continuous { value: f32 },
}

impl CommandPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Release => "release",
            Self::Continuous { .. } => "continuous",
        }
    }
}

/// Executes commands on behalf of the engine.
pub trait Effector {
    fn execute(&mut self, command: &CommandSpec, phase: CommandPhase) -> Result<(), EffectorError>;
}

impl<E: Effector + ?Sized> Effector for &mut E {
    fn execute(&mut self, command: &CommandSpec, phase: CommandPhase) -> Result<(), EffectorError> {
        (**self).execute(command, phase)
    }
}

impl<E: Effector + ?Sized> Effector for Box<E> {
    fn execute(&mut self, command: &CommandSpec, phase: CommandPhase) -> Result<(), EffectorError> {
        (**self).execute(command, phase)
    }
}

// ── Dry-run effector ───────────────────────────────────────

/// Logs every command instead of performing it.
#[derive(Debug, Default)]
pub struct LogEffector {
    executed: u64,
}

impl LogEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands logged so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}

impl Effector for LogEffector {
    fn execute(&mut self, command: &CommandSpec, phase: CommandPhase) -> Result<(), EffectorError> {
        self.executed += 1;
        match phase {
            CommandPhase::Continuous { value } => {
                info!(command = command.kind(), value, "{} {:.3}", command.describe(), value)
            }
            _ => info!(command = command.kind(), phase = phase.as_str(), "{}", command.describe()),
        }
        Ok(())
    }
}

// ── Recording effector ─────────────────────────────────────

/// Records every call; can be scripted to fail for chosen command kinds.
#[derive(Debug, Default)]
pub struct RecordingEffector {
    calls: Vec<(CommandSpec, CommandPhase)>,
    failing_kinds: Vec<&'static str>,
}

impl RecordingEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command of `kind` (e.g. `"key_press"`) fail.
    pub fn failing_on(mut self, kind: &'static str) -> Self {
        self.failing_kinds.push(kind);
        self
    }

    /// All calls in delivery order, including failed ones.
    pub fn calls(&self) -> &[(CommandSpec, CommandPhase)] {
        &self.calls
    }

    /// Calls delivered in the given phase kind (`"activate"`, `"release"`, `"continuous"`).
    pub fn calls_in(&self, phase: &str) -> Vec<&CommandSpec> {
        self.calls
            .iter()
            .filter(|(_, p)| p.as_str() == phase)
            .map(|(c, _)| c)
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Effector for RecordingEffector {
    fn execute(&mut self, command: &CommandSpec, phase: CommandPhase) -> Result<(), EffectorError> {
        self.calls.push((command.clone(), phase));
        if self.failing_kinds.contains(&command.kind()) {
            return Err(EffectorError::Failed {
                reason: format!("scripted failure for {}", command.kind()),
            });
        }
        Ok(())
    }
}
