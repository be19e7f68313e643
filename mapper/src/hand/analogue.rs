//! Continuous control values derived from condition scalars.

use serde::{Deserialize, Serialize};

/// Response curve applied between the input and output ranges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    #[default]
    Linear,
    /// `t^power` on the normalized input; `power > 0`.
    Power(f32),
}

impl Curve {
    fn apply(&self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::Power(exponent) => t.powf(*exponent),
        }
    }
}

fn default_output() -> [f32; 2] {
    [0.0, 1.0]
}

/// Maps one condition's raw scalar into an output range.
///
/// `input` may be inverted (`[hi, lo]`) to flip the direction of control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogueMapping {
    /// Index into the gesture's condition list.
    pub condition: usize,
    pub input: [f32; 2],
    #[serde(default = "default_output")]
    pub output: [f32; 2],
    #[serde(default)]
    pub curve: Curve,
}

impl AnalogueMapping {
    /// Transform a raw scalar, clamped to the output range.
    pub fn map(&self, value: f32) -> f32 {
        let [in_lo, in_hi] = self.input;
        let [out_lo, out_hi] = self.output;

        let t = (value - in_lo) / (in_hi - in_lo);
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let shaped = self.curve.apply(t);

        let out = out_lo + shaped * (out_hi - out_lo);
        out.clamp(out_lo.min(out_hi), out_lo.max(out_hi))
    }
}
