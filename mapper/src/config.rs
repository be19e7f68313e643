//! Gesture configuration: schema, command specs and load-time validation.
//!
//! A config is parsed from JSON and validated as a whole. Any validation
//! failure rejects the entire config, so an engine only ever holds a fully
//! consistent snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::hand::analogue::{AnalogueMapping, Curve};
use crate::hand::condition::{Condition, GestureDefinition};
use crate::hand::gesture::DebounceConfig;
use crate::hand::keypoints::LANDMARK_COUNT;
use crate::hand::normalize::Transformations;

/// Frames with overall detection confidence below this are treated as absent.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

// ── Commands ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAxis {
    #[default]
    Vertical,
    Horizontal,
}

impl ScrollAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

fn default_hold_secs() -> f32 {
    0.1
}

fn default_clicks() -> u32 {
    1
}

fn default_move_amount() -> f32 {
    100.0
}

fn default_scroll_amount() -> f32 {
    10.0
}

fn default_volume_amount() -> f32 {
    5.0
}

/// What to do when a gesture fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandSpec {
    KeyPress {
        key: String,
    },
    /// Press a key and keep it down for `duration` seconds or until the
    /// gesture deactivates.
    KeyHold {
        key: String,
        #[serde(default = "default_hold_secs")]
        duration: f32,
    },
    MouseClick {
        #[serde(default)]
        button: MouseButton,
        #[serde(default = "default_clicks")]
        clicks: u32,
    },
    /// Pointer motion along `(dx, dy)` scaled by the analogue value and `amount`.
    MouseMove {
        #[serde(default, alias = "movement_x")]
        dx: f32,
        #[serde(default, alias = "movement_y")]
        dy: f32,
        #[serde(default = "default_move_amount", alias = "sensitivity")]
        amount: f32,
    },
    Scroll {
        #[serde(default, alias = "direction")]
        axis: ScrollAxis,
        #[serde(default = "default_scroll_amount", alias = "sensitivity")]
        amount: f32,
    },
    Volume {
        #[serde(default = "default_volume_amount", alias = "sensitivity")]
        amount: f32,
    },
    /// Opaque identifier handed to the effector.
    Custom {
        #[serde(alias = "command")]
        identifier: String,
    },
}

impl CommandSpec {
    /// Tag name as used in the config schema.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyPress { .. } => "key_press",
            Self::KeyHold { .. } => "key_hold",
            Self::MouseClick { .. } => "mouse_click",
            Self::MouseMove { .. } => "mouse_move",
            Self::Scroll { .. } => "scroll",
            Self::Volume { .. } => "volume",
            Self::Custom { .. } => "custom",
        }
    }

    /// Whether this command is driven by an analogue value every frame.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::MouseMove { .. } | Self::Scroll { .. } | Self::Volume { .. }
        )
    }

    /// Hold duration in milliseconds for timed holds.
    pub fn hold_ms(&self) -> Option<f64> {
        match self {
            Self::KeyHold { duration, .. } => Some(f64::from(*duration) * 1000.0),
            _ => None,
        }
    }

    /// Short form for logs, e.g. `key_press(space)`.
    pub fn describe(&self) -> String {
        match self {
            Self::KeyPress { key } => format!("key_press({})", key),
            Self::KeyHold { key, duration } => format!("key_hold({}, {}s)", key, duration),
            Self::MouseClick { button, clicks } => {
                format!("mouse_click({} x{})", button.as_str(), clicks)
            }
            Self::MouseMove { dx, dy, amount } => {
                format!("mouse_move({}, {}) x{}", dx, dy, amount)
            }
            Self::Scroll { axis, amount } => format!("scroll({}) x{}", axis.as_str(), amount),
            Self::Volume { amount } => format!("volume x{}", amount),
            Self::Custom { identifier } => format!("custom({})", identifier),
        }
    }

    /// First problem with this command's fields, if any.
    fn check(&self) -> Option<String> {
        let finite =
            |name: &str, v: f32| (!v.is_finite()).then(|| format!("{} must be finite", name));
        match self {
            Self::KeyPress { key } if key.trim().is_empty() => Some("key_press needs a key".into()),
            Self::KeyHold { key, .. } if key.trim().is_empty() => {
                Some("key_hold needs a key".into())
            }
            Self::KeyHold { duration, .. } if !(duration.is_finite() && *duration > 0.0) => {
                Some(format!("key_hold duration {} must be > 0", duration))
            }
            Self::MouseClick { clicks: 0, .. } => Some("mouse_click clicks must be >= 1".into()),
            Self::MouseMove { dx, dy, amount } => finite("dx", *dx)
                .or_else(|| finite("dy", *dy))
                .or_else(|| finite("amount", *amount)),
            Self::Scroll { amount, .. } | Self::Volume { amount } => finite("amount", *amount),
            Self::Custom { identifier } if identifier.trim().is_empty() => {
                Some("custom needs a command identifier".into())
            }
            _ => None,
        }
    }
}

/// A gesture's command binding, optionally driven as an analogue control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(flatten)]
    pub command: CommandSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analogue: Option<AnalogueMapping>,
}

impl Mapping {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            analogue: None,
        }
    }

    pub fn with_analogue(mut self, analogue: AnalogueMapping) -> Self {
        self.analogue = Some(analogue);
        self
    }
}

// ── Config snapshot ────────────────────────────────────────

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

/// Complete gesture set, bindings and tuning. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub transformations: Transformations,
    #[serde(default)]
    pub gestures: Vec<GestureDefinition>,
    /// Gesture name → binding. Gestures without an entry are recognized only.
    #[serde(default)]
    pub mappings: BTreeMap<String, Mapping>,
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            transformations: Transformations::default(),
            gestures: Vec::new(),
            mappings: BTreeMap::new(),
            debounce: DebounceConfig::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl GestureConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            warn!("Gesture config rejected: {}", e);
            return Err(e);
        }
        info!(
            "Gesture config loaded: {} gestures, {} mappings",
            config.gestures.len(),
            config.mappings.len()
        );
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize back to the JSON schema.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn gesture(&self, name: &str) -> Option<&GestureDefinition> {
        self.gestures.iter().find(|g| g.name == name)
    }

    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    /// Hold duration for a gesture bound to a timed hold.
    pub fn hold_ms(&self, name: &str) -> Option<f64> {
        self.mapping(name).and_then(|m| m.command.hold_ms())
    }

    /// Check every rule; the first failure is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidConfidence {
                value: self.min_confidence,
            });
        }
        if self.debounce.activate_frames == 0 || self.debounce.deactivate_frames == 0 {
            return Err(ConfigError::InvalidDebounce {
                reason: format!(
                    "frame counts must be >= 1 (activate {}, deactivate {})",
                    self.debounce.activate_frames, self.debounce.deactivate_frames
                ),
            });
        }
        let cooldown = self.debounce.cooldown_ms;
        if !(cooldown.is_finite() && cooldown >= 0.0) {
            return Err(ConfigError::InvalidDebounce {
                reason: format!("cooldown_ms {} must be >= 0", cooldown),
            });
        }

        for (index, gesture) in self.gestures.iter().enumerate() {
            if gesture.name.trim().is_empty() {
                return Err(ConfigError::EmptyGestureName { index });
            }
            if self.gestures[..index].iter().any(|g| g.name == gesture.name) {
                return Err(ConfigError::DuplicateGesture {
                    name: gesture.name.clone(),
                });
            }
            validate_gesture(gesture)?;
        }

        for (name, mapping) in &self.mappings {
            let Some(gesture) = self.gesture(name) else {
                return Err(ConfigError::DanglingMapping { name: name.clone() });
            };
            validate_mapping(gesture, mapping)?;
        }

        Ok(())
    }

    // ── Editing ────────────────────────────────────────────

    /// New snapshot with `gesture` appended. Names must stay unique.
    pub fn with_gesture(&self, gesture: GestureDefinition) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        next.gestures.push(gesture);
        next.validated()
    }

    /// New snapshot with the same-named gesture replaced by `gesture`.
    pub fn with_updated_gesture(&self, gesture: GestureDefinition) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        let Some(slot) = next.gestures.iter_mut().find(|g| g.name == gesture.name) else {
            return Err(ConfigError::UnknownGesture { name: gesture.name });
        };
        *slot = gesture;
        next.validated()
    }

    /// New snapshot without the named gesture or its mapping.
    pub fn without_gesture(&self, name: &str) -> Result<Self, ConfigError> {
        if self.gesture(name).is_none() {
            return Err(ConfigError::UnknownGesture { name: name.to_string() });
        }
        let mut next = self.clone();
        next.gestures.retain(|g| g.name != name);
        next.mappings.remove(name);
        next.validated()
    }

    /// New snapshot binding `name` to `mapping`, replacing any existing binding.
    pub fn with_mapping(&self, name: &str, mapping: Mapping) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        next.mappings.insert(name.to_string(), mapping);
        next.validated()
    }

    /// New snapshot with the named gesture left unbound.
    pub fn without_mapping(&self, name: &str) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if next.mappings.remove(name).is_none() {
            return Err(ConfigError::UnknownMapping { name: name.to_string() });
        }
        next.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

// ── Validation ─────────────────────────────────────────────

fn validate_gesture(gesture: &GestureDefinition) -> Result<(), ConfigError> {
    if gesture.conditions.is_empty() {
        return Err(ConfigError::EmptyConditions {
            gesture: gesture.name.clone(),
        });
    }

    for (ci, condition) in gesture.conditions.iter().enumerate() {
        if let Some(point) = condition.points().into_iter().find(|p| *p >= LANDMARK_COUNT) {
            return Err(ConfigError::PointOutOfRange {
                gesture: gesture.name.clone(),
                condition: ci,
                point,
            });
        }

        let region_error = |reason: String| ConfigError::InvalidRegion {
            gesture: gesture.name.clone(),
            condition: ci,
            reason,
        };

        match condition {
            Condition::Distance { min, max, .. } | Condition::Angle { min, max, .. } => {
                if min.is_none() && max.is_none() {
                    return Err(ConfigError::MissingBound {
                        gesture: gesture.name.clone(),
                        condition: ci,
                        kind: condition.kind(),
                    });
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(ConfigError::InvertedRange {
                            gesture: gesture.name.clone(),
                            condition: ci,
                            min: *lo,
                            max: *hi,
                        });
                    }
                }
            }
            Condition::Position { target, radius, .. } => match target.axis_bounds() {
                None => match radius {
                    Some(r) if r.is_finite() && *r > 0.0 => {}
                    Some(r) => return Err(region_error(format!("radius {} must be > 0", r))),
                    None => return Err(region_error("point target needs a radius".into())),
                },
                Some(axes) => {
                    if axes.iter().all(|(lo, hi)| lo.is_none() && hi.is_none()) {
                        let reason = "bounds target needs at least one bound";
                        return Err(region_error(reason.into()));
                    }
                    for (axis, (lo, hi)) in ["x", "y", "z"].iter().zip(axes.iter()) {
                        if let (Some(lo), Some(hi)) = (lo, hi) {
                            if lo > hi {
                                return Err(region_error(format!(
                                    "{}_min {} > {}_max {}",
                                    axis, lo, axis, hi
                                )));
                            }
                        }
                    }
                }
            },
        }
    }

    Ok(())
}

fn validate_mapping(gesture: &GestureDefinition, mapping: &Mapping) -> Result<(), ConfigError> {
    let command = &mapping.command;
    if let Some(reason) = command.check() {
        return Err(ConfigError::InvalidCommand {
            gesture: gesture.name.clone(),
            reason,
        });
    }

    let analogue_error = |reason: String| ConfigError::InvalidAnalogue {
        gesture: gesture.name.clone(),
        reason,
    };

    match &mapping.analogue {
        None if command.is_continuous() => Err(ConfigError::InvalidCommand {
            gesture: gesture.name.clone(),
            reason: format!("{} needs an analogue mapping", command.kind()),
        }),
        None => Ok(()),
        Some(_) if !command.is_continuous() && !matches!(command, CommandSpec::Custom { .. }) => {
            Err(analogue_error(format!("{} cannot be driven continuously", command.kind())))
        }
        Some(analogue) => {
            if analogue.condition >= gesture.conditions.len() {
                return Err(analogue_error(format!(
                    "condition index {} out of range ({} conditions)",
                    analogue.condition,
                    gesture.conditions.len()
                )));
            }
            let [in_lo, in_hi] = analogue.input;
            if !(in_lo.is_finite() && in_hi.is_finite()) || in_lo == in_hi {
                return Err(analogue_error(format!(
                    "input range [{}, {}] is empty",
                    in_lo, in_hi
                )));
            }
            if !analogue.output.iter().all(|v| v.is_finite()) {
                return Err(analogue_error("output range must be finite".into()));
            }
            if let Curve::Power(exponent) = analogue.curve {
                if !(exponent.is_finite() && exponent > 0.0) {
                    return Err(analogue_error(format!("power {} must be > 0", exponent)));
                }
            }
            Ok(())
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) const PINCH_CONFIG: &str = r#"{
    "transformations": {
        "displacement_invariant": false,
        "scale_invariant": false,
        "rotation_invariant": false
    },
    "gestures": [
        {
            "name": "pinch",
            "conditions": [{"type": "distance", "points": [4, 8], "min": 0, "max": 0.05}]
        }
    ],
    "mappings": {"pinch": {"type": "key_press", "key": "space"}},
    "debounce": {"activate_frames": 1, "deactivate_frames": 2}
}"#;

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// One gesture `g` with a distance condition on the thumb and index tips.
    const ONE_GESTURE: &str =
        r#"[{"name": "g", "conditions": [{"type": "distance", "points": [4, 8], "max": 0.2}]}]"#;

    /// One gesture `g` with the given condition object.
    fn gesture_with(condition: &str) -> String {
        format!(r#"[{{"name": "g", "conditions": [{}]}}]"#, condition)
    }

    fn with_gestures(gestures: &str, mappings: &str) -> Result<GestureConfig, ConfigError> {
        GestureConfig::from_json_str(&format!(
            r#"{{"gestures": {}, "mappings": {}}}"#,
            gestures, mappings
        ))
    }

    #[test]
    fn test_load_pinch_config() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        assert_eq!(config.gestures.len(), 1);
        assert_eq!(config.debounce.activate_frames, 1);
        assert_eq!(config.min_confidence, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(
            config.mapping("pinch").unwrap().command,
            CommandSpec::KeyPress { key: "space".into() }
        );
        assert!(config.hold_ms("pinch").is_none());
    }

    #[test]
    fn test_defaults_when_sections_omitted() {
        let config = GestureConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GestureConfig::default());
        assert!(!config.transformations.rotation_invariant);
        assert_eq!(config.debounce, DebounceConfig::default());
    }

    #[test]
    fn test_unknown_condition_type_rejected() {
        let err = with_gestures(
            r#"[{"name": "g", "conditions": [{"type": "curl", "points": [1, 2]}]}]"#,
            "{}",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "got {:?}", err);
    }

    #[test]
    fn test_unknown_command_type_rejected() {
        let err = with_gestures(ONE_GESTURE, r#"{"g": {"type": "teleport"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "got {:?}", err);
    }

    #[test]
    fn test_point_out_of_range() {
        let condition = r#"{"type": "distance", "points": [4, 21], "max": 0.1}"#;
        let err = with_gestures(&gesture_with(condition), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::PointOutOfRange { point: 21, .. }));
    }

    #[test]
    fn test_min_greater_than_max() {
        let condition = r#"{"type": "angle", "points": [5, 6, 7], "min": 90, "max": 10}"#;
        let err = with_gestures(&gesture_with(condition), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { .. }));
    }

    #[test]
    fn test_missing_bounds() {
        let err = with_gestures(
            r#"[{"name": "g", "conditions": [{"type": "distance", "points": [4, 8]}]}]"#,
            "{}",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBound { kind: "distance", .. }));
    }

    #[test]
    fn test_empty_conditions_and_names() {
        let err = with_gestures(r#"[{"name": "g", "conditions": []}]"#, "{}").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyConditions { .. }));

        let unnamed = ONE_GESTURE.replace(r#""name": "g""#, r#""name": " ""#);
        let err = with_gestures(&unnamed, "{}").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyGestureName { index: 0 }));
    }

    #[test]
    fn test_duplicate_gesture_names() {
        let g = ONE_GESTURE.trim_start_matches('[').trim_end_matches(']');
        let err = with_gestures(&format!("[{}, {}]", g, g), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateGesture { .. }));
    }

    #[test]
    fn test_position_targets() {
        let position = |target: &str| {
            gesture_with(&format!(
                r#"{{"type": "position", "point": 8, "target": {}}}"#,
                target
            ))
        };

        let err = with_gestures(&position(r#"{"x": 0.5, "y": 0.5}"#), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion { .. }));

        let err = with_gestures(&position("{}"), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion { .. }));

        let err = with_gestures(&position(r#"{"x_min": 0.6, "x_max": 0.4}"#), "{}").unwrap_err();
        assert!(err.to_string().contains("x_min"));

        assert!(with_gestures(&position(r#"{"y_max": 0.3}"#), "{}").is_ok());
    }

    #[test]
    fn test_dangling_mapping() {
        let err =
            with_gestures("[]", r#"{"wave": {"type": "key_press", "key": "a"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::DanglingMapping { ref name } if name == "wave"));
    }

    #[test]
    fn test_command_defaults_and_aliases() {
        let g = ONE_GESTURE;

        let config = with_gestures(g, r#"{"g": {"type": "key_hold", "key": "w"}}"#).unwrap();
        assert_eq!(config.hold_ms("g"), Some(f64::from(0.1f32) * 1000.0));

        let config = with_gestures(g, r#"{"g": {"type": "mouse_click"}}"#).unwrap();
        assert_eq!(
            config.mapping("g").unwrap().command,
            CommandSpec::MouseClick {
                button: MouseButton::Left,
                clicks: 1
            }
        );

        let config = with_gestures(
            g,
            r#"{"g": {"type": "scroll", "direction": "horizontal", "sensitivity": 3,
                      "analogue": {"condition": 0, "input": [0.0, 0.2]}}}"#,
        )
        .unwrap();
        let mapping = config.mapping("g").unwrap();
        assert_eq!(
            mapping.command,
            CommandSpec::Scroll {
                axis: ScrollAxis::Horizontal,
                amount: 3.0
            }
        );
        assert_eq!(mapping.analogue.as_ref().unwrap().output, [0.0, 1.0]);

        let config =
            with_gestures(g, r#"{"g": {"type": "custom", "command": "next-track"}}"#).unwrap();
        assert_eq!(
            config.mapping("g").unwrap().command,
            CommandSpec::Custom {
                identifier: "next-track".into()
            }
        );
    }

    #[test]
    fn test_invalid_commands() {
        let g = ONE_GESTURE;

        let err = with_gestures(g, r#"{"g": {"type": "key_press", "key": ""}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCommand { .. }));

        let zero_hold = r#"{"g": {"type": "key_hold", "key": "w", "duration": 0}}"#;
        let err = with_gestures(g, zero_hold).unwrap_err();
        assert!(err.to_string().contains("duration"));

        let err = with_gestures(g, r#"{"g": {"type": "volume"}}"#).unwrap_err();
        assert!(err.to_string().contains("needs an analogue mapping"));

        let err = with_gestures(
            g,
            r#"{"g": {
                "type": "key_press",
                "key": "a",
                "analogue": {"condition": 0, "input": [0, 1]}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnalogue { .. }));
    }

    #[test]
    fn test_invalid_analogue() {
        let g = ONE_GESTURE;

        let err = with_gestures(
            g,
            r#"{"g": {"type": "volume", "analogue": {"condition": 1, "input": [0, 1]}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("condition index 1"));

        let err = with_gestures(
            g,
            r#"{"g": {"type": "volume", "analogue": {"condition": 0, "input": [0.1, 0.1]}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("is empty"));

        let err = with_gestures(
            g,
            r#"{"g": {
                "type": "volume",
                "analogue": {"condition": 0, "input": [0, 1], "curve": {"power": 0}}
            }}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("power"));
    }

    #[test]
    fn test_debounce_and_confidence_limits() {
        let err =
            GestureConfig::from_json_str(r#"{"debounce": {"activate_frames": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDebounce { .. }));

        let err =
            GestureConfig::from_json_str(r#"{"debounce": {"cooldown_ms": -1}}"#).unwrap_err();
        assert!(err.to_string().contains("cooldown_ms"));

        let config =
            GestureConfig::from_json_str(r#"{"debounce": {"cooldown_ms": 250}}"#).unwrap();
        assert_eq!(config.debounce.cooldown_ms, 250.0);
        assert_eq!(config.debounce.activate_frames, 2);

        let err = GestureConfig::from_json_str(r#"{"min_confidence": 1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfidence { .. }));
    }

    fn gesture_named(name: &str) -> GestureDefinition {
        let mut gesture = GestureConfig::from_json_str(PINCH_CONFIG).unwrap().gestures[0].clone();
        gesture.name = name.into();
        gesture
    }

    fn key(key: &str) -> Mapping {
        Mapping::new(CommandSpec::KeyPress { key: key.into() })
    }

    #[test]
    fn test_with_gesture_appends_and_rejects_duplicates() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let next = config.with_gesture(gesture_named("tap")).unwrap();
        assert_eq!(next.gestures.len(), 2);
        assert_eq!(next.gestures[1].name, "tap");
        // The source snapshot is untouched.
        assert_eq!(config.gestures.len(), 1);

        let err = next.with_gesture(gesture_named("tap")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateGesture { ref name } if name == "tap"));

        let mut empty = gesture_named("fist");
        empty.conditions.clear();
        let err = config.with_gesture(empty).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyConditions { .. }));
    }

    #[test]
    fn test_with_updated_gesture() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let mut wider = gesture_named("pinch");
        if let Condition::Distance { max, .. } = &mut wider.conditions[0] {
            *max = Some(0.1);
        }
        let next = config.with_updated_gesture(wider.clone()).unwrap();
        assert_eq!(next.gesture("pinch"), Some(&wider));
        assert!(next.mapping("pinch").is_some());

        let err = config.with_updated_gesture(gesture_named("tap")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGesture { ref name } if name == "tap"));
    }

    #[test]
    fn test_without_gesture_drops_its_mapping() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG)
            .unwrap()
            .with_gesture(gesture_named("tap"))
            .unwrap()
            .with_mapping("tap", key("enter"))
            .unwrap();

        let next = config.without_gesture("pinch").unwrap();
        assert!(next.gesture("pinch").is_none());
        assert!(next.mapping("pinch").is_none());
        assert_eq!(next.mapping("tap"), Some(&key("enter")));
        assert!(next.validate().is_ok());

        let err = next.without_gesture("pinch").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGesture { .. }));
    }

    #[test]
    fn test_mapping_edits() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();

        let next = config.with_mapping("pinch", key("enter")).unwrap();
        assert_eq!(next.mapping("pinch"), Some(&key("enter")));

        let err = config.with_mapping("wave", key("a")).unwrap_err();
        assert!(matches!(err, ConfigError::DanglingMapping { ref name } if name == "wave"));

        let err = config
            .with_mapping("pinch", Mapping::new(CommandSpec::Volume { amount: 5.0 }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCommand { .. }));

        let unbound = config.without_mapping("pinch").unwrap();
        assert!(unbound.mappings.is_empty());
        assert!(unbound.gesture("pinch").is_some());
        let err = unbound.without_mapping("pinch").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMapping { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let config = GestureConfig::from_json_str(PINCH_CONFIG).unwrap();
        let json = config.to_json_pretty().unwrap();
        let reloaded = GestureConfig::from_json_str(&json).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PINCH_CONFIG.as_bytes()).unwrap();
        let config = GestureConfig::from_path(file.path()).unwrap();
        assert!(config.gesture("pinch").is_some());

        let dir = tempfile::tempdir().unwrap();
        let err = GestureConfig::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
