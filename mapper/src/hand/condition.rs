//! Geometric conditions and gesture matching against canonical frames.
//!
//! A gesture matches a frame only when every one of its conditions passes.
//! Each condition also reports its raw scalar (distance, angle in degrees or
//! offset from a target region) whether or not it passed, so analogue
//! controls can read it.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::keypoints::{landmark_label, HandLandmark};
use super::normalize::{distance, CanonicalFrame};

// ── Condition types ────────────────────────────────────────

/// How tightly a condition was recorded. Kept with the gesture for editors
/// that derive bounds from a captured pose; matching ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Strict,
    Loose,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Loose => "loose",
        }
    }
}

/// A single geometric test on canonical keypoints.
///
/// Points are landmark indices; the config may also name them
/// (`"index-tip"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Euclidean distance between two points within `[min, max]`.
    Distance {
        #[serde(deserialize_with = "landmark_indices")]
        points: [usize; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        importance: Option<Importance>,
    },
    /// Angle at the middle point, in degrees, within `[min, max]`.
    Angle {
        /// `[a, vertex, b]`.
        #[serde(deserialize_with = "landmark_indices")]
        points: [usize; 3],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        importance: Option<Importance>,
    },
    /// A point lies inside a target region.
    Position {
        #[serde(deserialize_with = "landmark_index")]
        point: usize,
        target: Target,
        /// Required for point targets, ignored for bounds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        importance: Option<Importance>,
    },
}

/// A landmark written as an index or a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRef {
    Index(usize),
    Name(String),
}

impl LandmarkRef {
    fn resolve<E: de::Error>(self) -> Result<usize, E> {
        match self {
            Self::Index(index) => Ok(index),
            Self::Name(name) => HandLandmark::parse(&name)
                .map(|landmark| landmark.index())
                .ok_or_else(|| E::custom(format!("unknown landmark {:?}", name))),
        }
    }
}

fn landmark_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    LandmarkRef::deserialize(deserializer)?.resolve()
}

fn landmark_indices<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[usize; N], D::Error> {
    let refs = Vec::<LandmarkRef>::deserialize(deserializer)?;
    if refs.len() != N {
        let expected = format!("{} landmarks", N);
        return Err(de::Error::invalid_length(refs.len(), &expected.as_str()));
    }
    let indices = refs
        .into_iter()
        .map(LandmarkRef::resolve)
        .collect::<Result<Vec<usize>, D::Error>>()?;
    indices
        .try_into()
        .map_err(|_| de::Error::custom("landmark count changed while resolving"))
}

/// Region a `position` condition tests against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Centre of a circle (or sphere when `z` is given).
    Point {
        x: f32,
        y: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<f32>,
    },
    /// Axis-aligned box; missing bounds are open.
    Bounds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x_min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x_max: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y_min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y_max: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z_min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z_max: Option<f32>,
    },
}

impl Target {
    /// `(min, max)` pairs per axis, for bounds targets.
    pub fn axis_bounds(&self) -> Option<[(Option<f32>, Option<f32>); 3]> {
        match self {
            Self::Point { .. } => None,
            Self::Bounds {
                x_min,
                x_max,
                y_min,
                y_max,
                z_min,
                z_max,
            } => Some([(*x_min, *x_max), (*y_min, *y_max), (*z_min, *z_max)]),
        }
    }
}

impl Condition {
    /// Tag name as used in the config schema.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Distance { .. } => "distance",
            Self::Angle { .. } => "angle",
            Self::Position { .. } => "position",
        }
    }

    /// All point indices this condition reads.
    pub fn points(&self) -> Vec<usize> {
        match self {
            Self::Distance { points, .. } => points.to_vec(),
            Self::Angle { points, .. } => points.to_vec(),
            Self::Position { point, .. } => vec![*point],
        }
    }

    pub fn importance(&self) -> Option<Importance> {
        match self {
            Self::Distance { importance, .. }
            | Self::Angle { importance, .. }
            | Self::Position { importance, .. } => *importance,
        }
    }

    /// Inclusive `[min, max]` after filling open bounds.
    pub fn range(&self) -> Option<(f32, f32)> {
        match self {
            Self::Distance { min, max, .. } => Some((
                min.unwrap_or(f32::NEG_INFINITY),
                max.unwrap_or(f32::INFINITY),
            )),
            Self::Angle { min, max, .. } => Some((min.unwrap_or(0.0), max.unwrap_or(180.0))),
            Self::Position { .. } => None,
        }
    }

    /// Raw scalar for this condition on a canonical frame.
    pub fn measure(&self, frame: &CanonicalFrame) -> f32 {
        match self {
            Self::Distance { points, .. } => {
                distance(&frame.point(points[0]), &frame.point(points[1]))
            }
            Self::Angle { points, .. } => angle_at_vertex(
                &frame.point(points[0]),
                &frame.point(points[1]),
                &frame.point(points[2]),
            ),
            Self::Position {
                point, target, ..
            } => region_offset(&frame.point(*point), target),
        }
    }

    /// Whether a measured value satisfies this condition.
    pub fn passes(&self, value: f32) -> bool {
        match self {
            Self::Distance { .. } | Self::Angle { .. } => match self.range() {
                Some((lo, hi)) => lo <= value && value <= hi,
                None => false,
            },
            Self::Position { target, radius, .. } => match target {
                Target::Point { .. } => radius.map(|r| value <= r).unwrap_or(false),
                Target::Bounds { .. } => value <= 0.0,
            },
        }
    }

    /// One-line summary for logs and `check` output.
    pub fn describe(&self) -> String {
        let summary = self.summary();
        match self.importance() {
            Some(importance) => format!("{} ({})", summary, importance.as_str()),
            None => summary,
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::Distance { points, .. } => {
                let (lo, hi) = self.range().unwrap_or((f32::NEG_INFINITY, f32::INFINITY));
                format!(
                    "distance({}, {}) in [{}, {}]",
                    landmark_label(points[0]),
                    landmark_label(points[1]),
                    lo,
                    hi,
                )
            }
            Self::Angle { points, .. } => {
                let (lo, hi) = self.range().unwrap_or((0.0, 180.0));
                format!(
                    "angle({} at {} to {}) in [{}, {}] deg",
                    landmark_label(points[0]),
                    landmark_label(points[1]),
                    landmark_label(points[2]),
                    lo,
                    hi,
                )
            }
            Self::Position {
                point,
                target,
                radius,
                ..
            } => match target {
                Target::Point { x, y, .. } => format!(
                    "position({}) within {} of ({}, {})",
                    landmark_label(*point),
                    radius.unwrap_or(0.0),
                    x,
                    y,
                ),
                Target::Bounds { .. } => {
                    format!("position({}) inside bounds", landmark_label(*point))
                }
            },
        }
    }
}

// ── Gesture definition ─────────────────────────────────────

/// A named, AND-composed set of conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureDefinition {
    pub name: String,
    pub conditions: Vec<Condition>,
}

/// Outcome of matching one gesture against one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Raw scalar per condition index; empty when the frame was absent.
    pub values: Vec<f32>,
}

impl MatchResult {
    /// Result for a frame with no usable hand.
    pub fn absent() -> Self {
        Self {
            matched: false,
            values: Vec::new(),
        }
    }

    /// Raw scalar of condition `index`, if it was measured.
    pub fn value(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }
}

/// Evaluate a gesture's conditions against a canonical frame.
pub fn evaluate(gesture: &GestureDefinition, frame: Option<&CanonicalFrame>) -> MatchResult {
    let Some(frame) = frame else {
        return MatchResult::absent();
    };

    let mut all_pass = !gesture.conditions.is_empty();
    let values: Vec<f32> = gesture
        .conditions
        .iter()
        .map(|condition| {
            let value = condition.measure(frame);
            if !condition.passes(value) {
                all_pass = false;
            }
            value
        })
        .collect();

    MatchResult {
        matched: all_pass,
        values,
    }
}

// ── Geometry ───────────────────────────────────────────────

/// Angle at `vertex` between rays to `a` and `b`, in degrees, in the image plane.
/// A zero-length ray yields 0.
fn angle_at_vertex(a: &[f32; 3], vertex: &[f32; 3], b: &[f32; 3]) -> f32 {
    let v1 = [a[0] - vertex[0], a[1] - vertex[1]];
    let v2 = [b[0] - vertex[0], b[1] - vertex[1]];
    let mag1 = v1[0].hypot(v1[1]);
    let mag2 = v2[0].hypot(v2[1]);
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    let cos = ((v1[0] * v2[0] + v1[1] * v2[1]) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Distance from a point to a target region's centre (point targets) or to
/// the outside of a box (bounds targets, 0 inside).
fn region_offset(p: &[f32; 3], target: &Target) -> f32 {
    match target {
        Target::Point { x, y, z } => {
            let dx = p[0] - x;
            let dy = p[1] - y;
            let dz = z.map(|z| p[2] - z).unwrap_or(0.0);
            (dx * dx + dy * dy + dz * dz).sqrt()
        }
        Target::Bounds { .. } => {
            let bounds = target.axis_bounds().unwrap_or([(None, None); 3]);
            let mut sum = 0.0f32;
            for (axis, (lo, hi)) in bounds.iter().enumerate() {
                let v = p[axis];
                let excess = match (lo, hi) {
                    (Some(lo), _) if v < *lo => lo - v,
                    (_, Some(hi)) if v > *hi => v - hi,
                    _ => 0.0,
                };
                sum += excess * excess;
            }
            sum.sqrt()
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn frame_with(points: &[(usize, [f32; 3])]) -> CanonicalFrame {
    use super::keypoints::LANDMARK_COUNT;

    let mut frame = CanonicalFrame {
        points: [[0.0; 3]; LANDMARK_COUNT],
        timestamp_ms: 0.0,
    };
    for (index, position) in points {
        frame.points[*index] = *position;
    }
    frame
}

#[cfg(test)]
pub(crate) fn pinch_gesture(max: f32) -> GestureDefinition {
    GestureDefinition {
        name: "pinch".to_string(),
        conditions: vec![Condition::Distance {
            points: [4, 8],
            min: Some(0.0),
            max: Some(max),
            importance: None,
        }],
    }
}

// ── Tests ──────────────────────────────────────────────────
