//! Keypoint normalization into a transform-invariant canonical frame.
//!
//! Invariance steps compose independently and always run in the order
//! displacement, scale, rotation. Scale and rotation pivot on the wrist so
//! each step is meaningful even when displacement invariance is off.

use serde::{Deserialize, Serialize};

use super::keypoints::{HandFrame, HandLandmark, LANDMARK_COUNT};

/// Reference lengths below this are a degenerate pose.
pub const MIN_REFERENCE_LENGTH: f32 = 1e-6;

/// Canonical direction of the wrist → middle-finger-base vector after
/// rotation: straight up in image coordinates (y grows downward).
pub const CANONICAL_AXIS: [f32; 2] = [0.0, -1.0];

// ── Config ─────────────────────────────────────────────────

/// Which invariances to apply. Omitted flags are off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transformations {
    pub displacement_invariant: bool,
    pub scale_invariant: bool,
    pub rotation_invariant: bool,
}

// ── Canonical frame ────────────────────────────────────────

/// Keypoints after invariance normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFrame {
    /// Canonical positions indexed like the source frame.
    pub points: [[f32; 3]; LANDMARK_COUNT],
    /// Timestamp of the source frame in milliseconds.
    pub timestamp_ms: f64,
}

impl CanonicalFrame {
    /// Canonical position of a point index. Indices are validated at load.
    pub fn point(&self, index: usize) -> [f32; 3] {
        self.points[index]
    }
}

// ── Normalization ──────────────────────────────────────────

/// Map a raw frame into canonical form.
///
/// Returns `None` (absent) when the input is absent or when scale or rotation
/// invariance is requested on a pose whose reference length is ~0.
pub fn normalize(
    frame: Option<&HandFrame>,
    transformations: &Transformations,
) -> Option<CanonicalFrame> {
    let frame = frame?;
    let mut points = [[0.0f32; 3]; LANDMARK_COUNT];
    for (slot, keypoint) in points.iter_mut().zip(frame.keypoints.iter()) {
        *slot = keypoint.position;
    }

    let wrist_index = HandLandmark::Wrist.index();
    let reference_index = HandLandmark::MiddleMcp.index();

    if transformations.displacement_invariant {
        let wrist = points[wrist_index];
        for p in points.iter_mut() {
            *p = sub(p, &wrist);
        }
    }

    if transformations.scale_invariant {
        let wrist = points[wrist_index];
        let length = distance(&wrist, &points[reference_index]);
        if length < MIN_REFERENCE_LENGTH {
            return None;
        }
        for p in points.iter_mut() {
            let offset = sub(p, &wrist);
            *p = [
                wrist[0] + offset[0] / length,
                wrist[1] + offset[1] / length,
                wrist[2] + offset[2] / length,
            ];
        }
    }

    if transformations.rotation_invariant {
        let wrist = points[wrist_index];
        let reference = sub(&points[reference_index], &wrist);
        if reference[0].hypot(reference[1]) < MIN_REFERENCE_LENGTH {
            return None;
        }
        let angle = reference[1].atan2(reference[0]);
        let target = CANONICAL_AXIS[1].atan2(CANONICAL_AXIS[0]);
        let (sin_a, cos_a) = (target - angle).sin_cos();
        for p in points.iter_mut() {
            let dx = p[0] - wrist[0];
            let dy = p[1] - wrist[1];
            p[0] = wrist[0] + dx * cos_a - dy * sin_a;
            p[1] = wrist[1] + dx * sin_a + dy * cos_a;
        }
    }

    Some(CanonicalFrame {
        points,
        timestamp_ms: frame.timestamp_ms,
    })
}

fn sub(a: &[f32; 3], b: &[f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Euclidean distance between two 3D points.
pub fn distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let d = sub(b, a);
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn sample_frame() -> HandFrame {
    // Loosely an upright open hand in image coordinates.
    let positions: Vec<[f32; 3]> = (0..LANDMARK_COUNT)
        .map(|i| {
            let finger = if i == 0 { 0.0 } else { ((i - 1) / 4) as f32 };
            let joint = if i == 0 { 0.0 } else { ((i - 1) % 4 + 1) as f32 };
            [0.40 + finger * 0.04, 0.80 - joint * 0.06, -0.01 * joint]
        })
        .collect();
    HandFrame::from_positions(&positions, 1000.0, 0.9).unwrap()
}

#[cfg(test)]
fn assert_points_close(a: &CanonicalFrame, b: &CanonicalFrame, tol: f32) {
    for (i, (pa, pb)) in a.points.iter().zip(b.points.iter()).enumerate() {
        for axis in 0..3 {
            assert!(
                (pa[axis] - pb[axis]).abs() <= tol,
                "point {} axis {}: {} vs {}",
                i,
                axis,
                pa[axis],
                pb[axis],
            );
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
