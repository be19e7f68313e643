//! Hand keypoint data structures.
//!
//! Models the 21 landmarks a MediaPipe-style hand detector reports per frame.
//! A frame is either a full 21-point skeleton or absent (no hand detected);
//! absence is modelled as `Option<HandFrame>` by callers.

use serde::{Deserialize, Serialize};

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// All landmarks in index order.
const LANDMARKS: [HandLandmark; LANDMARK_COUNT] = [
    HandLandmark::Wrist,
    HandLandmark::ThumbCmc,
    HandLandmark::ThumbMcp,
    HandLandmark::ThumbIp,
    HandLandmark::ThumbTip,
    HandLandmark::IndexMcp,
    HandLandmark::IndexPip,
    HandLandmark::IndexDip,
    HandLandmark::IndexTip,
    HandLandmark::MiddleMcp,
    HandLandmark::MiddlePip,
    HandLandmark::MiddleDip,
    HandLandmark::MiddleTip,
    HandLandmark::RingMcp,
    HandLandmark::RingPip,
    HandLandmark::RingDip,
    HandLandmark::RingTip,
    HandLandmark::PinkyMcp,
    HandLandmark::PinkyPip,
    HandLandmark::PinkyDip,
    HandLandmark::PinkyTip,
];

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Landmark for a detector index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        LANDMARKS.get(index).copied()
    }

    /// String representation for logs and config summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// Parse a landmark from its string representation.
    pub fn parse(s: &str) -> Option<Self> {
        LANDMARKS.iter().copied().find(|l| l.as_str() == s)
    }
}

/// Human-readable label for a raw point index, used in summaries.
pub fn landmark_label(index: usize) -> &'static str {
    HandLandmark::from_index(index)
        .map(|l| l.as_str())
        .unwrap_or("out-of-range")
}

// ── Keypoint ───────────────────────────────────────────────

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Screen-normalized x/y in [0,1] and relative depth z.
    pub position: [f32; 3],
    /// Per-point confidence, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            confidence: None,
        }
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

// ── Hand frame ─────────────────────────────────────────────

/// Complete keypoint observation for one hand in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    /// 21 keypoints indexed by `HandLandmark`.
    pub keypoints: [Keypoint; LANDMARK_COUNT],
    /// Capture timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Overall detection confidence (0.0-1.0).
    pub confidence: f32,
}

impl HandFrame {
    /// Build a frame from raw positions. Returns `None` unless exactly 21 are given.
    pub fn from_positions(
        positions: &[[f32; 3]],
        timestamp_ms: f64,
        confidence: f32,
    ) -> Option<Self> {
        if positions.len() != LANDMARK_COUNT {
            return None;
        }
        let mut keypoints = [Keypoint::default(); LANDMARK_COUNT];
        for (slot, position) in keypoints.iter_mut().zip(positions) {
            slot.position = *position;
        }
        Some(Self {
            keypoints,
            timestamp_ms,
            confidence,
        })
    }

    /// Position of a named landmark.
    pub fn position(&self, landmark: HandLandmark) -> [f32; 3] {
        self.keypoints[landmark.index()].position
    }

    /// Whether the detector is confident enough in this frame to match on it.
    pub fn is_confident(&self, min_confidence: f32) -> bool {
        self.confidence >= min_confidence
    }
}

// ── Tests ──────────────────────────────────────────────────
