//! Hand keypoint processing: canonicalization, condition matching,
//! per-gesture state tracking and analogue value mapping.

pub mod analogue;
pub mod condition;
pub mod gesture;
pub mod keypoints;
pub mod normalize;

pub use analogue::{AnalogueMapping, Curve};
pub use condition::{evaluate, Condition, GestureDefinition, Importance, MatchResult, Target};
pub use gesture::{
    DebounceConfig, GestureEvent, GesturePhase, GestureRuntimeState, GestureTracker,
};
pub use keypoints::{HandFrame, HandLandmark, Keypoint, LANDMARK_COUNT};
pub use normalize::{normalize, CanonicalFrame, Transformations};
