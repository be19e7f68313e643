//! Gesture mapper - turns hand keypoint streams into commands.
//!
//! Frames of 21 hand landmarks are normalized into a canonical pose,
//! matched against configured gestures, debounced into edge-triggered
//! events and dispatched to an [`Effector`] through their mappings.

pub mod config;
pub mod dispatch;
pub mod effector;
pub mod engine;
pub mod error;
pub mod hand;
pub mod logging;
pub mod source;

pub use config::{CommandSpec, GestureConfig, Mapping};
pub use dispatch::{CommandDispatcher, DispatchReport, DispatchStats};
pub use effector::{CommandPhase, Effector, LogEffector, RecordingEffector};
pub use engine::{FrameReport, GestureEngine};
pub use error::{ConfigError, EffectorError, SourceError};
pub use source::{KeypointSource, Observation, ReplaySource};
