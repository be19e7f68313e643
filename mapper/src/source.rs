//! Keypoint sources feeding the engine.
//!
//! A source yields one observation per call: a hand frame, or absent when no
//! hand was detected. `ReplaySource` reads recorded frames as JSON lines:
//!
//! ```text
//! {"timestamp_ms": 0, "confidence": 0.9, "landmarks": [[0.5, 0.8, 0.0], ...]}
//! null
//! {"hand": null}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::hand::keypoints::{HandFrame, LANDMARK_COUNT};

/// One poll result from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Hand(HandFrame),
    Absent,
}

impl Observation {
    pub fn frame(&self) -> Option<&HandFrame> {
        match self {
            Self::Hand(frame) => Some(frame),
            Self::Absent => None,
        }
    }
}

/// Supplier of per-frame observations.
pub trait KeypointSource {
    /// Next observation, or `None` at end of stream.
    fn poll(&mut self) -> Result<Option<Observation>, SourceError>;
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    timestamp_ms: f64,
    #[serde(default = "default_confidence")]
    confidence: f32,
    landmarks: Vec<[f32; 3]>,
}

/// Replays recorded frames from JSON lines.
#[derive(Debug)]
pub struct ReplaySource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    fn parse(&self, text: &str) -> Result<Observation, SourceError> {
        let malformed = |reason: String| SourceError::Malformed {
            line: self.line,
            reason,
        };

        let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let value = match value {
            Value::Object(mut map) if map.contains_key("hand") => {
                map.remove("hand").unwrap_or(Value::Null)
            }
            other => other,
        };
        if value.is_null() {
            return Ok(Observation::Absent);
        }

        let record: FrameRecord =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        HandFrame::from_positions(&record.landmarks, record.timestamp_ms, record.confidence)
            .map(Observation::Hand)
            .ok_or_else(|| {
                malformed(format!(
                    "expected {} landmarks, got {}",
                    LANDMARK_COUNT,
                    record.landmarks.len()
                ))
            })
    }
}

impl ReplaySource<BufReader<File>> {
    /// Open a recording on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> KeypointSource for ReplaySource<R> {
    fn poll(&mut self) -> Result<Option<Observation>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return self.parse(text).map(Some);
        }
    }
}
