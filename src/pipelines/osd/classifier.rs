// SPDX-License-Identifier: GPL-3.0-only

//! Frame counting and band classification
//!
//! Frame indices start at 1. With `u` unused, `r` raw and `c` composite
//! frames the bands are:
//!
//! ```text
//!  1 ..= u          Skip
//!  u+1 ..= u+r      PassRaw
//!  u+r+1 ..= u+r+c  Composite
//!  beyond           Skip
//! ```

use super::run_state::RunState;
use serde::{Deserialize, Serialize};

/// Band sizes for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    /// Leading frames dropped while the sensor settles
    pub unused: u32,
    /// Frames forwarded to the encoder untouched
    pub raw: u32,
    /// Frames composited before encoding
    pub composite: u32,
}

impl Thresholds {
    pub const fn new(unused: u32, raw: u32, composite: u32) -> Self {
        Self {
            unused,
            raw,
            composite,
        }
    }

    /// Number of frames after which the run is over
    pub fn total(&self) -> u64 {
        u64::from(self.unused) + u64::from(self.raw) + u64::from(self.composite)
    }

    /// Number of packets the encoder is expected to emit
    pub fn forwarded(&self) -> u64 {
        u64::from(self.raw) + u64::from(self.composite)
    }
}

/// What the pipeline does with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Released without being forwarded
    Skip,
    /// Forwarded to the encoder unchanged
    PassRaw,
    /// Composited, then forwarded
    Composite,
}

impl Band {
    /// Classify a 1-based frame index
    pub fn classify(index: u64, thresholds: &Thresholds) -> Band {
        let raw_end = u64::from(thresholds.unused) + u64::from(thresholds.raw);
        let composite_end = raw_end + u64::from(thresholds.composite);

        if index <= u64::from(thresholds.unused) {
            Band::Skip
        } else if index <= raw_end {
            Band::PassRaw
        } else if index <= composite_end {
            Band::Composite
        } else {
            Band::Skip
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::Skip => write!(f, "skip"),
            Band::PassRaw => write!(f, "raw"),
            Band::Composite => write!(f, "composite"),
        }
    }
}

/// Assigns indices to captured frames
#[derive(Debug, Clone, Copy)]
pub struct FrameCounter {
    thresholds: Thresholds,
}

impl FrameCounter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Count one received frame and classify it
    pub fn advance(&self, state: &RunState) -> (u64, Band) {
        let index = state.record_frame();
        (index, Band::classify(index, &self.thresholds))
    }
}
