// SPDX-License-Identifier: GPL-3.0-only

//! State shared by the consumer thread, the packet writer and the main thread

use super::classifier::Band;
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Frames dispatched per band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BandCounts {
    pub skipped: u64,
    pub raw: u64,
    pub composited: u64,
}

/// Counters and termination flag for one run
///
/// Shared behind an `Arc`. The quit flag only ever goes from false to true.
#[derive(Debug, Default)]
pub struct RunState {
    received: AtomicU64,
    packets: AtomicU64,
    skipped: AtomicU64,
    raw: AtomicU64,
    composited: AtomicU64,
    quit: AtomicBool,
    failure: Mutex<Option<PipelineError>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame pulled from capture and return the new total
    pub fn record_frame(&self) -> u64 {
        self.received.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Frames pulled from capture so far
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    /// Count one packet emitted by the encoder and return the new total
    pub fn record_packet(&self) -> u64 {
        self.packets.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::SeqCst)
    }

    pub fn record_band(&self, band: Band) {
        let counter = match band {
            Band::Skip => &self.skipped,
            Band::PassRaw => &self.raw,
            Band::Composite => &self.composited,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn band_counts(&self) -> BandCounts {
        BandCounts {
            skipped: self.skipped.load(Ordering::Relaxed),
            raw: self.raw.load(Ordering::Relaxed),
            composited: self.composited.load(Ordering::Relaxed),
        }
    }

    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    /// Record a fatal pipeline error and raise the quit flag
    ///
    /// Only the first error is kept.
    pub fn fail(&self, error: PipelineError) {
        if let Ok(mut failure) = self.failure.lock() {
            failure.get_or_insert(error);
        }
        self.request_quit();
    }

    pub fn failure(&self) -> Option<PipelineError> {
        self.failure.lock().ok().and_then(|failure| failure.clone())
    }
}
