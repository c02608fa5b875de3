// SPDX-License-Identifier: GPL-3.0-only

//! Frame routing to the encoder or to disposal

use super::classifier::{Band, Thresholds};
use super::run_state::RunState;
use crate::backends::EncoderChannel;
use crate::backends::types::MediaBuffer;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes classified frames and ends the run once the frame budget is spent
pub struct Dispatcher {
    encoder: Arc<dyn EncoderChannel>,
    thresholds: Thresholds,
}

impl Dispatcher {
    pub fn new(encoder: Arc<dyn EncoderChannel>, thresholds: Thresholds) -> Self {
        Self {
            encoder,
            thresholds,
        }
    }

    /// Route one frame according to its band
    ///
    /// The pipeline's handle on the frame is released on return in every
    /// case. Forwarded frames stay alive until the encoder drops them.
    pub fn dispatch(&self, frame: MediaBuffer, band: Band, state: &RunState) {
        match band {
            Band::Skip => {
                debug!(sequence = frame.sequence(), "Frame skipped");
                drop(frame);
            }
            Band::PassRaw | Band::Composite => self.forward(frame, band),
        }
        state.record_band(band);
        self.check_budget(state);
    }

    fn forward(&self, frame: MediaBuffer, band: Band) {
        let sequence = frame.sequence();
        let status = self.encoder.enqueue(frame.into_shared());
        if status.is_success() {
            debug!(sequence, %band, "Frame forwarded to encoder");
        } else {
            // Not fatal, the frame is dropped
            warn!(sequence, %band, status = %status, "Encoder rejected frame");
        }
    }

    /// Raise the quit flag once every budgeted frame has been received
    ///
    /// Returns true if this call raised it.
    pub fn check_budget(&self, state: &RunState) -> bool {
        if state.received() >= self.thresholds.total() && !state.should_quit() {
            info!(
                received = state.received(),
                budget = self.thresholds.total(),
                "Frame budget reached"
            );
            state.request_quit();
            return true;
        }
        false
    }
}
