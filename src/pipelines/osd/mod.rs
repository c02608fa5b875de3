// SPDX-License-Identifier: GPL-3.0-only

//! OSD frame classification and compositing pipeline
//!
//! ```text
//! CaptureSource ─▶ FrameCounter ─▶ Compositor ─▶ Dispatcher ─▶ EncoderChannel
//!                  (skip/raw/      (composite    (forward or      │ packets
//!                   composite)      band only)    release)        ▼
//!                                                             PacketWriter
//! ```
//!
//! One [`OsdPipeline::step`] handles exactly one captured frame. The step
//! runs on the capture-consumption thread; [`session::run`] wires the
//! collaborators together and owns the teardown.

pub mod classifier;
pub mod compositor;
pub mod dispatcher;
pub mod overlay;
pub mod report;
pub mod run_state;
pub mod session;

pub use classifier::{Band, FrameCounter, Thresholds};
pub use compositor::{CompositeMode, Compositor, LumaColor};
pub use dispatcher::Dispatcher;
pub use overlay::{OverlayBuilder, OverlayMode, border_strips};
pub use report::RunReport;
pub use run_state::{BandCounts, RunState};
pub use session::Backends;

use crate::backends::{CaptureSource, LoopAction};
use std::sync::Arc;
use tracing::{error, warn};

/// Per-frame body of the capture-consumption loop
pub struct OsdPipeline {
    source: Arc<dyn CaptureSource>,
    counter: FrameCounter,
    compositor: Compositor,
    dispatcher: Dispatcher,
    state: Arc<RunState>,
}

impl OsdPipeline {
    pub fn new(
        source: Arc<dyn CaptureSource>,
        counter: FrameCounter,
        compositor: Compositor,
        dispatcher: Dispatcher,
        state: Arc<RunState>,
    ) -> Self {
        Self {
            source,
            counter,
            compositor,
            dispatcher,
            state,
        }
    }

    /// Fetch, classify, composite and dispatch one frame
    pub fn step(&mut self) -> LoopAction {
        // An empty budget ends the run before anything is fetched
        self.dispatcher.check_budget(&self.state);
        if self.state.should_quit() {
            return LoopAction::Stop;
        }

        let Some(mut frame) = self.source.fetch() else {
            if self.state.should_quit() {
                return LoopAction::Stop;
            }
            warn!("Capture returned no buffer, retrying");
            return LoopAction::Continue;
        };

        let (index, band) = self.counter.advance(&self.state);

        if band == Band::Composite {
            if let Err(e) = self.compositor.composite(&mut frame) {
                error!(index, sequence = frame.sequence(), error = %e, "Compositing failed");
                drop(frame);
                self.state.fail(e);
                return LoopAction::Stop;
            }
        }

        self.dispatcher.dispatch(frame, band, &self.state);

        if self.state.should_quit() {
            LoopAction::Stop
        } else {
            LoopAction::Continue
        }
    }
}
