// SPDX-License-Identifier: GPL-3.0-only

//! Run orchestration: channel setup, the poll loop and ordered teardown

use super::classifier::FrameCounter;
use super::compositor::Compositor;
use super::dispatcher::Dispatcher;
use super::overlay::OverlayBuilder;
use super::report::RunReport;
use super::run_state::RunState;
use super::OsdPipeline;
use crate::backends::soft::{
    HeapAllocator, JpegEncoderChannel, LoggingIsp, SoftRaster, SyntheticCapture,
};
use crate::backends::types::{BackendError, BackendResult, MediaBuffer};
use crate::backends::{
    BufferAllocator, CaptureLoopController, CaptureSource, EncoderChannel, IspTuner, Raster,
};
use crate::config::RunConfig;
use crate::constants::QUIT_POLL_INTERVAL;
use crate::errors::{AppError, AppResult};
use crate::storage::PacketWriter;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// The collaborators a run is wired to
pub struct Backends {
    pub allocator: Arc<dyn BufferAllocator>,
    pub capture: Arc<dyn CaptureSource>,
    pub raster: Arc<dyn Raster>,
    pub encoder: Arc<dyn EncoderChannel>,
    pub isp: Option<Box<dyn IspTuner>>,
}

impl Backends {
    /// CPU implementations of every collaborator
    ///
    /// The capture channel draws from its own pool of
    /// `source.buffer_count` frames; overlays and packets come from a
    /// separate unbounded pool.
    pub fn software(config: &RunConfig) -> Self {
        let allocator: Arc<dyn BufferAllocator> = Arc::new(HeapAllocator::new());
        let capture_pool = HeapAllocator::with_limit(config.source.buffer_count as usize);
        let capture = SyntheticCapture::new(
            &config.source.device,
            config.source.width,
            config.source.height,
            config.source.frame_rate,
            Arc::new(capture_pool),
        );
        let encoder = JpegEncoderChannel::new(config.jpeg_quality, Arc::clone(&allocator));
        let isp: Option<Box<dyn IspTuner>> = config
            .iq_dir
            .as_ref()
            .map(|_| Box::new(LoggingIsp::new()) as Box<dyn IspTuner>);

        Self {
            allocator,
            capture: Arc::new(capture),
            raster: Arc::new(SoftRaster::new()),
            encoder: Arc::new(encoder),
            isp,
        }
    }
}

/// Run one compositing session to completion
///
/// Returns once the termination flag has been raised (frame budget reached,
/// packet budget reached, fatal pipeline error or an external request
/// through `state`) and every channel has been torn down. Setup failures are
/// reported as [`AppError::ChannelSetup`].
pub async fn run(
    config: &RunConfig,
    backends: Backends,
    state: Arc<RunState>,
) -> AppResult<RunReport> {
    let mode = config.composite_mode()?;
    let thresholds = config.thresholds;
    let mut report = RunReport::begin(thresholds, mode);
    info!(
        run_id = %report.run_id,
        unused = thresholds.unused,
        raw = thresholds.raw,
        composite = thresholds.composite,
        ?mode,
        "Starting OSD run"
    );
    if let Ok(json) = serde_json::to_string(config) {
        debug!(config = %json, "Effective configuration");
    }

    let Backends {
        allocator,
        capture,
        raster,
        encoder,
        mut isp,
    } = backends;

    // ISP session comes up before the capture channel
    if let (Some(tuner), Some(iq_dir)) = (isp.as_mut(), config.iq_dir.as_ref()) {
        if let Err(e) = start_isp(tuner.as_mut(), iq_dir, config.source.frame_rate) {
            stop_isp(&mut isp);
            return Err(e.into());
        }
    }

    if let Err(e) = capture.enable() {
        stop_isp(&mut isp);
        return Err(e.into());
    }

    let (packet_tx, packet_rx) = mpsc::unbounded_channel::<MediaBuffer>();
    let registered = encoder.register_output(Box::new(move |packet: MediaBuffer| {
        // The writer may already be gone during teardown; the packet is
        // released when the send fails
        let _ = packet_tx.send(packet);
    }));
    if let Err(e) = registered {
        capture.disable();
        stop_isp(&mut isp);
        return Err(e.into());
    }

    let writer = PacketWriter::new(
        config.output_dir.clone(),
        thresholds.raw,
        thresholds.composite,
        Arc::clone(&state),
    );
    let writer_task = tokio::spawn(writer.run(packet_rx));

    let overlays = OverlayBuilder::new(
        config.osd.width,
        config.osd.height,
        Arc::clone(&allocator),
        Arc::clone(&raster),
    );
    let mut pipeline = OsdPipeline::new(
        Arc::clone(&capture),
        FrameCounter::new(thresholds),
        Compositor::new(config.osd.rect(), mode, overlays, raster),
        Dispatcher::new(Arc::clone(&encoder), thresholds),
        Arc::clone(&state),
    );

    let setup = match CaptureLoopController::start("osd-consumer", move || pipeline.step()) {
        Ok(consumer) => match capture.start_stream() {
            Ok(()) => Ok(consumer),
            Err(e) => {
                state.request_quit();
                Err((Some(consumer), AppError::from(e)))
            }
        },
        Err(e) => {
            state.request_quit();
            Err((None, AppError::ChannelSetup(BackendError::from(e))))
        }
    };

    let (consumer, setup_error) = match setup {
        Ok(consumer) => {
            info!("Capture stream started");
            while !state.should_quit() {
                tokio::time::sleep(QUIT_POLL_INTERVAL).await;
            }
            (Some(consumer), None)
        }
        Err((consumer, e)) => {
            error!(error = %e, "Failed to start capture stream");
            (consumer, Some(e))
        }
    };

    info!("Tearing down");
    let teardown_encoder = Arc::clone(&encoder);
    let teardown_capture = Arc::clone(&capture);
    let teardown = tokio::task::spawn_blocking(move || {
        teardown_encoder.destroy();
        teardown_capture.disable();
        if let Some(mut consumer) = consumer {
            consumer.stop();
        }
    })
    .await;
    if let Err(e) = teardown {
        error!(error = %e, "Teardown task failed");
    }

    let written = match writer_task.await {
        Ok(written) => written,
        Err(e) => {
            error!(error = %e, "Packet writer task failed");
            0
        }
    };

    stop_isp(&mut isp);

    if let Some(e) = setup_error {
        return Err(e);
    }

    report.finish(&state, written);
    report.log();
    Ok(report)
}

fn start_isp(isp: &mut dyn IspTuner, iq_dir: &Path, fps: u32) -> BackendResult<()> {
    isp.init(iq_dir)?;
    isp.run()?;
    isp.set_frame_rate(fps)
}

fn stop_isp(isp: &mut Option<Box<dyn IspTuner>>) {
    if let Some(isp) = isp.as_mut() {
        isp.stop();
    }
}
