// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the OSD pipeline and run orchestration

mod common;

use common::{
    FailingBlendRaster, RecordingEncoder, ScriptedCapture, TrackingAllocator, temp_output_dir,
};
use osd_compositor::RunConfig;
use osd_compositor::backends::soft::{
    HeapAllocator, JpegEncoderChannel, SoftRaster, SyntheticCapture,
};
use osd_compositor::backends::{
    BufferAllocator, CaptureSource, EncoderChannel, ImStatus, ImageInfo, ImageType, LoopAction,
    Raster, Rect,
};
use osd_compositor::errors::{AppError, PipelineError};
use osd_compositor::pipelines::osd::{
    Backends, CompositeMode, Compositor, Dispatcher, FrameCounter, LumaColor, OsdPipeline,
    OverlayBuilder, OverlayMode, RunState, Thresholds, session,
};
use std::sync::Arc;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const OSD: Rect = Rect::new(8, 8, 16, 16);

fn pipeline(
    allocator: Arc<dyn BufferAllocator>,
    capture: Arc<dyn CaptureSource>,
    raster: Arc<dyn Raster>,
    encoder: Arc<dyn EncoderChannel>,
    thresholds: Thresholds,
    mode: CompositeMode,
    state: Arc<RunState>,
) -> OsdPipeline {
    let overlays = OverlayBuilder::new(OSD.width, OSD.height, allocator, Arc::clone(&raster));
    OsdPipeline::new(
        capture,
        FrameCounter::new(thresholds),
        Compositor::new(OSD, mode, overlays, raster),
        Dispatcher::new(encoder, thresholds),
        state,
    )
}

#[test]
fn test_fatal_blend_releases_frame_and_overlay_once() {
    let allocator = TrackingAllocator::new();
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(WIDTH, HEIGHT, shared.clone(), vec![Some(40)]));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(FailingBlendRaster::default()),
        encoder.clone(),
        Thresholds::new(0, 0, 1),
        CompositeMode::Overlay(OverlayMode::BorderRect { thickness: 2 }),
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert!(state.should_quit());
    assert_eq!(
        state.failure(),
        Some(PipelineError::Operation {
            op: "blend",
            status: ImStatus::Failed
        })
    );

    // Frame and overlay, each released exactly once
    let created = allocator.created();
    assert_eq!(created.len(), 2);
    for id in created {
        assert_eq!(allocator.release_count(id), 1, "buffer {}", id);
    }
    assert!(encoder.sequences().is_empty());
}

#[test]
fn test_skip_frames_are_untouched_and_not_forwarded() {
    let allocator = TrackingAllocator::new();
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(
        WIDTH,
        HEIGHT,
        shared.clone(),
        vec![Some(10), Some(50), Some(90)],
    ));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(SoftRaster::new()),
        encoder.clone(),
        Thresholds::new(2, 0, 1),
        CompositeMode::Overlay(OverlayMode::FilledRect),
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Continue);
    assert_eq!(pipeline.step(), LoopAction::Continue);
    assert!(encoder.sequences().is_empty());

    let info = ImageInfo::new(WIDTH, HEIGHT, ImageType::NV12);
    let releases = allocator.releases();
    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].data, ScriptedCapture::frame_bytes(&info, 10));
    assert_eq!(releases[1].data, ScriptedCapture::frame_bytes(&info, 50));

    // Third frame is composited, forwarded and ends the run
    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert_eq!(encoder.sequences(), vec![2]);
    assert!(state.should_quit());
    assert_eq!(state.failure(), None);

    let composited = allocator
        .releases()
        .into_iter()
        .find(|r| r.image_type == ImageType::NV12 && r.id == 3)
        .unwrap();
    assert_ne!(composited.data, ScriptedCapture::frame_bytes(&info, 90));
}

#[test]
fn test_transient_capture_failure_is_not_counted() {
    let allocator = TrackingAllocator::new();
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(
        WIDTH,
        HEIGHT,
        shared.clone(),
        vec![None, Some(10)],
    ));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(SoftRaster::new()),
        encoder.clone(),
        Thresholds::new(0, 1, 0),
        CompositeMode::Overlay(OverlayMode::FilledRect),
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Continue);
    assert_eq!(state.received(), 0);
    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert_eq!(state.received(), 1);
    assert_eq!(encoder.sequences(), vec![0]);
}

#[test]
fn test_direct_draw_allocates_no_overlay() {
    let allocator = TrackingAllocator::new();
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(WIDTH, HEIGHT, shared.clone(), vec![Some(30)]));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(SoftRaster::new()),
        encoder.clone(),
        Thresholds::new(0, 0, 1),
        CompositeMode::DirectDraw {
            color: LumaColor::Black,
            thickness: 2,
        },
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert_eq!(allocator.created().len(), 1);

    let release = &allocator.releases()[0];
    let stride = WIDTH as usize;
    assert_eq!(release.data[8 * stride + 8], 16);
    assert_eq!(release.data[23 * stride + 23], 16);
}

#[test]
fn test_overlay_allocation_failure_stops_run() {
    // Room for the captured frame only
    let allocator = HeapAllocator::with_limit(1);
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(WIDTH, HEIGHT, shared.clone(), vec![Some(70)]));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(SoftRaster::new()),
        encoder.clone(),
        Thresholds::new(0, 0, 1),
        CompositeMode::Overlay(OverlayMode::FilledRect),
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert!(state.should_quit());
    assert!(matches!(state.failure(), Some(PipelineError::Allocation(_))));
    assert!(encoder.sequences().is_empty());

    let stats = allocator.stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(stats.live, 0);
}

#[test]
fn test_empty_budget_fetches_nothing() {
    let allocator = TrackingAllocator::new();
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    let capture = Arc::new(ScriptedCapture::new(WIDTH, HEIGHT, shared.clone(), vec![Some(10)]));
    let encoder = Arc::new(RecordingEncoder::default());
    let state = Arc::new(RunState::new());

    let mut pipeline = pipeline(
        shared,
        capture,
        Arc::new(SoftRaster::new()),
        encoder.clone(),
        Thresholds::new(0, 0, 0),
        CompositeMode::Overlay(OverlayMode::FilledRect),
        Arc::clone(&state),
    );

    assert_eq!(pipeline.step(), LoopAction::Stop);
    assert!(state.should_quit());
    assert_eq!(state.received(), 0);
    assert!(allocator.created().is_empty());
    assert!(encoder.sequences().is_empty());
}

#[test]
fn test_capture_pool_is_bounded_by_buffer_count() {
    let mut config = RunConfig::default();
    config.source.width = WIDTH;
    config.source.height = HEIGHT;
    config.source.frame_rate = 0;
    config.source.buffer_count = 2;
    let backends = Backends::software(&config);
    let capture = backends.capture;
    capture.enable().unwrap();
    capture.start_stream().unwrap();

    let first = capture.fetch().unwrap();
    let second = capture.fetch().unwrap();
    assert!(capture.fetch().is_none());

    // Returning a frame frees a slot
    drop(first);
    let third = capture.fetch().unwrap();
    assert_eq!(third.sequence(), 3);

    drop((second, third));
    capture.disable();
}

fn software_config(thresholds: Thresholds, mode: u32, name: &str) -> RunConfig {
    let mut config = RunConfig::default();
    config.source.width = WIDTH;
    config.source.height = HEIGHT;
    config.source.frame_rate = 1000;
    config.osd.x = OSD.x;
    config.osd.y = OSD.y;
    config.osd.width = OSD.width;
    config.osd.height = OSD.height;
    config.osd.line_width = 2;
    config.osd.mode = mode;
    config.thresholds = thresholds;
    config.output_dir = temp_output_dir(name);
    config
}

fn software_backends(config: &RunConfig, allocator: &HeapAllocator) -> Backends {
    let shared: Arc<dyn BufferAllocator> = Arc::new(allocator.clone());
    Backends {
        allocator: shared.clone(),
        capture: Arc::new(SyntheticCapture::new(
            "test",
            config.source.width,
            config.source.height,
            config.source.frame_rate,
            shared.clone(),
        )),
        raster: Arc::new(SoftRaster::new()),
        encoder: Arc::new(JpegEncoderChannel::new(config.jpeg_quality, shared)),
        isp: None,
    }
}

#[tokio::test]
async fn test_single_composite_frame_end_to_end() {
    let config = software_config(Thresholds::new(0, 0, 1), 0, "single");
    let allocator = HeapAllocator::new();
    let state = Arc::new(RunState::new());

    let backends = software_backends(&config, &allocator);
    let report = session::run(&config, backends, state.clone()).await.unwrap();

    assert_eq!(report.frames_received, 1);
    assert_eq!(report.bands.composited, 1);
    assert_eq!(report.bands.raw, 0);
    assert_eq!(report.packets_written, 1);
    assert_eq!(report.error, None);
    assert!(state.should_quit());

    let packet = std::fs::read(config.output_dir.join("osd_prod_0.jpeg")).unwrap();
    assert_eq!(&packet[..2], &[0xFF, 0xD8]);

    let stats = allocator.stats();
    assert_eq!(stats.live, 0);
    assert_eq!(stats.double_released, 0);

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[tokio::test]
async fn test_raw_and_composite_packets_are_named() {
    let config = software_config(Thresholds::new(1, 2, 1), 3, "mixed");
    let allocator = HeapAllocator::new();
    let state = Arc::new(RunState::new());

    let report = session::run(&config, software_backends(&config, &allocator), state)
        .await
        .unwrap();

    assert_eq!(report.frames_received, 4);
    assert_eq!(report.bands.skipped, 1);
    assert_eq!(report.bands.raw, 2);
    assert_eq!(report.bands.composited, 1);
    assert_eq!(report.packets_written, 3);
    for name in ["osd_raw_0.jpeg", "osd_raw_1.jpeg", "osd_prod_2.jpeg"] {
        assert!(config.output_dir.join(name).exists(), "{} missing", name);
    }
    assert_eq!(allocator.stats().live, 0);

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[tokio::test]
async fn test_external_quit_stops_run() {
    let config = software_config(Thresholds::new(0, 1000, 1000), 1, "interrupted");
    let allocator = HeapAllocator::new();
    let state = Arc::new(RunState::new());
    state.request_quit();

    let report = session::run(&config, software_backends(&config, &allocator), state)
        .await
        .unwrap();

    assert_eq!(report.frames_received, 0);
    assert_eq!(report.packets_written, 0);
    assert_eq!(allocator.stats().live, 0);

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[tokio::test]
async fn test_capture_enable_failure_is_setup_error() {
    let config = software_config(Thresholds::new(0, 0, 1), 0, "enable");
    let allocator = HeapAllocator::new();
    let mut backends = software_backends(&config, &allocator);
    backends.capture = Arc::new(SyntheticCapture::new(
        "broken",
        0,
        0,
        30,
        Arc::new(allocator.clone()),
    ));

    let result = session::run(&config, backends, Arc::new(RunState::new())).await;
    assert!(matches!(result, Err(AppError::ChannelSetup(_))));

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[tokio::test]
async fn test_missing_iq_dir_is_setup_error() {
    let mut config = software_config(Thresholds::new(0, 0, 1), 0, "isp");
    config.iq_dir = Some(config.output_dir.join("no-such-iq-dir"));

    let backends = Backends::software(&config);
    let result = session::run(&config, backends, Arc::new(RunState::new())).await;
    assert!(matches!(result, Err(AppError::ChannelSetup(_))));
    assert_eq!(result.unwrap_err().exit_code(), -1);

    let _ = std::fs::remove_dir_all(&config.output_dir);
}
