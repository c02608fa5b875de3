// SPDX-License-Identifier: GPL-3.0-only

//! Paced synthetic NV12 capture channel
//!
//! Produces a diagonal luma ramp that shifts by a few pixels per frame, with
//! neutral chroma. Frames are paced at the configured rate so the pipeline
//! sees the same blocking behaviour as a real video input.

use crate::backends::types::{BackendError, BackendResult, ImageInfo, ImageType, MediaBuffer};
use crate::backends::{BufferAllocator, CaptureSource};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct ChannelState {
    enabled: bool,
    streaming: bool,
    next_sequence: u64,
    last_frame: Option<Instant>,
}

/// Synthetic video input channel
pub struct SyntheticCapture {
    device: String,
    info: ImageInfo,
    frame_interval: Duration,
    allocator: Arc<dyn BufferAllocator>,
    state: Mutex<ChannelState>,
    wake: Condvar,
}

impl SyntheticCapture {
    pub fn new(
        device: &str,
        width: u32,
        height: u32,
        fps: u32,
        allocator: Arc<dyn BufferAllocator>,
    ) -> Self {
        let frame_interval = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / fps
        };
        Self {
            device: device.to_string(),
            info: ImageInfo::new(width, height, ImageType::NV12),
            frame_interval,
            allocator,
            state: Mutex::new(ChannelState::default()),
            wake: Condvar::new(),
        }
    }

    fn paint(&self, buffer: &mut MediaBuffer, sequence: u64) {
        let stride = self.info.hor_stride as usize;
        let rows = self.info.ver_stride as usize;
        let uv_offset = self.info.uv_offset();
        let shift = (sequence as usize).wrapping_mul(4);

        let data = buffer.data_mut();
        let (y_plane, uv_plane) = data.split_at_mut(uv_offset);
        for (row, line) in y_plane.chunks_exact_mut(stride).take(rows).enumerate() {
            for (col, px) in line.iter_mut().enumerate() {
                *px = 16 + ((col + row + shift) % 220) as u8;
            }
        }
        uv_plane.fill(128);
    }
}

impl CaptureSource for SyntheticCapture {
    fn info(&self) -> ImageInfo {
        self.info
    }

    fn enable(&self) -> BackendResult<()> {
        if self.info.width == 0 || self.info.height == 0 {
            return Err(BackendError::FormatNotSupported(format!(
                "{}x{} NV12",
                self.info.width, self.info.height
            )));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|e| BackendError::Other(e.to_string()))?;
        state.enabled = true;
        info!(
            device = %self.device,
            width = self.info.width,
            height = self.info.height,
            "Capture channel enabled"
        );
        Ok(())
    }

    fn start_stream(&self) -> BackendResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| BackendError::Other(e.to_string()))?;
        if !state.enabled {
            return Err(BackendError::InitializationFailed(format!(
                "{} is not enabled",
                self.device
            )));
        }
        state.streaming = true;
        self.wake.notify_all();
        debug!(device = %self.device, "Capture stream started");
        Ok(())
    }

    fn fetch(&self) -> Option<MediaBuffer> {
        let mut state = self.state.lock().ok()?;

        // Wait for the stream to start
        while state.enabled && !state.streaming {
            state = self.wake.wait(state).ok()?;
        }

        // Pace frames at the nominal rate
        if let Some(last) = state.last_frame {
            let deadline = last + self.frame_interval;
            loop {
                let now = Instant::now();
                if !state.streaming || now >= deadline {
                    break;
                }
                state = self.wake.wait_timeout(state, deadline - now).ok()?.0;
            }
        }

        if !state.streaming {
            return None;
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.last_frame = Some(Instant::now());
        drop(state);

        let Some(mut buffer) = self.allocator.create_image_buffer(self.info, true) else {
            warn!(device = %self.device, "No capture buffer available");
            return None;
        };
        self.paint(&mut buffer, sequence);
        buffer.set_sequence(sequence);
        Some(buffer)
    }

    fn disable(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.enabled = false;
            state.streaming = false;
        }
        self.wake.notify_all();
        info!(device = %self.device, "Capture channel disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::soft::HeapAllocator;

    fn capture(allocator: &HeapAllocator) -> SyntheticCapture {
        SyntheticCapture::new("test", 16, 8, 1000, Arc::new(allocator.clone()))
    }

    #[test]
    fn test_frames_are_sequenced() {
        let allocator = HeapAllocator::new();
        let source = capture(&allocator);
        source.enable().unwrap();
        source.start_stream().unwrap();

        let first = source.fetch().unwrap();
        let second = source.fetch().unwrap();
        assert_eq!(first.sequence(), 0);
        assert_eq!(second.sequence(), 1);
        assert_eq!(first.info().image_type, ImageType::NV12);
        assert_eq!(first.len(), 16 * 8 * 3 / 2);

        // Neutral chroma, luma inside the limited range
        let uv_offset = first.info().uv_offset();
        assert!(first.data()[uv_offset..].iter().all(|&b| b == 128));
        assert!(first.data()[..uv_offset].iter().all(|&b| (16..=235).contains(&b)));
    }

    #[test]
    fn test_stream_requires_enable() {
        let allocator = HeapAllocator::new();
        let source = capture(&allocator);
        assert!(source.start_stream().is_err());
    }

    #[test]
    fn test_disabled_source_returns_none() {
        let allocator = HeapAllocator::new();
        let source = capture(&allocator);
        source.enable().unwrap();
        source.start_stream().unwrap();
        source.disable();
        assert!(source.fetch().is_none());
    }

    #[test]
    fn test_disable_wakes_blocked_fetch() {
        let allocator = HeapAllocator::new();
        let source = Arc::new(capture(&allocator));
        source.enable().unwrap();

        let fetcher = {
            let source = Arc::clone(&source);
            std::thread::spawn(move || source.fetch())
        };
        std::thread::sleep(Duration::from_millis(20));
        source.disable();

        assert!(fetcher.join().unwrap().is_none());
    }
}
