// SPDX-License-Identifier: GPL-3.0-only

//! Software JPEG encoder channel
//!
//! Frames are queued to a worker thread that converts NV12 to RGB, encodes a
//! JPEG and hands each packet to the registered output callback. Enqueueing
//! never blocks.

use crate::backends::types::{
    BackendError, BackendResult, ImStatus, ImageInfo, ImageType, SharedBuffer,
};
use crate::backends::{BufferAllocator, EncoderChannel, PacketCallback};
use crate::media::convert_nv12_to_rgb;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Default)]
struct ChannelState {
    queue: Option<Sender<SharedBuffer>>,
    worker: Option<JoinHandle<()>>,
    destroyed: bool,
}

/// JPEG encoder channel backed by a worker thread
pub struct JpegEncoderChannel {
    quality: u8,
    allocator: Arc<dyn BufferAllocator>,
    state: Mutex<ChannelState>,
}

impl JpegEncoderChannel {
    pub fn new(quality: u8, allocator: Arc<dyn BufferAllocator>) -> Self {
        Self {
            quality,
            allocator,
            state: Mutex::new(ChannelState::default()),
        }
    }

    fn encode(quality: u8, frame: &SharedBuffer) -> Result<Vec<u8>, String> {
        let rgb = convert_nv12_to_rgb(&frame.view())?;

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| format!("JPEG encoding failed: {}", e))?;

        Ok(buffer)
    }
}

impl EncoderChannel for JpegEncoderChannel {
    fn register_output(&self, callback: PacketCallback) -> BackendResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| BackendError::Other(e.to_string()))?;
        if state.destroyed {
            return Err(BackendError::Destroyed);
        }
        if state.worker.is_some() {
            return Err(BackendError::InitializationFailed(
                "output callback already registered".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel::<SharedBuffer>();
        let quality = self.quality;
        let allocator = Arc::clone(&self.allocator);

        let worker = thread::Builder::new()
            .name("jpeg-encoder".to_string())
            .spawn(move || {
                debug!("Encoder worker started");
                let mut packet_index: u64 = 0;

                // Ends once the channel is destroyed and the queue drained
                while let Ok(frame) = rx.recv() {
                    let data = match Self::encode(quality, &frame) {
                        Ok(data) => data,
                        Err(e) => {
                            warn!(sequence = frame.sequence(), error = %e, "Dropping frame");
                            continue;
                        }
                    };
                    let info = ImageInfo::new(frame.width(), frame.height(), ImageType::JPEG);
                    drop(frame);

                    let Some(mut packet) = allocator.create_buffer(info, data.len()) else {
                        warn!(size = data.len(), "No packet buffer available");
                        continue;
                    };
                    packet.data_mut().copy_from_slice(&data);
                    packet.set_sequence(packet_index);
                    packet_index += 1;

                    callback(packet);
                }
                debug!(packets = packet_index, "Encoder worker exiting");
            })
            .map_err(BackendError::from)?;

        state.queue = Some(tx);
        state.worker = Some(worker);
        info!(quality = self.quality, "Encoder output registered");
        Ok(())
    }

    fn enqueue(&self, frame: SharedBuffer) -> ImStatus {
        let Ok(state) = self.state.lock() else {
            return ImStatus::Failed;
        };
        match state.queue.as_ref() {
            Some(queue) => match queue.send(frame) {
                Ok(()) => ImStatus::Success,
                Err(_) => ImStatus::Failed,
            },
            None => ImStatus::Failed,
        }
    }

    fn destroy(&self) {
        let worker = match self.state.lock() {
            Ok(mut state) if !state.destroyed => {
                state.destroyed = true;
                state.queue = None;
                state.worker.take()
            }
            _ => return,
        };

        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("Encoder worker panicked");
            }
        }
        info!("Encoder channel destroyed");
    }
}

impl Drop for JpegEncoderChannel {
    fn drop(&mut self) {
        self.destroy();
    }
}
