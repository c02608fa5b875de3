// SPDX-License-Identifier: MPL-2.0

//! Storage of encoded packets
//!
//! Packets arrive in encoder output order. Packet `k` (0-based) is written
//! to `osd_raw_{k}.jpeg` while `k < raw` and to `osd_prod_{k}.jpeg` while
//! `k < raw + composite`. Anything after that is released unwritten, and the
//! run is ended once the expected number of packets has arrived.

use crate::backends::types::MediaBuffer;
use crate::constants::{PACKET_EXTENSION, PROCESSED_PACKET_PREFIX, RAW_PACKET_PREFIX};
use crate::pipelines::osd::RunState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// Async consumer of the encoder output channel
pub struct PacketWriter {
    output_dir: PathBuf,
    raw: u64,
    composite: u64,
    state: Arc<RunState>,
}

impl PacketWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        raw: u32,
        composite: u32,
        state: Arc<RunState>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            raw: u64::from(raw),
            composite: u64::from(composite),
            state,
        }
    }

    /// Destination of the packet with 0-based output index `index`
    pub fn packet_path(&self, index: u64) -> Option<PathBuf> {
        let prefix = if index < self.raw {
            RAW_PACKET_PREFIX
        } else if index < self.raw + self.composite {
            PROCESSED_PACKET_PREFIX
        } else {
            return None;
        };
        Some(
            self.output_dir
                .join(format!("{}_{}.{}", prefix, index, PACKET_EXTENSION)),
        )
    }

    /// Write packets until the sending side closes
    ///
    /// Returns the number of packets written to disk.
    pub async fn run(self, mut packets: UnboundedReceiver<MediaBuffer>) -> u64 {
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!(dir = %self.output_dir.display(), error = %e, "Cannot create output directory");
        }

        let expected = self.raw + self.composite;
        let mut written = 0u64;

        while let Some(packet) = packets.recv().await {
            let index = self.state.record_packet() - 1;

            match self.packet_path(index) {
                Some(path) => match tokio::fs::write(&path, packet.data()).await {
                    Ok(()) => {
                        written += 1;
                        debug!(
                            index,
                            bytes = packet.len(),
                            path = %path.display(),
                            "Packet written"
                        );
                    }
                    Err(e) => {
                        error!(index, path = %path.display(), error = %e, "Failed to write packet");
                    }
                },
                None => debug!(index, "Packet beyond output budget, released"),
            }
            drop(packet);

            if index + 1 >= expected && !self.state.should_quit() {
                info!(packets = index + 1, "All expected packets received");
                self.state.request_quit();
            }
        }

        debug!(written, "Packet channel closed");
        written
    }
}
