// SPDX-License-Identifier: GPL-3.0-only

//! Summary of a finished run

use super::classifier::Thresholds;
use super::compositor::CompositeMode;
use super::run_state::{BandCounts, RunState};
use crate::errors::AppResult;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub thresholds: Thresholds,
    pub mode: CompositeMode,
    pub frames_received: u64,
    pub bands: BandCounts,
    pub packets_emitted: u64,
    pub packets_written: u64,
    /// Fatal pipeline error, if the run was aborted by one
    pub error: Option<String>,
}

impl RunReport {
    /// Start a report for a run beginning now
    pub fn begin(thresholds: Thresholds, mode: CompositeMode) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now().to_rfc3339(),
            finished_at: None,
            thresholds,
            mode,
            frames_received: 0,
            bands: BandCounts::default(),
            packets_emitted: 0,
            packets_written: 0,
            error: None,
        }
    }

    /// Fill in the final counters
    pub fn finish(&mut self, state: &RunState, packets_written: u64) {
        self.finished_at = Some(Local::now().to_rfc3339());
        self.frames_received = state.received();
        self.bands = state.band_counts();
        self.packets_emitted = state.packets();
        self.packets_written = packets_written;
        self.error = state.failure().map(|e| e.to_string());
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            received = self.frames_received,
            skipped = self.bands.skipped,
            raw = self.bands.raw,
            composited = self.bands.composited,
            packets = self.packets_written,
            error = ?self.error,
            "Run finished"
        );
    }

    /// Write the report as pretty-printed JSON
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize run report: {}", e))?;
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), "Run report written");
        Ok(())
    }
}
