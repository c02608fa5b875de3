// SPDX-License-Identifier: GPL-3.0-only

//! ISP session stand-in that validates the IQ directory and logs lifecycle calls

use crate::backends::IspTuner;
use crate::backends::types::{BackendError, BackendResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IspPhase {
    Idle,
    Initialized,
    Running,
    Stopped,
}

/// ISP tuner that performs no image processing
#[derive(Debug)]
pub struct LoggingIsp {
    phase: IspPhase,
    iq_dir: Option<PathBuf>,
    fps: Option<u32>,
}

impl LoggingIsp {
    pub fn new() -> Self {
        Self {
            phase: IspPhase::Idle,
            iq_dir: None,
            fps: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == IspPhase::Running
    }

    pub fn frame_rate(&self) -> Option<u32> {
        self.fps
    }
}

impl Default for LoggingIsp {
    fn default() -> Self {
        Self::new()
    }
}

impl IspTuner for LoggingIsp {
    fn init(&mut self, iq_dir: &Path) -> BackendResult<()> {
        if !iq_dir.is_dir() {
            return Err(BackendError::InitializationFailed(format!(
                "IQ directory {} does not exist",
                iq_dir.display()
            )));
        }
        info!(iq_dir = %iq_dir.display(), "ISP initialized");
        self.iq_dir = Some(iq_dir.to_path_buf());
        self.phase = IspPhase::Initialized;
        Ok(())
    }

    fn run(&mut self) -> BackendResult<()> {
        if self.phase != IspPhase::Initialized {
            return Err(BackendError::InitializationFailed(
                "ISP must be initialized before running".to_string(),
            ));
        }
        self.phase = IspPhase::Running;
        debug!("ISP running");
        Ok(())
    }

    fn set_frame_rate(&mut self, fps: u32) -> BackendResult<()> {
        if !self.is_running() {
            return Err(BackendError::Other("ISP is not running".to_string()));
        }
        self.fps = Some(fps);
        debug!(fps, "ISP frame rate set");
        Ok(())
    }

    fn stop(&mut self) {
        if self.phase == IspPhase::Running || self.phase == IspPhase::Initialized {
            info!(iq_dir = ?self.iq_dir, "ISP stopped");
        }
        self.phase = IspPhase::Stopped;
    }
}
