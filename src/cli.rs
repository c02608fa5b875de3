// SPDX-License-Identifier: GPL-3.0-only

//! Command-line run of the OSD pipeline on the software backends

use osd_compositor::config::RunConfig;
use osd_compositor::errors::AppError;
use osd_compositor::pipelines::osd::{Backends, RunState, session};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run one session and return the process exit code
///
/// 0 on a normal shutdown, including one ended by a fatal frame error;
/// -1 when a channel cannot be set up.
pub fn run(config: RunConfig, report_path: Option<PathBuf>) -> i32 {
    let state = Arc::new(RunState::new());

    // Set up Ctrl+C handler
    let handler_state = Arc::clone(&state);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Interrupt received, stopping");
        handler_state.request_quit();
    }) {
        warn!(error = %e, "Failed to install interrupt handler");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return -1;
        }
    };

    let backends = Backends::software(&config);
    let result = rt.block_on(async {
        let report = session::run(&config, backends, state).await?;
        if let Some(path) = report_path {
            if let Err(e) = report.save(&path).await {
                error!(path = %path.display(), error = %e, "Failed to write run report");
            }
        }
        Ok::<_, AppError>(report)
    });

    match result {
        Ok(report) => {
            if let Some(e) = report.error {
                warn!(error = %e, "Run aborted by a pipeline error");
            }
            0
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            e.exit_code()
        }
    }
}
