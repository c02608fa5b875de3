// SPDX-License-Identifier: MPL-2.0

//! OSD compositor - on-device frame classification and OSD compositing
//!
//! Captured NV12 frames are sorted into skip, raw and composite bands by
//! their index. Composite frames get an on-screen-display rectangle, either
//! blended from an ARGB overlay or drawn straight into the frame planes.
//! Raw and composite frames are encoded and the packets written to disk.
//!
//! # Architecture
//!
//! - [`backends`]: Collaborator traits and their software implementations
//! - [`media`]: Color math and NV12 conversion
//! - [`pipelines`]: The OSD pipeline and run orchestration
//! - [`config`]: Run configuration
//! - [`storage`]: Packet output
//!
//! # Example
//!
//! ```ignore
//! let config = RunConfig::default();
//! let state = Arc::new(RunState::new());
//! let report = session::run(&config, Backends::software(&config), state).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use config::RunConfig;
pub use errors::{AppError, AppResult};
pub use pipelines::osd::{Backends, RunReport, RunState};
