// SPDX-License-Identifier: MPL-2.0

//! Frame processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Capture      │ ──▶ │   OSD Pipeline    │ ──▶ │  Encoder     │
//! │   (NV12)     │     │  - Classify       │     │  (JPEG)      │
//! │              │     │  - Composite      │     │              │
//! │              │     │  - Dispatch       │     │              │
//! └──────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                       ▼
//!                                               ┌──────────────┐
//!                                               │ PacketWriter │
//!                                               └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`osd`]: Frame classification, OSD compositing and run orchestration

pub mod osd;
