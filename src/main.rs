// SPDX-License-Identifier: GPL-3.0-only

use clap::{CommandFactory, Parser};
use clap::error::ErrorKind;
use osd_compositor::config::{OsdConfig, RunConfig, SourceConfig};
use osd_compositor::constants::*;
use osd_compositor::errors::AppError;
use osd_compositor::pipelines::osd::{LumaColor, Thresholds};
use std::path::PathBuf;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "osd-compositor")]
#[command(about = "Composite an on-screen display onto captured frames and encode them")]
#[command(version = env!("BUILD_VERSION"))]
struct Cli {
    /// Enable the ISP session with IQ files from DIR
    #[arg(
        short = 'a',
        long = "aiq",
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = DEFAULT_IQ_DIR
    )]
    aiq: Option<PathBuf>,

    /// Directory the encoded packets are written to
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Frames discarded before the first raw frame
    #[arg(short = 'u', long = "unused_frame", default_value_t = DEFAULT_UNUSED_FRAMES)]
    unused_frame: u32,

    /// Frames encoded without the OSD
    #[arg(short = 'r', long = "raw_frame", default_value_t = DEFAULT_RAW_FRAMES)]
    raw_frame: u32,

    /// Frames encoded with the OSD
    #[arg(short = 'p', long = "processed_frame", default_value_t = DEFAULT_PROCESSED_FRAMES)]
    processed_frame: u32,

    /// 0: filled rect, 1: border rect, 2: border rect with raw init,
    /// 3: border drawn directly on the frame
    #[arg(short = 'm', long = "mode", default_value_t = 0)]
    mode: u32,

    /// Source frame width
    #[arg(long, default_value_t = DEFAULT_SOURCE_WIDTH)]
    width: u32,

    /// Source frame height
    #[arg(long, default_value_t = DEFAULT_SOURCE_HEIGHT)]
    height: u32,

    #[arg(long = "osd-x", default_value_t = DEFAULT_OSD_X)]
    osd_x: u32,

    #[arg(long = "osd-y", default_value_t = DEFAULT_OSD_Y)]
    osd_y: u32,

    #[arg(long = "osd-width", default_value_t = DEFAULT_OSD_WIDTH)]
    osd_width: u32,

    #[arg(long = "osd-height", default_value_t = DEFAULT_OSD_HEIGHT)]
    osd_height: u32,

    /// Border thickness in pixels
    #[arg(long = "line-width", default_value_t = DEFAULT_LINE_WIDTH)]
    line_width: u32,

    /// Border color in mode 3 (black or white)
    #[arg(long = "draw-color", default_value = "white")]
    draw_color: LumaColor,

    /// Capture node name
    #[arg(long, default_value = DEFAULT_VIDEO_NODE)]
    device: String,

    /// Capture buffers that may be held at once
    #[arg(long = "buffer-count", default_value_t = DEFAULT_CAPTURE_BUFFER_COUNT)]
    buffer_count: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Write a JSON run report to FILE
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> (RunConfig, Option<PathBuf>) {
        let config = RunConfig {
            source: SourceConfig {
                device: self.device,
                width: self.width,
                height: self.height,
                buffer_count: self.buffer_count,
                ..SourceConfig::default()
            },
            osd: OsdConfig {
                x: self.osd_x,
                y: self.osd_y,
                width: self.osd_width,
                height: self.osd_height,
                line_width: self.line_width,
                mode: self.mode,
                draw_color: self.draw_color,
            },
            thresholds: Thresholds::new(self.unused_frame, self.raw_frame, self.processed_frame),
            output_dir: self.output,
            iq_dir: self.aiq,
            jpeg_quality: self.quality,
        };
        (config, self.report)
    }
}

fn main() {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=osd_compositor=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    // Bad arguments print usage and exit cleanly
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            if !matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = Cli::command().print_help();
            }
            std::process::exit(0);
        }
    };

    let (config, report_path) = cli.into_config();
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        let _ = Cli::command().print_help();
        std::process::exit(AppError::from(e).exit_code());
    }

    std::process::exit(cli::run(config, report_path));
}
