// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use osd_compositor::RunConfig;
use osd_compositor::errors::ConfigError;
use osd_compositor::pipelines::osd::{CompositeMode, LumaColor, OverlayMode};

#[test]
fn test_config_default() {
    // Test that default config can be created and is valid
    let config = RunConfig::default();
    assert_eq!(config.validate(), Ok(()));

    // One composited frame, nothing else
    assert_eq!(config.thresholds.unused, 0);
    assert_eq!(config.thresholds.raw, 0);
    assert_eq!(config.thresholds.composite, 1);
    assert!(config.iq_dir.is_none());
}

#[test]
fn test_config_mode_mapping() {
    let mut config = RunConfig::default();
    assert_eq!(
        config.composite_mode(),
        Ok(CompositeMode::Overlay(OverlayMode::FilledRect))
    );

    config.osd.mode = 1;
    config.osd.line_width = 6;
    assert_eq!(
        config.composite_mode(),
        Ok(CompositeMode::Overlay(OverlayMode::BorderRect { thickness: 6 }))
    );

    config.osd.mode = 3;
    config.osd.draw_color = LumaColor::Black;
    assert_eq!(
        config.composite_mode(),
        Ok(CompositeMode::DirectDraw {
            color: LumaColor::Black,
            thickness: 6
        })
    );
}

#[test]
fn test_config_invalid_mode() {
    let mut config = RunConfig::default();
    config.osd.mode = 4;
    assert_eq!(config.validate(), Err(ConfigError::InvalidMode(4)));
}

#[test]
fn test_config_osd_must_fit_source() {
    let mut config = RunConfig::default();
    config.osd.x = 1700;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OsdOutOfBounds { x: 1700, .. })
    ));

    let mut config = RunConfig::default();
    config.osd.width = 0;
    assert_eq!(config.validate(), Err(ConfigError::EmptyOsd));
}

#[test]
fn test_config_source_size() {
    let mut config = RunConfig::default();
    config.source.width = 1921;
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidSourceSize {
            width: 1921,
            height: 1080
        })
    );
}

#[test]
fn test_config_quality_range() {
    let mut config = RunConfig::default();
    config.jpeg_quality = 0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(0)));
    config.jpeg_quality = 101;
    assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(101)));
}

#[test]
fn test_config_buffer_count() {
    let mut config = RunConfig::default();
    assert_eq!(config.source.buffer_count, 3);
    config.source.buffer_count = 0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidBufferCount(0)));
}

#[test]
fn test_config_serializes() {
    let config = RunConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
