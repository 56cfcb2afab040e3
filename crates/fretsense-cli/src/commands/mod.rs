pub mod alpha;
pub mod calibrate;
pub mod compose;
pub mod config;
pub mod info;
pub mod ratio;
pub mod run;

use std::path::Path;

use anyhow::{bail, Context, Result};
use fretsense_core::calibration::CalibrationConstants;
use fretsense_core::channel::RoiRect;
use fretsense_core::filters::ThresholdRange;

fn parse_floats(text: &str, what: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(|s| s.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid {what}: {text:?}"))
}

/// Parse "x,y,width,height".
pub fn parse_rect(text: &str) -> Result<RoiRect> {
    let parts: Vec<usize> = text
        .split(',')
        .map(|s| s.trim().parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid ROI {text:?} (expected 'x,y,width,height')"))?;
    if parts.len() != 4 {
        bail!("ROI requires exactly 4 values: x,y,width,height");
    }
    Ok(RoiRect {
        x: parts[0],
        y: parts[1],
        width: parts[2],
        height: parts[3],
    })
}

/// Parse "min,max".
pub fn parse_range(text: &str) -> Result<ThresholdRange> {
    let parts = parse_floats(text, "threshold range")?;
    if parts.len() != 2 {
        bail!("Threshold range requires exactly 2 values: min,max");
    }
    Ok(ThresholdRange::new(parts[0], parts[1])?)
}

/// Read a constants TOML file, or start empty if it does not exist yet.
pub fn read_constants(path: &Path) -> Result<CalibrationConstants> {
    if !path.exists() {
        return Ok(CalibrationConstants::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read constants {}", path.display()))?;
    toml::from_str(&contents).context("Invalid constants file")
}

pub fn write_constants(constants: &CalibrationConstants, path: &Path) -> Result<()> {
    let toml_str = toml::to_string_pretty(constants)?;
    std::fs::write(path, toml_str)
        .with_context(|| format!("Failed to write constants to {}", path.display()))?;
    Ok(())
}
