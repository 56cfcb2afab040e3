use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::channel::{ChannelImage, ChannelStack, Roi, RoiRect};
use crate::error::{FretError, Result};
use crate::stats::mean_intensity;

/// Whether background-corrected pixels are floored at zero.
///
/// Stacks that feed FRET composition are clamped. Calibration images keep
/// their sign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorPolicy {
    ClampToZero,
    #[default]
    Unclamped,
}

/// Background settings for one channel, as written in a session config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    /// Region whose mean intensity is the background level.
    pub roi: Option<RoiRect>,
    /// Added to the ROI mean, or subtracted alone when there is no ROI.
    #[serde(default)]
    pub constant: f32,
}

impl BackgroundSettings {
    pub fn is_enabled(&self) -> bool {
        self.roi.is_some() || self.constant != 0.0
    }

    /// Materialise the rectangle as a mask for an image of the given size.
    pub fn roi_for(&self, width: usize, height: usize) -> Result<Option<Roi>> {
        self.roi
            .as_ref()
            .map(|rect| Roi::rectangle(rect, width, height))
            .transpose()
    }
}

/// Subtract a background level from every pixel of `channel`.
///
/// With a ROI, the level is the NaN-skipping ROI mean plus `constant`, and
/// the ROI is consumed. Without one, `constant` alone is subtracted, and a
/// zero constant is an error that leaves the channel untouched.
///
/// Returns the level that was subtracted.
pub fn subtract_background(
    channel: &mut ChannelImage,
    roi: &mut Option<Roi>,
    constant: f32,
    floor: FloorPolicy,
) -> Result<f32> {
    let level = background_level(channel, roi.as_ref(), constant)?;
    channel.snapshot();
    subtract_level(channel, level, floor);
    roi.take();
    info!(channel = %channel.label, level, ?floor, "Background subtracted");
    Ok(level)
}

/// Stack variant: each slice gets its own ROI mean, and results are
/// clamped at zero.
pub fn subtract_background_stack(
    stack: &mut ChannelStack,
    roi: &mut Option<Roi>,
    constant: f32,
) -> Result<Vec<f32>> {
    let levels = stack
        .slices
        .iter()
        .map(|slice| background_level(slice, roi.as_ref(), constant))
        .collect::<Result<Vec<f32>>>()?;

    for (slice, &level) in stack.slices.iter_mut().zip(&levels) {
        slice.snapshot();
        subtract_level(slice, level, FloorPolicy::ClampToZero);
    }
    roi.take();
    info!(
        channel = stack.label(),
        slices = levels.len(),
        "Background subtracted from stack"
    );
    Ok(levels)
}

fn background_level(channel: &ChannelImage, roi: Option<&Roi>, constant: f32) -> Result<f32> {
    match roi {
        None if constant == 0.0 => Err(FretError::MissingRoiOrConstant(channel.label.clone())),
        None => Ok(constant),
        Some(roi) => {
            roi.ensure_fits(channel)?;
            let mean = mean_intensity(&channel.data, Some(roi)) as f32;
            if mean.is_nan() {
                warn!(channel = %channel.label, "Background ROI has no valid pixels");
            }
            Ok(mean + constant)
        }
    }
}

fn subtract_level(channel: &mut ChannelImage, level: f32, floor: FloorPolicy) {
    match floor {
        FloorPolicy::Unclamped => channel.data.mapv_inplace(|v| v - level),
        FloorPolicy::ClampToZero => channel.data.mapv_inplace(|v| {
            let corrected = v - level;
            if corrected < 0.0 {
                0.0
            } else {
                corrected
            }
        }),
    }
}
