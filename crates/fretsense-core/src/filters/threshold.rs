use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channel::ChannelImage;
use crate::error::{FretError, Result};

use super::gaussian_blur::smooth_channel;

/// Inclusive intensity range; pixels outside it are masked to NaN.
///
/// Deserialisation goes through [`ThresholdRange::new`], so a config cannot
/// carry a reversed or NaN range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct ThresholdRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Deserialize)]
struct RangeBounds {
    min: f32,
    max: f32,
}

impl TryFrom<RangeBounds> for ThresholdRange {
    type Error = FretError;

    fn try_from(bounds: RangeBounds) -> Result<Self> {
        Self::new(bounds.min, bounds.max)
    }
}

impl ThresholdRange {
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FretError::InvalidThreshold { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Set every pixel outside `range` to NaN, after recording a snapshot.
///
/// Returns the number of pixels that were masked by this call.
pub fn apply_threshold(channel: &mut ChannelImage, range: ThresholdRange) -> usize {
    channel.snapshot();
    let masked = mask_outside(&mut channel.data, range);
    debug!(channel = %channel.label, min = range.min, max = range.max, masked, "Threshold applied");
    masked
}

pub(crate) fn mask_outside(data: &mut ndarray::Array2<f32>, range: ThresholdRange) -> usize {
    let mut masked = 0usize;
    for v in data.iter_mut() {
        if !v.is_nan() && !range.contains(*v) {
            *v = f32::NAN;
            masked += 1;
        }
    }
    masked
}

/// Optional blur followed by optional threshold, sharing one snapshot so a
/// single reset undoes both.
///
/// An invalid sigma is logged and only the blur is skipped.
pub fn smooth_and_threshold(
    channel: &mut ChannelImage,
    sigma: Option<f32>,
    range: Option<ThresholdRange>,
) -> Result<()> {
    if let Some(sigma) = sigma {
        match smooth_channel(channel, sigma) {
            Err(FretError::InvalidSigma(sigma)) => {
                warn!(channel = %channel.label, sigma, "Invalid blur sigma; smoothing skipped");
            }
            other => other?,
        }
    }
    if let Some(range) = range {
        apply_threshold(channel, range);
    }
    Ok(())
}
