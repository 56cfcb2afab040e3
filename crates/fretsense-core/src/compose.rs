use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calibration::{CalibrationConstants, Factor};
use crate::channel::{ChannelImage, Roi};
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::Result;
use crate::filters::threshold::{mask_outside, ThresholdRange};
use crate::stats::{image_statistics, ImageStatistics};

/// The five constants FRET composition needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FretConstants {
    pub s1: f32,
    pub s2: f32,
    pub s3: f32,
    pub s4: f32,
    pub alpha: f32,
}

impl FretConstants {
    /// Extract S1..S4 and α, failing with the name of the first unset one.
    pub fn from_calibration(constants: &CalibrationConstants) -> Result<Self> {
        Ok(Self {
            s1: constants.require_factor(Factor::S1)?,
            s2: constants.require_factor(Factor::S2)?,
            s3: constants.require_factor(Factor::S3)?,
            s4: constants.require_factor(Factor::S4)?,
            alpha: constants.require_alpha()?,
        })
    }
}

/// FRET efficiency of a single pixel in single precision, NaN if any
/// intensity is NaN.
///
/// ```text
/// raw  = s1*s2*(T*(1 - s3*s4) - D*(s1 - s2*s3) - A*(s2 - s1*s4))
///        / ((s1 - s2*s3) * (D*s2 - T*s4) * alpha)
/// fret = raw / (1 + raw)
/// ```
pub fn fret_efficiency(donor: f32, transfer: f32, acceptor: f32, c: &FretConstants) -> f32 {
    if donor.is_nan() || transfer.is_nan() || acceptor.is_nan() {
        return f32::NAN;
    }
    let (d, t, a) = (donor, transfer, acceptor);
    let FretConstants {
        s1,
        s2,
        s3,
        s4,
        alpha,
    } = *c;
    let numerator = s1 * s2 * (t * (1.0 - s3 * s4) - d * (s1 - s2 * s3) - a * (s2 - s1 * s4));
    let denominator = (s1 - s2 * s3) * (d * s2 - t * s4) * alpha;
    let raw = numerator / denominator;
    raw / (1.0 + raw)
}

/// Compose the per-pixel FRET efficiency image of one slice.
///
/// Constants are validated before the output buffer is allocated. With
/// `threshold`, efficiencies outside the inclusive range become NaN.
pub fn compose_fret(
    donor: &ChannelImage,
    transfer: &ChannelImage,
    acceptor: &ChannelImage,
    constants: &CalibrationConstants,
    threshold: Option<ThresholdRange>,
) -> Result<Array2<f32>> {
    let c = FretConstants::from_calibration(constants)?;
    donor.ensure_same_shape(transfer)?;
    donor.ensure_same_shape(acceptor)?;

    let zip = Zip::from(&donor.data).and(&transfer.data).and(&acceptor.data);
    let mut fret = if donor.data.len() >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_map_collect(|&d, &t, &a| fret_efficiency(d, t, a, &c))
    } else {
        zip.map_collect(|&d, &t, &a| fret_efficiency(d, t, a, &c))
    };

    if let Some(range) = threshold {
        let masked = mask_outside(&mut fret, range);
        info!(min = range.min, max = range.max, masked, "FRET auto-threshold applied");
    }
    Ok(fret)
}

/// A composed FRET image with its summary statistics.
#[derive(Clone, Debug)]
pub struct FretComposition {
    pub image: Array2<f32>,
    pub statistics: ImageStatistics,
}

/// Compose and measure, restricting statistics to `roi` when given.
pub fn compose_and_measure(
    donor: &ChannelImage,
    transfer: &ChannelImage,
    acceptor: &ChannelImage,
    constants: &CalibrationConstants,
    threshold: Option<ThresholdRange>,
    roi: Option<&Roi>,
) -> Result<FretComposition> {
    if let Some(roi) = roi {
        roi.ensure_fits(donor)?;
    }
    let image = compose_fret(donor, transfer, acceptor, constants, threshold)?;
    let statistics = image_statistics(&image, roi);
    info!(
        valid = statistics.valid_count,
        mean = statistics.mean,
        median = statistics.median,
        "FRET image composed"
    );
    Ok(FretComposition { image, statistics })
}
