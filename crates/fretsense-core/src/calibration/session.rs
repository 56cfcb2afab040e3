use std::collections::BTreeMap;

use ndarray::Array2;
use tracing::{info, warn};

use crate::channel::{ChannelImage, Roi};
use crate::correction::{subtract_background, FloorPolicy};
use crate::error::{FretError, Result};

use super::constants::CalibrationConstants;
use super::scheme::{CalibrationScheme, ChannelRole, Factor, PixelValidity, RatioSpec};

/// Average of one ratio over the valid pixels of a control sample.
#[derive(Clone, Debug)]
pub struct FactorEstimate {
    pub factor: Factor,
    /// `sum / valid_count`; NaN when no pixel was valid.
    pub value: f32,
    pub valid_count: usize,
    /// Per-pixel ratio with NaN at invalid pixels, when requested.
    pub image: Option<Array2<f32>>,
}

#[derive(Clone, Debug)]
pub struct CalibrationResult {
    pub scheme: CalibrationScheme,
    pub estimates: Vec<FactorEstimate>,
}

impl CalibrationResult {
    pub fn value(&self, factor: Factor) -> Option<f32> {
        self.estimates
            .iter()
            .find(|e| e.factor == factor)
            .map(|e| e.value)
    }

    /// Store every computed factor in `constants`, overwriting earlier
    /// values.
    pub fn apply_to(&self, constants: &mut CalibrationConstants) {
        for estimate in &self.estimates {
            constants.set_factor(estimate.factor, estimate.value);
        }
    }
}

/// Control-sample images for one calibration scheme.
///
/// Background correction here never clamps: the images only feed ratios.
#[derive(Clone, Debug)]
pub struct CalibrationSession {
    pub scheme: CalibrationScheme,
    channels: BTreeMap<ChannelRole, ChannelImage>,
}

impl CalibrationSession {
    pub fn new(scheme: CalibrationScheme) -> Self {
        Self {
            scheme,
            channels: BTreeMap::new(),
        }
    }

    /// Assign (or replace) the image for `role`, discarding any snapshot.
    pub fn set_channel(&mut self, role: ChannelRole, mut image: ChannelImage) {
        image.clear_snapshot();
        self.channels.insert(role, image);
    }

    pub fn channel(&self, role: ChannelRole) -> Option<&ChannelImage> {
        self.channels.get(&role)
    }

    pub fn channel_mut(&mut self, role: ChannelRole) -> Result<&mut ChannelImage> {
        self.channels
            .get_mut(&role)
            .ok_or_else(|| FretError::MissingImage(role.to_string()))
    }

    pub fn subtract_background(
        &mut self,
        role: ChannelRole,
        roi: &mut Option<Roi>,
        constant: f32,
    ) -> Result<f32> {
        let channel = self.channel_mut(role)?;
        subtract_background(channel, roi, constant, FloorPolicy::Unclamped)
    }

    pub fn reset(&mut self, role: ChannelRole) -> Result<()> {
        self.channel_mut(role)?.reset()
    }

    /// Average every ratio of the scheme over the valid pixels.
    ///
    /// Fails if a required image is missing or shapes disagree. A zero
    /// valid-pixel count is not an error: the factor comes out NaN.
    pub fn compute(&self, with_images: bool) -> Result<CalibrationResult> {
        let images = self
            .scheme
            .required_channels()
            .iter()
            .map(|&role| self.image(role))
            .collect::<Result<Vec<_>>>()?;
        let first = images[0];
        for image in &images[1..] {
            first.ensure_same_shape(image)?;
        }

        let validity = self.scheme.validity();
        let any_nan = |row: usize, col: usize| images.iter().any(|img| img.data[[row, col]].is_nan());

        let mut estimates = Vec::with_capacity(self.scheme.ratios().len());
        for spec in self.scheme.ratios() {
            let estimate = average_ratio(
                spec,
                self.image(spec.numerator)?,
                self.image(spec.denominator)?,
                validity,
                &any_nan,
                with_images,
            );
            if estimate.valid_count == 0 {
                warn!(factor = %spec.factor, "No valid pixels; factor is undefined");
            }
            info!(
                factor = %estimate.factor,
                value = estimate.value,
                count = estimate.valid_count,
                "Calibration factor computed"
            );
            estimates.push(estimate);
        }

        Ok(CalibrationResult {
            scheme: self.scheme,
            estimates,
        })
    }

    fn image(&self, role: ChannelRole) -> Result<&ChannelImage> {
        self.channels
            .get(&role)
            .ok_or_else(|| FretError::MissingImage(role.to_string()))
    }
}

fn average_ratio(
    spec: &RatioSpec,
    numerator: &ChannelImage,
    denominator: &ChannelImage,
    validity: PixelValidity,
    any_nan: &dyn Fn(usize, usize) -> bool,
    with_image: bool,
) -> FactorEstimate {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    let mut image = with_image.then(|| Array2::<f32>::from_elem(numerator.data.dim(), f32::NAN));

    for ((row, col), &num) in numerator.data.indexed_iter() {
        let den = denominator.data[[row, col]];
        let valid = match validity {
            PixelValidity::DenominatorPositive => den > 0.0,
            PixelValidity::NoNaN => !any_nan(row, col),
        };
        if !valid {
            continue;
        }
        let r = num / den;
        sum += r as f64;
        count += 1;
        if let Some(ref mut img) = image {
            img[[row, col]] = r;
        }
    }

    FactorEstimate {
        factor: spec.factor,
        value: (sum / count as f64) as f32,
        valid_count: count,
        image,
    }
}
