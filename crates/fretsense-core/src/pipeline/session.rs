use ndarray::Array2;
use tracing::{info, warn};

use crate::calibration::{CalibrationConstants, ChannelRole};
use crate::channel::{ensure_matching_stacks, ChannelStack, Roi};
use crate::compose::compose_fret;
use crate::correction::{subtract_background_stack, BackgroundSettings};
use crate::error::{FretError, Result};
use crate::filters::{smooth_and_threshold, ThresholdRange};
use crate::stats::{image_statistics, ImageStatistics};

use super::types::{PipelineStage, ProgressReporter};

/// One step of a FRET run, applied to every slice of the named channel.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineStep {
    SubtractBackground {
        role: ChannelRole,
        settings: BackgroundSettings,
    },
    SmoothAndThreshold {
        role: ChannelRole,
        sigma: Option<f32>,
        range: Option<ThresholdRange>,
    },
    Compose {
        threshold: Option<ThresholdRange>,
    },
}

/// The channels and constants of an experimental sample.
///
/// Constants persist across compositions until overwritten; every
/// composition replaces the previous output.
#[derive(Clone, Debug, Default)]
pub struct FretSession {
    donor: Option<ChannelStack>,
    transfer: Option<ChannelStack>,
    acceptor: Option<ChannelStack>,
    pub constants: CalibrationConstants,
    output: Option<Vec<Array2<f32>>>,
}

impl FretSession {
    pub fn new(constants: CalibrationConstants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    fn slot(&mut self, role: ChannelRole) -> Result<&mut Option<ChannelStack>> {
        match role {
            ChannelRole::Donor => Ok(&mut self.donor),
            ChannelRole::Transfer => Ok(&mut self.transfer),
            ChannelRole::Acceptor => Ok(&mut self.acceptor),
            ChannelRole::Autofluorescence => Err(FretError::UnsupportedImage(
                "FRET composition takes no autofluorescence channel".into(),
            )),
        }
    }

    /// Assign (or replace) the stack for `role`, discarding any snapshot.
    pub fn set_channel(&mut self, role: ChannelRole, mut stack: ChannelStack) -> Result<()> {
        let slot = self.slot(role)?;
        for slice in &mut stack.slices {
            slice.clear_snapshot();
        }
        *slot = Some(stack);
        Ok(())
    }

    pub fn channel(&self, role: ChannelRole) -> Option<&ChannelStack> {
        match role {
            ChannelRole::Donor => self.donor.as_ref(),
            ChannelRole::Transfer => self.transfer.as_ref(),
            ChannelRole::Acceptor => self.acceptor.as_ref(),
            ChannelRole::Autofluorescence => None,
        }
    }

    fn channel_mut(&mut self, role: ChannelRole) -> Result<&mut ChannelStack> {
        self.slot(role)?
            .as_mut()
            .ok_or_else(|| FretError::MissingImage(role.to_string()))
    }

    /// Stack-mode background subtraction: results are floored at zero.
    pub fn subtract_background(
        &mut self,
        role: ChannelRole,
        settings: &BackgroundSettings,
    ) -> Result<Vec<f32>> {
        let stack = self.channel_mut(role)?;
        let mut roi = settings.roi_for(stack.width(), stack.height())?;
        subtract_background_stack(stack, &mut roi, settings.constant)
    }

    pub fn smooth_and_threshold(
        &mut self,
        role: ChannelRole,
        sigma: Option<f32>,
        range: Option<ThresholdRange>,
    ) -> Result<()> {
        for slice in &mut self.channel_mut(role)?.slices {
            smooth_and_threshold(slice, sigma, range)?;
        }
        Ok(())
    }

    /// Undo every correction applied to `role` since it was assigned.
    pub fn reset(&mut self, role: ChannelRole) -> Result<()> {
        for slice in &mut self.channel_mut(role)?.slices {
            slice.reset()?;
        }
        Ok(())
    }

    /// Compose the FRET image of every slice.
    ///
    /// The previous output is discarded first. Missing images, missing
    /// constants and mismatched stacks abort before any pixel is computed.
    pub fn compose(&mut self, threshold: Option<ThresholdRange>) -> Result<&[Array2<f32>]> {
        self.output = None;
        let donor = self.donor.as_ref().ok_or_else(|| FretError::MissingImage("donor".into()))?;
        let transfer = self
            .transfer
            .as_ref()
            .ok_or_else(|| FretError::MissingImage("transfer".into()))?;
        let acceptor = self
            .acceptor
            .as_ref()
            .ok_or_else(|| FretError::MissingImage("acceptor".into()))?;
        ensure_matching_stacks(&[donor, transfer, acceptor])?;

        let slices = donor
            .slices
            .iter()
            .zip(&transfer.slices)
            .zip(&acceptor.slices)
            .map(|((d, t), a)| compose_fret(d, t, a, &self.constants, threshold))
            .collect::<Result<Vec<_>>>()?;
        info!(slices = slices.len(), "FRET composition complete");
        Ok(self.output.insert(slices).as_slice())
    }

    pub fn output(&self) -> Option<&[Array2<f32>]> {
        self.output.as_deref()
    }

    /// Statistics of every output slice, restricted to `roi` when given.
    pub fn measure(&self, roi: Option<&Roi>) -> Result<Vec<ImageStatistics>> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| FretError::MissingImage("FRET".into()))?;
        Ok(output.iter().map(|img| image_statistics(img, roi)).collect())
    }

    /// Execute `steps` in order. The first failing step aborts the run.
    pub fn run_steps(
        &mut self,
        steps: &[PipelineStep],
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        for step in steps {
            match step {
                PipelineStep::SubtractBackground { role, settings } => {
                    reporter.begin_stage(PipelineStage::Background, None);
                    let levels = self.subtract_background(*role, settings)?;
                    info!(channel = %role, ?levels, "Background levels");
                }
                PipelineStep::SmoothAndThreshold { role, sigma, range } => {
                    reporter.begin_stage(PipelineStage::Smoothing, None);
                    self.smooth_and_threshold(*role, *sigma, *range)?;
                }
                PipelineStep::Compose { threshold } => {
                    reporter.begin_stage(PipelineStage::Composing, None);
                    let output = self.compose(*threshold)?;
                    if output.iter().all(|img| img.iter().all(|v| v.is_nan())) {
                        warn!("FRET image has no valid pixels");
                    }
                }
            }
            reporter.finish_stage();
        }
        Ok(())
    }
}
