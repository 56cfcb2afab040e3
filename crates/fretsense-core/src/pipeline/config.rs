use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationConstants, ChannelRole};
use crate::channel::RoiRect;
use crate::consts::{DEFAULT_BLUR_SIGMA, DEFAULT_FRET_THRESHOLD_MAX, DEFAULT_FRET_THRESHOLD_MIN};
use crate::correction::BackgroundSettings;
use crate::filters::ThresholdRange;

use super::session::PipelineStep;

/// A FRET run over one or more samples that share corrections and
/// calibration constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for FRET images; nothing is written when absent.
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub background: BackgroundConfig,
    pub smoothing: Option<SmoothingConfig>,
    #[serde(default)]
    pub threshold: ChannelThresholds,
    #[serde(default)]
    pub constants: CalibrationConstants,
    #[serde(default)]
    pub fret: FretConfig,
    pub samples: Vec<SampleSet>,
}

impl SessionConfig {
    /// The ordered correction and composition steps applied to every
    /// sample.
    pub fn steps(&self) -> Vec<PipelineStep> {
        let mut steps = Vec::new();
        for role in FRET_ROLES {
            if let Some(settings) = self.background.for_role(role).filter(|s| s.is_enabled()) {
                steps.push(PipelineStep::SubtractBackground {
                    role,
                    settings: settings.clone(),
                });
            }
        }
        for role in FRET_ROLES {
            let sigma = self.smoothing.as_ref().map(|s| s.sigma);
            let range = self.threshold.for_role(role);
            if sigma.is_some() || range.is_some() {
                steps.push(PipelineStep::SmoothAndThreshold { role, sigma, range });
            }
        }
        steps.push(PipelineStep::Compose {
            threshold: self.fret.auto_threshold,
        });
        steps
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: Some(PathBuf::from("fret")),
            background: BackgroundConfig::default(),
            smoothing: Some(SmoothingConfig::default()),
            threshold: ChannelThresholds::default(),
            constants: CalibrationConstants::default(),
            fret: FretConfig::default(),
            samples: vec![SampleSet {
                label: Some("sample".into()),
                donor: PathBuf::from("donor.tif"),
                transfer: PathBuf::from("transfer.tif"),
                acceptor: PathBuf::from("acceptor.tif"),
            }],
        }
    }
}

pub(crate) const FRET_ROLES: [ChannelRole; 3] = [
    ChannelRole::Donor,
    ChannelRole::Transfer,
    ChannelRole::Acceptor,
];

/// Paths of the three channel images of one experimental sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleSet {
    /// Written in the "File" column of the results.
    pub label: Option<String>,
    pub donor: PathBuf,
    pub transfer: PathBuf,
    pub acceptor: PathBuf,
}

impl SampleSet {
    pub fn path(&self, role: ChannelRole) -> Option<&PathBuf> {
        match role {
            ChannelRole::Donor => Some(&self.donor),
            ChannelRole::Transfer => Some(&self.transfer),
            ChannelRole::Acceptor => Some(&self.acceptor),
            ChannelRole::Autofluorescence => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub donor: BackgroundSettings,
    #[serde(default)]
    pub transfer: BackgroundSettings,
    #[serde(default)]
    pub acceptor: BackgroundSettings,
}

impl BackgroundConfig {
    pub fn for_role(&self, role: ChannelRole) -> Option<&BackgroundSettings> {
        match role {
            ChannelRole::Donor => Some(&self.donor),
            ChannelRole::Transfer => Some(&self.transfer),
            ChannelRole::Acceptor => Some(&self.acceptor),
            ChannelRole::Autofluorescence => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Gaussian sigma in pixels.
    pub sigma: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

/// Per-channel intensity ranges kept by thresholding.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelThresholds {
    pub donor: Option<ThresholdRange>,
    pub transfer: Option<ThresholdRange>,
    pub acceptor: Option<ThresholdRange>,
}

impl ChannelThresholds {
    pub fn for_role(&self, role: ChannelRole) -> Option<ThresholdRange> {
        match role {
            ChannelRole::Donor => self.donor,
            ChannelRole::Transfer => self.transfer,
            ChannelRole::Acceptor => self.acceptor,
            ChannelRole::Autofluorescence => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FretConfig {
    /// Efficiencies outside this range are masked to NaN.
    pub auto_threshold: Option<ThresholdRange>,
    /// Statistics are restricted to this rectangle when given.
    pub measure_roi: Option<RoiRect>,
}

impl Default for FretConfig {
    fn default() -> Self {
        Self {
            auto_threshold: Some(ThresholdRange {
                min: DEFAULT_FRET_THRESHOLD_MIN,
                max: DEFAULT_FRET_THRESHOLD_MAX,
            }),
            measure_roi: None,
        }
    }
}
