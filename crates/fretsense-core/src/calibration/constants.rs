use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FretError, Result};

use super::scheme::Factor;

/// Scalar calibration constants of a session. Every value starts unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConstants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s1: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s2: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s4: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s5: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s6: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b1: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b2: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b3: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    /// Donor FRET efficiency measured by acceptor photobleaching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebl: Option<f32>,
    /// Ratio of molar absorption coefficients, εd/εa.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_ratio: Option<f32>,
}

impl CalibrationConstants {
    pub fn factor(&self, factor: Factor) -> Option<f32> {
        match factor {
            Factor::S1 => self.s1,
            Factor::S2 => self.s2,
            Factor::S3 => self.s3,
            Factor::S4 => self.s4,
            Factor::S5 => self.s5,
            Factor::S6 => self.s6,
            Factor::B1 => self.b1,
            Factor::B2 => self.b2,
            Factor::B3 => self.b3,
        }
    }

    pub fn set_factor(&mut self, factor: Factor, value: f32) {
        let slot = match factor {
            Factor::S1 => &mut self.s1,
            Factor::S2 => &mut self.s2,
            Factor::S3 => &mut self.s3,
            Factor::S4 => &mut self.s4,
            Factor::S5 => &mut self.s5,
            Factor::S6 => &mut self.s6,
            Factor::B1 => &mut self.b1,
            Factor::B2 => &mut self.b2,
            Factor::B3 => &mut self.b3,
        };
        *slot = Some(value);
    }

    /// The value of `factor`, or a named error when it is unset.
    pub fn require_factor(&self, factor: Factor) -> Result<f32> {
        require(&factor.to_string(), self.factor(factor))
    }

    pub fn require_alpha(&self) -> Result<f32> {
        require("alpha", self.alpha)
    }

    /// Overwrite every constant that is set in `other`.
    pub fn merge(&mut self, other: &CalibrationConstants) {
        let pairs = [
            (&mut self.s1, other.s1),
            (&mut self.s2, other.s2),
            (&mut self.s3, other.s3),
            (&mut self.s4, other.s4),
            (&mut self.s5, other.s5),
            (&mut self.s6, other.s6),
            (&mut self.b1, other.b1),
            (&mut self.b2, other.b2),
            (&mut self.b3, other.b3),
            (&mut self.alpha, other.alpha),
            (&mut self.ebl, other.ebl),
            (&mut self.eps_ratio, other.eps_ratio),
        ];
        for (slot, value) in pairs {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

/// Unwrap a constant, warning (not failing) when it is not positive.
pub fn require(name: &str, value: Option<f32>) -> Result<f32> {
    let value = value.ok_or_else(|| FretError::MissingConstant(name.to_string()))?;
    if value <= 0.0 || value.is_nan() {
        warn!(constant = name, value, "Calibration constant is not positive");
    }
    Ok(value)
}

/// Parse a user-entered constant. Empty input means "unset".
pub fn parse_constant(name: &str, text: &str) -> Result<Option<f32>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f32>()
        .map(Some)
        .map_err(|_| FretError::Parse {
            field: name.to_string(),
            value: text.to_string(),
        })
}
