//! Stoichiometric α factor and the photobleaching chain that feeds it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

use super::constants::CalibrationConstants;
use super::scheme::Factor;

/// Inputs of the α calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlphaInputs {
    /// Average intensity of the donor-only sample.
    pub i1: f64,
    /// Average intensity of the acceptor-only sample.
    pub i2: f64,
    /// Labels per donor antibody.
    pub ld: f64,
    /// Labels per acceptor antibody.
    pub la: f64,
    /// Receptors per cell, donor side.
    pub nd: f64,
    /// Receptors per cell, acceptor side.
    pub na: f64,
}

/// `alpha = I2 * Ld * Nd * (εd/εa) / (I1 * La * Na)`
pub fn compute_alpha(inputs: &AlphaInputs, eps_ratio: f64) -> f64 {
    inputs.i2 * inputs.ld * inputs.nd * eps_ratio / (inputs.i1 * inputs.la * inputs.na)
}

/// Average intensities measured on a double-labeled sample before and after
/// acceptor photobleaching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BleachingMeasurements {
    /// Donor channel before bleaching.
    pub d_before: f64,
    /// Donor channel after bleaching.
    pub d_after: f64,
    /// Donor channel of the double-labeled sample.
    pub dd: f64,
    /// Transfer channel of the double-labeled sample.
    pub dt: f64,
    /// Acceptor channel of the double-labeled sample.
    pub aa: f64,
}

/// Donor FRET efficiency from acceptor photobleaching.
pub fn bleaching_efficiency(m: &BleachingMeasurements, s1: f64, s4: f64) -> f64 {
    (m.d_after - (m.d_before - s4 * m.dt) / (1.0 - s1 * s4)) / m.d_after
}

/// εd/εa from the photobleaching measurements and a known Ebl.
pub fn eps_ratio_from_bleaching(
    m: &BleachingMeasurements,
    s1: f64,
    s2: f64,
    s4: f64,
    ebl: f64,
) -> f64 {
    let cross = (1.0 - s1 * s4) * s2 * m.aa;
    (m.dt - s1 * m.dd - cross) / (cross * ebl)
}

/// How εd/εa is obtained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EpsRatioSource {
    /// Entered by the user.
    Manual(f64),
    /// Derived from photobleaching. `ebl` bypasses the Ebl computation
    /// when given.
    Bleaching {
        measurements: BleachingMeasurements,
        ebl: Option<f64>,
    },
}

/// Resolve εd/εa, computing Ebl on the way when needed. S1, S2 and S4 are
/// read from `constants` for the bleaching route; the resolved Ebl and
/// εd/εa are written back.
pub fn resolve_eps_ratio(
    source: &EpsRatioSource,
    constants: &mut CalibrationConstants,
) -> Result<f64> {
    let eps = match source {
        EpsRatioSource::Manual(value) => *value,
        EpsRatioSource::Bleaching { measurements, ebl } => {
            let s1 = constants.require_factor(Factor::S1)? as f64;
            let s2 = constants.require_factor(Factor::S2)? as f64;
            let s4 = constants.require_factor(Factor::S4)? as f64;
            let ebl = match ebl {
                Some(manual) => *manual,
                None => bleaching_efficiency(measurements, s1, s4),
            };
            info!(ebl, "Bleaching FRET efficiency");
            constants.ebl = Some(ebl as f32);
            eps_ratio_from_bleaching(measurements, s1, s2, s4, ebl)
        }
    };
    constants.eps_ratio = Some(eps as f32);
    Ok(eps)
}

/// Full α chain: resolve εd/εa, compute α and store it in `constants`.
pub fn calibrate_alpha(
    inputs: &AlphaInputs,
    source: &EpsRatioSource,
    constants: &mut CalibrationConstants,
) -> Result<f64> {
    let eps = resolve_eps_ratio(source, constants)?;
    if eps.is_nan() || eps <= 0.0 {
        warn!(eps_ratio = eps, "Absorption coefficient ratio is not positive");
    }
    let alpha = compute_alpha(inputs, eps);
    info!(alpha, eps_ratio = eps, "Alpha factor computed");
    constants.alpha = Some(alpha as f32);
    Ok(alpha)
}
