use serde::{Deserialize, Serialize};

use self::ChannelRole::{Acceptor, Autofluorescence, Donor, Transfer};

/// Role of a channel image within a control or experimental sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    Donor,
    Transfer,
    Acceptor,
    Autofluorescence,
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Donor => write!(f, "donor"),
            Self::Transfer => write!(f, "transfer"),
            Self::Acceptor => write!(f, "acceptor"),
            Self::Autofluorescence => write!(f, "autofluorescence"),
        }
    }
}

/// A bleed-through / cross-excitation calibration factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Factor {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    B1,
    B2,
    B3,
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::S4 => "S4",
            Self::S5 => "S5",
            Self::S6 => "S6",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
        };
        write!(f, "{name}")
    }
}

/// Which pixels contribute to a factor's average.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelValidity {
    /// The ratio's denominator is strictly positive (NaN fails this test).
    DenominatorPositive,
    /// None of the scheme's channels is NaN at this pixel.
    NoNaN,
}

/// One averaged per-pixel ratio: `numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatioSpec {
    pub factor: Factor,
    pub numerator: ChannelRole,
    pub denominator: ChannelRole,
}

const fn spec(factor: Factor, numerator: ChannelRole, denominator: ChannelRole) -> RatioSpec {
    RatioSpec {
        factor,
        numerator,
        denominator,
    }
}

/// A calibration measurement: which control images it needs and which
/// ratios it averages over them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationScheme {
    /// Donor-only control: S1 = T/D, S3 = A/D.
    S1S3,
    /// Acceptor-only control: S2 = T/A, S4 = D/A.
    S2S4,
    /// Donor-only control with an autofluorescence channel: adds S5 = AF/D.
    S1S3S5,
    /// Acceptor-only control with an autofluorescence channel: adds S6 = AF/A.
    S2S4S6,
    /// Unlabeled control, every channel normalised by donor.
    B1B2B3,
}

impl CalibrationScheme {
    pub const ALL: [CalibrationScheme; 5] = [
        Self::S1S3,
        Self::S2S4,
        Self::S1S3S5,
        Self::S2S4S6,
        Self::B1B2B3,
    ];

    pub fn required_channels(&self) -> &'static [ChannelRole] {
        match self {
            Self::S1S3 | Self::S2S4 => &[Donor, Transfer, Acceptor],
            Self::S1S3S5 | Self::S2S4S6 | Self::B1B2B3 => {
                &[Donor, Transfer, Acceptor, Autofluorescence]
            }
        }
    }

    pub fn ratios(&self) -> &'static [RatioSpec] {
        const S1S3: [RatioSpec; 2] = [
            spec(Factor::S1, Transfer, Donor),
            spec(Factor::S3, Acceptor, Donor),
        ];
        const S2S4: [RatioSpec; 2] = [
            spec(Factor::S2, Transfer, Acceptor),
            spec(Factor::S4, Donor, Acceptor),
        ];
        const S1S3S5: [RatioSpec; 3] = [
            spec(Factor::S1, Transfer, Donor),
            spec(Factor::S3, Acceptor, Donor),
            spec(Factor::S5, Autofluorescence, Donor),
        ];
        const S2S4S6: [RatioSpec; 3] = [
            spec(Factor::S2, Transfer, Acceptor),
            spec(Factor::S4, Donor, Acceptor),
            spec(Factor::S6, Autofluorescence, Acceptor),
        ];
        const B1B2B3: [RatioSpec; 3] = [
            spec(Factor::B1, Transfer, Donor),
            spec(Factor::B2, Acceptor, Donor),
            spec(Factor::B3, Autofluorescence, Donor),
        ];
        match self {
            Self::S1S3 => &S1S3,
            Self::S2S4 => &S2S4,
            Self::S1S3S5 => &S1S3S5,
            Self::S2S4S6 => &S2S4S6,
            Self::B1B2B3 => &B1B2B3,
        }
    }

    /// The three-channel schemes only require a positive denominator; the
    /// four-channel schemes require every operand to be a number.
    pub fn validity(&self) -> PixelValidity {
        match self {
            Self::S1S3 | Self::S2S4 => PixelValidity::DenominatorPositive,
            Self::S1S3S5 | Self::S2S4S6 | Self::B1B2B3 => PixelValidity::NoNaN,
        }
    }

    /// Kind of control sample the scheme is measured on.
    pub fn control_sample(&self) -> &'static str {
        match self {
            Self::S1S3 | Self::S1S3S5 => "donor-only",
            Self::S2S4 | Self::S2S4S6 => "acceptor-only",
            Self::B1B2B3 => "unlabeled",
        }
    }
}

impl std::fmt::Display for CalibrationScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factors: Vec<String> = self.ratios().iter().map(|r| r.factor.to_string()).collect();
        write!(f, "{} ({})", factors.join("/"), self.control_sample())
    }
}
