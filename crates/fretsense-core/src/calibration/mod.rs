pub mod alpha;
pub mod constants;
pub mod scheme;
pub mod session;

pub use alpha::{calibrate_alpha, AlphaInputs, BleachingMeasurements, EpsRatioSource};
pub use constants::{parse_constant, CalibrationConstants};
pub use scheme::{CalibrationScheme, ChannelRole, Factor, PixelValidity, RatioSpec};
pub use session::{CalibrationResult, CalibrationSession, FactorEstimate};
