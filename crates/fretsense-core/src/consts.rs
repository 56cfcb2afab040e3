/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Gaussian kernel accuracy: the kernel is truncated where its tail drops
/// below this fraction of the peak.
pub const BLUR_ACCURACY: f32 = 0.01;

/// Default lower bound of the FRET efficiency auto-threshold.
pub const DEFAULT_FRET_THRESHOLD_MIN: f32 = 0.0;

/// Default upper bound of the FRET efficiency auto-threshold.
pub const DEFAULT_FRET_THRESHOLD_MAX: f32 = 1.0;

/// Default Gaussian blur sigma offered by the session config.
pub const DEFAULT_BLUR_SIGMA: f32 = 2.0;
