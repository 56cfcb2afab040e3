pub mod gaussian_blur;
pub mod threshold;

pub use gaussian_blur::{gaussian_blur_array, parse_sigma, smooth_channel};
pub use threshold::{apply_threshold, smooth_and_threshold, ThresholdRange};
