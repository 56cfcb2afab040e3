use thiserror::Error;

#[derive(Error, Debug)]
pub enum FretError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    #[error("No {0} image set")]
    MissingImage(String),

    #[error("No ROI or constant defined for {0} background")]
    MissingRoiOrConstant(String),

    #[error("Calibration constant {0} is not set")]
    MissingConstant(String),

    #[error("Invalid value for {field}: {value:?}")]
    Parse { field: String, value: String },

    #[error("Gaussian blur sigma must be a positive number (got {0})")]
    InvalidSigma(f32),

    #[error("Invalid threshold range [{min}, {max}]")]
    InvalidThreshold { min: f32, max: f32 },

    #[error("Invalid ROI: {0}")]
    InvalidRoi(String),

    #[error("{what}: expected {expected_width}x{expected_height}, got {width}x{height}")]
    ShapeMismatch {
        what: String,
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Slice count mismatch: {first} has {first_count} slice(s), {second} has {second_count}")]
    SliceCountMismatch {
        first: String,
        first_count: usize,
        second: String,
        second_count: usize,
    },

    #[error("Unsupported image layout: {0}")]
    UnsupportedImage(String),

    #[error("Nothing to reset: no snapshot of {0}")]
    NoSnapshot(String),

    #[error("Empty channel stack")]
    EmptyStack,
}

pub type Result<T> = std::result::Result<T, FretError>;
