use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::channel::Roi;

/// Summary statistics of an image, restricted to an optional ROI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageStatistics {
    /// Pixels considered (ROI members, or the whole image).
    pub pixel_count: usize,
    /// Considered pixels that are not NaN.
    pub valid_count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Values of `data` that lie inside `roi` (all pixels without one) and are
/// not NaN.
fn valid_values(data: &Array2<f32>, roi: Option<&Roi>) -> (usize, Vec<f64>) {
    let mut considered = 0usize;
    let mut values = Vec::new();
    for ((row, col), &v) in data.indexed_iter() {
        if let Some(roi) = roi {
            if !roi.contains(row, col) {
                continue;
            }
        }
        considered += 1;
        if !v.is_nan() {
            values.push(v as f64);
        }
    }
    (considered, values)
}

/// Mean of the non-NaN pixels of `data`, inside `roi` when one is given.
///
/// Returns NaN when no pixel qualifies.
pub fn mean_intensity(data: &Array2<f32>, roi: Option<&Roi>) -> f64 {
    let (_, values) = valid_values(data, roi);
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute count, mean, median, standard deviation, min and max.
///
/// With no valid pixel every statistic except the counts is NaN.
pub fn image_statistics(data: &Array2<f32>, roi: Option<&Roi>) -> ImageStatistics {
    let (pixel_count, mut values) = valid_values(data, roi);
    let n = values.len();
    if n == 0 {
        return ImageStatistics {
            pixel_count,
            valid_count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    values.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    };

    ImageStatistics {
        pixel_count,
        valid_count: n,
        mean,
        median,
        std_dev,
        min: values[0],
        max: values[n - 1],
    }
}
