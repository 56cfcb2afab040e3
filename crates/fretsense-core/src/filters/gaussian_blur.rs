use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::channel::ChannelImage;
use crate::consts::{BLUR_ACCURACY, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{FretError, Result};

/// Blur a channel in place with a separable Gaussian of the given sigma.
///
/// A snapshot is recorded first so the blur can be reset. A non-positive or
/// non-finite sigma is rejected before anything is touched.
pub fn smooth_channel(channel: &mut ChannelImage, sigma: f32) -> Result<()> {
    validate_sigma(sigma)?;
    channel.snapshot();
    channel.data = gaussian_blur_array(&channel.data, sigma, BLUR_ACCURACY);
    debug!(channel = %channel.label, sigma, "Gaussian blur applied");
    Ok(())
}

/// Parse a user-entered sigma, e.g. from a text field.
pub fn parse_sigma(text: &str) -> Result<f32> {
    let sigma = text.trim().parse::<f32>().map_err(|_| FretError::Parse {
        field: "sigma".into(),
        value: text.to_string(),
    })?;
    validate_sigma(sigma)?;
    Ok(sigma)
}

fn validate_sigma(sigma: f32) -> Result<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FretError::InvalidSigma(sigma));
    }
    Ok(())
}

/// Apply Gaussian blur to a raw array.
///
/// The kernel extends until its value falls below `accuracy` times the
/// peak. Edge pixels are replicated. NaN pixels spread to every output
/// pixel whose kernel covers them.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32, accuracy: f32) -> Array2<f32> {
    let kernel = make_gaussian_kernel(sigma, accuracy);
    let row_pass = convolve(data, &kernel, Axis::Rows);
    convolve(&row_pass, &kernel, Axis::Cols)
}

fn make_gaussian_kernel(sigma: f32, accuracy: f32) -> Vec<f32> {
    let radius = (sigma * (-2.0 * accuracy.ln()).sqrt()).ceil() as usize + 1;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Cols,
}

fn convolve_pixel(data: &Array2<f32>, kernel: &[f32], axis: Axis, row: usize, col: usize) -> f32 {
    let (h, w) = data.dim();
    let radius = kernel.len() as isize / 2;
    let mut sum = 0.0f32;
    for (ki, &kv) in kernel.iter().enumerate() {
        let offset = ki as isize - radius;
        let v = match axis {
            Axis::Rows => {
                let src_col = (col as isize + offset).clamp(0, w as isize - 1) as usize;
                data[[row, src_col]]
            }
            Axis::Cols => {
                let src_row = (row as isize + offset).clamp(0, h as isize - 1) as usize;
                data[[src_row, col]]
            }
        };
        sum += v * kv;
    }
    sum
}

fn convolve(data: &Array2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let (h, w) = data.dim();

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                (0..w)
                    .map(|col| convolve_pixel(data, kernel, axis, row, col))
                    .collect()
            })
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        result
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| {
            convolve_pixel(data, kernel, axis, row, col)
        })
    }
}
