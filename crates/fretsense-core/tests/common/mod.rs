#![allow(dead_code)]

use std::path::Path;

use fretsense_core::channel::ChannelImage;
use fretsense_core::io::image_io::save_float_tiff;
use ndarray::Array2;

/// Build an array from nested rows.
pub fn array_from_rows(rows: &[&[f32]]) -> Array2<f32> {
    let h = rows.len();
    let w = rows[0].len();
    Array2::from_shape_fn((h, w), |(r, c)| rows[r][c])
}

pub fn channel_from_rows(rows: &[&[f32]], label: &str) -> ChannelImage {
    ChannelImage::new(array_from_rows(rows), label)
}

pub fn uniform_channel(h: usize, w: usize, value: f32, label: &str) -> ChannelImage {
    ChannelImage::new(Array2::from_elem((h, w), value), label)
}

/// Channel whose pixel at (row, col) is `row * w + col + offset`.
pub fn ramp_channel(h: usize, w: usize, offset: f32, label: &str) -> ChannelImage {
    ChannelImage::new(
        Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f32 + offset),
        label,
    )
}

/// Write a uniform float TIFF and return its path inside `dir`.
pub fn write_uniform_tiff(dir: &Path, name: &str, h: usize, w: usize, value: f32) -> std::path::PathBuf {
    let path = dir.join(name);
    save_float_tiff(&Array2::from_elem((h, w), value), &path).expect("write tiff");
    path
}
