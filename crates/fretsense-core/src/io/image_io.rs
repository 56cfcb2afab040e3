use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;
use tracing::debug;

use crate::channel::{ChannelImage, ChannelStack};
use crate::error::{FretError, Result};

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a channel image, one slice per TIFF page.
///
/// Intensities are kept as raw values (no normalisation). Files with more
/// than one sample per pixel are rejected.
pub fn load_channel_stack(path: &Path) -> Result<ChannelStack> {
    let label = label_for(path);
    match path.extension().and_then(|e| e.to_str()) {
        Some("tif" | "tiff" | "TIF" | "TIFF") => load_tiff_stack(path, &label),
        _ => Ok(ChannelStack::single(load_other(path, &label)?)),
    }
}

/// Load a single-slice channel image.
pub fn load_channel(path: &Path) -> Result<ChannelImage> {
    load_channel_stack(path)?.into_single()
}

fn load_tiff_stack(path: &Path, label: &str) -> Result<ChannelStack> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut slices = Vec::new();

    loop {
        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(FretError::UnsupportedImage(format!(
                    "{label}: expected a single-channel image, found {other:?}"
                )))
            }
        }
        let (w, h) = decoder.dimensions()?;
        let pixels = decoding_to_f32(decoder.read_image()?, label)?;
        let data = Array2::from_shape_vec((h as usize, w as usize), pixels).map_err(|_| {
            FretError::UnsupportedImage(format!("{label}: pixel count does not match {w}x{h}"))
        })?;
        let slice_label = if slices.is_empty() {
            label.to_string()
        } else {
            format!("{label}:{}", slices.len() + 1)
        };
        slices.push(ChannelImage::new(data, slice_label));

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    debug!(file = label, slices = slices.len(), "Loaded TIFF");
    ChannelStack::new(slices)
}

fn decoding_to_f32(result: DecodingResult, label: &str) -> Result<Vec<f32>> {
    let pixels = match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => {
            return Err(FretError::UnsupportedImage(format!(
                "{label}: unsupported sample format"
            )))
        }
    };
    Ok(pixels)
}

fn load_other(path: &Path, label: &str) -> Result<ChannelImage> {
    let img = image::open(path)?;
    if img.color().has_color() {
        return Err(FretError::UnsupportedImage(format!(
            "{label}: expected a single-channel image, found {:?}",
            img.color()
        )));
    }
    let (w, h) = (img.width() as usize, img.height() as usize);
    let pixels: Vec<f32> = match img {
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma16(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        other => other.to_luma32f().into_raw(),
    };
    let data = Array2::from_shape_vec((h, w), pixels)
        .map_err(|_| FretError::UnsupportedImage(format!("{label}: bad pixel buffer")))?;
    Ok(ChannelImage::new(data, label))
}

/// Save one or more float slices as a 32-bit float grayscale TIFF.
///
/// NaN pixels are written as NaN.
pub fn save_float_tiff_stack(slices: &[&Array2<f32>], path: &Path) -> Result<()> {
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    for data in slices {
        let (h, w) = data.dim();
        let pixels: Vec<f32> = data.iter().copied().collect();
        encoder.write_image::<colortype::Gray32Float>(w as u32, h as u32, &pixels)?;
    }
    Ok(())
}

pub fn save_float_tiff(data: &Array2<f32>, path: &Path) -> Result<()> {
    save_float_tiff_stack(&[data], path)
}

/// Save an 8-bit preview stretched between the finite min and max.
/// NaN pixels are black.
pub fn save_preview_png(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let (lo, hi) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = if hi > lo { hi - lo } else { 1.0 };

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in data.indexed_iter() {
        let val = if v.is_finite() {
            ((v - lo) / range * 255.0).clamp(0.0, 255.0) as u8
        } else {
            0
        };
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a FRET result, choosing the format from the file extension.
pub fn save_image(data: &Array2<f32>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_preview_png(data, path),
        _ => save_float_tiff(data, path),
    }
}
