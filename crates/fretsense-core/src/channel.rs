use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{FretError, Result};

/// A single fluorescence channel slice.
///
/// Pixel values are raw f32 intensities. NaN marks a pixel excluded from
/// every statistic and every downstream calculation.
#[derive(Clone, Debug)]
pub struct ChannelImage {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Human-readable name used in messages and result rows.
    pub label: String,
    snapshot: Option<Array2<f32>>,
}

impl ChannelImage {
    pub fn new(data: Array2<f32>, label: impl Into<String>) -> Self {
        Self {
            data,
            label: label.into(),
            snapshot: None,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Replace the pixel buffer. Any pending snapshot is dropped since it
    /// belongs to the previous image.
    pub fn reassign(&mut self, data: Array2<f32>) {
        self.data = data;
        self.snapshot = None;
    }

    /// Forget any snapshot, as on (re)assignment.
    pub fn clear_snapshot(&mut self) {
        self.snapshot = None;
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Save the current buffer before a destructive operation.
    ///
    /// Only the first destructive operation after (re)assignment records a
    /// snapshot; later ones keep it, so a reset always returns to the
    /// buffer as it was assigned.
    pub fn snapshot(&mut self) {
        if self.snapshot.is_none() {
            self.snapshot = Some(self.data.clone());
        }
    }

    /// Restore the buffer saved by [`snapshot`](Self::snapshot).
    pub fn reset(&mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(saved) => {
                self.data = saved;
                Ok(())
            }
            None => Err(FretError::NoSnapshot(self.label.clone())),
        }
    }

    /// Fail unless `other` has the same width and height as `self`.
    pub fn ensure_same_shape(&self, other: &ChannelImage) -> Result<()> {
        ensure_shape(&other.data, self.height(), self.width(), &other.label)
    }
}

pub(crate) fn ensure_shape(data: &Array2<f32>, h: usize, w: usize, what: &str) -> Result<()> {
    let (dh, dw) = data.dim();
    if dh != h || dw != w {
        return Err(FretError::ShapeMismatch {
            what: what.to_string(),
            expected_width: w,
            expected_height: h,
            width: dw,
            height: dh,
        });
    }
    Ok(())
}

/// Region of interest: a per-pixel membership mask with the same shape as
/// the channel it selects from.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    mask: Array2<bool>,
}

impl Roi {
    pub fn from_mask(mask: Array2<bool>) -> Self {
        Self { mask }
    }

    /// Rectangular ROI inside an image of `image_width` x `image_height`.
    pub fn rectangle(rect: &RoiRect, image_width: usize, image_height: usize) -> Result<Self> {
        if rect.width == 0 || rect.height == 0 {
            return Err(FretError::InvalidRoi(
                "ROI width and height must be > 0".into(),
            ));
        }
        let out_of_bounds = || {
            FretError::InvalidRoi(format!(
                "ROI ({},{} {}x{}) exceeds image dimensions ({image_width}x{image_height})",
                rect.x, rect.y, rect.width, rect.height
            ))
        };
        let right = rect.x.checked_add(rect.width).ok_or_else(out_of_bounds)?;
        let bottom = rect.y.checked_add(rect.height).ok_or_else(out_of_bounds)?;
        if right > image_width || bottom > image_height {
            return Err(out_of_bounds());
        }
        let mask = Array2::from_shape_fn((image_height, image_width), |(row, col)| {
            row >= rect.y && row < bottom && col >= rect.x && col < right
        });
        Ok(Self { mask })
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(false)
    }

    pub fn pixel_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Fail unless the mask covers exactly the channel's dimensions.
    pub fn ensure_fits(&self, channel: &ChannelImage) -> Result<()> {
        let (h, w) = self.mask.dim();
        if h != channel.height() || w != channel.width() {
            return Err(FretError::ShapeMismatch {
                what: format!("ROI for {}", channel.label),
                expected_width: channel.width(),
                expected_height: channel.height(),
                width: w,
                height: h,
            });
        }
        Ok(())
    }
}

/// A rectangle in image coordinates, as written in session configs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// One channel across all slices of a (possibly single-slice) stack.
#[derive(Clone, Debug)]
pub struct ChannelStack {
    pub slices: Vec<ChannelImage>,
}

impl ChannelStack {
    /// Build a stack, checking that every slice has the first slice's shape.
    pub fn new(slices: Vec<ChannelImage>) -> Result<Self> {
        let first = slices.first().ok_or(FretError::EmptyStack)?;
        let (h, w) = first.data.dim();
        for slice in &slices[1..] {
            ensure_shape(&slice.data, h, w, &slice.label)?;
        }
        Ok(Self { slices })
    }

    pub fn single(image: ChannelImage) -> Self {
        Self {
            slices: vec![image],
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn width(&self) -> usize {
        self.slices.first().map_or(0, |s| s.width())
    }

    pub fn height(&self) -> usize {
        self.slices.first().map_or(0, |s| s.height())
    }

    /// Label of the stack, taken from its first slice.
    pub fn label(&self) -> &str {
        self.slices.first().map_or("", |s| s.label.as_str())
    }

    /// The only slice of a single-slice stack.
    ///
    /// Calibration works on single images; a stack is rejected with a
    /// count-based message.
    pub fn into_single(mut self) -> Result<ChannelImage> {
        if self.slices.len() != 1 {
            return Err(FretError::UnsupportedImage(format!(
                "{} has {} slices, expected a single image",
                self.label(),
                self.slices.len()
            )));
        }
        self.slices.pop().ok_or(FretError::EmptyStack)
    }
}

/// Reject stacks whose slice counts or slice dimensions differ.
pub fn ensure_matching_stacks(stacks: &[&ChannelStack]) -> Result<()> {
    let Some(first) = stacks.first() else {
        return Ok(());
    };
    for other in &stacks[1..] {
        if other.len() != first.len() {
            return Err(FretError::SliceCountMismatch {
                first: first.label().to_string(),
                first_count: first.len(),
                second: other.label().to_string(),
                second_count: other.len(),
            });
        }
        if let Some(slice) = other.slices.first() {
            ensure_shape(&slice.data, first.height(), first.width(), other.label())?;
        }
    }
    Ok(())
}
