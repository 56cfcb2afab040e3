use ndarray::{Array2, Zip};

use crate::channel::ensure_shape;
use crate::error::Result;

/// Elementwise `a / b`.
///
/// No guard is applied: NaN operands and zero denominators produce NaN or
/// ±Inf exactly as IEEE division does.
pub fn ratio(a: &Array2<f32>, b: &Array2<f32>) -> Result<Array2<f32>> {
    let (h, w) = a.dim();
    ensure_shape(b, h, w, "denominator image")?;
    Ok(Zip::from(a).and(b).map_collect(|&x, &y| x / y))
}

/// Split `image` by a mask whose background pixels are NaN.
///
/// Where the mask is not NaN the pixel goes to the first image and the
/// second gets NaN; everywhere else the reverse.
pub fn partition_by_mask(
    image: &Array2<f32>,
    mask: &Array2<f32>,
) -> Result<(Array2<f32>, Array2<f32>)> {
    let (h, w) = image.dim();
    ensure_shape(mask, h, w, "mask image")?;

    let mut in_mask = Array2::<f32>::from_elem((h, w), f32::NAN);
    let mut out_of_mask = Array2::<f32>::from_elem((h, w), f32::NAN);
    Zip::from(&mut in_mask)
        .and(&mut out_of_mask)
        .and(image)
        .and(mask)
        .for_each(|inside, outside, &v, &m| {
            if m.is_nan() {
                *outside = v;
            } else {
                *inside = v;
            }
        });
    Ok((in_mask, out_of_mask))
}
