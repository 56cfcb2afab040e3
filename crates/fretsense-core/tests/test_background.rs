use approx::assert_abs_diff_eq;

use fretsense_core::channel::{ChannelStack, Roi, RoiRect};
use fretsense_core::correction::{subtract_background, subtract_background_stack, FloorPolicy};
use fretsense_core::error::FretError;
use fretsense_core::stats::mean_intensity;

mod common;
use common::{channel_from_rows, ramp_channel};

fn corner_roi(w: usize, h: usize) -> Roi {
    let rect = RoiRect {
        x: 0,
        y: 0,
        width: 2,
        height: 2,
    };
    Roi::rectangle(&rect, w, h).unwrap()
}

#[test]
fn test_no_roi_no_constant_is_error_without_mutation() {
    let mut channel = ramp_channel(3, 3, 1.0, "donor");
    let before = channel.data.clone();
    let mut roi = None;
    let err = subtract_background(&mut channel, &mut roi, 0.0, FloorPolicy::Unclamped);
    assert!(matches!(err, Err(FretError::MissingRoiOrConstant(_))));
    assert_eq!(channel.data, before);
    assert!(!channel.has_snapshot());
}

#[test]
fn test_constant_only() {
    let mut channel = ramp_channel(2, 2, 10.0, "donor");
    let mut roi = None;
    let level = subtract_background(&mut channel, &mut roi, 4.0, FloorPolicy::Unclamped).unwrap();
    assert_eq!(level, 4.0);
    assert_eq!(channel.data[[0, 0]], 6.0);
    assert_eq!(channel.data[[1, 1]], 9.0);
}

#[test]
fn test_roi_mean_plus_constant_and_roi_consumed() {
    // ROI covers [[0,1],[4,5]] of a 4x4 ramp: mean 2.5
    let mut channel = ramp_channel(4, 4, 0.0, "donor");
    let mut roi = Some(corner_roi(4, 4));
    let level = subtract_background(&mut channel, &mut roi, 0.5, FloorPolicy::Unclamped).unwrap();
    assert_abs_diff_eq!(level, 3.0, epsilon = 1e-6);
    assert!(roi.is_none(), "ROI must be cleared after use");
    assert_abs_diff_eq!(channel.data[[3, 3]], 12.0, epsilon = 1e-6);
}

#[test]
fn test_roi_mean_after_subtraction_is_zero() {
    let mut channel = ramp_channel(6, 5, 3.7, "transfer");
    let roi = corner_roi(5, 6);
    let mut once = Some(roi.clone());
    subtract_background(&mut channel, &mut once, 0.0, FloorPolicy::Unclamped).unwrap();
    let residual = mean_intensity(&channel.data, Some(&roi));
    assert_abs_diff_eq!(residual, 0.0, epsilon = 1e-5);
}

#[test]
fn test_roi_mean_skips_nan() {
    let mut channel = channel_from_rows(
        &[&[2.0, f32::NAN, 9.0], &[4.0, 6.0, 9.0], &[9.0, 9.0, 9.0]],
        "donor",
    );
    let mut roi = Some(corner_roi(3, 3));
    let level = subtract_background(&mut channel, &mut roi, 0.0, FloorPolicy::Unclamped).unwrap();
    assert_abs_diff_eq!(level, 4.0, epsilon = 1e-6);
    assert!(channel.data[[0, 1]].is_nan());
}

#[test]
fn test_calibration_mode_keeps_negative_pixels() {
    // ROI mean is 5; pixel value 1 must become -4.
    let mut channel = channel_from_rows(&[&[5.0, 5.0, 1.0], &[5.0, 5.0, 8.0]], "donor");
    let mut roi = Some(corner_roi(3, 2));
    subtract_background(&mut channel, &mut roi, 0.0, FloorPolicy::Unclamped).unwrap();
    assert_abs_diff_eq!(channel.data[[0, 2]], -4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(channel.data[[1, 2]], 3.0, epsilon = 1e-6);
}

#[test]
fn test_stack_mode_clamps_at_zero() {
    let channel = channel_from_rows(&[&[5.0, 5.0, 1.0], &[5.0, 5.0, 8.0]], "donor");
    let mut stack = ChannelStack::single(channel);
    let mut roi = Some(corner_roi(3, 2));
    let levels = subtract_background_stack(&mut stack, &mut roi, 0.0).unwrap();
    assert_eq!(levels.len(), 1);
    assert!(roi.is_none());
    let data = &stack.slices[0].data;
    assert!(data.iter().all(|&v| v >= 0.0));
    assert_eq!(data[[0, 2]], 0.0);
    assert_abs_diff_eq!(data[[1, 2]], 3.0, epsilon = 1e-6);
}

#[test]
fn test_stack_mode_keeps_nan() {
    let channel = channel_from_rows(&[&[f32::NAN, 1.0], &[1.0, 1.0]], "donor");
    let mut stack = ChannelStack::single(channel);
    subtract_background_stack(&mut stack, &mut None, 2.0).unwrap();
    assert!(stack.slices[0].data[[0, 0]].is_nan());
    assert_eq!(stack.slices[0].data[[1, 1]], 0.0);
}

#[test]
fn test_stack_mode_uses_per_slice_roi_mean() {
    let stack_slices = vec![ramp_channel(3, 3, 0.0, "d"), ramp_channel(3, 3, 10.0, "d:2")];
    let mut stack = ChannelStack::new(stack_slices).unwrap();
    let mut roi = Some(corner_roi(3, 3));
    let levels = subtract_background_stack(&mut stack, &mut roi, 0.0).unwrap();
    // ROI [[0,1],[3,4]] mean 2.0 on the first slice, 12.0 on the second.
    assert_abs_diff_eq!(levels[0], 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(levels[1], 12.0, epsilon = 1e-6);
}

#[test]
fn test_reset_restores_exact_buffer() {
    let mut channel = ramp_channel(5, 7, 0.25, "acceptor");
    let original = channel.data.clone();
    let mut roi = Some(corner_roi(7, 5));
    subtract_background(&mut channel, &mut roi, 1.5, FloorPolicy::Unclamped).unwrap();
    assert_ne!(channel.data, original);
    channel.reset().unwrap();
    assert_eq!(channel.data, original);
}

#[test]
fn test_roi_shape_mismatch_rejected() {
    let mut channel = ramp_channel(4, 4, 0.0, "donor");
    let mut roi = Some(corner_roi(5, 5));
    let before = channel.data.clone();
    assert!(subtract_background(&mut channel, &mut roi, 0.0, FloorPolicy::Unclamped).is_err());
    assert_eq!(channel.data, before);
}
