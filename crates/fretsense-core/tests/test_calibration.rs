use approx::assert_abs_diff_eq;

use fretsense_core::calibration::{
    parse_constant, CalibrationConstants, CalibrationScheme, CalibrationSession, ChannelRole,
    Factor, PixelValidity,
};
use fretsense_core::channel::{Roi, RoiRect};
use fretsense_core::correction::{subtract_background, FloorPolicy};
use fretsense_core::error::FretError;

mod common;
use common::{channel_from_rows, uniform_channel};

fn donor_only_session() -> CalibrationSession {
    let mut session = CalibrationSession::new(CalibrationScheme::S1S3);
    session.set_channel(
        ChannelRole::Donor,
        channel_from_rows(&[&[1.0, 2.0], &[4.0, 0.0]], "donor"),
    );
    session.set_channel(
        ChannelRole::Transfer,
        channel_from_rows(&[&[2.0, 4.0], &[8.0, 0.0]], "transfer"),
    );
    session.set_channel(
        ChannelRole::Acceptor,
        channel_from_rows(&[&[0.5, 1.0], &[2.0, 0.0]], "acceptor"),
    );
    session
}

// ---------------------------------------------------------------------------
// Single-ratio schemes
// ---------------------------------------------------------------------------

#[test]
fn test_s1_s3_average() {
    let result = donor_only_session().compute(false).unwrap();
    assert_eq!(result.estimates.len(), 2);

    let s1 = &result.estimates[0];
    assert_eq!(s1.factor, Factor::S1);
    assert_abs_diff_eq!(s1.value, 2.0, epsilon = 1e-6);
    assert_eq!(s1.valid_count, 3);

    let s3 = &result.estimates[1];
    assert_eq!(s3.factor, Factor::S3);
    assert_abs_diff_eq!(s3.value, 0.5, epsilon = 1e-6);
    assert_eq!(s3.valid_count, 3);
}

#[test]
fn test_diagnostic_image_marks_invalid_pixels() {
    let result = donor_only_session().compute(true).unwrap();
    let image = result.estimates[0].image.as_ref().expect("diagnostic image");
    assert_eq!(image[[0, 0]], 2.0);
    assert_eq!(image[[1, 0]], 2.0);
    assert!(image[[1, 1]].is_nan());
}

#[test]
fn test_s2_s4_uses_acceptor_denominator() {
    let mut session = CalibrationSession::new(CalibrationScheme::S2S4);
    session.set_channel(
        ChannelRole::Donor,
        channel_from_rows(&[&[1.0, 3.0, 7.0]], "donor"),
    );
    session.set_channel(
        ChannelRole::Transfer,
        channel_from_rows(&[&[2.0, 6.0, 7.0]], "transfer"),
    );
    session.set_channel(
        ChannelRole::Acceptor,
        channel_from_rows(&[&[2.0, 6.0, -1.0]], "acceptor"),
    );
    let result = session.compute(false).unwrap();
    assert_abs_diff_eq!(result.value(Factor::S2).unwrap(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.value(Factor::S4).unwrap(), 0.5, epsilon = 1e-6);
    assert_eq!(result.estimates[0].valid_count, 2);
}

#[test]
fn test_zero_valid_pixels_yields_nan() {
    let mut session = CalibrationSession::new(CalibrationScheme::S1S3);
    session.set_channel(ChannelRole::Donor, uniform_channel(2, 2, 0.0, "donor"));
    session.set_channel(ChannelRole::Transfer, uniform_channel(2, 2, 1.0, "transfer"));
    session.set_channel(ChannelRole::Acceptor, uniform_channel(2, 2, 1.0, "acceptor"));
    let result = session.compute(false).unwrap();
    for estimate in &result.estimates {
        assert_eq!(estimate.valid_count, 0);
        assert!(estimate.value.is_nan());
    }
}

#[test]
fn test_missing_image_is_named() {
    let mut session = CalibrationSession::new(CalibrationScheme::S1S3);
    session.set_channel(ChannelRole::Donor, uniform_channel(2, 2, 1.0, "donor"));
    session.set_channel(ChannelRole::Transfer, uniform_channel(2, 2, 1.0, "transfer"));
    match session.compute(false) {
        Err(FretError::MissingImage(role)) => assert_eq!(role, "acceptor"),
        other => panic!("expected missing acceptor, got {other:?}"),
    }
}

#[test]
fn test_shape_mismatch_rejected() {
    let mut session = donor_only_session();
    session.set_channel(ChannelRole::Acceptor, uniform_channel(3, 3, 1.0, "acceptor"));
    assert!(matches!(
        session.compute(false),
        Err(FretError::ShapeMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Four-channel schemes
// ---------------------------------------------------------------------------

#[test]
fn test_four_channel_scheme_requires_autofluorescence() {
    let mut session = CalibrationSession::new(CalibrationScheme::S1S3S5);
    session.set_channel(ChannelRole::Donor, uniform_channel(2, 2, 1.0, "donor"));
    session.set_channel(ChannelRole::Transfer, uniform_channel(2, 2, 1.0, "transfer"));
    session.set_channel(ChannelRole::Acceptor, uniform_channel(2, 2, 1.0, "acceptor"));
    assert!(matches!(
        session.compute(false),
        Err(FretError::MissingImage(_))
    ));
}

#[test]
fn test_s1_s3_s5_skips_nan_only() {
    let mut session = CalibrationSession::new(CalibrationScheme::S1S3S5);
    session.set_channel(
        ChannelRole::Donor,
        channel_from_rows(&[&[2.0, -2.0, 2.0]], "donor"),
    );
    session.set_channel(
        ChannelRole::Transfer,
        channel_from_rows(&[&[4.0, -2.0, f32::NAN]], "transfer"),
    );
    session.set_channel(
        ChannelRole::Acceptor,
        channel_from_rows(&[&[1.0, 1.0, 1.0]], "acceptor"),
    );
    session.set_channel(
        ChannelRole::Autofluorescence,
        channel_from_rows(&[&[1.0, 3.0, 1.0]], "af"),
    );
    let result = session.compute(false).unwrap();
    // Negative donor pixel is valid here; the NaN transfer pixel is not.
    assert_eq!(result.estimates[0].valid_count, 2);
    assert_abs_diff_eq!(result.value(Factor::S1).unwrap(), 1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(result.value(Factor::S3).unwrap(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.value(Factor::S5).unwrap(), -0.5, epsilon = 1e-6);
}

#[test]
fn test_b_factors_normalised_by_donor() {
    let mut session = CalibrationSession::new(CalibrationScheme::B1B2B3);
    session.set_channel(ChannelRole::Donor, uniform_channel(2, 2, 4.0, "donor"));
    session.set_channel(ChannelRole::Transfer, uniform_channel(2, 2, 1.0, "transfer"));
    session.set_channel(ChannelRole::Acceptor, uniform_channel(2, 2, 2.0, "acceptor"));
    session.set_channel(ChannelRole::Autofluorescence, uniform_channel(2, 2, 3.0, "af"));
    let result = session.compute(false).unwrap();
    assert_abs_diff_eq!(result.value(Factor::B1).unwrap(), 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(result.value(Factor::B2).unwrap(), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(result.value(Factor::B3).unwrap(), 0.75, epsilon = 1e-6);
}

#[test]
fn test_scheme_table() {
    assert_eq!(
        CalibrationScheme::S1S3.validity(),
        PixelValidity::DenominatorPositive
    );
    assert_eq!(CalibrationScheme::S2S4S6.validity(), PixelValidity::NoNaN);
    assert_eq!(CalibrationScheme::B1B2B3.required_channels().len(), 4);
    for scheme in CalibrationScheme::ALL {
        assert!(!scheme.ratios().is_empty());
        for ratio in scheme.ratios() {
            assert!(scheme.required_channels().contains(&ratio.numerator));
            assert!(scheme.required_channels().contains(&ratio.denominator));
        }
    }
    assert_eq!(
        CalibrationScheme::S2S4.to_string(),
        "S2/S4 (acceptor-only)"
    );
}

// ---------------------------------------------------------------------------
// Session corrections and constants
// ---------------------------------------------------------------------------

#[test]
fn test_session_background_is_unclamped() {
    let mut session = donor_only_session();
    let rect = RoiRect {
        x: 0,
        y: 0,
        width: 2,
        height: 1,
    };
    let mut roi = Some(Roi::rectangle(&rect, 2, 2).unwrap());
    let level = session
        .subtract_background(ChannelRole::Donor, &mut roi, 0.0)
        .unwrap();
    assert_abs_diff_eq!(level, 1.5, epsilon = 1e-6);
    let donor = session.channel(ChannelRole::Donor).unwrap();
    assert_abs_diff_eq!(donor.data[[0, 0]], -0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(donor.data[[1, 1]], -1.5, epsilon = 1e-6);

    session.reset(ChannelRole::Donor).unwrap();
    let donor = session.channel(ChannelRole::Donor).unwrap();
    assert_eq!(donor.data[[0, 0]], 1.0);
}

#[test]
fn test_result_applied_to_constants() {
    let result = donor_only_session().compute(false).unwrap();
    let mut constants = CalibrationConstants::default();
    result.apply_to(&mut constants);
    assert_eq!(constants.s1, Some(2.0));
    assert_eq!(constants.s3, Some(0.5));
    assert!(constants.s2.is_none());
}

#[test]
fn test_require_factor_names_missing_constant() {
    let constants = CalibrationConstants::default();
    match constants.require_factor(Factor::S4) {
        Err(FretError::MissingConstant(name)) => assert_eq!(name, "S4"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_non_positive_constant_is_only_a_warning() {
    let constants = CalibrationConstants {
        s1: Some(-0.2),
        ..Default::default()
    };
    assert_eq!(constants.require_factor(Factor::S1).unwrap(), -0.2);
}

#[test]
fn test_parse_constant() {
    assert_eq!(parse_constant("S1", "0.25").unwrap(), Some(0.25));
    assert_eq!(parse_constant("S1", "  ").unwrap(), None);
    match parse_constant("S2", "x1") {
        Err(FretError::Parse { field, value }) => {
            assert_eq!(field, "S2");
            assert_eq!(value, "x1");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_merge_keeps_unset_values() {
    let mut base = CalibrationConstants {
        s1: Some(1.0),
        alpha: Some(2.0),
        ..Default::default()
    };
    let update = CalibrationConstants {
        s1: Some(3.0),
        s2: Some(4.0),
        ..Default::default()
    };
    base.merge(&update);
    assert_eq!(base.s1, Some(3.0));
    assert_eq!(base.s2, Some(4.0));
    assert_eq!(base.alpha, Some(2.0));
}

#[test]
fn test_set_channel_discards_prior_snapshot() {
    let mut image = uniform_channel(2, 2, 5.0, "donor");
    subtract_background(&mut image, &mut None, 1.0, FloorPolicy::Unclamped).unwrap();
    assert!(image.has_snapshot());

    let mut session = CalibrationSession::new(CalibrationScheme::S1S3);
    session.set_channel(ChannelRole::Donor, image);
    assert!(matches!(
        session.reset(ChannelRole::Donor),
        Err(FretError::NoSnapshot(_))
    ));
    let donor = session.channel(ChannelRole::Donor).unwrap();
    assert!(donor.data.iter().all(|&v| v == 4.0));
}
