use fretsense_core::ratio::{partition_by_mask, ratio};

mod common;
use common::array_from_rows;

#[test]
fn test_ratio_elementwise() {
    let a = array_from_rows(&[&[2.0, 9.0], &[1.0, -4.0]]);
    let b = array_from_rows(&[&[1.0, 3.0], &[4.0, 2.0]]);
    let c = ratio(&a, &b).unwrap();
    assert_eq!(c, array_from_rows(&[&[2.0, 3.0], &[0.25, -2.0]]));
}

#[test]
fn test_ratio_nan_propagation() {
    let a = array_from_rows(&[&[f32::NAN, 1.0, f32::NAN]]);
    let b = array_from_rows(&[&[1.0, f32::NAN, f32::NAN]]);
    let c = ratio(&a, &b).unwrap();
    assert!(c.iter().all(|v| v.is_nan()));
}

#[test]
fn test_ratio_zero_denominator_follows_ieee() {
    let a = array_from_rows(&[&[1.0, -1.0, 0.0]]);
    let b = array_from_rows(&[&[0.0, 0.0, 0.0]]);
    let c = ratio(&a, &b).unwrap();
    assert_eq!(c[[0, 0]], f32::INFINITY);
    assert_eq!(c[[0, 1]], f32::NEG_INFINITY);
    assert!(c[[0, 2]].is_nan());
}

#[test]
fn test_ratio_shape_mismatch() {
    let a = array_from_rows(&[&[1.0, 2.0]]);
    let b = array_from_rows(&[&[1.0], &[2.0]]);
    assert!(ratio(&a, &b).is_err());
}

#[test]
fn test_partition_is_complete_and_exclusive() {
    let image = array_from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
    let mask = array_from_rows(&[&[0.0, f32::NAN, 7.0], &[f32::NAN, f32::NAN, -1.0]]);
    let (inside, outside) = partition_by_mask(&image, &mask).unwrap();

    for ((idx, &m), &v) in mask.indexed_iter().zip(image.iter()) {
        let (i, o) = (inside[idx], outside[idx]);
        assert!(i.is_nan() != o.is_nan(), "exactly one side must hold {idx:?}");
        if m.is_nan() {
            assert_eq!(o, v);
        } else {
            assert_eq!(i, v);
        }
    }
}

#[test]
fn test_partition_shape_mismatch() {
    let image = array_from_rows(&[&[1.0, 2.0]]);
    let mask = array_from_rows(&[&[1.0, 2.0, 3.0]]);
    assert!(partition_by_mask(&image, &mask).is_err());
}
