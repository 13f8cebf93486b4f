//! Single-threaded kernels the parallel drivers call once per block.

use crate::{FloatMinMax, PackedInt4, QuantInt};
use std::iter::zip;

/// Folds `data` into `agg`.
#[inline]
pub fn find_min_max(data: &[f32], agg: &mut FloatMinMax) {
    *agg = data
        .iter()
        .fold(*agg, |FloatMinMax { min, max }, &x| FloatMinMax {
            min: min.min(x),
            max: max.max(x),
        });
}

/// `round_half_to_even(x / scale) + zero_point`, not yet clamped.
#[inline]
pub fn quantize_value(x: f32, scale: f32, zero_point: i32) -> f32 {
    (x / scale).round_ties_even() + zero_point as f32
}

/// `dst[i] = clamp(round_half_to_even(src[i] / scale) + zero_point)`.
pub fn quantize_linear<Q: QuantInt>(src: &[f32], dst: &mut [Q], scale: f32, zero_point: Q) {
    assert_eq!(src.len(), dst.len());
    let zp = zero_point.to_i32();
    for (y, &x) in zip(dst, src) {
        *y = Q::saturate(quantize_value(x, scale, zp))
    }
}

/// Quantizes `src` two elements at a time into `dst`, element `2i` into the low nibble of `dst[i]`.
pub fn quantize_linear_4bit<P: PackedInt4>(
    src: &[f32],
    dst: &mut [P],
    scale: f32,
    zero_point: P::Unpacked,
) {
    assert_eq!(src.len(), dst.len() * 2);
    let zp = zero_point.to_i32();
    let f = |x| {
        quantize_value(x, scale, zp).clamp(P::MIN as f32, P::MAX as f32) as i32
    };
    for (y, x) in zip(dst, src.chunks_exact(2)) {
        *y = P::pack(f(x[0]), f(x[1]))
    }
}

/// `dst[i] = (src[i] - zero_point) * scale`.
pub fn dequantize_linear<Q: QuantInt>(src: &[Q], dst: &mut [f32], scale: f32, zero_point: Q) {
    assert_eq!(src.len(), dst.len());
    let zp = zero_point.to_i32();
    for (y, &x) in zip(dst, src) {
        *y = (x.to_i32() - zp) as f32 * scale
    }
}

/// Unpacks every element of `src` into `dst`, two per byte.
pub fn dequantize_linear_4bit<P: PackedInt4>(
    src: &[P],
    dst: &mut [f32],
    scale: f32,
    zero_point: P::Unpacked,
) {
    assert_eq!(src.len() * 2, dst.len());
    let zp = zero_point.to_i32();
    for (&x, y) in zip(src, dst.chunks_exact_mut(2)) {
        y[0] = (x.get(0) - zp) as f32 * scale;
        y[1] = (x.get(1) - zp) as f32 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Int4x2, UInt4x2};

    #[test]
    fn test_find_min_max() {
        let mut agg = FloatMinMax::INIT;
        find_min_max(&[3., -1., 7., 2.], &mut agg);
        assert_eq!(agg, FloatMinMax { min: -1., max: 7. });
        find_min_max(&[], &mut agg);
        assert_eq!(agg, FloatMinMax { min: -1., max: 7. });
        find_min_max(&[-9.], &mut agg);
        assert_eq!(agg, FloatMinMax { min: -9., max: 7. });
    }

    #[test]
    fn test_quantize_ties_to_even() {
        let mut dst = [0u8; 5];
        quantize_linear(&[0.5, 1.5, 2.5, -0.5, 300.], &mut dst, 1., 10u8);
        assert_eq!(dst, [10, 12, 12, 10, 255]);

        let mut dst = [0i8; 3];
        quantize_linear(&[-2.5, -3.5, -1000.], &mut dst, 1., 0i8);
        assert_eq!(dst, [-2, -4, -128]);
    }

    #[test]
    fn test_quantize_4bit() {
        let mut dst = [Int4x2::ZEROS; 2];
        quantize_linear_4bit(&[-1., 2., 100., -100.], &mut dst, 1., 0i8);
        assert_eq!((dst[0].get(0), dst[0].get(1)), (-1, 2));
        assert_eq!((dst[1].get(0), dst[1].get(1)), (7, -8));

        let mut dst = [UInt4x2::ZEROS; 1];
        quantize_linear_4bit(&[0.2, 0.6], &mut dst, 0.1, 8u8);
        assert_eq!((dst[0].get(0), dst[0].get(1)), (10, 14));
    }

    #[test]
    fn test_dequantize() {
        let mut dst = [0.; 3];
        dequantize_linear(&[0u8, 128, 255], &mut dst, 0.5, 128);
        assert_eq!(dst, [-64., 0., 63.5]);

        let mut dst = [0.; 2];
        dequantize_linear_4bit(&[Int4x2::pack(-8, 7)], &mut dst, 2., 1);
        assert_eq!(dst, [-18., 12.]);
    }
}
