use crate::{
    linear::{quantize_linear_sat, quantize_linear_sat_f16},
    quantize_linear, quantize_linear_4bit, quantize_linear_f16, Int4x2, Parallelism,
    QuantizeError, UInt4x2, F8E4M3FN, F8E4M3FNUZ, F8E5M2, F8E5M2FNUZ,
};
use half::f16;

/// Output buffer of a quantization, tagged with its element kind.
///
/// Packed kinds write logical elements `out_start..out_start + input.len()`.
#[derive(Debug)]
pub enum QuantizeOutput<'a> {
    I8(&'a mut [i8]),
    U8(&'a mut [u8]),
    I16(&'a mut [i16]),
    U16(&'a mut [u16]),
    Int4 { data: &'a mut [Int4x2], out_start: usize },
    UInt4 { data: &'a mut [UInt4x2], out_start: usize },
    F8E4M3FN(&'a mut [F8E4M3FN]),
    F8E4M3FNUZ(&'a mut [F8E4M3FNUZ]),
    F8E5M2(&'a mut [F8E5M2]),
    F8E5M2FNUZ(&'a mut [F8E5M2FNUZ]),
}

/// Zero point matching one [`QuantizeOutput`] kind.
///
/// 4-bit zero points are unpacked values. 8-bit float zero points are accepted and ignored.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ZeroPoint {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    Int4(i8),
    UInt4(u8),
    F8E4M3FN(F8E4M3FN),
    F8E4M3FNUZ(F8E4M3FNUZ),
    F8E5M2(F8E5M2),
    F8E5M2FNUZ(F8E5M2FNUZ),
}

/// Quantizes `input` into whatever `output` holds.
///
/// `saturate` only affects 8-bit float outputs.
#[rustfmt::skip]
pub fn quantize(
    input: &[f32],
    output: QuantizeOutput,
    scale: f32,
    zero_point: ZeroPoint,
    saturate: bool,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    use self::{QuantizeOutput as O, ZeroPoint as Z};
    match (output, zero_point) {
        (O::I8 (out), Z::I8 (zp)) => quantize_linear(input, out, scale, zp, par),
        (O::U8 (out), Z::U8 (zp)) => quantize_linear(input, out, scale, zp, par),
        (O::I16(out), Z::I16(zp)) => quantize_linear(input, out, scale, zp, par),
        (O::U16(out), Z::U16(zp)) => quantize_linear(input, out, scale, zp, par),

        (O::Int4  { data, out_start }, Z::Int4 (zp)) => quantize_linear_4bit(input, data, out_start, out_start + input.len(), scale, zp, par),
        (O::UInt4 { data, out_start }, Z::UInt4(zp)) => quantize_linear_4bit(input, data, out_start, out_start + input.len(), scale, zp, par),

        (O::F8E4M3FN  (out), Z::F8E4M3FN  (_)) => quantize_linear_sat(input, out, scale, saturate, par),
        (O::F8E4M3FNUZ(out), Z::F8E4M3FNUZ(_)) => quantize_linear_sat(input, out, scale, saturate, par),
        (O::F8E5M2    (out), Z::F8E5M2    (_)) => quantize_linear_sat(input, out, scale, saturate, par),
        (O::F8E5M2FNUZ(out), Z::F8E5M2FNUZ(_)) => quantize_linear_sat(input, out, scale, saturate, par),

        (_, _) => Err(QuantizeError::TypeMismatch),
    }
}

/// Half precision flavor of [`quantize`].
///
/// Packed outputs have no half precision kernel, the input is widened to `f32` first.
#[rustfmt::skip]
pub fn quantize_f16(
    input: &[f16],
    output: QuantizeOutput,
    scale: f16,
    zero_point: ZeroPoint,
    saturate: bool,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    use self::{QuantizeOutput as O, ZeroPoint as Z};
    match (output, zero_point) {
        (O::I8 (out), Z::I8 (zp)) => quantize_linear_f16(input, out, scale, zp, par),
        (O::U8 (out), Z::U8 (zp)) => quantize_linear_f16(input, out, scale, zp, par),
        (O::I16(out), Z::I16(zp)) => quantize_linear_f16(input, out, scale, zp, par),
        (O::U16(out), Z::U16(zp)) => quantize_linear_f16(input, out, scale, zp, par),

        (output @ (O::Int4 { .. } | O::UInt4 { .. }), zero_point) => {
            let input = input.iter().map(|x| x.to_f32()).collect::<Vec<_>>();
            quantize(&input, output, scale.to_f32(), zero_point, saturate, par)
        }

        (O::F8E4M3FN  (out), Z::F8E4M3FN  (_)) => quantize_linear_sat_f16(input, out, scale, saturate, par),
        (O::F8E4M3FNUZ(out), Z::F8E4M3FNUZ(_)) => quantize_linear_sat_f16(input, out, scale, saturate, par),
        (O::F8E5M2    (out), Z::F8E5M2    (_)) => quantize_linear_sat_f16(input, out, scale, saturate, par),
        (O::F8E5M2FNUZ(out), Z::F8E5M2FNUZ(_)) => quantize_linear_sat_f16(input, out, scale, saturate, par),

        (_, _) => Err(QuantizeError::TypeMismatch),
    }
}
