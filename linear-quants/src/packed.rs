use crate::{
    kernels,
    linear::{block_cost, zip_blocks},
    PackedInt4, Parallelism, Partition, QuantInt, QuantizeError, QUANTIZE_BLOCK_SIZE,
};
use log::trace;

/// Quantizes `input` into logical 4-bit elements `out_start..out_end` of `output`.
///
/// A range starting or ending in the middle of a byte has that lone element quantized
/// on the calling thread first. The rest is byte-aligned and split into even-sized
/// blocks, so no two blocks ever share an output byte.
/// Nibbles outside the range are left untouched.
pub fn quantize_linear_4bit<P: PackedInt4>(
    input: &[f32],
    output: &mut [P],
    out_start: usize,
    out_end: usize,
    scale: f32,
    zero_point: P::Unpacked,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    assert!(out_start <= out_end);
    if input.len() != out_end - out_start || out_end.div_ceil(2) > output.len() {
        return Err(QuantizeError::LengthMismatch);
    }

    let zp = zero_point.to_i32();
    let single = |x| {
        kernels::quantize_value(x, scale, zp).clamp(P::MIN as f32, P::MAX as f32) as i32
    };

    let mut input = input;
    let (mut out_start, mut out_end) = (out_start, out_end);
    if out_start == out_end {
        return Ok(());
    }
    if out_start & 1 == 1 {
        output[out_start >> 1].set(1, single(input[0]));
        out_start += 1;
        input = &input[1..];
    }
    if out_end & 1 == 1 {
        output[out_end >> 1].set(0, single(input[input.len() - 1]));
        out_end -= 1;
        input = &input[..input.len() - 1];
    }
    if out_start == out_end {
        return Ok(());
    }

    let n = out_end - out_start;
    assert!(n % 2 == 0, "packed range is not byte aligned");
    const B: usize = QUANTIZE_BLOCK_SIZE;
    const { assert!(B % 2 == 0) }

    trace!("quantize {n} 4-bit elements from byte {}", out_start >> 1);
    let output = &mut output[out_start >> 1..out_end >> 1];
    let cost = block_cost::<f32>((B * size_of::<P::Unpacked>()) as f64 / 2.);
    let partition = Partition::fixed(n, B);
    zip_blocks(partition, input, 1, output, 2, cost, par, |src, dst| {
        kernels::quantize_linear_4bit(src, dst, scale, zero_point)
    });
    Ok(())
}

/// Unpacks logical 4-bit elements `0..output.len()` of `input` and dequantizes them.
pub fn dequantize_linear_4bit<P: PackedInt4>(
    input: &[P],
    output: &mut [f32],
    scale: f32,
    zero_point: P::Unpacked,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    let n = output.len();
    if n.div_ceil(2) != input.len() {
        return Err(QuantizeError::LengthMismatch);
    }

    const B: usize = QUANTIZE_BLOCK_SIZE;
    let (input, tail) = input.split_at(n / 2);
    let (output, rest) = output.split_at_mut(n / 2 * 2);
    if let ([x], [y]) = (tail, rest) {
        *y = (x.get(0) - zero_point.to_i32()) as f32 * scale;
    }

    let cost = block_cost::<u8>((B * size_of::<f32>()) as f64 * 2.);
    let partition = Partition::fixed(output.len(), B);
    zip_blocks(partition, input, 2, output, 1, cost, par, |src, dst| {
        kernels::dequantize_linear_4bit(src, dst, scale, zero_point)
    });
    Ok(())
}
