use crate::{find_min_max, FloatMinMax, PackedInt4, Parallelism, QuantInt};

/// Rounds to the nearest integer, ties to the even one. Non-finite input passes through.
#[inline]
pub fn round_half_to_even(x: f32) -> f32 {
    if !x.is_finite() {
        return x;
    }
    x.round_ties_even()
}

/// Knobs of the parameter estimation. Both are off by default.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct QuantPolicy {
    /// Use the narrowed range of the output type (`[-64, 64]` for `i8`).
    pub reduce_range: bool,
    /// Pin the zero point to 0. Only honored by signed output types.
    pub symmetric: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct QuantParams<Q> {
    pub scale: f32,
    pub zero_point: Q,
}

/// Scale and zero point mapping `range` onto `[qmin, qmax]`.
fn compute(
    FloatMinMax { min, max }: FloatMinMax,
    qmin: i32,
    qmax: i32,
    symmetric: bool,
) -> (f32, i32) {
    if symmetric {
        let max = max.max(-min);
        let scale = if max > 0. { max / qmax as f32 } else { 1. };
        return (scale, 0);
    }

    let scale = if max == min {
        1.
    } else {
        (max - min) / (qmax - qmin) as f32
    };
    let zero_point = (qmin as f32 - min / scale).clamp(qmin as f32, qmax as f32);
    (scale, round_half_to_even(zero_point) as i32)
}

/// Parameters for quantizing values in `range` into `Q`.
pub fn compute_quantization_parameter<Q: QuantInt>(
    range: FloatMinMax,
    policy: QuantPolicy,
) -> QuantParams<Q> {
    let (qmin, qmax) = if policy.reduce_range {
        Q::REDUCED
    } else {
        (Q::MIN, Q::MAX)
    };
    let (scale, zero_point) = compute(range, qmin, qmax, policy.symmetric && Q::SIGNED);
    QuantParams {
        scale,
        zero_point: Q::from_i32(zero_point),
    }
}

/// Parameters for quantizing values in `range` into packed 4-bit elements.
///
/// 4-bit types have no reduced range, so `policy.reduce_range` is ignored.
pub fn compute_quantization_parameter_4bit<P: PackedInt4>(
    range: FloatMinMax,
    policy: QuantPolicy,
) -> QuantParams<P::Unpacked> {
    let symmetric = policy.symmetric && P::MIN < 0;
    let (scale, zero_point) = compute(range, P::MIN, P::MAX, symmetric);
    QuantParams {
        scale,
        zero_point: <P::Unpacked as QuantInt>::from_i32(zero_point),
    }
}

/// Scans `data` for its range and derives parameters for `Q` from it.
pub fn get_quantization_parameter<Q: QuantInt>(
    data: &[f32],
    policy: QuantPolicy,
    par: Parallelism,
) -> QuantParams<Q> {
    compute_quantization_parameter(find_min_max(data, par), policy)
}

/// Scans `data` for its range and derives parameters for the packed type `P` from it.
pub fn get_quantization_parameter_4bit<P: PackedInt4>(
    data: &[f32],
    policy: QuantPolicy,
    par: Parallelism,
) -> QuantParams<P::Unpacked> {
    compute_quantization_parameter_4bit::<P>(find_min_max(data, par), policy)
}
