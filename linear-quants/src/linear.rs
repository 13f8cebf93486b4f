use crate::{kernels, NarrowFloat, Parallelism, Partition, QuantInt, QuantizeError, TensorOpCost};
use half::f16;
use std::iter::zip;

/// Elements per block of every quantizer.
pub const QUANTIZE_BLOCK_SIZE: usize = 128;

/// Cost of one block reading `T` and writing `bytes_stored` bytes.
pub(crate) fn block_cost<T>(bytes_stored: f64) -> TensorOpCost {
    TensorOpCost {
        bytes_loaded: (QUANTIZE_BLOCK_SIZE * size_of::<T>()) as _,
        bytes_stored,
        compute_cycles: QUANTIZE_BLOCK_SIZE as f64 * 2.,
    }
}

/// Runs `f` over every block of `partition`, which counts logical elements.
///
/// Each item of `src` holds `src_per` elements and each item of `dst` holds `dst_per`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn zip_blocks<T, U, F>(
    partition: Partition,
    src: &[T],
    src_per: usize,
    dst: &mut [U],
    dst_per: usize,
    cost: TensorOpCost,
    par: Parallelism,
    f: F,
) where
    T: Sync,
    U: Send,
    F: Fn(&[T], &mut [U]) + Sync + Send,
{
    let Partition {
        block_size,
        num_blocks,
    } = partition;
    debug_assert!(block_size % src_per == 0 && block_size % dst_per == 0);
    let work = zip(
        src.chunks(block_size / src_per),
        dst.chunks_mut(block_size / dst_per),
    )
    .collect::<Vec<_>>();
    debug_assert_eq!(work.len(), num_blocks);
    par.for_each(work, cost, |_, (src, dst)| f(src, dst))
}

#[inline]
fn check_len(src: usize, dst: usize) -> Result<(), QuantizeError> {
    if src == dst {
        Ok(())
    } else {
        Err(QuantizeError::LengthMismatch)
    }
}

/// `output[i] = clamp(round_half_to_even(input[i] / scale) + zero_point)`.
pub fn quantize_linear<Q: QuantInt>(
    input: &[f32],
    output: &mut [Q],
    scale: f32,
    zero_point: Q,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    check_len(input.len(), output.len())?;
    const B: usize = QUANTIZE_BLOCK_SIZE;
    let cost = block_cost::<f32>((B * size_of::<Q>()) as _);
    zip_blocks(Partition::fixed(input.len(), B), input, 1, output, 1, cost, par, |src, dst| {
        kernels::quantize_linear(src, dst, scale, zero_point)
    });
    Ok(())
}

/// Half precision flavor of [`quantize_linear`].
///
/// Each element is widened to `f32` and rounded with [`f32::round`], so ties go away
/// from zero here instead of to even.
pub fn quantize_linear_f16<Q: QuantInt>(
    input: &[f16],
    output: &mut [Q],
    scale: f16,
    zero_point: Q,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    check_len(input.len(), output.len())?;
    const B: usize = QUANTIZE_BLOCK_SIZE;
    let scale = scale.to_f32();
    let zp = zero_point.to_i32() as f32;
    let cost = block_cost::<f16>((B * size_of::<Q>()) as _);
    zip_blocks(Partition::fixed(input.len(), B), input, 1, output, 1, cost, par, |src, dst| {
        for (y, x) in zip(dst, src) {
            *y = Q::saturate((x.to_f32() / scale).round() + zp)
        }
    });
    Ok(())
}

/// `output[i] = F::from_f32(input[i] / scale, saturate)`.
///
/// 8-bit floats carry no zero point.
pub fn quantize_linear_sat<F: NarrowFloat>(
    input: &[f32],
    output: &mut [F],
    scale: f32,
    saturate: bool,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    check_len(input.len(), output.len())?;
    const B: usize = QUANTIZE_BLOCK_SIZE;
    let cost = block_cost::<f32>((B * size_of::<F>()) as _);
    zip_blocks(Partition::fixed(input.len(), B), input, 1, output, 1, cost, par, |src, dst| {
        for (y, &x) in zip(dst, src) {
            *y = F::from_f32(x / scale, saturate)
        }
    });
    Ok(())
}

/// Half precision flavor of [`quantize_linear_sat`].
pub fn quantize_linear_sat_f16<F: NarrowFloat>(
    input: &[f16],
    output: &mut [F],
    scale: f16,
    saturate: bool,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    check_len(input.len(), output.len())?;
    const B: usize = QUANTIZE_BLOCK_SIZE;
    let scale = scale.to_f32();
    let cost = block_cost::<f16>((B * size_of::<F>()) as _);
    zip_blocks(Partition::fixed(input.len(), B), input, 1, output, 1, cost, par, |src, dst| {
        for (y, x) in zip(dst, src) {
            *y = F::from_f32(x.to_f32() / scale, saturate)
        }
    });
    Ok(())
}

/// `output[i] = (input[i] - zero_point) * scale`.
pub fn dequantize_linear<Q: QuantInt>(
    input: &[Q],
    output: &mut [f32],
    scale: f32,
    zero_point: Q,
    par: Parallelism,
) -> Result<(), QuantizeError> {
    check_len(input.len(), output.len())?;
    const B: usize = QUANTIZE_BLOCK_SIZE;
    let cost = block_cost::<Q>((B * size_of::<f32>()) as _);
    zip_blocks(Partition::fixed(input.len(), B), input, 1, output, 1, cost, par, |src, dst| {
        kernels::dequantize_linear(src, dst, scale, zero_point)
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        get_quantization_parameter,
        test_utils::{Diff, ErrorCollector},
        QuantPolicy, F8E4M3FN, F8E5M2,
    };
    use rand::Rng;

    fn random(n: usize, lo: f32, hi: f32) -> Vec<f32> {
        let mut rng = rand::thread_rng();
        (0..n).map(|_| rng.gen_range(lo..hi)).collect()
    }

    #[test]
    fn test_blocks_follow_partition() {
        use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

        for n in [0, 1, 127, 128, 129, 1000, 50_000] {
            let partition = Partition::fixed(n, QUANTIZE_BLOCK_SIZE);
            let src = vec![0f32; n];
            let mut dst = vec![0u8; n.div_ceil(2)];
            let blocks = AtomicUsize::new(0);
            let cost = block_cost::<f32>(64.);
            zip_blocks(partition, &src, 1, &mut dst, 2, cost, Parallelism::Global, |src, dst| {
                assert!(src.len() <= QUANTIZE_BLOCK_SIZE);
                assert_eq!(dst.len(), src.len().div_ceil(2));
                blocks.fetch_add(1, Relaxed);
            });
            assert_eq!(blocks.into_inner(), partition.num_blocks);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let mut out = [0u8; 3];
        assert_eq!(
            quantize_linear(&[1.; 4], &mut out, 1., 0, Parallelism::Serial),
            Err(QuantizeError::LengthMismatch)
        );
        let mut out = [F8E5M2::ZERO; 3];
        assert_eq!(
            quantize_linear_sat(&[1.; 2], &mut out, 1., true, Parallelism::Serial),
            Err(QuantizeError::LengthMismatch)
        );
        assert_eq!(
            quantize_linear::<i8>(&[], &mut [], 1., 0, Parallelism::Global),
            Ok(())
        );
    }

    #[test]
    fn test_parallel_matches_serial() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        let data = random(100_003, -50., 80.);
        let p = get_quantization_parameter::<u8>(&data, QuantPolicy::default(), Parallelism::Pool(&pool));

        let mut serial = vec![0u8; data.len()];
        quantize_linear(&data, &mut serial, p.scale, p.zero_point, Parallelism::Serial).unwrap();
        let mut parallel = vec![0u8; data.len()];
        quantize_linear(&data, &mut parallel, p.scale, p.zero_point, Parallelism::Pool(&pool)).unwrap();
        assert_eq!(serial, parallel);

        let mut expect = vec![0u8; data.len()];
        kernels::quantize_linear(&data, &mut expect, p.scale, p.zero_point);
        assert_eq!(serial, expect);
    }

    #[test]
    fn test_round_trip() {
        for policy in [
            QuantPolicy::default(),
            QuantPolicy {
                reduce_range: false,
                symmetric: true,
            },
        ] {
            let data = random(10_000, -3., 7.);
            let p = get_quantization_parameter::<i8>(&data, policy, Parallelism::Global);
            let mut q = vec![0i8; data.len()];
            quantize_linear(&data, &mut q, p.scale, p.zero_point, Parallelism::Global).unwrap();
            let mut deq = vec![0.; data.len()];
            dequantize_linear(&q, &mut deq, p.scale, p.zero_point, Parallelism::Global).unwrap();

            let mut ec = ErrorCollector::new(p.scale as f64, 0.);
            for (&a, &b) in zip(&data, &deq) {
                ec.push(Diff::new(a, b))
            }
            println!("{ec}");
            assert!(ec.outliers().is_empty());
        }
    }

    #[test]
    fn test_clamped_at_boundary() {
        let mut q = [0u8; 3];
        quantize_linear(&[-10., 0., 10.], &mut q, 0.01, 128, Parallelism::Serial).unwrap();
        assert_eq!(q, [0, 128, 255]);
    }

    #[test]
    fn test_f16_rounds_half_away_from_zero() {
        let input = [0.5, 1.5, 2.5, -2.5, -0.5, 1000.].map(f16::from_f32);
        let mut q = [0i8; 6];
        quantize_linear_f16(&input, &mut q, f16::ONE, 0, Parallelism::Serial).unwrap();
        assert_eq!(q, [1, 2, 3, -3, -1, 127]);

        // the f32 path ties to even
        let mut q = [0i8; 5];
        quantize_linear(&[0.5, 1.5, 2.5, -2.5, -0.5], &mut q, 1., 0, Parallelism::Serial).unwrap();
        assert_eq!(q, [0, 2, 2, -2, 0]);
    }

    #[test]
    fn test_f16_parallel() {
        let data = random(50_000, -1., 1.).into_iter().map(f16::from_f32).collect::<Vec<_>>();
        let mut serial = vec![0u16; data.len()];
        let mut parallel = vec![0u16; data.len()];
        let scale = f16::from_f32(2. / 65535.);
        quantize_linear_f16(&data, &mut serial, scale, 32768, Parallelism::Serial).unwrap();
        quantize_linear_f16(&data, &mut parallel, scale, 32768, Parallelism::Global).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_narrow_float() {
        let input = [1., -2., 1000., -1e6, f32::NAN];
        let mut out = [F8E4M3FN::ZERO; 5];
        quantize_linear_sat(&input, &mut out, 2., true, Parallelism::Serial).unwrap();
        let out = out.map(F8E4M3FN::to_f32);
        assert_eq!(&out[..4], &[0.5, -1., 448., -448.]);
        assert!(out[4].is_nan());

        let mut out = [F8E4M3FN::ZERO; 5];
        quantize_linear_sat(&input, &mut out, 2., false, Parallelism::Serial).unwrap();
        assert!(out[2].to_f32().is_nan() && out[3].to_f32().is_nan());

        let mut out = [F8E5M2::ZERO; 5];
        quantize_linear_sat(&input, &mut out, 2., false, Parallelism::Serial).unwrap();
        assert_eq!(out[3].to_f32(), f32::NEG_INFINITY);

        let half = input.map(f16::from_f32);
        let mut out16 = [F8E5M2::ZERO; 5];
        quantize_linear_sat_f16(&half, &mut out16, f16::from_f32(2.), false, Parallelism::Serial)
            .unwrap();
        assert_eq!(out16[..3], out[..3]);
        assert_eq!(out16[3].to_f32(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_narrow_float_parallel() {
        let data = random(30_000, -1000., 1000.);
        let mut serial = vec![F8E5M2::ZERO; data.len()];
        let mut parallel = vec![F8E5M2::ZERO; data.len()];
        quantize_linear_sat(&data, &mut serial, 0.5, true, Parallelism::Serial).unwrap();
        quantize_linear_sat(&data, &mut parallel, 0.5, true, Parallelism::Global).unwrap();
        assert_eq!(serial, parallel);
    }
}
