use crate::{
    params::params,
    tensor::{QType, QuantArgs},
    ERR, YES,
};
use half::f16;
use linear_quants::{
    calc_num_int4_pairs, dequantize_linear, dequantize_linear_4bit, find_min_max, quantize_linear,
    quantize_linear_4bit, quantize_linear_f16, Int4x2, PackedInt4, Parallelism, QuantInt,
    QuantizeError, UInt4x2,
};
use log::{info, warn};
use std::{iter::zip, time::Instant};

#[derive(Args)]
pub struct CheckArgs {
    #[clap(flatten)]
    quant: QuantArgs,
}

impl CheckArgs {
    pub fn check(self) {
        let Self { quant } = self;
        let tensor = match quant.load() {
            Ok(t) => t,
            Err(e) => {
                println!("{ERR}Failed to load {}: {e}", quant.file.display());
                return;
            }
        };
        let data = tensor.f32s();

        let result = quant.with_parallelism(|par| {
            let range = find_min_max(&data, par);
            let (scale, zp) = params(range, &quant);

            let time = Instant::now();
            #[rustfmt::skip]
            let deq = match (quant.qtype, tensor.f16s()) {
                (QType::I8 , Some(half)) => round_trip_f16::<i8 >(half, scale, zp, par),
                (QType::U8 , Some(half)) => round_trip_f16::<u8 >(half, scale, zp, par),
                (QType::I16, Some(half)) => round_trip_f16::<i16>(half, scale, zp, par),
                (QType::U16, Some(half)) => round_trip_f16::<u16>(half, scale, zp, par),
                (QType::I8 , None) => round_trip::<i8 >(&data, scale, zp, par),
                (QType::U8 , None) => round_trip::<u8 >(&data, scale, zp, par),
                (QType::I16, None) => round_trip::<i16>(&data, scale, zp, par),
                (QType::U16, None) => round_trip::<u16>(&data, scale, zp, par),
                (QType::Int4 , _) => round_trip_4bit::<Int4x2 >(&data, scale, zp, par),
                (QType::Uint4, _) => round_trip_4bit::<UInt4x2>(&data, scale, zp, par),
            }?;
            info!("round trip in {:?}", time.elapsed());
            Ok::<_, QuantizeError>((scale, deq))
        });

        let (scale, deq) = match result {
            Ok(ans) => ans,
            Err(e) => {
                println!("{ERR}{e}");
                return;
            }
        };

        let mut max = 0f32;
        let mut sum = 0f64;
        let mut far = 0usize;
        for (&a, &b) in zip(&*data, &deq) {
            let diff = (a - b).abs();
            max = max.max(diff);
            sum += diff as f64;
            if diff > scale {
                far += 1
            }
        }
        if far > 0 {
            warn!("{far} elements are more than one step away");
        }
        println!("{YES}{} elements as {:?}, scale = {scale:e}", data.len(), quant.qtype);
        println!("max abs error  = {max:e}");
        println!("mean abs error = {:e}", sum / data.len().max(1) as f64);
        println!("beyond 1 step  = {far}");
    }
}

fn round_trip<Q: QuantInt + Default>(
    data: &[f32],
    scale: f32,
    zp: i32,
    par: Parallelism,
) -> Result<Vec<f32>, QuantizeError> {
    let zp = Q::from_i32(zp);
    let mut q = vec![Q::default(); data.len()];
    quantize_linear(data, &mut q, scale, zp, par)?;
    let mut ans = vec![0.; data.len()];
    dequantize_linear(&q, &mut ans, scale, zp, par)?;
    Ok(ans)
}

fn round_trip_f16<Q: QuantInt + Default>(
    data: &[f16],
    scale: f32,
    zp: i32,
    par: Parallelism,
) -> Result<Vec<f32>, QuantizeError> {
    // the f16 path divides by the f16 scale, dequantize with the same one
    let scale = f16::from_f32(scale);
    let zp = Q::from_i32(zp);
    let mut q = vec![Q::default(); data.len()];
    quantize_linear_f16(data, &mut q, scale, zp, par)?;
    let mut ans = vec![0.; data.len()];
    dequantize_linear(&q, &mut ans, scale.to_f32(), zp, par)?;
    Ok(ans)
}

fn round_trip_4bit<P: PackedInt4>(
    data: &[f32],
    scale: f32,
    zp: i32,
    par: Parallelism,
) -> Result<Vec<f32>, QuantizeError> {
    let zp = <P::Unpacked as QuantInt>::from_i32(zp);
    let mut q = vec![P::ZEROS; calc_num_int4_pairs(data.len())];
    quantize_linear_4bit(data, &mut q, 0, data.len(), scale, zp, par)?;
    let mut ans = vec![0.; data.len()];
    dequantize_linear_4bit(&q, &mut ans, scale, zp, par)?;
    Ok(ans)
}
