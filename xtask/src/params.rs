use crate::{
    tensor::{QType, QuantArgs},
    ERR, YES,
};
use linear_quants::{
    compute_quantization_parameter as wide, compute_quantization_parameter_4bit as packed,
    find_min_max, FloatMinMax, Int4x2, QuantInt, QuantParams, UInt4x2,
};
use log::info;
use std::time::Instant;

#[derive(Args)]
pub struct ParamsArgs {
    #[clap(flatten)]
    quant: QuantArgs,
}

impl ParamsArgs {
    pub fn params(self) {
        let Self { quant } = self;
        let tensor = match quant.load() {
            Ok(t) => t,
            Err(e) => {
                println!("{ERR}Failed to load {}: {e}", quant.file.display());
                return;
            }
        };
        let data = tensor.f32s();

        let time = Instant::now();
        let range = quant.with_parallelism(|par| find_min_max(&data, par));
        info!("min max of {} elements in {:?}", data.len(), time.elapsed());

        let (scale, zero_point) = params(range, &quant);
        println!("{YES}{} elements of {:?} as {:?}", data.len(), tensor.dtype(), quant.qtype);
        println!("min        = {}", range.min);
        println!("max        = {}", range.max);
        println!("scale      = {scale:e}");
        println!("zero point = {zero_point}");
    }
}

/// Scale and zero point, widened to `i32`, for `range` quantized into `args.qtype`.
pub(crate) fn params(range: FloatMinMax, args: &QuantArgs) -> (f32, i32) {
    fn unpack<Q: QuantInt>(QuantParams { scale, zero_point }: QuantParams<Q>) -> (f32, i32) {
        (scale, zero_point.to_i32())
    }

    let policy = args.policy();
    #[rustfmt::skip]
    let ans = match args.qtype {
        QType::I8    => unpack(wide::<i8 >(range, policy)),
        QType::U8    => unpack(wide::<u8 >(range, policy)),
        QType::I16   => unpack(wide::<i16>(range, policy)),
        QType::U16   => unpack(wide::<u16>(range, policy)),
        QType::Int4  => unpack(packed::<Int4x2 >(range, policy)),
        QType::Uint4 => unpack(packed::<UInt4x2>(range, policy)),
    };
    ans
}
