//! Parallel linear quantization.
//!
//! Reduces float buffers to a global `(min, max)`, derives scale and zero point from it,
//! and quantizes into 8/16-bit integers, packed 4-bit integers or 8-bit floats.
//! Work is split into fixed-size blocks and handed to a rayon pool through [`Parallelism`].

mod dispatch;
mod executor;
mod linear;
mod min_max;
mod packed;
mod params;
mod partition;

pub mod kernels;

#[cfg(test)]
mod test_utils;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizeError {
    /// Input and output buffers do not describe the same number of elements.
    LengthMismatch,
    /// The zero point is not of the output element type.
    TypeMismatch,
}

impl fmt::Display for QuantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch => write!(f, "input and output lengths mismatch"),
            Self::TypeMismatch => write!(f, "zero point type mismatches output type"),
        }
    }
}

impl std::error::Error for QuantizeError {}

pub use dispatch::{quantize, quantize_f16, QuantizeOutput, ZeroPoint};
pub use executor::{Parallelism, TensorOpCost};
pub use linear::{
    dequantize_linear, quantize_linear, quantize_linear_f16, quantize_linear_sat,
    quantize_linear_sat_f16, QUANTIZE_BLOCK_SIZE,
};
pub use min_max::{
    find_min_max, find_min_max_with, FloatMinMax, MAX_DEGREE_OF_PAR_FOR_MINMAX,
    MIN_MAX_GRANULARITY,
};
pub use packed::{dequantize_linear_4bit, quantize_linear_4bit};
pub use params::{
    compute_quantization_parameter, compute_quantization_parameter_4bit,
    get_quantization_parameter, get_quantization_parameter_4bit, round_half_to_even,
    QuantParams, QuantPolicy,
};
pub use partition::Partition;

mod types;
pub use types::*;
