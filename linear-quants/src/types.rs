mod float8;
mod int;
mod int4;

pub use ::half::f16;
pub use float8::{NarrowFloat, F8E4M3FN, F8E4M3FNUZ, F8E5M2, F8E5M2FNUZ};
pub use int::QuantInt;
pub use int4::{calc_num_int4_pairs, Int4x2, PackedInt4, UInt4x2};
