use crate::{kernels, Parallelism, Partition, TensorOpCost};
use log::trace;
use std::iter::zip;

/// Default cap on partial aggregates of a min/max reduction, and so on its fan-out.
pub const MAX_DEGREE_OF_PAR_FOR_MINMAX: usize = 32;
/// Min/max blocks are multiples of this many elements, roughly what one vectorized
/// iteration of the kernel consumes.
pub const MIN_MAX_GRANULARITY: usize = 128;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FloatMinMax {
    pub min: f32,
    pub max: f32,
}

impl FloatMinMax {
    /// Identity of [`merge`](Self::merge).
    pub const INIT: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
    pub const ZERO: Self = Self { min: 0., max: 0. };

    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Widens the range so that zero is representable.
    #[inline]
    pub fn include_zero(self) -> Self {
        self.merge(Self::ZERO)
    }
}

/// Global `(min, max)` of `data` widened to include zero.
///
/// An empty buffer yields `(0, 0)`.
#[inline]
pub fn find_min_max(data: &[f32], par: Parallelism) -> FloatMinMax {
    find_min_max_with::<MAX_DEGREE_OF_PAR_FOR_MINMAX>(data, par)
}

/// [`find_min_max`] with at most `P` partial aggregates alive at once.
pub fn find_min_max_with<const P: usize>(data: &[f32], par: Parallelism) -> FloatMinMax {
    const { assert!(P > 0) }

    let Partition {
        block_size,
        num_blocks,
    } = Partition::for_reduction(
        data.len(),
        par.should_parallelize(),
        MIN_MAX_GRANULARITY,
        P,
    );
    if num_blocks == 0 {
        return FloatMinMax::ZERO;
    }
    assert!(num_blocks <= P);
    trace!("min max of {} elements in {num_blocks} blocks", data.len());

    // block i owns slot i % P, which is i itself since num_blocks <= P
    let mut aggregate = [FloatMinMax::INIT; P];
    let work = zip(data.chunks(block_size), &mut aggregate).collect::<Vec<_>>();
    debug_assert_eq!(work.len(), num_blocks);

    let cost = TensorOpCost {
        bytes_loaded: (block_size * size_of::<f32>()) as _,
        bytes_stored: size_of::<FloatMinMax>() as _,
        compute_cycles: block_size as _,
    };
    par.for_each(work, cost, |_, (block, agg)| kernels::find_min_max(block, agg));

    aggregate[..num_blocks]
        .iter()
        .fold(FloatMinMax::INIT, |acc, &agg| acc.merge(agg))
        .include_zero()
}
