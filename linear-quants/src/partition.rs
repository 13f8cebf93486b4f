/// Split of `n` elements into `num_blocks` contiguous blocks of `block_size`.
///
/// The last block may be short. `block_size * num_blocks >= n` always holds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Partition {
    pub block_size: usize,
    pub num_blocks: usize,
}

impl Partition {
    pub const EMPTY: Self = Self {
        block_size: 0,
        num_blocks: 0,
    };

    /// Partition for a reduction with at most `max_blocks` partial results.
    ///
    /// When `parallel` is set and `n` exceeds `granularity`, the block size is the
    /// smallest multiple of `granularity` that fits `n` into `max_blocks` blocks.
    /// Otherwise a single block covers everything.
    pub fn for_reduction(n: usize, parallel: bool, granularity: usize, max_blocks: usize) -> Self {
        assert!(granularity > 0 && max_blocks > 0);
        if n == 0 {
            return Self::EMPTY;
        }
        if parallel && n > granularity {
            let block_size = n.div_ceil(max_blocks).next_multiple_of(granularity);
            Self {
                block_size,
                num_blocks: n.div_ceil(block_size),
            }
        } else {
            Self {
                block_size: n,
                num_blocks: 1,
            }
        }
    }

    /// Partition into blocks of exactly `block_size` elements, except the last.
    pub fn fixed(n: usize, block_size: usize) -> Self {
        assert!(block_size > 0);
        Self {
            block_size,
            num_blocks: n.div_ceil(block_size),
        }
    }
}
