use super::QuantInt;

/// Two 4-bit integers sharing one byte.
///
/// Element 0 lives in the low nibble and element 1 in the high nibble,
/// so logical element `i` of a packed buffer is element `i & 1` of byte `i >> 1`.
pub trait PackedInt4: Copy + Send + Sync + 'static {
    /// Type a single element unpacks to; also the type of a zero point.
    type Unpacked: QuantInt;

    const MIN: i32;
    const MAX: i32;
    const ZEROS: Self;

    /// Packs two values already known to lie in `[MIN, MAX]`.
    fn pack(lo: i32, hi: i32) -> Self;
    fn get(self, i: usize) -> i32;
    fn set(&mut self, i: usize, val: i32);
}

/// Number of bytes holding `n` packed 4-bit elements.
#[inline]
pub const fn calc_num_int4_pairs(n: usize) -> usize {
    n.div_ceil(2)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Int4x2(u8);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
#[repr(transparent)]
pub struct UInt4x2(u8);

macro_rules! impl_int4 {
    ($ty:ident, $unpacked:ty, $min:expr, $max:expr, |$bits:ident| $extend:expr) => {
        impl $ty {
            #[inline]
            pub const fn from_bits(bits: u8) -> Self {
                Self(bits)
            }
            #[inline]
            pub const fn to_bits(self) -> u8 {
                self.0
            }
        }

        impl PackedInt4 for $ty {
            type Unpacked = $unpacked;

            const MIN: i32 = $min;
            const MAX: i32 = $max;
            const ZEROS: Self = Self(0);

            #[inline]
            fn pack(lo: i32, hi: i32) -> Self {
                debug_assert!((Self::MIN..=Self::MAX).contains(&lo));
                debug_assert!((Self::MIN..=Self::MAX).contains(&hi));
                Self(((hi as u8 & 0xf) << 4) | (lo as u8 & 0xf))
            }
            #[inline]
            fn get(self, i: usize) -> i32 {
                debug_assert!(i < 2);
                let $bits = (self.0 >> (i * 4)) << 4;
                $extend
            }
            #[inline]
            fn set(&mut self, i: usize, val: i32) {
                debug_assert!(i < 2);
                debug_assert!((Self::MIN..=Self::MAX).contains(&val));
                let shift = i * 4;
                self.0 = (self.0 & !(0xf << shift)) | ((val as u8 & 0xf) << shift);
            }
        }
    };
}

impl_int4!(Int4x2 , i8, -8,  7, |bits| (bits as i8 >> 4) as i32);
impl_int4!(UInt4x2, u8,  0, 15, |bits| (bits >> 4) as i32);

#[test]
fn test_int4_elements() {
    let mut x = Int4x2::pack(-8, 7);
    assert_eq!(x.to_bits(), 0x78);
    assert_eq!((x.get(0), x.get(1)), (-8, 7));

    x.set(0, -1);
    assert_eq!((x.get(0), x.get(1)), (-1, 7));
    x.set(1, -3);
    assert_eq!((x.get(0), x.get(1)), (-1, -3));
    assert_eq!(x.to_bits(), 0xdf);

    let mut y = UInt4x2::ZEROS;
    y.set(1, 15);
    assert_eq!(y.to_bits(), 0xf0);
    assert_eq!((y.get(0), y.get(1)), (0, 15));
}

#[test]
fn test_num_pairs() {
    assert_eq!(calc_num_int4_pairs(0), 0);
    assert_eq!(calc_num_int4_pairs(1), 1);
    assert_eq!(calc_num_int4_pairs(4), 2);
    assert_eq!(calc_num_int4_pairs(7), 4);
}
