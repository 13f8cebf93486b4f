use std::fmt;

/// 8-bit float that a float can be cast into, with or without saturation.
pub trait NarrowFloat: Copy + Send + Sync + 'static {
    /// Rounds to nearest even.
    ///
    /// Out-of-range values, including infinities, become the largest finite value of the
    /// matching sign when `saturate` is set. Otherwise they become infinity if the format
    /// has one, or NaN if it does not.
    fn from_f32(x: f32, saturate: bool) -> Self;
    fn to_f32(self) -> f32;
}

/// How a format spends its special encodings.
#[derive(Clone, Copy)]
enum Special {
    /// IEEE-like: all-ones exponent is infinity or NaN.
    Ieee,
    /// Finite only: `S.1111.111` is NaN, no infinity.
    Fn,
    /// Finite, unsigned zero: `0x80` is the only NaN, no negative zero.
    Uz,
}

struct Format {
    man_bits: u32,
    bias: i32,
    max: u8,
    special: Special,
}

impl Format {
    fn nan(&self, sign: u8) -> u8 {
        match self.special {
            Special::Ieee | Special::Fn => 0x7f | sign,
            Special::Uz => 0x80,
        }
    }

    fn overflow(&self, sign: u8, saturate: bool) -> u8 {
        match self.special {
            _ if saturate => self.max | sign,
            Special::Ieee => (self.max + 1) | sign,
            Special::Fn | Special::Uz => self.nan(sign),
        }
    }

    fn encode(&self, x: f32, saturate: bool) -> u8 {
        let sign = if x.is_sign_negative() { 0x80 } else { 0 };
        if x.is_nan() {
            return self.nan(sign);
        }
        if x.is_infinite() {
            return self.overflow(sign, saturate);
        }

        let abs = x.abs();
        let bits = if abs >= 2f32.powi(1 - self.bias) {
            // normal in the target format: round the f32 mantissa, then rebias the exponent
            let v = abs.to_bits();
            let shift = 23 - self.man_bits;
            let v = v + ((1 << (shift - 1)) - 1) + ((v >> shift) & 1);
            let q = (v - (((127 - self.bias) as u32) << 23)) >> shift;
            if q > self.max as u32 {
                return self.overflow(sign, saturate);
            }
            q as u8
        } else {
            // subnormal: count steps of the smallest subnormal, the division is exact
            let step = 2f32.powi(1 - self.bias - self.man_bits as i32);
            (abs / step).round_ties_even() as u8
        };

        match self.special {
            Special::Uz if bits == 0 => 0,
            _ => bits | sign,
        }
    }

    fn decode(&self, bits: u8) -> f32 {
        let man_mask = (1u8 << self.man_bits) - 1;
        let exp = ((bits & 0x7f) >> self.man_bits) as i32;
        let man = bits & man_mask;
        let exp_max = (0x7f >> self.man_bits) as i32;

        let sign = if bits & 0x80 != 0 { -1. } else { 1. };
        match self.special {
            Special::Uz if bits == 0x80 => return f32::NAN,
            Special::Fn if bits & 0x7f == 0x7f => return f32::NAN,
            Special::Ieee if exp == exp_max => {
                return if man == 0 {
                    sign * f32::INFINITY
                } else {
                    f32::NAN
                };
            }
            _ => {}
        }

        let man_bits = self.man_bits as i32;
        let abs = if exp == 0 {
            man as f32 * 2f32.powi(1 - self.bias - man_bits)
        } else {
            (1. + man as f32 / (1 << man_bits) as f32) * 2f32.powi(exp - self.bias)
        };
        sign * abs
    }
}

macro_rules! float8 {
    ($(#[$doc:meta])* $name:ident { man_bits: $man:expr, bias: $bias:expr, max: $max:expr, $special:ident }) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u8);

        impl $name {
            const FORMAT: Format = Format {
                man_bits: $man,
                bias: $bias,
                max: $max,
                special: Special::$special,
            };
            pub const ZERO: Self = Self(0);
            pub const MAX: Self = Self($max);

            #[inline]
            pub const fn from_bits(bits: u8) -> Self {
                Self(bits)
            }
            #[inline]
            pub const fn to_bits(self) -> u8 {
                self.0
            }
        }

        impl NarrowFloat for $name {
            #[inline]
            fn from_f32(x: f32, saturate: bool) -> Self {
                Self(Self::FORMAT.encode(x, saturate))
            }
            #[inline]
            fn to_f32(self) -> f32 {
                Self::FORMAT.decode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#04x} = {})", stringify!($name), self.0, self.to_f32())
            }
        }
    };
}

float8! {
    /// 4 exponent bits, 3 mantissa bits, no infinity. Largest finite value is 448.
    F8E4M3FN   { man_bits: 3, bias:  7, max: 0x7e, Fn   }
}
float8! {
    /// [`F8E4M3FN`] with bias 8 and a single NaN. Largest finite value is 240.
    F8E4M3FNUZ { man_bits: 3, bias:  8, max: 0x7f, Uz   }
}
float8! {
    /// 5 exponent bits, 2 mantissa bits, IEEE-style infinities. Largest finite value is 57344.
    F8E5M2     { man_bits: 2, bias: 15, max: 0x7b, Ieee }
}
float8! {
    /// [`F8E5M2`] with bias 16 and a single NaN. Largest finite value is 57344.
    F8E5M2FNUZ { man_bits: 2, bias: 16, max: 0x7f, Uz   }
}
