/// Integer element that a float can be linearly quantized into.
pub trait QuantInt: Copy + Send + Sync + 'static {
    const MIN: i32;
    const MAX: i32;
    const SIGNED: bool;
    /// Range used when the caller asks for a reduced range.
    const REDUCED: (i32, i32) = (Self::MIN, Self::MAX);

    /// Clamps `x` into `[MIN, MAX]` and converts. NaN becomes 0.
    fn saturate(x: f32) -> Self;
    /// Converts a value already known to lie in `[MIN, MAX]`.
    fn from_i32(x: i32) -> Self;
    fn to_i32(self) -> i32;
}

macro_rules! quant_int {
    ($ty:ty, $signed:expr $(, reduced = $reduced:expr)?) => {
        impl QuantInt for $ty {
            const MIN: i32 = <$ty>::MIN as _;
            const MAX: i32 = <$ty>::MAX as _;
            const SIGNED: bool = $signed;
            $(const REDUCED: (i32, i32) = $reduced;)?

            #[inline]
            fn saturate(x: f32) -> Self {
                x.clamp(<Self as QuantInt>::MIN as f32, <Self as QuantInt>::MAX as f32) as _
            }
            #[inline]
            fn from_i32(x: i32) -> Self {
                debug_assert!((<Self as QuantInt>::MIN..=<Self as QuantInt>::MAX).contains(&x));
                x as _
            }
            #[inline]
            fn to_i32(self) -> i32 {
                self as _
            }
        }
    };
}

quant_int!(i8 , true , reduced = (-64, 64));
quant_int!(u8 , false);
quant_int!(i16, true );
quant_int!(u16, false);

#[test]
fn test_saturate() {
    assert_eq!(i8::saturate(300.), 127);
    assert_eq!(i8::saturate(-300.), -128);
    assert_eq!(u8::saturate(-1.), 0);
    assert_eq!(u8::saturate(f32::NAN), 0);
    assert_eq!(u16::saturate(70000.), u16::MAX);
    assert_eq!(i16::saturate(-12.), -12);
    assert_eq!(<i8 as QuantInt>::REDUCED, (-64, 64));
    assert_eq!(<u8 as QuantInt>::REDUCED, (0, 255));
}

#[test]
fn test_from_i32_bounds() {
    assert_eq!(i8::from_i32(-128), i8::MIN);
    assert_eq!(i8::from_i32(127), i8::MAX);
    assert_eq!(u8::from_i32(255), u8::MAX);
    assert_eq!(i16::from_i32(-32768), i16::MIN);
    assert_eq!(u16::from_i32(65535), u16::MAX);
    assert_eq!(<u16 as QuantInt>::MAX, 65535);
    assert_eq!(<i16 as QuantInt>::MIN, -32768);
    assert_eq!(u16::from_i32(40000).to_i32(), 40000);
}
