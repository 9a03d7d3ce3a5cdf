//! Scalar encodings
//!
//! All scalars are little-endian with no alignment padding:
//!
//! | CIM type        | Rust type | Size |
//! |-----------------|-----------|------|
//! | sint8 / uint8   | i8 / u8   | 1    |
//! | sint16 / uint16 | i16 / u16 | 2    |
//! | char16          | u16       | 2    |
//! | boolean         | bool      | 2    |
//! | sint32 / uint32 | i32 / u32 | 4    |
//! | real32          | f32       | 4    |
//! | sint64 / uint64 | i64 / u64 | 8    |
//! | real64          | f64       | 8    |

use crate::{Decode, Decoder, Encode, Encoder, Result};
use bytes::{Buf, BufMut};

/// Wire value of `true`
pub const BOOL_TRUE: u16 = 0xFFFF;

macro_rules! impl_primitive {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl Encode for $ty {
            fn encode(&self, w: &mut Encoder) -> Result<()> {
                w.out.$put(*self);
                Ok(())
            }
        }

        impl Decode for $ty {
            fn decode(r: &mut Decoder) -> Result<Self> {
                r.ensure($size)?;
                Ok(r.input.$get())
            }
        }
    };
}

impl_primitive!(u8, 1, put_u8, get_u8);
impl_primitive!(i8, 1, put_i8, get_i8);
impl_primitive!(u16, 2, put_u16_le, get_u16_le);
impl_primitive!(i16, 2, put_i16_le, get_i16_le);
impl_primitive!(u32, 4, put_u32_le, get_u32_le);
impl_primitive!(i32, 4, put_i32_le, get_i32_le);
impl_primitive!(u64, 8, put_u64_le, get_u64_le);
impl_primitive!(i64, 8, put_i64_le, get_i64_le);
impl_primitive!(f32, 4, put_f32_le, get_f32_le);
impl_primitive!(f64, 8, put_f64_le, get_f64_le);

/// Boolean - encoded as u16 (0xFFFF = true, 0x0000 = false)
impl Encode for bool {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.out.put_u16_le(if *self { BOOL_TRUE } else { 0 });
        Ok(())
    }
}

/// Any non-zero value decodes as true
impl Decode for bool {
    fn decode(r: &mut Decoder) -> Result<Self> {
        Ok(u16::decode(r)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WmioError;

    #[test]
    fn test_little_endian() {
        let mut w = Encoder::new();
        w.write(&0x1234_5678u32).unwrap();
        w.write(&-2i16).unwrap();
        w.write(&1.5f64).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(&out[..6], &[0x78, 0x56, 0x34, 0x12, 0xFE, 0xFF]);

        let mut r = Decoder::new(out);
        assert_eq!(r.read::<u32>().unwrap(), 0x1234_5678);
        assert_eq!(r.read::<i16>().unwrap(), -2);
        assert_eq!(r.read::<f64>().unwrap(), 1.5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_bool_is_u16() {
        let mut w = Encoder::new();
        w.write(&true).unwrap();
        w.write(&false).unwrap();
        assert_eq!(w.as_bytes(), &[0xFF, 0xFF, 0x00, 0x00]);

        let mut r = Decoder::new(bytes::Bytes::from_static(&[0x01, 0x00, 0x00, 0x00]));
        assert!(r.read::<bool>().unwrap());
        assert!(!r.read::<bool>().unwrap());
    }

    #[test]
    fn test_underflow() {
        let mut r = Decoder::new(bytes::Bytes::from_static(&[0x01, 0x02]));
        assert_eq!(
            r.read::<u32>(),
            Err(WmioError::BufferUnderflow { needed: 4, have: 2 })
        );
    }
}
