//! Encoded strings
//!
//! Wire format:
//! ```text
//! flag: u8          # 0 = 8-bit characters, 1 = UTF-16LE
//! chars[...]        # payload
//! null terminator   # one byte, or one u16 for UTF-16
//! ```
//!
//! Pure ASCII strings are written with flag 0, anything else as UTF-16.
//! Flag 0 payloads are read as Latin-1.

use crate::{Decode, Decoder, Encode, Encoder, Result, WmioError};
use bytes::{Buf, BufMut};

/// 8-bit string flag
pub const STRING_ASCII: u8 = 0x00;

/// UTF-16LE string flag
pub const STRING_UTF16: u8 = 0x01;

/// Encoded size of `s`, flag byte and terminator included
pub fn encoded_len(s: &str) -> usize {
    if s.is_ascii() {
        1 + s.len() + 1
    } else {
        1 + s.encode_utf16().count() * 2 + 2
    }
}

impl Encode for str {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        if self.contains('\0') {
            return Err(WmioError::InvalidString("embedded null character".into()));
        }
        if self.is_ascii() {
            w.out.put_u8(STRING_ASCII);
            w.out.put_slice(self.as_bytes());
            w.out.put_u8(0);
        } else {
            w.out.put_u8(STRING_UTF16);
            for unit in self.encode_utf16() {
                w.out.put_u16_le(unit);
            }
            w.out.put_u16_le(0);
        }
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        self.as_str().encode(w)
    }
}

impl Decode for String {
    fn decode(r: &mut Decoder) -> Result<Self> {
        match u8::decode(r)? {
            STRING_ASCII => {
                let end = r
                    .input
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or_else(|| WmioError::InvalidString("missing null terminator".into()))?;
                let chars = r.input.split_to(end);
                r.input.advance(1);
                Ok(chars.iter().map(|&b| char::from(b)).collect())
            }
            STRING_UTF16 => {
                let mut units = Vec::new();
                loop {
                    if r.input.remaining() < 2 {
                        return Err(WmioError::InvalidString("missing null terminator".into()));
                    }
                    match r.input.get_u16_le() {
                        0 => break,
                        unit => units.push(unit),
                    }
                }
                String::from_utf16(&units).map_err(|e| WmioError::InvalidString(e.to_string()))
            }
            flag => Err(WmioError::InvalidStringFlag(flag)),
        }
    }
}
