//! WMIO encoding
//!
//! The [`Encoder`] writes into a main buffer and keeps a stack of heap
//! scopes. A reference is written as the heap offset its referent will occupy,
//! and the referent is appended to the current scope's heap. The heap is
//! emitted later with [`Encoder::write_heap`].
//!
//! A referent is assembled in one piece and appended as a whole, so any
//! reference nested inside it has to go through [`Encoder::write_on_heap`],
//! which reserves a fixed region and places the nested referents right
//! behind it.

use crate::context::Context;
use crate::dictionary;
use crate::heap::{Heap, Heaps};
use crate::{Result, WmioError};
use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use std::convert::Infallible;
use std::mem;

/// Reference value of a null reference
pub const NULL_REF: u32 = 0xFFFF_FFFF;

/// Bit forced on in the heap size field
pub const HEAP_SIZE_FLAG: u32 = 1 << 31;

/// Trait for types that can be encoded to WMIO format
pub trait Encode {
    /// Encode this value at the encoder's current position
    fn encode(&self, w: &mut Encoder) -> Result<()>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        (**self).encode(w)
    }
}

/// Raw bytes, written as-is
impl Encode for [u8] {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.out.put_slice(self);
        Ok(())
    }
}

/// Encoder heap arena
#[derive(Debug, Default)]
pub(crate) struct Arena {
    pub(crate) bytes: BytesMut,
    /// A referent for this scope is being assembled in `Encoder::out`
    open: bool,
}

/// WMIO encoder
#[derive(Debug)]
pub struct Encoder {
    pub(crate) out: BytesMut,
    /// Heap offset of `out[0]` while `out` holds a referent
    anchor: Option<u32>,
    heaps: Heaps<Arena, Infallible>,
    context: Context,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            out: BytesMut::new(),
            anchor: None,
            heaps: Heaps::new(),
            context: Context::new(),
        }
    }

    /// Take the encoded bytes, or the first error raised while encoding
    pub fn finish(self) -> Result<Bytes> {
        self.context.check()?;
        Ok(self.out.freeze())
    }

    /// Bytes written to the main buffer so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// First error raised by this encoder
    pub fn error(&self) -> Option<&WmioError> {
        self.context.error()
    }

    /// Debug path at which the first error was raised
    pub fn error_path(&self) -> Option<&str> {
        self.context.error_path()
    }

    /// Size of the current scope's heap
    pub fn heap_len(&self) -> usize {
        self.heaps.top().arena.bytes.len()
    }

    /// Number of open heap scopes, root included
    pub fn heap_depth(&self) -> usize {
        self.heaps.depth()
    }

    /// Run `f` unless the encoder is frozen; freeze on failure
    fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.context.check()?;
        f(self).map_err(|e| self.context.freeze(e))
    }

    /// Run `f` inside a named debug context
    pub fn within<T>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.context.check()?;
        self.context.enter(name);
        let res = f(self).map_err(|e| self.context.freeze(e));
        self.context.leave();
        res
    }

    /// Write a value (WriteData)
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.guard(|w| value.encode(w))
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes)
    }

    /// Write a flag-byte encoded string inline
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write(s)
    }

    /// Write a null reference
    pub fn write_null_ref(&mut self) -> Result<()> {
        self.write(&NULL_REF)
    }

    /// Write a string reference
    ///
    /// The empty string is a null reference and dictionary words are written
    /// as their index; anything else goes to the heap.
    pub fn write_string_ref(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            return self.write_null_ref();
        }
        if let Some(reference) = dictionary::reverse_lookup(s) {
            return self.write(&reference);
        }
        self.write_ref_with(|w| w.write_string(s))
    }

    /// Write a reference to a referent produced by `f`
    ///
    /// The reference is the current heap length; the bytes `f` writes are
    /// appended to the current scope's heap.
    pub fn write_ref_with<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.guard(|w| {
            let top = w.heaps.top_mut();
            if top.arena.open {
                return Err(WmioError::UnreservedReference);
            }
            let offset = top.base + top.arena.bytes.len() as u32;
            top.arena.open = true;
            w.out.put_u32_le(offset);

            let outer = mem::take(&mut w.out);
            let outer_anchor = w.anchor.replace(offset);
            let res = f(w);
            let referent = mem::replace(&mut w.out, outer);
            w.anchor = outer_anchor;

            let top = w.heaps.top_mut();
            top.arena.open = false;
            res?;
            top.arena.bytes.extend_from_slice(&referent);
            Ok(())
        })
    }

    /// Write exactly `size` bytes produced by `f` (WriteDataOnHeap)
    ///
    /// Shorter output is zero padded, longer output is an error. References
    /// written by `f` land in a virtual heap frame placed right after the
    /// reserved region, which is folded into the parent heap afterwards.
    pub fn write_on_heap<F>(&mut self, size: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.guard(|w| {
            let top = w.heaps.top();
            // inside a referent the region and its frame travel with `out`
            let inline = top.arena.open;
            let base = if inline {
                let anchor = w.anchor.ok_or(WmioError::UnreservedReference)?;
                anchor + (w.out.len() + size) as u32
            } else {
                top.base + top.arena.bytes.len() as u32
            };

            w.heaps.push(base);
            let outer = mem::take(&mut w.out);
            let outer_anchor = w.anchor.take();
            let res = f(w);
            let region = mem::replace(&mut w.out, outer);
            w.anchor = outer_anchor;
            let frame = w.heaps.pop();
            res?;

            if region.len() > size {
                return Err(WmioError::HeapOverflow {
                    reserved: size,
                    written: region.len(),
                });
            }
            w.out.put_slice(&region);
            w.out.put_bytes(0, size - region.len());

            let frame = frame.map(|f: Heap<Arena, Infallible>| f.arena.bytes).unwrap_or_default();
            if inline {
                w.out.put_slice(&frame);
            } else {
                w.heaps.top_mut().arena.bytes.extend_from_slice(&frame);
            }
            Ok(())
        })
    }

    /// Emit the current scope's heap: size with bit 31 set, then the bytes
    pub fn write_heap(&mut self) -> Result<()> {
        self.guard(|w| {
            let heap = &w.heaps.top().arena.bytes;
            w.out.put_u32_le(heap.len() as u32 | HEAP_SIZE_FLAG);
            w.out.put_slice(heap);
            Ok(())
        })
    }

    /// Run `f` in a fresh heap scope
    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard(|w| {
            w.heaps.push(0);
            let outer_anchor = w.anchor.take();
            let res = f(w);
            w.anchor = outer_anchor;
            w.heaps.pop();
            res
        })
    }

    /// Encode `f` into a separate buffer and return its bytes
    ///
    /// Heap scopes are shared with the caller.
    pub fn encode_detached(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<Bytes> {
        self.guard(|w| {
            let outer = mem::take(&mut w.out);
            let outer_anchor = w.anchor.take();
            let res = f(w);
            let body = mem::replace(&mut w.out, outer);
            w.anchor = outer_anchor;
            res.map(|_| body.freeze())
        })
    }

    /// Write `f` behind a u32 length that counts itself
    pub fn encode_with_length32(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.guard(|w| {
            let body = w.encode_detached(f)?;
            w.write(&(body.len() as u32 + 4))?;
            w.write_bytes(&body)
        })
    }

    /// Write `f` behind a u32 size that does not count itself
    pub fn encode_with_size32(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.guard(|w| {
            let body = w.encode_detached(f)?;
            w.write(&(body.len() as u32))?;
            w.write_bytes(&body)
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_dictionary_refs() {
        let mut w = Encoder::new();
        w.write_string_ref("").unwrap();
        w.write_string_ref("key").unwrap();
        assert_eq!(w.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x80]);
        assert_eq!(w.heap_len(), 0);
    }

    #[test]
    fn test_string_ref_goes_to_heap() {
        let mut w = Encoder::new();
        w.with_scope(|w| {
            w.write_string_ref("ab")?;
            w.write_string_ref("cd")?;
            assert_eq!(w.heap_len(), 8);
            w.write_heap()
        })
        .unwrap();

        let out = w.finish().unwrap();
        assert_eq!(
            &out[..],
            &[
                0, 0, 0, 0, // "ab" at 0
                4, 0, 0, 0, // "cd" at 4
                8, 0, 0, 0x80, // heap size
                0, b'a', b'b', 0, 0, b'c', b'd', 0,
            ]
        );
    }

    #[test]
    fn test_write_on_heap_pads() {
        let mut w = Encoder::new();
        w.write_on_heap(8, |w| {
            w.write(&0x0403_0201u32)?;
            w.write(&0x0605u16)
        })
        .unwrap();
        assert_eq!(w.as_bytes(), &[1, 2, 3, 4, 5, 6, 0, 0]);
    }

    #[test]
    fn test_write_on_heap_overflow_freezes() {
        let mut w = Encoder::new();
        let err = w
            .write_on_heap(4, |w| {
                w.write(&0u32)?;
                w.write(&0u16)
            })
            .unwrap_err();
        assert_eq!(err, WmioError::HeapOverflow { reserved: 4, written: 6 });

        // frozen: nothing else gets written
        assert_eq!(w.write(&7u32), Err(err.clone()));
        assert_eq!(w.write_string_ref("abc"), Err(err.clone()));
        assert!(w.as_bytes().is_empty());
        assert_eq!(w.finish(), Err(err));
    }

    #[test]
    fn test_nested_refs_behind_reservation() {
        let mut w = Encoder::new();
        w.with_scope(|w| {
            w.write_ref_with(|w| {
                w.write(&2u32)?;
                w.write_on_heap(8, |w| {
                    w.write_string_ref("x")?;
                    w.write_string_ref("y")
                })
            })?;
            w.write_heap()
        })
        .unwrap();

        let out = w.finish().unwrap();
        assert_eq!(
            &out[..],
            &[
                0, 0, 0, 0, // referent at 0
                18, 0, 0, 0x80, // heap size
                2, 0, 0, 0, // count
                12, 0, 0, 0, // "x" right after the 8 reserved bytes
                15, 0, 0, 0, // "y"
                0, b'x', 0, 0, b'y', 0,
            ]
        );
    }

    #[test]
    fn test_unreserved_nested_ref() {
        let mut w = Encoder::new();
        let err = w
            .write_ref_with(|w| w.write_string_ref("nested"))
            .unwrap_err();
        assert_eq!(err, WmioError::UnreservedReference);
    }

    #[test]
    fn test_length_and_size_framing() {
        let mut w = Encoder::new();
        w.encode_with_length32(|w| w.write(&1u16)).unwrap();
        w.encode_with_size32(|w| w.write(&1u16)).unwrap();
        assert_eq!(w.as_bytes(), &[6, 0, 0, 0, 1, 0, 2, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_scopes_balance() {
        let mut w = Encoder::new();
        w.with_scope(|w| w.with_scope(|w| w.write_string_ref("deep")))
            .unwrap();
        assert_eq!(w.heap_depth(), 1);
    }
}
