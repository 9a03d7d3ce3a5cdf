//! WMIO decoding
//!
//! References are read before the heap they point into. [`Decoder::read_ref`]
//! therefore hands out a [`Ref`] naming a result slot and queues the heap
//! offset on the current scope. [`Decoder::decode_heap`] resolves the queue
//! once the heap is loaded, and the structures that own the references pick
//! their results out of the slots afterwards.

use crate::context::Context;
use crate::dictionary::{self, DICTIONARY_FLAG};
use crate::encode::{HEAP_SIZE_FLAG, NULL_REF};
use crate::heap::Heaps;
use crate::object::Object;
use crate::property::PropertyData;
use crate::qualifier::{self, QualifierRecord};
use crate::value::{self, CimType, Data};
use crate::{Result, WmioError};
use bytes::{Buf, Bytes};
use std::borrow::Cow;
use std::mem;
use tracing::{trace, warn};

/// Deepest object nesting [`Decoder::nested`] accepts
pub const MAX_NESTING: usize = 32;

/// Trait for types that can be decoded from WMIO format
pub trait Decode: Sized {
    /// Decode a value at the decoder's current position
    fn decode(r: &mut Decoder) -> Result<Self>;
}

/// A decoded reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ref {
    /// `0xFFFFFFFF`
    Null,
    /// Dictionary word
    Word(&'static str),
    /// Result slot filled by [`Decoder::decode_heap`]
    Slot(usize),
}

/// What a heap reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    String,
    Value(CimType),
    Property,
    Qualifiers,
    Object,
}

impl Target {
    /// Whether a dictionary reference may stand in for the referent
    fn is_string(&self) -> bool {
        match self {
            Target::String => true,
            Target::Value(t) => t.is_string(),
            _ => false,
        }
    }
}

/// A resolved referent
#[derive(Debug)]
pub(crate) enum Resolved {
    Data(Data),
    /// Element references of a string or object array
    Refs(Vec<Ref>),
    Property(PropertyData),
    Qualifiers(Vec<QualifierRecord>),
    Object(Object),
}

/// A queued heap reference
#[derive(Debug)]
pub(crate) struct Pending {
    slot: usize,
    offset: u32,
    target: Target,
    name: &'static str,
}

/// WMIO decoder
#[derive(Debug)]
pub struct Decoder {
    pub(crate) input: Bytes,
    heaps: Heaps<Bytes, Pending>,
    slots: Vec<Option<Resolved>>,
    nesting: usize,
    context: Context,
}

impl Decoder {
    pub fn new(input: impl Into<Bytes>) -> Self {
        Self {
            input: input.into(),
            heaps: Heaps::new(),
            slots: Vec::new(),
            nesting: 0,
            context: Context::new(),
        }
    }

    /// Bytes left in the current input
    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }

    /// First error raised by this decoder
    pub fn error(&self) -> Option<&WmioError> {
        self.context.error()
    }

    /// Debug path at which the first error was raised
    pub fn error_path(&self) -> Option<&str> {
        self.context.error_path()
    }

    /// Number of open heap scopes, root included
    pub fn heap_depth(&self) -> usize {
        self.heaps.depth()
    }

    /// References queued and not yet resolved, across all scopes
    pub fn pending(&self) -> usize {
        self.heaps.pending()
    }

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

    /// Run `f` one object level deeper
    ///
    /// Objects nest through object-typed values and method signatures;
    /// input nested deeper than [`MAX_NESTING`] is rejected.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard(|r| {
            if r.nesting >= MAX_NESTING {
                return Err(WmioError::NestingTooDeep { limit: MAX_NESTING });
            }
            r.nesting += 1;
            let res = f(r);
            r.nesting -= 1;
            res
        })
    }

    /// Fail unless `needed` bytes are left
    pub(crate) fn ensure(&self, needed: usize) -> Result<()> {
        if self.input.remaining() < needed {
            return Err(WmioError::BufferUnderflow {
                needed,
                have: self.input.remaining(),
            });
        }
        Ok(())
    }

    /// Read a value (ReadData)
    pub fn read<T: Decode>(&mut self) -> Result<T> {
        self.guard(T::decode)
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.guard(|r| {
            r.ensure(len)?;
            Ok(r.input.split_to(len))
        })
    }

    /// Read a reference and queue it for [`Decoder::decode_heap`]
    pub(crate) fn read_ref(&mut self, target: Target, name: &'static str) -> Result<Ref> {
        self.guard(|r| {
            let reference: u32 = r.read()?;
            if reference == NULL_REF {
                return Ok(Ref::Null);
            }
            if reference & DICTIONARY_FLAG != 0 {
                if !target.is_string() {
                    return Err(WmioError::DictionaryReference(reference));
                }
                return Ok(Ref::Word(dictionary::lookup(reference).unwrap_or_else(|| {
                    warn!(reference, "unknown dictionary reference");
                    ""
                })));
            }
            let slot = r.slots.len();
            r.slots.push(None);
            r.heaps.append(Pending {
                slot,
                offset: reference,
                target,
                name,
            });
            Ok(Ref::Slot(slot))
        })
    }

    /// Load the current scope's heap (ReadHeap)
    pub fn read_heap(&mut self) -> Result<()> {
        self.guard(|r| {
            let size: u32 = r.read()?;
            let heap = r.read_bytes((size & !HEAP_SIZE_FLAG) as usize)?;
            r.heaps.top_mut().arena = heap;
            Ok(())
        })
    }

    /// Resolve every reference queued on the current scope
    ///
    /// Resolving a referent may queue further references; the loop runs until
    /// the queue stays empty.
    pub fn decode_heap(&mut self) -> Result<()> {
        self.guard(|r| {
            loop {
                let pending = r.heaps.truncate();
                if pending.is_empty() {
                    return Ok(());
                }
                trace!(
                    count = pending.len(),
                    depth = r.heaps.depth(),
                    "resolving heap references"
                );
                let heap = r.heaps.top().arena.clone();
                for p in pending {
                    let offset = p.offset as usize;
                    if offset > heap.len() {
                        return Err(WmioError::BufferUnderflow {
                            needed: offset,
                            have: heap.len(),
                        });
                    }
                    let resolved = r.within(p.name, |r| {
                        r.with_input(heap.slice(offset..), |r| r.resolve(p.target))
                    })?;
                    if let Some(slot) = r.slots.get_mut(p.slot) {
                        *slot = Some(resolved);
                    }
                }
            }
        })
    }

    fn resolve(&mut self, target: Target) -> Result<Resolved> {
        match target {
            Target::String => Ok(Resolved::Data(Data::String(self.read()?))),
            Target::Value(t) => value::decode_referent(self, t),
            Target::Property => Ok(Resolved::Property(self.read()?)),
            Target::Qualifiers => Ok(Resolved::Qualifiers(qualifier::decode_set(self)?)),
            Target::Object => Ok(Resolved::Object(self.read()?)),
        }
    }

    /// Run `f` in a fresh heap scope
    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard(|r| {
            r.heaps.push(0);
            let res = f(r);
            if let Some(heap) = r.heaps.pop() {
                if res.is_ok() {
                    let pending = heap.pending();
                    debug_assert_eq!(pending, 0, "heap scope left with unresolved references");
                    if pending > 0 {
                        warn!(pending, "heap scope left with unresolved references");
                    }
                }
            }
            res
        })
    }

    /// Run `f` over `input` instead of the current input
    pub fn with_input<T>(
        &mut self,
        input: Bytes,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let outer = mem::replace(&mut self.input, input);
        let res = f(self);
        self.input = outer;
        res
    }

    /// Run `f` over a detached byte range (DecodeWithBytes)
    pub fn decode_with_bytes<T>(
        &mut self,
        bytes: Bytes,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.guard(|r| r.with_input(bytes, f))
    }

    /// Run `f` over the next `size` bytes
    pub fn decode_with_size32<T>(
        &mut self,
        size: u32,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.guard(|r| {
            let body = r.read_bytes(size as usize)?;
            r.with_input(body, f)
        })
    }

    /// Read a length prefix that counts itself and return the body size
    pub fn read_length32(&mut self) -> Result<u32> {
        self.guard(|r| {
            let len: u32 = r.read()?;
            len.checked_sub(4).ok_or(WmioError::InvalidLength(len))
        })
    }

    /// Run `f` over a body framed by a self-inclusive u32 length
    pub fn decode_with_length32<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard(|r| {
            let size = r.read_length32()?;
            r.decode_with_size32(size, f)
        })
    }

    /// Take a resolved referent out of its slot
    pub(crate) fn take(&mut self, slot: usize) -> Result<Resolved> {
        self.slots
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or(WmioError::UnresolvedReference)
    }

    pub(crate) fn take_string(&mut self, reference: Ref) -> Result<String> {
        match reference {
            Ref::Null => Ok(String::new()),
            Ref::Word(word) => Ok(word.to_string()),
            Ref::Slot(slot) => match self.take(slot)? {
                Resolved::Data(Data::String(s)) => Ok(s),
                _ => Err(WmioError::UnresolvedReference),
            },
        }
    }

    pub(crate) fn take_object(&mut self, reference: Ref) -> Result<Object> {
        match reference {
            Ref::Null => Ok(Object::default()),
            Ref::Slot(slot) => match self.take(slot)? {
                Resolved::Object(object) => Ok(object),
                _ => Err(WmioError::UnresolvedReference),
            },
            Ref::Word(_) => Err(WmioError::UnresolvedReference),
        }
    }

    pub(crate) fn take_qualifiers(&mut self, reference: Ref) -> Result<Vec<QualifierRecord>> {
        match reference {
            Ref::Null => Ok(Vec::new()),
            Ref::Slot(slot) => match self.take(slot)? {
                Resolved::Qualifiers(records) => Ok(records),
                _ => Err(WmioError::UnresolvedReference),
            },
            Ref::Word(_) => Err(WmioError::UnresolvedReference),
        }
    }
}
