//! ND table and value table
//!
//! Classes and instances store their property values in one flat region:
//!
//! ```text
//! nd table     ceil(n / 4) bytes, 2 bits per property
//!              bit 0 = nullable, bit 1 = inherit default
//! value table  one slot per property at the class offset,
//!              sized by the property type
//! ```
//!
//! Slots of nullable and defaulted properties are filled with `0xFF`.

use crate::value::{self, CimType, PendingValue, Value};
use crate::{Decoder, Encoder, Result, WmioError};

/// ND bits of one property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NdFlags {
    pub(crate) nullable: bool,
    pub(crate) inherit_default: bool,
}

impl NdFlags {
    /// Whether the value slot carries no value
    pub(crate) fn is_default(&self) -> bool {
        self.nullable || self.inherit_default
    }

    fn bits(&self) -> u8 {
        u8::from(self.nullable) | u8::from(self.inherit_default) << 1
    }
}

/// Position of a property's value slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) cim_type: CimType,
    pub(crate) offset: u32,
}

impl Slot {
    fn range(&self, table_len: usize) -> Result<std::ops::Range<usize>> {
        let start = self.offset as usize;
        let end = start + self.cim_type.value_size();
        if end > table_len {
            return Err(WmioError::BufferOverflow {
                needed: end,
                have: table_len,
            });
        }
        Ok(start..end)
    }
}

/// Size of the nd table for `count` properties
pub(crate) fn nd_table_size(count: usize) -> usize {
    count.div_ceil(4)
}

/// Size of the value table for `slots`
pub(crate) fn value_table_size(slots: &[Slot]) -> usize {
    slots.iter().map(|s| s.cim_type.value_size()).sum()
}

pub(crate) fn write_nd_table(w: &mut Encoder, flags: &[NdFlags]) -> Result<()> {
    for chunk in flags.chunks(4) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, f)| acc | f.bits() << (i * 2));
        w.write(&byte)?;
    }
    Ok(())
}

pub(crate) fn read_nd_table(r: &mut Decoder, count: usize) -> Result<Vec<NdFlags>> {
    let mut flags = Vec::with_capacity(count);
    let mut cur = 0u8;
    for i in 0..count {
        if i % 4 == 0 {
            cur = r.read()?;
        }
        let bits = cur >> ((i % 4) * 2);
        flags.push(NdFlags {
            nullable: bits & 0x01 != 0,
            inherit_default: bits & 0x02 != 0,
        });
    }
    Ok(flags)
}

/// Write the value table; `values[i]` goes to `slots[i]`
///
/// Values must carry their slot's type. References inside the values go to
/// the current heap scope.
pub(crate) fn write_value_table(
    w: &mut Encoder,
    slots: &[Slot],
    flags: &[NdFlags],
    values: &[&Value],
) -> Result<()> {
    let mut table = vec![0u8; value_table_size(slots)];
    for ((slot, nd), value) in slots.iter().zip(flags).zip(values) {
        let range = slot.range(table.len())?;
        if nd.is_default() {
            table[range].fill(0xFF);
            continue;
        }
        if value.cim_type != slot.cim_type {
            return Err(WmioError::TypeMismatch {
                expected: slot.cim_type,
                found: value.cim_type,
            });
        }
        let bytes = w.encode_detached(|w| w.write(*value))?;
        if bytes.len() != range.len() {
            return Err(WmioError::BufferOverflow {
                needed: bytes.len(),
                have: range.len(),
            });
        }
        table[range].copy_from_slice(&bytes);
    }
    w.write_bytes(&table)
}

/// Read the value table that fills the rest of the input
///
/// Defaulted properties get `None`.
pub(crate) fn read_value_table(
    r: &mut Decoder,
    slots: &[Slot],
    flags: &[NdFlags],
) -> Result<Vec<Option<PendingValue>>> {
    let table = r.read_bytes(r.remaining())?;
    slots
        .iter()
        .zip(flags)
        .map(|(slot, nd)| {
            if nd.is_default() {
                return Ok(None);
            }
            let range = slot.range(table.len())?;
            r.decode_with_bytes(table.slice(range), |r| value::decode_value(r, slot.cim_type))
                .map(Some)
        })
        .collect()
}
