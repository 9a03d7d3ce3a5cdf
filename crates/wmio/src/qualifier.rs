//! Qualifiers
//!
//! A qualifier set is a u32 length that counts itself followed by qualifier
//! records:
//!
//! ```text
//! name: ref
//! flavor: u8
//! type: u32        # inherited bit always clear
//! value            # inline scalar or reference
//! ```
//!
//! Sets that live on the heap get a fixed reservation of
//! [`qualifier_set_size`] bytes.

use crate::decode::{Ref, Target};
use crate::value::{self, CimType, PendingValue, Value};
use crate::{Decode, Decoder, Encode, Encoder, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Qualifier propagation and override flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flavor(pub u8);

impl Flavor {
    pub const PROPAGATE_TO_INSTANCE: Flavor = Flavor(0x01);
    /// ToSubclass
    pub const PROPAGATE_TO_DERIVED_CLASS: Flavor = Flavor(0x02);
    /// DisableOverride
    pub const NOT_OVERRIDABLE: Flavor = Flavor(0x10);
    pub const ORIGIN_PROPAGATED: Flavor = Flavor(0x20);
    pub const ORIGIN_SYSTEM: Flavor = Flavor(0x40);
    /// Translatable
    pub const AMENDED: Flavor = Flavor(0x80);

    pub fn contains(self, other: Flavor) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flavor {
    type Output = Flavor;

    fn bitor(self, rhs: Flavor) -> Flavor {
        Flavor(self.0 | rhs.0)
    }
}

/// MOF flavor keywords
impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Flavor::PROPAGATE_TO_DERIVED_CLASS) {
            f.write_str("tosubclass")?;
        } else {
            f.write_str("restricted")?;
        }
        if self.contains(Flavor::NOT_OVERRIDABLE) {
            f.write_str(" disableoverride")?;
        } else {
            f.write_str(" enableoverride")?;
        }
        if self.contains(Flavor::AMENDED) {
            f.write_str(" translatable")?;
        }
        Ok(())
    }
}

/// A named, typed annotation on a class, property, method or instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Qualifier {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "flavour")]
    pub flavor: Flavor,
    pub value: Value,
}

impl Qualifier {
    pub fn new(name: impl Into<String>, flavor: Flavor, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            flavor,
            value: value.into(),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.cim_type == CimType::BOOLEAN {
            f.write_str(&self.name)
        } else if self.value.cim_type.is_array() {
            write!(f, "{} {{{}}}", self.name, self.value)
        } else {
            write!(f, "{}({})", self.name, self.value)
        }
    }
}

/// Heap reservation for a qualifier set (QualifierSetSize)
pub fn qualifier_set_size(qualifiers: &[Qualifier]) -> usize {
    4 + 20 * qualifiers.len()
}

/// Fix class offsets inside object-typed qualifier values
pub(crate) fn fix_offsets(qualifiers: &mut [Qualifier]) {
    for qualifier in qualifiers {
        qualifier.value.data.fix_offsets();
    }
}

impl Encode for Qualifier {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("qualifier", |w| {
            w.write_string_ref(&self.name)?;
            w.write(&self.flavor.0)?;
            w.write(&self.value.cim_type.to_wire())?;
            w.write(&self.value)
        })
    }
}

/// Qualifier set
impl Encode for [Qualifier] {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.encode_with_length32(|w| self.iter().try_for_each(|q| w.write(q)))
    }
}

/// A decoded qualifier whose name and value may still sit on the heap
#[derive(Debug)]
pub(crate) struct QualifierRecord {
    name: Ref,
    flavor: Flavor,
    cim_type: CimType,
    value: PendingValue,
}

impl QualifierRecord {
    pub(crate) fn link(self, r: &mut Decoder) -> Result<Qualifier> {
        Ok(Qualifier {
            name: r.take_string(self.name)?,
            flavor: self.flavor,
            value: Value {
                cim_type: self.cim_type,
                data: self.value.link(r)?,
            },
        })
    }
}

impl Decode for QualifierRecord {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("qualifier", |r| {
            let name = r.read_ref(Target::String, "name")?;
            let flavor = Flavor(r.read()?);
            let cim_type = CimType::from_wire(r.read()?)?;
            let value = value::decode_value(r, cim_type)?;
            Ok(Self {
                name,
                flavor,
                cim_type,
                value,
            })
        })
    }
}

/// Read a qualifier set
pub(crate) fn decode_set(r: &mut Decoder) -> Result<Vec<QualifierRecord>> {
    r.decode_with_length32(|r| {
        let mut records = Vec::new();
        while r.remaining() > 0 {
            records.push(r.read()?);
        }
        Ok(records)
    })
}

/// Resolve a decoded qualifier set
pub(crate) fn link_set(r: &mut Decoder, records: Vec<QualifierRecord>) -> Result<Vec<Qualifier>> {
    records.into_iter().map(|q| q.link(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Data;

    #[test]
    fn test_flavor_display() {
        assert_eq!(Flavor::default().to_string(), "restricted enableoverride");
        assert_eq!(
            (Flavor::PROPAGATE_TO_DERIVED_CLASS | Flavor::NOT_OVERRIDABLE | Flavor::AMENDED)
                .to_string(),
            "tosubclass disableoverride translatable"
        );
    }

    #[test]
    fn test_qualifier_display() {
        assert_eq!(Qualifier::new("key", Flavor::default(), true).to_string(), "key");
        assert_eq!(
            Qualifier::new("MaxLen", Flavor::default(), 256i32).to_string(),
            "MaxLen(256)"
        );
        assert_eq!(
            Qualifier::new("ValueMap", Flavor::default(), vec!["0".to_string(), "1".to_string()])
                .to_string(),
            "ValueMap {\"0\", \"1\"}"
        );
    }

    #[test]
    fn test_qualifier_set_wire() {
        let set = vec![Qualifier::new(
            "key",
            Flavor::PROPAGATE_TO_DERIVED_CLASS,
            true,
        )];
        let mut w = Encoder::new();
        w.write(&set[..]).unwrap();
        assert_eq!(
            w.as_bytes(),
            &[
                15, 0, 0, 0, // length
                0x01, 0x00, 0x00, 0x80, // "key" from the dictionary
                0x02, // flavor
                11, 0, 0, 0, // boolean
                0xFF, 0xFF, // true
            ]
        );
        assert_eq!(w.heap_len(), 0);

        let mut r = Decoder::new(w.finish().unwrap());
        let records = decode_set(&mut r).unwrap();
        let decoded = link_set(&mut r, records).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn test_heap_resident_set_padding() {
        let set = vec![Qualifier::new("CIMTYPE", Flavor::default(), "uint32")];
        let mut w = Encoder::new();
        w.with_scope(|w| {
            w.write_on_heap(qualifier_set_size(&set), |w| w.write(&set[..]))?;
            w.write_heap()
        })
        .unwrap();
        let out = w.finish().unwrap();
        // 24 reserved bytes inline, "uint32" at the start of the scope heap
        assert_eq!(&out[..4], &[17, 0, 0, 0]);
        assert_eq!(&out[13..17], &[0, 0, 0, 0]);
        assert_eq!(&out[17..24], &[0; 7]);
        assert_eq!(&out[24..28], &[8, 0, 0, 0x80]);

        let mut r = Decoder::new(out);
        let decoded = r
            .with_scope(|r| {
                let records = decode_set(r)?;
                r.read_bytes(7)?;
                r.read_heap()?;
                r.decode_heap()?;
                link_set(r, records)
            })
            .unwrap();
        assert_eq!(decoded[0].name, "CIMTYPE");
        assert_eq!(decoded[0].value.data, Data::from("uint32"));
    }
}
