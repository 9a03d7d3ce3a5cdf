//! Class definitions
//!
//! Wire format (inside a u32 length that counts itself, own heap scope):
//!
//! ```text
//! pad: u8
//! name: ref
//! nd_value_size: u32
//! derivation        # length32 framed: (string, u32 encoded length)*
//! qualifiers        # qualifier set
//! count: u32
//! properties        # count * (name ref, sub-record ref)
//! nd table, value table
//! heap
//! ```

use crate::decode::Target;
use crate::property::{Property, PropertyRecord};
use crate::qualifier::{self, Qualifier};
use crate::strings;
use crate::table::{self, NdFlags, Slot};
use crate::value::Value;
use crate::{Decode, Decoder, Encode, Encoder, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A CIM class definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Class {
    /// Encoded class body as read from the wire, for diagnostics only
    #[serde(skip)]
    pub raw: Bytes,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Size of the nd table plus value table, as read from the wire
    #[serde(skip)]
    pub nd_value_size: u32,
    /// Ancestor class names, nearest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub derivation: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

/// `raw` and `nd_value_size` are derived from the other fields
impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.derivation == other.derivation
            && self.qualifiers == other.qualifiers
            && self.properties == other.properties
    }
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a property after the existing ones
    ///
    /// The property gets the next order and the next free value table slot.
    pub fn push_property(&mut self, mut property: Property) -> &mut Self {
        property.order = self.properties.len() as u16;
        property.offset = self
            .layout()
            .iter()
            .map(|s| s.offset + s.cim_type.value_size() as u32)
            .max()
            .unwrap_or(0);
        self.properties.push(property);
        self.nd_value_size = self.computed_nd_value_size() as u32;
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Value table slots
    ///
    /// When every property offset is zero the properties are laid out
    /// sequentially in declaration order.
    pub(crate) fn layout(&self) -> Vec<Slot> {
        if self.properties.iter().all(|p| p.offset == 0) {
            let mut offset = 0;
            self.properties
                .iter()
                .map(|p| {
                    let slot = Slot {
                        cim_type: p.cim_type(),
                        offset,
                    };
                    offset += p.cim_type().value_size() as u32;
                    slot
                })
                .collect()
        } else {
            self.properties.iter().map(Property::slot).collect()
        }
    }

    pub fn value_table_size(&self) -> usize {
        self.properties.iter().map(|p| p.cim_type().value_size()).sum()
    }

    /// Store the value table layout in the property offsets
    ///
    /// A class whose offsets are all zero is written with a sequential
    /// layout; afterwards its offsets match what decoding gives back.
    /// Classes inside object-typed values and qualifiers are fixed too.
    pub fn fix_offsets(&mut self) {
        let slots = self.layout();
        for (property, slot) in self.properties.iter_mut().zip(slots) {
            property.offset = slot.offset;
            property.value.data.fix_offsets();
            qualifier::fix_offsets(&mut property.qualifiers);
        }
        qualifier::fix_offsets(&mut self.qualifiers);
        self.nd_value_size = self.computed_nd_value_size() as u32;
    }

    fn computed_nd_value_size(&self) -> usize {
        table::nd_table_size(self.properties.len()) + self.value_table_size()
    }
}

impl Encode for Class {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.encode_with_length32(|w| {
            w.with_scope(|w| {
                w.within("class", |w| {
                    let slots = self.layout();
                    w.write(&0u8)?;
                    w.write_string_ref(&self.name)?;
                    w.write(&(self.computed_nd_value_size() as u32))?;
                    w.encode_with_length32(|w| {
                        w.within("derivation", |w| {
                            self.derivation.iter().try_for_each(|d| {
                                w.write_string(d)?;
                                w.write(&(strings::encoded_len(d) as u32))
                            })
                        })
                    })?;
                    w.write(&self.qualifiers[..])?;
                    w.write(&(self.properties.len() as u32))?;
                    for (property, slot) in self.properties.iter().zip(&slots) {
                        property.encode_record(w, slot.offset)?;
                    }
                    let flags: Vec<NdFlags> = self.properties.iter().map(Property::nd_flags).collect();
                    let values: Vec<&Value> = self.properties.iter().map(|p| &p.value).collect();
                    w.within("nd_value_table", |w| {
                        table::write_nd_table(w, &flags)?;
                        table::write_value_table(w, &slots, &flags, &values)
                    })?;
                    w.write_heap()
                })
            })
        })
    }
}

impl Decode for Class {
    fn decode(r: &mut Decoder) -> Result<Self> {
        let size = r.read_length32()?;
        let raw = r.read_bytes(size as usize)?;
        let mut class = r.decode_with_bytes(raw.clone(), |r| {
            r.with_scope(|r| r.within("class", decode_body))
        })?;
        class.raw = raw;
        Ok(class)
    }
}

fn decode_body(r: &mut Decoder) -> Result<Class> {
    let _pad: u8 = r.read()?;
    let name = r.read_ref(Target::String, "name")?;
    let nd_value_size: u32 = r.read()?;
    let derivation = r.decode_with_length32(|r| {
        r.within("derivation", |r| {
            let mut derivation = Vec::new();
            while r.remaining() > 0 {
                derivation.push(r.read()?);
                let _len: u32 = r.read()?;
            }
            Ok(derivation)
        })
    })?;
    let qualifiers = qualifier::decode_set(r)?;
    let count = r.read::<u32>()? as usize;

    // property records are decoded once the heap is loaded
    let records = r.read_bytes(count.saturating_mul(8))?;
    let nd_values = r.read_bytes(nd_value_size as usize)?;
    r.read_heap()?;
    let records: Vec<PropertyRecord> =
        r.decode_with_bytes(records, |r| (0..count).map(|_| r.read()).collect())?;
    r.decode_heap()?;

    let name = r.take_string(name)?;
    let qualifiers = qualifier::link_set(r, qualifiers)?;
    let mut properties = records
        .into_iter()
        .map(|p| p.link(r))
        .collect::<Result<Vec<_>>>()?;

    // value references go to the same heap
    let slots: Vec<Slot> = properties.iter().map(Property::slot).collect();
    let (flags, values) = r.decode_with_bytes(nd_values, |r| {
        r.within("nd_value_table", |r| {
            let flags = table::read_nd_table(r, count)?;
            let values = table::read_value_table(r, &slots, &flags)?;
            Ok((flags, values))
        })
    })?;
    r.decode_heap()?;

    for ((property, nd), value) in properties.iter_mut().zip(flags).zip(values) {
        property.nullable = nd.nullable;
        property.inherit_default = nd.inherit_default;
        if let Some(value) = value {
            property.value.data = value.link(r)?;
        }
    }

    Ok(Class {
        raw: Bytes::new(),
        name,
        nd_value_size,
        derivation,
        qualifiers,
        properties,
    })
}
