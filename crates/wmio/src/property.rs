//! Properties
//!
//! A class property record is two references: the name, and a heap
//! sub-record holding the rest of the definition:
//!
//! ```text
//! type: u32             # | 0x4000 when inherited
//! order: u16
//! offset: u32           # value table slot
//! class_of_origin: u32
//! qualifiers            # reserved qualifier set
//! ```
//!
//! Property values live in the owning class or instance value table.

use crate::decode::{Ref, Resolved, Target};
use crate::qualifier::{self, qualifier_set_size, Qualifier, QualifierRecord};
use crate::table::{NdFlags, Slot};
use crate::value::{CimType, Value, CIM_INHERITED};
use crate::{Decode, Decoder, Encoder, Result, WmioError};
use serde::{Deserialize, Serialize};

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !v
}

/// A class or instance property
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub order: u16,
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub class_of_origin: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub inherit_default: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub inherited: bool,
    pub value: Value,
}

impl Property {
    /// A property holding `value`; a `Null` value makes it nullable
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            nullable: value.data.is_null(),
            value,
            ..Default::default()
        }
    }

    pub fn cim_type(&self) -> CimType {
        self.value.cim_type
    }

    pub(crate) fn nd_flags(&self) -> NdFlags {
        NdFlags {
            nullable: self.nullable,
            inherit_default: self.inherit_default,
        }
    }

    pub(crate) fn slot(&self) -> Slot {
        Slot {
            cim_type: self.value.cim_type,
            offset: self.offset,
        }
    }

    /// Write the class property record with its value slot at `offset`
    pub(crate) fn encode_record(&self, w: &mut Encoder, offset: u32) -> Result<()> {
        w.within("property", |w| {
            w.write_string_ref(&self.name)?;
            w.write_ref_with(|w| {
                w.within("property.*", |w| {
                    let mut cim_type = self.value.cim_type.to_wire();
                    if self.inherited {
                        cim_type |= CIM_INHERITED;
                    }
                    w.write(&cim_type)?;
                    w.write(&self.order)?;
                    w.write(&offset)?;
                    w.write(&self.class_of_origin)?;
                    w.write_on_heap(qualifier_set_size(&self.qualifiers), |w| {
                        w.write(&self.qualifiers[..])
                    })
                })
            })
        })
    }
}

/// Decoded property sub-record
#[derive(Debug, Default)]
pub(crate) struct PropertyData {
    cim_type: CimType,
    inherited: bool,
    order: u16,
    offset: u32,
    class_of_origin: u32,
    qualifiers: Vec<QualifierRecord>,
}

impl Decode for PropertyData {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("property.*", |r| {
            let raw: u32 = r.read()?;
            Ok(Self {
                cim_type: CimType::from_wire(raw)?,
                inherited: raw & CIM_INHERITED != 0,
                order: r.read()?,
                offset: r.read()?,
                class_of_origin: r.read()?,
                qualifiers: qualifier::decode_set(r)?,
            })
        })
    }
}

/// Decoded class property record
#[derive(Debug)]
pub(crate) struct PropertyRecord {
    name: Ref,
    data: Ref,
}

impl Decode for PropertyRecord {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("property", |r| {
            Ok(Self {
                name: r.read_ref(Target::String, "name")?,
                data: r.read_ref(Target::Property, "data")?,
            })
        })
    }
}

impl PropertyRecord {
    /// Build the property once the class heap is decoded; the value is
    /// filled in from the value table later
    pub(crate) fn link(self, r: &mut Decoder) -> Result<Property> {
        let name = r.take_string(self.name)?;
        let data = match self.data {
            Ref::Null => PropertyData::default(),
            Ref::Slot(slot) => match r.take(slot)? {
                Resolved::Property(data) => data,
                _ => return Err(WmioError::UnresolvedReference),
            },
            Ref::Word(_) => return Err(WmioError::UnresolvedReference),
        };
        Ok(Property {
            name,
            order: data.order,
            offset: data.offset,
            class_of_origin: data.class_of_origin,
            qualifiers: qualifier::link_set(r, data.qualifiers)?,
            inherited: data.inherited,
            value: Value::null(data.cim_type),
            ..Default::default()
        })
    }
}
