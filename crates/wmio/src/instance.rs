//! Instances
//!
//! The instance's class is written first, then a body inside a u32 length
//! that counts itself, with its own heap scope:
//!
//! ```text
//! flags: u8
//! class_name: ref
//! nd table, value table     # class layout
//! qualifiers                # qualifier set
//! property qualifiers: u8   # 0x01 none, 0x02 one set per property follows
//! heap
//! ```

use crate::decode::Target;
use crate::property::Property;
use crate::qualifier::{self, Qualifier};
use crate::table::{self, NdFlags, Slot};
use crate::value::Value;
use crate::{Class, Decode, Decoder, Encode, Encoder, Result, WmioError};
use serde::{Deserialize, Serialize};

/// No per-property qualifier sets follow
pub const NO_PROPERTY_QUALIFIERS: u8 = 0x01;

/// One qualifier set per property follows
pub const PROPERTY_QUALIFIERS: u8 = 0x02;

fn is_zero(v: &u8) -> bool {
    *v == 0
}

/// Property values for one object of a class
///
/// `properties` parallels `current_class.properties`. A nullable or
/// inherit-default property carries no value on the wire and decodes as
/// [`Value::null`] of the class property's type; the class default itself
/// stays on the matching property of `current_class`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub current_class: Class,
    #[serde(skip_serializing_if = "is_zero")]
    pub flags: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl Instance {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn encode_body(&self, w: &mut Encoder) -> Result<()> {
        w.write(&self.flags)?;
        w.write_string_ref(&self.class_name)?;

        let slots = self.current_class.layout();
        let flags: Vec<NdFlags> = self.properties.iter().map(Property::nd_flags).collect();
        let values: Vec<&Value> = self.properties.iter().map(|p| &p.value).collect();
        w.within("nd_value_table", |w| {
            table::write_nd_table(w, &flags)?;
            table::write_value_table(w, &slots, &flags, &values)
        })?;

        w.write(&self.qualifiers[..])?;
        if self.properties.iter().any(|p| !p.qualifiers.is_empty()) {
            w.write(&PROPERTY_QUALIFIERS)?;
            for property in &self.properties {
                w.write(&property.qualifiers[..])?;
            }
        } else {
            w.write(&NO_PROPERTY_QUALIFIERS)?;
        }

        w.write_heap()
    }
}

impl Encode for Instance {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("instance", |w| {
            let expected = self.current_class.properties.len();
            if self.properties.len() != expected {
                return Err(WmioError::PropertyCount {
                    expected,
                    found: self.properties.len(),
                });
            }
            w.write(&self.current_class)?;
            w.encode_with_length32(|w| w.with_scope(|w| w.within("body", |w| self.encode_body(w))))
        })
    }
}

impl Decode for Instance {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("instance", |r| {
            let current_class: Class = r.read()?;
            r.decode_with_length32(|r| {
                r.with_scope(|r| r.within("body", |r| decode_body(r, current_class)))
            })
        })
    }
}

fn decode_body(r: &mut Decoder, current_class: Class) -> Result<Instance> {
    let flags: u8 = r.read()?;
    let class_name = r.read_ref(Target::String, "class_name")?;

    let slots: Vec<Slot> = current_class.properties.iter().map(Property::slot).collect();
    let count = slots.len();
    let (nd, values) = r.decode_with_size32(current_class.nd_value_size, |r| {
        r.within("nd_value_table", |r| {
            let nd = table::read_nd_table(r, count)?;
            let values = table::read_value_table(r, &slots, &nd)?;
            Ok((nd, values))
        })
    })?;

    let qualifiers = qualifier::decode_set(r)?;
    let mut property_qualifiers = Vec::new();
    match r.read::<u8>()? {
        NO_PROPERTY_QUALIFIERS => {}
        PROPERTY_QUALIFIERS => {
            for _ in 0..count {
                property_qualifiers.push(qualifier::decode_set(r)?);
            }
        }
        other => return Err(WmioError::InvalidQualifierFlags(other)),
    }

    r.read_heap()?;
    r.decode_heap()?;

    let class_name = r.take_string(class_name)?;
    let qualifiers = qualifier::link_set(r, qualifiers)?;
    let mut property_qualifiers = property_qualifiers.into_iter();
    let mut properties = Vec::with_capacity(count);
    for ((class_property, nd), value) in current_class.properties.iter().zip(nd).zip(values) {
        let cim_type = class_property.cim_type();
        let value = match value {
            Some(value) => Value {
                cim_type,
                data: value.link(r)?,
            },
            None => Value::null(cim_type),
        };
        let qualifiers = match property_qualifiers.next() {
            Some(records) => qualifier::link_set(r, records)?,
            None => Vec::new(),
        };
        properties.push(Property {
            name: class_property.name.clone(),
            qualifiers,
            nullable: nd.nullable,
            inherit_default: nd.inherit_default,
            value,
            ..Default::default()
        });
    }

    Ok(Instance {
        current_class,
        flags,
        class_name,
        properties,
        qualifiers,
    })
}
