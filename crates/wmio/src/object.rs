//! Objects
//!
//! An object is a u32 size (not counting itself) followed by a flags byte
//! and the parts the flags announce, in this order:
//!
//! | Flag   | Part          |
//! |--------|---------------|
//! | `0x04` | decoration    |
//! | `0x01` | object class  |
//! | `0x02` | instance      |

use crate::qualifier;
use crate::{Class, Decode, Decoder, Encode, Encoder, Instance, Methods, Result, WmioError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OBJECT_FLAG_CLASS: u8 = 0x01;
pub const OBJECT_FLAG_INSTANCE: u8 = 0x02;
pub const OBJECT_FLAG_DECORATION: u8 = 0x04;

const OBJECT_FLAGS: u8 = OBJECT_FLAG_CLASS | OBJECT_FLAG_INSTANCE | OBJECT_FLAG_DECORATION;

/// Origin of an object
///
/// Both strings are written inline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Decoration {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl Encode for Decoration {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("decoration", |w| {
            w.write_string(&self.server_name)?;
            w.write_string(&self.namespace)
        })
    }
}

impl Decode for Decoration {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("decoration", |r| {
            Ok(Self {
                server_name: r.read()?,
                namespace: r.read()?,
            })
        })
    }
}

/// A class together with its parent class and both method lists
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectClass {
    pub parent_class: Class,
    pub parent_class_methods: Methods,
    pub current_class: Class,
    pub current_class_methods: Methods,
}

impl Encode for ObjectClass {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("object_class", |w| {
            w.write(&self.parent_class)?;
            w.write(&self.parent_class_methods)?;
            w.write(&self.current_class)?;
            w.write(&self.current_class_methods)
        })
    }
}

impl Decode for ObjectClass {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("object_class", |r| {
            Ok(Self {
                parent_class: r.read()?,
                parent_class_methods: r.read()?,
                current_class: r.read()?,
                current_class_methods: r.read()?,
            })
        })
    }
}

/// Top-level WMIO object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoration: Option<Decoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ObjectClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
}

impl Object {
    /// An object with no parts; written as a null reference
    pub fn is_empty(&self) -> bool {
        self.decoration.is_none() && self.class.is_none() && self.instance.is_none()
    }

    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.class.is_some() {
            flags |= OBJECT_FLAG_CLASS;
        }
        if self.instance.is_some() {
            flags |= OBJECT_FLAG_INSTANCE;
        }
        if self.decoration.is_some() {
            flags |= OBJECT_FLAG_DECORATION;
        }
        flags
    }

    /// Store the value table layout of every class in this object
    ///
    /// See [`Class::fix_offsets`]. [`marshal`](crate::marshal) calls this
    /// before encoding.
    pub fn fix_offsets(&mut self) {
        if let Some(class) = &mut self.class {
            class.parent_class.fix_offsets();
            class.current_class.fix_offsets();
            let methods = class
                .parent_class_methods
                .methods
                .iter_mut()
                .chain(class.current_class_methods.methods.iter_mut());
            for method in methods {
                qualifier::fix_offsets(&mut method.qualifiers);
                method.input_signature.fix_offsets();
                method.output_signature.fix_offsets();
            }
        }
        if let Some(instance) = &mut self.instance {
            instance.current_class.fix_offsets();
            qualifier::fix_offsets(&mut instance.qualifiers);
            for property in &mut instance.properties {
                property.value.data.fix_offsets();
                qualifier::fix_offsets(&mut property.qualifiers);
            }
        }
    }

    /// Write a reference to this object, or a null reference when empty
    pub(crate) fn encode_ref(&self, w: &mut Encoder) -> Result<()> {
        if self.is_empty() {
            w.write_null_ref()
        } else {
            w.write_ref_with(|w| w.write(self))
        }
    }
}

impl Encode for Object {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("object", |w| {
            w.encode_with_size32(|w| {
                w.within("cim", |w| {
                    w.write(&self.flags())?;
                    if let Some(decoration) = &self.decoration {
                        w.write(decoration)?;
                    }
                    if let Some(class) = &self.class {
                        w.write(class)?;
                    }
                    if let Some(instance) = &self.instance {
                        w.write(instance)?;
                    }
                    Ok(())
                })
            })
        })
    }
}

impl Decode for Object {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("object", |r| r.nested(decode_object))
    }
}

fn decode_object(r: &mut Decoder) -> Result<Object> {
    let size: u32 = r.read()?;
    r.decode_with_size32(size, |r| {
        r.within("cim", |r| {
            let flags: u8 = r.read()?;
            if flags & !OBJECT_FLAGS != 0 {
                return Err(WmioError::InvalidObjectFlags(flags));
            }
            let mut object = Object::default();
            if flags & OBJECT_FLAG_DECORATION != 0 {
                object.decoration = Some(r.read()?);
            }
            if flags & OBJECT_FLAG_CLASS != 0 {
                object.class = Some(r.read()?);
            }
            if flags & OBJECT_FLAG_INSTANCE != 0 {
                object.instance = Some(r.read()?);
            }
            Ok(object)
        })
    })
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.instance, &self.class) {
            (Some(instance), _) => write!(f, "instance of {}", instance.class_name),
            (None, Some(class)) => write!(f, "class {}", class.current_class.name),
            (None, None) => f.write_str("object"),
        }
    }
}
