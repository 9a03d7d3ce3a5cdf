//! Methods
//!
//! A method list is a u32 length that counts itself, with its own heap scope:
//!
//! ```text
//! count: u16
//! pad: u16
//! methods           # count records
//! heap
//! ```
//!
//! Method record:
//!
//! ```text
//! name: ref
//! flags: u8, pad: [u8; 3]
//! origin: u32
//! qualifiers: ref       # reserved qualifier set
//! input_signature: ref  # object
//! output_signature: ref # object
//! ```

use crate::decode::{Ref, Target};
use crate::object::Object;
use crate::qualifier::{self, qualifier_set_size, Qualifier};
use crate::{Decode, Decoder, Encode, Encoder, Result};
use serde::{Deserialize, Serialize};

/// A class method; the signatures are objects whose properties are the
/// parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Method {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub flags: u8,
    pub origin: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    pub input_signature: Object,
    pub output_signature: Object,
}

impl Encode for Method {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.within("method", |w| {
            w.write_string_ref(&self.name)?;
            w.write(&self.flags)?;
            w.write_bytes(&[0; 3])?;
            w.write(&self.origin)?;
            w.write_ref_with(|w| {
                w.write_on_heap(qualifier_set_size(&self.qualifiers), |w| {
                    w.write(&self.qualifiers[..])
                })
            })?;
            w.within("input_signature", |w| self.input_signature.encode_ref(w))?;
            w.within("output_signature", |w| self.output_signature.encode_ref(w))
        })
    }
}

#[derive(Debug)]
struct MethodRecord {
    name: Ref,
    flags: u8,
    origin: u32,
    qualifiers: Ref,
    input_signature: Ref,
    output_signature: Ref,
}

impl Decode for MethodRecord {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.within("method", |r| {
            let name = r.read_ref(Target::String, "name")?;
            let flags = r.read()?;
            r.read_bytes(3)?;
            Ok(Self {
                name,
                flags,
                origin: r.read()?,
                qualifiers: r.read_ref(Target::Qualifiers, "qualifiers")?,
                input_signature: r.read_ref(Target::Object, "input_signature")?,
                output_signature: r.read_ref(Target::Object, "output_signature")?,
            })
        })
    }
}

impl MethodRecord {
    fn link(self, r: &mut Decoder) -> Result<Method> {
        let qualifiers = r.take_qualifiers(self.qualifiers)?;
        Ok(Method {
            name: r.take_string(self.name)?,
            flags: self.flags,
            origin: self.origin,
            qualifiers: qualifier::link_set(r, qualifiers)?,
            input_signature: r.take_object(self.input_signature)?,
            output_signature: r.take_object(self.output_signature)?,
        })
    }
}

/// A class's method list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Methods {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Method>,
}

impl Methods {
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl Encode for Methods {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        w.encode_with_length32(|w| {
            w.with_scope(|w| {
                w.within("methods", |w| {
                    w.write(&(self.methods.len() as u16))?;
                    w.write(&0u16)?;
                    for method in &self.methods {
                        w.write(method)?;
                    }
                    w.write_heap()
                })
            })
        })
    }
}

impl Decode for Methods {
    fn decode(r: &mut Decoder) -> Result<Self> {
        r.decode_with_length32(|r| {
            r.with_scope(|r| {
                r.within("methods", |r| {
                    let count: u16 = r.read()?;
                    let _pad: u16 = r.read()?;
                    let records = (0..count)
                        .map(|_| r.read::<MethodRecord>())
                        .collect::<Result<Vec<_>>>()?;
                    r.read_heap()?;
                    r.decode_heap()?;
                    let methods = records
                        .into_iter()
                        .map(|m| m.link(r))
                        .collect::<Result<_>>()?;
                    Ok(Methods { methods })
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::Flavor;
    use crate::value::{CimType, Value};
    use crate::{Class, Instance, ObjectClass, Property};

    fn signature(class_name: &str, parameter: &str) -> Object {
        let mut class = Class::new(class_name);
        class.push_property(Property::new(parameter, Value::null(CimType::STRING)));
        Object {
            class: Some(ObjectClass {
                current_class: class,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip() {
        let methods = Methods {
            methods: vec![
                Method {
                    name: "Create".into(),
                    flags: 1,
                    origin: 3,
                    qualifiers: vec![
                        Qualifier::new("Static", Flavor::default(), true),
                        Qualifier::new("ValueMap", Flavor::default(), vec!["0".to_string(), "2".to_string()]),
                    ],
                    input_signature: signature("__PARAMETERS", "CommandLine"),
                    output_signature: signature("__PARAMETERS", "ReturnValue"),
                },
                Method {
                    name: "Terminate".into(),
                    ..Default::default()
                },
            ],
        };

        let mut w = Encoder::new();
        w.write(&methods).unwrap();
        let mut r = Decoder::new(w.finish().unwrap());
        let decoded: Methods = r.read().unwrap();
        assert_eq!(decoded, methods);
        assert_eq!(r.heap_depth(), 1);
    }

    #[test]
    fn test_empty_signature_is_null_ref() {
        let method = Method {
            name: "key".into(),
            ..Default::default()
        };
        let mut w = Encoder::new();
        w.with_scope(|w| w.write(&method)).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(&out[..4], &[0x01, 0x00, 0x00, 0x80]);
        assert_eq!(&out[out.len() - 8..], &[0xFF; 8]);
    }

    #[test]
    fn test_signature_with_instance() {
        let mut class = Class::new("__PARAMETERS");
        class.push_property(Property::new("ReturnValue", Value::null(CimType::UINT32)));
        let instance = Instance {
            class_name: class.name.clone(),
            properties: vec![Property::new("ReturnValue", 0u32)],
            current_class: class,
            ..Default::default()
        };
        let methods = Methods {
            methods: vec![Method {
                name: "StopService".into(),
                output_signature: Object {
                    instance: Some(instance),
                    ..Default::default()
                },
                ..Default::default()
            }],
        };

        let mut w = Encoder::new();
        w.write(&methods).unwrap();
        let mut r = Decoder::new(w.finish().unwrap());
        assert_eq!(r.read::<Methods>().unwrap(), methods);
    }
}
