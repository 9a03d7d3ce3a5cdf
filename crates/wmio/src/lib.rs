//! WMIO (WMI object) encoding library
//!
//! This crate encodes and decodes the CIM class and instance objects that
//! MS-WMI carries inside DCOM calls, as specified in MS-WMIO.
//!
//! # WMIO Wire Format
//!
//! - All integers are little-endian and unaligned
//! - A marshaled object starts with the `78 56 34 12` signature
//! - Strings, arrays and nested objects live on a heap that follows each
//!   encoded part; the part itself holds a u32 offset into that heap
//! - Offsets with the high bit set name well-known strings from a fixed
//!   dictionary instead
//! - Class and instance values are stored in a null/default table followed by
//!   a fixed-width value table laid out by the class
//!
//! # Example
//!
//! ```
//! use wmio::{marshal, unmarshal, Class, Object, ObjectClass, Property, Value, CimType};
//!
//! let mut class = Class::new("Win32_Service");
//! class.push_property(Property::new("Name", Value::null(CimType::STRING)));
//! let mut object = Object {
//!     class: Some(ObjectClass { current_class: class, ..Default::default() }),
//!     ..Default::default()
//! };
//!
//! let bytes = marshal(&mut object).unwrap();
//! assert_eq!(unmarshal(&bytes).unwrap(), object);
//! ```

mod builder;
mod class;
mod context;
mod decode;
mod dictionary;
mod encode;
mod error;
mod heap;
mod instance;
mod json;
mod method;
mod object;
mod primitives;
mod property;
mod qualifier;
mod strings;
mod table;
mod value;

pub use builder::Values;
pub use class::Class;
pub use decode::{Decode, Decoder, MAX_NESTING};
pub use dictionary::{lookup, reverse_lookup, DICTIONARY, DICTIONARY_FLAG};
pub use encode::{Encode, Encoder, HEAP_SIZE_FLAG, NULL_REF};
pub use error::{Result, WmioError};
pub use instance::{Instance, NO_PROPERTY_QUALIFIERS, PROPERTY_QUALIFIERS};
pub use json::coerce;
pub use method::{Method, Methods};
pub use object::{
    Decoration, Object, ObjectClass, OBJECT_FLAG_CLASS, OBJECT_FLAG_DECORATION,
    OBJECT_FLAG_INSTANCE,
};
pub use property::Property;
pub use qualifier::{qualifier_set_size, Flavor, Qualifier};
pub use strings::{encoded_len, STRING_ASCII, STRING_UTF16};
pub use value::{value_type, CimBase, CimType, Data, Value, CIM_ARRAY, CIM_INHERITED};

/// Re-export bytes for convenience
pub use bytes::Bytes;

/// Leading bytes of every marshaled object (`0x12345678` little-endian)
pub const SIGNATURE: [u8; 4] = [0x78, 0x56, 0x34, 0x12];

/// Encode an object behind the WMIO signature
///
/// Property offsets are fixed first (see [`Object::fix_offsets`]), so the
/// object compares equal to what [`unmarshal`] returns.
pub fn marshal(object: &mut Object) -> Result<Bytes> {
    object.fix_offsets();
    let mut w = Encoder::new();
    w.write_bytes(&SIGNATURE)?;
    w.write(object)?;
    let out = w.finish()?;
    tracing::trace!(len = out.len(), object = %object, "marshaled WMIO object");
    Ok(out)
}

/// Decode an object produced by [`marshal`]
pub fn unmarshal(data: &[u8]) -> Result<Object> {
    if data.len() < SIGNATURE.len() || data[..SIGNATURE.len()] != SIGNATURE {
        return Err(WmioError::InvalidSignature);
    }
    let mut r = Decoder::new(Bytes::copy_from_slice(&data[SIGNATURE.len()..]));
    let object: Object = r.read()?;
    tracing::trace!(len = data.len(), object = %object, "unmarshaled WMIO object");
    Ok(object)
}
