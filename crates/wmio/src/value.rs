//! CIM types and values
//!
//! A [`Value`] pairs a [`CimType`] with a [`Data`] payload. Inside a value
//! table or qualifier record fixed-size scalars are stored inline; strings,
//! objects and every array are stored behind a reference.
//!
//! Referent layouts:
//! ```text
//! string/datetime/reference   encoded string
//! object                      encoded object
//! scalar array                count: u32, elements
//! string/object array         count: u32, count references, referents
//! ```
//! Empty strings, empty arrays and empty objects are written as null
//! references and null references decode to those zero values.

use crate::decode::{Ref, Resolved, Target};
use crate::object::Object;
use crate::{Decode, Decoder, Encode, Encoder, Result, WmioError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Array bit of a wire type
pub const CIM_ARRAY: u32 = 0x2000;

/// Inherited bit of a property's wire type
pub const CIM_INHERITED: u32 = 0x4000;

/// Scalar CIM type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CimBase {
    Sint16 = 2,
    Sint32 = 3,
    Real32 = 4,
    Real64 = 5,
    String = 8,
    Boolean = 11,
    Object = 13,
    Sint8 = 16,
    Uint8 = 17,
    Uint16 = 18,
    Uint32 = 19,
    Sint64 = 20,
    Uint64 = 21,
    Datetime = 101,
    Reference = 102,
    Char16 = 103,
}

impl CimBase {
    pub const ALL: [CimBase; 16] = [
        CimBase::Sint16,
        CimBase::Sint32,
        CimBase::Real32,
        CimBase::Real64,
        CimBase::String,
        CimBase::Boolean,
        CimBase::Object,
        CimBase::Sint8,
        CimBase::Uint8,
        CimBase::Uint16,
        CimBase::Uint32,
        CimBase::Sint64,
        CimBase::Uint64,
        CimBase::Datetime,
        CimBase::Reference,
        CimBase::Char16,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| *b as u32 == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            CimBase::Sint16 => "sint16",
            CimBase::Sint32 => "sint32",
            CimBase::Real32 => "real32",
            CimBase::Real64 => "real64",
            CimBase::String => "string",
            CimBase::Boolean => "boolean",
            CimBase::Object => "object",
            CimBase::Sint8 => "sint8",
            CimBase::Uint8 => "uint8",
            CimBase::Uint16 => "uint16",
            CimBase::Uint32 => "uint32",
            CimBase::Sint64 => "sint64",
            CimBase::Uint64 => "uint64",
            CimBase::Datetime => "datetime",
            CimBase::Reference => "reference",
            CimBase::Char16 => "char16",
        }
    }

    /// Types carried as strings
    pub fn is_string(self) -> bool {
        matches!(self, CimBase::String | CimBase::Datetime | CimBase::Reference)
    }

    /// Size of one element, a reference slot for strings and objects
    pub fn size(self) -> usize {
        match self {
            CimBase::Sint8 | CimBase::Uint8 => 1,
            CimBase::Sint16 | CimBase::Uint16 | CimBase::Char16 | CimBase::Boolean => 2,
            CimBase::Sint64 | CimBase::Uint64 | CimBase::Real64 => 8,
            _ => 4,
        }
    }

    fn is_by_ref(self) -> bool {
        self.is_string() || self == CimBase::Object
    }
}

/// CIM type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CimType {
    /// Placeholder with no payload (type code 0)
    #[default]
    Empty,
    Scalar(CimBase),
    Array(CimBase),
}

impl CimType {
    pub const EMPTY: CimType = CimType::Empty;
    pub const SINT8: CimType = CimType::Scalar(CimBase::Sint8);
    pub const UINT8: CimType = CimType::Scalar(CimBase::Uint8);
    pub const SINT16: CimType = CimType::Scalar(CimBase::Sint16);
    pub const UINT16: CimType = CimType::Scalar(CimBase::Uint16);
    pub const SINT32: CimType = CimType::Scalar(CimBase::Sint32);
    pub const UINT32: CimType = CimType::Scalar(CimBase::Uint32);
    pub const SINT64: CimType = CimType::Scalar(CimBase::Sint64);
    pub const UINT64: CimType = CimType::Scalar(CimBase::Uint64);
    pub const REAL32: CimType = CimType::Scalar(CimBase::Real32);
    pub const REAL64: CimType = CimType::Scalar(CimBase::Real64);
    pub const BOOLEAN: CimType = CimType::Scalar(CimBase::Boolean);
    pub const CHAR16: CimType = CimType::Scalar(CimBase::Char16);
    pub const STRING: CimType = CimType::Scalar(CimBase::String);
    pub const DATETIME: CimType = CimType::Scalar(CimBase::Datetime);
    pub const REFERENCE: CimType = CimType::Scalar(CimBase::Reference);
    pub const OBJECT: CimType = CimType::Scalar(CimBase::Object);
    pub const UINT32_ARRAY: CimType = CimType::Array(CimBase::Uint32);
    pub const STRING_ARRAY: CimType = CimType::Array(CimBase::String);
    pub const OBJECT_ARRAY: CimType = CimType::Array(CimBase::Object);

    /// Parse a wire type, ignoring the inherited bit
    pub fn from_wire(raw: u32) -> Result<Self> {
        let code = raw & !CIM_INHERITED;
        if code == 0 {
            return Ok(CimType::Empty);
        }
        let base = CimBase::from_code(code & !CIM_ARRAY).ok_or(WmioError::InvalidCimType(raw))?;
        if code & CIM_ARRAY != 0 {
            Ok(CimType::Array(base))
        } else {
            Ok(CimType::Scalar(base))
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            CimType::Empty => 0,
            CimType::Scalar(base) => base as u32,
            CimType::Array(base) => base as u32 | CIM_ARRAY,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, CimType::Array(_))
    }

    /// Element type, for scalars and arrays alike
    pub fn base(self) -> Option<CimBase> {
        match self {
            CimType::Empty => None,
            CimType::Scalar(base) | CimType::Array(base) => Some(base),
        }
    }

    /// Scalar string, datetime or reference
    pub fn is_string(self) -> bool {
        matches!(self, CimType::Scalar(base) if base.is_string())
    }

    /// Whether values of this type are stored behind a reference
    pub fn is_by_ref(self) -> bool {
        match self {
            CimType::Empty => false,
            CimType::Scalar(base) => base.is_by_ref(),
            CimType::Array(_) => true,
        }
    }

    /// Bytes a value of this type occupies in a value table (EncodeValueSize)
    pub fn value_size(self) -> usize {
        match self {
            CimType::Empty => 0,
            CimType::Scalar(base) => base.size(),
            CimType::Array(_) => 4,
        }
    }

    /// Whether `data` is a payload of this type; `Null` fits every type
    pub fn fits(self, data: &Data) -> bool {
        let Ok(found) = value_type(data) else {
            return true;
        };
        match (self, found) {
            (CimType::Scalar(base), CimType::Scalar(CimBase::String))
            | (CimType::Array(base), CimType::Array(CimBase::String)) => base.is_string(),
            _ => self == found,
        }
    }

    /// The zero value of this type
    pub fn zero(self) -> Data {
        let base = match self {
            CimType::Empty => return Data::Null,
            CimType::Scalar(base) => base,
            CimType::Array(base) => return Data::empty_array(base),
        };
        match base {
            CimBase::Sint8 => Data::Sint8(0),
            CimBase::Uint8 => Data::Uint8(0),
            CimBase::Sint16 => Data::Sint16(0),
            CimBase::Uint16 => Data::Uint16(0),
            CimBase::Sint32 => Data::Sint32(0),
            CimBase::Uint32 => Data::Uint32(0),
            CimBase::Sint64 => Data::Sint64(0),
            CimBase::Uint64 => Data::Uint64(0),
            CimBase::Real32 => Data::Real32(0.0),
            CimBase::Real64 => Data::Real64(0.0),
            CimBase::Boolean => Data::Boolean(false),
            CimBase::Char16 => Data::Char16(0),
            CimBase::String | CimBase::Datetime | CimBase::Reference => Data::String(String::new()),
            CimBase::Object => Data::Object(Box::default()),
        }
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CimType::Empty => f.write_str("empty"),
            CimType::Scalar(base) => f.write_str(base.name()),
            CimType::Array(base) => write!(f, "{}[]", base.name()),
        }
    }
}

impl FromStr for CimType {
    type Err = WmioError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "empty" {
            return Ok(CimType::Empty);
        }
        let (name, array) = match s.strip_suffix("[]") {
            Some(name) => (name, true),
            None => (s, false),
        };
        let base = CimBase::ALL
            .into_iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| WmioError::UnknownValueType(s.to_string()))?;
        Ok(if array {
            CimType::Array(base)
        } else {
            CimType::Scalar(base)
        })
    }
}

/// Value payload
///
/// Datetime and reference payloads are strings. Char16 is a UTF-16 code unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Data {
    #[default]
    Null,
    Sint8(i8),
    Uint8(u8),
    Sint16(i16),
    Uint16(u16),
    Sint32(i32),
    Uint32(u32),
    Sint64(i64),
    Uint64(u64),
    Real32(f32),
    Real64(f64),
    Boolean(bool),
    Char16(u16),
    String(String),
    Object(Box<Object>),
    Sint8Array(Vec<i8>),
    Uint8Array(Vec<u8>),
    Sint16Array(Vec<i16>),
    Uint16Array(Vec<u16>),
    Sint32Array(Vec<i32>),
    Uint32Array(Vec<u32>),
    Sint64Array(Vec<i64>),
    Uint64Array(Vec<u64>),
    Real32Array(Vec<f32>),
    Real64Array(Vec<f64>),
    BooleanArray(Vec<bool>),
    Char16Array(Vec<u16>),
    StringArray(Vec<String>),
    ObjectArray(Vec<Object>),
}

impl Data {
    pub(crate) fn fix_offsets(&mut self) {
        match self {
            Data::Object(object) => object.fix_offsets(),
            Data::ObjectArray(objects) => objects.iter_mut().for_each(Object::fix_offsets),
            _ => {}
        }
    }

    fn empty_array(base: CimBase) -> Data {
        match base {
            CimBase::Sint8 => Data::Sint8Array(Vec::new()),
            CimBase::Uint8 => Data::Uint8Array(Vec::new()),
            CimBase::Sint16 => Data::Sint16Array(Vec::new()),
            CimBase::Uint16 => Data::Uint16Array(Vec::new()),
            CimBase::Sint32 => Data::Sint32Array(Vec::new()),
            CimBase::Uint32 => Data::Uint32Array(Vec::new()),
            CimBase::Sint64 => Data::Sint64Array(Vec::new()),
            CimBase::Uint64 => Data::Uint64Array(Vec::new()),
            CimBase::Real32 => Data::Real32Array(Vec::new()),
            CimBase::Real64 => Data::Real64Array(Vec::new()),
            CimBase::Boolean => Data::BooleanArray(Vec::new()),
            CimBase::Char16 => Data::Char16Array(Vec::new()),
            CimBase::String | CimBase::Datetime | CimBase::Reference => {
                Data::StringArray(Vec::new())
            }
            CimBase::Object => Data::ObjectArray(Vec::new()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Whether a reference to this payload is written as a null reference
    pub fn is_zero(&self) -> bool {
        match self {
            Data::Null => true,
            Data::String(s) => s.is_empty(),
            Data::Object(o) => o.is_empty(),
            Data::Sint8Array(v) => v.is_empty(),
            Data::Uint8Array(v) => v.is_empty(),
            Data::Sint16Array(v) => v.is_empty(),
            Data::Uint16Array(v) => v.is_empty(),
            Data::Sint32Array(v) => v.is_empty(),
            Data::Uint32Array(v) => v.is_empty(),
            Data::Sint64Array(v) => v.is_empty(),
            Data::Uint64Array(v) => v.is_empty(),
            Data::Real32Array(v) => v.is_empty(),
            Data::Real64Array(v) => v.is_empty(),
            Data::BooleanArray(v) => v.is_empty(),
            Data::Char16Array(v) => v.is_empty(),
            Data::StringArray(v) => v.is_empty(),
            Data::ObjectArray(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Infer the CIM type of a payload (ValueType)
///
/// String payloads are `string`; datetime and reference have to be asked
/// for explicitly.
pub fn value_type(data: &Data) -> Result<CimType> {
    Ok(match data {
        Data::Null => return Err(WmioError::UnknownValueType("null".into())),
        Data::Sint8(_) => CimType::SINT8,
        Data::Uint8(_) => CimType::UINT8,
        Data::Sint16(_) => CimType::SINT16,
        Data::Uint16(_) => CimType::UINT16,
        Data::Sint32(_) => CimType::SINT32,
        Data::Uint32(_) => CimType::UINT32,
        Data::Sint64(_) => CimType::SINT64,
        Data::Uint64(_) => CimType::UINT64,
        Data::Real32(_) => CimType::REAL32,
        Data::Real64(_) => CimType::REAL64,
        Data::Boolean(_) => CimType::BOOLEAN,
        Data::Char16(_) => CimType::CHAR16,
        Data::String(_) => CimType::STRING,
        Data::Object(_) => CimType::OBJECT,
        Data::Sint8Array(_) => CimType::Array(CimBase::Sint8),
        Data::Uint8Array(_) => CimType::Array(CimBase::Uint8),
        Data::Sint16Array(_) => CimType::Array(CimBase::Sint16),
        Data::Uint16Array(_) => CimType::Array(CimBase::Uint16),
        Data::Sint32Array(_) => CimType::Array(CimBase::Sint32),
        Data::Uint32Array(_) => CimType::Array(CimBase::Uint32),
        Data::Sint64Array(_) => CimType::Array(CimBase::Sint64),
        Data::Uint64Array(_) => CimType::Array(CimBase::Uint64),
        Data::Real32Array(_) => CimType::Array(CimBase::Real32),
        Data::Real64Array(_) => CimType::Array(CimBase::Real64),
        Data::BooleanArray(_) => CimType::Array(CimBase::Boolean),
        Data::Char16Array(_) => CimType::Array(CimBase::Char16),
        Data::StringArray(_) => CimType::STRING_ARRAY,
        Data::ObjectArray(_) => CimType::OBJECT_ARRAY,
    })
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Data {
                fn from(v: $ty) -> Self {
                    Data::$variant(v.into())
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::from(Data::from(v))
                }
            }
        )*
    };
}

impl_from!(
    i8 => Sint8,
    u8 => Uint8,
    i16 => Sint16,
    u16 => Uint16,
    i32 => Sint32,
    u32 => Uint32,
    i64 => Sint64,
    u64 => Uint64,
    f32 => Real32,
    f64 => Real64,
    bool => Boolean,
    String => String,
    &str => String,
    Object => Object,
    Vec<i8> => Sint8Array,
    Vec<u8> => Uint8Array,
    Vec<i16> => Sint16Array,
    Vec<u16> => Uint16Array,
    Vec<i32> => Sint32Array,
    Vec<u32> => Uint32Array,
    Vec<i64> => Sint64Array,
    Vec<u64> => Uint64Array,
    Vec<f32> => Real32Array,
    Vec<f64> => Real64Array,
    Vec<bool> => BooleanArray,
    Vec<String> => StringArray,
    Vec<Object> => ObjectArray,
);

/// A typed CIM value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value {
    pub cim_type: CimType,
    pub data: Data,
}

impl Value {
    /// Build a value, checking the payload against the type
    pub fn new(cim_type: CimType, data: impl Into<Data>) -> Result<Self> {
        let data = data.into();
        if !cim_type.fits(&data) {
            return Err(WmioError::TypeMismatch {
                expected: cim_type,
                found: value_type(&data)?,
            });
        }
        Ok(Self { cim_type, data })
    }

    /// A value with no payload
    pub fn null(cim_type: CimType) -> Self {
        Self {
            cim_type,
            data: Data::Null,
        }
    }

    pub fn zero(cim_type: CimType) -> Self {
        Self {
            cim_type,
            data: cim_type.zero(),
        }
    }

    /// Build a value typed by [`value_type`]
    pub fn infer(data: impl Into<Data>) -> Result<Self> {
        let data = data.into();
        Ok(Self {
            cim_type: value_type(&data)?,
            data,
        })
    }
}

/// Typed by [`value_type`]; `Null` becomes an empty value
impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Self {
            cim_type: value_type(&data).unwrap_or_default(),
            data,
        }
    }
}

macro_rules! encode_each {
    ($w:expr, $v:expr) => {{
        $w.write(&($v.len() as u32))?;
        for x in $v {
            $w.write(x)?;
        }
        Ok(())
    }};
}

fn encode_array(w: &mut Encoder, data: &Data) -> Result<()> {
    match data {
        Data::Sint8Array(v) => encode_each!(w, v),
        Data::Uint8Array(v) => encode_each!(w, v),
        Data::Sint16Array(v) => encode_each!(w, v),
        Data::Uint16Array(v) => encode_each!(w, v),
        Data::Sint32Array(v) => encode_each!(w, v),
        Data::Uint32Array(v) => encode_each!(w, v),
        Data::Sint64Array(v) => encode_each!(w, v),
        Data::Uint64Array(v) => encode_each!(w, v),
        Data::Real32Array(v) => encode_each!(w, v),
        Data::Real64Array(v) => encode_each!(w, v),
        Data::BooleanArray(v) => encode_each!(w, v),
        Data::Char16Array(v) => encode_each!(w, v),
        Data::StringArray(v) => {
            w.write(&(v.len() as u32))?;
            w.write_on_heap(v.len() * 4, |w| {
                v.iter().try_for_each(|s| w.write_string_ref(s))
            })
        }
        Data::ObjectArray(v) => {
            w.write(&(v.len() as u32))?;
            w.write_on_heap(v.len() * 4, |w| v.iter().try_for_each(|o| o.encode_ref(w)))
        }
        other => Err(WmioError::UnknownValueType(format!("{other:?}"))),
    }
}

/// Value table / qualifier slot encoding
impl Encode for Value {
    fn encode(&self, w: &mut Encoder) -> Result<()> {
        if !self.cim_type.fits(&self.data) {
            return Err(WmioError::TypeMismatch {
                expected: self.cim_type,
                found: value_type(&self.data)?,
            });
        }
        match &self.data {
            Data::Null if !self.cim_type.is_by_ref() => {
                w.write_bytes(&[0u8; 8][..self.cim_type.value_size()])
            }
            data if data.is_zero() => w.write_null_ref(),
            Data::Sint8(v) => w.write(v),
            Data::Uint8(v) => w.write(v),
            Data::Sint16(v) => w.write(v),
            Data::Uint16(v) => w.write(v),
            Data::Sint32(v) => w.write(v),
            Data::Uint32(v) => w.write(v),
            Data::Sint64(v) => w.write(v),
            Data::Uint64(v) => w.write(v),
            Data::Real32(v) => w.write(v),
            Data::Real64(v) => w.write(v),
            Data::Boolean(v) => w.write(v),
            Data::Char16(v) => w.write(v),
            Data::String(s) => w.write_string_ref(s),
            Data::Object(o) => o.encode_ref(w),
            array => w.write_ref_with(|w| encode_array(w, array)),
        }
    }
}

/// A value read from a table, possibly waiting on the heap
#[derive(Debug)]
pub(crate) enum PendingValue {
    Ready(Data),
    Deferred(CimType, Ref),
}

impl PendingValue {
    /// Pick the resolved payload up once the heap is decoded
    pub(crate) fn link(self, r: &mut Decoder) -> Result<Data> {
        let (cim_type, reference) = match self {
            PendingValue::Ready(data) => return Ok(data),
            PendingValue::Deferred(cim_type, reference) => (cim_type, reference),
        };
        let slot = match reference {
            Ref::Null => return Ok(cim_type.zero()),
            Ref::Word(word) => return Ok(Data::String(word.to_string())),
            Ref::Slot(slot) => slot,
        };
        match r.take(slot)? {
            Resolved::Data(data) => Ok(data),
            Resolved::Object(object) => Ok(Data::Object(Box::new(object))),
            Resolved::Refs(refs) if cim_type == CimType::OBJECT_ARRAY => refs
                .into_iter()
                .map(|x| r.take_object(x))
                .collect::<Result<_>>()
                .map(Data::ObjectArray),
            Resolved::Refs(refs) => refs
                .into_iter()
                .map(|x| r.take_string(x))
                .collect::<Result<_>>()
                .map(Data::StringArray),
            _ => Err(WmioError::UnresolvedReference),
        }
    }
}

fn decode_scalar(r: &mut Decoder, base: CimBase) -> Result<Data> {
    Ok(match base {
        CimBase::Sint8 => Data::Sint8(r.read()?),
        CimBase::Uint8 => Data::Uint8(r.read()?),
        CimBase::Sint16 => Data::Sint16(r.read()?),
        CimBase::Uint16 => Data::Uint16(r.read()?),
        CimBase::Sint32 => Data::Sint32(r.read()?),
        CimBase::Uint32 => Data::Uint32(r.read()?),
        CimBase::Sint64 => Data::Sint64(r.read()?),
        CimBase::Uint64 => Data::Uint64(r.read()?),
        CimBase::Real32 => Data::Real32(r.read()?),
        CimBase::Real64 => Data::Real64(r.read()?),
        CimBase::Boolean => Data::Boolean(r.read()?),
        CimBase::Char16 => Data::Char16(r.read()?),
        other => return Err(WmioError::InvalidCimType(other as u32)),
    })
}

fn read_n<T: Decode>(r: &mut Decoder, count: usize) -> Result<Vec<T>> {
    (0..count).map(|_| r.read()).collect()
}

fn decode_scalar_array(r: &mut Decoder, base: CimBase, count: usize) -> Result<Data> {
    Ok(match base {
        CimBase::Sint8 => Data::Sint8Array(read_n(r, count)?),
        CimBase::Uint8 => Data::Uint8Array(read_n(r, count)?),
        CimBase::Sint16 => Data::Sint16Array(read_n(r, count)?),
        CimBase::Uint16 => Data::Uint16Array(read_n(r, count)?),
        CimBase::Sint32 => Data::Sint32Array(read_n(r, count)?),
        CimBase::Uint32 => Data::Uint32Array(read_n(r, count)?),
        CimBase::Sint64 => Data::Sint64Array(read_n(r, count)?),
        CimBase::Uint64 => Data::Uint64Array(read_n(r, count)?),
        CimBase::Real32 => Data::Real32Array(read_n(r, count)?),
        CimBase::Real64 => Data::Real64Array(read_n(r, count)?),
        CimBase::Boolean => Data::BooleanArray(read_n(r, count)?),
        CimBase::Char16 => Data::Char16Array(read_n(r, count)?),
        other => return Err(WmioError::InvalidCimType(other as u32 | CIM_ARRAY)),
    })
}

/// Read a value slot of type `cim_type`
pub(crate) fn decode_value(r: &mut Decoder, cim_type: CimType) -> Result<PendingValue> {
    match cim_type {
        CimType::Empty => Ok(PendingValue::Ready(Data::Null)),
        CimType::Scalar(base) if !base.is_by_ref() => {
            Ok(PendingValue::Ready(decode_scalar(r, base)?))
        }
        _ => Ok(PendingValue::Deferred(
            cim_type,
            r.read_ref(Target::Value(cim_type), "value")?,
        )),
    }
}

/// Decode the heap referent of a value of type `cim_type`
pub(crate) fn decode_referent(r: &mut Decoder, cim_type: CimType) -> Result<Resolved> {
    match cim_type {
        CimType::Scalar(base) if base.is_string() => Ok(Resolved::Data(Data::String(r.read()?))),
        CimType::Scalar(CimBase::Object) => Ok(Resolved::Object(r.read()?)),
        CimType::Array(base) => {
            let count = r.read::<u32>()? as usize;
            r.ensure(count.saturating_mul(base.size()))?;
            if base.is_string() {
                let refs = (0..count)
                    .map(|_| r.read_ref(Target::String, "element"))
                    .collect::<Result<_>>()?;
                Ok(Resolved::Refs(refs))
            } else if base == CimBase::Object {
                let refs = (0..count)
                    .map(|_| r.read_ref(Target::Object, "element"))
                    .collect::<Result<_>>()?;
                Ok(Resolved::Refs(refs))
            } else {
                Ok(Resolved::Data(decode_scalar_array(r, base, count)?))
            }
        }
        _ => Err(WmioError::InvalidCimType(cim_type.to_wire())),
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Null => f.write_str("null"),
            Data::Sint8(v) => write!(f, "{v}"),
            Data::Uint8(v) => write!(f, "{v}"),
            Data::Sint16(v) => write!(f, "{v}"),
            Data::Uint16(v) => write!(f, "{v}"),
            Data::Sint32(v) => write!(f, "{v}"),
            Data::Uint32(v) => write!(f, "{v}"),
            Data::Sint64(v) => write!(f, "{v}"),
            Data::Uint64(v) => write!(f, "{v}"),
            Data::Real32(v) => write!(f, "{v}"),
            Data::Real64(v) => write!(f, "{v}"),
            Data::Boolean(v) => write!(f, "{v}"),
            Data::Char16(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{c}"),
                None => write!(f, "\\u{v:04x}"),
            },
            Data::String(s) => write!(f, "{s:?}"),
            Data::Object(o) => write!(f, "{o}"),
            Data::Sint8Array(v) => join(f, v),
            Data::Uint8Array(v) => join(f, v),
            Data::Sint16Array(v) => join(f, v),
            Data::Uint16Array(v) => join(f, v),
            Data::Sint32Array(v) => join(f, v),
            Data::Uint32Array(v) => join(f, v),
            Data::Sint64Array(v) => join(f, v),
            Data::Uint64Array(v) => join(f, v),
            Data::Real32Array(v) => join(f, v),
            Data::Real64Array(v) => join(f, v),
            Data::BooleanArray(v) => join(f, v),
            Data::Char16Array(v) => join(f, v),
            Data::StringArray(v) => {
                let quoted: Vec<_> = v.iter().map(|s| format!("{s:?}")).collect();
                join(f, &quoted)
            }
            Data::ObjectArray(v) => join(f, v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}
