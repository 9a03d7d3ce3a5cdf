//! WMIO error types

use crate::value::CimType;
use thiserror::Error;

/// WMIO encoding/decoding errors
///
/// Errors are `Clone` because the codec hands the first failure back on
/// every later call (see [`Encoder`](crate::Encoder) and
/// [`Decoder`](crate::Decoder)).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WmioError {
    /// Input does not start with the `78 56 34 12` signature
    #[error("invalid signature")]
    InvalidSignature,

    /// Reserved bits set in the object flags byte
    #[error("invalid object flags 0x{0:02x}")]
    InvalidObjectFlags(u8),

    /// Encoded string flag byte is neither ASCII nor UTF-16
    #[error("invalid string flag 0x{0:02x}")]
    InvalidStringFlag(u8),

    /// Invalid string - not null terminated or invalid encoding
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Dictionary reference used for a target that is not a string
    #[error("dictionary reference 0x{0:08x} used for a non-string value")]
    DictionaryReference(u32),

    /// Buffer underflow - not enough data
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Buffer overflow - a value does not fit its table slot
    #[error("buffer overflow: needed {needed} bytes, have {have}")]
    BufferOverflow { needed: usize, have: usize },

    /// Heap reservation smaller than the data written into it
    #[error("heap reservation exceeded: reserved {reserved} bytes, wrote {written}")]
    HeapOverflow { reserved: usize, written: usize },

    /// Self-inclusive length prefix smaller than the prefix itself
    #[error("invalid length prefix {0}")]
    InvalidLength(u32),

    /// Unknown CIM type code
    #[error("invalid CIM type 0x{0:04x}")]
    InvalidCimType(u32),

    /// Value whose CIM type cannot be inferred
    #[error("unknown value type: {0}")]
    UnknownValueType(String),

    /// Payload does not match the declared CIM type
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: CimType, found: CimType },

    /// Invalid per-property qualifier flag in an instance
    #[error("invalid property qualifier flags 0x{0:02x}")]
    InvalidQualifierFlags(u8),

    /// Instance property count differs from its class
    #[error("property count mismatch: class has {expected}, instance has {found}")]
    PropertyCount { expected: usize, found: usize },

    /// Reference written while its parent referent is still being assembled
    #[error("reference written outside a reserved heap region")]
    UnreservedReference,

    /// Heap reference used before its heap was decoded
    #[error("unresolved heap reference")]
    UnresolvedReference,

    /// Objects nested deeper than the decoder accepts
    #[error("objects nested deeper than {limit}")]
    NestingTooDeep { limit: usize },

    /// Object carries no class definition
    #[error("class does not exist")]
    ClassNotFound,

    /// Class has no method with the given name
    #[error("method does not exist: {0}")]
    MethodNotFound(String),

    /// Error while building a single property
    #[error("{name}: {source}")]
    Property {
        name: String,
        #[source]
        source: Box<WmioError>,
    },

    /// JSON input cannot be represented as the CIM type
    #[error("cannot coerce {input} to {cim_type}")]
    Coercion { cim_type: CimType, input: String },

    /// serde_json failure
    #[error("JSON error: {0}")]
    Json(String),
}

impl WmioError {
    /// Attach the property name to an error raised while building it
    pub fn for_property(self, name: &str) -> Self {
        WmioError::Property {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for WmioError {
    fn from(err: serde_json::Error) -> Self {
        WmioError::Json(err.to_string())
    }
}

/// Result type for WMIO operations
pub type Result<T> = std::result::Result<T, WmioError>;
