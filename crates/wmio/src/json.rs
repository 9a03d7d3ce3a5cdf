//! JSON representation
//!
//! [`CimType`] serializes as its name (`"uint32"`, `"string[]"`) and
//! [`Value`] as `{"type": ..., "value": ...}`. Values deserialize through
//! [`coerce`], so loosely typed input such as `{"type": "uint8", "value": "7"}`
//! is accepted.

use crate::value::{CimBase, CimType, Data, Value};
use crate::{Object, Result, WmioError};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

impl Serialize for CimType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CimType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Value", 2)?;
        state.serialize_field("type", &self.cim_type)?;
        state.serialize_field("value", &self.data)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawValue {
    #[serde(rename = "type", default)]
    cim_type: CimType,
    #[serde(default)]
    value: JsonValue,
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawValue::deserialize(deserializer)?;
        let data = coerce(raw.cim_type, &raw.value).map_err(de::Error::custom)?;
        Ok(Value {
            cim_type: raw.cim_type,
            data,
        })
    }
}

/// Convert loosely typed JSON into a payload of `cim_type`
///
/// `null` is accepted for every type. Integers come from integral numbers or
/// decimal strings and are range checked; booleans from `true`/`false`, `0`/`1`
/// or their string forms; char16 from a number or a one character string;
/// string types from strings, numbers or booleans; objects from their JSON
/// representation. Arrays are coerced element by element.
pub fn coerce(cim_type: CimType, input: &JsonValue) -> Result<Data> {
    if input.is_null() {
        return Ok(Data::Null);
    }
    let coerced = match cim_type {
        CimType::Empty => None,
        CimType::Scalar(base) => scalar(base, input),
        CimType::Array(base) => input.as_array().and_then(|items| array(base, items)),
    };
    coerced.ok_or_else(|| WmioError::Coercion {
        cim_type,
        input: input.to_string(),
    })
}

fn integer<T>(input: &JsonValue) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    match input {
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                <T as TryFrom<u64>>::try_from(u).ok()
            } else if let Some(i) = n.as_i64() {
                <T as TryFrom<i64>>::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
                    return None;
                }
                <T as TryFrom<i64>>::try_from(f as i64).ok()
            }
        }
        JsonValue::String(s) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(u) => <T as TryFrom<u64>>::try_from(u).ok(),
                Err(_) => <T as TryFrom<i64>>::try_from(s.parse::<i64>().ok()?).ok(),
            }
        }
        _ => None,
    }
}

fn real(input: &JsonValue) -> Option<f64> {
    match input {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn boolean(input: &JsonValue) -> Option<bool> {
    match input {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_u64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn char16(input: &JsonValue) -> Option<u16> {
    match input {
        JsonValue::String(s) => {
            let mut units = s.encode_utf16();
            match (units.next(), units.next()) {
                (Some(unit), None) => Some(unit),
                _ => None,
            }
        }
        _ => integer(input),
    }
}

fn string(input: &JsonValue) -> Option<String> {
    match input {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn object(input: &JsonValue) -> Option<Object> {
    if !input.is_object() {
        return None;
    }
    serde_json::from_value(input.clone()).ok()
}

fn scalar(base: CimBase, input: &JsonValue) -> Option<Data> {
    Some(match base {
        CimBase::Sint8 => Data::Sint8(integer(input)?),
        CimBase::Uint8 => Data::Uint8(integer(input)?),
        CimBase::Sint16 => Data::Sint16(integer(input)?),
        CimBase::Uint16 => Data::Uint16(integer(input)?),
        CimBase::Sint32 => Data::Sint32(integer(input)?),
        CimBase::Uint32 => Data::Uint32(integer(input)?),
        CimBase::Sint64 => Data::Sint64(integer(input)?),
        CimBase::Uint64 => Data::Uint64(integer(input)?),
        CimBase::Real32 => Data::Real32(real(input)? as f32),
        CimBase::Real64 => Data::Real64(real(input)?),
        CimBase::Boolean => Data::Boolean(boolean(input)?),
        CimBase::Char16 => Data::Char16(char16(input)?),
        CimBase::String | CimBase::Datetime | CimBase::Reference => Data::String(string(input)?),
        CimBase::Object => Data::Object(Box::new(object(input)?)),
    })
}

fn each<T>(items: &[JsonValue], f: impl Fn(&JsonValue) -> Option<T>) -> Option<Vec<T>> {
    items.iter().map(f).collect()
}

fn array(base: CimBase, items: &[JsonValue]) -> Option<Data> {
    Some(match base {
        CimBase::Sint8 => Data::Sint8Array(each(items, integer)?),
        CimBase::Uint8 => Data::Uint8Array(each(items, integer)?),
        CimBase::Sint16 => Data::Sint16Array(each(items, integer)?),
        CimBase::Uint16 => Data::Uint16Array(each(items, integer)?),
        CimBase::Sint32 => Data::Sint32Array(each(items, integer)?),
        CimBase::Uint32 => Data::Uint32Array(each(items, integer)?),
        CimBase::Sint64 => Data::Sint64Array(each(items, integer)?),
        CimBase::Uint64 => Data::Uint64Array(each(items, integer)?),
        CimBase::Real32 => Data::Real32Array(each(items, |v| real(v).map(|f| f as f32))?),
        CimBase::Real64 => Data::Real64Array(each(items, real)?),
        CimBase::Boolean => Data::BooleanArray(each(items, boolean)?),
        CimBase::Char16 => Data::Char16Array(each(items, char16)?),
        CimBase::String | CimBase::Datetime | CimBase::Reference => {
            Data::StringArray(each(items, string)?)
        }
        CimBase::Object => Data::ObjectArray(each(items, object)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integers() {
        assert_eq!(coerce(CimType::UINT8, &json!(7)).unwrap(), Data::Uint8(7));
        assert_eq!(coerce(CimType::UINT8, &json!("7")).unwrap(), Data::Uint8(7));
        assert_eq!(coerce(CimType::SINT16, &json!(-3.0)).unwrap(), Data::Sint16(-3));
        assert_eq!(
            coerce(CimType::UINT64, &json!(u64::MAX)).unwrap(),
            Data::Uint64(u64::MAX)
        );
        assert!(coerce(CimType::UINT8, &json!(256)).is_err());
        assert!(coerce(CimType::UINT32, &json!(-1)).is_err());
        assert!(coerce(CimType::SINT32, &json!(1.5)).is_err());
        assert_eq!(
            coerce(CimType::UINT8, &json!("x")),
            Err(WmioError::Coercion {
                cim_type: CimType::UINT8,
                input: "\"x\"".into(),
            })
        );
    }

    #[test]
    fn test_scalars() {
        assert_eq!(coerce(CimType::BOOLEAN, &json!(1)).unwrap(), Data::Boolean(true));
        assert_eq!(coerce(CimType::BOOLEAN, &json!("False")).unwrap(), Data::Boolean(false));
        assert_eq!(coerce(CimType::REAL32, &json!("2.5")).unwrap(), Data::Real32(2.5));
        assert_eq!(coerce(CimType::CHAR16, &json!("A")).unwrap(), Data::Char16(0x41));
        assert!(coerce(CimType::CHAR16, &json!("AB")).is_err());
        assert_eq!(coerce(CimType::STRING, &json!(42)).unwrap(), Data::from("42"));
        assert_eq!(coerce(CimType::DATETIME, &json!(null)).unwrap(), Data::Null);
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            coerce(CimType::UINT32_ARRAY, &json!([1, "2"])).unwrap(),
            Data::Uint32Array(vec![1, 2])
        );
        assert_eq!(
            coerce(CimType::STRING_ARRAY, &json!(["a", true])).unwrap(),
            Data::from(vec!["a".to_string(), "true".to_string()])
        );
        assert!(coerce(CimType::UINT32_ARRAY, &json!(1)).is_err());
        assert!(coerce(CimType::UINT32_ARRAY, &json!([1, -1])).is_err());
    }

    #[test]
    fn test_value_json() {
        let value = Value::from(vec![1u16, 2]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"type":"uint16[]","value":[1,2]}"#);
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);

        let loose: Value = serde_json::from_str(r#"{"type":"sint64","value":"-9"}"#).unwrap();
        assert_eq!(loose, Value::from(-9i64));
        assert!(serde_json::from_str::<Value>(r#"{"type":"uint99","value":1}"#).is_err());
    }

    #[test]
    fn test_object_values() {
        let nested = Object {
            decoration: Some(crate::Decoration {
                server_name: "HOST".into(),
                namespace: String::new(),
            }),
            ..Default::default()
        };
        let data = coerce(CimType::OBJECT, &serde_json::to_value(&nested).unwrap()).unwrap();
        assert_eq!(data, Data::from(nested));
        assert!(coerce(CimType::OBJECT, &json!("HOST")).is_err());
    }
}
