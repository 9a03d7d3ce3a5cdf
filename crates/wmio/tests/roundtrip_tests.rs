//! Round Trip Tests
//!
//! Whole objects through marshal and unmarshal: classes with methods,
//! instances carrying every value type, nested objects, and the JSON
//! representation.

mod common;

use common::*;
use wmio::{
    marshal, unmarshal, CimBase, CimType, Class, Data, Decoder, Encoder, Instance, Object,
    ObjectClass, Property, Value,
};

#[test]
fn test_win32_service_scenario() {
    init_tracing();
    let class = win32_service();
    assert_eq!(class.nd_value_size, 9);
    assert_eq!(class.value_table_size(), 8);
    assert_eq!(class.properties[0].offset, 0);
    assert_eq!(class.properties[1].offset, 4);
    assert!(!class.properties[0].nullable && !class.properties[1].nullable);

    let mut object = spooler();
    let decoded = unmarshal(&marshal(&mut object).unwrap()).unwrap();
    assert_eq!(decoded, object);

    let instance = decoded.instance.as_ref().unwrap();
    assert_eq!(instance.properties[0].value.data, Data::from("Spooler"));
    assert_eq!(instance.properties[1].value.data, Data::Uint32(4));
    assert_eq!(instance.current_class.nd_value_size, 9);
    assert_eq!(decoded.to_string(), "instance of Win32_Service");
}

#[test]
fn test_class_with_methods() {
    init_tracing();
    let mut object = win32_process();
    let decoded = unmarshal(&marshal(&mut object).unwrap()).unwrap();
    assert_eq!(decoded, object);

    let class = decoded.class.as_ref().unwrap();
    assert_eq!(class.parent_class.name, "CIM_Process");
    assert_eq!(class.current_class.derivation, vec!["CIM_Process".to_string()]);
    let create = class.current_class_methods.get("Create").unwrap();
    assert_eq!(create.qualifiers.len(), 2);
    assert!(create.output_signature.template().unwrap().property("ReturnValue").is_some());
}

#[test]
fn test_heap_balance() {
    let object = win32_process();

    let mut w = Encoder::new();
    w.write(&object).unwrap();
    assert_eq!(w.heap_depth(), 1);
    assert_eq!(w.heap_len(), 0);
    let out = w.finish().unwrap();

    let mut r = Decoder::new(out);
    let decoded: Object = r.read().unwrap();
    assert_eq!(r.heap_depth(), 1);
    assert_eq!(r.pending(), 0);
    assert_eq!(r.remaining(), 0);
    assert_eq!(decoded, object);
}

fn nested() -> Object {
    let mut class = Class::new("Win32_ProcessStartup");
    class.push_property(Property::new("Title", Value::null(CimType::STRING)));
    class.push_property(Property::new("ShowWindow", Value::null(CimType::UINT16)));
    Object {
        instance: Some(Instance {
            class_name: class.name.clone(),
            properties: vec![Property::new("Title", "build"), Property::new("ShowWindow", 1u16)],
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn typed(cim_type: CimType, data: impl Into<Data>) -> Value {
    Value::new(cim_type, data).unwrap()
}

/// One property per value shape
fn all_values() -> Vec<Value> {
    vec![
        Value::from(-8i8),
        Value::from(8u8),
        Value::from(-1600i16),
        Value::from(1600u16),
        Value::from(-320_000i32),
        Value::from(320_000u32),
        Value::from(i64::MIN),
        Value::from(u64::MAX),
        Value::from(1.5f32),
        Value::from(-2.25f64),
        Value::from(true),
        typed(CimType::CHAR16, Data::Char16(0x263A)),
        Value::from("plain ascii"),
        Value::from("wide \u{263A} text"),
        Value::from(""),
        typed(CimType::DATETIME, "20240101120000.000000+060"),
        typed(CimType::REFERENCE, "Win32_Service.Name=\"Spooler\""),
        Value::from(nested()),
        Value::from(vec![-1i8, 2]),
        Value::from(Vec::<u8>::new()),
        Value::from(vec![1i16, -2, 3]),
        Value::from(vec![1u16]),
        Value::from(vec![i32::MIN, i32::MAX]),
        Value::from(vec![7u32, 8, 9]),
        Value::from(vec![-5i64]),
        Value::from(vec![5u64, 6]),
        Value::from(vec![0.5f32, -0.5]),
        Value::from(vec![1e10f64]),
        Value::from(vec![true, false, true]),
        typed(CimType::Array(CimBase::Char16), Data::Char16Array(vec![0x41, 0x42])),
        Value::from(vec!["key".to_string(), "".to_string(), "\u{e9}t\u{e9}".to_string()]),
        typed(
            CimType::Array(CimBase::Datetime),
            vec!["20240101120000.000000+000".to_string()],
        ),
        Value::from(vec![nested(), nested()]),
    ]
}

fn values_object() -> Object {
    let values = all_values();
    let mut class = Class::new("Test_Values");
    for (i, value) in values.iter().enumerate() {
        class.push_property(Property::new(format!("p{i}"), Value::null(value.cim_type)));
    }
    let properties = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Property::new(format!("p{i}"), value))
        .collect();
    Object {
        instance: Some(Instance {
            class_name: class.name.clone(),
            properties,
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn test_every_value_type() {
    init_tracing();
    let mut object = values_object();
    let decoded = unmarshal(&marshal(&mut object).unwrap()).unwrap();
    assert_eq!(decoded, object);

    let instance = decoded.instance.unwrap();
    let wide = instance.property("p13").unwrap();
    assert_eq!(wide.value.data.as_str(), Some("wide \u{263A} text"));
    let objects = &instance.property("p32").unwrap().value.data;
    assert_eq!(objects, &Data::from(vec![nested(), nested()]));
}

#[test]
fn test_class_default_values() {
    let mut class = Class::new("Defaults");
    class.push_property(Property::new("Names", vec!["a".to_string(), "b".to_string()]));
    class.push_property(Property::new("Limit", 10u64));
    class.push_property(Property::new("Inner", nested()));
    class.push_property(Property::new("Unset", Value::null(CimType::REAL64)));
    let mut object = Object {
        class: Some(ObjectClass {
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert_eq!(unmarshal(&marshal(&mut object).unwrap()).unwrap(), object);
}

#[test]
fn test_assigned_properties_keep_their_layout() {
    let mut class = Class::new("C");
    class.properties = vec![Property::new("a", 1u8), Property::new("b", 2u32)];
    let mut object = Object {
        class: Some(ObjectClass {
            current_class: class.clone(),
            ..Default::default()
        }),
        instance: Some(Instance {
            class_name: class.name.clone(),
            properties: vec![Property::new("a", 3u8), Property::new("b", 4u32)],
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    };

    let decoded = unmarshal(&marshal(&mut object).unwrap()).unwrap();
    assert_eq!(decoded, object);

    let class = &decoded.class.as_ref().unwrap().current_class;
    let offsets: Vec<u32> = class.properties.iter().map(|p| p.offset).collect();
    assert_eq!(offsets, vec![0, 1]);
    let instance = decoded.instance.unwrap();
    assert_eq!(instance.property("b").unwrap().value.data, Data::Uint32(4));
}

#[test]
fn test_json_round_trip() {
    for object in [spooler(), win32_process(), values_object()] {
        let text = serde_json::to_string(&object).unwrap();
        let parsed: Object = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, object);
    }
}

#[test]
fn test_json_shape() {
    let json = serde_json::to_value(spooler()).unwrap();
    let property = &json["instance"]["properties"][1];
    assert_eq!(property["name"], "State");
    assert_eq!(property["value"]["type"], "uint32");
    assert_eq!(property["value"]["value"], 4);
    assert!(json.get("class").is_none());
}
