//! Method Call Tests
//!
//! Building method arguments from a decoded class: signature lookup,
//! instance construction from typed and JSON values, and marshaling the
//! result.

mod common;

use common::*;
use serde_json::json;
use wmio::{marshal, unmarshal, CimType, Data, Object, Values, WmioError};

fn decoded_process() -> Object {
    unmarshal(&marshal(&mut win32_process()).unwrap()).unwrap()
}

#[test]
fn test_method_lookup() {
    init_tracing();
    let process = decoded_process();
    let (input, output) = process.method("Create").unwrap();
    assert_eq!(input.template().unwrap().properties.len(), 3);
    assert_eq!(output.template().unwrap().properties.len(), 2);

    let (_, output) = process.method("Terminate").unwrap();
    assert!(output.is_empty());

    assert_eq!(
        process.method("Reboot"),
        Err(WmioError::MethodNotFound("Reboot".into()))
    );
    assert_eq!(spooler().method("Create"), Err(WmioError::ClassNotFound));
}

#[test]
fn test_create_arguments() {
    init_tracing();
    let process = decoded_process();
    let (input, _) = process.method("Create").unwrap();

    let mut values = Values::new();
    values.insert("CommandLine".into(), Data::from("notepad.exe"));
    values.insert("CurrentDirectory".into(), Data::Null);
    let mut params = input.new_instance(&values).unwrap();
    assert_eq!(params.to_string(), "instance of __PARAMETERS");

    let decoded = unmarshal(&marshal(&mut params).unwrap()).unwrap();
    assert_eq!(decoded, params);

    let instance = decoded.instance.unwrap();
    let command_line = instance.property("CommandLine").unwrap();
    assert_eq!(command_line.value.data, Data::from("notepad.exe"));
    assert!(instance.property("CurrentDirectory").unwrap().nullable);
    let startup = instance.property("ProcessStartupInformation").unwrap();
    assert!(startup.inherit_default);
    assert_eq!(startup.value.cim_type, CimType::OBJECT);
}

#[test]
fn test_arguments_from_json() {
    let process = decoded_process();
    let (_, output) = process.method("Create").unwrap();

    let values = json!({"ProcessId": "4242", "ReturnValue": 0, "Ignored": [1, 2]});
    let mut result = output
        .new_instance_from_json(values.as_object().unwrap())
        .unwrap();
    let decoded = unmarshal(&marshal(&mut result).unwrap()).unwrap();
    assert_eq!(decoded, result);

    let instance = decoded.instance.unwrap();
    assert_eq!(instance.property("ProcessId").unwrap().value.data, Data::Uint32(4242));
    assert_eq!(instance.property("ReturnValue").unwrap().value.data, Data::Uint32(0));
}

#[test]
fn test_argument_errors_name_the_property() {
    let process = decoded_process();
    let (input, output) = process.method("Create").unwrap();

    let values = json!({"ProcessId": "abc"});
    let err = output
        .new_instance_from_json(values.as_object().unwrap())
        .unwrap_err();
    assert_eq!(err.to_string(), "ProcessId: cannot coerce \"abc\" to uint32");

    let mut values = Values::new();
    values.insert("CommandLine".into(), Data::from(17u32));
    let err = input.new_instance(&values).unwrap_err();
    assert_eq!(
        err.to_string(),
        "CommandLine: type mismatch: expected string, got uint32"
    );
}
