//! Shared fixtures for the WMIO integration tests

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wmio::{
    CimType, Class, Decoration, Flavor, Instance, Method, Methods, Object, ObjectClass, Property,
    Qualifier, Value,
};

static TRACING: Once = Once::new();

/// Route codec traces to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// `Win32_Service` with `Name: string` at offset 0 and `State: uint32` at
/// offset 4, neither nullable
pub fn win32_service() -> Class {
    let mut class = Class::new("Win32_Service");
    class.derivation = vec![
        "Win32_BaseService".into(),
        "CIM_Service".into(),
        "CIM_LogicalElement".into(),
    ];
    class.qualifiers = vec![
        Qualifier::new("dynamic", Flavor::PROPAGATE_TO_INSTANCE, true),
        Qualifier::new("provider", Flavor::default(), "cimwin32"),
        Qualifier::new("UUID", Flavor::AMENDED, "{8502C4D9-5FBB-11D2-AAC1-006008C78BC7}"),
    ];

    let mut name = Property::new("Name", "");
    name.qualifiers = vec![
        Qualifier::new("key", Flavor::PROPAGATE_TO_DERIVED_CLASS, true),
        Qualifier::new("CIMTYPE", Flavor::ORIGIN_SYSTEM, "string"),
    ];
    class.push_property(name);

    let mut state = Property::new("State", 0u32);
    state.qualifiers = vec![Qualifier::new("read", Flavor::default(), true)];
    class.push_property(state);
    class
}

/// An instance of [`win32_service`] for the print spooler
pub fn spooler() -> Object {
    let class = win32_service();
    Object {
        instance: Some(Instance {
            class_name: class.name.clone(),
            properties: vec![Property::new("Name", "Spooler"), Property::new("State", 4u32)],
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn parameters(properties: Vec<Property>) -> Object {
    let mut class = Class::new("__PARAMETERS");
    for property in properties {
        class.push_property(property);
    }
    Object {
        class: Some(ObjectClass {
            current_class: class,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `Win32_Process` with a `Create` method, decorated with its origin
pub fn win32_process() -> Object {
    let mut class = Class::new("Win32_Process");
    class.derivation = vec!["CIM_Process".into()];
    let mut handle = Property::new("Handle", Value::null(CimType::STRING));
    handle.qualifiers = vec![Qualifier::new("key", Flavor::default(), true)];
    class.push_property(handle);
    class.push_property(Property::new("ThreadCount", Value::null(CimType::UINT32)));

    let create = Method {
        name: "Create".into(),
        flags: 0,
        origin: 0,
        qualifiers: vec![
            Qualifier::new("Static", Flavor::default(), true),
            Qualifier::new(
                "ValueMap",
                Flavor::AMENDED,
                vec!["0".to_string(), "2".to_string(), "3".to_string()],
            ),
        ],
        input_signature: parameters(vec![
            Property::new("CommandLine", Value::null(CimType::STRING)),
            Property::new("CurrentDirectory", Value::null(CimType::STRING)),
            Property::new("ProcessStartupInformation", Value::null(CimType::OBJECT)),
        ]),
        output_signature: parameters(vec![
            Property::new("ProcessId", Value::null(CimType::UINT32)),
            Property::new("ReturnValue", Value::null(CimType::UINT32)),
        ]),
    };
    let terminate = Method {
        name: "Terminate".into(),
        origin: 0,
        input_signature: parameters(vec![Property::new("Reason", Value::null(CimType::UINT32))]),
        ..Default::default()
    };

    Object {
        decoration: Some(Decoration {
            server_name: "WIN-HOST".into(),
            namespace: "root\\cimv2".into(),
        }),
        class: Some(ObjectClass {
            parent_class: Class::new("CIM_Process"),
            current_class: class,
            current_class_methods: Methods {
                methods: vec![create, terminate],
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
