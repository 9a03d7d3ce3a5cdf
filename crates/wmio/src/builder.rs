//! Method call helpers
//!
//! A method's input signature is a template: an object whose class lists the
//! parameters. [`Object::new_instance`] fills that class in with values to
//! produce the instance sent as the call's arguments.

use crate::json;
use crate::value::{value_type, CimType, Data, Value};
use crate::{Class, Instance, Object, Property, Result, WmioError};
use std::collections::BTreeMap;

/// Property values by name
pub type Values = BTreeMap<String, Data>;

impl Object {
    /// The class new instances are built from
    pub fn template(&self) -> Result<&Class> {
        let class = match (&self.class, &self.instance) {
            (Some(class), _) => &class.current_class,
            (None, Some(instance)) => &instance.current_class,
            (None, None) => return Err(WmioError::ClassNotFound),
        };
        if class.name.is_empty() {
            return Err(WmioError::ClassNotFound);
        }
        Ok(class)
    }

    /// Input and output signatures of the method `name`
    pub fn method(&self, name: &str) -> Result<(&Object, &Object)> {
        let class = self.class.as_ref().ok_or(WmioError::ClassNotFound)?;
        let method = class
            .current_class_methods
            .get(name)
            .ok_or_else(|| WmioError::MethodNotFound(name.to_string()))?;
        Ok((&method.input_signature, &method.output_signature))
    }

    /// Build an instance of [`Object::template`]
    ///
    /// Properties missing from `values` inherit their default and `Null`
    /// values make them null. Keys that name no property are ignored.
    pub fn new_instance(&self, values: &Values) -> Result<Object> {
        let class = self.template()?;
        let properties = class
            .properties
            .iter()
            .map(|p| build_property(p, values.get(&p.name)).map_err(|e| e.for_property(&p.name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Object {
            instance: Some(Instance {
                current_class: class.clone(),
                class_name: class.name.clone(),
                properties,
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// [`Object::new_instance`] with JSON values coerced to the property types
    pub fn new_instance_from_json(
        &self,
        values: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Object> {
        let class = self.template()?;
        let mut typed = Values::new();
        for property in &class.properties {
            if let Some(value) = values.get(&property.name) {
                let data = json::coerce(property.cim_type(), value)
                    .map_err(|e| e.for_property(&property.name))?;
                typed.insert(property.name.clone(), data);
            }
        }
        self.new_instance(&typed)
    }
}

fn build_property(template: &Property, data: Option<&Data>) -> Result<Property> {
    let expected = template.cim_type();
    let mut property = Property {
        name: template.name.clone(),
        value: Value::null(expected),
        ..Default::default()
    };
    match data {
        None => property.inherit_default = true,
        Some(Data::Null) => property.nullable = true,
        Some(data) => {
            let found = value_type(data)?;
            if !adopts(expected, found) {
                return Err(WmioError::TypeMismatch { expected, found });
            }
            property.value.data = data.clone();
        }
    }
    Ok(property)
}

/// Whether a payload of type `found` can be stored as `expected`
fn adopts(expected: CimType, found: CimType) -> bool {
    expected == found || expected.fits(&found.zero())
}
