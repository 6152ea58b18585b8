use std::rc::Rc;

use serde_json::{Map, Value};

use crate::layer::LayerInfo;

pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub object_id: Option<i64>,
    pub attributes: Attributes,
    /// Back-reference to the owning layer, when the feature belongs to one.
    pub layer: Option<Rc<LayerInfo>>,
}

impl Feature {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            object_id: None,
            attributes,
            layer: None,
        }
    }

    pub fn with_layer(mut self, layer: Rc<LayerInfo>) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_object_id(mut self, id: i64) -> Self {
        self.object_id = Some(id);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Whether a value counts as present. Empty strings, zero, `false` and null
/// do not.
pub fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text used when a value is interpolated into markup.
pub fn display_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
