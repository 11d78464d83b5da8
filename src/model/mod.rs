//! Raw model exports: the opaque object handed to the normalizer.
//!
//! A model export is a JSON document written by the training side. It mirrors
//! the fitted library object: its class name plus its fitted attributes
//! (`coef_`, `intercept_`, `mean_`, ...). Nothing here interprets the numbers;
//! that is the normalizer's job.

pub mod load;

use serde_json::{Map, Value};

pub use load::{load_model, load_model_bytes, parse_model};

/// One exported library object (estimator or transformer).
#[derive(Clone, Debug, PartialEq)]
pub struct RawObject {
    /// Library class name, e.g. `LogisticRegression` or `StandardScaler`.
    pub class: String,
    /// Every other key of the exported object.
    pub attrs: Map<String, Value>,
}

impl RawObject {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: Map::new(),
        }
    }

    /// Builder used by tests and by callers constructing exports in code.
    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn bool_attr(&self, key: &str) -> Option<bool> {
        self.attr(key).and_then(Value::as_bool)
    }

    fn from_map(mut map: Map<String, Value>) -> Option<Self> {
        let class = match map.remove("class") {
            Some(Value::String(s)) => s,
            _ => return None,
        };
        Some(Self { class, attrs: map })
    }
}

/// A pipeline stage as it appears in the export, before recognition.
#[derive(Clone, Debug, PartialEq)]
pub enum RawStep {
    /// A fitted object.
    Object(RawObject),
    /// `null` or `"passthrough"`: the stage does nothing.
    Passthrough,
}

/// The deserialized trained model, in one of the three shapes an export may take.
#[derive(Clone, Debug, PartialEq)]
pub enum RawModel {
    /// A single estimator object.
    Estimator(RawObject),
    /// A sequential pipeline of named stages.
    Pipeline(Vec<(String, RawStep)>),
    /// A mapping of named components, expected to hold `model` and maybe `scaler`.
    Mapping(Map<String, Value>),
}

impl RawModel {
    /// Interpret a JSON value as a model export.
    ///
    /// An object with `steps` is a pipeline, an object with `class` is a single
    /// library object, and any other object is a mapping. Returns `None` for
    /// non-object values and malformed pipelines.
    pub fn from_value(value: Value) -> Option<RawModel> {
        let mut map = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        if let Some(steps) = map.remove("steps") {
            return parse_steps(steps).map(RawModel::Pipeline);
        }
        if map.contains_key("class") {
            return RawObject::from_map(map).map(RawModel::Estimator);
        }
        Some(RawModel::Mapping(map))
    }

    /// Short description used in logs and the `inspect` command.
    pub fn describe(&self) -> String {
        match self {
            RawModel::Estimator(obj) => obj.class.clone(),
            RawModel::Pipeline(steps) => {
                let names: Vec<String> = steps
                    .iter()
                    .map(|(name, step)| match step {
                        RawStep::Object(obj) => format!("{}={}", name, obj.class),
                        RawStep::Passthrough => format!("{}=passthrough", name),
                    })
                    .collect();
                format!("Pipeline[{}]", names.join(", "))
            }
            RawModel::Mapping(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                format!("Mapping{{{}}}", keys.join(", "))
            }
        }
    }
}

/// Parse a single step value: an object, `null`, or `"passthrough"`.
pub(crate) fn parse_step(value: Value) -> Option<RawStep> {
    match value {
        Value::Null => Some(RawStep::Passthrough),
        Value::String(s) if s == "passthrough" => Some(RawStep::Passthrough),
        Value::Object(map) => RawObject::from_map(map).map(RawStep::Object),
        _ => None,
    }
}

/// Steps are either `[name, object]` pairs or objects with a `name` key.
fn parse_steps(steps: Value) -> Option<Vec<(String, RawStep)>> {
    let items = match steps {
        Value::Array(items) => items,
        _ => return None,
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Array(mut pair) if pair.len() == 2 => {
                let step = parse_step(pair.pop()?)?;
                let name = match pair.pop()? {
                    Value::String(s) => s,
                    _ => return None,
                };
                out.push((name, step));
            }
            Value::Object(mut map) => {
                let name = match map.remove("name") {
                    Some(Value::String(s)) => s,
                    _ => format!("step{}", i),
                };
                out.push((name, parse_step(Value::Object(map))?));
            }
            _ => return None,
        }
    }
    Some(out)
}
