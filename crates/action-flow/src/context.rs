//! Per-run variable store for deferred expressions

use std::collections::HashMap;

use serde_json::{Map, Value};
use soulscript_core_types::{Expression, ExpressionError, Variables};

/// Variables bound by output-producing steps during one run.
///
/// Created empty for every run; later writes to the same name replace
/// earlier ones.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    variables: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set variable
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Value, ExpressionError> {
        expression.evaluate(self)
    }
}

impl Variables for EvalContext {
    fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Best-effort map-of-strings view of a script result.
///
/// Object entries holding strings are kept and all other entries dropped.
/// Anything that is not an object decodes to an empty map.
pub fn decode_string_map(raw: &Value) -> Value {
    let decoded = match raw {
        Value::Object(entries) => entries
            .iter()
            .filter(|(_, value)| value.is_string())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Map<String, Value>>(),
        _ => Map::new(),
    };
    Value::Object(decoded)
}
