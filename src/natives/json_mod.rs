// File: src/natives/json_mod.rs

use crate::callable::native;
use crate::value::{AHashMap, Value};
use crate::vm::RuntimeError;

fn to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.as_str().to_string()),
        Value::Array(a) => serde_json::Value::Array(a.borrow().elements.iter().map(to_json).collect()),
        Value::Map(m) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in m.borrow().entries.iter() {
                obj.insert(k.clone(), to_json(v));
            }
            serde_json::Value::Object(obj)
        }
        other => serde_json::Value::String(other.to_string()),
    }
}

fn from_json(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(obj) => {
            let mut map = AHashMap::default();
            for (k, v) in obj.iter() {
                map.insert(k.clone(), from_json(v));
            }
            Value::map(map)
        }
    }
}

pub fn build() -> Value {
    let mut map = AHashMap::default();
    map.insert("stringify".to_string(), Value::Callable(native("json.stringify", 1, |_vm, a| {
        let v = a.get(0).cloned().unwrap_or(Value::Nil);
        serde_json::to_string(&to_json(&v))
            .map(Value::string)
            .map_err(|e| RuntimeError::host(format!("json.stringify: {}", e)))
    })));
    map.insert("parse".to_string(), Value::Callable(native("json.parse", 1, |_vm, a| {
        let s = match a.get(0) {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(RuntimeError::host("json.parse: argument must be a string")),
        };
        let parsed: serde_json::Value = serde_json::from_str(s.as_str())
            .map_err(|e| RuntimeError::host(format!("json.parse: {}", e)))?;
        Ok(from_json(&parsed))
    })));
    Value::map(map)
}
