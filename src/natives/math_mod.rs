// File: src/natives/math_mod.rs

use crate::callable::native;
use crate::value::Value;

use super::util::number;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("pi".to_string(), Value::Number(std::f64::consts::PI));
    map.insert("e".to_string(), Value::Number(std::f64::consts::E));
    map.insert("abs".to_string(), Value::Callable(native("math.abs", 1, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.abs")?.abs()))
    })));
    map.insert("floor".to_string(), Value::Callable(native("math.floor", 1, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.floor")?.floor()))
    })));
    map.insert("ceil".to_string(), Value::Callable(native("math.ceil", 1, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.ceil")?.ceil()))
    })));
    map.insert("round".to_string(), Value::Callable(native("math.round", 1, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.round")?.round()))
    })));
    map.insert("sqrt".to_string(), Value::Callable(native("math.sqrt", 1, |_vm, a| {
        let n = number(a, 0, "math.sqrt")?;
        if n < 0.0 {
            return Err(crate::vm::RuntimeError::host("math.sqrt: argument must be non-negative"));
        }
        Ok(Value::Number(n.sqrt()))
    })));
    map.insert("pow".to_string(), Value::Callable(native("math.pow", 2, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.pow")?.powf(number(a, 1, "math.pow")?)))
    })));
    map.insert("min".to_string(), Value::Callable(native("math.min", 2, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.min")?.min(number(a, 1, "math.min")?)))
    })));
    map.insert("max".to_string(), Value::Callable(native("math.max", 2, |_vm, a| {
        Ok(Value::Number(number(a, 0, "math.max")?.max(number(a, 1, "math.max")?)))
    })));
    Value::map(map)
}
