// File: src/natives/assert_mod.rs

use crate::callable::native;
use crate::value::Value;
use crate::vm::RuntimeError;

fn assertion_error(message: String) -> RuntimeError {
    RuntimeError::Thrown(Value::error(message, "AssertionError"))
}

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("ok".to_string(), Value::Callable(native("assert.ok", -1, |_vm, a| {
        let cond = a.get(0).cloned().unwrap_or(Value::Nil);
        if cond.is_truthy() {
            Ok(Value::Nil)
        } else {
            let msg = a.get(1).map(|v| v.to_string()).unwrap_or_else(|| "assertion failed".to_string());
            Err(assertion_error(msg))
        }
    })));
    map.insert("equal".to_string(), Value::Callable(native("assert.equal", -1, |_vm, a| {
        let left = a.get(0).cloned().unwrap_or(Value::Nil);
        let right = a.get(1).cloned().unwrap_or(Value::Nil);
        if Value::values_equal(&left, &right) {
            Ok(Value::Nil)
        } else {
            let msg = a
                .get(2)
                .map(|v| v.to_string())
                .unwrap_or_else(|| format!("expected {} to equal {}", left, right));
            Err(assertion_error(msg))
        }
    })));
    Value::map(map)
}
