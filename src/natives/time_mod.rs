// File: src/natives/time_mod.rs

use crate::callable::native;
use crate::value::Value;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("now".to_string(), Value::Callable(native("time.now", 0, |_vm, _a| {
        let millis = chrono::Utc::now().timestamp_millis();
        Ok(Value::Number(millis as f64))
    })));
    Value::map(map)
}
