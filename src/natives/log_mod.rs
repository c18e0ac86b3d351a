// File: src/natives/log_mod.rs
//
// Thin binding onto the host's `log` facade, so script-level logging
// goes through the same subscriber as the CLI driver's own diagnostics.

use crate::callable::native;
use crate::value::Value;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("info".to_string(), Value::Callable(native("log.info", 1, |_vm, a| {
        log::info!("{}", a.get(0).cloned().unwrap_or(Value::Nil));
        Ok(Value::Nil)
    })));
    map.insert("warn".to_string(), Value::Callable(native("log.warn", 1, |_vm, a| {
        log::warn!("{}", a.get(0).cloned().unwrap_or(Value::Nil));
        Ok(Value::Nil)
    })));
    map.insert("error".to_string(), Value::Callable(native("log.error", 1, |_vm, a| {
        log::error!("{}", a.get(0).cloned().unwrap_or(Value::Nil));
        Ok(Value::Nil)
    })));
    map.insert("debug".to_string(), Value::Callable(native("log.debug", 1, |_vm, a| {
        log::debug!("{}", a.get(0).cloned().unwrap_or(Value::Nil));
        Ok(Value::Nil)
    })));
    Value::map(map)
}
