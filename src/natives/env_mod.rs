// File: src/natives/env_mod.rs

use crate::callable::native;
use crate::value::Value;

use super::util::string;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("get".to_string(), Value::Callable(native("env.get", 1, |_vm, a| {
        let name = string(a, 0, "env.get")?;
        Ok(std::env::var(name.as_str()).map(Value::string).unwrap_or(Value::Nil))
    })));
    map.insert("set".to_string(), Value::Callable(native("env.set", 2, |_vm, a| {
        let name = string(a, 0, "env.set")?;
        let value = string(a, 1, "env.set")?;
        std::env::set_var(name.as_str(), value.as_str());
        Ok(Value::Nil)
    })));
    Value::map(map)
}
