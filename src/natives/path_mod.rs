// File: src/natives/path_mod.rs

use std::path::Path;

use crate::callable::native;
use crate::value::Value;

use super::util::string;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("join".to_string(), Value::Callable(native("path.join", 2, |_vm, a| {
        let base = string(a, 0, "path.join")?;
        let part = string(a, 1, "path.join")?;
        Ok(Value::string(Path::new(base.as_str()).join(part.as_str()).to_string_lossy().into_owned()))
    })));
    map.insert("exists".to_string(), Value::Callable(native("path.exists", 1, |_vm, a| {
        let p = string(a, 0, "path.exists")?;
        Ok(Value::Bool(Path::new(p.as_str()).exists()))
    })));
    map.insert("basename".to_string(), Value::Callable(native("path.basename", 1, |_vm, a| {
        let p = string(a, 0, "path.basename")?;
        Ok(Value::string(
            Path::new(p.as_str()).file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        ))
    })));
    map.insert("dirname".to_string(), Value::Callable(native("path.dirname", 1, |_vm, a| {
        let p = string(a, 0, "path.dirname")?;
        Ok(Value::string(
            Path::new(p.as_str()).parent().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        ))
    })));
    Value::map(map)
}
