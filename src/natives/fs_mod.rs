// File: src/natives/fs_mod.rs

use crate::callable::native;
use crate::value::Value;
use crate::vm::RuntimeError;

use super::util::string;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("read".to_string(), Value::Callable(native("fs.read", 1, |_vm, a| {
        let path = string(a, 0, "fs.read")?;
        std::fs::read_to_string(path.as_str())
            .map(Value::string)
            .map_err(|e| RuntimeError::host(format!("fs.read: {}", e)))
    })));
    map.insert("write".to_string(), Value::Callable(native("fs.write", 2, |_vm, a| {
        let path = string(a, 0, "fs.write")?;
        let contents = string(a, 1, "fs.write")?;
        std::fs::write(path.as_str(), contents.as_str())
            .map(|_| Value::Nil)
            .map_err(|e| RuntimeError::host(format!("fs.write: {}", e)))
    })));
    map.insert("exists".to_string(), Value::Callable(native("fs.exists", 1, |_vm, a| {
        let path = string(a, 0, "fs.exists")?;
        Ok(Value::Bool(std::path::Path::new(path.as_str()).exists()))
    })));
    Value::map(map)
}
