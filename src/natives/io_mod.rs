// File: src/natives/io_mod.rs

use std::io::Write;

use crate::callable::native;
use crate::value::Value;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("write".to_string(), Value::Callable(native("io.write", 1, |_vm, a| {
        print!("{}", a.get(0).cloned().unwrap_or(Value::Nil));
        std::io::stdout().flush().ok();
        Ok(Value::Nil)
    })));
    map.insert("read_line".to_string(), Value::Callable(native("io.read_line", 0, |_vm, _a| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => Ok(Value::Nil),
            Ok(_) => Ok(Value::string(line.trim_end_matches('\n').to_string())),
            Err(e) => Err(crate::vm::RuntimeError::host(format!("io.read_line: {}", e))),
        }
    })));
    Value::map(map)
}
