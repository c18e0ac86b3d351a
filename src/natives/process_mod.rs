// File: src/natives/process_mod.rs

use crate::callable::native;
use crate::value::Value;

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("args".to_string(), Value::Callable(native("process.args", 0, |_vm, _a| {
        // `izi run <file> -- ARGS...` forwards ARGS through this env var
        // rather than the process's own argv, since argv[0] is `izi`
        // itself followed by CLI subcommand plumbing, not the script's.
        let forwarded = std::env::var("IZI_SCRIPT_ARGS").unwrap_or_default();
        let values = if forwarded.is_empty() {
            Vec::new()
        } else {
            forwarded.split('\u{1f}').map(Value::string).collect()
        };
        Ok(Value::array(values))
    })));
    map.insert("exit".to_string(), Value::Callable(native("process.exit", 1, |_vm, a| {
        let code = a.get(0).and_then(Value::as_number).unwrap_or(0.0) as i32;
        std::process::exit(code);
    })));
    Value::map(map)
}
