// File: src/natives/mod.rs
//
// Native module registry. Every module is a plain `Value::Map` bound
// as a global under its module name; `IMPORT "math"` is a no-op
// because the global already exists when the VM starts (spec §4.4,
// SPEC_FULL.md §10).

mod array_mod;
mod assert_mod;
mod env_mod;
mod fs_mod;
mod io_mod;
mod json_mod;
mod log_mod;
mod math_mod;
mod path_mod;
mod process_mod;
mod regex_mod;
mod string_mod;
mod time_mod;
mod util;

use std::rc::Rc;

use crate::callable::Callable;
use crate::value::{AHashMap, Value};
use crate::vm::Vm;

/// Builds a `Value::Map` from a list of (name, callable) pairs, the
/// shape every native module takes.
pub fn module_map(entries: Vec<(&str, Rc<dyn Callable>)>) -> Value {
    let mut map = AHashMap::default();
    for (name, f) in entries {
        map.insert(name.to_string(), Value::Callable(f));
    }
    Value::map(map)
}

/// Modules named in the spec but intentionally left unimplemented:
/// bound as an empty map so `IMPORT` succeeds but every member access
/// raises a `TypeError` (spec §10, Non-goals: no UI/audio/image/IPC/
/// network surface in this engine).
const STUB_MODULES: &[&str] = &["ui", "audio", "image", "ipc", "net"];

pub fn register_all(vm: &mut Vm) {
    vm.globals_set(
        "__make_array",
        Value::Callable(crate::callable::native("__make_array", -1, |_vm, args| {
            Ok(Value::array(args.to_vec()))
        })),
    );
    vm.globals_set(
        "__make_map",
        Value::Callable(crate::callable::native("__make_map", -1, |_vm, args| {
            if args.len() % 2 != 0 {
                return Err(crate::vm::RuntimeError::host("map literal requires key/value pairs"));
            }
            let mut map = AHashMap::default();
            let mut it = args.iter();
            while let (Some(k), Some(v)) = (it.next(), it.next()) {
                let key = match k {
                    Value::String(s) => s.as_str().to_string(),
                    other => return Err(crate::vm::RuntimeError::host(format!(
                        "map literal keys must be strings, got {}",
                        other.type_name()
                    ))),
                };
                map.insert(key, v.clone());
            }
            Ok(Value::map(map))
        })),
    );

    vm.globals_set("math", math_mod::build());
    vm.globals_set("string", string_mod::build());
    vm.globals_set("array", array_mod::build());
    vm.globals_set("io", io_mod::build());
    vm.globals_set("time", time_mod::build());
    vm.globals_set("json", json_mod::build());
    vm.globals_set("regex", regex_mod::build());
    vm.globals_set("assert", assert_mod::build());
    vm.globals_set("env", env_mod::build());
    vm.globals_set("process", process_mod::build());
    vm.globals_set("path", path_mod::build());
    vm.globals_set("fs", fs_mod::build());
    vm.globals_set("log", log_mod::build());

    for name in STUB_MODULES {
        vm.globals_set(name, module_map(Vec::new()));
    }
}
