// File: src/natives/util.rs
//
// Argument-coercion helpers shared by the native modules, grounded on
// the teacher's pattern of validating native arguments eagerly rather
// than letting a bad cast panic deep inside a builtin.

use crate::value::Value;
use crate::vm::RuntimeError;

pub fn number(args: &[Value], i: usize, func: &str) -> Result<f64, RuntimeError> {
    args.get(i)
        .and_then(Value::as_number)
        .ok_or_else(|| RuntimeError::host(format!("{}: argument {} must be a number", func, i + 1)))
}

pub fn string(args: &[Value], i: usize, func: &str) -> Result<std::rc::Rc<String>, RuntimeError> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(RuntimeError::host(format!("{}: argument {} must be a string", func, i + 1))),
    }
}
