// File: src/natives/string_mod.rs

use crate::callable::native;
use crate::value::Value;

use super::util::{number, string};

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("len".to_string(), Value::Callable(native("string.len", 1, |_vm, a| {
        Ok(Value::Number(string(a, 0, "string.len")?.chars().count() as f64))
    })));
    map.insert("upper".to_string(), Value::Callable(native("string.upper", 1, |_vm, a| {
        Ok(Value::string(string(a, 0, "string.upper")?.to_uppercase()))
    })));
    map.insert("lower".to_string(), Value::Callable(native("string.lower", 1, |_vm, a| {
        Ok(Value::string(string(a, 0, "string.lower")?.to_lowercase()))
    })));
    map.insert("trim".to_string(), Value::Callable(native("string.trim", 1, |_vm, a| {
        Ok(Value::string(string(a, 0, "string.trim")?.trim().to_string()))
    })));
    map.insert("contains".to_string(), Value::Callable(native("string.contains", 2, |_vm, a| {
        let haystack = string(a, 0, "string.contains")?;
        let needle = string(a, 1, "string.contains")?;
        Ok(Value::Bool(haystack.contains(needle.as_str())))
    })));
    map.insert("split".to_string(), Value::Callable(native("string.split", 2, |_vm, a| {
        let s = string(a, 0, "string.split")?;
        let sep = string(a, 1, "string.split")?;
        let parts: Vec<Value> = if sep.is_empty() {
            s.chars().map(|c| Value::string(c.to_string())).collect()
        } else {
            s.split(sep.as_str()).map(Value::string).collect()
        };
        Ok(Value::array(parts))
    })));
    map.insert("replace".to_string(), Value::Callable(native("string.replace", 3, |_vm, a| {
        let s = string(a, 0, "string.replace")?;
        let from = string(a, 1, "string.replace")?;
        let to = string(a, 2, "string.replace")?;
        Ok(Value::string(s.replace(from.as_str(), to.as_str())))
    })));
    map.insert("substring".to_string(), Value::Callable(native("string.substring", 3, |_vm, a| {
        let s = string(a, 0, "string.substring")?;
        let start = number(a, 1, "string.substring")? as usize;
        let end = number(a, 2, "string.substring")? as usize;
        let chars: Vec<char> = s.chars().collect();
        if start > end || end > chars.len() {
            return Err(crate::vm::RuntimeError::host("string.substring: range out of bounds"));
        }
        Ok(Value::string(chars[start..end].iter().collect::<String>()))
    })));
    Value::map(map)
}
