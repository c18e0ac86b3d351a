// File: src/natives/regex_mod.rs

use crate::callable::native;
use crate::value::Value;
use crate::vm::RuntimeError;

use super::util::string;

fn compile(pattern: &str, func: &str) -> Result<regex::Regex, RuntimeError> {
    regex::Regex::new(pattern).map_err(|e| RuntimeError::host(format!("{}: invalid pattern: {}", func, e)))
}

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("is_match".to_string(), Value::Callable(native("regex.is_match", 2, |_vm, a| {
        let pattern = string(a, 0, "regex.is_match")?;
        let text = string(a, 1, "regex.is_match")?;
        Ok(Value::Bool(compile(&pattern, "regex.is_match")?.is_match(&text)))
    })));
    map.insert("find".to_string(), Value::Callable(native("regex.find", 2, |_vm, a| {
        let pattern = string(a, 0, "regex.find")?;
        let text = string(a, 1, "regex.find")?;
        match compile(&pattern, "regex.find")?.find(&text) {
            Some(m) => Ok(Value::string(m.as_str().to_string())),
            None => Ok(Value::Nil),
        }
    })));
    map.insert("replace".to_string(), Value::Callable(native("regex.replace", 3, |_vm, a| {
        let pattern = string(a, 0, "regex.replace")?;
        let text = string(a, 1, "regex.replace")?;
        let replacement = string(a, 2, "regex.replace")?;
        let re = compile(&pattern, "regex.replace")?;
        Ok(Value::string(re.replace_all(&text, replacement.as_str()).into_owned()))
    })));
    Value::map(map)
}
