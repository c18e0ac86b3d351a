// File: src/natives/array_mod.rs

use crate::callable::native;
use crate::value::Value;
use crate::vm::RuntimeError;

fn expect_array(args: &[Value], i: usize, func: &str) -> Result<std::rc::Rc<std::cell::RefCell<crate::value::Array>>, RuntimeError> {
    match args.get(i) {
        Some(Value::Array(a)) => Ok(a.clone()),
        _ => Err(RuntimeError::host(format!("{}: argument {} must be an array", func, i + 1))),
    }
}

pub fn build() -> Value {
    let mut map = crate::value::AHashMap::default();
    map.insert("len".to_string(), Value::Callable(native("array.len", 1, |_vm, a| {
        Ok(Value::Number(expect_array(a, 0, "array.len")?.borrow().elements.len() as f64))
    })));
    map.insert("push".to_string(), Value::Callable(native("array.push", 2, |_vm, a| {
        let arr = expect_array(a, 0, "array.push")?;
        arr.borrow_mut().elements.push(a[1].clone());
        Ok(Value::Nil)
    })));
    map.insert("pop".to_string(), Value::Callable(native("array.pop", 1, |_vm, a| {
        let arr = expect_array(a, 0, "array.pop")?;
        let result = arr.borrow_mut().elements.pop().unwrap_or(Value::Nil);
        Ok(result)
    })));
    map.insert("contains".to_string(), Value::Callable(native("array.contains", 2, |_vm, a| {
        let arr = expect_array(a, 0, "array.contains")?;
        let result = arr.borrow().elements.iter().any(|v| Value::values_equal(v, &a[1]));
        Ok(Value::Bool(result))
    })));
    map.insert("join".to_string(), Value::Callable(native("array.join", 2, |_vm, a| {
        let arr = expect_array(a, 0, "array.join")?;
        let sep = match &a[1] {
            Value::String(s) => s.as_str().to_string(),
            other => return Err(RuntimeError::host(format!("array.join: separator must be a string, got {}", other.type_name()))),
        };
        let parts: Vec<String> = arr.borrow().elements.iter().map(|v| v.to_string()).collect();
        Ok(Value::string(parts.join(&sep)))
    })));
    map.insert("slice".to_string(), Value::Callable(native("array.slice", 3, |_vm, a| {
        let arr = expect_array(a, 0, "array.slice")?;
        let start = a[1].as_number().ok_or_else(|| RuntimeError::host("array.slice: start must be a number"))? as usize;
        let end = a[2].as_number().ok_or_else(|| RuntimeError::host("array.slice: end must be a number"))? as usize;
        let elements = &arr.borrow().elements;
        if start > end || end > elements.len() {
            return Err(RuntimeError::host("array.slice: range out of bounds"));
        }
        Ok(Value::array(elements[start..end].to_vec()))
    })));
    Value::map(map)
}
