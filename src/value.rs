// File: src/value.rs
//
// The runtime value model shared by the compiler, the bytecode VM, and
// the tree-walking interpreter.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::rc::Rc;

use ahash::AHasher;

use crate::callable::Callable;

pub type AHashMap<K, V> = HashMap<K, V, BuildHasherDefault<AHasher>>;

/// A shared, mutable array of values.
#[derive(Debug, Default)]
pub struct Array {
    pub elements: Vec<Value>,
}

/// A shared, mutable string-keyed map.
#[derive(Debug, Default)]
pub struct Map {
    pub entries: AHashMap<String, Value>,
}

/// A shared, mutable set of primitive values, keyed by canonical string.
#[derive(Debug, Default)]
pub struct Set {
    pub entries: AHashMap<String, Value>,
}

/// A runtime object: a back-reference to its class plus a field map.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<AHashMap<String, Value>>,
}

/// A class definition: a subtype of Callable whose invocation builds an Instance.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub methods: AHashMap<String, Rc<dyn Callable>>,
    pub field_names: Vec<String>,
    pub field_defaults: AHashMap<String, Value>,
    pub superclass: Option<Rc<Class>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<dyn Callable>> {
        if let Some(m) = self.methods.get(name) {
            return Some(m.clone());
        }
        self.superclass.as_ref().and_then(|sc| sc.find_method(name))
    }
}

/// A language-level error value: serializable, carries message + type.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub message: String,
    pub type_name: String,
}

/// The tagged value sum described by the value model.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<String>),
    Array(Rc<RefCell<Array>>),
    Map(Rc<RefCell<Map>>),
    Set(Rc<RefCell<Set>>),
    Callable(Rc<dyn Callable>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Error(Rc<ErrorValue>),
}

impl Value {
    pub fn string<S: Into<String>>(s: S) -> Value {
        Value::String(Rc::new(s.into()))
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(Array { elements })))
    }

    pub fn map(entries: AHashMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(Map { entries })))
    }

    pub fn error<S: Into<String>, T: Into<String>>(message: S, type_name: T) -> Value {
        Value::Error(Rc::new(ErrorValue {
            message: message.into(),
            type_name: type_name.into(),
        }))
    }

    /// Truthiness per the value model: Nil is false, Bool is itself,
    /// Number is nonzero, String/Array/Map are non-empty, everything
    /// else (Set, Callable, Class, Instance, Error) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().elements.is_empty(),
            Value::Map(m) => !m.borrow().entries.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Callable(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Error(_) => "error",
        }
    }

    /// Canonical key used by Set membership. Only primitives are
    /// supported; callers must reject everything else before calling.
    pub fn set_key(&self) -> Result<String, String> {
        match self {
            Value::Nil => Ok("nil".to_string()),
            Value::Bool(b) => Ok(if *b { "true".to_string() } else { "false".to_string() }),
            Value::Number(n) => Ok(format!("{:.15e}", n)),
            Value::String(s) => Ok(s.as_str().to_string()),
            other => Err(format!("unsupported set element type: {}", other.type_name())),
        }
    }

    /// Structural equality. Heap kinds compare by reference identity,
    /// which is deterministic and sufficient per the value model.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
            (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(x, y),
            (Value::Set(x), Value::Set(y)) => Rc::ptr_eq(x, y),
            (Value::Callable(x), Value::Callable(y)) => Rc::ptr_eq(x, y),
            (Value::Class(x), Value::Class(y)) => Rc::ptr_eq(x, y),
            (Value::Instance(x), Value::Instance(y)) => Rc::ptr_eq(x, y),
            (Value::Error(x), Value::Error(y)) => x == y,
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.borrow().elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.borrow().entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Set(s) => {
                write!(f, "{{")?;
                for (i, v) in s.borrow().entries.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "}}")
            }
            Value::Callable(c) => write!(f, "<function {}>", c.name()),
            Value::Class(c) => write!(f, "<class {}>", c.name),
            Value::Instance(i) => write!(f, "<{} instance>", i.class.name),
            Value::Error(e) => write!(f, "{}: {}", e.type_name, e.message),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_value_model() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(0.1).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
    }

    #[test]
    fn set_key_rejects_heap_values() {
        assert!(Value::array(vec![]).set_key().is_err());
        assert_eq!(Value::Bool(true).set_key().unwrap(), "true");
        assert_eq!(Value::Nil.set_key().unwrap(), "nil");
    }

    #[test]
    fn equality_is_reference_identity_for_heap_kinds() {
        let a = Value::array(vec![Value::Number(1.0)]);
        let b = Value::array(vec![Value::Number(1.0)]);
        assert!(!Value::values_equal(&a, &b));
        let c = a.clone();
        assert!(Value::values_equal(&a, &c));
    }
}
