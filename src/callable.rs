// File: src/callable.rs
//
// The native-callable contract: a uniform invocation surface shared by
// user functions, bound methods, class constructors, and native host
// functions.

use std::fmt;
use std::rc::Rc;

use crate::value::{Instance, Value};
use crate::vm::{RuntimeError, Vm};

/// Implemented by every invokable value. `arity() == -1` means variadic.
pub trait Callable: fmt::Debug {
    fn name(&self) -> &str;
    fn arity(&self) -> i32;
    fn call(&self, vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError>;

    /// Downcast hook used by the chunk serializer, which must
    /// distinguish a user-defined function (serializable) from a
    /// native one (not serializable).
    fn as_user_function(&self) -> Option<&UserFunction> {
        None
    }

    /// General downcast hook, used by the tree-walking interpreter to
    /// recover its own `InterpretedFunction` type from a `Value::Callable`
    /// without going through the VM's bytecode call path.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A function compiled from source: carries its own Chunk.
#[derive(Debug)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    pub chunk: Rc<crate::bytecode::Chunk>,
}

impl UserFunction {
    pub fn new(name: String, params: Vec<String>, chunk: Rc<crate::bytecode::Chunk>) -> Self {
        UserFunction { name, params, chunk }
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> i32 {
        self.params.len() as i32
    }

    fn call(&self, vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
        vm.call_user_function(&self.chunk, args)
    }

    fn as_user_function(&self) -> Option<&UserFunction> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A native host function backed by a Rust closure.
pub struct NativeFunction {
    pub name: String,
    pub arity: i32,
    pub func: Box<dyn Fn(&mut Vm, &[Value]) -> Result<Value, RuntimeError>>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> i32 {
        self.arity
    }

    fn call(&self, vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.func)(vm, args)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Binds a method to the instance it was resolved from so that `this`
/// refers to that instance when the body runs.
#[derive(Debug)]
pub struct BoundMethod {
    pub instance: Rc<Instance>,
    pub method: Rc<dyn Callable>,
}

impl Callable for BoundMethod {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn arity(&self) -> i32 {
        self.method.arity()
    }

    fn call(&self, vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
        vm.globals_set("this", Value::Instance(self.instance.clone()));
        if let Some(superclass) = &self.instance.class.superclass {
            vm.globals_set("super", Value::Class(superclass.clone()));
        }
        self.method.call(vm, args)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub fn native<F>(name: &str, arity: i32, func: F) -> Rc<dyn Callable>
where
    F: Fn(&mut Vm, &[Value]) -> Result<Value, RuntimeError> + 'static,
{
    Rc::new(NativeFunction {
        name: name.to_string(),
        arity,
        func: Box::new(func),
    })
}
