// File: src/vm.rs
//
// The bytecode virtual machine: a single operand stack shared across
// call frames, a flat globals map, and a separate handler stack for
// try/catch/finally unwinding.

use std::fmt;
use std::rc::Rc;

use crate::bytecode::{Chunk, Op};
use crate::callable::{BoundMethod, UserFunction};
use crate::config::Config;
use crate::errors::IziError;
use crate::value::{AHashMap, Class, Instance, Value};

/// A runtime failure that unwinds through the handler stack. `Thrown`
/// carries the language-level exception value; `Host` wraps a failure
/// that originated on the Rust side (a native function, an opcode
/// precondition) and is converted to a `Value::Error` when it reaches
/// a handler or the top level.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    Thrown(Value),
    Host(String),
}

impl RuntimeError {
    pub fn host(message: impl Into<String>) -> Self {
        RuntimeError::Host(message.into())
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            RuntimeError::Thrown(v) => v,
            RuntimeError::Host(msg) => Value::error(msg, "RuntimeError"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Thrown(v) => write!(f, "uncaught exception: {}", v),
            RuntimeError::Host(m) => write!(f, "{}", m),
        }
    }
}

struct CallFrame {
    chunk: Rc<Chunk>,
    ip: usize,
    stack_base: usize,
}

struct HandlerFrame {
    frame_index: usize,
    catch_ip: Option<usize>,
    finally_ip: Option<usize>,
    stack_depth: usize,
    catch_var: Option<String>,
}

pub struct Vm {
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    handlers: Vec<HandlerFrame>,
    globals: AHashMap<String, Value>,
    config: Config,
    is_running: bool,
}

impl Vm {
    pub fn new(config: Config) -> Self {
        let mut vm = Vm {
            stack: Vec::with_capacity(config.stack_reserve),
            frames: Vec::new(),
            handlers: Vec::new(),
            globals: AHashMap::default(),
            config,
            is_running: false,
        };
        crate::natives::register_all(&mut vm);
        vm
    }

    pub fn globals_set(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    pub fn globals_get(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }

    pub fn known_global_names(&self) -> Vec<&str> {
        self.globals.keys().map(|s| s.as_str()).collect()
    }

    /// Snapshot of every global binding, used to seed the tree-walking
    /// interpreter's environment with the same native modules the
    /// bytecode VM registers at startup.
    pub fn globals_snapshot(&self) -> Vec<(String, Value)> {
        self.globals.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Executes `chunk` as a top-level program, returning the final
    /// popped value of the implicit program frame (nil if nothing was
    /// left on the stack).
    pub fn run_chunk(&mut self, chunk: Rc<Chunk>) -> Result<Value, RuntimeError> {
        self.push_frame(chunk)?;
        self.run()
    }

    /// Invokes a user-defined function from inside a native call,
    /// re-entering the dispatch loop. Mirrors the reference VM's
    /// `startingFrameCount` pattern so a native callback can call back
    /// into the interpreted program without disturbing the caller's
    /// own frame accounting.
    pub fn call_user_function(&mut self, chunk: &Rc<Chunk>, args: &[Value]) -> Result<Value, RuntimeError> {
        self.push_frame(chunk.clone())?;
        let base = self.frames.last().unwrap().stack_base;
        for (i, a) in args.iter().enumerate() {
            if base + i < self.stack.len() {
                self.stack[base + i] = a.clone();
            } else {
                self.stack.push(a.clone());
            }
        }
        self.run()
    }

    fn push_frame(&mut self, chunk: Rc<Chunk>) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.config.max_call_frames {
            return Err(RuntimeError::host("stack overflow: exceeded maximum call depth"));
        }
        let stack_base = self.stack.len();
        self.frames.push(CallFrame { chunk, ip: 0, stack_base });
        Ok(())
    }

    /// The dispatch loop. Reentrant: a native function may call back
    /// into `call_user_function`, which calls `run()` again. Each
    /// invocation tracks its own starting frame count so it knows when
    /// to return control to its caller rather than keep dispatching.
    fn run(&mut self) -> Result<Value, RuntimeError> {
        let starting_frame_count = self.frames.len();
        let was_running = self.is_running;
        self.is_running = true;

        let result = self.dispatch(starting_frame_count);

        self.is_running = was_running;
        result
    }

    fn current_byte(&self) -> u8 {
        let frame = self.frames.last().unwrap();
        frame.chunk.code[frame.ip]
    }

    fn advance(&mut self) -> u8 {
        let frame = self.frames.last_mut().unwrap();
        let b = frame.chunk.code[frame.ip];
        frame.ip += 1;
        b
    }

    fn read_u16(&mut self) -> u16 {
        let hi = self.advance();
        let lo = self.advance();
        u16::from_be_bytes([hi, lo])
    }

    fn current_line(&self) -> i32 {
        let frame = self.frames.last().unwrap();
        frame.chunk.get_line(frame.ip)
    }

    fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("operand stack underflow")
    }

    fn peek(&self, back: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - back]
    }

    fn host_err(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::host(format!("{} (line {})", message.into(), self.current_line()))
    }

    fn dispatch(&mut self, starting_frame_count: usize) -> Result<Value, RuntimeError> {
        loop {
            if self.frames.is_empty() {
                return Ok(Value::Nil);
            }
            let frame_ip_past_end = {
                let frame = self.frames.last().unwrap();
                frame.ip >= frame.chunk.code.len()
            };
            if frame_ip_past_end {
                // Body fell off the end without an explicit return.
                match self.pop_frame_on_return(Value::Nil, starting_frame_count)? {
                    Some(v) => return Ok(v),
                    None => continue,
                }
            }

            let byte = self.current_byte();
            let op = match Op::from_byte(byte) {
                Some(op) => op,
                None => return Err(self.host_err(format!("invalid opcode byte {}", byte))),
            };
            self.advance();

            let step_result = self.execute(op);
            match step_result {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Return(v)) => {
                    match self.pop_frame_on_return(v, starting_frame_count)? {
                        Some(out) => return Ok(out),
                        None => continue,
                    }
                }
                Err(err) => {
                    if self.unwind_to_handler(err.clone())? {
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Pops the finished frame and either returns the value to this
    /// `run()` invocation's caller (if the frame stack has drained back
    /// to where this invocation started) or pushes it for the calling
    /// frame's bytecode to consume.
    fn pop_frame_on_return(
        &mut self,
        value: Value,
        starting_frame_count: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        self.frames.pop();
        if self.frames.len() < starting_frame_count {
            Ok(Some(value))
        } else {
            self.push(value);
            Ok(None)
        }
    }

    fn execute(&mut self, op: Op) -> Result<StepOutcome, RuntimeError> {
        match op {
            Op::Constant => {
                let idx = self.advance();
                let v = self.frames.last().unwrap().chunk.constants[idx as usize].clone();
                self.push(v);
            }
            Op::Nil => self.push(Value::Nil),
            Op::True => self.push(Value::Bool(true)),
            Op::False => self.push(Value::Bool(false)),
            Op::Pop => {
                self.pop();
            }
            Op::Add => self.binary_numeric_or_concat(|a, b| a + b)?,
            Op::Sub => self.binary_numeric(|a, b| a - b)?,
            Op::Mul => self.binary_numeric(|a, b| a * b)?,
            Op::Div => self.binary_numeric(|a, b| a / b)?,
            Op::Mod => self.binary_numeric(|a, b| a % b)?,
            Op::Negate => {
                let v = self.pop();
                match v.as_number() {
                    Some(n) => self.push(Value::Number(-n)),
                    None => return Err(self.type_error("unary '-'", &v)),
                }
            }
            Op::Not => {
                let v = self.pop();
                self.push(Value::Bool(!v.is_truthy()));
            }
            Op::Equal => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(Value::values_equal(&a, &b)));
            }
            Op::NotEqual => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(!Value::values_equal(&a, &b)));
            }
            Op::Greater => self.compare(|o| o == std::cmp::Ordering::Greater)?,
            Op::GreaterEqual => self.compare(|o| o != std::cmp::Ordering::Less)?,
            Op::Less => self.compare(|o| o == std::cmp::Ordering::Less)?,
            Op::LessEqual => self.compare(|o| o != std::cmp::Ordering::Greater)?,
            Op::GetGlobal => {
                let idx = self.advance();
                let name = self.frames.last().unwrap().chunk.names[idx as usize].clone();
                match self.globals.get(&name) {
                    Some(v) => self.push(v.clone()),
                    None => {
                        let known: Vec<&str> = self.globals.keys().map(|s| s.as_str()).collect();
                        return Err(RuntimeError::Thrown(Value::Error(Rc::new(
                            crate::value::ErrorValue {
                                message: IziError::name_error(&name, &known).message,
                                type_name: "NameError".to_string(),
                            },
                        ))));
                    }
                }
            }
            Op::SetGlobal => {
                let idx = self.advance();
                let name = self.frames.last().unwrap().chunk.names[idx as usize].clone();
                let v = self.peek(0).clone();
                self.globals.insert(name, v);
            }
            Op::GetLocal => {
                let slot = self.advance() as usize;
                let base = self.frames.last().unwrap().stack_base;
                self.push(self.stack[base + slot].clone());
            }
            Op::SetLocal => {
                let slot = self.advance() as usize;
                let base = self.frames.last().unwrap().stack_base;
                let v = self.peek(0).clone();
                self.stack[base + slot] = v;
            }
            Op::Index => {
                let index = self.pop();
                let collection = self.pop();
                let v = self.index_get(&collection, &index)?;
                self.push(v);
            }
            Op::SetIndex => {
                let value = self.pop();
                let index = self.pop();
                let collection = self.pop();
                self.index_set(&collection, &index, value.clone())?;
                self.push(value);
            }
            Op::Jump => {
                let offset = self.read_u16() as usize;
                self.frames.last_mut().unwrap().ip += offset;
            }
            Op::JumpIfFalse => {
                let offset = self.read_u16() as usize;
                if !self.peek(0).is_truthy() {
                    self.frames.last_mut().unwrap().ip += offset;
                }
            }
            Op::Loop => {
                let offset = self.read_u16() as usize;
                self.frames.last_mut().unwrap().ip -= offset;
            }
            Op::Call => {
                let argc = self.advance() as usize;
                return self.op_call(argc);
            }
            Op::Return => {
                let v = self.pop();
                return Ok(StepOutcome::Return(v));
            }
            Op::Print => {
                let v = self.pop();
                println!("{}", v);
            }
            Op::Try => return self.op_try(),
            Op::Throw => {
                let v = self.pop();
                return Err(RuntimeError::Thrown(v));
            }
            Op::EndTry => {
                self.handlers.pop();
            }
            Op::GetProperty => {
                let idx = self.advance();
                let name = self.frames.last().unwrap().chunk.names[idx as usize].clone();
                let obj = self.pop();
                let v = self.get_property(&obj, &name)?;
                self.push(v);
            }
            Op::SetProperty => {
                let idx = self.advance();
                let name = self.frames.last().unwrap().chunk.names[idx as usize].clone();
                let value = self.pop();
                let obj = self.pop();
                self.set_property(&obj, &name, value.clone())?;
                self.push(value);
            }
            Op::GetSuperMethod => {
                let idx = self.advance();
                let name = self.frames.last().unwrap().chunk.names[idx as usize].clone();
                let this_v = self.pop();
                let super_v = self.pop();
                let bound = self.bind_super_method(&super_v, &this_v, &name)?;
                self.push(bound);
            }
        }
        Ok(StepOutcome::Continue)
    }

    fn binary_numeric(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => {
                self.push(Value::Number(f(x, y)));
                Ok(())
            }
            _ => Err(self.host_err(format!(
                "operator expects numbers, got {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn binary_numeric_or_concat(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => {
                self.push(Value::Number(f(*x, *y)));
                Ok(())
            }
            (Value::String(_), _) | (_, Value::String(_)) => {
                self.push(Value::string(format!("{}{}", a, b)));
                Ok(())
            }
            _ => Err(self.host_err(format!(
                "'+' expects numbers or strings, got {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn compare(&mut self, accept: impl Fn(std::cmp::Ordering) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).ok_or_else(|| self.host_err("cannot compare NaN"))?;
                self.push(Value::Bool(accept(ord)));
                Ok(())
            }
            _ => Err(self.host_err(format!(
                "comparison expects numbers, got {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn type_error(&self, op: &str, v: &Value) -> RuntimeError {
        self.host_err(format!("{} is not defined for {}", op, v.type_name()))
    }

    fn index_get(&self, collection: &Value, index: &Value) -> Result<Value, RuntimeError> {
        match collection {
            Value::Array(a) => {
                let i = self.array_index(index, a.borrow().elements.len())?;
                Ok(a.borrow().elements[i].clone())
            }
            Value::Map(m) => {
                let key = match index {
                    Value::String(s) => s.as_str().to_string(),
                    other => return Err(self.host_err(format!("map keys must be strings, got {}", other.type_name()))),
                };
                Ok(m.borrow().entries.get(&key).cloned().unwrap_or(Value::Nil))
            }
            Value::String(s) => {
                let i = self.array_index(index, s.chars().count())?;
                Ok(Value::string(s.chars().nth(i).unwrap().to_string()))
            }
            other => Err(self.host_err(format!("cannot index into {}", other.type_name()))),
        }
    }

    fn index_set(&self, collection: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
        match collection {
            Value::Array(a) => {
                let len = a.borrow().elements.len();
                let i = self.array_index(index, len)?;
                a.borrow_mut().elements[i] = value;
                Ok(())
            }
            Value::Map(m) => {
                let key = match index {
                    Value::String(s) => s.as_str().to_string(),
                    other => return Err(self.host_err(format!("map keys must be strings, got {}", other.type_name()))),
                };
                m.borrow_mut().entries.insert(key, value);
                Ok(())
            }
            other => Err(self.host_err(format!("cannot assign into {}", other.type_name()))),
        }
    }

    fn array_index(&self, index: &Value, len: usize) -> Result<usize, RuntimeError> {
        let n = index
            .as_number()
            .ok_or_else(|| self.host_err(format!("index must be a number, got {}", index.type_name())))?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(self.host_err("index must be a non-negative whole number"));
        }
        let i = n as usize;
        if i >= len {
            return Err(self.host_err(format!("index {} out of bounds (length {})", i, len)));
        }
        Ok(i)
    }

    fn get_property(&mut self, obj: &Value, name: &str) -> Result<Value, RuntimeError> {
        match obj {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.borrow().get(name) {
                    return Ok(v.clone());
                }
                if let Some(method) = inst.class.find_method(name) {
                    return Ok(Value::Callable(Rc::new(BoundMethod { instance: inst.clone(), method })));
                }
                Err(self.host_err(format!("undefined property '{}' on {} instance", name, inst.class.name)))
            }
            Value::Error(e) => match name {
                "message" => Ok(Value::string(e.message.clone())),
                "type" => Ok(Value::string(e.type_name.clone())),
                _ => Err(self.host_err(format!("undefined property '{}' on error", name))),
            },
            // Native and stub modules are represented as plain Maps;
            // member access is a map lookup, so an unimplemented module
            // (ui/audio/image/ipc/net) naturally raises on every member.
            Value::Map(m) => match m.borrow().entries.get(name) {
                Some(v) => Ok(v.clone()),
                None => Err(RuntimeError::Thrown(Value::error(
                    format!("undefined property '{}' on map", name),
                    "TypeError",
                ))),
            },
            Value::Array(_) => Err(RuntimeError::Thrown(Value::error(
                format!("undefined property '{}' on array", name),
                "TypeError",
            ))),
            other => Err(self.host_err(format!("cannot access property '{}' on {}", name, other.type_name()))),
        }
    }

    fn set_property(&mut self, obj: &Value, name: &str, value: Value) -> Result<(), RuntimeError> {
        match obj {
            Value::Instance(inst) => {
                inst.fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(self.host_err(format!("cannot set property '{}' on {}", name, other.type_name()))),
        }
    }

    fn bind_super_method(&self, super_v: &Value, this_v: &Value, name: &str) -> Result<Value, RuntimeError> {
        let superclass = match super_v {
            Value::Class(c) => c.clone(),
            _ => return Err(self.host_err("'super' used outside a subclass method")),
        };
        let instance = match this_v {
            Value::Instance(i) => i.clone(),
            _ => return Err(self.host_err("'super' used outside an instance method")),
        };
        let method = superclass
            .find_method(name)
            .ok_or_else(|| self.host_err(format!("superclass has no method '{}'", name)))?;
        Ok(Value::Callable(Rc::new(BoundMethod { instance, method })))
    }

    fn op_call(&mut self, argc: usize) -> Result<StepOutcome, RuntimeError> {
        let args: Vec<Value> = self.stack.split_off(self.stack.len() - argc);
        let callee = self.pop();
        match callee {
            Value::Callable(c) => {
                if c.arity() >= 0 && c.arity() as usize != argc {
                    return Err(self.host_err(format!(
                        "'{}' expects {} argument(s), got {}",
                        c.name(),
                        c.arity(),
                        argc
                    )));
                }
                if let Some(user_fn) = c.as_user_function() {
                    return self.call_user_function_inline(user_fn, &args);
                }
                let v = c.call(self, &args)?;
                self.push(v);
                Ok(StepOutcome::Continue)
            }
            Value::Class(class) => {
                let instance = self.construct_instance(&class, &args)?;
                self.push(instance);
                Ok(StepOutcome::Continue)
            }
            other => Err(self.host_err(format!("{} is not callable", other.type_name()))),
        }
    }

    /// Pushes a new frame for a user function called from bytecode
    /// (rather than from a native re-entrant call) so the dispatch
    /// loop's own RETURN handling applies, instead of recursing through
    /// `run()` again.
    fn call_user_function_inline(&mut self, f: &UserFunction, args: &[Value]) -> Result<StepOutcome, RuntimeError> {
        self.push_frame(f.chunk.clone())?;
        for a in args {
            self.push(a.clone());
        }
        Ok(StepOutcome::Continue)
    }

    fn construct_instance(&mut self, class: &Rc<Class>, args: &[Value]) -> Result<Value, RuntimeError> {
        let instance = Rc::new(Instance {
            class: class.clone(),
            fields: std::cell::RefCell::new(class.field_defaults.clone()),
        });
        if let Some(ctor) = class.find_method("constructor") {
            self.globals_set("this", Value::Instance(instance.clone()));
            if let Some(superclass) = &class.superclass {
                self.globals_set("super", Value::Class(superclass.clone()));
            }
            ctor.call(self, args)?;
        }
        Ok(Value::Instance(instance))
    }

    fn op_try(&mut self) -> Result<StepOutcome, RuntimeError> {
        let catch_off = self.read_u16() as usize;
        let finally_off = self.read_u16() as usize;
        let catch_var_idx = self.advance();
        let operands_end = self.frames.last().unwrap().ip;
        let catch_var = if catch_off != 0 {
            Some(self.frames.last().unwrap().chunk.names[catch_var_idx as usize].clone())
        } else {
            None
        };
        self.handlers.push(HandlerFrame {
            frame_index: self.frames.len() - 1,
            catch_ip: if catch_off != 0 { Some(operands_end + catch_off) } else { None },
            finally_ip: if finally_off != 0 { Some(operands_end + finally_off) } else { None },
            stack_depth: self.stack.len(),
            catch_var,
        });
        Ok(StepOutcome::Continue)
    }

    /// Walks the handler stack top-down, discarding handlers whose
    /// owning frame has already been popped by a prior unwind, until it
    /// finds one that can take this exception or the stack is
    /// exhausted (propagate to the caller).
    fn unwind_to_handler(&mut self, err: RuntimeError) -> Result<bool, RuntimeError> {
        while let Some(handler) = self.handlers.pop() {
            if handler.frame_index >= self.frames.len() {
                continue; // stale: its frame already unwound past this point
            }
            self.frames.truncate(handler.frame_index + 1);
            self.stack.truncate(handler.stack_depth);

            if let Some(catch_ip) = handler.catch_ip {
                let value = err.into_value();
                if let Some(var) = &handler.catch_var {
                    self.globals_set(var, value);
                }
                self.frames.last_mut().unwrap().ip = catch_ip;
                return Ok(true);
            }
            if let Some(finally_ip) = handler.finally_ip {
                // Bare try/finally: the finally block runs and the
                // exception is swallowed, per the documented
                // simplification (no re-throw after finally).
                self.frames.last_mut().unwrap().ip = finally_ip;
                return Ok(true);
            }
        }
        Err(err)
    }
}

enum StepOutcome {
    Continue,
    Return(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_source;

    fn as_number(v: Option<Value>) -> f64 {
        match v {
            Some(Value::Number(n)) => n,
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_evaluates_left_to_right_with_precedence() {
        let chunk = compile_source("var x = 2 + 3 * 4;", None, Config::default()).unwrap();
        let mut vm = Vm::new(Config::default());
        vm.run_chunk(Rc::new(chunk)).unwrap();
        assert_eq!(as_number(vm.globals_get("x")), 14.0);
    }

    #[test]
    fn functions_return_values_through_call() {
        let chunk = compile_source("fn add(a, b) { return a + b; } var r = add(2, 40);", None, Config::default())
            .unwrap();
        let mut vm = Vm::new(Config::default());
        vm.run_chunk(Rc::new(chunk)).unwrap();
        assert_eq!(as_number(vm.globals_get("r")), 42.0);
    }

    #[test]
    fn while_loop_with_break_terminates() {
        let chunk = compile_source(
            "var i = 0; while (true) { i = i + 1; if (i == 3) { break; } } var r = i;",
            None,
            Config::default(),
        )
        .unwrap();
        let mut vm = Vm::new(Config::default());
        vm.run_chunk(Rc::new(chunk)).unwrap();
        assert_eq!(as_number(vm.globals_get("r")), 3.0);
    }

    #[test]
    fn try_catch_binds_the_thrown_value() {
        let chunk = compile_source(
            "var caught = nil; try { throw \"boom\"; } catch (e) { caught = e; }",
            None,
            Config::default(),
        )
        .unwrap();
        let mut vm = Vm::new(Config::default());
        vm.run_chunk(Rc::new(chunk)).unwrap();
        match vm.globals_get("caught") {
            Some(Value::String(s)) => assert_eq!(s.as_str(), "boom"),
            other => panic!("expected caught string, got {:?}", other),
        }
    }

    #[test]
    fn deep_recursion_raises_stack_overflow_as_a_host_error() {
        let chunk = compile_source("fn rec(n) { return rec(n + 1); } rec(0);", None, Config::default()).unwrap();
        let mut cfg = Config::default();
        cfg.max_call_frames = 16;
        let mut vm = Vm::new(cfg);
        let err = vm.run_chunk(Rc::new(chunk)).unwrap_err();
        assert!(matches!(err, RuntimeError::Host(_)));
    }

    #[test]
    fn super_dispatch_works_from_an_ordinary_method_call_not_just_the_constructor() {
        let source = r#"
class Animal {
  fn constructor(name) { this.name = name; }
  fn speak() { return this.name; }
}
class Dog < Animal {
  fn speak() { return super.speak(); }
}
var result = Dog("Rex").speak();
"#;
        let chunk = compile_source(source, None, Config::default()).unwrap();
        let mut vm = Vm::new(Config::default());
        vm.run_chunk(Rc::new(chunk)).unwrap();
        match vm.globals_get("result") {
            Some(Value::String(s)) => assert_eq!(s.as_str(), "Rex"),
            other => panic!("expected 'Rex', got {:?}", other),
        }
    }
}
