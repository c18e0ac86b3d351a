// File: src/interpreter.rs
//
// A tree-walking alternate engine that interprets the AST directly
// without compiling to bytecode. Out of scope for the core engine
// (the bytecode VM is canonical); kept as a secondary execution path
// reachable via `izi run --interpreter`, useful for cross-checking the
// compiler/VM pair against a simpler reference implementation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::*;
use crate::callable::{BoundMethod, Callable};
use crate::errors::IziError;
use crate::value::{AHashMap, Class, Instance, Value};
use crate::vm::{RuntimeError, Vm};

type Environment = Rc<RefCell<Scope>>;

#[derive(Debug)]
struct Scope {
    values: AHashMap<String, Value>,
    parent: Option<Environment>,
}

impl Scope {
    fn child(parent: Environment) -> Environment {
        Rc::new(RefCell::new(Scope { values: AHashMap::default(), parent: Some(parent) }))
    }

    fn root() -> Environment {
        Rc::new(RefCell::new(Scope { values: AHashMap::default(), parent: None }))
    }

    fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn get(env: &Environment, name: &str) -> Option<Value> {
        if let Some(v) = env.borrow().values.get(name) {
            return Some(v.clone());
        }
        let parent = env.borrow().parent.clone();
        parent.and_then(|p| Scope::get(&p, name))
    }

    fn assign(env: &Environment, name: &str, value: Value) -> bool {
        if env.borrow().values.contains_key(name) {
            env.borrow_mut().values.insert(name.to_string(), value);
            return true;
        }
        let parent = env.borrow().parent.clone();
        match parent {
            Some(p) => Scope::assign(&p, name, value),
            None => false,
        }
    }
}

enum Flow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: Environment,
    /// A minimal VM used only to give native functions (registered the
    /// same way as the bytecode engine) something to call back into.
    /// Its own bytecode dispatch loop is never entered from here.
    host: Vm,
}

impl Interpreter {
    pub fn new(config: crate::config::Config) -> Self {
        let host = Vm::new(config);
        let globals = Scope::root();
        for (name, value) in host.globals_snapshot() {
            globals.borrow_mut().define(&name, value);
        }
        Interpreter { globals, host }
    }

    pub fn run(&mut self, stmts: &[Stmt]) -> Result<Value, IziError> {
        let mut last = Value::Nil;
        for stmt in stmts {
            match self.exec_stmt(stmt, &self.globals.clone()) {
                Ok(Flow::Normal(v)) => last = v,
                Ok(Flow::Return(v)) => return Ok(v),
                Ok(Flow::Break) | Ok(Flow::Continue) => {
                    return Err(IziError::compile("'break'/'continue' used outside any loop"))
                }
                Err(RuntimeError::Thrown(v)) => {
                    return Err(IziError::runtime(format!("uncaught exception: {}", v)))
                }
                Err(RuntimeError::Host(m)) => return Err(IziError::runtime(m)),
            }
        }
        Ok(last)
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal(_) => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                let v = self.eval(expr, env)?;
                Ok(Flow::Normal(v))
            }
            Stmt::Print { value, .. } => {
                let v = self.eval(value, env)?;
                println!("{}", v);
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::VarDecl { name, init, .. } => {
                let v = match init {
                    Some(e) => self.eval(e, env)?,
                    None => Value::Nil,
                };
                env.borrow_mut().define(name, v);
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::FunctionDecl(decl) => {
                let f = self.make_function(decl, env.clone());
                env.borrow_mut().define(&decl.name, Value::Callable(f));
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::ClassDecl(decl) => {
                let class = self.make_class(decl, env)?;
                env.borrow_mut().define(&decl.name, Value::Class(Rc::new(class)));
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::Block { body } => {
                let child = Scope::child(env.clone());
                self.exec_block(body, &child)
            }
            Stmt::If { condition, then_branch, else_branch, .. } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.exec_block(then_branch, &Scope::child(env.clone()))
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, &Scope::child(env.clone()))
                } else {
                    Ok(Flow::Normal(Value::Nil))
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.eval(condition, env)?.is_truthy() {
                    match self.exec_block(body, &Scope::child(env.clone()))? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal(_) => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            }
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval(e, env)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(v))
            }
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Continue { .. } => Ok(Flow::Continue),
            Stmt::Try { body, catch_var, catch_body, finally_body, .. } => {
                let result = self.exec_block(body, &Scope::child(env.clone()));
                let outcome = match result {
                    Ok(flow) => Ok(flow),
                    Err(err) => {
                        if let Some(catch_body) = catch_body {
                            let catch_env = Scope::child(env.clone());
                            if let Some(var) = catch_var {
                                catch_env.borrow_mut().define(var, err.into_value());
                            }
                            self.exec_block(catch_body, &catch_env)
                        } else {
                            Err(err)
                        }
                    }
                };
                if let Some(finally_body) = finally_body {
                    self.exec_block(finally_body, &Scope::child(env.clone()))?;
                    // Bare try/finally without a catch swallows the
                    // exception, matching the documented simplification.
                    match outcome {
                        Err(_) if catch_body.is_none() => Ok(Flow::Normal(Value::Nil)),
                        other => other,
                    }
                } else {
                    outcome
                }
            }
            Stmt::Throw { value, .. } => {
                let v = self.eval(value, env)?;
                Err(RuntimeError::Thrown(v))
            }
            Stmt::Import { path, .. } => {
                if crate::module::is_native_module(path) {
                    return Ok(Flow::Normal(Value::Nil));
                }
                let source = std::fs::read_to_string(path)
                    .map_err(|e| RuntimeError::host(format!("cannot read module '{}': {}", path, e)))?;
                let tokens = crate::lexer::tokenize(&source);
                let stmts = crate::parser::Parser::new(tokens)
                    .parse()
                    .map_err(|e| RuntimeError::host(e.message))?;
                self.exec_block(&stmts, env)
            }
            Stmt::Export { .. } => Ok(Flow::Normal(Value::Nil)),
        }
    }

    fn eval(&mut self, expr: &Expr, env: &Environment) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Nil => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::string(s.clone()),
            }),
            Expr::Variable { name, .. } => Scope::get(env, name).ok_or_else(|| {
                let known: Vec<&str> = self.host.known_global_names();
                RuntimeError::Thrown(Value::error(IziError::name_error(name, &known).message, "NameError"))
            }),
            Expr::This { .. } => self.eval(&Expr::Variable { name: "this".to_string(), line: 0 }, env),
            Expr::Assign { name, value, .. } => {
                let v = self.eval(value, env)?;
                if !Scope::assign(env, name, v.clone()) {
                    return Err(RuntimeError::host(format!("assignment to undefined variable '{}'", name)));
                }
                Ok(v)
            }
            Expr::Grouping { inner } => self.eval(inner, env),
            Expr::Binary { left, op, right, .. } => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                self.apply_binary(*op, l, r)
            }
            Expr::Logical { left, op, right, .. } => {
                let l = self.eval(left, env)?;
                match op {
                    LogicalOp::And => {
                        if !l.is_truthy() {
                            Ok(l)
                        } else {
                            self.eval(right, env)
                        }
                    }
                    LogicalOp::Or => {
                        if l.is_truthy() {
                            Ok(l)
                        } else {
                            self.eval(right, env)
                        }
                    }
                }
            }
            Expr::Unary { op, operand, .. } => {
                let v = self.eval(operand, env)?;
                match op {
                    UnaryOp::Negate => v
                        .as_number()
                        .map(|n| Value::Number(-n))
                        .ok_or_else(|| RuntimeError::host(format!("unary '-' is not defined for {}", v.type_name()))),
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                }
            }
            Expr::Call { callee, args, .. } => {
                let callee_v = self.eval(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for a in args {
                    arg_values.push(self.eval(a, env)?);
                }
                self.invoke(callee_v, &arg_values)
            }
            Expr::Index { collection, index, .. } => {
                let c = self.eval(collection, env)?;
                let i = self.eval(index, env)?;
                self.index_get(&c, &i)
            }
            Expr::IndexAssign { collection, index, value, .. } => {
                let c = self.eval(collection, env)?;
                let i = self.eval(index, env)?;
                let v = self.eval(value, env)?;
                self.index_set(&c, &i, v.clone())?;
                Ok(v)
            }
            Expr::Property { object, name, .. } => {
                let obj = self.eval(object, env)?;
                self.get_property(&obj, name)
            }
            Expr::PropertyAssign { object, name, value, .. } => {
                let obj = self.eval(object, env)?;
                let v = self.eval(value, env)?;
                self.set_property(&obj, name, v.clone())?;
                Ok(v)
            }
            Expr::Super { method, .. } => {
                let super_v = Scope::get(env, "super")
                    .ok_or_else(|| RuntimeError::host("'super' used outside a subclass method"))?;
                let this_v = Scope::get(env, "this")
                    .ok_or_else(|| RuntimeError::host("'super' used outside an instance method"))?;
                match (super_v, this_v) {
                    (Value::Class(superclass), Value::Instance(instance)) => {
                        let m = superclass
                            .find_method(method)
                            .ok_or_else(|| RuntimeError::host(format!("superclass has no method '{}'", method)))?;
                        Ok(Value::Callable(Rc::new(BoundMethod { instance, method: m })))
                    }
                    _ => Err(RuntimeError::host("'super' used outside a subclass method")),
                }
            }
            Expr::ArrayLiteral { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval(e, env)?);
                }
                Ok(Value::array(values))
            }
            Expr::MapLiteral { entries, .. } => {
                let mut map = AHashMap::default();
                for (k, v) in entries {
                    map.insert(k.clone(), self.eval(v, env)?);
                }
                Ok(Value::map(map))
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value, RuntimeError> {
        use BinaryOp::*;
        if matches!(op, Equal) {
            return Ok(Value::Bool(Value::values_equal(&l, &r)));
        }
        if matches!(op, NotEqual) {
            return Ok(Value::Bool(!Value::values_equal(&l, &r)));
        }
        if matches!(op, Add) {
            return match (&l, &r) {
                (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
                (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::string(format!("{}{}", l, r))),
                _ => Err(RuntimeError::host(format!(
                    "'+' expects numbers or strings, got {} and {}",
                    l.type_name(),
                    r.type_name()
                ))),
            };
        }
        let (x, y) = match (l.as_number(), r.as_number()) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(RuntimeError::host(format!(
                    "operator expects numbers, got {} and {}",
                    l.type_name(),
                    r.type_name()
                )))
            }
        };
        Ok(match op {
            Sub => Value::Number(x - y),
            Mul => Value::Number(x * y),
            Div => Value::Number(x / y),
            Mod => Value::Number(x % y),
            Greater => Value::Bool(x > y),
            GreaterEqual => Value::Bool(x >= y),
            Less => Value::Bool(x < y),
            LessEqual => Value::Bool(x <= y),
            Add | Equal | NotEqual => unreachable!("handled above"),
        })
    }

    fn invoke(&mut self, callee: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Callable(c) => {
                if c.arity() >= 0 && c.arity() as usize != args.len() {
                    return Err(RuntimeError::host(format!(
                        "'{}' expects {} argument(s), got {}",
                        c.name(),
                        c.arity(),
                        args.len()
                    )));
                }
                if let Some(interpreted) = c.as_any().downcast_ref::<InterpretedFunction>() {
                    return self.call_interpreted(interpreted, args);
                }
                // A method reached via property access comes back as a
                // `BoundMethod` wrapping the interpreted function, not
                // the interpreted function itself, so the downcast
                // above misses it — unwrap one level before falling
                // back to the generic bytecode-VM `Callable::call` path
                // (which cannot run an `InterpretedFunction` at all).
                if let Some(bound) = c.as_any().downcast_ref::<BoundMethod>() {
                    if let Some(interpreted) = bound.method.as_any().downcast_ref::<InterpretedFunction>() {
                        return self.call_interpreted_method(interpreted, &bound.instance, args);
                    }
                }
                c.call(&mut self.host, args)
            }
            Value::Class(class) => self.construct(&class, args),
            other => Err(RuntimeError::host(format!("{} is not callable", other.type_name()))),
        }
    }

    fn call_interpreted(&mut self, f: &InterpretedFunction, args: &[Value]) -> Result<Value, RuntimeError> {
        let call_env = Scope::child(f.closure.clone());
        for (param, arg) in f.params.iter().zip(args.iter()) {
            call_env.borrow_mut().define(param, arg.clone());
        }
        match self.exec_block(&f.body, &call_env)? {
            Flow::Return(v) => Ok(v),
            _ => Ok(Value::Nil),
        }
    }

    fn call_interpreted_method(
        &mut self,
        f: &InterpretedFunction,
        instance: &Rc<Instance>,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let call_env = Scope::child(f.closure.clone());
        call_env.borrow_mut().define("this", Value::Instance(instance.clone()));
        if let Some(superclass) = &instance.class.superclass {
            call_env.borrow_mut().define("super", Value::Class(superclass.clone()));
        }
        for (param, arg) in f.params.iter().zip(args.iter()) {
            call_env.borrow_mut().define(param, arg.clone());
        }
        match self.exec_block(&f.body, &call_env)? {
            Flow::Return(v) => Ok(v),
            _ => Ok(Value::Nil),
        }
    }

    fn construct(&mut self, class: &Rc<Class>, args: &[Value]) -> Result<Value, RuntimeError> {
        let instance = Rc::new(Instance {
            class: class.clone(),
            fields: RefCell::new(class.field_defaults.clone()),
        });
        if let Some(ctor) = class.find_method("constructor") {
            if let Some(interpreted) = ctor.as_any().downcast_ref::<InterpretedFunction>() {
                self.call_interpreted_method(interpreted, &instance, args)?;
            } else {
                self.host.globals_set("this", Value::Instance(instance.clone()));
                ctor.call(&mut self.host, args)?;
            }
        }
        Ok(Value::Instance(instance))
    }

    fn index_get(&self, collection: &Value, index: &Value) -> Result<Value, RuntimeError> {
        match collection {
            Value::Array(a) => {
                let i = self.array_index(index, a.borrow().elements.len())?;
                Ok(a.borrow().elements[i].clone())
            }
            Value::Map(m) => match index {
                Value::String(s) => Ok(m.borrow().entries.get(s.as_str()).cloned().unwrap_or(Value::Nil)),
                other => Err(RuntimeError::host(format!("map keys must be strings, got {}", other.type_name()))),
            },
            other => Err(RuntimeError::host(format!("cannot index into {}", other.type_name()))),
        }
    }

    fn index_set(&self, collection: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
        match collection {
            Value::Array(a) => {
                let i = self.array_index(index, a.borrow().elements.len())?;
                a.borrow_mut().elements[i] = value;
                Ok(())
            }
            Value::Map(m) => match index {
                Value::String(s) => {
                    m.borrow_mut().entries.insert(s.as_str().to_string(), value);
                    Ok(())
                }
                other => Err(RuntimeError::host(format!("map keys must be strings, got {}", other.type_name()))),
            },
            other => Err(RuntimeError::host(format!("cannot assign into {}", other.type_name()))),
        }
    }

    fn array_index(&self, index: &Value, len: usize) -> Result<usize, RuntimeError> {
        let n = index.as_number().ok_or_else(|| RuntimeError::host("index must be a number"))?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(RuntimeError::host("index must be a non-negative whole number"));
        }
        let i = n as usize;
        if i >= len {
            return Err(RuntimeError::host(format!("index {} out of bounds (length {})", i, len)));
        }
        Ok(i)
    }

    fn get_property(&self, obj: &Value, name: &str) -> Result<Value, RuntimeError> {
        match obj {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.borrow().get(name) {
                    return Ok(v.clone());
                }
                if let Some(method) = inst.class.find_method(name) {
                    return Ok(Value::Callable(Rc::new(BoundMethod { instance: inst.clone(), method })));
                }
                Err(RuntimeError::host(format!("undefined property '{}' on {} instance", name, inst.class.name)))
            }
            Value::Map(m) => m.borrow().entries.get(name).cloned().ok_or_else(|| {
                RuntimeError::Thrown(Value::error(format!("undefined property '{}' on map", name), "TypeError"))
            }),
            Value::Error(e) => match name {
                "message" => Ok(Value::string(e.message.clone())),
                "type" => Ok(Value::string(e.type_name.clone())),
                _ => Err(RuntimeError::host(format!("undefined property '{}' on error", name))),
            },
            other => Err(RuntimeError::host(format!("cannot access property '{}' on {}", name, other.type_name()))),
        }
    }

    fn set_property(&self, obj: &Value, name: &str, value: Value) -> Result<(), RuntimeError> {
        match obj {
            Value::Instance(inst) => {
                inst.fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(RuntimeError::host(format!("cannot set property '{}' on {}", name, other.type_name()))),
        }
    }

    fn make_function(&self, decl: &FunctionDecl, closure: Environment) -> Rc<dyn Callable> {
        Rc::new(InterpretedFunction {
            name: decl.name.clone(),
            params: decl.params.iter().map(|p| p.name.clone()).collect(),
            body: decl.body.clone(),
            closure,
        })
    }

    fn make_class(&self, decl: &ClassDecl, env: &Environment) -> Result<Class, RuntimeError> {
        let mut methods = AHashMap::default();
        for m in &decl.methods {
            methods.insert(m.name.clone(), self.make_function(m, env.clone()));
        }
        let superclass = match &decl.superclass {
            Some(name) => match Scope::get(env, name) {
                Some(Value::Class(c)) => Some(c),
                _ => return Err(RuntimeError::host(format!("undefined superclass '{}'", name))),
            },
            None => None,
        };
        let mut field_defaults = AHashMap::default();
        for f in &decl.fields {
            field_defaults.insert(f.clone(), Value::Nil);
        }
        Ok(Class { name: decl.name.clone(), methods, field_names: decl.fields.clone(), field_defaults, superclass })
    }
}

/// A function defined in script source, carrying the AST body and its
/// defining environment rather than a compiled Chunk. Distinguished
/// from a bytecode `UserFunction` purely by Rust type; the
/// `Callable::call` path routes through `Interpreter::call_interpreted`
/// instead of the VM whenever the caller is the tree-walker.
#[derive(Debug)]
struct InterpretedFunction {
    name: String,
    params: Vec<String>,
    body: Vec<Stmt>,
    closure: Environment,
}

impl Callable for InterpretedFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> i32 {
        self.params.len() as i32
    }

    fn call(&self, _vm: &mut Vm, _args: &[Value]) -> Result<Value, RuntimeError> {
        Err(RuntimeError::host(
            "an interpreted function was invoked through the bytecode VM's Callable path",
        ))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn interpret(src: &str) -> Value {
        let tokens = crate::lexer::tokenize(src);
        let stmts = crate::parser::Parser::new(tokens).parse().expect("parses");
        let mut interp = Interpreter::new(Config::default());
        interp.run(&stmts).expect("runs")
    }

    #[test]
    fn evaluates_arithmetic() {
        let v = interpret("2 + 3 * 4;");
        assert!(matches!(v, Value::Number(n) if n == 14.0));
    }

    #[test]
    fn functions_close_over_their_defining_scope() {
        let v = interpret("var n = 10; fn add(x) { return x + n; } add(5);");
        assert!(matches!(v, Value::Number(n) if n == 15.0));
    }

    #[test]
    fn try_catch_binds_thrown_value() {
        let v = interpret("var caught = nil; try { throw \"boom\"; } catch (e) { caught = e; } caught;");
        match v {
            Value::String(s) => assert_eq!(s.as_str(), "boom"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn instance_methods_see_this_and_super_outside_the_constructor() {
        let source = r#"
class Animal {
  fn constructor(name) { this.name = name; }
  fn speak() { return this.name; }
}
class Dog < Animal {
  fn speak() { return super.speak(); }
}
var d = Dog("Rex");
d.speak();
"#;
        let v = interpret(source);
        match v {
            Value::String(s) => assert_eq!(s.as_str(), "Rex"),
            other => panic!("expected 'Rex', got {:?}", other),
        }
    }
}
