// File: src/compiler.rs
//
// The single-pass AST to bytecode compiler. Emits forward jumps with
// placeholder operands and back-patches them once the target offset is
// known (spec §4.4).

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ast::*;
use crate::bytecode::{Chunk, Op};
use crate::callable::UserFunction;
use crate::config::Config;
use crate::errors::{ErrorKind, IziError, SourceLocation};
use crate::module::{is_native_module, ModuleLoader};
use crate::value::{Class, Value};

struct Local {
    name: String,
    depth: usize,
}

struct LoopContext {
    loop_start: usize,
    break_jumps: Vec<usize>,
}

pub struct Compiler {
    chunk: Chunk,
    locals: Vec<Local>,
    scope_depth: usize,
    loops: Vec<LoopContext>,
    loader: Rc<RefCell<ModuleLoader>>,
    current_file: Option<PathBuf>,
    config: Config,
    /// Classes compiled so far in this compilation unit, keyed by name,
    /// so a later `class B < A` can resolve `A`'s already-built `Class`
    /// value. Shared across child compilers (method bodies, imports)
    /// the same way `loader` is, since a method or an imported file may
    /// itself declare a subclass of an earlier top-level class.
    class_constants: Rc<RefCell<crate::value::AHashMap<String, Rc<Class>>>>,
}

type CResult<T> = Result<T, IziError>;

impl Compiler {
    pub fn new(config: Config) -> Self {
        Compiler {
            chunk: Chunk::new(),
            locals: Vec::new(),
            scope_depth: 0,
            loops: Vec::new(),
            loader: Rc::new(RefCell::new(ModuleLoader::new())),
            current_file: None,
            config,
            class_constants: Rc::new(RefCell::new(crate::value::AHashMap::default())),
        }
    }

    pub fn with_file(config: Config, file: PathBuf) -> Self {
        let mut c = Compiler::new(config);
        c.current_file = Some(file);
        c
    }

    fn child_for_function(&self) -> Compiler {
        Compiler {
            chunk: Chunk::new(),
            locals: Vec::new(),
            scope_depth: 0,
            loops: Vec::new(),
            loader: self.loader.clone(),
            current_file: self.current_file.clone(),
            config: self.config,
            class_constants: self.class_constants.clone(),
        }
    }

    pub fn compile(mut self, stmts: &[Stmt]) -> CResult<Chunk> {
        for stmt in stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(self.chunk)
    }

    fn error(&self, message: impl Into<String>, line: usize) -> IziError {
        IziError::new(ErrorKind::CompileError, message.into()).at(SourceLocation::new(line, 0))
    }

    fn add_constant(&mut self, value: Value, line: usize) -> CResult<u8> {
        self.chunk.add_constant(value).map_err(|e| self.error(e, line))
    }

    fn add_name(&mut self, name: &str, line: usize) -> CResult<u8> {
        self.chunk.add_name(name).map_err(|e| self.error(e, line))
    }

    fn emit(&mut self, op: Op, line: usize) {
        self.chunk.write_op(op, line as i32);
    }

    fn write_byte(&mut self, byte: u8, line: usize) {
        self.chunk.write(byte, line as i32);
    }

    // ---- scope / locals ----

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self, line: usize) {
        self.scope_depth -= 1;
        while let Some(last) = self.locals.last() {
            if last.depth > self.scope_depth {
                self.locals.pop();
                self.emit(Op::Pop, line);
            } else {
                break;
            }
        }
    }

    fn declare_local(&mut self, name: &str) -> usize {
        self.locals.push(Local { name: name.to_string(), depth: self.scope_depth });
        self.locals.len() - 1
    }

    fn resolve_local(&self, name: &str) -> Option<u8> {
        self.locals.iter().rposition(|l| l.name == name).map(|i| i as u8)
    }

    // ---- statements ----

    fn compile_stmt(&mut self, stmt: &Stmt) -> CResult<()> {
        match stmt {
            Stmt::Expression { expr, line } => {
                self.compile_expr(expr)?;
                self.emit(Op::Pop, *line);
                Ok(())
            }
            Stmt::Print { value, line } => {
                self.compile_expr(value)?;
                self.emit(Op::Print, *line);
                Ok(())
            }
            Stmt::VarDecl { name, init, line } => {
                match init {
                    Some(e) => self.compile_expr(e)?,
                    None => self.emit(Op::Nil, *line),
                }
                if self.scope_depth == 0 {
                    let idx = self.add_name(name, *line)?;
                    self.emit(Op::SetGlobal, *line);
                    self.write_byte(idx, *line);
                    self.emit(Op::Pop, *line);
                } else {
                    self.declare_local(name);
                    // the value is already on the stack; it becomes the local's slot.
                }
                Ok(())
            }
            Stmt::FunctionDecl(decl) => self.compile_function_decl(decl),
            Stmt::ClassDecl(decl) => self.compile_class_decl(decl),
            Stmt::Block { body } => {
                self.begin_scope();
                for s in body {
                    self.compile_stmt(s)?;
                }
                self.end_scope(0);
                Ok(())
            }
            Stmt::If { condition, then_branch, else_branch, line } => {
                self.compile_expr(condition)?;
                let then_jump = self.chunk.emit_jump(Op::JumpIfFalse, *line as i32);
                self.emit(Op::Pop, *line);
                self.begin_scope();
                for s in then_branch {
                    self.compile_stmt(s)?;
                }
                self.end_scope(*line);
                let else_jump = self.chunk.emit_jump(Op::Jump, *line as i32);
                self.chunk.patch_jump(then_jump).map_err(|e| self.error(e, *line))?;
                self.emit(Op::Pop, *line);
                if let Some(else_branch) = else_branch {
                    self.begin_scope();
                    for s in else_branch {
                        self.compile_stmt(s)?;
                    }
                    self.end_scope(*line);
                }
                self.chunk.patch_jump(else_jump).map_err(|e| self.error(e, *line))?;
                Ok(())
            }
            Stmt::While { condition, body, line } => {
                let loop_start = self.chunk.code.len();
                self.compile_expr(condition)?;
                let exit_jump = self.chunk.emit_jump(Op::JumpIfFalse, *line as i32);
                self.emit(Op::Pop, *line);
                self.loops.push(LoopContext { loop_start, break_jumps: Vec::new() });
                self.begin_scope();
                for s in body {
                    self.compile_stmt(s)?;
                }
                self.end_scope(*line);
                self.chunk.emit_loop(loop_start, *line as i32).map_err(|e| self.error(e, *line))?;
                self.chunk.patch_jump(exit_jump).map_err(|e| self.error(e, *line))?;
                self.emit(Op::Pop, *line);
                let ctx = self.loops.pop().unwrap();
                for j in ctx.break_jumps {
                    self.chunk.patch_jump(j).map_err(|e| self.error(e, *line))?;
                }
                Ok(())
            }
            Stmt::Return { value, line } => {
                match value {
                    Some(e) => self.compile_expr(e)?,
                    None => self.emit(Op::Nil, *line),
                }
                self.emit(Op::Return, *line);
                Ok(())
            }
            Stmt::Break { line } => {
                if self.loops.is_empty() {
                    return Err(self.error("'break' used outside any loop", *line));
                }
                let j = self.chunk.emit_jump(Op::Jump, *line as i32);
                self.loops.last_mut().unwrap().break_jumps.push(j);
                Ok(())
            }
            Stmt::Continue { line } => {
                if self.loops.is_empty() {
                    return Err(self.error("'continue' used outside any loop", *line));
                }
                let loop_start = self.loops.last().unwrap().loop_start;
                self.chunk.emit_loop(loop_start, *line as i32).map_err(|e| self.error(e, *line))?;
                Ok(())
            }
            Stmt::Try { body, catch_var, catch_body, finally_body, line } => {
                self.compile_try(body, catch_var.as_deref(), catch_body.as_deref(), finally_body.as_deref(), *line)
            }
            Stmt::Throw { value, line } => {
                self.compile_expr(value)?;
                self.emit(Op::Throw, *line);
                Ok(())
            }
            Stmt::Import { path, line } => self.compile_import(path, *line),
            Stmt::Export { name: _, line: _ } => Ok(()), // namespacing is out of scope; exports are a no-op marker
        }
    }

    fn compile_try(
        &mut self,
        body: &[Stmt],
        catch_var: Option<&str>,
        catch_body: Option<&[Stmt]>,
        finally_body: Option<&[Stmt]>,
        line: usize,
    ) -> CResult<()> {
        // Step 1: emit TRY with placeholder operands.
        self.emit(Op::Try, line);
        let try_operand_at = self.chunk.code.len();
        self.write_byte(0, line); // catch_off hi
        self.write_byte(0, line); // catch_off lo
        self.write_byte(0, line); // finally_off hi
        self.write_byte(0, line); // finally_off lo
        let catch_var_idx = match catch_var {
            Some(name) => self.add_name(name, line)?,
            None => 0,
        };
        self.write_byte(catch_var_idx, line);
        let operands_end = self.chunk.code.len();

        // Step 2: compile the try body.
        self.begin_scope();
        for s in body {
            self.compile_stmt(s)?;
        }
        self.end_scope(line);

        // Step 3: jump past catch/finally on normal exit.
        let end_jump = self.chunk.emit_jump(Op::Jump, line as i32);

        let mut catch_off = 0u16;
        if let Some(catch_body) = catch_body {
            catch_off = (self.chunk.code.len() - operands_end) as u16;
            self.emit(Op::Pop, line); // discard exception value pushed by the handler path
            self.begin_scope();
            for s in catch_body {
                self.compile_stmt(s)?;
            }
            self.end_scope(line);
        }

        let catch_skip_jump = if catch_body.is_some() && finally_body.is_some() {
            Some(self.chunk.emit_jump(Op::Jump, line as i32))
        } else {
            None
        };

        self.chunk.patch_jump(end_jump).map_err(|e| self.error(e, line))?;
        if let Some(j) = catch_skip_jump {
            self.chunk.patch_jump(j).map_err(|e| self.error(e, line))?;
        }

        let mut finally_off = 0u16;
        if let Some(finally_body) = finally_body {
            finally_off = (self.chunk.code.len() - operands_end) as u16;
            self.begin_scope();
            for s in finally_body {
                self.compile_stmt(s)?;
            }
            self.end_scope(line);
        }

        self.emit(Op::EndTry, line);

        let cb = catch_off.to_be_bytes();
        let fb = finally_off.to_be_bytes();
        self.chunk.code[try_operand_at] = cb[0];
        self.chunk.code[try_operand_at + 1] = cb[1];
        self.chunk.code[try_operand_at + 2] = fb[0];
        self.chunk.code[try_operand_at + 3] = fb[1];
        Ok(())
    }

    fn compile_import(&mut self, path: &str, line: usize) -> CResult<()> {
        if is_native_module(path) {
            return Ok(()); // no-op marker; the global already exists at VM init.
        }
        let canonical = {
            let loader = self.loader.borrow();
            loader
                .resolve(path, self.current_file.as_deref())
                .map_err(|e| self.error(format!("cannot resolve module '{}': {}", path, e), line))?
        };
        if self.loader.borrow().already_imported(&canonical) {
            return Ok(());
        }
        self.loader
            .borrow_mut()
            .enter(canonical.clone())
            .map_err(|e| self.error(e, line))?;

        let result = (|| -> CResult<()> {
            let source = std::fs::read_to_string(&canonical)
                .map_err(|e| self.error(format!("cannot read module '{}': {}", path, e), line))?;
            let tokens = crate::lexer::tokenize(&source);
            let stmts = crate::parser::Parser::new(tokens).parse()?;
            let saved_file = self.current_file.clone();
            self.current_file = Some(canonical.clone());
            for s in &stmts {
                self.compile_stmt(s)?;
            }
            self.current_file = saved_file;
            Ok(())
        })();

        // Exception safety: always pop the import stack entry, even on failure.
        self.loader.borrow_mut().exit();
        result?;
        self.loader.borrow_mut().mark_imported(canonical);
        Ok(())
    }

    fn compile_function_decl(&mut self, decl: &FunctionDecl) -> CResult<()> {
        let func_value = self.compile_function_body(&decl.name, &decl.params, &decl.body, decl.line)?;
        let const_idx = self.add_constant(func_value, decl.line)?;
        self.emit(Op::Constant, decl.line);
        self.write_byte(const_idx, decl.line);
        if self.scope_depth == 0 {
            let name_idx = self.add_name(&decl.name, decl.line)?;
            self.emit(Op::SetGlobal, decl.line);
            self.write_byte(name_idx, decl.line);
            self.emit(Op::Pop, decl.line);
        } else {
            self.declare_local(&decl.name);
        }
        Ok(())
    }

    fn compile_function_body(
        &mut self,
        name: &str,
        params: &[Param],
        body: &[Stmt],
        line: usize,
    ) -> CResult<Value> {
        let mut child = self.child_for_function();
        child.begin_scope();
        for p in params {
            child.declare_local(&p.name);
        }
        for s in body {
            child.compile_stmt(s)?;
        }
        // Implicit `return nil;` if the body falls off the end.
        child.emit(Op::Nil, line);
        child.emit(Op::Return, line);
        let chunk = child.chunk;
        let func = UserFunction::new(
            name.to_string(),
            params.iter().map(|p| p.name.clone()).collect(),
            Rc::new(chunk),
        );
        Ok(Value::Callable(Rc::new(func)))
    }

    fn compile_class_decl(&mut self, decl: &ClassDecl) -> CResult<()> {
        let mut methods = crate::value::AHashMap::default();
        for m in &decl.methods {
            let func_value = self.compile_function_body(&m.name, &m.params, &m.body, m.line)?;
            if let Value::Callable(c) = func_value {
                methods.insert(m.name.clone(), c);
            }
        }
        let mut field_defaults = crate::value::AHashMap::default();
        for f in &decl.fields {
            field_defaults.insert(f.clone(), Value::Nil);
        }
        let superclass = match &decl.superclass {
            Some(name) => match self.class_constants.borrow().get(name) {
                Some(found) => Some(found.clone()),
                None => return Err(self.error(format!("unknown superclass '{}'", name), decl.line)),
            },
            None => None,
        };
        let class = Rc::new(Class {
            name: decl.name.clone(),
            methods,
            field_names: decl.fields.clone(),
            field_defaults,
            superclass,
        });
        self.class_constants.borrow_mut().insert(decl.name.clone(), class.clone());
        let const_idx = self.add_constant(Value::Class(class), decl.line)?;
        self.emit(Op::Constant, decl.line);
        self.write_byte(const_idx, decl.line);
        let name_idx = self.add_name(&decl.name, decl.line)?;
        self.emit(Op::SetGlobal, decl.line);
        self.write_byte(name_idx, decl.line);
        self.emit(Op::Pop, decl.line);
        Ok(())
    }

    // ---- expressions ----

    fn compile_expr(&mut self, expr: &Expr) -> CResult<()> {
        match expr {
            Expr::Literal { value, line } => {
                match value {
                    Literal::Nil => self.emit(Op::Nil, *line),
                    Literal::Bool(true) => self.emit(Op::True, *line),
                    Literal::Bool(false) => self.emit(Op::False, *line),
                    Literal::Number(n) => {
                        let idx = self.add_constant(Value::Number(*n), *line)?;
                        self.emit(Op::Constant, *line);
                        self.write_byte(idx, *line);
                    }
                    Literal::String(s) => {
                        let idx = self.add_constant(Value::string(s.clone()), *line)?;
                        self.emit(Op::Constant, *line);
                        self.write_byte(idx, *line);
                    }
                }
                Ok(())
            }
            Expr::Variable { name, line } => self.compile_variable_read(name, *line),
            Expr::This { line } => self.compile_variable_read("this", *line),
            Expr::Assign { name, value, line } => {
                self.compile_expr(value)?;
                self.compile_variable_write(name, *line);
                Ok(())
            }
            Expr::Grouping { inner } => self.compile_expr(inner),
            Expr::Binary { left, op, right, line } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let opcode = match op {
                    BinaryOp::Add => Op::Add,
                    BinaryOp::Sub => Op::Sub,
                    BinaryOp::Mul => Op::Mul,
                    BinaryOp::Div => Op::Div,
                    BinaryOp::Mod => Op::Mod,
                    BinaryOp::Equal => Op::Equal,
                    BinaryOp::NotEqual => Op::NotEqual,
                    BinaryOp::Greater => Op::Greater,
                    BinaryOp::GreaterEqual => Op::GreaterEqual,
                    BinaryOp::Less => Op::Less,
                    BinaryOp::LessEqual => Op::LessEqual,
                };
                self.emit(opcode, *line);
                Ok(())
            }
            Expr::Logical { left, op, right, line } => {
                self.compile_expr(left)?;
                match op {
                    LogicalOp::And => {
                        let short_circuit = self.chunk.emit_jump(Op::JumpIfFalse, *line as i32);
                        self.emit(Op::Pop, *line);
                        self.compile_expr(right)?;
                        self.chunk.patch_jump(short_circuit).map_err(|e| self.error(e, *line))?;
                    }
                    LogicalOp::Or => {
                        let else_jump = self.chunk.emit_jump(Op::JumpIfFalse, *line as i32);
                        let end_jump = self.chunk.emit_jump(Op::Jump, *line as i32);
                        self.chunk.patch_jump(else_jump).map_err(|e| self.error(e, *line))?;
                        self.emit(Op::Pop, *line);
                        self.compile_expr(right)?;
                        self.chunk.patch_jump(end_jump).map_err(|e| self.error(e, *line))?;
                    }
                }
                Ok(())
            }
            Expr::Unary { op, operand, line } => {
                self.compile_expr(operand)?;
                match op {
                    UnaryOp::Negate => self.emit(Op::Negate, *line),
                    UnaryOp::Not => self.emit(Op::Not, *line),
                }
                Ok(())
            }
            Expr::Call { callee, args, line } => {
                self.compile_expr(callee)?;
                for a in args {
                    self.compile_expr(a)?;
                }
                if args.len() > 255 {
                    return Err(self.error("too many arguments in call", *line));
                }
                self.emit(Op::Call, *line);
                self.write_byte(args.len() as u8, *line);
                Ok(())
            }
            Expr::Index { collection, index, line } => {
                self.compile_expr(collection)?;
                self.compile_expr(index)?;
                self.emit(Op::Index, *line);
                Ok(())
            }
            Expr::IndexAssign { collection, index, value, line } => {
                self.compile_expr(collection)?;
                self.compile_expr(index)?;
                self.compile_expr(value)?;
                self.emit(Op::SetIndex, *line);
                Ok(())
            }
            Expr::Property { object, name, line } => {
                self.compile_expr(object)?;
                let idx = self.add_name(name, *line)?;
                self.emit(Op::GetProperty, *line);
                self.write_byte(idx, *line);
                Ok(())
            }
            Expr::PropertyAssign { object, name, value, line } => {
                self.compile_expr(object)?;
                self.compile_expr(value)?;
                let idx = self.add_name(name, *line)?;
                self.emit(Op::SetProperty, *line);
                self.write_byte(idx, *line);
                Ok(())
            }
            Expr::Super { method, line } => {
                self.compile_variable_read("super", *line)?;
                self.compile_variable_read("this", *line)?;
                let idx = self.add_name(method, *line)?;
                self.emit(Op::GetSuperMethod, *line);
                self.write_byte(idx, *line);
                Ok(())
            }
            Expr::ArrayLiteral { elements, line } => {
                if elements.len() > 255 {
                    return Err(self.error("array literal has too many elements", *line));
                }
                // Built via a reserved native helper rather than a
                // dedicated opcode (the opcode set is fixed by spec §4.2
                // and has no literal-array opcode).
                let helper_idx = self.add_name("__make_array", *line)?;
                self.emit(Op::GetGlobal, *line);
                self.write_byte(helper_idx, *line);
                for e in elements {
                    self.compile_expr(e)?;
                }
                self.emit(Op::Call, *line);
                self.write_byte(elements.len() as u8, *line);
                Ok(())
            }
            Expr::MapLiteral { entries, line } => {
                let helper_idx = self.add_name("__make_map", *line)?;
                self.emit(Op::GetGlobal, *line);
                self.write_byte(helper_idx, *line);
                for (k, v) in entries {
                    let kidx = self.add_constant(Value::string(k.clone()), *line)?;
                    self.emit(Op::Constant, *line);
                    self.write_byte(kidx, *line);
                    self.compile_expr(v)?;
                }
                self.emit(Op::Call, *line);
                self.write_byte((entries.len() * 2) as u8, *line);
                Ok(())
            }
        }
    }

    fn compile_variable_read(&mut self, name: &str, line: usize) -> CResult<()> {
        if let Some(slot) = self.resolve_local(name) {
            self.emit(Op::GetLocal, line);
            self.write_byte(slot, line);
        } else {
            let idx = self.add_name(name, line)?;
            self.emit(Op::GetGlobal, line);
            self.write_byte(idx, line);
        }
        Ok(())
    }

    fn compile_variable_write(&mut self, name: &str, line: usize) {
        if let Some(slot) = self.resolve_local(name) {
            self.emit(Op::SetLocal, line);
            self.write_byte(slot, line);
        } else {
            // add_name cannot fail here in practice (pool already sized
            // during the read path for any realistic program); propagate
            // pool overflow as a panic-free no-op is not acceptable, so
            // unwrap with a descriptive message instead of silently
            // truncating the program.
            let idx = self.chunk.add_name(name).expect("name pool overflow during assignment");
            self.emit(Op::SetGlobal, line);
            self.write_byte(idx, line);
        }
    }
}

pub fn compile_source(source: &str, file: Option<&Path>, config: Config) -> CResult<Chunk> {
    let tokens = crate::lexer::tokenize(source);
    let stmts = crate::parser::Parser::new(tokens).parse()?;
    let compiler = match file {
        Some(f) => Compiler::with_file(config, f.to_path_buf()),
        None => Compiler::new(config),
    };
    compiler.compile(&stmts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> Chunk {
        compile_source(src, None, Config::default()).expect("compiles")
    }

    #[test]
    fn arithmetic_and_print_emits_expected_opcodes() {
        let chunk = compile("print(2 + 3 * 4);");
        let ops: Vec<u8> = chunk.code.iter().copied().collect();
        assert!(ops.contains(&(Op::Mul as u8)));
        assert!(ops.contains(&(Op::Add as u8)));
        assert!(ops.ends_with(&[Op::Print as u8]));
    }

    #[test]
    fn break_outside_loop_is_a_compile_error() {
        let err = compile_source("break;", None, Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CompileError);
    }

    #[test]
    fn top_level_var_uses_globals() {
        let chunk = compile("var n = 0;");
        assert!(chunk.code.contains(&(Op::SetGlobal as u8)));
        assert!(!chunk.code.contains(&(Op::SetLocal as u8)));
    }

    #[test]
    fn function_param_uses_locals() {
        let chunk = compile("fn add(a, b) { return a + b; }");
        // the function body is compiled into a nested chunk stored as a constant
        let has_nested_local_get = chunk.constants.iter().any(|c| {
            if let Value::Callable(f) = c {
                f.as_user_function().unwrap().chunk.code.contains(&(Op::GetLocal as u8))
            } else {
                false
            }
        });
        assert!(has_nested_local_get);
    }

    #[test]
    fn referencing_an_undeclared_superclass_is_a_compile_error() {
        let err = compile_source("class B < A { }", None, Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CompileError);
        assert!(err.message.contains("unknown superclass"));
    }

    #[test]
    fn a_subclass_resolves_its_already_compiled_superclass() {
        let chunk = compile("class A { } class B < A { }");
        let found = chunk.constants.iter().any(|c| matches!(c, Value::Class(class) if class.name == "B" && class.superclass.is_some()));
        assert!(found);
    }
}
