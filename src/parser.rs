// File: src/parser.rs
//
// Recursive-descent parser producing the AST the compiler consumes.
// A thin frontend, out of scope per the core's component table, but
// complete enough to exercise the compiler/VM end to end.

use crate::ast::*;
use crate::errors::{ErrorKind, IziError, SourceLocation};
use crate::lexer::{Keyword, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, IziError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.is_eof() {
            stmts.push(self.declaration()?);
        }
        Ok(stmts)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn check_kw(&self, kw: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_kw(&mut self, kw: Keyword) -> bool {
        if self.check_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(self.error(format!("expected {}, found {:?}", what, tok.kind), tok.line, tok.column))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> PResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => {
                let tok = self.peek().clone();
                Err(self.error(format!("expected {}", what), tok.line, tok.column))
            }
        }
    }

    fn error(&self, message: String, line: usize, column: usize) -> IziError {
        IziError::new(ErrorKind::ParseError, message).at(SourceLocation::new(line, column))
    }

    // ---- statements ----

    fn declaration(&mut self) -> PResult<Stmt> {
        if self.check_kw(Keyword::Var) {
            self.var_decl()
        } else if self.check_kw(Keyword::Fn) {
            self.function_decl().map(Stmt::FunctionDecl)
        } else if self.check_kw(Keyword::Class) {
            self.class_decl()
        } else {
            self.statement()
        }
    }

    fn var_decl(&mut self) -> PResult<Stmt> {
        let line = self.peek().line;
        self.advance(); // var
        let name = self.expect_identifier("variable name")?;
        let init = if self.matches(&TokenKind::Equal) { Some(self.expression()?) } else { None };
        self.expect(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::VarDecl { name, init, line })
    }

    fn function_decl(&mut self) -> PResult<FunctionDecl> {
        let line = self.peek().line;
        self.advance(); // fn
        let name = self.expect_identifier("function name")?;
        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(Param { name: self.expect_identifier("parameter name")? });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        let body = self.block()?;
        Ok(FunctionDecl { name, params, body, line })
    }

    fn class_decl(&mut self) -> PResult<Stmt> {
        let line = self.peek().line;
        self.advance(); // class
        let name = self.expect_identifier("class name")?;
        let superclass = if self.matches(&TokenKind::Less) {
            Some(self.expect_identifier("superclass name")?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "'{' before class body")?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            if self.check_kw(Keyword::Var) {
                self.advance();
                fields.push(self.expect_identifier("field name")?);
                self.expect(TokenKind::Semicolon, "';' after field declaration")?;
            } else if self.check_kw(Keyword::Fn) {
                methods.push(self.function_decl()?);
            } else {
                let tok = self.peek().clone();
                return Err(self.error("expected field or method in class body".into(), tok.line, tok.column));
            }
        }
        self.expect(TokenKind::RBrace, "'}' after class body")?;
        Ok(Stmt::ClassDecl(ClassDecl { name, superclass, fields, methods, line }))
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace, "'{' to start block")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            stmts.push(self.declaration()?);
        }
        self.expect(TokenKind::RBrace, "'}' to end block")?;
        Ok(stmts)
    }

    fn statement(&mut self) -> PResult<Stmt> {
        let line = self.peek().line;
        if self.check(&TokenKind::LBrace) {
            Ok(Stmt::Block { body: self.block()? })
        } else if self.matches_kw(Keyword::If) {
            self.if_statement(line)
        } else if self.matches_kw(Keyword::While) {
            self.while_statement(line)
        } else if self.matches_kw(Keyword::Return) {
            let value = if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
            self.expect(TokenKind::Semicolon, "';' after return value")?;
            Ok(Stmt::Return { value, line })
        } else if self.matches_kw(Keyword::Break) {
            self.expect(TokenKind::Semicolon, "';' after 'break'")?;
            Ok(Stmt::Break { line })
        } else if self.matches_kw(Keyword::Continue) {
            self.expect(TokenKind::Semicolon, "';' after 'continue'")?;
            Ok(Stmt::Continue { line })
        } else if self.matches_kw(Keyword::Try) {
            self.try_statement(line)
        } else if self.matches_kw(Keyword::Throw) {
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon, "';' after thrown value")?;
            Ok(Stmt::Throw { value, line })
        } else if self.matches_kw(Keyword::Import) {
            let path = match self.advance().kind {
                TokenKind::String(s) => s,
                _ => return Err(self.error("expected string literal after 'import'".into(), line, 0)),
            };
            self.expect(TokenKind::Semicolon, "';' after import path")?;
            Ok(Stmt::Import { path, line })
        } else if self.matches_kw(Keyword::Export) {
            let name = self.expect_identifier("exported name")?;
            self.expect(TokenKind::Semicolon, "';' after export")?;
            Ok(Stmt::Export { name, line })
        } else if self.matches_kw(Keyword::Print) {
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon, "';' after print argument")?;
            Ok(Stmt::Print { value, line })
        } else {
            let expr = self.expression()?;
            self.expect(TokenKind::Semicolon, "';' after expression")?;
            Ok(Stmt::Expression { expr, line })
        }
    }

    fn if_statement(&mut self, line: usize) -> PResult<Stmt> {
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "')' after if condition")?;
        let then_branch = self.block()?;
        let else_branch = if self.matches_kw(Keyword::Else) {
            if self.check_kw(Keyword::If) {
                self.advance();
                Some(vec![self.if_statement(self.peek().line)?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch, line })
    }

    fn while_statement(&mut self, line: usize) -> PResult<Stmt> {
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "')' after while condition")?;
        let body = self.block()?;
        Ok(Stmt::While { condition, body, line })
    }

    fn try_statement(&mut self, line: usize) -> PResult<Stmt> {
        let body = self.block()?;
        let mut catch_var = None;
        let mut catch_body = None;
        if self.matches_kw(Keyword::Catch) {
            self.expect(TokenKind::LParen, "'(' after 'catch'")?;
            catch_var = Some(self.expect_identifier("catch variable name")?);
            self.expect(TokenKind::RParen, "')' after catch variable")?;
            catch_body = Some(self.block()?);
        }
        let finally_body = if self.matches_kw(Keyword::Finally) { Some(self.block()?) } else { None };
        if catch_body.is_none() && finally_body.is_none() {
            return Err(self.error("'try' requires a 'catch' or 'finally' clause".into(), line, 0));
        }
        Ok(Stmt::Try { body, catch_var, catch_body, finally_body, line })
    }

    // ---- expressions (precedence climbing) ----

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr = self.logic_or()?;
        if self.matches(&TokenKind::Equal) {
            let line = self.peek().line;
            let value = self.assignment()?;
            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign { name, value: Box::new(value), line }),
                Expr::Index { collection, index, .. } => {
                    Ok(Expr::IndexAssign { collection, index, value: Box::new(value), line })
                }
                Expr::Property { object, name, .. } => {
                    Ok(Expr::PropertyAssign { object, name, value: Box::new(value), line })
                }
                _ => Err(self.error("invalid assignment target".into(), line, 0)),
            };
        }
        Ok(expr)
    }

    fn logic_or(&mut self) -> PResult<Expr> {
        let mut expr = self.logic_and()?;
        while self.check_kw(Keyword::Or) || self.check(&TokenKind::OrOr) {
            let line = self.peek().line;
            self.advance();
            let right = self.logic_and()?;
            expr = Expr::Logical { left: Box::new(expr), op: LogicalOp::Or, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> PResult<Expr> {
        let mut expr = self.equality()?;
        while self.check_kw(Keyword::And) || self.check(&TokenKind::AndAnd) {
            let line = self.peek().line;
            self.advance();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), op: LogicalOp::And, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::BangEqual => BinaryOp::NotEqual,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let line = self.peek().line;
            self.advance();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right), line };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let line = self.peek().line;
        if self.matches(&TokenKind::Minus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand), line });
        }
        if self.matches(&TokenKind::Bang) {
            let operand = self.unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand), line });
        }
        self.call()
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            let line = self.peek().line;
            if self.matches(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')' after arguments")?;
                expr = Expr::Call { callee: Box::new(expr), args, line };
            } else if self.matches(&TokenKind::Dot) {
                let name = self.expect_identifier("property name")?;
                expr = Expr::Property { object: Box::new(expr), name, line };
            } else if self.matches(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.expect(TokenKind::RBracket, "']' after index")?;
                expr = Expr::Index { collection: Box::new(expr), index: Box::new(index), line };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let tok = self.peek().clone();
        let line = tok.line;
        match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Number(n), line })
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::String(s), line })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Bool(true), line })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Bool(false), line })
            }
            TokenKind::Keyword(Keyword::Nil) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Nil, line })
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Expr::This { line })
            }
            TokenKind::Keyword(Keyword::Super) => {
                self.advance();
                self.expect(TokenKind::Dot, "'.' after 'super'")?;
                let method = self.expect_identifier("superclass method name")?;
                Ok(Expr::Super { method, line })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Variable { name, line })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')' after expression")?;
                Ok(Expr::Grouping { inner: Box::new(inner) })
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']' after array literal")?;
                Ok(Expr::ArrayLiteral { elements, line })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                if !self.check(&TokenKind::RBrace) {
                    loop {
                        let key = match self.advance().kind {
                            TokenKind::String(s) => s,
                            TokenKind::Identifier(s) => s,
                            other => return Err(self.error(format!("expected map key, found {:?}", other), line, 0)),
                        };
                        self.expect(TokenKind::Colon, "':' after map key")?;
                        let value = self.expression()?;
                        entries.push((key, value));
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "'}' after map literal")?;
                Ok(Expr::MapLiteral { entries, line })
            }
            other => Err(self.error(format!("unexpected token {:?}", other), line, tok.column)),
        }
    }
}
