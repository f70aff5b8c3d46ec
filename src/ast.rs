//! Abstract syntax tree consumed by the interpreter.
//!
//! Nodes carry only syntactic data (operator tokens, sub‑nodes, name tokens);
//! no evaluation state lives here.  Everything derives `Serialize` so the CLI
//! can dump a parsed program as JSON.

use std::rc::Rc;

use serde::Serialize;

use crate::token::{Literal, Token};

/// A **literal constant** that appears directly in the source code.
///
/// The parser copies the value out of the token at parse‑time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Null,
}

impl From<&Literal> for LiteralValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => LiteralValue::Number(*n),
            Literal::Str(s) => LiteralValue::Str(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Infix binary operator expression, e.g. `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Literal(LiteralValue),

    /// Variable access.
    Variable(Token),

    /// `name = value`; an expression that yields `value`.
    Assign { name: Token, value: Box<Expr> },

    /// Call expression.  `paren` is the closing `)`, kept for error lines.
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
}

/// Shared function declaration.  Wrapped in `Rc` so a user function value can
/// keep its body alive without cloning the statement tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `var name = initializer;` (a missing initializer is parsed as `null`).
    Var { name: Token, initializer: Expr },

    Print(Expr),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Function(Rc<FunctionDecl>),

    /// Statement‑level call of a named callable whose arguments are single
    /// tokens (identifiers or literals).
    Call { target: Token, arguments: Vec<Token> },

    /// `return value?;` inside a function body.
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}
