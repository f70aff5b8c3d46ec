use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::callable::{natives, Callable, NativeFunction, UserFunction};
use crate::environment::Environment;
use crate::error::{IResult, InterpretError, RResult, Result, RuntimeError};
use crate::output::Output;
use crate::token::{Literal, Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested calls a program may build before it fails with
/// [`RuntimeError::StackOverflow`].
pub const MAX_CALL_DEPTH: usize = 1000;

/// When less native stack than this is left at a call, more is allocated.
const RED_ZONE: usize = 100 * 1024;

/// Size of each extra native stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Tree‑walking evaluator.
///
/// `environment` is the scope active for the statement being executed.  It is
/// swapped in and out only by [`Interpreter::execute_block`], which restores
/// the previous scope on every exit path, errors and `return` included.
pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    output: Output,
    /// Calls currently executing.
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with the built‑in natives
    /// declared in the global scope.
    pub fn new() -> Self {
        Self::with_output(Output::Stdout)
    }

    pub fn with_output(output: Output) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));
        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            output,
            call_depth: 0,
        };

        for native in natives() {
            interpreter.define_native(native);
        }

        interpreter
    }

    /// Declares a host function in the global scope.
    pub fn define_native(&mut self, native: NativeFunction) {
        debug!("Defining native function '{}'", native.name);

        let name = native.name.clone();
        self.globals
            .borrow_mut()
            .declare(&name, Value::Callable(Rc::new(native)));
    }

    /// Interprets a list of statements (a "program") in order.  The first
    /// runtime failure aborts the remainder; earlier side effects stay.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(InterpretError::Runtime(e)) => {
                    debug!("Runtime error: {}", e);
                    return Err(e.into());
                }

                // Only reachable for hand‑built trees; the parser rejects it.
                Err(InterpretError::ReturnSignal(value)) => {
                    info!("Top-level return with {}, stopping", value);
                    break;
                }
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                debug!("Evaluating expression statement");
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.output
                    .println(&value.to_string())
                    .map_err(RuntimeError::from)?;
                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = self.evaluate(initializer)?;
                debug!(
                    "Declaring {} variable '{}' = {}",
                    if self.environment.borrow().is_global() {
                        "global"
                    } else {
                        "local"
                    },
                    name.lexeme,
                    value
                );
                self.environment.borrow_mut().declare(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let scope = Environment::child_of(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    debug!("Condition is truthy; executing then branch");
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    debug!("Condition is falsy; executing else branch");
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::Function(declaration) => {
                self.declare_function(declaration);
                Ok(())
            }

            Stmt::Call { target, arguments } => {
                debug!("Executing call statement '{}'", target.lexeme);
                let function = callable(self.lookup(target)?, target.line)?;
                let arguments = arguments
                    .iter()
                    .map(|token| self.atom_value(token))
                    .collect::<RResult<Vec<_>>>()?;

                self.call(function, arguments, target.line)?;
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                debug!("Returning value: {}", value);
                Err(InterpretError::ReturnSignal(value))
            }
        }
    }

    /// Runs `statements` with `environment` as the active scope, then
    /// reinstates the scope that was active before, whatever the outcome.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<()> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        debug!("Exited block");

        result
    }

    /// Captures the active scope as the closure and binds the function there.
    fn declare_function(&mut self, declaration: &Rc<FunctionDecl>) {
        let function = UserFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));

        self.environment
            .borrow_mut()
            .declare(&declaration.name.lexeme, Value::Callable(Rc::new(function)));

        info!(
            "Function '{}' defined with {} parameters",
            declaration.name.lexeme,
            declaration.params.len()
        );
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> RResult<Value> {
        let value = match expr {
            Expr::Literal(literal) => Value::from(literal),

            Expr::Grouping(inner) => self.evaluate(inner)?,

            Expr::Variable(name) => self.lookup(name)?,

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, value, name.line)?
            }

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right)?,

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right)?,

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let function = callable(self.evaluate(callee)?, paren.line)?;
                let arguments = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<RResult<Vec<_>>>()?;

                self.call(function, arguments, paren.line)?
            }
        };

        debug!("Expression evaluated to: {}", value);
        Ok(value)
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> RResult<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => Ok(Value::Number(-number_operand(operator, right)?)),

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(RuntimeError::invalid_operand(
                &operator.lexeme,
                right,
                operator.line,
            )),
        }
    }

    /// Both operands are evaluated, left first, before any type check.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> RResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        debug!("Binary '{}' on {} and {}", op.lexeme, left, right);

        let value = match op.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::String(a), Value::String(b)) => Value::String(a + &b),
                (left, right) => {
                    Value::Number(number_operand(op, left)? + number_operand(op, right)?)
                }
            },

            TokenType::MINUS => {
                Value::Number(number_operand(op, left)? - number_operand(op, right)?)
            }

            TokenType::STAR => {
                Value::Number(number_operand(op, left)? * number_operand(op, right)?)
            }

            // IEEE semantics: x / 0 is ±Infinity or NaN, never an error.
            TokenType::SLASH => {
                Value::Number(number_operand(op, left)? / number_operand(op, right)?)
            }

            TokenType::LESS => Value::Bool(number_operand(op, left)? < number_operand(op, right)?),

            TokenType::LESS_EQUAL => {
                Value::Bool(number_operand(op, left)? <= number_operand(op, right)?)
            }

            TokenType::GREATER => {
                Value::Bool(number_operand(op, left)? > number_operand(op, right)?)
            }

            TokenType::GREATER_EQUAL => {
                Value::Bool(number_operand(op, left)? >= number_operand(op, right)?)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),

            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => return Err(RuntimeError::invalid_operand(&op.lexeme, left, op.line)),
        };

        Ok(value)
    }

    fn lookup(&self, name: &Token) -> RResult<Value> {
        self.environment.borrow().get(&name.lexeme, name.line)
    }

    /// Value of a call‑statement argument token.
    fn atom_value(&self, token: &Token) -> RResult<Value> {
        if token.token_type == TokenType::IDENTIFIER {
            return self.lookup(token);
        }

        Ok(match (&token.literal, token.token_type) {
            (Some(Literal::Number(n)), _) => Value::Number(*n),
            (Some(Literal::Str(s)), _) => Value::String(s.clone()),
            (None, TokenType::TRUE) => Value::Bool(true),
            (None, TokenType::FALSE) => Value::Bool(false),
            // NULL and anything the parser would never place here.
            _ => Value::Null,
        })
    }

    /// Invokes `function` one call level deeper.  Past [`MAX_CALL_DEPTH`]
    /// the call fails instead of exhausting the native stack.
    fn call(
        &mut self,
        function: Rc<dyn Callable>,
        arguments: Vec<Value>,
        line: usize,
    ) -> RResult<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            debug!(
                "Call to '{}' at line {} exceeds depth {}",
                function.name(),
                line,
                MAX_CALL_DEPTH
            );
            return Err(RuntimeError::StackOverflow {
                depth: MAX_CALL_DEPTH,
                line,
            });
        }

        self.call_depth += 1;

        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            function.call(self, arguments, line)
        });

        self.call_depth -= 1;

        result
    }
}

fn callable(callee: Value, line: usize) -> RResult<Rc<dyn Callable>> {
    match callee {
        Value::Callable(function) => Ok(function),
        other => {
            debug!("Cannot call {}", other);
            Err(RuntimeError::InvalidCallee {
                callee: other,
                line,
            })
        }
    }
}

/// Accepts only the Number variant; no string‑to‑number coercion.
fn number_operand(operator: &Token, operand: Value) -> RResult<f64> {
    match operand {
        Value::Number(n) => Ok(n),
        other => Err(RuntimeError::invalid_operand(
            &operator.lexeme,
            other,
            operator.line,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LiteralValue;

    fn op(token_type: TokenType, lexeme: &str) -> Token {
        Token::new(token_type, lexeme, 1)
    }

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    fn num(n: f64) -> Expr {
        Expr::Literal(LiteralValue::Number(n))
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(LiteralValue::Str(s.to_string()))
    }

    fn binary(left: Expr, token_type: TokenType, lexeme: &str, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            operator: op(token_type, lexeme),
            right: Box::new(right),
        }
    }

    fn buffered() -> (Interpreter, Rc<RefCell<String>>) {
        let (output, buffer) = Output::buffer();
        (Interpreter::with_output(output), buffer)
    }

    #[test]
    fn arithmetic_follows_ieee() {
        let mut interpreter = Interpreter::new();

        let sum = binary(num(0.1), TokenType::PLUS, "+", num(0.2));
        assert_eq!(interpreter.evaluate(&sum).unwrap(), Value::Number(0.1 + 0.2));

        let inf = binary(num(1.0), TokenType::SLASH, "/", num(0.0));
        assert_eq!(interpreter.evaluate(&inf).unwrap(), Value::Number(f64::INFINITY));

        let neg_inf = binary(num(-1.0), TokenType::SLASH, "/", num(0.0));
        assert_eq!(
            interpreter.evaluate(&neg_inf).unwrap(),
            Value::Number(f64::NEG_INFINITY)
        );

        let nan = binary(num(0.0), TokenType::SLASH, "/", num(0.0));
        match interpreter.evaluate(&nan).unwrap() {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected NaN, got {}", other),
        }
    }

    #[test]
    fn plus_concatenates_strings_only() {
        let mut interpreter = Interpreter::new();

        let joined = binary(string("foo"), TokenType::PLUS, "+", string("bar"));
        assert_eq!(
            interpreter.evaluate(&joined).unwrap(),
            Value::String("foobar".to_string())
        );

        let mixed = binary(string("foo"), TokenType::PLUS, "+", num(1.0));
        let err = interpreter.evaluate(&mixed).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidOperand { ref operator, value: Value::String(ref s), .. }
                if operator == "+" && s == "foo"
        ));
    }

    #[test]
    fn comparison_rejects_non_numbers() {
        let mut interpreter = Interpreter::new();

        let ok = binary(num(1.0), TokenType::LESS_EQUAL, "<=", num(1.0));
        assert_eq!(interpreter.evaluate(&ok).unwrap(), Value::Bool(true));

        let bad = binary(num(1.0), TokenType::GREATER, ">", string("0"));
        let err = interpreter.evaluate(&bad).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidOperand { value: Value::String(_), .. }
        ));
    }

    #[test]
    fn equality_never_fails() {
        let mut interpreter = Interpreter::new();

        let cases = [
            (num(1.0), num(1.0), true),
            (Expr::Literal(LiteralValue::Null), Expr::Literal(LiteralValue::Null), true),
            (Expr::Literal(LiteralValue::Null), num(0.0), false),
            (string("1"), num(1.0), false),
        ];

        for (left, right, expected) in cases {
            let eq = binary(left.clone(), TokenType::EQUAL_EQUAL, "==", right.clone());
            assert_eq!(interpreter.evaluate(&eq).unwrap(), Value::Bool(expected));

            let ne = binary(left, TokenType::BANG_EQUAL, "!=", right);
            assert_eq!(interpreter.evaluate(&ne).unwrap(), Value::Bool(!expected));
        }
    }

    #[test]
    fn unary_operators() {
        let mut interpreter = Interpreter::new();

        let negate = Expr::Unary {
            operator: op(TokenType::MINUS, "-"),
            right: Box::new(num(3.0)),
        };
        assert_eq!(interpreter.evaluate(&negate).unwrap(), Value::Number(-3.0));

        let not_null = Expr::Unary {
            operator: op(TokenType::BANG, "!"),
            right: Box::new(Expr::Literal(LiteralValue::Null)),
        };
        assert_eq!(interpreter.evaluate(&not_null).unwrap(), Value::Bool(true));

        let negate_string = Expr::Unary {
            operator: op(TokenType::MINUS, "-"),
            right: Box::new(string("x")),
        };
        assert!(matches!(
            interpreter.evaluate(&negate_string),
            Err(RuntimeError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn failed_block_restores_active_scope() {
        let (mut interpreter, _) = buffered();
        let before = Rc::clone(&interpreter.environment);

        let block = Stmt::Block(vec![
            Stmt::Var {
                name: ident("inner"),
                initializer: num(1.0),
            },
            Stmt::Block(vec![Stmt::Expression(Expr::Variable(ident("missing")))]),
        ]);

        assert!(interpreter.execute(&block).is_err());
        assert!(Rc::ptr_eq(&before, &interpreter.environment));
        assert!(interpreter.environment.borrow().get("inner", 1).is_err());
    }

    #[test]
    fn top_level_return_stops_program() {
        let (mut interpreter, buffer) = buffered();

        let program = vec![
            Stmt::Print(num(1.0)),
            Stmt::Return {
                keyword: op(TokenType::RETURN, "return"),
                value: None,
            },
            Stmt::Print(num(2.0)),
        ];

        interpreter.interpret(&program).unwrap();
        assert_eq!(buffer.borrow().as_str(), "1\n");
    }

    #[test]
    fn call_statement_resolves_atoms() {
        let (mut interpreter, buffer) = buffered();

        let declaration = Rc::new(FunctionDecl {
            name: ident("show"),
            params: vec![ident("a"), ident("b")],
            body: vec![Stmt::Print(binary(
                Expr::Variable(ident("a")),
                TokenType::PLUS,
                "+",
                Expr::Variable(ident("b")),
            ))],
        });

        let program = vec![
            Stmt::Var {
                name: ident("x"),
                initializer: num(40.0),
            },
            Stmt::Function(declaration),
            Stmt::Call {
                target: ident("show"),
                arguments: vec![
                    ident("x"),
                    op(TokenType::NUMBER, "2").with_literal(Literal::Number(2.0)),
                ],
            },
        ];

        interpreter.interpret(&program).unwrap();
        assert_eq!(buffer.borrow().as_str(), "42\n");
    }

    #[test]
    fn calling_a_number_is_invalid_callee() {
        let mut interpreter = Interpreter::new();

        let call = Expr::Call {
            callee: Box::new(num(3.0)),
            paren: op(TokenType::RIGHT_PAREN, ")"),
            arguments: vec![],
        };

        assert!(matches!(
            interpreter.evaluate(&call),
            Err(RuntimeError::InvalidCallee {
                callee: Value::Number(_),
                ..
            })
        ));
    }

    #[test]
    fn call_depth_unwinds_after_overflow() {
        let (mut interpreter, _) = buffered();

        let declaration = Rc::new(FunctionDecl {
            name: ident("spin"),
            params: vec![],
            body: vec![Stmt::Expression(Expr::Call {
                callee: Box::new(Expr::Variable(ident("spin"))),
                paren: op(TokenType::RIGHT_PAREN, ")"),
                arguments: vec![],
            })],
        });

        interpreter
            .interpret(&[Stmt::Function(declaration)])
            .unwrap();

        let call = Expr::Call {
            callee: Box::new(Expr::Variable(ident("spin"))),
            paren: op(TokenType::RIGHT_PAREN, ")"),
            arguments: vec![],
        };

        assert!(matches!(
            interpreter.evaluate(&call),
            Err(RuntimeError::StackOverflow { depth: MAX_CALL_DEPTH, .. })
        ));
        assert_eq!(interpreter.call_depth, 0);
    }
}
