//! Invocable values: host‑provided natives and user‑defined functions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::{InterpretError, RResult, RuntimeError};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything that can appear as the callee of a call.
///
/// `line` is the line of the call site and is only used for error reports.
/// Implementations start with [`Callable::check_arity`], so a host invoking
/// `call` directly gets the same arity error a Void program would.
pub trait Callable: fmt::Debug + fmt::Display {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RResult<Value>;

    fn check_arity(&self, arguments: &[Value], line: usize) -> RResult<()> {
        if arguments.len() == self.arity() {
            return Ok(());
        }

        debug!(
            "Arity mismatch calling '{}': expected {}, got {}",
            self.name(),
            self.arity(),
            arguments.len()
        );

        Err(RuntimeError::InvalidArgumentCount {
            expected: self.arity(),
            actual: arguments.len(),
            line,
        })
    }
}

/// Signature of a host function body.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A function implemented by the host.
#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, arity: usize, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            arity,
            func,
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RResult<Value> {
        self.check_arity(&arguments, line)?;
        debug!("Calling native function '{}'", self.name);

        let result = (self.func)(&arguments).map_err(|message| RuntimeError::Native {
            name: self.name.clone(),
            message,
        })?;

        info!("Native function '{}' returned: {}", self.name, result);

        Ok(result)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// A function declared in Void source, closed over the scope that was active
/// when its declaration executed.
pub struct UserFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl UserFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Self {
            declaration,
            closure,
        }
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Runs the body in a fresh scope whose parent is the closure, not the
    /// caller's scope.  A `return` inside the body ends the call with its
    /// value; falling off the end yields `null`.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> RResult<Value> {
        self.check_arity(&arguments, line)?;
        debug!("Calling user-defined function '{}'", self.name());

        let environment = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.lexeme, argument);

            environment.borrow_mut().declare(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                info!("Function '{}' returned null", self.name());
                Ok(Value::Null)
            }

            Err(InterpretError::ReturnSignal(value)) => {
                info!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }

            Err(InterpretError::Runtime(e)) => Err(e),
        }
    }
}

// The closure may (indirectly) contain this very function, so only the
// signature is printed.
impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// Functions seeded into every global scope.
pub fn natives() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new("clock", 0, |_args: &[Value]| {
            let micros: i64 = Utc::now().timestamp_micros();
            Ok(Value::Number(micros as f64 / 1_000_000.0))
        }),
        NativeFunction::new("str", 1, |args: &[Value]| match args {
            [value] => Ok(Value::String(value.to_string())),
            _ => Err(format!("expected 1 argument, got {}", args.len())),
        }),
    ]
}
