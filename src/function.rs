use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::callable::Callable;
use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{InterpretError, Interpreter};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// A user‑defined function or method: its declaration, the scope it closed
/// over, and the hop‑count table of the run that declared it.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    locals: Rc<Locals>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        locals: Rc<Locals>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            locals,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            locals: Rc::clone(&self.locals),
            is_initializer: self.is_initializer,
        }
    }

    /// The instance an initializer was bound to.
    fn bound_this(&self) -> Result<Value, RuntimeError> {
        let this = Token::new(TokenType::THIS, "this", self.declaration.name.line, 0);
        Environment::get_at(&self.closure, 0, &this)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut parameters = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            parameters.define(&param.lexeme, argument);
        }

        let body = Environment::with_enclosing(Rc::new(RefCell::new(parameters)));

        let result = interpreter.execute_function_body(
            &self.declaration.body,
            Rc::new(RefCell::new(body)),
            Rc::clone(&self.locals),
        );

        match result {
            Ok(()) if self.is_initializer => self.bound_this(),
            Ok(()) => Ok(Value::Nil),
            Err(InterpretError::Return(_)) if self.is_initializer => self.bound_this(),
            Err(InterpretError::Return(value)) => Ok(value),
            Err(InterpretError::Runtime(e)) => Err(e),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}/{}>", self.name(), self.arity())
    }
}
