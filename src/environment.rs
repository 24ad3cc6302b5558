use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope.  Scopes are shared (`Rc<RefCell<_>>`) between the call
/// frames and closures that reference them and live as long as any of them.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this scope, replacing any binding of the same name here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Search this scope and then the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The scope exactly `depth` links above `env`, if the chain is that long.
    pub fn ancestor(env: &Rc<RefCell<Environment>>, depth: usize) -> Option<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..depth {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the scope `depth` links up, without searching.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        let scope = Self::ancestor(env, depth).ok_or_else(|| desync(name, depth))?;
        let value = scope.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| desync(name, depth))
    }

    /// Overwrite `name` in the scope `depth` links up, without searching.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let scope = Self::ancestor(env, depth).ok_or_else(|| desync(name, depth))?;
        let mut scope = scope.borrow_mut();

        let Some(slot) = scope.values.get_mut(&name.lexeme) else {
            return Err(desync(name, depth));
        };

        *slot = value;

        Ok(())
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn desync(name: &Token, depth: usize) -> RuntimeError {
    error!(
        "Scope chain does not bind '{}' at depth {} (line {})",
        name.lexeme, depth, name.line
    );

    RuntimeError::Desync {
        name: name.lexeme.clone(),
        depth,
        line: name.line,
    }
}
