use std::fmt;

use chrono::Utc;
use log::debug;

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything the guest language can invoke with `callee(args…)`.
///
/// The interpreter checks the argument count against [`arity`](Self::arity)
/// before calling, so implementations may assume it matches.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// A function provided by the host.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    /// Seconds since the Unix epoch as a number.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let now = Utc::now();
                let seconds = now.timestamp_micros() as f64 / 1_000_000.0;

                debug!("Native function 'clock' returned: {}", seconds);

                Value::Number(seconds)
            },
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}/{}>", self.name, self.arity)
    }
}
