use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use tracing::debug;

use crate::ast::{Block, FunctionLiteral, Identifier};
use crate::env::Environment;
use crate::error::Control;
use crate::interpreter::Interpreter;
use crate::value::{Value, NULL};

/// A closure: the literal it was created from plus the scope that was current at that point.
///
/// The literal is shared with the tree through an `Rc`, so creating a function value never
/// copies the body. A function stored in its own defining scope (any recursive function) forms
/// a reference cycle with that scope and is kept alive until the process exits.
pub struct Function {
    literal: Rc<FunctionLiteral>,
    closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub(crate) fn new(literal: Rc<FunctionLiteral>, closure: Rc<RefCell<Environment>>) -> Self {
        Function { literal, closure }
    }

    pub fn params(&self) -> &[Identifier] {
        &self.literal.params
    }

    pub fn body(&self) -> &Block {
        &self.literal.body
    }

    /// Runs the body in a fresh scope nested under the captured one, never under the caller's.
    /// Arguments are bound positionally: extra ones are dropped and missing ones stay unbound.
    pub(crate) fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value, Control> {
        debug!(params = self.params().len(), args = args.len(), "calling {}", self);

        let mut env = Environment::with(Rc::clone(&self.closure));
        for (param, arg) in self.params().iter().zip(args) {
            env.define(&param.name, arg);
        }

        match interpreter.execute_block_with_env(self.body(), Rc::new(RefCell::new(env))) {
            Ok(value) => Ok(value.unwrap_or(NULL)),
            Err(Control::Return(value)) => Ok(value),
            Err(err) => Err(err),
        }
    }
}

// The captured scope usually contains the function itself, printing it would never end.
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Function {}>", self.literal)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literal)
    }
}
