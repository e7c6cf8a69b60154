use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;

use crate::value::Value;

/// A single scope. Bindings are never copied into child scopes, lookups walk the `enclosing`
/// chain instead, so a child always observes later bindings made in its parents.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: AHashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        trace!("creating enclosed environment");
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    /// Binds `key` in this scope, shadowing any binding of the same name further out.
    pub fn define(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(key)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::env::Environment;
    use crate::value::Value;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("foo", Value::Integer(1));
        env.define("bar", Value::from(false));

        assert_eq!(env.get("foo"), Some(Value::Integer(1)));
        assert_eq!(env.get("bar"), Some(Value::from(false)));
        assert_eq!(env.get("baz"), None);
    }

    #[test]
    fn test_redefine_in_same_scope() {
        let mut env = Environment::new();
        env.define("foo", Value::Integer(1));
        env.define("foo", Value::Integer(2));

        assert_eq!(env.get("foo"), Some(Value::Integer(2)));
    }

    #[test]
    fn test_multi_level() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("foo", Value::Integer(1));
        outer.borrow_mut().define("bar", Value::Integer(2));

        let mut inner = Environment::with(Rc::clone(&outer));
        inner.define("foo", Value::Integer(10));

        assert_eq!(inner.get("foo"), Some(Value::Integer(10)));
        assert_eq!(inner.get("bar"), Some(Value::Integer(2)));
        assert_eq!(outer.borrow().get("foo"), Some(Value::Integer(1)));

        // bindings made in the parent after the child was created are visible
        outer.borrow_mut().define("baz", Value::Integer(3));
        assert_eq!(inner.get("baz"), Some(Value::Integer(3)));
    }
}
