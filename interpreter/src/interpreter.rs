use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{
    Block, Expr, ExprVisitor, FunctionLiteral, Identifier, InfixOp, PrefixOp, Program,
    StmtVisitor,
};
use crate::env::Environment;
use crate::error::{Control, RuntimeError};
use crate::function::Function;
use crate::limits::{self, MAX_CALL_DEPTH};
use crate::value::{Value, NULL};

/// Tree-walking evaluator. `env` always points at the innermost scope of whatever is being
/// evaluated; it is swapped for the duration of a function call and restored afterwards, on the
/// error path as well. Calls nested more than 1024 deep fail with
/// [`RuntimeError::StackOverflow`].
pub struct Interpreter {
    env: Rc<RefCell<Environment>>,

    // function calls currently in progress
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_env(Rc::new(RefCell::new(Environment::new())))
    }

    /// Evaluates against an existing root scope, e.g. one kept alive across REPL lines.
    pub fn with_env(env: Rc<RefCell<Environment>>) -> Self {
        Interpreter { env, depth: 0 }
    }

    pub fn env(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.env)
    }

    /// Runs every statement in order and yields the value of the last one. A `return` at the top
    /// level stops the program with its value, a runtime error stops it with [`Value::Error`].
    /// Nothing is produced for an empty program or one ending with a `let`.
    pub fn eval(&mut self, program: &Program) -> Option<Value> {
        let mut result = None;
        for stmt in &program.statements {
            match self.visit_stmt(stmt) {
                Ok(value) => result = value,
                Err(Control::Return(value)) => return Some(value),
                Err(Control::Error(err)) => {
                    debug!("runtime error: {}", err);
                    return Some(Value::Error(err));
                }
            }
        }

        result
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        block: &Block,
        env: Rc<RefCell<Environment>>,
    ) -> Result<Option<Value>, Control> {
        let current = mem::replace(&mut self.env, env);
        let result = self.execute_block(block);
        self.env = current;
        result
    }

    // Long operator chains nest as deeply as their length, so the native stack is grown as needed.
    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Control> {
        limits::ensure_sufficient_stack(|| self.visit_expr(expr))
    }

    // Blocks do not open a scope of their own, a `let` inside an if body binds in the
    // surrounding scope.
    fn execute_block(&mut self, block: &Block) -> Result<Option<Value>, Control> {
        let mut result = None;
        for stmt in &block.statements {
            result = self.visit_stmt(stmt)?;
        }

        Ok(result)
    }
}

fn eval_integer_infix(left: i64, operator: InfixOp, right: i64) -> Result<Value, Control> {
    let value = match operator {
        InfixOp::Plus => Value::Integer(left.wrapping_add(right)),
        InfixOp::Minus => Value::Integer(left.wrapping_sub(right)),
        InfixOp::Star => Value::Integer(left.wrapping_mul(right)),
        InfixOp::Slash => {
            if right == 0 {
                return Err(RuntimeError::DivisionByZero { left }.into());
            }
            Value::Integer(left.wrapping_div(right))
        }
        InfixOp::Less => Value::from(left < right),
        InfixOp::Greater => Value::from(left > right),
        InfixOp::LessEqual => Value::from(left <= right),
        InfixOp::GreaterEqual => Value::from(left >= right),
        InfixOp::Equal => Value::from(left == right),
        InfixOp::NotEqual => Value::from(left != right),
    };

    Ok(value)
}

impl ExprVisitor for Interpreter {
    type Item = Value;

    fn visit_identifier(&mut self, ident: &Identifier) -> Result<Value, Control> {
        match self.env.borrow().get(&ident.name) {
            Some(value) => Ok(value),
            None => Err(RuntimeError::IdentifierNotFound {
                name: ident.name.clone(),
            }
            .into()),
        }
    }

    fn visit_integer(&mut self, value: i64) -> Result<Value, Control> {
        Ok(Value::Integer(value))
    }

    fn visit_boolean(&mut self, value: bool) -> Result<Value, Control> {
        Ok(Value::from(value))
    }

    fn visit_array(&mut self, elements: &[Expr]) -> Result<Value, Control> {
        let elements = elements
            .iter()
            .map(|element| self.eval_expr(element))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Value::from(elements))
    }

    fn visit_prefix(&mut self, operator: PrefixOp, right: &Expr) -> Result<Value, Control> {
        let right = self.eval_expr(right)?;

        match (operator, right) {
            (PrefixOp::Bang, right) => Ok(Value::from(!right.is_truthy())),
            (PrefixOp::Minus, Value::Integer(value)) => Ok(Value::Integer(value.wrapping_neg())),
            (PrefixOp::Minus, right) => Err(RuntimeError::UnknownPrefixOperator {
                operator,
                right: right.type_name(),
            }
            .into()),
        }
    }

    fn visit_infix(
        &mut self,
        left: &Expr,
        operator: InfixOp,
        right: &Expr,
    ) -> Result<Value, Control> {
        let left = self.eval_expr(left)?;
        let right = self.eval_expr(right)?;

        match (&left, &right) {
            (Value::Integer(lhs), Value::Integer(rhs)) => eval_integer_infix(*lhs, operator, *rhs),
            _ if left.type_name() != right.type_name() => Err(RuntimeError::TypeMismatch {
                left: left.type_name(),
                operator,
                right: right.type_name(),
            }
            .into()),
            _ => match operator {
                InfixOp::Equal => Ok(Value::from(left == right)),
                InfixOp::NotEqual => Ok(Value::from(left != right)),
                _ => Err(RuntimeError::UnknownInfixOperator {
                    left: left.type_name(),
                    operator,
                    right: right.type_name(),
                }
                .into()),
            },
        }
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Result<Value, Control> {
        let condition = self.eval_expr(condition)?;

        let branch = if condition.is_truthy() {
            Some(consequence)
        } else {
            alternative
        };

        match branch {
            Some(block) => Ok(self.execute_block(block)?.unwrap_or(NULL)),
            None => Ok(NULL),
        }
    }

    fn visit_function(&mut self, literal: &Rc<FunctionLiteral>) -> Result<Value, Control> {
        let function = Function::new(Rc::clone(literal), Rc::clone(&self.env));
        Ok(Value::Function(Rc::new(function)))
    }

    fn visit_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, Control> {
        let function = match self.eval_expr(callee)? {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::NotAFunction {
                    ty: other.type_name(),
                }
                .into())
            }
        };

        // arguments are evaluated in the caller's scope, before switching to the function's
        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        if self.depth >= MAX_CALL_DEPTH {
            debug!(depth = self.depth, "call depth exceeded");
            return Err(RuntimeError::StackOverflow.into());
        }

        self.depth += 1;
        let result = limits::ensure_sufficient_stack(|| function.call(self, args));
        self.depth -= 1;
        result
    }

    fn visit_index(&mut self, receiver: &Expr, index: &Expr) -> Result<Value, Control> {
        let receiver = self.eval_expr(receiver)?;
        let index = self.eval_expr(index)?;

        let value = match (receiver, index) {
            (Value::Array(elements), Value::Integer(idx)) => usize::try_from(idx)
                .ok()
                .and_then(|idx| elements.get(idx).cloned()),
            _ => None,
        };

        Ok(value.unwrap_or(NULL))
    }
}

impl StmtVisitor for Interpreter {
    type Item = Option<Value>;

    fn visit_let(&mut self, name: &Identifier, value: &Expr) -> Result<Option<Value>, Control> {
        let value = self.eval_expr(value)?;
        self.env.borrow_mut().define(&name.name, value);
        Ok(None)
    }

    fn visit_return(&mut self, value: &Expr) -> Result<Option<Value>, Control> {
        let value = self.eval_expr(value)?;
        Err(Control::Return(value))
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<Option<Value>, Control> {
        Ok(Some(self.eval_expr(expression)?))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::Interpreter;
    use crate::parse;
    use crate::value::Value;

    fn eval_with(interpreter: &mut Interpreter, src: &str) -> Option<Value> {
        let program = match parse(src) {
            Ok(program) => program,
            Err(errs) => panic!("unexpected parse errors for {:?}: {:?}", src, errs),
        };
        interpreter.eval(&program)
    }

    fn eval(src: &str) -> Option<Value> {
        eval_with(&mut Interpreter::new(), src)
    }

    fn test_programs(tests: &[(&str, &str)]) {
        for (src, expected) in tests {
            let result = eval(src).map(|value| value.to_string());
            assert_eq!(result.as_deref(), Some(*expected), "{}", src);
        }
    }

    #[test]
    fn test_integer_expressions() {
        test_programs(&[
            ("5", "5"),
            ("-10", "-10"),
            ("--10", "10"),
            ("5 + 5 + 5 + 5 - 10", "10"),
            ("2 * 2 * 2 * 2 * 2", "32"),
            ("-50 + 100 + -50", "0"),
            ("20 + 2 * -10", "0"),
            ("50 / 2 * 2 + 10", "60"),
            ("3 * (3 * 3) + 10", "37"),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", "50"),
            ("7 / 2", "3"),
            ("-7 / 2", "-3"),
            ("9223372036854775807 + 1", "-9223372036854775808"),
            ("1 / 0", "division by zero: 1 / 0"),
        ]);
    }

    #[test]
    fn test_boolean_expressions() {
        test_programs(&[
            ("true", "true"),
            ("1 < 2", "true"),
            ("1 > 2", "false"),
            ("1 <= 1", "true"),
            ("2 >= 3", "false"),
            ("1 == 1", "true"),
            ("1 != 1", "false"),
            ("true == true", "true"),
            ("true != false", "true"),
            ("(1 < 2) == true", "true"),
            ("(1 > 2) == true", "false"),
            ("!true", "false"),
            ("!!true", "true"),
            ("!5", "false"),
            ("!0", "false"),
            ("!if (false) { 1 }", "true"),
            ("if (false) { 1 } == if (false) { 2 }", "true"),
        ]);
    }

    #[test]
    fn test_if_else_expressions() {
        test_programs(&[
            ("if (true) { 10 }", "10"),
            ("if (false) { 10 }", "null"),
            ("if (1) { 10 }", "10"),
            ("if (0) { 10 }", "10"),
            ("if (1 < 2) { 10 } else { 20 }", "10"),
            ("if (1 > 2) { 10 } else { 20 }", "20"),
            ("if (true) { let a = 1; }", "null"),
            // bodies share the surrounding scope
            ("if (true) { let a = 7; }; a", "7"),
        ]);
    }

    #[test]
    fn test_return_statements() {
        test_programs(&[
            ("return 10;", "10"),
            ("return 10; 9;", "10"),
            ("return 2 * 5; 9;", "10"),
            ("9; return 2 * 5; 9;", "10"),
            (
                "if (10 > 1) { if (10 > 1) { return 10; } return 1; }",
                "10",
            ),
            ("let f = func(x) { return x; x + 10; }; f(10);", "10"),
            (
                "let f = func(x) { if (x > 5) { return 1; } 0 }; f(10) + f(1) * 10",
                "1",
            ),
        ]);
    }

    #[test]
    fn test_error_handling() {
        test_programs(&[
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("1 == true", "type mismatch: INTEGER == BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("-[1]", "unknown operator: -ARRAY"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("[1] < [2]", "unknown operator: ARRAY < ARRAY"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            ("[1, foo]", "identifier not found: foo"),
            ("let x = 5; x(1)", "not a function: INTEGER"),
            ("true()", "not a function: BOOLEAN"),
            ("let f = func(x) { x }; f(y)", "identifier not found: y"),
            (
                "let f = func() { -true; 5 }; f(); 10",
                "unknown operator: -BOOLEAN",
            ),
            ("let f = func(x, y) { x + y }; f(1);", "identifier not found: y"),
        ]);
    }

    #[test]
    fn test_let_statements() {
        test_programs(&[
            ("let a = 5; a;", "5"),
            ("let a = 5 * 5; a;", "25"),
            ("let a = 5; let b = a; b;", "5"),
            ("let a = 5; let b = a; let c = a + b + 5; c;", "15"),
            ("let a = 5; let a = a + 1; a", "6"),
        ]);

        assert_eq!(eval("let a = 5;"), None);
        assert_eq!(eval("5; let a = 5;"), None);
        assert_eq!(eval(""), None);
    }

    #[test]
    fn test_functions() {
        test_programs(&[
            ("func(x) { x + 2; }", "func(x) { (x + 2) }"),
            ("let identity = func(x) { x; }; identity(5);", "5"),
            ("let double = func(x) { x * 2; }; double(5);", "10"),
            ("let add = func(x, y) { x + y; }; add(5, 5);", "10"),
            ("let add = func(x, y) { x + y; }; add(5 + 5, add(5, 5));", "20"),
            ("func(x) { x; }(5)", "5"),
            ("func() { }()", "null"),
            // extra arguments are ignored
            ("let one = func(x) { x }; one(1, 2, 3)", "1"),
            ("let f = func() { 1 }; f == f", "true"),
        ]);
    }

    #[test]
    fn test_closures() {
        test_programs(&[
            (
                "let newAdder = func(x) { func(y) { x + y } }; let addTwo = newAdder(2); addTwo(3);",
                "5",
            ),
            // scopes are lexical, the caller's bindings are not visible to the callee
            (
                "let x = 1; let f = func() { x }; let g = func(x) { f() }; g(5)",
                "1",
            ),
            // closures hold a live reference to their scope, not a snapshot
            ("let x = 1; let f = func() { x }; let x = 2; f()", "2"),
            (
                "let counter = func(n) { func() { n + 1 } }; let a = counter(1); let b = counter(10); a() + b()",
                "13",
            ),
            (
                "let fib = func(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(15)",
                "610",
            ),
            (
                "let apply = func(f, x) { f(x) }; apply(func(x) { x * x }, 7)",
                "49",
            ),
        ]);
    }

    #[test]
    fn test_arrays() {
        test_programs(&[
            ("[1, 2 * 2, 3 + 3]", "[1, 4, 6]"),
            ("[]", "[]"),
            ("[1, [true, []], func(x) { x }]", "[1, [true, []], func(x) { x }]"),
            ("[1, 2, 3][0]", "1"),
            ("[1, 2, 3][1 + 1]", "3"),
            ("let i = 0; [1][i];", "1"),
            ("let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];", "6"),
            ("let a = [1, 2, 3]; a[5];", "null"),
            ("[1, 2, 3][3]", "null"),
            ("[1, 2, 3][-1]", "null"),
            ("1[0]", "null"),
            ("[1][true]", "null"),
            ("let a = [1]; a == a", "true"),
            ("[1] == [1]", "false"),
            ("[1] != [1]", "true"),
        ]);
    }

    #[test]
    fn test_session_keeps_bindings() {
        let mut interpreter = Interpreter::new();

        assert_eq!(eval_with(&mut interpreter, "let a = 5;"), None);
        assert_eq!(
            eval_with(&mut interpreter, "let double = func(x) { x * 2 };"),
            None
        );
        assert_eq!(
            eval_with(&mut interpreter, "double(a)"),
            Some(Value::Integer(10))
        );
    }

    #[test]
    fn test_interpreters_sharing_a_root_scope() {
        let mut first = Interpreter::new();
        eval_with(&mut first, "let shared = [1, 2];");

        let mut second = Interpreter::with_env(first.env());
        assert_eq!(
            eval_with(&mut second, "shared[1]"),
            Some(Value::Integer(2))
        );
        assert_eq!(
            first.env().borrow().get("shared").map(|value| value.to_string()),
            Some(String::from("[1, 2]"))
        );
    }

    #[test]
    fn test_scope_is_restored_after_error_in_call() {
        let mut interpreter = Interpreter::new();

        let result = eval_with(&mut interpreter, "let f = func(x) { x + true }; f(1)");
        assert_eq!(
            result.map(|value| value.to_string()),
            Some(String::from("type mismatch: INTEGER + BOOLEAN"))
        );

        // `x` was only bound in the call's scope
        let result = eval_with(&mut interpreter, "x");
        assert_eq!(
            result.map(|value| value.to_string()),
            Some(String::from("identifier not found: x"))
        );
    }

    #[test]
    fn test_call_depth_limit() {
        let countdown = "let f = func(n) { if (n == 0) { 0 } else { f(n - 1) } };";

        test_programs(&[
            (&format!("{} f(1000)", countdown), "0"),
            (&format!("{} f(5000)", countdown), "stack overflow"),
            ("let f = func() { f() }; f()", "stack overflow"),
        ]);
    }

    #[test]
    fn test_session_continues_after_stack_overflow() {
        let mut interpreter = Interpreter::new();

        let result = eval_with(&mut interpreter, "let f = func(x) { f(x + 1) }; f(0)");
        assert_eq!(
            result.map(|value| value.to_string()),
            Some(String::from("stack overflow"))
        );

        let result = eval_with(&mut interpreter, "x");
        assert_eq!(
            result.map(|value| value.to_string()),
            Some(String::from("identifier not found: x"))
        );

        // the depth is back to zero, a full-depth call still fits
        let result = eval_with(
            &mut interpreter,
            "let g = func(n) { if (n == 0) { n } else { g(n - 1) } }; g(1000)",
        );
        assert_eq!(result.map(|value| value.to_string()), Some(String::from("0")));
    }

    #[test]
    fn test_long_operator_chain() {
        let src = format!("1{}", " + 1".repeat(5_000));
        test_programs(&[(&src, "5001")]);
    }
}
