use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::error::Control;

// The tree is built once by the parser and never mutated afterwards. Function literals are kept
// behind an `Rc` so function values created at runtime can share the parameters and the body
// with the tree instead of cloning them on every evaluation.

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let { name: Identifier, value: Expr },
    Return { value: Expr },
    Expression { expression: Expr },
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionLiteral {
    pub params: Vec<Identifier>,
    pub body: Block,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Bang,
    Minus,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Identifier(Identifier),
    Integer(i64),
    Boolean(bool),
    Array {
        elements: Vec<Expr>,
    },
    Prefix {
        operator: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: InfixOp,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function(Rc<FunctionLiteral>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
    },
}

pub(crate) trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, Control> {
        match expr {
            Expr::Identifier(ident) => self.visit_identifier(ident),
            Expr::Integer(value) => self.visit_integer(*value),
            Expr::Boolean(value) => self.visit_boolean(*value),
            Expr::Array { elements } => self.visit_array(elements),
            Expr::Prefix { operator, right } => self.visit_prefix(*operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => self.visit_infix(left, *operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.visit_if(condition, consequence, alternative.as_ref()),
            Expr::Function(literal) => self.visit_function(literal),
            Expr::Call { callee, args } => self.visit_call(callee, args),
            Expr::Index { receiver, index } => self.visit_index(receiver, index),
        }
    }

    fn visit_identifier(&mut self, ident: &Identifier) -> Result<Self::Item, Control>;
    fn visit_integer(&mut self, value: i64) -> Result<Self::Item, Control>;
    fn visit_boolean(&mut self, value: bool) -> Result<Self::Item, Control>;
    fn visit_array(&mut self, elements: &[Expr]) -> Result<Self::Item, Control>;
    fn visit_prefix(&mut self, operator: PrefixOp, right: &Expr) -> Result<Self::Item, Control>;
    fn visit_infix(
        &mut self,
        left: &Expr,
        operator: InfixOp,
        right: &Expr,
    ) -> Result<Self::Item, Control>;
    fn visit_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Result<Self::Item, Control>;
    fn visit_function(&mut self, literal: &Rc<FunctionLiteral>) -> Result<Self::Item, Control>;
    fn visit_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Self::Item, Control>;
    fn visit_index(&mut self, receiver: &Expr, index: &Expr) -> Result<Self::Item, Control>;
}

pub(crate) trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, Control> {
        match stmt {
            Stmt::Let { name, value } => self.visit_let(name, value),
            Stmt::Return { value } => self.visit_return(value),
            Stmt::Expression { expression } => self.visit_expression(expression),
        }
    }

    fn visit_let(&mut self, name: &Identifier, value: &Expr) -> Result<Self::Item, Control>;
    fn visit_return(&mut self, value: &Expr) -> Result<Self::Item, Control>;
    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Control>;
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into() }
    }
}

// Creator methods, used by the parser and to keep the expected trees in tests readable.
impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier(Identifier::new(name))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Expr::Array { elements }
    }

    pub fn prefix(operator: PrefixOp, right: Expr) -> Self {
        Expr::Prefix {
            operator,
            right: Box::new(right),
        }
    }

    pub fn infix(left: Expr, operator: InfixOp, right: Expr) -> Self {
        Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn if_(condition: Expr, consequence: Block, alternative: Option<Block>) -> Self {
        Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }
    }

    pub fn function(params: Vec<Identifier>, body: Block) -> Self {
        Expr::Function(Rc::new(FunctionLiteral { params, body }))
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn index(receiver: Expr, index: Expr) -> Self {
        Expr::Index {
            receiver: Box::new(receiver),
            index: Box::new(index),
        }
    }
}

impl Stmt {
    pub fn let_(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Let {
            name: Identifier::new(name),
            value,
        }
    }

    pub fn return_(value: Expr) -> Self {
        Stmt::Return { value }
    }

    pub fn expression(expression: Expr) -> Self {
        Stmt::Expression { expression }
    }
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Block { statements }
    }
}

// Rendering. Prefix, infix and index expressions are fully parenthesised so the precedence the
// parser picked is visible, and every rendering parses back without errors. Expression
// statements carry no terminator of their own, so a `;` is inserted after them whenever another
// statement follows.

fn write_statements(f: &mut Formatter<'_>, statements: &[Stmt]) -> std::fmt::Result {
    for (idx, stmt) in statements.iter().enumerate() {
        if idx > 0 {
            match statements[idx - 1] {
                Stmt::Expression { .. } => f.write_str("; ")?,
                _ => f.write_str(" ")?,
            }
        }

        write!(f, "{}", stmt)?;
    }

    Ok(())
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> std::fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }

        write!(f, "{}", item)?;
    }

    Ok(())
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_statements(f, &self.statements)
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value),
            Stmt::Return { value } => write!(f, "return {};", value),
            Stmt::Expression { expression } => write!(f, "{}", expression),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.statements.is_empty() {
            return f.write_str("{ }");
        }

        f.write_str("{ ")?;
        write_statements(f, &self.statements)?;
        f.write_str(" }")
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("func(")?;
        write_list(f, &self.params)?;
        write!(f, ") {}", self.body)
    }
}

impl Display for PrefixOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefixOp::Bang => f.write_str("!"),
            PrefixOp::Minus => f.write_str("-"),
        }
    }
}

impl Display for InfixOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Star => "*",
            InfixOp::Slash => "/",
            InfixOp::Less => "<",
            InfixOp::Greater => ">",
            InfixOp::LessEqual => "<=",
            InfixOp::GreaterEqual => ">=",
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
        };

        f.write_str(symbol)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::Integer(value) => write!(f, "{}", value),
            Expr::Boolean(value) => write!(f, "{}", value),
            Expr::Array { elements } => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Expr::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function(literal) => write!(f, "{}", literal),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Index { receiver, index } => write!(f, "({}[{}])", receiver, index),
        }
    }
}
