use monk_core::{Kind, Token};
use thiserror::Error;

use crate::ast::{InfixOp, PrefixOp};
use crate::value::Value;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {found}")]
    UnexpectedToken {
        expected: Kind,
        found: Kind,

        // only reported through `line()`, the message stays line-free
        line: usize,
    },

    #[error("no prefix parse function for {kind}")]
    NoPrefixParseFn { kind: Kind, line: usize },

    #[error("could not parse \"{lexeme}\" as integer")]
    InvalidInteger { lexeme: String, line: usize },

    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize, line: usize },
}

impl ParseError {
    /// Line of the token the error was reported at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::NoPrefixParseFn { line, .. }
            | ParseError::InvalidInteger { line, .. }
            | ParseError::NestingTooDeep { line, .. } => *line,
        }
    }

    pub(crate) fn unexpected_token(expected: Kind, found: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected,
            found: found.kind,
            line: found.line,
        }
    }

    pub(crate) fn no_prefix_parse_fn(token: &Token) -> Self {
        ParseError::NoPrefixParseFn {
            kind: token.kind,
            line: token.line,
        }
    }

    pub(crate) fn invalid_integer(token: &Token) -> Self {
        ParseError::InvalidInteger {
            lexeme: token.lexeme.clone(),
            line: token.line,
        }
    }

    pub(crate) fn nesting_too_deep(limit: usize, token: &Token) -> Self {
        ParseError::NestingTooDeep {
            limit,
            line: token.line,
        }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum RuntimeError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: InfixOp,
        right: &'static str,
    },

    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        operator: InfixOp,
        right: &'static str,
    },

    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: PrefixOp,
        right: &'static str,
    },

    #[error("identifier not found: {name}")]
    IdentifierNotFound { name: String },

    #[error("not a function: {ty}")]
    NotAFunction { ty: &'static str },

    #[error("division by zero: {left} / 0")]
    DivisionByZero { left: i64 },

    #[error("stack overflow")]
    StackOverflow,
}

/// Markers that stop ordinary evaluation and unwind through `?` until something handles them.
/// A `Return` is absorbed at the nearest function call (or at the top level), an `Error` is
/// only absorbed at the top level where it is turned into [`Value::Error`].
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Control {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Control {
    fn from(err: RuntimeError) -> Self {
        Control::Error(err)
    }
}
