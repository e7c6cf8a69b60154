use std::mem;

use monk_core::{Kind, Lexer, Token};
use tracing::{debug, trace};

use crate::ast::{Block, Expr, Identifier, InfixOp, PrefixOp, Program, Stmt};
use crate::error::ParseError;
use crate::limits::{self, MAX_NESTING_DEPTH};

// Helper alias for shorter return types
type StmtResult = Result<Stmt, ParseError>;
type ExprResult = Result<Expr, ParseError>;

type PrefixFn<'a> = fn(&mut Parser<'a>) -> ExprResult;
type InfixFn<'a> = fn(&mut Parser<'a>, Expr) -> ExprResult;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

struct ParseRule<'a> {
    prefix: Option<PrefixFn<'a>>,
    infix: Option<InfixFn<'a>>,
    precedence: Precedence,
}

impl<'a> ParseRule<'a> {
    fn new(
        prefix: Option<PrefixFn<'a>>,
        infix: Option<InfixFn<'a>>,
        precedence: Precedence,
    ) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }
}

/// Pratt parser working on exactly two tokens of lookahead, `cur` and `peek`.
///
/// A malformed statement is dropped and its error recorded, parsing then resumes at the next
/// token, so a single pass reports every error of the input in the order they were found.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    peek: Token,
    errors: Vec<ParseError>,

    // number of `expression` calls currently on the stack
    depth: usize,
}

impl<'a> Parser<'a> {
    // A Pratt parser's table translated as a match. The first column maps a token kind to the
    // function parsing an expression starting with it, the second column maps to the function
    // extending an already parsed left operand with it. The third column is the binding power of
    // the token when it is used as an infix operator.
    //
    // Kinds without an infix function have the lowest precedence, so seeing one in the lookahead
    // simply ends the current expression.
    fn rule(kind: Kind) -> ParseRule<'a> {
        match kind {
            Kind::Identifier => ParseRule::new(Some(Self::identifier), None, Precedence::Lowest),
            Kind::Int => ParseRule::new(Some(Self::integer), None, Precedence::Lowest),
            Kind::True => ParseRule::new(Some(Self::boolean), None, Precedence::Lowest),
            Kind::False => ParseRule::new(Some(Self::boolean), None, Precedence::Lowest),
            Kind::Bang => ParseRule::new(Some(Self::prefix), None, Precedence::Lowest),
            Kind::Minus => ParseRule::new(Some(Self::prefix), Some(Self::infix), Precedence::Sum),
            Kind::Plus => ParseRule::new(None, Some(Self::infix), Precedence::Sum),
            Kind::Star => ParseRule::new(None, Some(Self::infix), Precedence::Product),
            Kind::Slash => ParseRule::new(None, Some(Self::infix), Precedence::Product),
            Kind::EqualEqual => ParseRule::new(None, Some(Self::infix), Precedence::Equals),
            Kind::BangEqual => ParseRule::new(None, Some(Self::infix), Precedence::Equals),
            Kind::Less => ParseRule::new(None, Some(Self::infix), Precedence::LessGreater),
            Kind::Greater => ParseRule::new(None, Some(Self::infix), Precedence::LessGreater),
            Kind::LessEqual => ParseRule::new(None, Some(Self::infix), Precedence::LessGreater),
            Kind::GreaterEqual => {
                ParseRule::new(None, Some(Self::infix), Precedence::LessGreater)
            }
            Kind::LeftParen => {
                ParseRule::new(Some(Self::grouping), Some(Self::call), Precedence::Call)
            }
            Kind::LeftBracket => {
                ParseRule::new(Some(Self::array), Some(Self::index), Precedence::Call)
            }
            Kind::If => ParseRule::new(Some(Self::if_expression), None, Precedence::Lowest),
            Kind::Func => ParseRule::new(Some(Self::function), None, Precedence::Lowest),
            Kind::Illegal
            | Kind::Eof
            | Kind::Assign
            | Kind::Comma
            | Kind::SemiColon
            | Kind::RightParen
            | Kind::LeftBrace
            | Kind::RightBrace
            | Kind::RightBracket
            | Kind::Let
            | Kind::Else
            | Kind::Return => ParseRule::new(None, None, Precedence::Lowest),
        }
    }

    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();

        Parser {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.cur_is(Kind::Eof) {
            if let Some(stmt) = self.statement_or_record() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        program
    }

    /// Errors recorded so far, in the order they were encountered.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // Used by both the program and block loops. On error `cur` is left wherever the failing
    // statement stopped and the caller moves on from there, skipping a semicolon that directly
    // follows. Input nested too deeply is skipped up to the end of the statement.
    fn statement_or_record(&mut self) -> Option<Stmt> {
        match self.statement() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                debug!("[line {}] parse error: {}", err.line(), err);
                if let ParseError::NestingTooDeep { .. } = err {
                    while !self.peek_is(Kind::SemiColon) && !self.peek_is(Kind::Eof) {
                        self.next_token();
                    }
                }
                self.errors.push(err);

                if self.peek_is(Kind::SemiColon) {
                    self.next_token();
                }
                None
            }
        }
    }

    fn statement(&mut self) -> StmtResult {
        trace!(kind = %self.cur.kind, line = self.cur.line, "parsing statement");

        let stmt = match self.cur.kind {
            Kind::Let => self.let_statement()?,
            Kind::Return => self.return_statement()?,
            _ => Stmt::expression(self.expression(Precedence::Lowest)?),
        };

        if self.peek_is(Kind::SemiColon) {
            self.next_token();
        }

        Ok(stmt)
    }

    fn let_statement(&mut self) -> StmtResult {
        self.expect_peek(Kind::Identifier)?;
        let name = self.cur.lexeme.clone();

        self.expect_peek(Kind::Assign)?;
        self.next_token();

        let value = self.expression(Precedence::Lowest)?;
        Ok(Stmt::let_(name, value))
    }

    fn return_statement(&mut self) -> StmtResult {
        self.next_token();

        let value = self.expression(Precedence::Lowest)?;
        Ok(Stmt::return_(value))
    }

    // Expects `cur` to be the opening brace, leaves `cur` on the closing one.
    fn block(&mut self) -> Result<Block, ParseError> {
        let mut block = Block::default();
        self.next_token();

        while !self.cur_is(Kind::RightBrace) && !self.cur_is(Kind::Eof) {
            if let Some(stmt) = self.statement_or_record() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        if self.cur_is(Kind::Eof) {
            return Err(ParseError::unexpected_token(Kind::RightBrace, &self.cur));
        }

        Ok(block)
    }

    fn expression(&mut self, precedence: Precedence) -> ExprResult {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::nesting_too_deep(MAX_NESTING_DEPTH, &self.cur));
        }

        self.depth += 1;
        let result = limits::ensure_sufficient_stack(|| self.expression_unchecked(precedence));
        self.depth -= 1;
        result
    }

    fn expression_unchecked(&mut self, precedence: Precedence) -> ExprResult {
        let prefix = match Self::rule(self.cur.kind).prefix {
            Some(prefix) => prefix,
            None => return Err(ParseError::no_prefix_parse_fn(&self.cur)),
        };

        let mut left = prefix(self)?;
        while !self.peek_is(Kind::SemiColon) && precedence < self.peek_precedence() {
            let infix = match Self::rule(self.peek.kind).infix {
                Some(infix) => infix,
                None => return Ok(left),
            };

            self.next_token();
            left = infix(self, left)?;
        }

        Ok(left)
    }

    fn identifier(&mut self) -> ExprResult {
        Ok(Expr::identifier(self.cur.lexeme.clone()))
    }

    fn integer(&mut self) -> ExprResult {
        match self.cur.lexeme.parse::<i64>() {
            Ok(value) => Ok(Expr::Integer(value)),
            Err(_) => Err(ParseError::invalid_integer(&self.cur)),
        }
    }

    fn boolean(&mut self) -> ExprResult {
        Ok(Expr::Boolean(self.cur_is(Kind::True)))
    }

    fn prefix(&mut self) -> ExprResult {
        let operator = match self.cur.kind {
            Kind::Bang => PrefixOp::Bang,
            Kind::Minus => PrefixOp::Minus,
            kind => unreachable!("{} is not a prefix operator", kind),
        };

        self.next_token();
        let right = self.expression(Precedence::Prefix)?;
        Ok(Expr::prefix(operator, right))
    }

    fn grouping(&mut self) -> ExprResult {
        self.next_token();

        let expr = self.expression(Precedence::Lowest)?;
        self.expect_peek(Kind::RightParen)?;
        Ok(expr)
    }

    fn if_expression(&mut self) -> ExprResult {
        self.expect_peek(Kind::LeftParen)?;
        self.next_token();

        let condition = self.expression(Precedence::Lowest)?;
        self.expect_peek(Kind::RightParen)?;
        self.expect_peek(Kind::LeftBrace)?;

        let consequence = self.block()?;
        let alternative = if self.peek_is(Kind::Else) {
            self.next_token();
            self.expect_peek(Kind::LeftBrace)?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Expr::if_(condition, consequence, alternative))
    }

    fn function(&mut self) -> ExprResult {
        self.expect_peek(Kind::LeftParen)?;
        let params = self.function_params()?;

        self.expect_peek(Kind::LeftBrace)?;
        let body = self.block()?;

        Ok(Expr::function(params, body))
    }

    fn function_params(&mut self) -> Result<Vec<Identifier>, ParseError> {
        let mut params = Vec::new();
        if self.peek_is(Kind::RightParen) {
            self.next_token();
            return Ok(params);
        }

        self.expect_peek(Kind::Identifier)?;
        params.push(Identifier::new(self.cur.lexeme.clone()));

        while self.peek_is(Kind::Comma) {
            self.next_token();
            self.expect_peek(Kind::Identifier)?;
            params.push(Identifier::new(self.cur.lexeme.clone()));
        }

        self.expect_peek(Kind::RightParen)?;
        Ok(params)
    }

    fn array(&mut self) -> ExprResult {
        let elements = self.expression_list(Kind::RightBracket)?;
        Ok(Expr::array(elements))
    }

    fn infix(&mut self, left: Expr) -> ExprResult {
        let operator = match self.cur.kind {
            Kind::Plus => InfixOp::Plus,
            Kind::Minus => InfixOp::Minus,
            Kind::Star => InfixOp::Star,
            Kind::Slash => InfixOp::Slash,
            Kind::Less => InfixOp::Less,
            Kind::Greater => InfixOp::Greater,
            Kind::LessEqual => InfixOp::LessEqual,
            Kind::GreaterEqual => InfixOp::GreaterEqual,
            Kind::EqualEqual => InfixOp::Equal,
            Kind::BangEqual => InfixOp::NotEqual,
            kind => unreachable!("{} is not an infix operator", kind),
        };

        // Recursing with the operator's own precedence makes operators of the same level
        // left-associative.
        let precedence = Self::rule(self.cur.kind).precedence;
        self.next_token();

        let right = self.expression(precedence)?;
        Ok(Expr::infix(left, operator, right))
    }

    fn call(&mut self, callee: Expr) -> ExprResult {
        let args = self.expression_list(Kind::RightParen)?;
        Ok(Expr::call(callee, args))
    }

    fn index(&mut self, receiver: Expr) -> ExprResult {
        self.next_token();

        let index = self.expression(Precedence::Lowest)?;
        self.expect_peek(Kind::RightBracket)?;
        Ok(Expr::index(receiver, index))
    }

    // Comma separated expressions up to `end`, shared by call arguments and array literals.
    fn expression_list(&mut self, end: Kind) -> Result<Vec<Expr>, ParseError> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.expression(Precedence::Lowest)?);

        while self.peek_is(Kind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }

    fn next_token(&mut self) {
        self.cur = mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn cur_is(&self, kind: Kind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: Kind) -> bool {
        self.peek.is(kind)
    }

    // Advances only when the lookahead matches.
    fn expect_peek(&mut self, kind: Kind) -> Result<(), ParseError> {
        if self.peek_is(kind) {
            self.next_token();
            Ok(())
        } else {
            Err(ParseError::unexpected_token(kind, &self.peek))
        }
    }

    fn peek_precedence(&self) -> Precedence {
        Self::rule(self.peek.kind).precedence
    }
}
