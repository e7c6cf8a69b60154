use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Illegal,
    Eof,

    Identifier,
    Int,

    Assign,
    Plus,
    Minus,
    Bang,
    Star,
    Slash,

    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,

    Comma,
    SemiColon,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    Func,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Illegal => "ILLEGAL",
            Kind::Eof => "EOF",
            Kind::Identifier => "ID",
            Kind::Int => "DIGIT",
            Kind::Assign => "=",
            Kind::Plus => "+",
            Kind::Minus => "-",
            Kind::Bang => "!",
            Kind::Star => "*",
            Kind::Slash => "/",
            Kind::Less => "<",
            Kind::Greater => ">",
            Kind::LessEqual => "<=",
            Kind::GreaterEqual => ">=",
            Kind::EqualEqual => "==",
            Kind::BangEqual => "!=",
            Kind::Comma => ",",
            Kind::SemiColon => ";",
            Kind::LeftParen => "(",
            Kind::RightParen => ")",
            Kind::LeftBrace => "{",
            Kind::RightBrace => "}",
            Kind::LeftBracket => "[",
            Kind::RightBracket => "]",
            Kind::Func => "FUNC",
            Kind::Let => "LET",
            Kind::True => "TRUE",
            Kind::False => "FALSE",
            Kind::If => "IF",
            Kind::Else => "ELSE",
            Kind::Return => "RETURN",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Kind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: Kind, lexeme: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Token::new(Kind::Eof, String::new(), line)
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }
}
