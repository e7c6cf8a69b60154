use phf::{phf_map, Map};

use crate::token::{Kind, Token};

/// Pull-based tokenizer. Tokens are produced one at a time through [`Lexer::next_token`], or
/// through the [`Iterator`] impl which stops right after the `Eof` token has been emitted.
///
/// The lexer never fails; a character that cannot start any token is returned as an
/// [`Kind::Illegal`] token holding that character and the parser decides what to do with it.
pub struct Lexer<'a> {
    src: &'a str,
    line: usize,

    // `start` and `current` are byte offsets pointing to the start and end of the token being
    // scanned
    start: usize,
    current: usize,

    // Set once the eof token has been handed out through the iterator.
    eof: bool,
}

impl<'a> Lexer<'a> {
    const KEYWORDS: Map<&'static str, Kind> = phf_map! {
        "func" => Kind::Func,
        "let" => Kind::Let,
        "true" => Kind::True,
        "false" => Kind::False,
        "if" => Kind::If,
        "else" => Kind::Else,
        "return" => Kind::Return,
    };

    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            line: 1,
            start: 0,
            current: 0,
            eof: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return Token::eof(self.line);
        }

        let c = self.advance();
        match c {
            '(' => self.make_token(Kind::LeftParen),
            ')' => self.make_token(Kind::RightParen),
            '{' => self.make_token(Kind::LeftBrace),
            '}' => self.make_token(Kind::RightBrace),
            '[' => self.make_token(Kind::LeftBracket),
            ']' => self.make_token(Kind::RightBracket),
            ',' => self.make_token(Kind::Comma),
            ';' => self.make_token(Kind::SemiColon),
            '+' => self.make_token(Kind::Plus),
            '-' => self.make_token(Kind::Minus),
            '*' => self.make_token(Kind::Star),
            '/' => self.make_token(Kind::Slash),

            '=' => {
                if self.match_char('=') {
                    self.make_token(Kind::EqualEqual)
                } else {
                    self.make_token(Kind::Assign)
                }
            }

            '!' => {
                if self.match_char('=') {
                    self.make_token(Kind::BangEqual)
                } else {
                    self.make_token(Kind::Bang)
                }
            }

            '<' => {
                if self.match_char('=') {
                    self.make_token(Kind::LessEqual)
                } else {
                    self.make_token(Kind::Less)
                }
            }

            '>' => {
                if self.match_char('=') {
                    self.make_token(Kind::GreaterEqual)
                } else {
                    self.make_token(Kind::Greater)
                }
            }

            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),

            _ => self.make_token(Kind::Illegal),
        }
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        self.make_token(Kind::Int)
    }

    fn identifier(&mut self) -> Token {
        while is_identifier_part(self.peek()) {
            self.advance();
        }

        let text = &self.src[self.start..self.current];
        let kind = Self::KEYWORDS
            .get(text)
            .copied()
            .unwrap_or(Kind::Identifier);

        self.make_token(kind)
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => return,
            }
        }
    }

    // Returns '\0' at the end of input, which never starts a token.
    fn peek(&self) -> char {
        self.src[self.current..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += c.len_utf8();
        c
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.peek() != c {
            false
        } else {
            self.advance();
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&self, kind: Kind) -> Token {
        Token::new(kind, &self.src[self.start..self.current], self.line)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        let token = self.next_token();
        if token.is(Kind::Eof) {
            self.eof = true;
        }

        Some(token)
    }
}
