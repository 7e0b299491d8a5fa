use phf::{phf_map, Map};

use crate::errors::SiltError;
use crate::token::{Literal, Token, Type};

pub struct Scanner<'a> {
    start: usize,
    current: usize,
    line: usize,
    src: &'a str,
}

impl<'a> Scanner<'a> {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "and" => Type::And,
        "else" => Type::Else,
        "for" => Type::For,
        "if" => Type::If,
        "or" => Type::Or,
        "return" => Type::Return,
        "this" => Type::This,
        "var" => Type::Var,
        "class" => Type::Class,
        "false" => Type::False,
        "fun" => Type::Fun,
        "nil" => Type::Nil,
        "print" => Type::Print,
        "super" => Type::Super,
        "true" => Type::True,
        "while" => Type::While,
    };

    pub fn new(src: &'a str) -> Self {
        Scanner {
            start: 0,
            current: 0,
            line: 1,
            src,
        }
    }

    // Errors don't stop the scan. The offending character contributes no token and scanning
    // picks up at the next one, so a single pass reports every lexical error in the source.
    pub fn scan_tokens(&mut self) -> (Vec<Token>, Vec<SiltError>) {
        let mut tokens = vec![];
        let mut errors = vec![];
        while !self.is_at_end() {
            self.start = self.current;
            if let Err(err) = self.scan_token(&mut tokens) {
                errors.push(err);
            }
        }

        self.start = self.current;
        tokens.push(self.make_token(Type::Eof));
        (tokens, errors)
    }

    fn scan_token(&mut self, tokens: &mut Vec<Token>) -> Result<(), SiltError> {
        let c = self.advance();

        match c {
            '(' => tokens.push(self.make_token(Type::LeftParen)),
            ')' => tokens.push(self.make_token(Type::RightParen)),
            '{' => tokens.push(self.make_token(Type::LeftBrace)),
            '}' => tokens.push(self.make_token(Type::RightBrace)),
            ',' => tokens.push(self.make_token(Type::Comma)),
            '.' => tokens.push(self.make_token(Type::Dot)),
            '-' => tokens.push(self.make_token(Type::Minus)),
            '+' => tokens.push(self.make_token(Type::Plus)),
            ';' => tokens.push(self.make_token(Type::SemiColon)),
            '*' => tokens.push(self.make_token(Type::Star)),

            '!' => {
                if self.match_char('=') {
                    tokens.push(self.make_token(Type::BangEqual))
                } else {
                    tokens.push(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    tokens.push(self.make_token(Type::EqualEqual))
                } else {
                    tokens.push(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    tokens.push(self.make_token(Type::LessEqual))
                } else {
                    tokens.push(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    tokens.push(self.make_token(Type::GreaterEqual))
                } else {
                    tokens.push(self.make_token(Type::Greater))
                }
            }

            '/' => {
                if self.match_char('/') {
                    // A comment runs to the end of the line and produces nothing.
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    tokens.push(self.make_token(Type::Slash));
                }
            }

            '"' => tokens.push(self.string()?),

            // White spaces, do nothing
            ' ' | '\t' | '\r' => {}

            // Increment for new line
            '\n' => self.line += 1,

            _ => {
                if c.is_ascii_digit() {
                    tokens.push(self.number())
                } else if c.is_ascii_alphabetic() || c == '_' {
                    tokens.push(self.identifier())
                } else {
                    return Err(self.error("Unexpected character."));
                }
            }
        }

        Ok(())
    }

    fn string(&mut self) -> Result<Token, SiltError> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(self.error("Unterminated string."));
        }

        // consume the closing "
        self.advance();
        Ok(self.make_token_with_val(
            Type::String,
            Literal::from(String::from(&self.src[self.start + 1..self.current - 1])),
        ))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.make_token_with_val(
            Type::Number,
            Literal::Num(self.src[self.start..self.current].parse::<f64>().unwrap()),
        )
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.src[self.start..self.current];

        match Self::KEYWORDS.get(text) {
            None => self.make_token(Type::Identifier),
            Some(ty @ Type::True) | Some(ty @ Type::False) => {
                let val = match ty {
                    Type::True => Literal::Bool(true),
                    _ => Literal::Bool(false),
                };

                self.make_token_with_val(*ty, val)
            }
            Some(keyword) => self.make_token(*keyword),
        }
    }

    fn make_token(&self, ty: Type) -> Token {
        self.make_token_with_val(ty, Literal::Nil)
    }

    fn make_token_with_val(&self, ty: Type, val: Literal) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => String::from(&self.src[self.start..self.current]),
        };

        Token::new(ty, lexeme, self.line, val)
    }

    // `start` and `current` are byte offsets, stepped by `len_utf8` so the lexeme slices
    // above stay on character boundaries even for non-ASCII source.
    fn current_char(&self) -> char {
        self.src[self.current..].chars().next().unwrap()
    }

    fn peek(&self) -> char {
        self.src[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.src[self.current..].chars().nth(1).unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn advance(&mut self) -> char {
        let res = self.current_char();
        self.current += res.len_utf8();
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.current_char() != c {
            false
        } else {
            self.current += c.len_utf8();
            true
        }
    }

    fn error(&self, msg: &str) -> SiltError {
        SiltError::ScannerError {
            line: self.line,
            msg: String::from(msg),
        }
    }
}
