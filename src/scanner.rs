//! Streaming lexer for Void source text.
//!
//! [`Scanner`] walks a byte slice and yields one `Result<Token>` per lexeme,
//! followed by exactly one `EOF` token, after which it is fused.  A lex error
//! is yielded in place of the offending lexeme and scanning resumes after it,
//! so a caller can report every bad character in one pass.
//!
//! # Lexical grammar
//!
//! | Lexeme          | Shape                                  | Token                     |
//! |-----------------|----------------------------------------|---------------------------|
//! | punctuation     | `( ) { } , ;`                          | one kind per byte         |
//! | arithmetic      | `+ - * /`                              | `PLUS` … `SLASH`          |
//! | `!` `=` `<` `>` | optionally followed by `=`             | `BANG`, `BANG_EQUAL`, …   |
//! | comment         | `//` up to the end of the line         | none                      |
//! | whitespace      | space, tab, `\r`, `\n`                 | none (`\n` counts a line) |
//! | string          | `"` any bytes but `"` `"`, no escapes  | `STRING` + `Literal::Str` |
//! | number          | `[0-9]+ ( "." [0-9]+ )?`               | `NUMBER` + `Literal::Number` |
//! | word            | `[A-Za-z_][A-Za-z0-9_]*`               | keyword or `IDENTIFIER`   |
//!
//! A string may span lines; its token reports the line it ends on.  A
//! leading `-` is never part of a number, and `1.` scans as `1` then an
//! unexpected `.`.
//!
//! ```rust
//! use void_interpreter::scanner::Scanner;
//! use void_interpreter::token::TokenType;
//!
//! let kinds: Vec<TokenType> = Scanner::new(b"print 1; // done")
//!     .map(|t| t.map(|t| t.token_type))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(
//!     kinds,
//!     [TokenType::PRINT, TokenType::NUMBER, TokenType::SEMICOLON, TokenType::EOF]
//! );
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;

use crate::error::{Result, VoidError};
use crate::token::{Literal, Token, TokenType};

pub struct Scanner<'a> {
    src: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to examine.
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Source text between two offsets.  Every boundary the scanner picks is
    /// an ASCII byte, so this never splits a UTF‑8 sequence.
    fn text(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.src[from..to]).into_owned()
    }

    /// Consumes whitespace and `//` comments, counting newlines.
    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' => self.pos += 1,

                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }

                b'/' if self.peek_next() == Some(b'/') => {
                    // Stop on the newline so the arm above counts it.
                    self.pos = match memchr(b'\n', &self.src[self.pos..]) {
                        Some(offset) => self.pos + offset,
                        None => self.src.len(),
                    };
                }

                _ => return,
            }
        }
    }

    fn token(&self, token_type: TokenType) -> Token {
        Token::new(token_type, self.text(self.start, self.pos), self.line)
    }

    /// `single`, or `double` when the next byte is `=`.
    fn with_equals(&mut self, single: TokenType, double: TokenType) -> Token {
        let token_type = if self.eat(b'=') { double } else { single };
        self.token(token_type)
    }

    /// Scans one lexeme.  Trivia has already been skipped and at least one
    /// byte remains.
    fn lex(&mut self) -> Result<Token> {
        self.start = self.pos;

        let Some(b) = self.bump() else {
            return Ok(self.token(TokenType::EOF));
        };

        let token = match b {
            b'(' => self.token(TokenType::LEFT_PAREN),
            b')' => self.token(TokenType::RIGHT_PAREN),
            b'{' => self.token(TokenType::LEFT_BRACE),
            b'}' => self.token(TokenType::RIGHT_BRACE),
            b',' => self.token(TokenType::COMMA),
            b';' => self.token(TokenType::SEMICOLON),
            b'-' => self.token(TokenType::MINUS),
            b'+' => self.token(TokenType::PLUS),
            b'*' => self.token(TokenType::STAR),
            b'/' => self.token(TokenType::SLASH),

            b'!' => self.with_equals(TokenType::BANG, TokenType::BANG_EQUAL),
            b'=' => self.with_equals(TokenType::EQUAL, TokenType::EQUAL_EQUAL),
            b'<' => self.with_equals(TokenType::LESS, TokenType::LESS_EQUAL),
            b'>' => self.with_equals(TokenType::GREATER, TokenType::GREATER_EQUAL),

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.word(),

            _ => {
                // Skip the rest of a multi-byte character so the next lexeme
                // starts on a boundary.
                self.eat_while(|b| (0x80..0xC0).contains(&b));

                return Err(VoidError::lex(
                    self.line,
                    format!(
                        "Unexpected character: {}",
                        self.text(self.start, self.pos)
                    ),
                ));
            }
        };

        debug!("Scanned {:?} on line {}", token.token_type, token.line);

        Ok(token)
    }

    fn string(&mut self) -> Result<Token> {
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\n') => self.line += 1,
                Some(_) => {}
                None => return Err(VoidError::lex(self.line, "Unterminated string.")),
            }
        }

        let contents = self.text(self.start + 1, self.pos - 1);

        Ok(self.token(TokenType::STRING).with_literal(Literal::Str(contents)))
    }

    fn number(&mut self) -> Token {
        self.eat_while(|b| b.is_ascii_digit());

        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }

        // Digits with at most one interior '.', which always parses.
        let value: f64 = self.text(self.start, self.pos).parse().unwrap_or_default();

        self.token(TokenType::NUMBER).with_literal(Literal::Number(value))
    }

    fn word(&mut self) -> Token {
        self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');

        let word = self.text(self.start, self.pos);
        let token_type = TokenType::keyword(&word).unwrap_or(TokenType::IDENTIFIER);

        Token::new(token_type, word, self.line)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.skip_trivia();

        if self.pos >= self.src.len() {
            self.done = true;
            self.start = self.pos;
            return Some(Ok(self.token(TokenType::EOF)));
        }

        Some(self.lex())
    }
}

impl FusedIterator for Scanner<'_> {}
