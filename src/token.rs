//! Lexical vocabulary of Void.
//!
//! A [`Token`] pairs a payload‑free [`TokenType`] with its source text and
//! line.  Number and string tokens additionally carry a [`Literal`] holding
//! the decoded value, so the kind itself stays `Copy` and compares by plain
//! equality.

use std::fmt;

use log::debug;
use phf::phf_map;
use serde::Serialize;

/// Reserved words.  Every other word is an `IDENTIFIER`.
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "if"     => TokenType::IF,
    "null"   => TokenType::NULL,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
};

/// Kind of a scanned token.  The `Debug` form of each variant is the name
/// printed by `void tokenize`.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    // Punctuation: ( ) { } , ;
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    SEMICOLON,

    // Arithmetic: - + / *
    MINUS,
    PLUS,
    SLASH,
    STAR,

    // Negation, assignment and comparison, each optionally followed by '='.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    /// `[A-Za-z_][A-Za-z0-9_]*` that is not a keyword.
    IDENTIFIER,

    /// `"..."`; the contents are in [`Token::literal`].
    STRING,

    /// `123` or `1.5`; the value is in [`Token::literal`].
    NUMBER,

    ELSE,
    FALSE,
    FUN,
    IF,
    NULL,
    PRINT,
    RETURN,
    TRUE,
    VAR,

    EOF,
}

impl TokenType {
    /// Looks `word` up in the keyword table.
    pub fn keyword(word: &str) -> Option<TokenType> {
        KEYWORDS.get(word).copied()
    }

    /// Tokens allowed as arguments of a call statement: a name or a literal.
    pub fn is_atom(self) -> bool {
        matches!(
            self,
            TokenType::IDENTIFIER
                | TokenType::NUMBER
                | TokenType::STRING
                | TokenType::TRUE
                | TokenType::FALSE
                | TokenType::NULL
        )
    }
}

/// Decoded value of a number or string token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl fmt::Display for Literal {
    /// Integral numbers keep a trailing `.0` so `tokenize` output shows that
    /// every Void number is a float.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }

            Literal::Number(n) => write!(f, "{}", n),

            Literal::Str(s) => f.write_str(s),
        }
    }
}

/// A scanned token.
///
/// The lexeme is owned so AST nodes built from tokens outlive the source
/// buffer; function bodies are kept alive by closures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub token_type: TokenType,

    /// Exact source text, quotes included for strings.
    pub lexeme: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<Literal>,

    /// 1‑based.
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            literal: None,
            line,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }
}

impl fmt::Display for Token {
    /// `TYPE lexeme literal`, with `null` standing in for a missing literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} ", self.token_type, self.lexeme)?;

        match &self.literal {
            Some(literal) => write!(f, "{}", literal),
            None => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(TokenType::keyword("fun"), Some(TokenType::FUN));
        assert_eq!(TokenType::keyword("null"), Some(TokenType::NULL));
        assert_eq!(TokenType::keyword("Fun"), None);
        assert_eq!(TokenType::keyword("class"), None);
    }

    #[test]
    fn display_shows_kind_lexeme_and_literal() {
        let number = Token::new(TokenType::NUMBER, "7", 1).with_literal(Literal::Number(7.0));
        assert_eq!(number.to_string(), "NUMBER 7 7.0");

        let comma = Token::new(TokenType::COMMA, ",", 1);
        assert_eq!(comma.to_string(), "COMMA , null");
    }
}
