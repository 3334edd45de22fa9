//! Tokenizer for unit strings.
//!
//! Identifiers are kept whole here. Splitting a run such as `Msunkpc` into
//! registered symbols needs the registry, so it happens in the parser.
//!
//! ```
//! # use codeunits::lexer::{lex, Token};
//! let tokens = lex("g/cm**3").unwrap();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::Ident("g".into()),
//!         Token::Slash,
//!         Token::Ident("cm".into()),
//!         Token::Caret,
//!         Token::Integer(3),
//!     ]
//! );
//! ```

use logos::Logos;

use crate::error::{Result, UnitError};

/// Unit string token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// Exponent operator, either `^` or `**`.
    #[token("**")]
    #[token("^")]
    Caret,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("-")]
    Minus,

    #[token("+")]
    Plus,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    /// A run of symbol characters, possibly several concatenated symbols.
    #[regex(r"[A-Za-z_μµ][A-Za-z_μµ]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Tokenize a unit string.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(UnitError::malformed(
                    source,
                    format!(
                        "unexpected '{}' at offset {}",
                        lexer.slice(),
                        lexer.span().start
                    ),
                ))
            }
        }
    }
    Ok(tokens)
}
