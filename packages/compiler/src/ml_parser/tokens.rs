//! ML Parser Tokens
//!
//! Character-class runs produced by the template tokenizer

use crate::error::{CompilerError, Result};
use crate::parse_util::ParseLocation;
use serde::{Deserialize, Serialize};

/// Classification of a run of characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TokenType {
    Whitespace,
    Symbols,
    Text,
    /// Synthetic token produced once after the last character
    End,
}

/// Borrowed view of one token.
///
/// The content borrows from the sequence that produced it, so a token can
/// not be held across a call that advances or splits that sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub content: &'a str,
    pub location: ParseLocation,
}

impl<'a> Token<'a> {
    pub fn is_end(&self) -> bool {
        self.token_type == TokenType::End
    }

    pub fn is_whitespace(&self) -> bool {
        self.token_type == TokenType::Whitespace
    }

    pub fn is_symbols(&self) -> bool {
        self.token_type == TokenType::Symbols
    }

    pub fn is_text(&self) -> bool {
        self.token_type == TokenType::Text
    }

    /// Symbols token whose content begins with `ch`
    pub fn starts_with_symbol(&self, ch: char) -> bool {
        self.is_symbols() && self.content.starts_with(ch)
    }

    pub fn to_owned_token(&self) -> OwnedToken {
        OwnedToken {
            token_type: self.token_type,
            content: self.content.to_string(),
            location: self.location,
        }
    }
}

/// Owned copy of a token kept in a lookahead buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedToken {
    pub token_type: TokenType,
    pub content: String,
    pub location: ParseLocation,
}

impl OwnedToken {
    pub fn as_token(&self) -> Token<'_> {
        Token {
            token_type: self.token_type,
            content: &self.content,
            location: self.location,
        }
    }
}

/// Forward-only sequence of tokens
pub trait TokenSequence {
    fn current(&self) -> Token<'_>;

    /// Step to the next token, returning false when there is none
    fn advance(&mut self) -> bool;

    /// Advance where the caller knows a next token exists
    fn ensure_advance(&mut self) -> Result<()> {
        if self.advance() {
            Ok(())
        } else {
            Err(CompilerError::internal(format!(
                "cannot advance past {:?} token at {}",
                self.current().token_type,
                self.current().location
            )))
        }
    }
}
