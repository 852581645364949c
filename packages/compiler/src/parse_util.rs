//! Parse Utilities
//!
//! Source positions carried by tokens and template errors

use crate::chars;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based position in the template source.
///
/// `offset` counts characters, not bytes, so it stays meaningful for
/// templates read incrementally from a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseLocation {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseLocation {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        ParseLocation { offset, line, col }
    }

    /// Step over one character
    pub fn advance(&mut self, ch: char) {
        self.offset += 1;
        if ch == chars::LF {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
    }

    /// Location reached after reading `text` from here
    pub fn move_by(&self, text: &str) -> ParseLocation {
        let mut location = *self;
        for ch in text.chars() {
            location.advance(ch);
        }
        location
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}
