//! Token Cursor
//!
//! Peekable and splittable view over the template tokenizer, shared by the
//! markup parser and the Lua lexer.

use super::lexer::TemplateTokenizer;
use super::tokens::{OwnedToken, Token, TokenSequence};
use crate::error::{CompilerError, Result};
use crate::parse_util::ParseLocation;
use std::collections::VecDeque;
use std::io;
use tracing::trace;

/// Lookahead over a [`TemplateTokenizer`].
///
/// Tokens that have been peeked are copied into `buffer`, which holds every
/// token from the current position up to (but excluding) the tokenizer's own
/// current token. Index 0 is always the current token.
///
/// A peek limit fences the sequence: only the first `limit` positions are
/// visible, and `advance` refuses to step off the last visible one.
pub struct TokenCursor<'src> {
    tokenizer: TemplateTokenizer<'src>,
    tokenizer_eos: bool,
    buffer: VecDeque<OwnedToken>,
    peek_limit: Option<usize>,
}

impl<'src> TokenCursor<'src> {
    pub fn new(tokenizer: TemplateTokenizer<'src>) -> Self {
        TokenCursor {
            tokenizer,
            tokenizer_eos: false,
            buffer: VecDeque::new(),
            peek_limit: None,
        }
    }

    pub fn for_str(source: &'src str) -> Self {
        TokenCursor::new(TemplateTokenizer::for_str(source))
    }

    pub fn at_end(&self) -> bool {
        self.current().is_end()
    }

    pub fn location(&self) -> ParseLocation {
        self.current().location
    }

    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.tokenizer.take_io_error()
    }

    /// Token `pos` positions ahead of the current one, or `None` beyond the
    /// end of input or beyond an active peek limit
    pub fn try_peek(&mut self, pos: usize) -> Option<Token<'_>> {
        if let Some(limit) = self.peek_limit {
            if pos >= limit {
                return None;
            }
        }
        while pos > self.buffer.len() && self.move_next_to_buffer() {}

        if pos < self.buffer.len() {
            Some(self.buffer[pos].as_token())
        } else if pos == self.buffer.len() && !self.tokenizer_eos {
            Some(self.tokenizer.current())
        } else {
            None
        }
    }

    /// Split the token at `peek` into `[..offset]` and `[offset..]`.
    ///
    /// An offset of zero, or one equal to the token length, leaves the
    /// sequence unchanged. Otherwise an active peek limit grows by one so the
    /// same text stays visible.
    pub fn split(&mut self, peek: usize, offset: usize) -> Result<()> {
        if let Some(limit) = self.peek_limit {
            if peek >= limit {
                return Err(CompilerError::internal(format!(
                    "split at position {} beyond peek limit {}",
                    peek, limit
                )));
            }
        }
        if self.buffer.len() < peek {
            return Err(CompilerError::internal(format!(
                "split at position {} before it was peeked",
                peek
            )));
        }
        if self.buffer.len() == peek {
            if self.tokenizer_eos {
                return Err(CompilerError::internal("split past end of input"));
            }
            self.move_next_to_buffer();
        }
        if offset == 0 {
            return Ok(());
        }

        let token = &mut self.buffer[peek];
        if offset > token.content.len() || !token.content.is_char_boundary(offset) {
            return Err(CompilerError::internal(format!(
                "split offset {} out of range for {:?}",
                offset, token.content
            )));
        }
        if offset == token.content.len() {
            return Ok(());
        }

        let rest = token.content.split_off(offset);
        let second = OwnedToken {
            token_type: token.token_type,
            location: token.location.move_by(&token.content),
            content: rest,
        };
        trace!(
            "Split {:?} | {:?} at position {}",
            token.content,
            second.content,
            peek
        );
        self.buffer.insert(peek + 1, second);
        if let Some(limit) = self.peek_limit.as_mut() {
            *limit += 1;
        }
        Ok(())
    }

    /// Split the current token
    pub fn split_current(&mut self, offset: usize) -> Result<()> {
        self.split(0, offset)
    }

    pub fn set_peek_limit(&mut self, count: usize) -> Result<()> {
        if self.peek_limit.is_some() {
            return Err(CompilerError::internal("peek limit is already set"));
        }
        if count < 1 {
            return Err(CompilerError::internal("peek limit must be at least one"));
        }
        self.peek_limit = Some(count);
        Ok(())
    }

    pub fn clear_peek_limit(&mut self) -> Result<()> {
        if self.peek_limit.take().is_none() {
            return Err(CompilerError::internal("no peek limit to clear"));
        }
        Ok(())
    }

    pub fn has_peek_limit(&self) -> bool {
        self.peek_limit.is_some()
    }

    fn move_next_to_buffer(&mut self) -> bool {
        if self.tokenizer_eos {
            return false;
        }
        self.buffer.push_back(self.tokenizer.current().to_owned_token());
        self.tokenizer_eos = !self.tokenizer.advance();
        !self.tokenizer_eos
    }
}

impl<'src> TokenSequence for TokenCursor<'src> {
    fn current(&self) -> Token<'_> {
        match self.buffer.front() {
            Some(token) => token.as_token(),
            None => self.tokenizer.current(),
        }
    }

    fn advance(&mut self) -> bool {
        if self.peek_limit == Some(1) || self.current().is_end() {
            return false;
        }
        let moved = if self.buffer.pop_front().is_some() {
            true
        } else {
            !self.tokenizer_eos && self.tokenizer.advance()
        };
        if moved {
            if let Some(limit) = self.peek_limit.as_mut() {
                *limit -= 1;
            }
        }
        moved
    }
}
