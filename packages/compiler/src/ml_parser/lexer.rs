//! ML Parser Lexer
//!
//! Splits the template character stream into runs of whitespace, symbols
//! and other text. The markup parser and the Lua lexer both work on these
//! runs, splitting them further where they need finer positions.

use super::tokens::{Token, TokenSequence, TokenType};
use crate::chars;
use crate::parse_util::ParseLocation;
use once_cell::sync::Lazy;
use std::io::{self, BufRead};
use std::str::Chars;
use tracing::trace;

/// Pull-based source of template characters
pub trait CharSource {
    /// Next character, `Ok(None)` at end of input
    fn next_char(&mut self) -> io::Result<Option<char>>;
}

/// Characters of an in-memory template
pub struct StrSource<'a> {
    chars: Chars<'a>,
}

impl<'a> StrSource<'a> {
    pub fn new(source: &'a str) -> Self {
        StrSource {
            chars: source.chars(),
        }
    }
}

impl<'a> CharSource for StrSource<'a> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        Ok(self.chars.next())
    }
}

/// Characters decoded line by line from a buffered reader
pub struct ReaderSource<R> {
    reader: R,
    line: String,
    pos: usize,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            line: String::new(),
            pos: 0,
        }
    }
}

impl<R: BufRead> CharSource for ReaderSource<R> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.pos >= self.line.len() {
            self.line.clear();
            self.pos = 0;
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
        }
        let ch = self.line[self.pos..].chars().next();
        if let Some(ch) = ch {
            self.pos += ch.len_utf8();
        }
        Ok(ch)
    }
}

static ASCII_CLASSES: Lazy<[TokenType; 128]> = Lazy::new(|| {
    let mut classes = [TokenType::Text; 128];
    for (code, class) in classes.iter_mut().enumerate() {
        let ch = code as u8 as char;
        *class = if ch.is_ascii_whitespace() || ch == chars::VTAB || ch.is_ascii_control() {
            TokenType::Whitespace
        } else if ch.is_ascii_punctuation() && ch != chars::UNDERSCORE {
            TokenType::Symbols
        } else {
            TokenType::Text
        };
    }
    classes
});

/// Character class used to group runs. Anything outside ASCII is text.
pub fn classify(ch: char) -> TokenType {
    if ch.is_ascii() {
        ASCII_CLASSES[ch as usize]
    } else {
        TokenType::Text
    }
}

/// Groups characters into maximal runs of one class.
///
/// The first token is produced on construction; after the last run one
/// `End` token is produced and `advance` returns false from then on.
pub struct TemplateTokenizer<'src> {
    source: Box<dyn CharSource + 'src>,
    lookahead: Option<char>,
    buffer: String,
    token_type: TokenType,
    location: ParseLocation,
    next_location: ParseLocation,
    io_error: Option<io::Error>,
}

impl<'src> TemplateTokenizer<'src> {
    pub fn new(source: impl CharSource + 'src) -> Self {
        let mut tokenizer = TemplateTokenizer {
            source: Box::new(source),
            lookahead: None,
            buffer: String::new(),
            token_type: TokenType::Whitespace,
            location: ParseLocation::default(),
            next_location: ParseLocation::default(),
            io_error: None,
        };
        tokenizer.lookahead = tokenizer.read();
        tokenizer.advance();
        tokenizer
    }

    pub fn for_str(source: &'src str) -> Self {
        TemplateTokenizer::new(StrSource::new(source))
    }

    /// Read error that cut the input short, if any
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    fn read(&mut self) -> Option<char> {
        if self.io_error.is_some() {
            return None;
        }
        match self.source.next_char() {
            Ok(ch) => ch,
            Err(err) => {
                self.io_error = Some(err);
                None
            }
        }
    }
}

impl<'src> TokenSequence for TemplateTokenizer<'src> {
    fn current(&self) -> Token<'_> {
        Token {
            token_type: self.token_type,
            content: &self.buffer,
            location: self.location,
        }
    }

    fn advance(&mut self) -> bool {
        self.buffer.clear();
        self.location = self.next_location;

        let Some(first) = self.lookahead else {
            if self.token_type == TokenType::End {
                return false;
            }
            self.token_type = TokenType::End;
            trace!("Template token End at {}", self.location);
            return true;
        };

        let class = classify(first);
        let mut ch = Some(first);
        while let Some(c) = ch {
            if classify(c) != class {
                break;
            }
            self.buffer.push(c);
            self.next_location.advance(c);
            ch = self.read();
        }
        self.lookahead = ch;
        self.token_type = class;
        trace!(
            "Template token {:?} at {}: {:?}",
            self.token_type,
            self.location,
            self.buffer
        );
        true
    }
}
