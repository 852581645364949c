//! Expression Parser Lexer
//!
//! Lua lexer reading straight from the shared template cursor.
//!
//! The lexer looks at the cursor through a window that starts at the
//! cursor's current token. Scanning a Lua token only peeks; nothing is taken
//! from the cursor until the parser accepts the token with [`LuaLexer::advance`],
//! which copies the token's text (and the whitespace before it) into the
//! output buffer and splits/advances the cursor past it. Comments are
//! dropped instead of copied. The token after the last accepted one is left
//! in the cursor, so the markup parser resumes exactly where the code ended.

use crate::chars;
use crate::error::{CompilerError, Result};
use crate::ml_parser::cursor::TokenCursor;
use crate::ml_parser::tokens::{TokenSequence, TokenType};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuaToken {
    /// Single-character token
    Char(char),
    And,
    Break,
    Do,
    Else,
    Elseif,
    End,
    False,
    For,
    Function,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
    /// `..`
    Concat,
    /// `...`
    Dots,
    /// `==`
    Eq,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `~=`
    Ne,
    /// `::`
    DbColon,
    Number,
    Name,
    String,
    Eos,
}

static KEYWORDS: Lazy<HashMap<&'static str, LuaToken>> = Lazy::new(|| {
    HashMap::from([
        ("and", LuaToken::And),
        ("break", LuaToken::Break),
        ("do", LuaToken::Do),
        ("else", LuaToken::Else),
        ("elseif", LuaToken::Elseif),
        ("end", LuaToken::End),
        ("false", LuaToken::False),
        ("for", LuaToken::For),
        ("function", LuaToken::Function),
        ("goto", LuaToken::Goto),
        ("if", LuaToken::If),
        ("in", LuaToken::In),
        ("local", LuaToken::Local),
        ("nil", LuaToken::Nil),
        ("not", LuaToken::Not),
        ("or", LuaToken::Or),
        ("repeat", LuaToken::Repeat),
        ("return", LuaToken::Return),
        ("then", LuaToken::Then),
        ("true", LuaToken::True),
        ("until", LuaToken::Until),
        ("while", LuaToken::While),
    ])
});

impl LuaToken {
    pub fn keyword(name: &str) -> Option<LuaToken> {
        KEYWORDS.get(name).copied()
    }

    pub fn is_char(&self, ch: char) -> bool {
        *self == LuaToken::Char(ch)
    }
}

impl fmt::Display for LuaToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LuaToken::Char(ch) => return write!(f, "'{}'", ch),
            LuaToken::Concat => "'..'",
            LuaToken::Dots => "'...'",
            LuaToken::Eq => "'=='",
            LuaToken::Ge => "'>='",
            LuaToken::Le => "'<='",
            LuaToken::Ne => "'~='",
            LuaToken::DbColon => "'::'",
            LuaToken::Number => "<number>",
            LuaToken::Name => "<name>",
            LuaToken::String => "<string>",
            LuaToken::Eos => "<eof>",
            keyword => {
                let name = KEYWORDS
                    .iter()
                    .find(|(_, token)| *token == keyword)
                    .map(|(name, _)| *name)
                    .unwrap_or("?");
                return write!(f, "'{}'", name);
            }
        };
        f.write_str(text)
    }
}

/// Lua lexer state.
///
/// Window offsets are byte offsets from the start of the cursor's current
/// token:
/// `[0, peek_begin)` is dropped comment text, `[peek_begin, token_start)`
/// whitespace, `[token_start, peek_end)` the token itself.
#[derive(Debug, Default)]
pub struct LuaLexer {
    current: Option<LuaToken>,
    name: String,
    peek_begin: usize,
    token_start: usize,
    peek_end: usize,
    scan_index: usize,
    scan_byte: usize,
    ch: Option<char>,
    ch_type: Option<TokenType>,
    fence_reached: bool,
    output: String,
}

impl LuaLexer {
    /// Lexer positioned at the cursor's current token
    pub fn new(input: &mut TokenCursor<'_>) -> Self {
        let mut lexer = LuaLexer::default();
        lexer.reset(input);
        lexer
    }

    /// Restart at the cursor's current token after the cursor was moved by
    /// someone else. Pending output is kept.
    pub fn reset(&mut self, input: &mut TokenCursor<'_>) {
        self.current = None;
        self.fence_reached = false;
        self.restart_window(input);
    }

    /// Current token, scanning it on first use
    pub fn current(&mut self, input: &mut TokenCursor<'_>) -> Result<LuaToken> {
        if let Some(token) = self.current {
            return Ok(token);
        }
        let token = self.scan(input)?;
        trace!("Lua token {} at {}", token, input.location());
        self.current = Some(token);
        Ok(token)
    }

    /// Text of the current `Name` token
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw character `ahead` positions into the input that follows the last
    /// accepted token. `None` once the next token has been scanned.
    pub fn unscanned_char(&self, input: &mut TokenCursor<'_>, ahead: usize) -> Option<char> {
        if self.current.is_some() {
            return None;
        }
        self.peek_char(input, ahead)
    }

    /// Raw character right after the current token
    pub fn following_char(&self) -> Option<char> {
        self.ch
    }

    /// Whether whitespace or comments precede the next token without having
    /// been accepted yet
    pub fn has_pending_text(&self) -> bool {
        self.peek_end > 0
    }

    /// Accept the current token: copy it to the output and move the cursor
    /// past it. The next token is scanned lazily.
    pub fn advance(&mut self, input: &mut TokenCursor<'_>) -> Result<()> {
        if self.fence_reached || (self.current(input)? == LuaToken::Eos && self.peek_end == 0) {
            return Err(CompilerError::internal("advanced past end of embedded code"));
        }
        let (skip, keep) = (self.peek_begin, self.peek_end - self.peek_begin);
        if self.consume(input, skip, false)? && self.consume(input, keep, true)? {
            self.current = None;
            self.restart_window(input);
        } else {
            self.fence_reached = true;
            self.current = Some(LuaToken::Eos);
        }
        Ok(())
    }

    /// Drop comments and copy whitespace before the current token, leaving
    /// the cursor exactly on it. The lexer must be [`reset`](Self::reset)
    /// before it is used again.
    pub fn detach(&mut self, input: &mut TokenCursor<'_>) -> Result<()> {
        self.current(input)?;
        let (skip, keep) = (self.peek_begin, self.token_start - self.peek_begin);
        if !(self.consume(input, skip, false)? && self.consume(input, keep, true)?) {
            return Err(CompilerError::internal("detached at end of fenced input"));
        }
        self.current = None;
        Ok(())
    }

    /// Accepted text since the last call
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// True once the last token before a peek fence was fully accepted. The
    /// cursor still sits on that token, because it can not step onto the
    /// fence.
    pub fn fence_reached(&self) -> bool {
        self.fence_reached
    }

    fn restart_window(&mut self, input: &mut TokenCursor<'_>) {
        self.peek_begin = 0;
        self.token_start = 0;
        self.peek_end = 0;
        self.scan_index = 0;
        self.scan_byte = 0;
        self.load_char(input);
    }

    /// Take `len` bytes from the cursor. Returns false if the fence stopped
    /// the cursor after the last of them.
    fn consume(&mut self, input: &mut TokenCursor<'_>, mut len: usize, copy: bool) -> Result<bool> {
        while len > 0 {
            let token = input.current();
            let available = token.content.len();
            if available == 0 {
                return Err(CompilerError::internal("consumed past end of input"));
            }
            let take = len.min(available);
            if copy {
                self.output.push_str(&token.content[..take]);
            }
            if len < available {
                input.split_current(len)?;
                input.ensure_advance()?;
                return Ok(true);
            }
            len -= available;
            if !input.advance() {
                if len > 0 {
                    return Err(CompilerError::internal("consumed past peek limit"));
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn load_char(&mut self, input: &mut TokenCursor<'_>) {
        loop {
            let Some(token) = input.try_peek(self.scan_index) else {
                break;
            };
            if token.is_end() {
                break;
            }
            if let Some(ch) = token.content.get(self.scan_byte..).and_then(|s| s.chars().next()) {
                self.ch = Some(ch);
                self.ch_type = Some(token.token_type);
                return;
            }
            self.scan_byte -= token.content.len();
            self.scan_index += 1;
        }
        self.ch = None;
        self.ch_type = None;
    }

    fn next_char(&mut self, input: &mut TokenCursor<'_>) -> Option<char> {
        if let Some(ch) = self.ch {
            self.peek_end += ch.len_utf8();
            self.scan_byte += ch.len_utf8();
            self.load_char(input);
        }
        self.ch
    }

    /// Character `ahead` positions after the current one
    fn peek_char(&self, input: &mut TokenCursor<'_>, ahead: usize) -> Option<char> {
        let (mut index, mut byte) = (self.scan_index, self.scan_byte);
        let mut remaining = ahead;
        loop {
            let token = input.try_peek(index)?;
            if token.is_end() {
                return None;
            }
            match token.content.get(byte..).and_then(|s| s.chars().next()) {
                Some(ch) if remaining == 0 => return Some(ch),
                Some(ch) => {
                    remaining -= 1;
                    byte += ch.len_utf8();
                }
                None => {
                    byte -= token.content.len();
                    index += 1;
                }
            }
        }
    }

    fn scan(&mut self, input: &mut TokenCursor<'_>) -> Result<LuaToken> {
        if self.fence_reached {
            return Ok(LuaToken::Eos);
        }
        loop {
            self.token_start = self.peek_end;
            let Some(ch) = self.ch else {
                return Ok(LuaToken::Eos);
            };
            match ch {
                _ if chars::is_lua_whitespace(ch) => {
                    self.next_char(input);
                }
                chars::MINUS => {
                    if self.next_char(input) != Some(chars::MINUS) {
                        return Ok(LuaToken::Char(chars::MINUS));
                    }
                    if self.next_char(input) == Some(chars::LBRACKET) {
                        let sep = self.skip_sep(input);
                        if sep >= 0 {
                            self.read_long_string(input, sep as usize, "comment")?;
                            self.peek_begin = self.peek_end;
                            continue;
                        }
                    }
                    while !matches!(self.ch, None | Some(chars::LF | chars::CR)) {
                        self.next_char(input);
                    }
                    self.peek_begin = self.peek_end;
                }
                chars::LBRACKET => {
                    let sep = self.skip_sep(input);
                    if sep >= 0 {
                        self.read_long_string(input, sep as usize, "string")?;
                        return Ok(LuaToken::String);
                    }
                    if sep != -1 {
                        return Err(CompilerError::grammar(
                            "long string delimiter",
                            "'='",
                            input.location(),
                        ));
                    }
                    return Ok(LuaToken::Char(chars::LBRACKET));
                }
                chars::EQ => return Ok(self.one_or_two(input, chars::EQ, LuaToken::Eq)),
                chars::LT => return Ok(self.one_or_two(input, chars::EQ, LuaToken::Le)),
                chars::GT => return Ok(self.one_or_two(input, chars::EQ, LuaToken::Ge)),
                chars::TILDA => return Ok(self.one_or_two(input, chars::EQ, LuaToken::Ne)),
                chars::COLON => {
                    return Ok(self.one_or_two(input, chars::COLON, LuaToken::DbColon))
                }
                chars::DQ | chars::SQ => {
                    self.read_string(input, ch)?;
                    return Ok(LuaToken::String);
                }
                chars::PERIOD => {
                    let next = self.next_char(input);
                    if next == Some(chars::PERIOD) {
                        if self.next_char(input) == Some(chars::PERIOD) {
                            self.next_char(input);
                            return Ok(LuaToken::Dots);
                        }
                        return Ok(LuaToken::Concat);
                    }
                    if matches!(next, Some(d) if chars::is_digit(d)) {
                        self.read_numeral(input, false);
                        return Ok(LuaToken::Number);
                    }
                    return Ok(LuaToken::Char(chars::PERIOD));
                }
                _ if chars::is_digit(ch) => {
                    self.next_char(input);
                    let hex = ch == '0' && matches!(self.ch, Some('x' | 'X'));
                    if hex {
                        self.next_char(input);
                    }
                    self.read_numeral(input, hex);
                    return Ok(LuaToken::Number);
                }
                _ if self.ch_type == Some(TokenType::Text) => {
                    self.name.clear();
                    while let (Some(c), Some(TokenType::Text)) = (self.ch, self.ch_type) {
                        self.name.push(c);
                        self.next_char(input);
                    }
                    return Ok(LuaToken::keyword(&self.name).unwrap_or(LuaToken::Name));
                }
                _ => {
                    self.next_char(input);
                    return Ok(LuaToken::Char(ch));
                }
            }
        }
    }

    /// `first` alone, or `paired` when followed by `second`
    fn one_or_two(&mut self, input: &mut TokenCursor<'_>, second: char, paired: LuaToken) -> LuaToken {
        let first = self.ch;
        if self.next_char(input) == Some(second) {
            self.next_char(input);
            return paired;
        }
        LuaToken::Char(first.unwrap_or_default())
    }

    /// Rest of a numeral after its first character (and `0x` prefix)
    fn read_numeral(&mut self, input: &mut TokenCursor<'_>, hex: bool) {
        while let Some(ch) = self.ch {
            if chars::is_exponent_start(ch, hex) {
                if matches!(self.next_char(input), Some(sign) if chars::is_exponent_sign(sign)) {
                    self.next_char(input);
                }
            } else if ch.is_ascii_hexdigit() || ch == chars::PERIOD {
                self.next_char(input);
            } else {
                break;
            }
        }
    }

    /// On `[` or `]`: skip the bracket and the run of `=` after it. Returns
    /// the number of `=` when the same bracket follows (left unconsumed),
    /// otherwise `-(count + 1)`.
    fn skip_sep(&mut self, input: &mut TokenCursor<'_>) -> i32 {
        let bracket = self.ch;
        self.next_char(input);
        let mut count = 0;
        while self.ch == Some(chars::EQ) {
            self.next_char(input);
            count += 1;
        }
        if self.ch == bracket {
            count
        } else {
            -count - 1
        }
    }

    /// On the second `[` of an opening long bracket of level `sep`
    fn read_long_string(
        &mut self,
        input: &mut TokenCursor<'_>,
        sep: usize,
        what: &str,
    ) -> Result<()> {
        self.next_char(input);
        loop {
            match self.ch {
                None => {
                    return Err(CompilerError::unexpected_end(
                        format!("long {}", what),
                        input.location(),
                    ))
                }
                Some(chars::RBRACKET) => {
                    if self.skip_sep(input) == sep as i32 {
                        self.next_char(input);
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.next_char(input);
                }
            }
        }
    }

    fn read_string(&mut self, input: &mut TokenCursor<'_>, quote: char) -> Result<()> {
        self.next_char(input);
        loop {
            match self.ch {
                None => return Err(CompilerError::unexpected_end("string literal", input.location())),
                Some(ch) if chars::is_new_line(ch) => {
                    return Err(CompilerError::grammar(
                        format!("closing {}", quote),
                        "end of line",
                        input.location(),
                    ))
                }
                Some(chars::BACKSLASH) => {
                    if self.next_char(input).is_some() {
                        self.next_char(input);
                    }
                }
                Some(ch) if ch == quote => {
                    self.next_char(input);
                    return Ok(());
                }
                Some(_) => {
                    self.next_char(input);
                }
            }
        }
    }
}
