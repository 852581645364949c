/*
 * Character Codes
 *
 * Characters the markup and Lua scanners switch on
 */

//! Character constants used throughout the compiler

// Whitespace
pub const TAB: char = '\t';
pub const LF: char = '\n'; // Line feed
pub const VTAB: char = '\x0B';
pub const FF: char = '\x0C';
pub const CR: char = '\r'; // Carriage return
pub const SPACE: char = ' ';

// Punctuation
pub const DQ: char = '"';
pub const SQ: char = '\'';
pub const MINUS: char = '-';
pub const PERIOD: char = '.';
pub const SLASH: char = '/';
pub const COLON: char = ':';
pub const LT: char = '<';
pub const EQ: char = '=';
pub const GT: char = '>';
pub const AT: char = '@';
pub const UNDERSCORE: char = '_';
pub const TILDA: char = '~';

// Brackets
pub const LBRACKET: char = '[';
pub const BACKSLASH: char = '\\';
pub const RBRACKET: char = ']';

/// Whitespace as the Lua scanner sees it
pub fn is_lua_whitespace(code: char) -> bool {
    matches!(code, SPACE | TAB | LF | CR | VTAB | FF)
}

pub fn is_digit(code: char) -> bool {
    code.is_ascii_digit()
}

pub fn is_new_line(code: char) -> bool {
    code == LF || code == CR
}

/// Lua exponent markers: `e`/`E` for decimal numerals, `p`/`P` after a `0x` prefix
pub fn is_exponent_start(code: char, hex: bool) -> bool {
    if hex {
        code == 'p' || code == 'P'
    } else {
        code == 'e' || code == 'E'
    }
}

pub fn is_exponent_sign(code: char) -> bool {
    code == '-' || code == '+'
}
