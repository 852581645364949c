//! Expression Parser Module
//!
//! Embedded Lua: lexer, recursive-descent parser, the code-parser entry
//! points called from markup, and the `@` sigil filter.

pub mod code_parser;
pub mod lexer;
pub mod parser;
pub mod token_filter;

pub use code_parser::LuaCodeParser;
pub use lexer::{LuaLexer, LuaToken};
pub use parser::{ExpressionMode, LuaParser};
pub use token_filter::LuaTokenFilter;
