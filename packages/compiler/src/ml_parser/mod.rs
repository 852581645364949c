//! ML (Markup Language) Parser Module
//!
//! Template tokenizer, token cursor and the HTML-like markup parser

pub mod cursor;
pub mod filter;
pub mod lexer;
pub mod parser;
pub mod tags;
pub mod tokens;

pub use cursor::TokenCursor;
pub use filter::{FilterAction, FilterEnv, TokenFilter};
pub use lexer::{CharSource, ReaderSource, StrSource, TemplateTokenizer};
pub use parser::{CodeBlock, CodeParser, FragmentParser, Grammar, MarkupParser};
pub use tags::{ComponentHandle, ComponentRegistry, NoComponents, TagResolver};
pub use tokens::{OwnedToken, Token, TokenSequence, TokenType};
