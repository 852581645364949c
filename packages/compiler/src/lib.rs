//! Lua Markup Compiler
//!
//! Compiles templates that mix HTML-like markup with embedded Lua into a Lua
//! chunk driving a tree-builder API.
//!
//! ```ignore
//! let lua = lua_markup_compiler::compile("<p>Hello @name</p>")?;
//! ```

#![deny(clippy::all)]

// Core modules
pub mod chars;
pub mod compiler;
pub mod config;
pub mod error;
pub mod parse_util;

// Parser modules
pub mod expression_parser;
pub mod ml_parser;

// Code generation
pub mod output;

// Re-exports
pub use compiler::{compile, CodeObserver, Compiler};
pub use config::CompileOptions;
pub use error::{CompilerError, ErrorCategory, ErrorKind, Result};
pub use ml_parser::{ComponentHandle, ComponentRegistry, NoComponents, TagResolver};
pub use output::{CodeGenerator, ParsedExpression, ParsedFragment};
pub use parse_util::ParseLocation;
