//! Sigil filter
//!
//! `@` switches from markup to Lua. `@@` is a literal `@`. `@` directly
//! followed by a block keyword starts a statement (or, for `code`, the
//! declarations section); anything else starts an inline expression.

use crate::chars;
use crate::error::Result;
use crate::ml_parser::cursor::TokenCursor;
use crate::ml_parser::filter::{FilterAction, FilterEnv, TokenFilter};
use crate::ml_parser::tokens::TokenSequence;
use tracing::trace;

/// Words that turn `@word` into a code block instead of an expression
const BLOCK_KEYWORDS: &[&str] = &[
    "code", "do", "end", "for", "function", "if", "local", "while", "repeat",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LuaTokenFilter;

impl TokenFilter for LuaTokenFilter {
    fn filter(&self, env: FilterEnv, input: &mut TokenCursor<'_>) -> Result<FilterAction> {
        let token = input.current();
        if !token.is_symbols() {
            return Ok(FilterAction::None);
        }
        let Some(at) = token.content.find(chars::AT) else {
            return Ok(FilterAction::None);
        };
        if at > 0 {
            // markup before the sigil is handled on its own
            input.split_current(at)?;
            return Ok(FilterAction::None);
        }

        let len = token.content.len();
        if token.content[1..].starts_with(chars::AT) {
            trace!("Escaped sigil at {}", token.location);
            input.split_current(1)?;
            input.ensure_advance()?;
            input.split_current(1)?;
            return Ok(FilterAction::None);
        }

        if len == 1 {
            let is_block = matches!(
                input.try_peek(1),
                Some(next) if next.is_text() && BLOCK_KEYWORDS.contains(&next.content)
            );
            if is_block {
                input.ensure_advance()?;
                trace!("Code block in {:?}", env);
                return Ok(FilterAction::BeginBlock);
            }
        }

        input.split_current(1)?;
        input.ensure_advance()?;
        trace!("Inline expression in {:?}", env);
        Ok(FilterAction::BeginExpression)
    }
}
