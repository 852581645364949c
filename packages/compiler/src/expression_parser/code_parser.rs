//! Lua implementation of the code-parser contract used by the markup parser

use super::parser::{ExpressionMode, LuaParser};
use crate::error::{CompilerError, Result};
use crate::ml_parser::cursor::TokenCursor;
use crate::ml_parser::parser::{CodeBlock, CodeParser, Grammar};
use crate::ml_parser::tags::{ComponentHandle, TagResolver};
use crate::ml_parser::tokens::TokenSequence;
use crate::output::recorder::ParsedExpression;
use crate::chars;
use tracing::debug;

/// Keyword introducing the declarations section
pub const CODE_KEYWORD: &str = "code";

pub struct LuaCodeParser<'r> {
    resolver: &'r dyn TagResolver,
}

impl<'r> LuaCodeParser<'r> {
    pub fn new(resolver: &'r dyn TagResolver) -> Self {
        LuaCodeParser { resolver }
    }

    /// Parse an expression that has to end inside the current quoted
    /// attribute value. The closing quote is fenced off so the Lua lexer can
    /// not read past it.
    fn parse_fenced(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        mode: ExpressionMode,
    ) -> Result<ParsedExpression> {
        let location = input.location();
        if input.has_peek_limit() {
            return Err(CompilerError::unsupported(
                "attribute expression inside another attribute expression",
                location,
            ));
        }

        let (peek, offset) = find_attribute_end(input)?;
        if offset > 0 {
            input.split(peek, offset)?;
            input.set_peek_limit(peek + 1)?;
        } else if peek == 0 {
            return Err(CompilerError::invalid_attribute("empty expression", location));
        } else {
            input.set_peek_limit(peek)?;
        }

        let parsed = LuaParser::parse_expression(input, grammar, mode);
        input.clear_peek_limit()?;
        let (expr, fence_reached) = parsed?;
        if fence_reached {
            input.ensure_advance()?;
        }
        Ok(expr)
    }
}

impl CodeParser for LuaCodeParser<'_> {
    fn parse_code_block(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<CodeBlock> {
        let is_declarations = {
            let token = input.current();
            token.is_text() && token.content == CODE_KEYWORD
        };
        if is_declarations {
            debug!("@code section at {}", input.location());
            input.ensure_advance()?;
            return Ok(CodeBlock::Declarations(LuaParser::parse_declarations(
                input, grammar,
            )?));
        }
        Ok(CodeBlock::Statement(LuaParser::parse_statement(input, grammar)?))
    }

    fn parse_expression(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<ParsedExpression> {
        let (expr, _) = LuaParser::parse_expression(input, grammar, ExpressionMode::Implicit)?;
        Ok(expr)
    }

    fn parse_attribute_segment(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<ParsedExpression> {
        self.parse_fenced(input, grammar, ExpressionMode::Implicit)
    }

    fn parse_attribute_expression(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        _component: Option<&ComponentHandle>,
        attribute_name: &mut String,
    ) -> Result<ParsedExpression> {
        if attribute_name.starts_with(chars::AT) {
            attribute_name.remove(0);
            if attribute_name.is_empty() {
                return Err(CompilerError::invalid_attribute(
                    "missing attribute name after '@'",
                    input.location(),
                ));
            }
        }
        self.parse_fenced(input, grammar, ExpressionMode::Complete)
    }

    fn resolve_tag(&self, name: &str) -> Option<ComponentHandle> {
        self.resolver.resolve(name)
    }
}

/// Position of the closing quote: (token index, byte offset in that token)
fn find_attribute_end(input: &mut TokenCursor<'_>) -> Result<(usize, usize)> {
    let location = input.location();
    let mut peek = 0;
    loop {
        let Some(token) = input.try_peek(peek) else {
            return Err(CompilerError::unexpected_end("attribute value", location));
        };
        if token.is_end() {
            return Err(CompilerError::unexpected_end("attribute value", location));
        }
        if token.is_symbols() {
            if let Some(offset) = token.content.find(chars::DQ) {
                return Ok((peek, offset));
            }
        }
        peek += 1;
    }
}
