//! ML Parser
//!
//! Markup fragment parser plus the contracts through which markup and
//! embedded code parse each other.
//!
//! Neither parser owns the other. Every entry point receives the shared
//! cursor and a [`Grammar`] naming the filter and both parsers, and passes
//! them on when it recurses.

use super::cursor::TokenCursor;
use super::filter::{FilterAction, FilterEnv, TokenFilter};
use super::tags::{is_void_element, ComponentHandle, TagStackEntry};
use super::tokens::{TokenSequence, TokenType};
use crate::chars;
use crate::error::{CompilerError, Result};
use crate::output::recorder::{ExpressionRecorder, FragmentRecorder, ParsedExpression, ParsedFragment};
use smallvec::SmallVec;
use tracing::debug;

type TagStack = SmallVec<[TagStackEntry; 8]>;

/// Parses one top-level markup unit: a tag with all its content, a text
/// run, or an embedded block or expression.
pub trait FragmentParser {
    fn parse(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
    ) -> Result<()>;
}

/// Result of parsing a code block introduced by the sigil
#[derive(Debug, Clone, PartialEq)]
pub enum CodeBlock {
    /// A statement executed while building
    Statement(ParsedFragment),
    /// The `@code` section
    Declarations(ParsedFragment),
}

/// Embedded-language entry points used by the fragment parser
pub trait CodeParser {
    /// Block after the sigil, positioned on its leading keyword
    fn parse_code_block(&self, input: &mut TokenCursor<'_>, grammar: Grammar<'_>)
        -> Result<CodeBlock>;

    /// Inline expression after the sigil
    fn parse_expression(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<ParsedExpression>;

    /// Inline expression after the sigil inside a quoted attribute value;
    /// must stop at the closing quote at the latest
    fn parse_attribute_segment(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<ParsedExpression>;

    /// Whole quoted value of a component or directive attribute. May rename
    /// the attribute.
    fn parse_attribute_expression(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        component: Option<&ComponentHandle>,
        attribute_name: &mut String,
    ) -> Result<ParsedExpression>;

    fn resolve_tag(&self, name: &str) -> Option<ComponentHandle>;
}

/// The set of cooperating parsers for one compile
#[derive(Clone, Copy)]
pub struct Grammar<'g> {
    pub filter: &'g dyn TokenFilter,
    pub fragment: &'g dyn FragmentParser,
    pub code: &'g dyn CodeParser,
    depth: usize,
}

impl<'g> Grammar<'g> {
    pub fn new(
        filter: &'g dyn TokenFilter,
        fragment: &'g dyn FragmentParser,
        code: &'g dyn CodeParser,
    ) -> Self {
        Grammar {
            filter,
            fragment,
            code,
            depth: 0,
        }
    }

    /// Same grammar, one level of embedded code deeper
    pub fn nested(self) -> Self {
        Grammar {
            depth: self.depth + 1,
            ..self
        }
    }

    /// True outside any embedded code
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// HTML-like markup parser
#[derive(Debug, Clone, Copy)]
pub struct MarkupParser {
    auto_close_void_elements: bool,
}

impl Default for MarkupParser {
    fn default() -> Self {
        MarkupParser {
            auto_close_void_elements: true,
        }
    }
}

impl FragmentParser for MarkupParser {
    fn parse(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
    ) -> Result<()> {
        let mut stack = TagStack::new();
        while !input.at_end() {
            self.parse_step(input, grammar, output, &mut stack)?;
            if stack.is_empty() {
                break;
            }
        }
        if let Some(open) = stack.last() {
            return Err(CompilerError::unexpected_end(
                format!("content of <{}>", open.name),
                input.location(),
            ));
        }
        Ok(())
    }
}

impl MarkupParser {
    pub fn new(auto_close_void_elements: bool) -> Self {
        MarkupParser {
            auto_close_void_elements,
        }
    }

    fn parse_step(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        stack: &mut TagStack,
    ) -> Result<()> {
        let location = input.location();
        match grammar.filter.filter(FilterEnv::Text, input)? {
            FilterAction::BeginBlock => {
                match grammar.code.parse_code_block(input, grammar)? {
                    CodeBlock::Statement(fragment) => output.write(fragment),
                    CodeBlock::Declarations(fragment) => {
                        if !grammar.is_root() || !stack.is_empty() {
                            return Err(CompilerError::unsupported(
                                "@code section inside markup or code",
                                location,
                            ));
                        }
                        output.write_declarations(fragment);
                    }
                }
                return Ok(());
            }
            FilterAction::BeginExpression => {
                output.write_content(grammar.code.parse_expression(input, grammar)?);
                return Ok(());
            }
            FilterAction::None => {}
        }

        let token = input.current();
        match token.token_type {
            TokenType::End => Ok(()),
            TokenType::Symbols => match token.content.find(chars::LT) {
                Some(0) => self.parse_tag(input, grammar, output, stack),
                Some(start) => {
                    output.write_markup_content(&token.content[..start]);
                    input.split_current(start)?;
                    input.ensure_advance()
                }
                None => {
                    output.write_markup_content(token.content);
                    input.ensure_advance()
                }
            },
            TokenType::Text | TokenType::Whitespace => {
                output.write_markup_content(token.content);
                input.ensure_advance()
            }
        }
    }

    fn parse_tag(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        stack: &mut TagStack,
    ) -> Result<()> {
        let location = input.location();
        input.split_current(1)?;
        input.ensure_advance()?;

        let is_close = input.current().starts_with_symbol(chars::SLASH);
        if is_close {
            input.split_current(1)?;
            input.ensure_advance()?;
        }

        let name = read_tag_name(input)?;
        if name.is_empty() {
            return Err(CompilerError::invalid_tag("missing tag name", location));
        }

        if is_close {
            self.parse_close_tag(input, grammar, output, stack, name)
        } else {
            self.parse_open_tag(input, grammar, output, stack, name)
        }
    }

    fn parse_open_tag(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        stack: &mut TagStack,
        name: String,
    ) -> Result<()> {
        let location = input.location();
        let component = grammar.code.resolve_tag(&name);
        let name = match component {
            Some(_) => name,
            None => name.to_lowercase(),
        };
        if component.is_none() && name == "script" {
            return Err(CompilerError::unsupported("<script> elements", location));
        }

        match &component {
            Some(handle) => output.open_component(handle.clone()),
            None => output.open_element(&name),
        }
        self.parse_attribute_list(input, grammar, output, component.as_ref(), false)?;

        let token = input.current();
        let self_closing = token.starts_with_symbol(chars::SLASH);
        if self_closing {
            if !token.content.starts_with("/>") {
                return Err(CompilerError::invalid_tag(
                    "expected '>' after '/'",
                    token.location,
                ));
            }
            input.split_current(2)?;
        } else {
            input.split_current(1)?;
        }
        input.ensure_advance()?;

        let is_void =
            component.is_none() && self.auto_close_void_elements && is_void_element(&name);
        if self_closing || is_void {
            close_tag(output, component.is_some());
        } else {
            stack.push(TagStackEntry { name, component });
        }
        Ok(())
    }

    fn parse_close_tag(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        stack: &mut TagStack,
        name: String,
    ) -> Result<()> {
        let location = input.location();
        let Some(open) = stack.last() else {
            return Err(CompilerError::MismatchedTag {
                expected: None,
                found: name,
                location,
            });
        };
        let name = if open.is_component() {
            name
        } else {
            name.to_lowercase()
        };
        if open.name != name {
            return Err(CompilerError::MismatchedTag {
                expected: Some(open.name.clone()),
                found: name,
                location,
            });
        }

        self.parse_attribute_list(input, grammar, output, None, true)?;
        let token = input.current();
        if !token.starts_with_symbol(chars::GT) {
            return Err(CompilerError::invalid_tag(
                format!("expected '>' to end </{}>", name),
                token.location,
            ));
        }
        input.split_current(1)?;
        input.ensure_advance()?;

        if let Some(open) = stack.pop() {
            close_tag(output, open.is_component());
        }
        Ok(())
    }

    /// Attributes up to the `/` or `>` ending the tag
    fn parse_attribute_list(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        component: Option<&ComponentHandle>,
        is_close: bool,
    ) -> Result<()> {
        loop {
            let token = input.current();
            let location = token.location;
            match token.token_type {
                TokenType::End => return Err(CompilerError::unexpected_end("tag", location)),
                TokenType::Whitespace => input.ensure_advance()?,
                TokenType::Text | TokenType::Symbols => {
                    let name = read_attribute_name(input)?;
                    if name.is_empty() {
                        let token = input.current();
                        if token.starts_with_symbol(chars::SLASH)
                            || token.starts_with_symbol(chars::GT)
                        {
                            return Ok(());
                        }
                        return Err(CompilerError::invalid_attribute(
                            format!("expected attribute name, found {:?}", token.content),
                            location,
                        ));
                    }
                    if is_close {
                        return Err(CompilerError::invalid_tag(
                            "closing tag cannot have attributes",
                            location,
                        ));
                    }
                    self.parse_attribute(input, grammar, output, component, name)?;
                }
            }
        }
    }

    fn parse_attribute(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
        output: &mut FragmentRecorder,
        component: Option<&ComponentHandle>,
        mut name: String,
    ) -> Result<()> {
        skip_whitespace(input)?;
        if !input.current().starts_with_symbol(chars::EQ) {
            output.write_attribute(&name, None);
            return Ok(());
        }
        input.split_current(1)?;
        input.ensure_advance()?;
        skip_whitespace(input)?;
        expect_quote(input, &name, "opening")?;

        let value = if component.is_none() && !name.starts_with(chars::AT) {
            self.parse_attribute_value(input, grammar)?
        } else {
            grammar
                .code
                .parse_attribute_expression(input, grammar, component, &mut name)?
        };

        expect_quote(input, &name, "closing")?;
        output.write_attribute(&name, Some(value));
        Ok(())
    }

    /// Literal text and inline expressions up to the closing quote
    fn parse_attribute_value(
        &self,
        input: &mut TokenCursor<'_>,
        grammar: Grammar<'_>,
    ) -> Result<ParsedExpression> {
        let mut recorder = ExpressionRecorder::new();
        let mut literal = String::new();
        loop {
            let location = input.location();
            match grammar.filter.filter(FilterEnv::AttributeValue, input)? {
                FilterAction::BeginBlock => {
                    return Err(CompilerError::unsupported(
                        "code block inside an attribute value",
                        location,
                    ))
                }
                FilterAction::BeginExpression => {
                    if !literal.is_empty() {
                        recorder.write_literal(std::mem::take(&mut literal));
                    }
                    recorder.write(grammar.code.parse_attribute_segment(input, grammar)?);
                    continue;
                }
                FilterAction::None => {}
            }

            let token = input.current();
            match token.token_type {
                TokenType::End => {
                    return Err(CompilerError::unexpected_end("attribute value", location))
                }
                TokenType::Symbols => match token.content.find(chars::DQ) {
                    Some(0) => break,
                    Some(end) => {
                        literal.push_str(&token.content[..end]);
                        input.split_current(end)?;
                    }
                    None => literal.push_str(token.content),
                },
                _ => literal.push_str(token.content),
            }
            input.ensure_advance()?;
        }

        if !literal.is_empty() || recorder.is_empty() {
            recorder.write_literal(literal);
        }
        recorder.to_parsed_object()
    }
}

fn close_tag(output: &mut FragmentRecorder, is_component: bool) {
    if is_component {
        output.close_component();
    } else {
        output.close_element();
    }
}

/// Tag name up to whitespace, `/` or `>`
fn read_tag_name(input: &mut TokenCursor<'_>) -> Result<String> {
    let mut name = String::new();
    loop {
        let token = input.current();
        match token.token_type {
            TokenType::End => {
                return Err(CompilerError::unexpected_end("tag", token.location));
            }
            TokenType::Whitespace => break,
            TokenType::Symbols => match token.content.find([chars::SLASH, chars::GT]) {
                Some(0) => break,
                Some(end) => {
                    name.push_str(&token.content[..end]);
                    input.split_current(end)?;
                    input.ensure_advance()?;
                    break;
                }
                None => {
                    name.push_str(token.content);
                    input.ensure_advance()?;
                }
            },
            TokenType::Text => {
                name.push_str(token.content);
                input.ensure_advance()?;
            }
        }
    }
    debug!("Read tag name {:?}", name);
    Ok(name)
}

/// Attribute name up to whitespace, `=`, a quote, `/` or `>`
fn read_attribute_name(input: &mut TokenCursor<'_>) -> Result<String> {
    let mut name = String::new();
    loop {
        let token = input.current();
        match token.token_type {
            TokenType::Text => {
                name.push_str(token.content);
                input.ensure_advance()?;
            }
            TokenType::Symbols => {
                match token
                    .content
                    .find([chars::SLASH, chars::GT, chars::EQ, chars::DQ])
                {
                    Some(0) => break,
                    Some(end) => {
                        name.push_str(&token.content[..end]);
                        input.split_current(end)?;
                        input.ensure_advance()?;
                        break;
                    }
                    None => {
                        name.push_str(token.content);
                        input.ensure_advance()?;
                    }
                }
            }
            TokenType::Whitespace | TokenType::End => break,
        }
    }
    Ok(name)
}

fn skip_whitespace(input: &mut TokenCursor<'_>) -> Result<()> {
    while input.current().is_whitespace() {
        input.ensure_advance()?;
    }
    Ok(())
}

fn expect_quote(input: &mut TokenCursor<'_>, attribute_name: &str, which: &str) -> Result<()> {
    let token = input.current();
    if token.is_end() {
        return Err(CompilerError::unexpected_end(
            format!("value of attribute {}", attribute_name),
            token.location,
        ));
    }
    if !token.starts_with_symbol(chars::DQ) {
        return Err(CompilerError::invalid_attribute(
            format!("expected {} '\"' for attribute {}", which, attribute_name),
            token.location,
        ));
    }
    input.split_current(1)?;
    input.ensure_advance()
}
