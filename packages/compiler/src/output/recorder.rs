//! Recorders
//!
//! Parsers never talk to a [`CodeGenerator`] directly. They record what they
//! found into a recorder, and the recorder is frozen into a parsed object
//! that can be replayed against any generator, any number of times.

use super::generator::CodeGenerator;
use crate::error::{CompilerError, Result};
use crate::ml_parser::tags::ComponentHandle;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One recorded generator operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instruction {
    /// Nested fragment replayed in place, sharing the sequence counter
    Fragment(ParsedFragment),
    MarkupContent(String),
    Content(ParsedExpression),
    OpenElement(String),
    CloseElement,
    OpenComponent(ComponentHandle),
    CloseComponent,
    Attribute {
        name: String,
        value: Option<ParsedExpression>,
    },
    /// Markup used as a statement inside embedded code
    ChildRegion(ParsedFragment),
    /// Embedded code copied verbatim
    RawCode(String),
    /// Markup used as a value inside embedded code
    MarkupClosure(ParsedFragment),
    /// Body of the `@code` section
    Declarations(ParsedFragment),
}

/// One piece of a recorded expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpressionPart {
    /// String literal concatenated with its neighbours
    Literal(String),
    /// Embedded expression concatenated with its neighbours
    Group(ParsedExpression),
    /// Embedded code copied verbatim
    Code(String),
    /// Markup used as a value
    MarkupClosure(ParsedFragment),
}

fn next_sequence(sequence: &mut u32) -> u32 {
    let current = *sequence;
    *sequence += 1;
    current
}

/// Immutable list of instructions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParsedFragment {
    instructions: Arc<[Instruction]>,
}

impl ParsedFragment {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Replay every instruction against `generator`.
    ///
    /// `sequence` is shared with the caller; regions, closures and the
    /// declarations section start their own counter at the next level.
    pub fn write_to_output(
        &self,
        generator: &mut dyn CodeGenerator,
        nest_level: i32,
        sequence: &mut u32,
    ) -> Result<()> {
        for instruction in self.instructions.iter() {
            match instruction {
                Instruction::Fragment(fragment) => {
                    fragment.write_to_output(generator, nest_level, sequence)?
                }
                Instruction::MarkupContent(text) => {
                    generator.write_markup_content(nest_level, next_sequence(sequence), text)?
                }
                Instruction::Content(expr) => {
                    generator.write_content(nest_level, next_sequence(sequence), expr)?
                }
                Instruction::OpenElement(name) => {
                    generator.open_element(nest_level, next_sequence(sequence), name)?
                }
                Instruction::CloseElement => generator.close_element(nest_level)?,
                Instruction::OpenComponent(component) => {
                    generator.open_component(nest_level, next_sequence(sequence), component)?
                }
                Instruction::CloseComponent => generator.close_component(nest_level)?,
                Instruction::Attribute { name, value } => generator.attribute(
                    nest_level,
                    next_sequence(sequence),
                    name,
                    value.as_ref(),
                )?,
                Instruction::ChildRegion(fragment) => {
                    generator.open_region(nest_level, next_sequence(sequence))?;
                    fragment.write_to_output(generator, nest_level + 1, &mut 0)?;
                    generator.close_region(nest_level)?;
                }
                Instruction::RawCode(code) => generator.write_raw(code)?,
                Instruction::MarkupClosure(fragment) => {
                    write_closure(generator, nest_level, fragment)?
                }
                Instruction::Declarations(fragment) => {
                    if nest_level != 0 {
                        return Err(CompilerError::internal(format!(
                            "declarations replayed at nesting level {}",
                            nest_level
                        )));
                    }
                    generator.begin_code_block()?;
                    fragment.write_to_output(generator, -1, &mut 0)?;
                    generator.end_code_block()?;
                }
            }
        }
        Ok(())
    }
}

fn write_closure(
    generator: &mut dyn CodeGenerator,
    nest_level: i32,
    fragment: &ParsedFragment,
) -> Result<()> {
    generator.begin_markup_closure(nest_level)?;
    fragment.write_to_output(generator, nest_level + 1, &mut 0)?;
    generator.end_markup_closure(nest_level)
}

/// Immutable, non-empty list of expression parts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParsedExpression {
    parts: Arc<[ExpressionPart]>,
}

impl ParsedExpression {
    /// Verbatim embedded code
    pub fn code(code: impl Into<String>) -> Self {
        ParsedExpression {
            parts: Arc::from(vec![ExpressionPart::Code(code.into())]),
        }
    }

    pub fn parts(&self) -> &[ExpressionPart] {
        &self.parts
    }

    pub fn write_to_output(&self, generator: &mut dyn CodeGenerator, nest_level: i32) -> Result<()> {
        for part in self.parts.iter() {
            match part {
                ExpressionPart::Literal(text) => generator.write_string_literal(text)?,
                ExpressionPart::Group(expr) => generator.write_expression(nest_level, expr)?,
                ExpressionPart::Code(code) => generator.write_raw(code)?,
                ExpressionPart::MarkupClosure(fragment) => {
                    write_closure(generator, nest_level, fragment)?
                }
            }
        }
        Ok(())
    }
}

/// Collects markup-level instructions
#[derive(Debug, Default)]
pub struct FragmentRecorder {
    instructions: Vec<Instruction>,
}

impl FragmentRecorder {
    pub fn new() -> Self {
        FragmentRecorder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of `@code` sections recorded so far
    pub fn declaration_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Declarations(_)))
            .count()
    }

    pub fn write(&mut self, fragment: ParsedFragment) {
        if !fragment.is_empty() {
            self.instructions.push(Instruction::Fragment(fragment));
        }
    }

    /// Literal markup; adjacent runs are merged
    pub fn write_markup_content(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Instruction::MarkupContent(last)) = self.instructions.last_mut() {
            last.push_str(text);
        } else {
            self.instructions
                .push(Instruction::MarkupContent(text.to_string()));
        }
    }

    pub fn write_content(&mut self, expr: ParsedExpression) {
        self.instructions.push(Instruction::Content(expr));
    }

    pub fn open_element(&mut self, name: &str) {
        debug!("Open element <{}>", name);
        self.instructions
            .push(Instruction::OpenElement(name.to_string()));
    }

    pub fn close_element(&mut self) {
        self.instructions.push(Instruction::CloseElement);
    }

    pub fn open_component(&mut self, component: ComponentHandle) {
        debug!("Open component {}", component.type_name());
        self.instructions.push(Instruction::OpenComponent(component));
    }

    pub fn close_component(&mut self) {
        self.instructions.push(Instruction::CloseComponent);
    }

    pub fn write_attribute(&mut self, name: &str, value: Option<ParsedExpression>) {
        self.instructions.push(Instruction::Attribute {
            name: name.to_string(),
            value,
        });
    }

    pub fn write_child_region(&mut self, fragment: ParsedFragment) {
        self.instructions.push(Instruction::ChildRegion(fragment));
    }

    pub fn write_raw(&mut self, code: String) {
        if !code.is_empty() {
            self.instructions.push(Instruction::RawCode(code));
        }
    }

    pub fn write_markup_closure(&mut self, fragment: ParsedFragment) {
        self.instructions.push(Instruction::MarkupClosure(fragment));
    }

    pub fn write_declarations(&mut self, fragment: ParsedFragment) {
        self.instructions.push(Instruction::Declarations(fragment));
    }

    pub fn to_parsed_object(self) -> ParsedFragment {
        ParsedFragment {
            instructions: Arc::from(self.instructions),
        }
    }
}

/// Collects the parts of one expression
#[derive(Debug, Default)]
pub struct ExpressionRecorder {
    parts: Vec<ExpressionPart>,
}

impl ExpressionRecorder {
    pub fn new() -> Self {
        ExpressionRecorder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Nested expression, concatenated as one segment
    pub fn write(&mut self, expr: ParsedExpression) {
        self.parts.push(ExpressionPart::Group(expr));
    }

    pub fn write_literal(&mut self, text: String) {
        self.parts.push(ExpressionPart::Literal(text));
    }

    pub fn write_raw(&mut self, code: String) {
        if !code.is_empty() {
            self.parts.push(ExpressionPart::Code(code));
        }
    }

    pub fn write_markup_closure(&mut self, fragment: ParsedFragment) {
        self.parts.push(ExpressionPart::MarkupClosure(fragment));
    }

    /// Freeze the recorded parts; an expression needs at least one
    pub fn to_parsed_object(self) -> Result<ParsedExpression> {
        if self.parts.is_empty() {
            return Err(CompilerError::internal("empty expression recorded"));
        }
        Ok(ParsedExpression {
            parts: Arc::from(self.parts),
        })
    }
}
