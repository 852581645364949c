//! Lua Emitter
//!
//! [`CodeGenerator`] that serializes a parsed template into Lua source.
//!
//! The generated chunk returns a constructor. Calling it runs the
//! declarations section once and yields an object whose `build(__builder0)`
//! method replays the builder calls:
//!
//! ```lua
//! return function()
//! local self = {}
//! -- declarations
//! function self:setParameters(p)
//! self.parameters = p
//! end
//! function self:build(__builder0)
//! __builder0.OpenElement(0, "p")
//! __builder0.CloseElement()
//! end
//! return self
//! end
//! ```

use super::generator::CodeGenerator;
use super::recorder::ParsedExpression;
use crate::config::CompileOptions;
use crate::error::{CompilerError, Result};
use crate::ml_parser::tags::ComponentHandle;
use smallvec::SmallVec;
use std::fmt::Write;

const CONCAT: &str = " .. ";

enum Frame {
    Content,
    /// One flag per open expression list: true while the list has no
    /// segment yet
    Expression(SmallVec<[bool; 4]>),
}

pub struct LuaCodeGenerator {
    builder_prefix: String,
    emit_parameter_setter: bool,
    build: String,
    declarations: String,
    in_code_block: bool,
    frames: Vec<Frame>,
}

impl LuaCodeGenerator {
    pub fn new(options: &CompileOptions) -> Self {
        LuaCodeGenerator {
            builder_prefix: options.builder_prefix.clone(),
            emit_parameter_setter: options.emit_parameter_setter,
            build: String::new(),
            declarations: String::new(),
            in_code_block: false,
            frames: vec![Frame::Content],
        }
    }

    /// Assemble the complete chunk
    pub fn finish(self) -> Result<String> {
        if self.in_code_block || self.frames.len() != 1 {
            return Err(CompilerError::internal(
                "generator finished inside an open code block or expression",
            ));
        }
        let mut out = String::with_capacity(self.declarations.len() + self.build.len() + 160);
        out.push_str("return function()\n");
        out.push_str("local self = {}\n");
        out.push_str(&self.declarations);
        out.push('\n');
        if self.emit_parameter_setter {
            out.push_str("function self:setParameters(p)\n");
            out.push_str("self.parameters = p\n");
            out.push_str("end\n");
        }
        let _ = writeln!(out, "function self:build({}0)", self.builder_prefix);
        out.push_str(&self.build);
        out.push('\n');
        out.push_str("end\n");
        out.push_str("return self\n");
        out.push_str("end\n");
        Ok(out)
    }

    fn writer(&mut self) -> &mut String {
        if self.in_code_block {
            &mut self.declarations
        } else {
            &mut self.build
        }
    }

    fn builder(&self, nest_level: i32) -> String {
        format!("{}{}", self.builder_prefix, nest_level)
    }

    /// Check content mode and a builder-level nesting level, returning the
    /// builder variable
    fn content_builder(&self, nest_level: i32, operation: &str) -> Result<String> {
        if !matches!(self.frames.last(), Some(Frame::Content)) {
            return Err(CompilerError::internal(format!(
                "{} called in expression mode",
                operation
            )));
        }
        if nest_level < 0 {
            return Err(CompilerError::internal(format!(
                "{} called at nesting level {}",
                operation, nest_level
            )));
        }
        Ok(self.builder(nest_level))
    }

    fn expression_lists(&mut self, operation: &str) -> Result<&mut SmallVec<[bool; 4]>> {
        match self.frames.last_mut() {
            Some(Frame::Expression(lists)) if !lists.is_empty() => Ok(lists),
            _ => Err(CompilerError::internal(format!(
                "{} called in content mode",
                operation
            ))),
        }
    }

    /// Separator before a new segment of the innermost list
    fn begin_segment(&mut self, operation: &str) -> Result<()> {
        let lists = self.expression_lists(operation)?;
        let first = lists.last_mut().map(std::mem::take).unwrap_or(false);
        if !first {
            self.writer().push_str(CONCAT);
        }
        Ok(())
    }

    /// Mark the innermost list as non-empty without a separator
    fn continue_segment(&mut self) {
        if let Some(Frame::Expression(lists)) = self.frames.last_mut() {
            if let Some(first) = lists.last_mut() {
                *first = false;
            }
        }
    }

    /// `builder.Call(args, <expr>)` in expression mode
    fn write_value_call(
        &mut self,
        nest_level: i32,
        head: String,
        expr: &ParsedExpression,
    ) -> Result<()> {
        self.writer().push_str(&head);
        self.frames.push(Frame::Expression(SmallVec::from_elem(true, 1)));
        expr.write_to_output(self, nest_level)?;
        match self.frames.pop() {
            Some(Frame::Expression(lists)) if lists.len() == 1 && !lists[0] => {}
            _ => return Err(CompilerError::internal("unbalanced or empty expression")),
        }
        self.writer().push_str(")\n");
        Ok(())
    }
}

impl CodeGenerator for LuaCodeGenerator {
    fn write_raw(&mut self, code: &str) -> Result<()> {
        self.continue_segment();
        self.writer().push_str(code);
        Ok(())
    }

    fn begin_markup_closure(&mut self, nest_level: i32) -> Result<()> {
        self.continue_segment();
        let inner = self.builder(nest_level + 1);
        let _ = writeln!(self.writer(), "function({})", inner);
        self.frames.push(Frame::Content);
        Ok(())
    }

    fn end_markup_closure(&mut self, _nest_level: i32) -> Result<()> {
        if !matches!(self.frames.pop(), Some(Frame::Content)) || self.frames.is_empty() {
            return Err(CompilerError::internal("markup closure ended in expression mode"));
        }
        let in_content = matches!(self.frames.last(), Some(Frame::Content));
        self.writer()
            .push_str(if in_content { "end\n" } else { "end" });
        Ok(())
    }

    fn write_string_literal(&mut self, literal: &str) -> Result<()> {
        self.begin_segment("write_string_literal")?;
        let quoted = quote_string(literal);
        self.writer().push_str(&quoted);
        Ok(())
    }

    fn write_expression(&mut self, nest_level: i32, expr: &ParsedExpression) -> Result<()> {
        self.begin_segment("write_expression")?;
        self.begin_expression_list()?;
        expr.write_to_output(self, nest_level)?;
        self.end_expression_list()
    }

    fn begin_expression_list(&mut self) -> Result<()> {
        self.expression_lists("begin_expression_list")?.push(true);
        self.writer().push('(');
        Ok(())
    }

    fn end_expression_list(&mut self) -> Result<()> {
        let lists = self.expression_lists("end_expression_list")?;
        if lists.len() < 2 || lists.pop() != Some(false) {
            return Err(CompilerError::internal("empty or unbalanced expression list"));
        }
        self.writer().push(')');
        Ok(())
    }

    fn write_markup_content(&mut self, nest_level: i32, sequence: u32, text: &str) -> Result<()> {
        let builder = self.content_builder(nest_level, "write_markup_content")?;
        let quoted = quote_string(text);
        let _ = writeln!(
            self.writer(),
            "{}.AddMarkupContent({}, {})",
            builder,
            sequence,
            quoted
        );
        Ok(())
    }

    fn write_content(
        &mut self,
        nest_level: i32,
        sequence: u32,
        expr: &ParsedExpression,
    ) -> Result<()> {
        let builder = self.content_builder(nest_level, "write_content")?;
        self.write_value_call(
            nest_level,
            format!("{}.AddContent({}, ", builder, sequence),
            expr,
        )
    }

    fn open_element(&mut self, nest_level: i32, sequence: u32, name: &str) -> Result<()> {
        let builder = self.content_builder(nest_level, "open_element")?;
        let quoted = quote_string(name);
        let _ = writeln!(self.writer(), "{}.OpenElement({}, {})", builder, sequence, quoted);
        Ok(())
    }

    fn close_element(&mut self, nest_level: i32) -> Result<()> {
        let builder = self.content_builder(nest_level, "close_element")?;
        let _ = writeln!(self.writer(), "{}.CloseElement()", builder);
        Ok(())
    }

    fn open_component(
        &mut self,
        nest_level: i32,
        sequence: u32,
        component: &ComponentHandle,
    ) -> Result<()> {
        let builder = self.content_builder(nest_level, "open_component")?;
        let quoted = quote_string(component.type_name());
        let _ = writeln!(
            self.writer(),
            "{}.OpenComponent({}, {})",
            builder,
            sequence,
            quoted
        );
        Ok(())
    }

    fn close_component(&mut self, nest_level: i32) -> Result<()> {
        let builder = self.content_builder(nest_level, "close_component")?;
        let _ = writeln!(self.writer(), "{}.CloseComponent()", builder);
        Ok(())
    }

    fn attribute(
        &mut self,
        nest_level: i32,
        sequence: u32,
        name: &str,
        value: Option<&ParsedExpression>,
    ) -> Result<()> {
        let builder = self.content_builder(nest_level, "attribute")?;
        let quoted = quote_string(name);
        match value {
            None => {
                let _ = writeln!(
                    self.writer(),
                    "{}.AddAttribute({}, {})",
                    builder,
                    sequence,
                    quoted
                );
                Ok(())
            }
            Some(expr) => self.write_value_call(
                nest_level,
                format!("{}.AddAttribute({}, {}, ", builder, sequence, quoted),
                expr,
            ),
        }
    }

    fn open_region(&mut self, nest_level: i32, sequence: u32) -> Result<()> {
        let builder = self.content_builder(nest_level, "open_region")?;
        let inner = self.builder(nest_level + 1);
        let _ = write!(
            self.writer(),
            "{builder}.OpenRegion({sequence})\ndo\nlocal {inner} = {builder}\n"
        );
        Ok(())
    }

    fn close_region(&mut self, nest_level: i32) -> Result<()> {
        let builder = self.content_builder(nest_level, "close_region")?;
        let _ = write!(self.writer(), "end\n{}.CloseRegion()\n", builder);
        Ok(())
    }

    fn begin_code_block(&mut self) -> Result<()> {
        if self.in_code_block {
            return Err(CompilerError::internal("code block is already open"));
        }
        self.in_code_block = true;
        Ok(())
    }

    fn end_code_block(&mut self) -> Result<()> {
        if !self.in_code_block {
            return Err(CompilerError::internal("no code block to end"));
        }
        self.in_code_block = false;
        Ok(())
    }
}

/// Double-quoted Lua string literal
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\r' => quoted.push_str("\\r"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                // a decimal escape swallows up to three digits
                if matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
                    let _ = write!(quoted, "\\{:03}", c as u32);
                } else {
                    let _ = write!(quoted, "\\{}", c as u32);
                }
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
