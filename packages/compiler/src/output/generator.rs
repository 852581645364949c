//! Code Generator Contract
//!
//! Backend driven by replaying parsed objects.
//!
//! A generator is in content mode (emitting builder calls) or expression
//! mode (emitting one value). `write_content` and valued `attribute` calls
//! enter expression mode for the duration of their value; a markup closure
//! enters content mode again for its body. Calling an operation in the wrong
//! mode, or a builder operation at a negative nesting level, is an internal
//! consistency fault.
//!
//! Nesting level -1 is the declarations section; builder calls are only
//! valid from level 0.

use super::recorder::ParsedExpression;
use crate::error::Result;
use crate::ml_parser::tags::ComponentHandle;

pub trait CodeGenerator {
    // -- any mode

    /// Verbatim code. In expression mode it continues the current segment.
    fn write_raw(&mut self, code: &str) -> Result<()>;

    /// Markup closure header; the body is replayed at `nest_level + 1` in
    /// content mode.
    fn begin_markup_closure(&mut self, nest_level: i32) -> Result<()>;
    fn end_markup_closure(&mut self, nest_level: i32) -> Result<()>;

    // -- expression mode

    /// String literal as a new concatenated segment
    fn write_string_literal(&mut self, literal: &str) -> Result<()>;

    /// Nested expression as a new concatenated segment
    fn write_expression(&mut self, nest_level: i32, expr: &ParsedExpression) -> Result<()>;

    /// Open a parenthesised group of segments; it must not stay empty
    fn begin_expression_list(&mut self) -> Result<()>;
    fn end_expression_list(&mut self) -> Result<()>;

    // -- content mode

    fn write_markup_content(&mut self, nest_level: i32, sequence: u32, text: &str) -> Result<()>;
    fn write_content(&mut self, nest_level: i32, sequence: u32, expr: &ParsedExpression)
        -> Result<()>;
    fn open_element(&mut self, nest_level: i32, sequence: u32, name: &str) -> Result<()>;
    fn close_element(&mut self, nest_level: i32) -> Result<()>;
    fn open_component(
        &mut self,
        nest_level: i32,
        sequence: u32,
        component: &ComponentHandle,
    ) -> Result<()>;
    fn close_component(&mut self, nest_level: i32) -> Result<()>;

    /// Attribute with an optional value; `None` means presence only
    fn attribute(
        &mut self,
        nest_level: i32,
        sequence: u32,
        name: &str,
        value: Option<&ParsedExpression>,
    ) -> Result<()>;

    /// Region whose content is replayed at `nest_level + 1`
    fn open_region(&mut self, nest_level: i32, sequence: u32) -> Result<()>;
    fn close_region(&mut self, nest_level: i32) -> Result<()>;

    /// Switch output to the declarations section
    fn begin_code_block(&mut self) -> Result<()>;
    fn end_code_block(&mut self) -> Result<()>;
}
