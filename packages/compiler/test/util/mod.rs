#![allow(dead_code)]

/**
 * Test Utilities
 *
 * A code generator that logs every call, so tests can check exactly what a
 * parsed template replays.
 */
use lua_markup_compiler::ml_parser::ComponentHandle;
use lua_markup_compiler::{
    CodeGenerator, CompileOptions, Compiler, ComponentRegistry, ParsedExpression,
    ParsedFragment, Result,
};

#[derive(Debug, Default)]
pub struct RecordingGenerator {
    pub ops: Vec<String>,
}

impl RecordingGenerator {
    fn log(&mut self, op: String) -> Result<()> {
        self.ops.push(op);
        Ok(())
    }
}

impl CodeGenerator for RecordingGenerator {
    fn write_raw(&mut self, code: &str) -> Result<()> {
        self.log(format!("raw {:?}", code))
    }

    fn begin_markup_closure(&mut self, nest_level: i32) -> Result<()> {
        self.log(format!("{} closure", nest_level))
    }

    fn end_markup_closure(&mut self, nest_level: i32) -> Result<()> {
        self.log(format!("{} end closure", nest_level))
    }

    fn write_string_literal(&mut self, literal: &str) -> Result<()> {
        self.log(format!("literal {:?}", literal))
    }

    fn write_expression(&mut self, nest_level: i32, expr: &ParsedExpression) -> Result<()> {
        self.begin_expression_list()?;
        expr.write_to_output(self, nest_level)?;
        self.end_expression_list()
    }

    fn begin_expression_list(&mut self) -> Result<()> {
        self.log("(".to_string())
    }

    fn end_expression_list(&mut self) -> Result<()> {
        self.log(")".to_string())
    }

    fn write_markup_content(&mut self, nest_level: i32, sequence: u32, text: &str) -> Result<()> {
        self.log(format!("{}:{} markup {:?}", nest_level, sequence, text))
    }

    fn write_content(
        &mut self,
        nest_level: i32,
        sequence: u32,
        expr: &ParsedExpression,
    ) -> Result<()> {
        self.log(format!("{}:{} content", nest_level, sequence))?;
        expr.write_to_output(self, nest_level)?;
        self.log("end content".to_string())
    }

    fn open_element(&mut self, nest_level: i32, sequence: u32, name: &str) -> Result<()> {
        self.log(format!("{}:{} open {}", nest_level, sequence, name))
    }

    fn close_element(&mut self, nest_level: i32) -> Result<()> {
        self.log(format!("{} close", nest_level))
    }

    fn open_component(
        &mut self,
        nest_level: i32,
        sequence: u32,
        component: &ComponentHandle,
    ) -> Result<()> {
        self.log(format!(
            "{}:{} component {}",
            nest_level,
            sequence,
            component.type_name()
        ))
    }

    fn close_component(&mut self, nest_level: i32) -> Result<()> {
        self.log(format!("{} close component", nest_level))
    }

    fn attribute(
        &mut self,
        nest_level: i32,
        sequence: u32,
        name: &str,
        value: Option<&ParsedExpression>,
    ) -> Result<()> {
        self.log(format!("{}:{} attr {}", nest_level, sequence, name))?;
        if let Some(expr) = value {
            expr.write_to_output(self, nest_level)?;
            self.log("end attr".to_string())?;
        }
        Ok(())
    }

    fn open_region(&mut self, nest_level: i32, sequence: u32) -> Result<()> {
        self.log(format!("{}:{} region", nest_level, sequence))
    }

    fn close_region(&mut self, nest_level: i32) -> Result<()> {
        self.log(format!("{} end region", nest_level))
    }

    fn begin_code_block(&mut self) -> Result<()> {
        self.log("code".to_string())
    }

    fn end_code_block(&mut self) -> Result<()> {
        self.log("end code".to_string())
    }
}

pub fn replay(fragment: &ParsedFragment) -> Vec<String> {
    let mut generator = RecordingGenerator::default();
    fragment
        .write_to_output(&mut generator, 0, &mut 0)
        .unwrap();
    generator.ops
}

/// Parse with default options and replay against a [`RecordingGenerator`]
pub fn record(template: &str) -> Vec<String> {
    replay(&Compiler::default().parse(template).unwrap())
}

pub fn ops(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

pub fn compiler_with_components() -> Compiler {
    let registry = ComponentRegistry::new()
        .with("Counter", "Components.Counter")
        .unwrap()
        .with("Panel", "Components.Panel")
        .unwrap();
    Compiler::new(CompileOptions::default()).with_resolver(registry)
}
