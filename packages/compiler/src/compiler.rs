//! Compiler Main Module
//!
//! Ties the template tokenizer, the markup and Lua parsers and the Lua
//! serializer together.

use crate::config::CompileOptions;
use crate::error::{CompilerError, Result};
use crate::expression_parser::{LuaCodeParser, LuaTokenFilter};
use crate::ml_parser::cursor::TokenCursor;
use crate::ml_parser::lexer::{ReaderSource, TemplateTokenizer};
use crate::ml_parser::parser::{FragmentParser, Grammar, MarkupParser};
use crate::ml_parser::tags::{NoComponents, TagResolver};
use crate::output::lua_emitter::LuaCodeGenerator;
use crate::output::recorder::{FragmentRecorder, ParsedFragment};
use rayon::prelude::*;
use std::io::BufRead;
use std::sync::Arc;
use tracing::debug;

/// Callback receiving every generated chunk
pub type CodeObserver = Box<dyn Fn(&str) + Send + Sync>;

/// Reusable compiler configuration. Compiling never mutates it, so one
/// instance can serve any number of threads.
pub struct Compiler {
    options: CompileOptions,
    resolver: Arc<dyn TagResolver + Send + Sync>,
    observers: Vec<CodeObserver>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(CompileOptions::default())
    }
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            options,
            resolver: Arc::new(NoComponents),
            observers: Vec::new(),
        }
    }

    /// Use `resolver` to decide which tags are components
    pub fn with_resolver(mut self, resolver: impl TagResolver + Send + Sync + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Register a callback invoked with the source of every successful
    /// compile
    pub fn on_code_generated(&mut self, observer: impl Fn(&str) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Parse a template into its replayable form
    pub fn parse(&self, template: &str) -> Result<ParsedFragment> {
        self.parse_cursor(TokenCursor::for_str(template))
    }

    /// Parse a template read from `reader`
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<ParsedFragment> {
        let tokenizer = TemplateTokenizer::new(ReaderSource::new(reader));
        self.parse_cursor(TokenCursor::new(tokenizer))
    }

    fn parse_cursor(&self, mut input: TokenCursor<'_>) -> Result<ParsedFragment> {
        let filter = LuaTokenFilter;
        let markup = MarkupParser::new(self.options.auto_close_void_elements);
        let code = LuaCodeParser::new(self.resolver.as_ref());
        let grammar = Grammar::new(&filter, &markup, &code);

        let mut recorder = FragmentRecorder::new();
        let result = parse_units(&mut input, grammar, &markup, &mut recorder);
        // a failed read ends the input early; report it instead of the
        // parse error it causes
        if let Some(err) = input.take_io_error() {
            return Err(err.into());
        }
        result?;
        Ok(recorder.to_parsed_object())
    }

    /// Serialize a parsed template into a Lua chunk
    pub fn generate(&self, fragment: &ParsedFragment) -> Result<String> {
        let mut generator = LuaCodeGenerator::new(&self.options);
        fragment.write_to_output(&mut generator, 0, &mut 0)?;
        let code = generator.finish()?;
        debug!(
            "Generated {} bytes of Lua from {} instructions",
            code.len(),
            fragment.instructions().len()
        );
        for observer in &self.observers {
            observer(&code);
        }
        Ok(code)
    }

    pub fn compile(&self, template: &str) -> Result<String> {
        debug!("Compiling template of {} bytes", template.len());
        let fragment = self.parse(template)?;
        self.generate(&fragment)
    }

    pub fn compile_reader<R: BufRead>(&self, reader: R) -> Result<String> {
        let fragment = self.parse_reader(reader)?;
        self.generate(&fragment)
    }

    /// Compile independent templates in parallel. Results keep the order of
    /// `templates`.
    pub fn compile_many(&self, templates: &[&str]) -> Vec<Result<String>> {
        templates
            .par_iter()
            .map(|template| self.compile(template))
            .collect()
    }
}

/// Top-level units until the end of input
fn parse_units(
    input: &mut TokenCursor<'_>,
    grammar: Grammar<'_>,
    markup: &MarkupParser,
    output: &mut FragmentRecorder,
) -> Result<()> {
    while !input.at_end() {
        let location = input.location();
        markup.parse(input, grammar, output)?;
        if output.declaration_count() > 1 {
            return Err(CompilerError::unsupported(
                "more than one @code section",
                location,
            ));
        }
    }
    Ok(())
}

/// Compile with default options and no components
pub fn compile(template: &str) -> Result<String> {
    Compiler::default().compile(template)
}
