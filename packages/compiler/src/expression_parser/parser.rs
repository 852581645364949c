//! Expression Parser
//!
//! Recursive-descent Lua 5.2 parser. It validates the grammar and records
//! the accepted source text; it does not build a syntax tree. Markup found
//! where Lua allows a statement or an expression is handed back to the
//! fragment parser and recorded as a child region or a markup closure.

use super::lexer::{LuaLexer, LuaToken};
use crate::chars;
use crate::error::{CompilerError, Result};
use crate::ml_parser::cursor::TokenCursor;
use crate::ml_parser::parser::Grammar;
use crate::ml_parser::tokens::TokenSequence;
use crate::output::recorder::{
    ExpressionRecorder, FragmentRecorder, ParsedExpression, ParsedFragment,
};
use tracing::debug;

/// How much Lua an inline expression may span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionMode {
    /// `@name.field(args)`: one simple expression. Suffixes must follow
    /// without whitespace, so the expression ends before surrounding text.
    Implicit,
    /// A complete expression that must fill the input up to the fence
    Complete,
}

enum Sink {
    Fragment(FragmentRecorder),
    Expression(ExpressionRecorder),
}

pub struct LuaParser<'a, 'src, 'g> {
    input: &'a mut TokenCursor<'src>,
    grammar: Grammar<'g>,
    lexer: LuaLexer,
    sink: Sink,
    declarations: bool,
}

impl<'a, 'src, 'g> LuaParser<'a, 'src, 'g> {
    fn new(
        input: &'a mut TokenCursor<'src>,
        grammar: Grammar<'g>,
        sink: Sink,
        declarations: bool,
    ) -> Self {
        let lexer = LuaLexer::new(input);
        LuaParser {
            input,
            grammar,
            lexer,
            sink,
            declarations,
        }
    }

    /// Parse one inline expression. The flag tells whether the expression
    /// ended on the last token before a peek fence.
    pub fn parse_expression(
        input: &'a mut TokenCursor<'src>,
        grammar: Grammar<'g>,
        mode: ExpressionMode,
    ) -> Result<(ParsedExpression, bool)> {
        let mut parser = LuaParser::new(
            input,
            grammar,
            Sink::Expression(ExpressionRecorder::new()),
            false,
        );
        match mode {
            ExpressionMode::Implicit => parser.simple_expr(true)?,
            ExpressionMode::Complete => {
                parser.expr()?;
                let token = parser.token()?;
                if token != LuaToken::Eos {
                    return Err(parser.error_expected("end of attribute value"));
                }
                if !parser.lexer.fence_reached() && parser.lexer.has_pending_text() {
                    parser.next()?;
                }
            }
        }
        parser.flush_text();
        let fence_reached = parser.lexer.fence_reached();
        match parser.sink {
            Sink::Expression(recorder) => Ok((recorder.to_parsed_object()?, fence_reached)),
            Sink::Fragment(_) => Err(CompilerError::internal("expression parsed into a fragment")),
        }
    }

    /// Parse one statement, positioned on its leading keyword
    pub fn parse_statement(
        input: &'a mut TokenCursor<'src>,
        grammar: Grammar<'g>,
    ) -> Result<ParsedFragment> {
        let mut parser = LuaParser::new(input, grammar, Sink::Fragment(FragmentRecorder::new()), false);
        parser.mixed_statement()?;
        parser.finish_fragment()
    }

    /// Parse the body of the `@code` section up to and including its
    /// terminating `end`, which is not recorded
    pub fn parse_declarations(
        input: &'a mut TokenCursor<'src>,
        grammar: Grammar<'g>,
    ) -> Result<ParsedFragment> {
        let mut parser = LuaParser::new(input, grammar, Sink::Fragment(FragmentRecorder::new()), true);
        parser.block()?;
        parser.flush_text();
        parser.check(LuaToken::End)?;
        parser.next()?;
        parser.lexer.take_output();
        parser.finish_fragment()
    }

    fn finish_fragment(mut self) -> Result<ParsedFragment> {
        self.flush_text();
        match self.sink {
            Sink::Fragment(recorder) => Ok(recorder.to_parsed_object()),
            Sink::Expression(_) => Err(CompilerError::internal("statement parsed into an expression")),
        }
    }

    // -- lexer plumbing

    fn token(&mut self) -> Result<LuaToken> {
        self.lexer.current(self.input)
    }

    fn next(&mut self) -> Result<()> {
        self.lexer.advance(self.input)
    }

    fn test_next(&mut self, expected: LuaToken) -> Result<bool> {
        if self.token()? == expected {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn check(&mut self, expected: LuaToken) -> Result<()> {
        if self.token()? != expected {
            return Err(self.error_expected(&expected.to_string()));
        }
        Ok(())
    }

    fn check_and_next(&mut self, expected: LuaToken) -> Result<()> {
        self.check(expected)?;
        self.next()
    }

    fn check_name(&mut self) -> Result<()> {
        self.check_and_next(LuaToken::Name)
    }

    fn error_expected(&mut self, expected: &str) -> CompilerError {
        let location = self.input.location();
        let found = match self.token() {
            Ok(LuaToken::Name) => format!("'{}'", self.lexer.name()),
            Ok(token) => token.to_string(),
            Err(err) => return err,
        };
        CompilerError::grammar(expected, found, location)
    }

    /// Move accepted text into the recorder
    fn flush_text(&mut self) {
        let mut text = self.lexer.take_output();
        if text.is_empty() {
            return;
        }
        match &mut self.sink {
            Sink::Fragment(recorder) => {
                text.push('\n');
                recorder.write_raw(text);
            }
            Sink::Expression(recorder) => recorder.write_raw(text),
        }
    }

    // -- markup inside code

    /// `<tag>...</tag>` where a statement is expected
    fn markup_statement(&mut self) -> Result<()> {
        let location = self.input.location();
        if self.declarations {
            return Err(CompilerError::unsupported(
                "markup statement in the @code section",
                location,
            ));
        }
        if matches!(self.sink, Sink::Expression(_)) {
            return Err(CompilerError::unsupported(
                "markup statement inside an expression",
                location,
            ));
        }
        self.lexer.detach(self.input)?;
        self.flush_text();
        debug!("Markup statement at {}", self.input.location());

        let mut recorder = FragmentRecorder::new();
        self.grammar
            .fragment
            .parse(self.input, self.grammar.nested(), &mut recorder)?;
        if let Sink::Fragment(sink) = &mut self.sink {
            sink.write_child_region(recorder.to_parsed_object());
        }
        self.lexer.reset(self.input);
        Ok(())
    }

    /// `@<tag>...</tag>` where an expression is expected
    fn markup_expr(&mut self) -> Result<()> {
        if self.input.has_peek_limit() {
            // the fence ends at the first quote, which markup may contain
            return Err(CompilerError::unsupported(
                "markup inside an attribute expression",
                self.input.location(),
            ));
        }
        self.lexer.detach(self.input)?;
        self.flush_text();
        let token = self.input.current();
        let location = token.location;
        if !token.content.starts_with("@<") {
            return Err(CompilerError::grammar(
                "markup after '@'",
                format!("{:?}", token.content),
                location,
            ));
        }
        debug!("Markup expression at {}", location);
        self.input.split_current(1)?;
        self.input.ensure_advance()?;

        let mut recorder = FragmentRecorder::new();
        self.grammar
            .fragment
            .parse(self.input, self.grammar.nested(), &mut recorder)?;
        let fragment = recorder.to_parsed_object();
        match &mut self.sink {
            Sink::Fragment(sink) => sink.write_markup_closure(fragment),
            Sink::Expression(sink) => sink.write_markup_closure(fragment),
        }
        self.lexer.reset(self.input);
        Ok(())
    }

    // -- statements

    fn block_follow(&mut self, with_until: bool) -> Result<bool> {
        Ok(match self.token()? {
            LuaToken::Else | LuaToken::Elseif | LuaToken::End | LuaToken::Eos => true,
            LuaToken::Until => with_until,
            _ => false,
        })
    }

    fn block(&mut self) -> Result<()> {
        while !self.block_follow(true)? {
            if self.token()? == LuaToken::Return {
                self.next()?;
                return self.ret_stat();
            }
            self.mixed_statement()?;
        }
        Ok(())
    }

    fn mixed_statement(&mut self) -> Result<()> {
        if self.token()?.is_char(chars::LT) {
            self.markup_statement()
        } else {
            self.statement()
        }
    }

    fn statement(&mut self) -> Result<()> {
        match self.token()? {
            LuaToken::Char(';') => self.next(),
            LuaToken::If => self.if_stat(),
            LuaToken::While => {
                self.next()?;
                self.expr()?;
                self.check_and_next(LuaToken::Do)?;
                self.block()?;
                self.check_and_next(LuaToken::End)
            }
            LuaToken::Do => {
                self.next()?;
                self.block()?;
                self.check_and_next(LuaToken::End)
            }
            LuaToken::For => self.for_stat(),
            LuaToken::Repeat => {
                self.next()?;
                self.block()?;
                self.check_and_next(LuaToken::Until)?;
                self.expr()
            }
            LuaToken::Function => {
                self.next()?;
                self.func_name()?;
                self.body()
            }
            LuaToken::Local => {
                self.next()?;
                if self.test_next(LuaToken::Function)? {
                    self.check_name()?;
                    self.body()
                } else {
                    self.local_stat()
                }
            }
            LuaToken::DbColon => {
                self.next()?;
                self.check_name()?;
                self.check_and_next(LuaToken::DbColon)
            }
            LuaToken::Return => {
                self.next()?;
                self.ret_stat()
            }
            LuaToken::Break => self.next(),
            LuaToken::Goto => {
                self.next()?;
                self.check_name()
            }
            _ => self.expr_stat(),
        }
    }

    fn if_stat(&mut self) -> Result<()> {
        self.test_then_block()?;
        while self.token()? == LuaToken::Elseif {
            self.test_then_block()?;
        }
        if self.test_next(LuaToken::Else)? {
            self.block()?;
        }
        self.check_and_next(LuaToken::End)
    }

    /// `if`/`elseif` cond `then` block
    fn test_then_block(&mut self) -> Result<()> {
        self.next()?;
        self.expr()?;
        self.check_and_next(LuaToken::Then)?;
        self.block()
    }

    fn for_stat(&mut self) -> Result<()> {
        self.next()?;
        self.check_name()?;
        match self.token()? {
            LuaToken::Char('=') => {
                self.next()?;
                self.expr()?;
                self.check_and_next(LuaToken::Char(','))?;
                self.expr()?;
                if self.test_next(LuaToken::Char(','))? {
                    self.expr()?;
                }
            }
            LuaToken::Char(',') | LuaToken::In => {
                while self.test_next(LuaToken::Char(','))? {
                    self.check_name()?;
                }
                self.check_and_next(LuaToken::In)?;
                self.expr_list()?;
            }
            _ => return Err(self.error_expected("'=' or 'in'")),
        }
        self.check_and_next(LuaToken::Do)?;
        self.block()?;
        self.check_and_next(LuaToken::End)
    }

    fn func_name(&mut self) -> Result<()> {
        self.check_name()?;
        while self.test_next(LuaToken::Char('.'))? {
            self.check_name()?;
        }
        if self.test_next(LuaToken::Char(':'))? {
            self.check_name()?;
        }
        Ok(())
    }

    fn local_stat(&mut self) -> Result<()> {
        loop {
            self.check_name()?;
            if !self.test_next(LuaToken::Char(','))? {
                break;
            }
        }
        if self.test_next(LuaToken::Char('='))? {
            self.expr_list()?;
        }
        Ok(())
    }

    /// After `return`
    fn ret_stat(&mut self) -> Result<()> {
        if !self.block_follow(true)? && !self.token()?.is_char(';') {
            self.expr_list()?;
        }
        self.test_next(LuaToken::Char(';'))?;
        Ok(())
    }

    /// Assignment or function call
    fn expr_stat(&mut self) -> Result<()> {
        self.suffixed_expr(false)?;
        let token = self.token()?;
        if token.is_char('=') || token.is_char(',') {
            while self.test_next(LuaToken::Char(','))? {
                self.suffixed_expr(false)?;
            }
            self.check_and_next(LuaToken::Char('='))?;
            self.expr_list()?;
        }
        Ok(())
    }

    // -- expressions

    fn expr_list(&mut self) -> Result<()> {
        self.expr()?;
        while self.test_next(LuaToken::Char(','))? {
            self.expr()?;
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<()> {
        self.sub_expr(false)
    }

    /// Operands joined by binary operators. Only validity matters here, so
    /// precedence is not tracked.
    fn sub_expr(&mut self, name_skipped: bool) -> Result<()> {
        let token = self.token()?;
        if !name_skipped && is_unary_operator(token) {
            self.next()?;
            self.sub_expr(false)?;
        } else if name_skipped {
            self.suffixed_tail(false)?;
        } else {
            self.simple_expr(false)?;
        }
        while self.is_binary_operator()? {
            self.next()?;
            self.sub_expr(false)?;
        }
        Ok(())
    }

    fn is_binary_operator(&mut self) -> Result<bool> {
        Ok(match self.token()? {
            LuaToken::Char(chars::LT) => {
                // `<tag` and `</` start markup
                !matches!(self.lexer.following_char(), Some(c) if c.is_alphabetic() || c == chars::SLASH)
            }
            LuaToken::Char('+' | '-' | '*' | '/' | '%' | '^' | '>') => true,
            LuaToken::Concat
            | LuaToken::Ne
            | LuaToken::Eq
            | LuaToken::Le
            | LuaToken::Ge
            | LuaToken::And
            | LuaToken::Or => true,
            _ => false,
        })
    }

    fn simple_expr(&mut self, tight: bool) -> Result<()> {
        match self.token()? {
            LuaToken::Number
            | LuaToken::String
            | LuaToken::Nil
            | LuaToken::True
            | LuaToken::False
            | LuaToken::Dots => self.next(),
            LuaToken::Char('{') => self.constructor(),
            LuaToken::Function => {
                self.next()?;
                self.body()
            }
            LuaToken::Char(chars::AT) => self.markup_expr(),
            _ => self.suffixed_expr(tight),
        }
    }

    fn primary_expr(&mut self) -> Result<()> {
        match self.token()? {
            LuaToken::Name => self.next(),
            LuaToken::Char('(') => {
                self.next()?;
                self.expr()?;
                self.check_and_next(LuaToken::Char(')'))
            }
            _ => Err(self.error_expected("expression")),
        }
    }

    fn suffixed_expr(&mut self, tight: bool) -> Result<()> {
        self.primary_expr()?;
        self.suffixed_tail(tight)
    }

    /// Field accesses, indexing and calls after a primary expression. In
    /// tight mode only `(`, `[`, `.name` and `:name` directly after the
    /// previous token continue the chain.
    fn suffixed_tail(&mut self, tight: bool) -> Result<()> {
        loop {
            if tight && !self.tight_suffix_follows() {
                return Ok(());
            }
            match self.token()? {
                LuaToken::Char('.') => {
                    self.next()?;
                    self.check_name()?;
                }
                LuaToken::Char('[') => {
                    self.next()?;
                    self.expr()?;
                    self.check_and_next(LuaToken::Char(']'))?;
                }
                LuaToken::Char(':') => {
                    self.next()?;
                    self.check_name()?;
                    self.func_args()?;
                }
                LuaToken::Char('(' | '{') | LuaToken::String => self.func_args()?,
                _ => return Ok(()),
            }
        }
    }

    fn tight_suffix_follows(&mut self) -> bool {
        match self.lexer.unscanned_char(self.input, 0) {
            Some('(' | chars::LBRACKET) => true,
            Some(chars::PERIOD | chars::COLON) => matches!(
                self.lexer.unscanned_char(self.input, 1),
                Some(c) if c.is_alphabetic() || c == chars::UNDERSCORE
            ),
            _ => false,
        }
    }

    fn func_args(&mut self) -> Result<()> {
        match self.token()? {
            LuaToken::Char('(') => {
                self.next()?;
                if !self.token()?.is_char(')') {
                    self.expr_list()?;
                }
                self.check_and_next(LuaToken::Char(')'))
            }
            LuaToken::Char('{') => self.constructor(),
            LuaToken::String => self.next(),
            _ => Err(self.error_expected("function arguments")),
        }
    }

    /// `{ fields }`
    fn constructor(&mut self) -> Result<()> {
        self.check_and_next(LuaToken::Char('{'))?;
        loop {
            if self.token()?.is_char('}') {
                break;
            }
            self.field()?;
            if !self.test_next(LuaToken::Char(','))? && !self.test_next(LuaToken::Char(';'))? {
                break;
            }
        }
        self.check_and_next(LuaToken::Char('}'))
    }

    fn field(&mut self) -> Result<()> {
        match self.token()? {
            LuaToken::Name => {
                self.next()?;
                if self.test_next(LuaToken::Char('='))? {
                    self.expr()
                } else {
                    self.sub_expr(true)
                }
            }
            LuaToken::Char('[') => {
                self.next()?;
                self.expr()?;
                self.check_and_next(LuaToken::Char(']'))?;
                self.check_and_next(LuaToken::Char('='))?;
                self.expr()
            }
            _ => self.expr(),
        }
    }

    /// Parameter list and body of a function, up to its `end`
    fn body(&mut self) -> Result<()> {
        self.check_and_next(LuaToken::Char('('))?;
        if !self.token()?.is_char(')') {
            loop {
                match self.token()? {
                    LuaToken::Name => self.next()?,
                    LuaToken::Dots => {
                        self.next()?;
                        break;
                    }
                    _ => return Err(self.error_expected("<name> or '...'")),
                }
                if !self.test_next(LuaToken::Char(','))? {
                    break;
                }
            }
        }
        self.check_and_next(LuaToken::Char(')'))?;
        self.block()?;
        self.check_and_next(LuaToken::End)
    }
}

fn is_unary_operator(token: LuaToken) -> bool {
    matches!(
        token,
        LuaToken::Not | LuaToken::Char('-') | LuaToken::Char('#')
    )
}
