/**
 * Lua Lexer Tests
 *
 * Tokens, comments and the accept/detach protocol on top of the template
 * cursor
 */

#[cfg(test)]
mod tests {
    use lua_markup_compiler::expression_parser::{LuaLexer, LuaToken};
    use lua_markup_compiler::ml_parser::{TokenCursor, TokenSequence};
    use lua_markup_compiler::{ErrorKind, Result};

    /// Accept every token; returns the tokens and the accepted text
    fn lex(source: &str) -> Result<(Vec<LuaToken>, String)> {
        let mut input = TokenCursor::for_str(source);
        let mut lexer = LuaLexer::new(&mut input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.current(&mut input)?;
            if token == LuaToken::Eos {
                break;
            }
            tokens.push(token);
            lexer.advance(&mut input)?;
        }
        Ok((tokens, lexer.take_output()))
    }

    fn tokens(source: &str) -> Vec<LuaToken> {
        lex(source).unwrap().0
    }

    mod tokens {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_lex_multi_character_operators() {
            use LuaToken::*;
            let source = "a == b ~= c <= d >= e :: f .. g ... h";
            let (tokens, text) = lex(source).unwrap();
            assert_eq!(
                tokens,
                vec![
                    Name, Eq, Name, Ne, Name, Le, Name, Ge, Name, DbColon, Name, Concat, Name,
                    Dots, Name,
                ]
            );
            assert_eq!(text, source);
        }

        #[test]
        fn should_lex_single_character_operators() {
            assert_eq!(
                tokens("#t + -x < y > z"),
                vec![
                    LuaToken::Char('#'),
                    LuaToken::Name,
                    LuaToken::Char('+'),
                    LuaToken::Char('-'),
                    LuaToken::Name,
                    LuaToken::Char('<'),
                    LuaToken::Name,
                    LuaToken::Char('>'),
                    LuaToken::Name,
                ]
            );
        }

        #[test]
        fn should_lex_numerals() {
            let source = "3 3.0 3.1416 314.16e-2 0.31416E1 0xff 0x0.1E 0xA23p-4 0X1P+2 .5";
            let (tokens, text) = lex(source).unwrap();
            assert_eq!(tokens, vec![LuaToken::Number; 10]);
            assert_eq!(text, source);
        }

        #[test]
        fn should_lex_strings_with_escapes_and_long_brackets() {
            let source = r#""a\"b" 'c\'d' [[x]] [==[y]]z]==]"#;
            let (tokens, text) = lex(source).unwrap();
            assert_eq!(tokens, vec![LuaToken::String; 4]);
            assert_eq!(text, source);
        }

        #[test]
        fn should_close_long_bracket_only_at_matching_level() {
            assert_eq!(
                lex("[=[a]]=]").unwrap(),
                (vec![LuaToken::String], "[=[a]]=]".to_string())
            );
            assert_eq!(
                lex("[==[a]=]]==] b").unwrap(),
                (vec![LuaToken::String, LuaToken::Name], "[==[a]=]]==] b".to_string())
            );
        }

        #[test]
        fn should_recognise_every_keyword() {
            use LuaToken::*;
            assert_eq!(
                tokens(
                    "and break do else elseif end false for function goto if in local nil \
                     not or repeat return then true until while"
                ),
                vec![
                    And, Break, Do, Else, Elseif, End, False, For, Function, Goto, If, In, Local,
                    Nil, Not, Or, Repeat, Return, Then, True, Until, While,
                ]
            );
        }

        #[test]
        fn should_keep_name_text() {
            let mut input = TokenCursor::for_str("foo_bar2 x");
            let mut lexer = LuaLexer::new(&mut input);
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Name);
            assert_eq!(lexer.name(), "foo_bar2");
        }

        #[test]
        fn should_display_tokens_for_messages() {
            assert_eq!(LuaToken::Then.to_string(), "'then'");
            assert_eq!(LuaToken::Char('<').to_string(), "'<'");
            assert_eq!(LuaToken::Concat.to_string(), "'..'");
            assert_eq!(LuaToken::Name.to_string(), "<name>");
            assert_eq!(LuaToken::Eos.to_string(), "<eof>");
        }

        #[test]
        fn should_look_up_keywords() {
            assert_eq!(LuaToken::keyword("while"), Some(LuaToken::While));
            assert_eq!(LuaToken::keyword("goto"), Some(LuaToken::Goto));
            assert_eq!(LuaToken::keyword("self"), None);
        }
    }

    mod comments {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_drop_line_and_block_comments() {
            let (tokens, text) = lex("a -- line\nb --[==[ block\n ]==] c").unwrap();
            assert_eq!(tokens, vec![LuaToken::Name; 3]);
            assert_eq!(text, "a\nb c");
        }

        #[test]
        fn should_not_copy_trailing_whitespace() {
            let (_, text) = lex("x   ").unwrap();
            assert_eq!(text, "x");
        }

        #[test]
        fn should_close_block_comment_only_at_matching_level() {
            assert_eq!(
                lex("--[=[ c ]]=] x").unwrap(),
                (vec![LuaToken::Name], " x".to_string())
            );
        }
    }

    mod errors {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_report_unterminated_strings() {
            assert_eq!(
                lex("'abc").unwrap_err().kind(),
                ErrorKind::UnexpectedEndOfInput
            );
            assert_eq!(
                lex("[==[ abc").unwrap_err().kind(),
                ErrorKind::UnexpectedEndOfInput
            );
            assert_eq!(
                lex("--[[ abc").unwrap_err().kind(),
                ErrorKind::UnexpectedEndOfInput
            );
        }

        #[test]
        fn should_reject_broken_long_bracket() {
            assert_eq!(lex("[=x").unwrap_err().kind(), ErrorKind::GrammarViolation);
        }

        #[test]
        fn should_reject_newline_in_string() {
            assert_eq!(
                lex("\"a\nb\"").unwrap_err().kind(),
                ErrorKind::GrammarViolation
            );
        }
    }

    mod cursor_protocol {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_leave_cursor_on_token_after_detach() {
            let mut input = TokenCursor::for_str("  x");
            let mut lexer = LuaLexer::new(&mut input);
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Name);
            lexer.detach(&mut input).unwrap();
            assert_eq!(input.current().content, "x");
            assert_eq!(lexer.take_output(), "  ");
        }

        #[test]
        fn should_stop_at_peek_limit() {
            let mut input = TokenCursor::for_str("ab cd");
            input.set_peek_limit(1).unwrap();
            let mut lexer = LuaLexer::new(&mut input);
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Name);
            lexer.advance(&mut input).unwrap();
            assert!(lexer.fence_reached());
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Eos);
            assert_eq!(input.current().content, "ab");
            assert_eq!(lexer.take_output(), "ab");

            let err = lexer.advance(&mut input).unwrap_err();
            assert!(err.is_internal());
        }

        #[test]
        fn should_expose_character_after_current_token() {
            let mut input = TokenCursor::for_str("a <b");
            let mut lexer = LuaLexer::new(&mut input);
            lexer.advance(&mut input).unwrap();
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Char('<'));
            assert_eq!(lexer.following_char(), Some('b'));
        }

        #[test]
        fn should_peek_unscanned_input() {
            let mut input = TokenCursor::for_str("x.y");
            let mut lexer = LuaLexer::new(&mut input);
            lexer.advance(&mut input).unwrap();
            assert_eq!(lexer.unscanned_char(&mut input, 0), Some('.'));
            assert_eq!(lexer.unscanned_char(&mut input, 1), Some('y'));
            assert_eq!(lexer.unscanned_char(&mut input, 2), None);

            lexer.current(&mut input).unwrap();
            assert_eq!(lexer.unscanned_char(&mut input, 0), None);
        }

        #[test]
        fn should_report_pending_whitespace() {
            let mut input = TokenCursor::for_str("a  ");
            let mut lexer = LuaLexer::new(&mut input);
            lexer.advance(&mut input).unwrap();
            assert_eq!(lexer.current(&mut input).unwrap(), LuaToken::Eos);
            assert!(lexer.has_pending_text());
        }
    }
}
