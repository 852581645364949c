/**
 * Token Cursor Tests
 *
 * Lookahead, splitting and peek fences over the template tokenizer
 */

#[cfg(test)]
mod tests {
    use lua_markup_compiler::ml_parser::{TokenCursor, TokenSequence, TokenType};
    use lua_markup_compiler::ParseLocation;

    fn drain(cursor: &mut TokenCursor<'_>) -> Vec<(TokenType, String)> {
        let mut tokens = Vec::new();
        loop {
            let token = cursor.current();
            tokens.push((token.token_type, token.content.to_string()));
            if !cursor.advance() {
                break;
            }
        }
        tokens
    }

    mod end_token {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_produce_exactly_one_end_token() {
            let mut cursor = TokenCursor::for_str("<p>hi</p>");
            let tokens = drain(&mut cursor);
            let ends = tokens.iter().filter(|(t, _)| *t == TokenType::End).count();
            assert_eq!(ends, 1);
            assert_eq!(tokens.last().map(|(t, _)| *t), Some(TokenType::End));
        }

        #[test]
        fn should_produce_one_end_token_after_peeking_past_it() {
            let mut cursor = TokenCursor::for_str("a b");
            assert!(cursor.try_peek(10).is_none());
            let tokens = drain(&mut cursor);
            assert_eq!(
                tokens,
                vec![
                    (TokenType::Text, "a".to_string()),
                    (TokenType::Whitespace, " ".to_string()),
                    (TokenType::Text, "b".to_string()),
                    (TokenType::End, String::new()),
                ]
            );
        }

        #[test]
        fn should_start_at_end_for_empty_input() {
            let mut cursor = TokenCursor::for_str("");
            assert!(cursor.at_end());
            assert!(!cursor.advance());
        }
    }

    mod split {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_split_a_peeked_token() {
            let mut cursor = TokenCursor::for_str("x <=/ y");
            assert_eq!(cursor.try_peek(2).map(|t| t.content.to_string()), Some("<=/".to_string()));
            cursor.split(2, 2).unwrap();
            assert_eq!(cursor.try_peek(2).map(|t| t.content.to_string()), Some("<=".to_string()));
            assert_eq!(cursor.try_peek(3).map(|t| t.content.to_string()), Some("/".to_string()));
            assert_eq!(cursor.current().content, "x");
        }

        #[test]
        fn should_keep_locations_of_split_parts() {
            let mut cursor = TokenCursor::for_str("a\n<<b");
            cursor.ensure_advance().unwrap();
            cursor.ensure_advance().unwrap();
            cursor.split_current(1).unwrap();
            assert_eq!(cursor.location(), ParseLocation::new(2, 1, 0));
            cursor.ensure_advance().unwrap();
            assert_eq!(cursor.current().content, "<");
            assert_eq!(cursor.location(), ParseLocation::new(3, 1, 1));
        }

        #[test]
        fn should_reject_split_before_peek() {
            let mut cursor = TokenCursor::for_str("a b c");
            let err = cursor.split(3, 1).unwrap_err();
            assert!(err.is_internal());
        }

        #[test]
        fn should_reject_split_inside_a_character() {
            let mut cursor = TokenCursor::for_str("äb");
            assert!(cursor.split_current(1).unwrap_err().is_internal());
            cursor.split_current(2).unwrap();
            assert_eq!(cursor.current().content, "ä");
        }
    }

    mod peek_limit {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_hide_tokens_behind_the_fence() {
            let mut cursor = TokenCursor::for_str("a b c");
            cursor.set_peek_limit(2).unwrap();
            assert!(cursor.try_peek(1).is_some());
            assert!(cursor.try_peek(2).is_none());
            assert!(cursor.advance());
            assert!(!cursor.advance());
            assert_eq!(cursor.current().content, " ");
            cursor.clear_peek_limit().unwrap();
            assert!(cursor.advance());
            assert_eq!(cursor.current().content, "b");
        }

        #[test]
        fn should_grow_when_a_visible_token_is_split() {
            let mut cursor = TokenCursor::for_str("ab\"c");
            cursor.set_peek_limit(2).unwrap();
            cursor.split_current(1).unwrap();
            assert_eq!(cursor.try_peek(1).map(|t| t.content.to_string()), Some("b".to_string()));
            assert_eq!(cursor.try_peek(2).map(|t| t.content.to_string()), Some("\"".to_string()));
            assert!(cursor.try_peek(3).is_none());
            assert!(cursor.has_peek_limit());
        }

        #[test]
        fn should_reject_split_behind_the_fence() {
            let mut cursor = TokenCursor::for_str("a b");
            cursor.set_peek_limit(1).unwrap();
            assert!(cursor.split(1, 0).unwrap_err().is_internal());
        }
    }
}
