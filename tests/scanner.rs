#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::reporter::Reporter;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn two_char_operators_win_over_prefixes() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "and class else false fun for if nil or print return super this true var while _x1 orchid",
            &[
                (TokenType::AND, "and"),
                (TokenType::CLASS, "class"),
                (TokenType::ELSE, "else"),
                (TokenType::FALSE, "false"),
                (TokenType::FUN, "fun"),
                (TokenType::FOR, "for"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::OR, "or"),
                (TokenType::PRINT, "print"),
                (TokenType::RETURN, "return"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let tokens: Vec<Token> = Scanner::new("a // ignored ( )\nb")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn number_literals_match_float_parsing() {
        for lexeme in ["0", "7", "123", "3.14", "0.5", "1234567.890", "10.0"] {
            let tokens: Vec<Token> = Scanner::new(lexeme).filter_map(Result::ok).collect();

            match tokens[0].token_type {
                TokenType::NUMBER(n) => assert_eq!(n, lexeme.parse::<f64>().unwrap()),
                ref other => panic!("expected number for {}, got {:?}", lexeme, other),
            }
        }
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        assert_token_sequence(
            "12.",
            &[
                (TokenType::NUMBER(0.0), "12"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn strings_span_lines() {
        let tokens: Vec<Token> = Scanner::new("\"one\ntwo\" x")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "one\ntwo"));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_is_reported_and_scanning_ends() {
        let results: Vec<_> = Scanner::new("var a = \"oops").collect();

        assert_eq!(results.len(), 5);
        assert!(matches!(
            &results[3],
            Err(LoxError::Lex { message, line: 1, .. }) if message == "Unterminated string."
        ));
        assert!(matches!(&results[4], Ok(t) if t.is_eof()));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error('$'), LEFT_PAREN, error('#'), EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at column 3: Unexpected character: $".to_string(),
                "[line 1] Error at column 5: Unexpected character: #".to_string(),
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn multibyte_character_is_one_error() {
        let mut reporter = Reporter::silent();
        let tokens = scan("a é b", &mut reporter);

        assert_eq!(reporter.diagnostics().len(), 1);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
    }

    #[test]
    fn scan_always_ends_with_single_eof() {
        let mut reporter = Reporter::silent();

        for source in ["", "print 1;", "// only a comment", "x\n\n\n"] {
            let tokens = scan(source, &mut reporter);

            assert!(tokens.last().unwrap().is_eof());
            assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
        }

        assert!(!reporter.had_error());
    }

    #[test]
    fn display_matches_tokenize_format() {
        let tokens: Vec<String> = Scanner::new("var x = 3; \"hi\" 2.5")
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            tokens,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"hi\" hi",
                "NUMBER 2.5 2.5",
                "EOF  null",
            ]
        );
    }
}
