/**
 * Lexer Tests
 *
 * Token-level tests for the component markup tokenizer.
 */

#[cfg(test)]
mod tests {
    use loco_compiler::ml_parser::lexer::tokenize;
    use loco_compiler::ml_parser::tokens::TokenType;
    use loco_compiler::parse_util::SourceFile;

    fn lex(source: &str) -> Vec<(TokenType, String)> {
        let result = tokenize(SourceFile::new("test.cmp", source));
        assert!(
            result.errors.is_empty(),
            "unexpected lex errors: {:?}",
            result.errors
        );
        humanize(source)
    }

    fn humanize(source: &str) -> Vec<(TokenType, String)> {
        tokenize(SourceFile::new("test.cmp", source))
            .tokens
            .into_iter()
            .map(|t| (t.kind, t.parts.join("")))
            .collect()
    }

    #[test]
    fn should_tokenize_text_and_interpolation() {
        assert_eq!(
            lex("Hello {name}!"),
            vec![
                (TokenType::Text, "Hello ".to_string()),
                (TokenType::Interpolation, "{name}".to_string()),
                (TokenType::Text, "!".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_tokenize_open_tag_with_attributes() {
        assert_eq!(
            lex(r#"<img src="/a.png" alt="A view">"#),
            vec![
                (TokenType::TagOpenStart, "img".to_string()),
                (TokenType::AttrName, "src".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::AttrValueText, "/a.png".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::AttrName, "alt".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::AttrValueText, "A view".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::TagOpenEnd, String::new()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_tokenize_brace_valued_attribute() {
        assert_eq!(
            lex("<p title={greeting()}></p>"),
            vec![
                (TokenType::TagOpenStart, "p".to_string()),
                (TokenType::AttrName, "title".to_string()),
                (TokenType::AttrValueInterpolation, "{greeting()}".to_string()),
                (TokenType::TagOpenEnd, String::new()),
                (TokenType::TagClose, "p".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_tokenize_interpolation_inside_quoted_attribute() {
        assert_eq!(
            lex(r#"<p title="Hi {name}!"></p>"#),
            vec![
                (TokenType::TagOpenStart, "p".to_string()),
                (TokenType::AttrName, "title".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::AttrValueText, "Hi ".to_string()),
                (TokenType::AttrValueInterpolation, "{name}".to_string()),
                (TokenType::AttrValueText, "!".to_string()),
                (TokenType::AttrQuote, "\"".to_string()),
                (TokenType::TagOpenEnd, String::new()),
                (TokenType::TagClose, "p".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_balance_braces_in_interpolations() {
        let tokens = lex("{fn({a: 1})}");
        assert_eq!(tokens[0], (TokenType::Interpolation, "{fn({a: 1})}".to_string()));
    }

    #[test]
    fn should_ignore_braces_inside_quoted_strings() {
        let tokens = lex(r#"{format("}")}"#);
        assert_eq!(
            tokens[0],
            (TokenType::Interpolation, "{format(\"}\")}".to_string())
        );
    }

    #[test]
    fn should_tokenize_raw_text_elements_verbatim() {
        assert_eq!(
            lex("<script>if (a < b) { go(); }</script>"),
            vec![
                (TokenType::TagOpenStart, "script".to_string()),
                (TokenType::TagOpenEnd, String::new()),
                (TokenType::RawText, "if (a < b) { go(); }".to_string()),
                (TokenType::TagClose, "script".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_tokenize_comments() {
        assert_eq!(
            lex("<!-- i18n -->"),
            vec![
                (TokenType::Comment, " i18n ".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_tokenize_let_declarations() {
        assert_eq!(
            lex("@let t = useMessages([\"abc\"]);"),
            vec![
                (TokenType::LetStart, "t".to_string()),
                (TokenType::LetValue, "useMessages([\"abc\"])".to_string()),
                (TokenType::LetEnd, String::new()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_not_stop_let_value_at_semicolon_inside_string() {
        let tokens = lex("@let t = join(\";\");");
        assert_eq!(tokens[1], (TokenType::LetValue, "join(\";\")".to_string()));
    }

    #[test]
    fn should_keep_component_tag_case() {
        let tokens = lex("<HeroBanner />");
        assert_eq!(tokens[0], (TokenType::TagOpenStart, "HeroBanner".to_string()));
        assert_eq!(tokens[1].0, TokenType::TagOpenEndVoid);
    }

    #[test]
    fn should_treat_lone_lt_as_text() {
        let tokens = lex("a < b");
        assert_eq!(
            tokens,
            vec![
                (TokenType::Text, "a < b".to_string()),
                (TokenType::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn should_report_unterminated_interpolation() {
        let result = tokenize(SourceFile::new("test.cmp", "{oops"));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].msg.contains("Unterminated interpolation"));
    }
}
