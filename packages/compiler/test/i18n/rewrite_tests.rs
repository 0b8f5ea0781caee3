/**
 * Rewrite Tests
 *
 * Tree rewriting: lookup calls, hook threading, markers, overrides and
 * idempotent re-runs.
 */

#[cfg(test)]
mod tests {
    use loco_compiler::config::CompilerConfig;
    use loco_compiler::i18n::rewrite::{component_name, rewrite_file, RewriteOutcome};
    use loco_compiler::i18n::unit::ContextScope;
    use loco_compiler::ml_parser::{serialize, Parser};

    fn compile(source: &str, url: &str, config: &CompilerConfig) -> (String, RewriteOutcome) {
        let parse = Parser::new().parse(source, url);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let outcome = rewrite_file(parse, config);
        let (output, _) = serialize(&outcome.nodes, url);
        (output, outcome)
    }

    fn compile_default(source: &str) -> (String, RewriteOutcome) {
        compile(source, "src/home.cmp", &CompilerConfig::default())
    }

    #[test]
    fn should_rewrite_a_heading_to_a_lookup_call() {
        let (output, outcome) = compile_default("<h1>Welcome to our site</h1>");
        assert_eq!(outcome.units.len(), 1);
        let id = &outcome.units[0].id;
        assert_eq!(id.len(), 12);
        assert!(output.contains(&format!("<h1>{{t(\"{id}\", \"Welcome to our site\")}}</h1>")));
    }

    #[test]
    fn should_inject_the_hook_with_all_ids() {
        let (output, outcome) = compile_default("<h1>Hello</h1>\n<p>Goodbye</p>");
        assert_eq!(outcome.units.len(), 2);
        let first_line = output.lines().next().unwrap_or("");
        assert!(first_line.starts_with("@let t = useMessages(["), "{output}");
        for unit in &outcome.units {
            assert!(first_line.contains(&unit.id));
        }
    }

    #[test]
    fn should_use_the_awaited_form_for_server_files() {
        let (output, _) = compile(
            "<h1>Hello</h1>",
            "src/page.server.cmp",
            &CompilerConfig::default(),
        );
        assert!(output.starts_with("@let t = await loadMessages(["), "{output}");
    }

    #[test]
    fn should_use_the_awaited_form_when_metadata_fields_were_extracted() {
        let source = "<metadata>{\"title\": \"Our site\"}</metadata>\n<h1>Hello</h1>";
        let (output, outcome) = compile_default(source);
        assert!(output.starts_with("@let t = await loadMessages(["), "{output}");
        assert!(output.contains("$t"));
        assert_eq!(outcome.units.len(), 2);
    }

    #[test]
    fn should_emit_placeholder_bindings() {
        let (output, _) = compile_default("<p>Hello <b>world</b>, {name}!</p>");
        assert!(
            output.contains("\"Hello <b0>world</b0>, {name}!\", { b0: <b />, name }"),
            "{output}"
        );
    }

    #[test]
    fn should_give_nested_component_content_its_own_unit() {
        let (output, outcome) = compile_default("<p>Click <Button>Buy now</Button> today</p>");
        assert_eq!(outcome.units.len(), 2);
        let nested = &outcome.units[0];
        let parent = &outcome.units[1];
        assert_eq!(nested.unit.content.fallback_text(), "Buy now");
        assert_eq!(parent.unit.content.fallback_text(), "Click <button0/> today");
        // The slot binding carries the rewritten component markup.
        assert!(
            output.contains(&format!(
                "button0: <Button>{{t(\"{}\", \"Buy now\")}}</Button>",
                nested.id
            )),
            "{output}"
        );
    }

    #[test]
    fn should_give_nested_structural_content_its_own_unit() {
        let (output, outcome) = compile_default("<p>Hello <div>world</div></p>");
        assert_eq!(outcome.units.len(), 2);
        assert_eq!(outcome.units[0].unit.content.fallback_text(), "world");
        assert_eq!(
            outcome.units[1].unit.content.fallback_text(),
            "Hello <div0/>"
        );
        assert!(output.contains("div0: <div>{t("), "{output}");
    }

    #[test]
    fn should_rewrite_translatable_attributes() {
        let (output, outcome) = compile_default("<img src=\"/a.png\" alt=\"A nice view\">");
        assert_eq!(outcome.units.len(), 1);
        let id = &outcome.units[0].id;
        assert!(output.contains("src=\"/a.png\""));
        assert!(output.contains(&format!("alt={{t(\"{id}\", \"A nice view\")}}")));
    }

    #[test]
    fn should_be_idempotent() {
        let (first, outcome) = compile_default("<h1>Welcome to our site</h1>");
        assert!(outcome.changed);
        let (second, re_outcome) = compile_default(&first);
        assert!(!re_outcome.changed);
        assert!(re_outcome.units.is_empty());
        assert_eq!(second, first);
    }

    #[test]
    fn should_respect_the_explicit_marker() {
        let config = CompilerConfig {
            use_explicit_marker: true,
            ..CompilerConfig::default()
        };
        let (output, outcome) = compile("<h1>Hello</h1>", "src/home.cmp", &config);
        assert!(!outcome.changed);
        assert!(outcome.units.is_empty());
        assert_eq!(output, "<h1>Hello</h1>");

        let (output, outcome) = compile("<!-- i18n -->\n<h1>Hello</h1>", "src/home.cmp", &config);
        assert_eq!(outcome.units.len(), 1);
        assert!(!output.contains("<!--"), "{output}");
    }

    #[test]
    fn should_retain_hook_ids_after_the_marker_is_consumed() {
        let config = CompilerConfig {
            use_explicit_marker: true,
            ..CompilerConfig::default()
        };
        let (first, outcome) = compile("<!-- i18n -->\n<h1>Hello</h1>", "src/home.cmp", &config);
        assert_eq!(outcome.units.len(), 1);
        let id = outcome.units[0].id.clone();

        // The rewritten output lost its marker; its hook ids must survive
        // the gate so re-runs keep the store entries live.
        let (second, re_outcome) = compile(&first, "src/home.cmp", &config);
        assert!(!re_outcome.changed);
        assert!(re_outcome.units.is_empty());
        assert_eq!(re_outcome.retained_ids, vec![id]);
        assert_eq!(second, first);
    }

    #[test]
    fn should_strip_the_skip_attribute_and_leave_content_alone() {
        let (output, outcome) = compile_default("<p data-i18n-skip>Secret text</p>");
        assert!(outcome.units.is_empty());
        assert!(output.contains("<p>Secret text</p>"), "{output}");
    }

    #[test]
    fn should_keep_directive_attributes_out_of_slot_bindings() {
        let (output, outcome) =
            compile_default("<p>Welcome to <span data-i18n-skip>Acme</span> today</p>");
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(
            outcome.units[0].unit.content.fallback_text(),
            "Welcome to <span0/> today"
        );
        assert!(output.contains("span0: <span>Acme</span>"), "{output}");
        assert!(!output.contains("data-i18n-skip"), "{output}");
    }

    #[test]
    fn should_strip_overrides_from_non_translatable_elements() {
        let (output, outcome) =
            compile_default(r#"<code i18n-overrides='{"de": "x"}'>ls -la</code>"#);
        assert!(outcome.units.is_empty());
        assert!(outcome.changed);
        assert!(output.contains("<code>ls -la</code>"), "{output}");
        assert!(!output.contains("i18n-overrides"), "{output}");
    }

    #[test]
    fn should_keep_translate_no_and_skip_extraction() {
        let (output, outcome) = compile_default("<p translate=\"no\">BrandName</p>");
        assert!(outcome.units.is_empty());
        assert!(!outcome.changed);
        assert!(output.contains("translate=\"no\""));
    }

    #[test]
    fn should_extract_overrides_and_strip_the_attribute() {
        let (output, outcome) =
            compile_default(r#"<p i18n-overrides='{"de": "Geheim"}'>Secret</p>"#);
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(
            outcome.units[0].unit.overrides.get("de").map(String::as_str),
            Some("Geheim")
        );
        assert!(!output.contains("i18n-overrides"), "{output}");
    }

    #[test]
    fn should_fall_back_to_ordinal_context_for_invalid_stems() {
        assert_eq!(component_name("src/hero-banner.cmp"), Some("HeroBanner".to_string()));
        assert_eq!(component_name("src/[slug].cmp"), None);

        let (_, outcome) = compile("<h1>Hello</h1>", "src/[slug].cmp", &CompilerConfig::default());
        assert_eq!(outcome.units.len(), 1);
        assert!(matches!(
            outcome.units[0].unit.context.scope,
            ContextScope::Ordinal(0)
        ));
    }

    #[test]
    fn should_warn_on_malformed_metadata_json() {
        let (output, outcome) = compile_default("<metadata>{not json}</metadata>");
        assert!(outcome.units.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].msg.contains("metadata"));
        assert!(output.contains("{not json}"));
    }

    #[test]
    fn should_recurse_past_wrappers_without_direct_text() {
        let (output, outcome) = compile_default("<div>\n  <p>Hello</p>\n  <p>World</p>\n</div>");
        assert_eq!(outcome.units.len(), 2);
        assert!(output.contains("<div>"), "{output}");
    }
}
