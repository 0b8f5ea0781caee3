/**
 * Digest Tests
 *
 * Identifier shape, stability and collision behavior.
 */

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use loco_compiler::i18n::digest::{fingerprint, generate, is_valid_id, ID_LEN};
    use loco_compiler::i18n::unit::{ContextPath, ContextScope};

    fn context(component: &str, file: &str) -> ContextPath {
        ContextPath {
            scope: ContextScope::Component(component.to_string()),
            file: file.to_string(),
        }
    }

    #[test]
    fn should_emit_twelve_alphanumeric_chars() {
        let id = generate("Welcome to our site", &context("Home", "src/home.cmp"));
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| b.is_ascii_alphanumeric()), "{id}");
    }

    #[test]
    fn should_be_stable_across_invocations() {
        let ctx = context("Hero", "src/hero.cmp");
        let ids: HashSet<String> = (0..100).map(|_| generate("Hello world", &ctx)).collect();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn should_separate_identical_text_in_different_contexts() {
        let a = generate("Submit", &context("LoginForm", "src/login.cmp"));
        let b = generate("Submit", &context("SignupForm", "src/signup.cmp"));
        let c = generate("Submit", &context("LoginForm", "src/other/login.cmp"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn should_change_when_content_changes() {
        let ctx = context("Hero", "src/hero.cmp");
        assert_ne!(generate("Hello", &ctx), generate("Hello!", &ctx));
    }

    #[test]
    fn should_avoid_collisions_over_many_units() {
        let mut ids = HashSet::new();
        for component in 0..100 {
            let ctx = context(&format!("Component{component}"), "src/app.cmp");
            for text in 0..100 {
                ids.insert(generate(&format!("Message number {text}"), &ctx));
            }
        }
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn should_validate_identifier_shape() {
        assert!(is_valid_id("A0b1C2d3E4f5"));
        assert!(!is_valid_id("short"));
        assert!(!is_valid_id("ABC-DEF-GHIJ"));
        assert!(!is_valid_id("averylongidentifier"));
    }

    #[test]
    fn should_never_fingerprint_to_zero() {
        assert_ne!(fingerprint(""), 0);
        assert_ne!(fingerprint("a"), 0);
    }
}
