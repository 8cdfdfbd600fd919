//! Property-based tests for the built-in escapers.

use gable_escape::{
    escape_css, escape_html, escape_html_attr, escape_js, escape_url, Escapers, Markup,
};
use proptest::prelude::*;

proptest! {
    /// HTML output never contains a raw markup character.
    #[test]
    fn html_output_has_no_raw_specials(input in any::<String>()) {
        let out = escape_html(&input);
        prop_assert!(!out.contains('<'));
        prop_assert!(!out.contains('>'));
        prop_assert!(!out.contains('"'));
        prop_assert!(!out.contains('\''));
    }

    /// JS output is plain ASCII from a small alphabet.
    #[test]
    fn js_output_alphabet(input in any::<String>()) {
        let out = escape_js(&input);
        prop_assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '_' | '\\' | '/')));
    }

    /// JS output contains nothing the HTML escaper would touch.
    #[test]
    fn html_pass_over_js_output_is_identity(input in any::<String>()) {
        let js = escape_js(&input);
        prop_assert_eq!(escape_html(&js), js);
    }

    /// CSS, URL and attribute output is pure ASCII.
    #[test]
    fn ascii_only_strategies(input in any::<String>()) {
        prop_assert!(escape_css(&input).is_ascii());
        prop_assert!(escape_url(&input).is_ascii());
        prop_assert!(escape_html_attr(&input).is_ascii());
    }

    /// Applying the same strategy twice is the same as applying it once.
    #[test]
    fn apply_is_idempotent_per_strategy(
        input in any::<String>(),
        strategy in prop::sample::select(vec!["html", "js", "css", "url", "html_attr"]),
    ) {
        let escapers = Escapers::new();
        let once = escapers.apply(&Markup::from(input.as_str()), strategy).unwrap();
        let twice = escapers.apply(&Markup::Safe(once.clone()), strategy).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Alphanumeric input passes through every strategy unchanged.
    #[test]
    fn alphanumeric_is_untouched(input in "[A-Za-z0-9]{0,32}") {
        prop_assert_eq!(escape_html(&input), input.clone());
        prop_assert_eq!(escape_js(&input), input.clone());
        prop_assert_eq!(escape_css(&input), input.clone());
        prop_assert_eq!(escape_url(&input), input.clone());
        prop_assert_eq!(escape_html_attr(&input), input);
    }
}
