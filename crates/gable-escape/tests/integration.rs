use gable_escape::{escape_html, escape_js, EscapeError, Escapers, Markup, SafeString};

#[test]
fn test_js_then_html_differs_from_html_alone() {
    let escapers = Escapers::new();
    let value = r#"say "hi""#;

    let js = escapers.apply(&Markup::from(value), "js").unwrap();
    let js_then_html = escapers.apply(&Markup::Safe(js), "html").unwrap();
    let html_only = escapers.apply(&Markup::from(value), "html").unwrap();

    assert_eq!(js_then_html.as_str(), "say\\u0020\\u0022hi\\u0022");
    assert_eq!(html_only.as_str(), "say &quot;hi&quot;");
    assert_ne!(js_then_html, html_only);
}

#[test]
fn test_double_escaping_applies_both_tables() {
    let escapers = Escapers::new();

    // First pass html, second pass js: the entity produced by the first pass
    // is itself escaped by the second.
    let html = escapers.apply(&Markup::from("a<b"), "html").unwrap();
    assert_eq!(html.as_str(), "a&lt;b");
    let js = escapers.apply(&Markup::Safe(html), "js").unwrap();
    assert_eq!(js.as_str(), "a\\u0026lt\\u003Bb");
}

#[test]
fn test_trusted_markup_is_not_reescaped() {
    let escapers = Escapers::new();
    let link = SafeString::new("html", r#"<a href="classes/A-B.html">B</a>"#);
    let out = escapers.apply(&Markup::Safe(link.clone()), "html").unwrap();
    assert_eq!(out.as_str(), link.as_str());
}

#[test]
fn test_unknown_strategy_on_apply() {
    let escapers = Escapers::new();
    let result = escapers.apply(&Markup::from("x"), "rtf");
    assert!(matches!(result, Err(EscapeError::UnknownStrategy(name)) if name == "rtf"));
}

#[test]
fn test_free_functions_match_registry() {
    let escapers = Escapers::new();
    let sample = "Fuse.js <3 'search' & \"index\"\n";
    assert_eq!(escapers.escape(sample, "html").unwrap(), escape_html(sample));
    assert_eq!(escapers.escape(sample, "js").unwrap(), escape_js(sample));
}
