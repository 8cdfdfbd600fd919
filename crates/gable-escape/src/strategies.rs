//! Built-in escaping strategies.
//!
//! Each function maps raw text to text that is safe to embed in one output
//! context. The substitution tables are fixed; changing them changes
//! rendered output byte for byte.

/// Strategy name for HTML text and quoted attribute values.
pub const HTML: &str = "html";
/// Strategy name for JavaScript string literals.
pub const JS: &str = "js";
/// Strategy name for CSS identifiers and strings.
pub const CSS: &str = "css";
/// Strategy name for URL path segments and query values.
pub const URL: &str = "url";
/// Strategy name for unquoted HTML attribute values.
pub const HTML_ATTR: &str = "html_attr";

/// Escapes the five HTML special characters.
///
/// ```
/// assert_eq!(gable_escape::escape_html(r#"<a href="x">"#), "&lt;a href=&quot;x&quot;&gt;");
/// ```
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text for a JavaScript string literal.
///
/// Everything outside `[A-Za-z0-9,._]` is escaped, so the result is also
/// free of HTML special characters: quotes become `\u0022`/`\u0027`,
/// never `\"`.
///
/// ```
/// assert_eq!(gable_escape::escape_js(r"A\B"), r"A\\B");
/// assert_eq!(gable_escape::escape_js("a b"), r"a\u0020b");
/// ```
pub fn escape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '_') {
            out.push(c);
            continue;
        }
        match c {
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    out
}

/// Escapes text for CSS: every non-alphanumeric character becomes a hex
/// escape terminated by a space.
pub fn escape_css(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push_str(&format!("\\{:X} ", c as u32));
        }
    }
    out
}

/// Percent-encodes every byte outside the RFC 3986 unreserved set.
pub fn escape_url(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Escapes text for an unquoted HTML attribute value.
pub fn escape_html_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '-' | '_') {
            out.push(c);
            continue;
        }
        let code = c as u32;
        // Only single-byte controls are replaced; C1 controls are encoded like
        // any other non-ASCII char.
        if (code <= 0x1f && !matches!(c, '\t' | '\n' | '\r')) || code == 0x7f {
            out.push_str("&#xFFFD;");
            continue;
        }
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ if c.is_ascii() => out.push_str(&format!("&#x{:02X};", code)),
            _ => out.push_str(&format!("&#x{:04X};", code)),
        }
    }
    out
}
