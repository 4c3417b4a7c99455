//! HTML escaping for user-entered text
//!
//! Text is stored escaped so it can be rendered verbatim later. Fresh input
//! is escaped exactly once with [`escape_html`]. Text that is already in
//! stored form, such as an edited record read back from the list or an
//! imported backup, goes through [`normalize_escaped`] instead, which leaves
//! well-formed stored text unchanged and escapes anything newly typed.

const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Escape `&`, `<`, `>`, `"` and `'`
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }

    out
}

/// Reverse [`escape_html`]; other entities are left as written
pub fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Bring text that may already be escaped into stored form
pub fn normalize_escaped(input: &str) -> String {
    escape_html(&unescape_html(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(
            escape_html("<script>x</script>"),
            "&lt;script&gt;x&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escapes_quotes_and_ampersand() {
        assert_eq!(
            escape_html(r#"Tom & "Jerry" 'ok'"#),
            "Tom &amp; &quot;Jerry&quot; &#39;ok&#39;"
        );
    }

    #[test]
    fn test_entity_like_input_is_kept_literally() {
        let stored = escape_html("AT&amp;T");
        assert_eq!(stored, "AT&amp;amp;T");
        assert_eq!(unescape_html(&stored), "AT&amp;T");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = r#"a < b & "c" > 'd' &copy;"#;
        assert_eq!(unescape_html(&escape_html(raw)), raw);
        assert_eq!(unescape_html("&copy; & &amp"), "&copy; & &amp");
    }

    #[test]
    fn test_normalize_keeps_stored_text() {
        for raw in ["a < b & c", "AT&amp;T", "plain", "&lt;3"] {
            let stored = escape_html(raw);
            assert_eq!(normalize_escaped(&stored), stored);
        }
    }

    #[test]
    fn test_normalize_escapes_new_input() {
        assert_eq!(
            normalize_escaped("Tom &amp; Jerry & <b>more</b>"),
            "Tom &amp; Jerry &amp; &lt;b&gt;more&lt;/b&gt;"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_html("Elhamdülillah"), "Elhamdülillah");
        assert_eq!(normalize_escaped("Elhamdülillah"), "Elhamdülillah");
        assert_eq!(escape_html(""), "");
    }
}
