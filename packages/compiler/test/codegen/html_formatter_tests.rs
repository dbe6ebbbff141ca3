/**
 * HTML Formatter Tests
 *
 * Entity encoding for text, attributes and comments
 */

#[cfg(test)]
mod tests {
    use duel_compiler::codegen::HtmlFormatter;

    fn literal(value: &str) -> String {
        HtmlFormatter::new().encode_literal(value, true)
    }

    fn attribute(value: &str) -> String {
        let mut output = String::new();
        HtmlFormatter::new().write_attribute(&mut output, "a", Some(value));
        output
    }

    #[test]
    fn should_encode_markup_characters_in_text() {
        assert_eq!(literal("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn should_leave_quotes_alone_in_text() {
        assert_eq!(literal("say \"hi\" 'there'"), "say \"hi\" 'there'");
    }

    #[test]
    fn should_keep_whitespace_in_text() {
        assert_eq!(literal("a\tb\r\nc"), "a\tb\r\nc");
    }

    #[test]
    fn should_encode_control_characters() {
        assert_eq!(literal("\u{1}\u{7f}"), "&#x0001;&#x007F;");
    }

    #[test]
    fn should_prefer_named_entities() {
        assert_eq!(literal("\u{a0}\u{2026}\u{2122}"), "&nbsp;&hellip;&trade;");
    }

    #[test]
    fn should_encode_non_ascii_only_when_asked() {
        let formatter = HtmlFormatter::new();
        assert_eq!(formatter.encode_literal("\u{3b1}\u{3b2}", true), "&#x03B1;&#x03B2;");
        assert_eq!(formatter.encode_literal("\u{3b1}\u{3b2}", false), "\u{3b1}\u{3b2}");
        // C1 controls are never written raw
        assert_eq!(formatter.encode_literal("\u{90}", false), "&#x0090;");
    }

    #[test]
    fn should_encode_quotes_and_whitespace_in_attributes() {
        assert_eq!(attribute("x=\"1\"\n"), " a=\"x=&quot;1&quot;&#x000A;\"");
    }

    #[test]
    fn should_write_bare_attribute_names() {
        let mut output = String::new();
        HtmlFormatter::new().write_attribute(&mut output, "disabled", None);
        assert_eq!(output, " disabled");
    }

    #[test]
    fn should_not_let_comments_close_early() {
        let mut output = String::new();
        HtmlFormatter::new().write_comment(&mut output, " a --> b <c> ");
        assert_eq!(output, "<!-- a --&gt; b <c> -->");
    }

    #[test]
    fn should_trim_doctype() {
        let mut output = String::new();
        HtmlFormatter::new().write_doctype(&mut output, "  html ");
        assert_eq!(output, "<!DOCTYPE html>");
    }

    #[test]
    fn should_write_element_tags() {
        let formatter = HtmlFormatter::new();
        let mut output = String::new();
        formatter.write_open_element_begin_tag(&mut output, "img");
        formatter.write_attribute(&mut output, "alt", Some("A & B"));
        formatter.write_close_element_void_tag(&mut output);
        formatter.write_open_element_begin_tag(&mut output, "p");
        formatter.write_close_element_begin_tag(&mut output);
        formatter.write_literal(&mut output, "<x>", true);
        formatter.write_element_end_tag(&mut output, "p");
        assert_eq!(output, "<img alt=\"A &amp; B\" /><p>&lt;x&gt;</p>");
    }
}
