//! HTML Formatter
//!
//! Writes markup fragments into a literal buffer. Holds no state of its own,
//! so one formatter may serve any number of buffers.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodeMode {
    Text,
    Attribute,
    /// Angle brackets pass through; only a premature `-->` is broken up
    Comment,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl HtmlFormatter {
    pub fn new() -> Self {
        HtmlFormatter
    }

    pub fn write_comment(&self, output: &mut String, value: &str) {
        output.push_str("<!--");
        encode(output, value, EncodeMode::Comment, false);
        output.push_str("-->");
    }

    pub fn write_doctype(&self, output: &mut String, value: &str) {
        output.push_str("<!DOCTYPE ");
        output.push_str(value.trim());
        output.push('>');
    }

    pub fn write_open_element_begin_tag(&self, output: &mut String, tag: &str) {
        output.push('<');
        output.push_str(tag);
    }

    pub fn write_open_attribute(&self, output: &mut String, name: &str) {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
    }

    pub fn write_close_attribute(&self, output: &mut String) {
        output.push('"');
    }

    /// A complete attribute; `None` writes the bare name.
    pub fn write_attribute(&self, output: &mut String, name: &str, value: Option<&str>) {
        output.push(' ');
        output.push_str(name);
        if let Some(value) = value {
            output.push_str("=\"");
            encode(output, value, EncodeMode::Attribute, true);
            output.push('"');
        }
    }

    pub fn write_close_element_begin_tag(&self, output: &mut String) {
        output.push('>');
    }

    pub fn write_close_element_void_tag(&self, output: &mut String) {
        output.push_str(" />");
    }

    pub fn write_element_end_tag(&self, output: &mut String, tag: &str) {
        output.push_str("</");
        output.push_str(tag);
        output.push('>');
    }

    pub fn write_literal(&self, output: &mut String, value: &str, encode_non_ascii: bool) {
        encode(output, value, EncodeMode::Text, encode_non_ascii);
    }

    /// Encodes `value` as element text.
    pub fn encode_literal(&self, value: &str, encode_non_ascii: bool) -> String {
        let mut output = String::with_capacity(value.len());
        self.write_literal(&mut output, value, encode_non_ascii);
        output
    }
}

fn named_entity(ch: char) -> Option<&'static str> {
    match ch {
        '\u{00A0}' => Some("&nbsp;"),
        '\u{00A9}' => Some("&copy;"),
        '\u{2122}' => Some("&trade;"),
        '\u{00AE}' => Some("&reg;"),
        '\u{00E9}' => Some("&eacute;"),
        '\u{2026}' => Some("&hellip;"),
        '\u{00AD}' => Some("&shy;"),
        '\u{00B7}' => Some("&middot;"),
        _ => None,
    }
}

/// Control characters, C1 controls and noncharacters never appear raw.
fn needs_char_ref(ch: char, encode_non_ascii: bool) -> bool {
    ch < ' '
        || (ch >= '\u{007F}' && (encode_non_ascii || ch <= '\u{0084}'))
        || ('\u{0086}'..='\u{009F}').contains(&ch)
        || ('\u{FDD0}'..='\u{FDEF}').contains(&ch)
}

fn encode(output: &mut String, value: &str, mode: EncodeMode, encode_non_ascii: bool) {
    let mut prev = ['\0', '\0'];
    for ch in value.chars() {
        match ch {
            '\t' | '\n' | '\r' if mode != EncodeMode::Attribute => output.push(ch),
            '&' => output.push_str("&amp;"),
            '<' if mode == EncodeMode::Comment => output.push(ch),
            '<' => output.push_str("&lt;"),
            '>' if mode == EncodeMode::Comment && prev != ['-', '-'] => output.push(ch),
            '>' => output.push_str("&gt;"),
            '"' if mode == EncodeMode::Attribute => output.push_str("&quot;"),
            '"' => output.push(ch),
            _ => {
                if let Some(entity) = named_entity(ch) {
                    output.push_str(entity);
                } else if needs_char_ref(ch, encode_non_ascii) {
                    let _ = write!(output, "&#x{:04X};", ch as u32);
                } else {
                    output.push(ch);
                }
            }
        }
        prev = [prev[1], ch];
    }
}
