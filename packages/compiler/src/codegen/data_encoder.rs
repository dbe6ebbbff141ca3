//! Data Encoder
//!
//! Writes values as JavaScript literals (or strict JSON). Snippets are written
//! verbatim, which is how deferred client code ends up inside object literals.

use std::fmt::Write;

use indexmap::IndexMap;
use serde_json::Value;

use super::js_utility;
use crate::error::{CompilerError, Result};

/// A value the encoder knows how to write.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<JsValue>),
    Object(IndexMap<String, JsValue>),
    /// Source text emitted as-is
    Snippet(String),
}

impl JsValue {
    pub fn snippet(code: impl Into<String>) -> JsValue {
        JsValue::Snippet(code.into())
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        JsValue::String(value)
    }
}

impl From<Value> for JsValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsValue::Null,
            Value::Bool(b) => JsValue::Boolean(b),
            Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => JsValue::String(s),
            Value::Array(items) => JsValue::Array(items.into_iter().map(JsValue::from).collect()),
            Value::Object(map) => {
                JsValue::Object(map.into_iter().map(|(k, v)| (k, JsValue::from(v))).collect())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    EcmaScript,
    Json,
}

#[derive(Debug, Clone)]
pub struct DataEncoder {
    newline: String,
    indent: String,
    pretty_print: bool,
}

impl Default for DataEncoder {
    fn default() -> Self {
        DataEncoder::compact()
    }
}

impl DataEncoder {
    /// Pretty-prints whenever either string is non-empty.
    pub fn new(newline: impl Into<String>, indent: impl Into<String>) -> Self {
        let newline = newline.into();
        let indent = indent.into();
        let pretty_print = !newline.is_empty() || !indent.is_empty();
        DataEncoder {
            newline,
            indent,
            pretty_print,
        }
    }

    pub fn compact() -> Self {
        DataEncoder::new("", "")
    }

    pub fn is_pretty_print(&self) -> bool {
        self.pretty_print
    }

    pub fn encode(&self, data: &JsValue) -> String {
        let mut output = String::new();
        self.write_value(&mut output, data, Format::EcmaScript, 0);
        output
    }

    pub fn encode_json(&self, data: &JsValue) -> String {
        let mut output = String::new();
        self.write_value(&mut output, data, Format::Json, 0);
        output
    }

    /// Writes `data` as a JavaScript literal starting at `depth`.
    pub fn write(&self, output: &mut String, data: &JsValue, depth: usize) {
        self.write_value(output, data, Format::EcmaScript, depth);
    }

    pub fn write_json(&self, output: &mut String, data: &JsValue) {
        self.write_value(output, data, Format::Json, 0);
    }

    fn write_value(&self, output: &mut String, data: &JsValue, format: Format, depth: usize) {
        match data {
            JsValue::Null => output.push_str("null"),
            JsValue::Undefined => output.push_str("undefined"),
            JsValue::Boolean(b) => output.push_str(if *b { "true" } else { "false" }),
            JsValue::Number(n) => write_number(output, *n),
            JsValue::String(s) => write_string(output, s, format),
            JsValue::Snippet(code) => output.push_str(code),
            JsValue::Array(items) => {
                self.write_items(output, ('[', ']'), items.iter().map(|v| (None, v)), items.len(), format, depth)
            }
            JsValue::Object(map) => self.write_items(
                output,
                ('{', '}'),
                map.iter().map(|(k, v)| (Some(k.as_str()), v)),
                map.len(),
                format,
                depth,
            ),
        }
    }

    fn write_items<'a>(
        &self,
        output: &mut String,
        (open, close): (char, char),
        items: impl Iterator<Item = (Option<&'a str>, &'a JsValue)>,
        len: usize,
        format: Format,
        depth: usize,
    ) {
        output.push(open);
        let single = len == 1;
        let inner = depth + 1;

        for (i, (name, value)) in items.enumerate() {
            if single {
                if self.pretty_print {
                    output.push(' ');
                }
            } else {
                if i > 0 {
                    output.push(',');
                }
                if self.pretty_print {
                    self.writeln(output, inner);
                }
            }

            if let Some(name) = name {
                write_property_name(output, name, format);
                output.push_str(if self.pretty_print { ": " } else { ":" });
            }
            self.write_value(output, value, format, inner);
        }

        if self.pretty_print {
            if single {
                output.push(' ');
            } else if len > 0 {
                self.writeln(output, depth);
            }
        }
        output.push(close);
    }

    /// Declares each not-yet-seen namespace of a dotted identifier as
    /// `ns = ns || {};`. Global roots are assumed to exist.
    /// Returns whether anything was written.
    pub fn write_namespace(&self, output: &mut String, namespaces: &mut Vec<String>, ident: &str) -> Result<bool> {
        if !js_utility::is_valid_identifier(ident, true) {
            return Err(CompilerError::invalid_view(format!("Invalid identifier: {}", ident)));
        }

        let space = if self.pretty_print { " " } else { "" };
        let mut wrote = false;
        for (dot, _) in ident.match_indices('.') {
            let ns = &ident[..dot];
            let is_root = !ns.contains('.');
            if (is_root && js_utility::is_global_ident(ns)) || namespaces.iter().any(|n| n == ns) {
                continue;
            }
            namespaces.push(ns.to_string());

            if is_root {
                output.push_str("var ");
            }
            let _ = write!(output, "{ns}{space}={space}{ns}{space}||{space}{{}};", ns = ns, space = space);
            self.writeln(output, 0);
            wrote = true;
        }
        Ok(wrote)
    }

    pub fn indent(&self, output: &mut String, depth: usize) {
        for _ in 0..depth {
            output.push_str(&self.indent);
        }
    }

    pub fn writeln(&self, output: &mut String, depth: usize) {
        output.push_str(&self.newline);
        self.indent(output, depth);
    }
}

fn write_property_name(output: &mut String, name: &str, format: Format) {
    if format == Format::EcmaScript && js_utility::is_valid_identifier(name, false) {
        output.push_str(name);
    } else {
        write_string(output, name, format);
    }
}

/// Integral values print without a fraction.
fn write_number(output: &mut String, value: f64) {
    if value.is_nan() {
        output.push_str("NaN");
    } else if value.is_infinite() {
        output.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        let _ = write!(output, "{}", value as i64);
    } else {
        let _ = write!(output, "{}", value);
    }
}

/// Writes a quoted string: single quotes for JavaScript, double for JSON.
fn write_string(output: &mut String, value: &str, format: Format) {
    let quote = if format == Format::Json { '"' } else { '\'' };
    output.push(quote);
    for ch in value.chars() {
        match ch {
            '\'' if format == Format::EcmaScript => output.push_str("\\'"),
            '"' if format == Format::Json => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\t' => output.push_str("\\t"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\u{000C}' => output.push_str("\\f"),
            '\u{0008}' => output.push_str("\\b"),
            ' '..='\u{007E}' => output.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(output, "\\u{:04X}", unit);
                }
            }
        }
    }
    output.push(quote);
}

/// Encodes `value` as a single-quoted JavaScript string literal.
pub fn js_string(value: &str) -> String {
    let mut output = String::with_capacity(value.len() + 2);
    write_string(&mut output, value, Format::EcmaScript);
    output
}
