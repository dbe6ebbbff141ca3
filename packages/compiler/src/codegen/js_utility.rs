//! JavaScript vocabulary
//!
//! Reserved words, global objects and browser objects. Used to classify
//! binding identifiers and to validate client-side view names.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::chars;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "implements", "import", "in", "instanceof", "interface", "let", "new", "null", "package",
        "private", "protected", "public", "return", "static", "super", "switch", "this", "throw",
        "true", "try", "typeof", "var", "void", "while", "with", "yield",
    ]
    .into_iter()
    .chain(OBJECT_PROPERTIES.iter().copied())
    .collect()
});

/// Members every object inherits; unusable as view names.
const OBJECT_PROPERTIES: [&str; 11] = [
    "__proto__", "constructor", "hasOwnProperty", "isPrototypeOf", "propertyIsEnumerable",
    "prototype", "toLocaleString", "toString", "valueOf", "__defineGetter__", "__defineSetter__",
];

static GLOBALS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Array", "Boolean", "Date", "decodeURI", "decodeURIComponent", "encodeURI",
        "encodeURIComponent", "Error", "escape", "eval", "EvalError", "Function", "Infinity",
        "isFinite", "isNaN", "JSON", "Math", "NaN", "Number", "Object", "parseFloat", "parseInt",
        "RangeError", "ReferenceError", "RegExp", "String", "SyntaxError", "TypeError",
        "undefined", "unescape", "URIError",
    ]
    .into_iter()
    .collect()
});

static BROWSER: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "alert", "clearInterval", "clearTimeout", "confirm", "console", "document", "event",
        "frames", "history", "localStorage", "location", "navigator", "opener", "parent",
        "prompt", "screen", "self", "sessionStorage", "setInterval", "setTimeout", "top",
        "window", "XMLHttpRequest",
    ]
    .into_iter()
    .collect()
});

/// Names the host environment defines before any view runs.
pub fn is_global_ident(ident: &str) -> bool {
    GLOBALS.contains(ident) || BROWSER.contains(ident)
}

pub fn is_object_property(ident: &str) -> bool {
    OBJECT_PROPERTIES.contains(&ident)
}

/// Whether `ident` may name a client-side view. Nested names are dotted paths
/// of simple identifiers.
pub fn is_valid_identifier(ident: &str, nested: bool) -> bool {
    if ident.is_empty() {
        return false;
    }

    if nested {
        return ident.split(chars::PERIOD).all(|part| is_valid_identifier(part, false));
    }

    if RESERVED.contains(ident) {
        return false;
    }

    let mut ident_chars = ident.chars();
    match ident_chars.next() {
        Some(ch) if chars::is_identifier_start(ch) => {}
        _ => return false,
    }
    ident_chars.all(chars::is_identifier_part)
}
