/*
 * Character Codes
 *
 * Shared by the binding expression scanner and the output formatters.
 */

//! Character constants and classification helpers

// Special characters
pub const EOF: char = '\0';
pub const BSPACE: char = '\x08';
pub const TAB: char = '\t';
pub const LF: char = '\n';
pub const VTAB: char = '\x0B';
pub const FF: char = '\x0C';
pub const CR: char = '\r';
pub const SPACE: char = ' ';
pub const NBSP: char = '\u{00A0}';

// Punctuation
pub const DQ: char = '"';
pub const SQ: char = '\'';
pub const LPAREN: char = '(';
pub const RPAREN: char = ')';
pub const STAR: char = '*';
pub const PLUS: char = '+';
pub const COMMA: char = ',';
pub const MINUS: char = '-';
pub const PERIOD: char = '.';
pub const SLASH: char = '/';
pub const COLON: char = ':';
pub const SEMICOLON: char = ';';

// Brackets
pub const LBRACKET: char = '[';
pub const BACKSLASH: char = '\\';
pub const RBRACKET: char = ']';
pub const LBRACE: char = '{';
pub const RBRACE: char = '}';

// Identifiers
pub const DOLLAR: char = '$';
pub const UNDERSCORE: char = '_';

/// Whitespace as the scripting sublanguage sees it (line breaks excluded)
pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, SPACE | TAB | VTAB | FF | NBSP | '\u{FEFF}')
}

pub fn is_line_break(ch: char) -> bool {
    matches!(ch, LF | CR | '\u{2028}' | '\u{2029}')
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

pub fn is_hex_digit(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

pub fn is_ascii_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

pub fn is_identifier_start(ch: char) -> bool {
    is_ascii_letter(ch) || ch == UNDERSCORE || ch == DOLLAR || (ch > '\u{7F}' && ch.is_alphabetic())
}

pub fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || is_digit(ch)
}

pub fn is_quote(ch: char) -> bool {
    ch == SQ || ch == DQ
}

/// Printable ASCII never needs a numeric escape in emitted string literals
pub fn is_printable_ascii(ch: char) -> bool {
    (SPACE..'\u{7F}').contains(&ch)
}
