/**
 * Binding Expression Lexer
 *
 * Tokenizes fragments of the binding sublanguage (a small JavaScript subset)
 */

use crate::chars;
use crate::error::{CompilerError, Result};
use crate::parse_util::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Character,
    Identifier,
    Keyword,
    String,
    Operator,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub index: usize,
    pub end: usize,
    pub token_type: TokenType,
    pub num_value: f64,
    pub str_value: String,
}

impl Token {
    pub fn new(index: usize, end: usize, token_type: TokenType, num_value: f64, str_value: String) -> Self {
        Token {
            index,
            end,
            token_type,
            num_value,
            str_value,
        }
    }

    pub fn is_character(&self, code: char) -> bool {
        self.token_type == TokenType::Character && self.str_value.starts_with(code)
    }

    pub fn is_operator(&self, operator: &str) -> bool {
        self.token_type == TokenType::Operator && self.str_value == operator
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Keyword && self.str_value == keyword
    }

    pub fn is_identifier(&self) -> bool {
        self.token_type == TokenType::Identifier
    }

    pub fn is_number(&self) -> bool {
        self.token_type == TokenType::Number
    }

    pub fn is_string(&self) -> bool {
        self.token_type == TokenType::String
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.token_type {
            TokenType::Number => write!(f, "{}", self.num_value),
            TokenType::String => write!(f, "\"{}\"", self.str_value),
            _ => write!(f, "{}", self.str_value),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "continue", "default", "delete", "do", "else", "false", "finally",
    "for", "function", "if", "in", "instanceof", "new", "null", "return", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with",
];

/// Multi-character operators, longest first so the scan is greedy.
const OPERATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "+", "-", "*", "/", "%", "<",
    ">", "=", "!", "~", "&", "|", "^", "?",
];

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        Scanner::new(text).scan()
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

struct Scanner<'a> {
    input: &'a str,
    length: usize,
    index: usize,
    peek: char,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        let peek = input.chars().next().unwrap_or(chars::EOF);
        Scanner {
            input,
            length: input.len(),
            index: 0,
            peek,
        }
    }

    fn scan(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.scan_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn advance(&mut self) {
        self.index += self.peek.len_utf8();
        self.peek = self.char_at(self.index);
    }

    fn char_at(&self, index: usize) -> char {
        if index < self.length {
            self.input[index..].chars().next().unwrap_or(chars::EOF)
        } else {
            chars::EOF
        }
    }

    fn error(&self, message: impl Into<String>, index: usize) -> CompilerError {
        CompilerError::translation(message, SourcePosition::locate(self.input, index))
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            while self.index < self.length
                && (chars::is_whitespace(self.peek) || chars::is_line_break(self.peek))
            {
                self.advance();
            }
            if self.peek != chars::SLASH {
                return Ok(());
            }
            match self.char_at(self.index + 1) {
                chars::SLASH => {
                    while self.index < self.length && !chars::is_line_break(self.peek) {
                        self.advance();
                    }
                }
                chars::STAR => {
                    let start = self.index;
                    self.advance();
                    self.advance();
                    loop {
                        if self.index >= self.length {
                            return Err(self.error("Unterminated comment", start));
                        }
                        if self.peek == chars::STAR && self.char_at(self.index + 1) == chars::SLASH {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia()?;
        if self.index >= self.length {
            return Ok(None);
        }

        let start = self.index;
        let ch = self.peek;

        if chars::is_identifier_start(ch) {
            return Ok(Some(self.scan_identifier()));
        }
        if chars::is_digit(ch) {
            return self.scan_number(start).map(Some);
        }

        match ch {
            chars::PERIOD => {
                if chars::is_digit(self.char_at(self.index + 1)) {
                    return self.scan_number(start).map(Some);
                }
                self.advance();
                Ok(Some(self.scan_character(start, ch)))
            }
            chars::LPAREN | chars::RPAREN | chars::LBRACKET | chars::RBRACKET | chars::LBRACE
            | chars::RBRACE | chars::COMMA | chars::COLON | chars::SEMICOLON => {
                self.advance();
                Ok(Some(self.scan_character(start, ch)))
            }
            chars::SQ | chars::DQ => self.scan_string(ch).map(Some),
            _ => self.scan_operator(start).map(Some),
        }
    }

    fn scan_character(&self, start: usize, code: char) -> Token {
        Token::new(start, self.index, TokenType::Character, code as u32 as f64, code.to_string())
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.index;
        while chars::is_identifier_part(self.peek) {
            self.advance();
        }
        let text = self.input[start..self.index].to_string();
        let token_type = if is_keyword(&text) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        Token::new(start, self.index, token_type, 0.0, text)
    }

    fn scan_number(&mut self, start: usize) -> Result<Token> {
        if self.peek == '0' && matches!(self.char_at(self.index + 1), 'x' | 'X') {
            self.advance();
            self.advance();
            let digits = self.index;
            while chars::is_hex_digit(self.peek) {
                self.advance();
            }
            let value = i64::from_str_radix(&self.input[digits..self.index], 16)
                .map_err(|_| self.error("Invalid hexadecimal number", start))?;
            return Ok(Token::new(start, self.index, TokenType::Number, value as f64, String::new()));
        }

        while chars::is_digit(self.peek) {
            self.advance();
        }
        if self.peek == chars::PERIOD {
            self.advance();
            while chars::is_digit(self.peek) {
                self.advance();
            }
        }
        if matches!(self.peek, 'e' | 'E') {
            self.advance();
            if matches!(self.peek, chars::PLUS | chars::MINUS) {
                self.advance();
            }
            if !chars::is_digit(self.peek) {
                return Err(self.error("Invalid exponent", self.index));
            }
            while chars::is_digit(self.peek) {
                self.advance();
            }
        }
        if chars::is_identifier_start(self.peek) {
            return Err(self.error("Identifier starts immediately after numeric literal", self.index));
        }

        let text = &self.input[start..self.index];
        let value: f64 = text
            .parse()
            .map_err(|_| self.error(format!("Invalid number '{}'", text), start))?;
        Ok(Token::new(start, self.index, TokenType::Number, value, String::new()))
    }

    fn scan_string(&mut self, quote: char) -> Result<Token> {
        let start = self.index;
        self.advance();
        let mut buffer = String::new();

        loop {
            if self.index >= self.length || chars::is_line_break(self.peek) {
                return Err(self.error("Unterminated string literal", start));
            }
            if self.peek == quote {
                self.advance();
                break;
            }
            if self.peek != chars::BACKSLASH {
                buffer.push(self.peek);
                self.advance();
                continue;
            }

            self.advance();
            let escaped = self.peek;
            match escaped {
                'n' => buffer.push(chars::LF),
                't' => buffer.push(chars::TAB),
                'r' => buffer.push(chars::CR),
                'b' => buffer.push(chars::BSPACE),
                'f' => buffer.push(chars::FF),
                'v' => buffer.push(chars::VTAB),
                '0' if !chars::is_digit(self.char_at(self.index + 1)) => buffer.push('\0'),
                'u' | 'x' => {
                    let width = if escaped == 'u' { 4 } else { 2 };
                    let digits_start = self.index + 1;
                    let digits_end = digits_start + width;
                    let code = self
                        .input
                        .get(digits_start..digits_end)
                        .filter(|hex| hex.chars().all(chars::is_hex_digit))
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .and_then(char::from_u32)
                        .ok_or_else(|| self.error("Invalid escape sequence", self.index - 1))?;
                    buffer.push(code);
                    for _ in 0..width {
                        self.advance();
                    }
                }
                chars::CR => {
                    // line continuation
                    if self.char_at(self.index + 1) == chars::LF {
                        self.advance();
                    }
                }
                chars::LF | '\u{2028}' | '\u{2029}' => {}
                chars::EOF => return Err(self.error("Unterminated string literal", start)),
                other => buffer.push(other),
            }
            self.advance();
        }

        Ok(Token::new(start, self.index, TokenType::String, 0.0, buffer))
    }

    fn scan_operator(&mut self, start: usize) -> Result<Token> {
        let rest = &self.input[start..];
        let operator = OPERATORS
            .iter()
            .find(|op| rest.starts_with(*op))
            .ok_or_else(|| self.error(format!("Unexpected character '{}'", self.peek), start))?;
        for _ in 0..operator.len() {
            self.advance();
        }
        Ok(Token::new(start, self.index, TokenType::Operator, 0.0, operator.to_string()))
    }
}
