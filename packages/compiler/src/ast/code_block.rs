//! Embedded code blocks
//!
//! A code block is a fragment of the binding sublanguage. Its client code wraps
//! the fragment in a function taking only the bound names it needs.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse_util::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodeBlockKind {
    /// `<%= expr %>`: value is written encoded
    Expression,
    /// `<%# expr %>`: value is written as raw markup
    Markup,
    /// `<% stmts %>`
    Statement,
}

bitflags! {
    /// The bound names a fragment mentions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoundParams: u8 {
        const DATA = 0b0001;
        const INDEX = 0b0010;
        const COUNT = 0b0100;
        const KEY = 0b1000;
    }
}

/// Bound names in positional order.
const PARAM_NAMES: [(&str, BoundParams); 4] = [
    ("data", BoundParams::DATA),
    ("index", BoundParams::INDEX),
    ("count", BoundParams::COUNT),
    ("key", BoundParams::KEY),
];

static PARAM_REGEXES: Lazy<Vec<(Regex, BoundParams)>> = Lazy::new(|| {
    PARAM_NAMES
        .iter()
        .filter_map(|(name, flag)| {
            Regex::new(&format!(r"\b{}\b", name)).ok().map(|re| (re, *flag))
        })
        .collect()
});

impl BoundParams {
    /// Scans `source` for references to the bound names.
    pub fn detect(source: &str) -> BoundParams {
        PARAM_REGEXES
            .iter()
            .filter(|(re, _)| re.is_match(source))
            .fold(BoundParams::empty(), |acc, (_, flag)| acc | *flag)
    }

    /// Number of leading positional parameters needed to reach the highest mention.
    pub fn arity(&self) -> usize {
        PARAM_NAMES
            .iter()
            .rposition(|(_, flag)| self.contains(*flag))
            .map_or(0, |i| i + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlockNode {
    pub kind: CodeBlockKind,
    pub value: String,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl CodeBlockNode {
    pub fn new(kind: CodeBlockKind, value: impl Into<String>) -> Self {
        CodeBlockNode {
            kind,
            value: value.into(),
            position: None,
        }
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Self::new(CodeBlockKind::Expression, value)
    }

    pub fn markup(value: impl Into<String>) -> Self {
        Self::new(CodeBlockKind::Markup, value)
    }

    pub fn statement(value: impl Into<String>) -> Self {
        Self::new(CodeBlockKind::Statement, value)
    }

    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    /// The opening delimiter as it appears in template markup.
    pub fn begin(&self) -> &'static str {
        match self.kind {
            CodeBlockKind::Expression => "<%=",
            CodeBlockKind::Markup => "<%#",
            CodeBlockKind::Statement => "<%",
        }
    }

    pub fn end(&self) -> &'static str {
        "%>"
    }

    pub fn bound_params(&self) -> BoundParams {
        BoundParams::detect(&self.value)
    }

    /// Count of positional arguments a deferred invocation must pass.
    pub fn arg_size(&self) -> usize {
        self.bound_params().arity()
    }

    fn param_list(&self, pretty: bool) -> String {
        let separator = if pretty { ", " } else { "," };
        PARAM_NAMES[..self.arg_size()]
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The fragment wrapped as a client-side function.
    pub fn client_code(&self, pretty: bool) -> String {
        let params = self.param_list(pretty);
        let body = self.value.trim();
        match (self.kind, pretty) {
            (CodeBlockKind::Expression, false) => format!("function({}){{return({});}}", params, body),
            (CodeBlockKind::Expression, true) => format!("function({}) {{ return ({}); }}", params, body),
            (CodeBlockKind::Markup, false) => format!("function({}){{return duel.raw({});}}", params, body),
            (CodeBlockKind::Markup, true) => format!("function({}) {{ return duel.raw({}); }}", params, body),
            (CodeBlockKind::Statement, false) => format!("function({}){{{}}}", params, body),
            (CodeBlockKind::Statement, true) => format!("function({}) {{ {} }}", params, body),
        }
    }

    /// The same fragment reinterpreted as a plain expression.
    pub fn as_expression(&self) -> CodeBlockNode {
        CodeBlockNode {
            kind: CodeBlockKind::Expression,
            value: self.value.clone(),
            position: self.position,
        }
    }
}

impl std::fmt::Display for CodeBlockNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.begin(), self.value, self.end())
    }
}
