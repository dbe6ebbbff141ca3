//! Template AST
//!
//! The node tree a template parser produces: markup, control commands and
//! embedded code blocks. Deserializes from externally tagged JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::code_block::CodeBlockNode;
use super::html;
use crate::parse_util::SourcePosition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Literal(TextNode),
    /// Raw markup passed through untouched (e.g. IE conditional comments)
    Unknown(TextNode),
    Element(ElementNode),
    Command(CommandNode),
    CodeBlock(CodeBlockNode),
    Comment(TextNode),
    /// Template-only comment; never reaches rendered markup
    CodeComment(TextNode),
    DocType(TextNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl TextNode {
    pub fn new(value: impl Into<String>) -> Self {
        TextNode {
            value: value.into(),
            position: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    /// `None` values are attributes present without a value
    #[serde(default)]
    pub attributes: IndexMap<String, Option<Node>>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        ElementNode {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            position: None,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: Option<Node>) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Node> {
        self.attributes.get(name).and_then(|v| v.as_ref())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn can_have_children(&self) -> bool {
        !html::is_void_tag(&self.tag)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn is_bool_attribute(&self, name: &str) -> bool {
        html::is_bool_attr(name)
    }

    /// Whether the attribute holds a URL that must be intercepted.
    pub fn is_link_attribute(&self, name: &str) -> bool {
        if self.is_tag("meta") && name.eq_ignore_ascii_case("content") && self.is_meta_link() {
            return true;
        }
        html::is_link_tag(&self.tag) && html::is_link_attr(name)
    }

    fn is_meta_link(&self) -> bool {
        // providers disagree on which attribute names the property
        let keyed = ["name", "property", "itemprop"]
            .iter()
            .find_map(|key| self.attribute(key).map(|node| (*key, node)));

        match keyed {
            Some((key, Node::Literal(text))) => html::meta_link_key(&text.value)
                .map_or(false, |expected| expected.eq_ignore_ascii_case(key)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandNode {
    View(ViewCommand),
    Xor(XorCommand),
    If(IfCommand),
    For(ForCommand),
    Call(CallCommand),
    Part(PartCommand),
}

/// A compilation unit: one named view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCommand {
    pub name: String,
    #[serde(default)]
    pub client_only: bool,
    #[serde(default)]
    pub server_only: bool,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl ViewCommand {
    pub fn new(name: impl Into<String>, children: Vec<Node>) -> Self {
        ViewCommand {
            name: name.into(),
            client_only: false,
            server_only: false,
            children,
            position: None,
        }
    }
}

/// Mutually exclusive branches; a branch without a test is the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XorCommand {
    #[serde(default)]
    pub branches: Vec<IfCommand>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfCommand {
    #[serde(default)]
    pub test: Option<CodeBlockNode>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForCommand {
    #[serde(default)]
    pub each: Option<Box<Node>>,
    #[serde(default, rename = "in")]
    pub in_: Option<Box<Node>>,
    #[serde(default)]
    pub count: Option<Box<Node>>,
    #[serde(default)]
    pub data: Option<Box<Node>>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallCommand {
    #[serde(default)]
    pub view: Option<Box<Node>>,
    #[serde(default)]
    pub data: Option<Box<Node>>,
    #[serde(default)]
    pub index: Option<Box<Node>>,
    #[serde(default)]
    pub count: Option<Box<Node>>,
    #[serde(default)]
    pub key: Option<Box<Node>>,
    #[serde(default)]
    pub defer: bool,
    /// Parts supplied to the called view
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl CallCommand {
    /// Supplied parts in order. Loose content is gathered into an unnamed part,
    /// ignoring whitespace that precedes it.
    pub fn parts(&self) -> Vec<PartCommand> {
        let mut parts = Vec::new();
        let mut default_index: Option<usize> = None;
        for child in &self.children {
            if let Node::Command(CommandNode::Part(part)) = child {
                parts.push(part.clone());
                continue;
            }
            match default_index {
                Some(i) => parts[i].children.push(child.clone()),
                None => {
                    if let Node::Literal(text) = child {
                        if text.value.trim_matches(is_inter_element_space).is_empty() {
                            continue;
                        }
                    }
                    default_index = Some(parts.len());
                    parts.push(PartCommand {
                        name: String::new(),
                        children: vec![child.clone()],
                        position: self.position,
                    });
                }
            }
        }
        parts
    }
}

fn is_inter_element_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartCommand {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl Node {
    pub fn literal(value: impl Into<String>) -> Node {
        Node::Literal(TextNode::new(value))
    }

    pub fn expression(value: impl Into<String>) -> Node {
        Node::CodeBlock(CodeBlockNode::expression(value))
    }

    pub fn markup(value: impl Into<String>) -> Node {
        Node::CodeBlock(CodeBlockNode::markup(value))
    }

    pub fn statement(value: impl Into<String>) -> Node {
        Node::CodeBlock(CodeBlockNode::statement(value))
    }

    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Node::Literal(n)
            | Node::Unknown(n)
            | Node::Comment(n)
            | Node::CodeComment(n)
            | Node::DocType(n) => n.position,
            Node::Element(n) => n.position,
            Node::CodeBlock(n) => n.position,
            Node::Command(c) => match c {
                CommandNode::View(n) => n.position,
                CommandNode::Xor(n) => n.position,
                CommandNode::If(n) => n.position,
                CommandNode::For(n) => n.position,
                CommandNode::Call(n) => n.position,
                CommandNode::Part(n) => n.position,
            },
        }
    }

    pub fn as_code_block(&self) -> Option<&CodeBlockNode> {
        match self {
            Node::CodeBlock(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Node::Literal(text) => Some(&text.value),
            _ => None,
        }
    }
}

impl From<ElementNode> for Node {
    fn from(value: ElementNode) -> Self {
        Node::Element(value)
    }
}

impl From<CodeBlockNode> for Node {
    fn from(value: CodeBlockNode) -> Self {
        Node::CodeBlock(value)
    }
}

impl From<CommandNode> for Node {
    fn from(value: CommandNode) -> Self {
        Node::Command(value)
    }
}
