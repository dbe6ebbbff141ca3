//! Client Code Generator
//!
//! Emits each view as a JsonML-style array literal bound through `duel(...)`.
//! Commands become `$`-prefixed pseudo elements, code blocks become functions
//! over the bound names, and everything else is string data.

use std::borrow::Cow;

use super::builder::{normalize_literal, NEWLINES_ONLY};
use super::data_encoder::{js_string, DataEncoder};
use super::CodeGenerator;
use crate::ast::{
    CallCommand, CodeBlockKind, CodeBlockNode, CommandNode, ElementNode, ForCommand, IfCommand, Node,
    ViewCommand,
};
use crate::config::CodeGenSettings;
use crate::error::{CompilerError, Result};

const XOR_TAG: &str = "$xor";
const IF_TAG: &str = "$if";
const FOR_TAG: &str = "$for";
const CALL_TAG: &str = "$call";
const PART_TAG: &str = "$part";
const COMMENT_TAG: &str = "!";
const DOCTYPE_TAG: &str = "!DOCTYPE";

enum AttrValue<'a> {
    /// Present without a value
    Null,
    /// Boolean attribute present as plain markup
    True,
    Text(Cow<'a, str>),
    /// Client code, written verbatim
    Code(String),
}

/// An element or command flattened into tag, attributes and children.
struct ClientElement<'a> {
    tag: &'a str,
    attributes: Vec<(&'a str, AttrValue<'a>)>,
    children: Cow<'a, [Node]>,
}

/// Emits client-side views. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct ClientCodeGen {
    settings: CodeGenSettings,
    encoder: DataEncoder,
}

impl Default for ClientCodeGen {
    fn default() -> Self {
        ClientCodeGen::new(CodeGenSettings::default())
    }
}

impl CodeGenerator for ClientCodeGen {
    fn file_extension(&self) -> &str {
        ".js"
    }

    fn write(&self, output: &mut String, views: &[ViewCommand]) -> Result<()> {
        output.push_str("/*global duel */");
        self.writeln(output, 0);

        let mut namespaces = Vec::new();
        for view in views {
            if view.server_only {
                tracing::warn!("Skipping server-only view {}", view.name);
                continue;
            }

            self.writeln(output, 0);

            let view_name = self.settings.client_name(&view.name);
            match self.encoder.write_namespace(output, &mut namespaces, &view_name) {
                Ok(true) => self.writeln(output, 0),
                Ok(false) => {}
                Err(_) => {
                    return Err(CompilerError::syntax(
                        format!("Invalid view name: {}", view_name),
                        view.position,
                    ))
                }
            }
            self.write_view(output, view, &view_name)?;
            tracing::debug!("Emitted client view {}", view_name);
        }
        Ok(())
    }
}

impl ClientCodeGen {
    pub fn new(settings: CodeGenSettings) -> Self {
        let encoder = DataEncoder::new(settings.newline.clone(), settings.indent.clone());
        ClientCodeGen { settings, encoder }
    }

    fn write_view(&self, output: &mut String, view: &ViewCommand, view_name: &str) -> Result<()> {
        if !view_name.contains('.') {
            output.push_str("var ");
        }
        output.push_str(view_name);
        output.push_str(" = duel(");

        match view.children.as_slice() {
            [child] => {
                if self.has_content(child)? {
                    self.writeln(output, 1);
                }
                self.write_node(output, child, 1, false)?;
            }
            children => {
                // several roots share a document fragment
                let fragment = ClientElement {
                    tag: "",
                    attributes: Vec::new(),
                    children: Cow::Borrowed(children),
                };
                self.write_element(output, &fragment, 0, false)?;
            }
        }

        output.push_str(");");
        self.writeln(output, 0);
        Ok(())
    }

    /// Whether a lone root is an element with attributes or children.
    fn has_content(&self, node: &Node) -> Result<bool> {
        let element = match node {
            Node::Element(el) => self.element(el),
            Node::Command(cmd) => self.command(cmd)?,
            _ => return Ok(false),
        };
        Ok(!element.attributes.is_empty() || !element.children.is_empty())
    }

    fn write_node(&self, output: &mut String, node: &Node, depth: usize, pre: bool) -> Result<()> {
        match node {
            Node::Literal(text) => self.write_string(output, &text.value, pre),
            Node::Unknown(text) => {
                // raw markup renders unencoded
                let raw = CodeBlockNode::markup(js_string(&text.value));
                output.push_str(&raw.client_code(self.encoder.is_pretty_print()));
            }
            Node::Element(el) => self.write_element(output, &self.element(el), depth, pre)?,
            Node::Command(cmd) => self.write_element(output, &self.command(cmd)?, depth, pre)?,
            Node::CodeBlock(block) => output.push_str(&block.client_code(self.encoder.is_pretty_print())),
            Node::Comment(text) => self.write_special_element(output, COMMENT_TAG, &text.value, depth, pre),
            Node::CodeComment(text) => {
                output.push_str("/*");
                output.push_str(&text.value.replace("*/", "*\\/"));
                output.push_str("*/");
            }
            Node::DocType(text) => self.write_special_element(output, DOCTYPE_TAG, &text.value, depth, pre),
        }
        Ok(())
    }

    fn write_special_element(&self, output: &mut String, name: &str, value: &str, depth: usize, pre: bool) {
        output.push('[');
        self.write_string(output, name, pre);
        if !value.is_empty() {
            output.push(',');
            self.writeln(output, depth + 1);
            self.write_string(output, value, pre);
            self.writeln(output, depth);
        }
        output.push(']');
    }

    fn write_element(&self, output: &mut String, element: &ClientElement<'_>, depth: usize, pre: bool) -> Result<()> {
        let pre = pre || element.tag.eq_ignore_ascii_case("pre") || element.tag.eq_ignore_ascii_case("script");
        let depth = depth + 1;

        output.push('[');
        self.write_string(output, element.tag, pre);
        self.write_attributes(output, &element.attributes, depth, pre);

        let children = &element.children;
        let last = children.len().saturating_sub(1);
        let visible: Vec<&Node> = children
            .iter()
            .enumerate()
            .filter(|(i, child)| {
                // edge literals that normalize away
                let skipped = self.settings.normalize_whitespace
                    && !pre
                    && (*i == 0 || *i == last)
                    && matches!(child, Node::Literal(text) if NEWLINES_ONLY.is_match(&text.value));
                !skipped
            })
            .map(|(_, child)| child)
            .collect();

        let is_data = |node: &Node| !matches!(node, Node::CodeComment(_));
        let mut needs_delim = visible.iter().any(|child| is_data(*child));
        for (i, child) in visible.iter().enumerate() {
            // comments sit between items without taking a delimiter
            if needs_delim {
                output.push(',');
            }
            self.writeln(output, depth);
            self.write_node(output, *child, depth, pre)?;

            if is_data(*child) {
                needs_delim = visible[i + 1..].iter().any(|next| is_data(*next));
            } else {
                needs_delim = false;
            }
        }

        if !visible.is_empty() {
            self.writeln(output, depth - 1);
        }
        output.push(']');
        Ok(())
    }

    fn write_attributes(&self, output: &mut String, attributes: &[(&str, AttrValue<'_>)], depth: usize, pre: bool) {
        if attributes.is_empty() {
            return;
        }

        let single = attributes.len() == 1;
        output.push_str(", {");
        for (i, (name, value)) in attributes.iter().enumerate() {
            if single {
                output.push(' ');
            } else {
                if i > 0 {
                    output.push(',');
                }
                self.writeln(output, depth + 1);
            }

            self.write_string(output, name, pre);
            output.push_str(" : ");
            match value {
                AttrValue::Null => output.push_str("null"),
                AttrValue::True => output.push_str("true"),
                AttrValue::Text(text) => self.write_string(output, text, pre),
                AttrValue::Code(code) => output.push_str(code),
            }
        }

        if single {
            output.push(' ');
        } else {
            self.writeln(output, depth);
        }
        output.push('}');
    }

    fn element<'a>(&self, el: &'a ElementNode) -> ClientElement<'a> {
        let attributes = el
            .attributes
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    // truthy code decides client-side; a static flag is always on
                    Some(Node::CodeBlock(block)) if el.is_bool_attribute(name) => {
                        AttrValue::Code(block.client_code(self.encoder.is_pretty_print()))
                    }
                    _ if el.is_bool_attribute(name) => AttrValue::True,
                    None => AttrValue::Null,
                    Some(Node::Comment(_)) => AttrValue::Text(Cow::Borrowed("")),
                    Some(Node::CodeBlock(block)) => AttrValue::Code(block.client_code(self.encoder.is_pretty_print())),
                    Some(Node::Literal(text)) | Some(Node::Unknown(text)) => {
                        AttrValue::Text(Cow::Borrowed(text.value.as_str()))
                    }
                    Some(other) => AttrValue::Text(Cow::Owned(flatten_text(other))),
                };
                (name.as_str(), value)
            })
            .collect();

        ClientElement {
            tag: &el.tag,
            attributes,
            children: Cow::Borrowed(&el.children),
        }
    }

    fn command<'a>(&self, cmd: &'a CommandNode) -> Result<ClientElement<'a>> {
        let element = match cmd {
            CommandNode::View(view) => {
                return Err(CompilerError::syntax("Invalid command node type: VIEW", view.position))
            }
            CommandNode::Xor(xor) => ClientElement {
                tag: XOR_TAG,
                attributes: Vec::new(),
                children: Cow::Owned(
                    xor.branches
                        .iter()
                        .map(|branch| Node::Command(CommandNode::If(branch.clone())))
                        .collect(),
                ),
            },
            CommandNode::If(branch) => self.if_command(branch),
            CommandNode::For(each) => self.for_command(each),
            CommandNode::Call(call) => self.call_command(call),
            CommandNode::Part(part) => ClientElement {
                tag: PART_TAG,
                attributes: vec![("name", AttrValue::Text(Cow::Borrowed(part.name.as_str())))],
                children: Cow::Borrowed(&part.children),
            },
        };
        Ok(element)
    }

    fn if_command<'a>(&self, branch: &'a IfCommand) -> ClientElement<'a> {
        let attributes = branch
            .test
            .iter()
            .map(|test| ("test", AttrValue::Code(test.client_code(self.encoder.is_pretty_print()))))
            .collect();
        ClientElement {
            tag: IF_TAG,
            attributes,
            children: Cow::Borrowed(&branch.children),
        }
    }

    fn for_command<'a>(&self, each: &'a ForCommand) -> ClientElement<'a> {
        let attributes = [
            ("each", &each.each),
            ("in", &each.in_),
            ("count", &each.count),
            ("data", &each.data),
        ]
        .into_iter()
        .filter_map(|(name, node)| node.as_deref().map(|node| (name, self.command_code(node))))
        .collect();

        ClientElement {
            tag: FOR_TAG,
            attributes,
            children: Cow::Borrowed(&each.children),
        }
    }

    fn call_command<'a>(&self, call: &'a CallCommand) -> ClientElement<'a> {
        let mut attributes = Vec::new();
        if let Some(view) = call.view.as_deref() {
            attributes.push(("view", self.view_reference(view)));
        }
        let args = [
            ("data", &call.data),
            ("index", &call.index),
            ("count", &call.count),
            ("key", &call.key),
        ];
        for (name, node) in args {
            if let Some(node) = node.as_deref() {
                attributes.push((name, self.command_code(node)));
            }
        }

        ClientElement {
            tag: CALL_TAG,
            attributes,
            children: Cow::Borrowed(&call.children),
        }
    }

    /// Command attributes given as literal text are expressions.
    fn command_code(&self, node: &Node) -> AttrValue<'static> {
        let pretty = self.encoder.is_pretty_print();
        match node {
            Node::CodeBlock(block) => AttrValue::Code(block.client_code(pretty)),
            other => AttrValue::Code(CodeBlockNode::expression(flatten_text(other)).client_code(pretty)),
        }
    }

    /// A named view resolves through the client-side prefix.
    fn view_reference(&self, node: &Node) -> AttrValue<'static> {
        let pretty = self.encoder.is_pretty_print();
        match node {
            Node::CodeBlock(block) if block.kind != CodeBlockKind::Expression => {
                AttrValue::Code(block.client_code(pretty))
            }
            Node::CodeBlock(block) => {
                let name = self.settings.client_name(&block.value);
                AttrValue::Code(CodeBlockNode::expression(name).client_code(pretty))
            }
            other => {
                let name = self.settings.client_name(&flatten_text(other));
                AttrValue::Code(CodeBlockNode::expression(name).client_code(pretty))
            }
        }
    }

    fn write_string(&self, output: &mut String, value: &str, pre: bool) {
        if !pre && self.settings.normalize_whitespace && !value.is_empty() {
            output.push_str(&js_string(&normalize_literal(value)));
        } else if self.settings.convert_line_endings {
            let mut value = value.to_string();
            if self.settings.indent != "\t" {
                value = value.replace('\t', &self.settings.indent);
            }
            if self.settings.newline != "\n" {
                value = value.replace('\n', &self.settings.newline);
            }
            output.push_str(&js_string(&value));
        } else {
            output.push_str(&js_string(value));
        }
    }

    fn writeln(&self, output: &mut String, depth: usize) {
        output.push_str(&self.settings.newline);
        for _ in 0..depth {
            output.push_str(&self.settings.indent);
        }
    }
}

/// Text content of a node used where only text makes sense.
fn flatten_text(node: &Node) -> String {
    match node {
        Node::Literal(text)
        | Node::Unknown(text)
        | Node::Comment(text)
        | Node::CodeComment(text)
        | Node::DocType(text) => text.value.clone(),
        Node::CodeBlock(block) => block.value.clone(),
        Node::Element(el) => el.children.iter().map(flatten_text).collect(),
        Node::Command(_) => String::new(),
    }
}
