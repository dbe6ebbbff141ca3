/**
 * CodeDOM Builder
 *
 * Walks a view's node tree and produces the view class. Markup is collected
 * into a literal buffer which is flushed as a single `write` call whenever a
 * dynamic statement has to be emitted. Fragments are translated server-side
 * where possible; the rest is deferred to small client-side script blocks.
 */

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::data_encoder::{DataEncoder, JsValue};
use super::html_formatter::HtmlFormatter;
use crate::ast::{
    CallCommand, CodeBlockKind, CodeBlockNode, CommandNode, ElementNode, ForCommand, IfCommand,
    Node, PartCommand, TextNode, ViewCommand, XorCommand,
};
use crate::codedom::expression::*;
use crate::codedom::statement::*;
use crate::codedom::utility::*;
use crate::codedom::{
    AccessModifier, CodeType, Field, IdentifierScope, Member, Method, Parameter, TypeDeclaration,
};
use crate::config::CodeGenSettings;
use crate::error::{CompilerError, Result};
use crate::parse_util::SourcePosition;
use crate::script::ScriptTranslator;

static LEADING_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\r\n]+").unwrap());
static TRAILING_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+$").unwrap());
// ASCII whitespace only; a non-breaking space is content
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\n\x0B\x0C\r]+").unwrap());
pub(crate) static NEWLINES_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\r\n]*$").unwrap());

const SCRIPT_TYPE: &str = "text/javascript";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagMode {
    Normal,
    /// Whitespace is significant
    Pre,
    /// Contents pass through verbatim (script, style)
    Suspend,
}

/// A statement sequence under construction.
#[derive(Debug, Default)]
struct Scope {
    statements: Vec<Statement>,
    /// Whether this is the top-level sequence of a method body
    method_owned: bool,
}

/// A translated fragment.
struct Translated {
    expr: Expression,
    /// Reads or writes ambient values, so the client may have to finish the job
    hybrid: bool,
}

struct HybridAttribute {
    value_ref: Expression,
    name: String,
    client_code: String,
    arg_size: usize,
}

/// Where a deferred attribute script finds its element.
enum ElementId {
    Var(Expression),
    Value(String),
}

pub struct CodeDomBuilder {
    settings: CodeGenSettings,
    formatter: HtmlFormatter,
    encoder: DataEncoder,
    buffer: String,
    scopes: Vec<Scope>,
    view_type: TypeDeclaration,
    tag_mode: TagMode,
    needs_extras: bool,
    has_scripts: bool,
}

impl CodeDomBuilder {
    pub fn new(settings: CodeGenSettings) -> Self {
        CodeDomBuilder {
            settings,
            formatter: HtmlFormatter::new(),
            encoder: DataEncoder::compact(),
            buffer: String::new(),
            scopes: Vec::new(),
            view_type: create_view_type(None, ""),
            tag_mode: TagMode::Normal,
            needs_extras: true,
            has_scripts: false,
        }
    }

    /// Builds the server-side class for one view.
    pub fn build_view(&mut self, view: &ViewCommand) -> Result<TypeDeclaration> {
        let full_name = self.settings.server_name(&view.name);
        if full_name.is_empty() {
            return Err(CompilerError::invalid_view("VIEW is missing name"));
        }
        let (namespace, name) = match full_name.rfind('.') {
            Some(dot) if dot > 0 => (Some(full_name[..dot].to_string()), full_name[dot + 1..].to_string()),
            Some(dot) => (None, full_name[dot + 1..].to_string()),
            None => (None, full_name.clone()),
        };

        self.buffer.clear();
        self.scopes.clear();
        self.tag_mode = TagMode::Normal;
        self.has_scripts = false;
        self.needs_extras = true;
        self.view_type = create_view_type(namespace, name);

        let render = self.build_render_method(&view.children)?;
        self.promote_render_method(&render);

        tracing::debug!("Built view {}", full_name);
        Ok(std::mem::replace(&mut self.view_type, create_view_type(None, "")))
    }

    /// Compiles `children` into a new private render-signature method and
    /// returns its name.
    fn build_render_method(&mut self, children: &[Node]) -> Result<String> {
        let name = self.view_type.next_ident("render_");
        self.view_type.add(Member::Method(
            Method::new(AccessModifier::Private, CodeType::Void, name.clone(), render_params())
                .with_throws(CodeType::IoException),
        ));

        self.flush_buffer();
        self.scopes.push(Scope {
            statements: Vec::new(),
            method_owned: true,
        });
        for child in children {
            self.build_node(child)?;
        }
        self.flush_buffer();
        let statements = self.pop_scope();

        if let Some(method) = self.view_type.find_method_mut(&name) {
            method.statements = statements;
        }
        Ok(name)
    }

    /// Turns the outermost render method into the `render` override.
    fn promote_render_method(&mut self, name: &str) {
        if let Some(method) = self.view_type.find_method_mut(name) {
            method.name = "render".to_string();
            method.access = AccessModifier::Protected;
            method.overrides = true;
        }
    }

    fn build_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Literal(text) => self.build_literal(text),
            Node::Unknown(text) => {
                // e.g. IE conditional comments which may wrap a script
                self.ensure_extras(true);
                self.buffer.push_str(&text.value);
            }
            Node::Element(element) => return self.build_element(element),
            Node::Command(command) => return self.build_command(command),
            Node::CodeBlock(block) => self.build_code_block(block),
            Node::Comment(text) => self.formatter.write_comment(&mut self.buffer, &text.value),
            Node::DocType(text) => self.formatter.write_doctype(&mut self.buffer, &text.value),
            Node::CodeComment(text) => {
                self.flush_buffer();
                self.add(comment(text.value.clone()));
            }
        }
        Ok(())
    }

    fn build_command(&mut self, command: &CommandNode) -> Result<()> {
        match command {
            CommandNode::Xor(xor) => self.build_xor(xor),
            CommandNode::If(branch) => {
                self.flush_buffer();
                let stmt = self.build_branch(branch)?;
                self.add(stmt);
                Ok(())
            }
            CommandNode::For(each) => self.build_iteration(each),
            CommandNode::Call(call) => self.build_call(call),
            CommandNode::Part(part) => self.build_part_placeholder(part),
            CommandNode::View(view) => Err(CompilerError::syntax(
                "Invalid command node type: VIEW",
                view.position,
            )),
        }
    }

    fn build_literal(&mut self, text: &TextNode) {
        if self.tag_mode == TagMode::Suspend {
            self.buffer.push_str(&text.value);
            return;
        }

        if self.settings.normalize_whitespace && self.tag_mode != TagMode::Pre && !text.value.is_empty() {
            let literal = normalize_literal(&text.value);
            self.formatter
                .write_literal(&mut self.buffer, &literal, self.settings.encode_non_ascii);
        } else {
            self.formatter
                .write_literal(&mut self.buffer, &text.value, self.settings.encode_non_ascii);
        }
    }

    //// Control flow

    fn build_xor(&mut self, xor: &XorCommand) -> Result<()> {
        self.flush_buffer();

        enum Built {
            Test(Expression, Vec<Statement>),
            Plain(Vec<Statement>),
        }

        // a fallback placed before any test runs in the enclosing sequence
        let mut inherited = self.scopes.last().map_or(false, |s| s.method_owned);
        let mut built = Vec::with_capacity(xor.branches.len());
        for branch in &xor.branches {
            match &branch.test {
                Some(test) => {
                    let test = self.translate_expression(test, false)?.expr;
                    let body = self.frame(false, |b| b.build_nodes(&branch.children))?;
                    built.push(Built::Test(test, body));
                    inherited = false;
                }
                None => {
                    let body = self.frame(inherited, |b| b.build_nodes(&branch.children))?;
                    built.push(Built::Plain(body));
                }
            }
        }

        // later branches nest inside the false statements of earlier ones
        let statements = built.into_iter().rev().fold(Vec::new(), |rest, branch| match branch {
            Built::Test(test, body) => vec![condition(test, body, rest)],
            Built::Plain(mut body) => {
                body.extend(rest);
                body
            }
        });
        for stmt in statements {
            self.add(stmt);
        }
        Ok(())
    }

    /// A standalone conditional; without a test its children are unconditional.
    fn build_branch(&mut self, branch: &IfCommand) -> Result<Statement> {
        let test = match &branch.test {
            Some(test) => self.translate_expression(test, false)?.expr,
            None => primitive(true),
        };
        let body = self.frame(false, |b| b.build_nodes(&branch.children))?;
        Ok(condition(test, body, Vec::new()))
    }

    fn build_iteration(&mut self, each: &ForCommand) -> Result<()> {
        if each.children.is_empty() {
            return Ok(());
        }

        let render = self.build_render_method(&each.children)?;

        if let Some(count) = command_block(each.count.as_deref()) {
            let count = self.translate_expression(&count, false)?.expr;
            let data = match command_block(each.data.as_deref()) {
                Some(data) => self.translate_expression(&data, false)?.expr,
                None => variable(CodeType::Object, "data"),
            };
            self.build_iteration_count(&render, count, data);
            return Ok(());
        }

        if let Some(source) = command_block(each.in_.as_deref()) {
            let source = self.translate_expression(&source, false)?.expr;
            self.build_iteration_object(&render, source);
            return Ok(());
        }

        match command_block(each.each.as_deref()) {
            Some(source) => {
                let source = self.translate_expression(&source, false)?.expr;
                self.build_iteration_array(&render, source);
                Ok(())
            }
            None => Err(CompilerError::syntax("FOR loop missing arguments", each.position)),
        }
    }

    fn build_iteration_count(&mut self, render: &str, count: Expression, data: Expression) {
        let data_decl = VariableDeclStatement::new(CodeType::Object, self.view_type.next_ident("data_"), Some(data));
        let index_decl = VariableDeclStatement::new(CodeType::Int, self.view_type.next_ident("index_"), Some(primitive(0)));
        let count = if count.result_type() == CodeType::Int {
            count
        } else {
            cast(CodeType::Int, ensure_number(count))
        };
        let count_decl = VariableDeclStatement::new(CodeType::Int, self.view_type.next_ident("count_"), Some(count));

        let body = invoke_this(
            CodeType::Void,
            render,
            vec![context_ref(), data_decl.var_ref(), index_decl.var_ref(), count_decl.var_ref(), null_expr()],
        );
        let test = binary(BinaryOperator::LessThan, index_decl.var_ref(), count_decl.var_ref());
        let increment = expr_stmt(unary(UnaryOperator::PostIncrement, index_decl.var_ref()));

        self.add(data_decl);
        self.add(iteration(
            Some(compound_decl(vec![index_decl, count_decl])),
            test,
            Some(increment),
            vec![expr_stmt(body)],
        ));
    }

    fn build_iteration_object(&mut self, render: &str, source: Expression) {
        let entries = invoke(CodeType::Collection, ensure_map(source), "entrySet", Vec::new());
        let (items, index, count, iterator) = self.declare_cursor(entries);

        let entry = VariableDeclStatement::new(
            CodeType::MapEntry,
            self.view_type.next_ident("entry_"),
            Some(cast(CodeType::MapEntry, invoke(CodeType::Object, iterator.var_ref(), "next", Vec::new()))),
        );
        let body = invoke_this(
            CodeType::Void,
            render,
            vec![
                context_ref(),
                invoke(CodeType::Object, entry.var_ref(), "getValue", Vec::new()),
                index.var_ref(),
                count.var_ref(),
                ensure_string(invoke(CodeType::Object, entry.var_ref(), "getKey", Vec::new())),
            ],
        );
        self.add_cursor_loop(items, index, count, iterator, vec![entry.into(), expr_stmt(body)]);
    }

    fn build_iteration_array(&mut self, render: &str, source: Expression) {
        let (items, index, count, iterator) = self.declare_cursor(ensure_collection(source));

        let body = invoke_this(
            CodeType::Void,
            render,
            vec![
                context_ref(),
                invoke(CodeType::Object, iterator.var_ref(), "next", Vec::new()),
                index.var_ref(),
                count.var_ref(),
                null_expr(),
            ],
        );
        self.add_cursor_loop(items, index, count, iterator, vec![expr_stmt(body)]);
    }

    /// Locals for iterating a collection: items, index, count and the iterator.
    fn declare_cursor(
        &mut self,
        items: Expression,
    ) -> (VariableDeclStatement, VariableDeclStatement, VariableDeclStatement, VariableDeclStatement) {
        let items = VariableDeclStatement::new(CodeType::Collection, self.view_type.next_ident("items_"), Some(items));
        let index = VariableDeclStatement::new(CodeType::Int, self.view_type.next_ident("index_"), Some(primitive(0)));
        let count = VariableDeclStatement::new(
            CodeType::Int,
            self.view_type.next_ident("count_"),
            Some(invoke(CodeType::Int, items.var_ref(), "size", Vec::new())),
        );
        let iterator = VariableDeclStatement::new(
            CodeType::Iterator,
            self.view_type.next_ident("iterator_"),
            Some(invoke(CodeType::Iterator, items.var_ref(), "iterator", Vec::new())),
        );
        (items, index, count, iterator)
    }

    fn add_cursor_loop(
        &mut self,
        items: VariableDeclStatement,
        index: VariableDeclStatement,
        count: VariableDeclStatement,
        iterator: VariableDeclStatement,
        body: Vec<Statement>,
    ) {
        let test = invoke(CodeType::Boolean, iterator.var_ref(), "hasNext", Vec::new());
        let increment = expr_stmt(unary(UnaryOperator::PostIncrement, index.var_ref()));

        self.add(items);
        self.add(compound_decl(vec![index, count]));
        self.add(iteration(Some(iterator.into()), test, Some(increment), body));
    }

    //// Nested views

    fn build_call(&mut self, call: &CallCommand) -> Result<()> {
        if call.defer {
            return self.build_deferred_call(call);
        }

        let view_name = match call_view_name(call.view.as_deref()) {
            Some(name) => self.settings.server_name(&name),
            None => {
                return Err(CompilerError::syntax(
                    "Unexpected Call command view attribute",
                    call.view.as_deref().and_then(Node::position).or(call.position),
                ))
            }
        };

        // arguments the server cannot evaluate leave the whole call to the client
        let mark = self.view_type.members.len();
        let args = match self.translate_call_args(call) {
            Ok(args) => args,
            Err(_) => {
                self.view_type.members.truncate(mark);
                return self.build_deferred_call(call);
            }
        };

        let field_name = self.view_type.next_ident("view_");
        self.view_type.add(Member::Field(Field {
            access: AccessModifier::Private,
            code_type: CodeType::View,
            name: field_name.clone(),
        }));

        let mut ctor_args = Vec::new();
        for part in call.parts() {
            ctor_args.push(self.build_part(&part)?);
        }

        let field = field_ref(this_ref(), field_name, CodeType::View);
        self.add_to_init(expr_stmt(binary(
            BinaryOperator::Assign,
            field.clone(),
            object_create(view_name, ctor_args),
        )));

        self.flush_buffer();
        let mut render_args = vec![context_ref(), field];
        render_args.extend(args);
        self.add(expr_stmt(invoke_this(CodeType::Void, "renderView", render_args)));
        Ok(())
    }

    /// data, index, count and key for a nested view, defaulting to the current values.
    fn translate_call_args(&mut self, call: &CallCommand) -> Result<Vec<Expression>> {
        let slots = [&call.data, &call.index, &call.count, &call.key];
        let mut args = Vec::with_capacity(slots.len());
        for (slot, param) in slots.iter().zip(render_params().iter().skip(1)) {
            let arg = match command_block(slot.as_deref()) {
                Some(block) => self.translate_expression(&block, false)?.expr,
                None => param.var_ref(),
            };
            args.push(arg);
        }
        Ok(args)
    }

    fn build_deferred_call(&mut self, call: &CallCommand) -> Result<()> {
        self.has_scripts = true;
        self.write_script_open(true);
        let id = self.emit_client_id();
        self.formatter.write_close_attribute(&mut self.buffer);
        self.formatter.write_close_element_begin_tag(&mut self.buffer);
        self.ensure_extras(false);

        match call_view_name(call.view.as_deref()) {
            Some(name) => {
                let name = self.settings.client_name(&name);
                self.buffer.push_str(&name);
            }
            None => {
                let block = match call.view.as_deref() {
                    Some(Node::CodeBlock(block)) => block,
                    other => {
                        return Err(CompilerError::syntax(
                            "Unexpected Call command view attribute",
                            other.and_then(Node::position).or(call.position),
                        ))
                    }
                };
                // an anonymous view built from the evaluated expression
                self.buffer.push_str("duel(");
                let view = self.translate_expression(block, false)?.expr;
                self.flush_buffer();
                self.add(data_encode(view));
                self.buffer.push(')');
            }
        }

        self.buffer.push('(');
        let slots = [&call.data, &call.index, &call.count, &call.key];
        for (i, (slot, param)) in slots.iter().zip(render_params().iter().skip(1)).enumerate() {
            if i > 0 {
                self.push_separator();
            }
            self.flush_buffer();
            let arg = match command_block(slot.as_deref()) {
                Some(block) => self.translate_expression(&block, false)?.expr,
                None => param.var_ref(),
            };
            self.add(data_encode(arg));
        }

        self.buffer.push_str(").toDOM(");
        self.flush_buffer();
        self.add(data_encode(id));
        self.buffer.push_str(");");
        self.formatter.write_element_end_tag(&mut self.buffer, "script");
        Ok(())
    }

    /// Compiles a part into a nested type of the current view and returns its construction.
    fn build_part(&mut self, part: &PartCommand) -> Result<Expression> {
        let type_name = self.view_type.next_ident("part_");
        let mut part_type = create_part_type(type_name.clone());
        part_type.add(Member::Method(
            Method::new(AccessModifier::Public, CodeType::String, "getPartName", Vec::new())
                .with_statements(vec![return_stmt(primitive(part.name.clone()))])
                .with_override(),
        ));

        let parent = std::mem::replace(&mut self.view_type, part_type);
        let built = self.build_render_method(&part.children);
        if let Ok(render) = &built {
            self.promote_render_method(render);
        }
        let part_type = std::mem::replace(&mut self.view_type, parent);
        built?;

        self.view_type.add(Member::Type(part_type));
        Ok(object_create(type_name, Vec::new()))
    }

    /// A part slot: registers the default content and dispatches by name.
    fn build_part_placeholder(&mut self, part: &PartCommand) -> Result<()> {
        if part.name.trim().is_empty() {
            return Err(CompilerError::syntax("PART command is missing name", part.position));
        }

        let create = self.build_part(part)?;
        self.add_to_init(expr_stmt(invoke_this(CodeType::Void, "addPart", vec![create])));

        self.flush_buffer();
        let mut args = vec![context_ref(), primitive(part.name.clone())];
        args.extend(render_params().iter().skip(1).map(Parameter::var_ref));
        self.add(expr_stmt(invoke_this(CodeType::Void, "renderPart", args)));
        Ok(())
    }

    fn add_to_init(&mut self, stmt: Statement) {
        if self.view_type.find_method("init").is_none() {
            self.view_type.add(Member::Method(
                Method::new(AccessModifier::Protected, CodeType::Void, "init", Vec::new()).with_override(),
            ));
        }
        if let Some(init) = self.view_type.find_method_mut("init") {
            init.statements.push(stmt);
        }
    }

    //// Elements

    /// XHTML repeats the name as the value; HTML writes it bare.
    fn bool_attribute_value<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.settings.xhtml_style {
            Some(name)
        } else {
            None
        }
    }

    fn build_element(&mut self, element: &ElementNode) -> Result<()> {
        if element.is_tag("script") {
            self.has_scripts = true;
            self.ensure_extras(true);
        }

        self.formatter
            .write_open_element_begin_tag(&mut self.buffer, &element.tag);

        let mut arg_size = 0;
        let mut deferred: IndexMap<String, JsValue> = IndexMap::new();
        let mut hybrids: Vec<HybridAttribute> = Vec::new();

        for (name, value) in &element.attributes {
            let value = match value {
                Some(value) => value,
                None => {
                    self.formatter.write_attribute(&mut self.buffer, name, None);
                    continue;
                }
            };

            if element.is_bool_attribute(name) {
                match value {
                    Node::Literal(text) => {
                        if !text.value.is_empty() {
                            let value = self.bool_attribute_value(name);
                            self.formatter.write_attribute(&mut self.buffer, name, value);
                        }
                    }
                    Node::CodeBlock(block) => match self.translate_expression(block, false) {
                        Ok(Translated { expr, hybrid: false }) => {
                            self.flush_buffer();
                            let body = self.frame(false, |b| {
                                let value = b.bool_attribute_value(name);
                                b.formatter.write_attribute(&mut b.buffer, name, value);
                                Ok(())
                            })?;
                            self.add(condition(expr, body, Vec::new()));
                        }
                        // hybrid boolean attributes are left to the client
                        _ => {
                            deferred.insert(name.clone(), JsValue::snippet(self.client_code(block)));
                            arg_size = arg_size.max(block.arg_size());
                        }
                    },
                    _ => {}
                }
                continue;
            }

            if element.is_link_attribute(name) {
                let write = match value {
                    Node::Literal(text) => Ok(self.emit_expression_safe(transform_url(primitive(text.value.clone())))),
                    Node::CodeBlock(block) => self.build_link_intercept(block),
                    other => {
                        return Err(CompilerError::syntax(
                            "Invalid attribute node type",
                            other.position().or(element.position),
                        ))
                    }
                };
                match write {
                    Ok(write) => {
                        self.formatter.write_open_attribute(&mut self.buffer, name);
                        self.flush_buffer();
                        self.add(write);
                        self.formatter.write_close_attribute(&mut self.buffer);
                    }
                    Err(_) => {
                        if let Node::CodeBlock(block) = value {
                            deferred.insert(name.clone(), JsValue::snippet(self.client_code(block)));
                            arg_size = arg_size.max(block.arg_size());
                        }
                    }
                }
                continue;
            }

            let block = match value {
                Node::Literal(text) => {
                    self.formatter
                        .write_attribute(&mut self.buffer, name, Some(text.value.as_str()));
                    continue;
                }
                Node::CodeBlock(block) => block,
                other => {
                    return Err(CompilerError::syntax(
                        "Invalid attribute node type",
                        other.position().or(element.position),
                    ))
                }
            };

            let (block, html_encode) = unwrap_markup(block);
            let translated = match self.translate_expression(&block, true) {
                Ok(translated) => translated,
                Err(_) => {
                    deferred.insert(name.clone(), JsValue::snippet(self.client_code(&block)));
                    arg_size = arg_size.max(block.arg_size());
                    continue;
                }
            };

            if !translated.hybrid {
                let write = self.emit_value(translated.expr, html_encode);
                self.formatter.write_open_attribute(&mut self.buffer, name);
                self.flush_buffer();
                self.add(write);
                self.formatter.write_close_attribute(&mut self.buffer);
                continue;
            }

            // written server-side unless the value is still undefined at render time
            let value_decl = VariableDeclStatement::new(
                CodeType::Object,
                self.view_type.next_ident("val_"),
                Some(translated.expr),
            );
            let value_ref = value_decl.var_ref();
            self.flush_buffer();
            self.add(value_decl);

            hybrids.push(HybridAttribute {
                value_ref: value_ref.clone(),
                name: name.clone(),
                client_code: self.client_code(&block),
                arg_size: block.arg_size(),
            });

            let write = self.emit_value(value_ref.clone(), html_encode);
            let body = self.frame(false, |b| {
                b.formatter.write_open_attribute(&mut b.buffer, name);
                b.flush_buffer();
                b.add(write);
                b.formatter.write_close_attribute(&mut b.buffer);
                Ok(())
            })?;
            self.add(condition(is_defined(value_ref), body, Vec::new()));
        }

        let mut element_id = None;
        if !deferred.is_empty() || !hybrids.is_empty() {
            element_id = Some(self.build_element_id(element, deferred.is_empty(), &hybrids)?);
        }

        if element.can_have_children() {
            self.formatter.write_close_element_begin_tag(&mut self.buffer);

            let prev_mode = self.tag_mode;
            if element.is_tag("script") || element.is_tag("style") {
                self.tag_mode = TagMode::Suspend;
            } else if element.is_tag("pre") {
                self.tag_mode = TagMode::Pre;
            }

            let built = self.build_element_children(element);
            self.tag_mode = prev_mode;
            built?;

            if self.has_scripts && element.is_tag("body") {
                self.ensure_extras(true);
                let newline = self.settings.newline.clone();
                self.buffer.push_str(&newline);
            }
            self.formatter.write_element_end_tag(&mut self.buffer, &element.tag);
        } else if self.settings.xhtml_style {
            self.formatter.write_close_element_void_tag(&mut self.buffer);
        } else {
            self.formatter.write_close_element_begin_tag(&mut self.buffer);
        }

        if let Some(element_id) = element_id {
            self.build_deferred_attribute_executions(deferred, hybrids, element_id, arg_size)?;
        }
        Ok(())
    }

    fn build_element_children(&mut self, element: &ElementNode) -> Result<()> {
        let last = element.children.len().saturating_sub(1);
        for (i, child) in element.children.iter().enumerate() {
            if self.settings.normalize_whitespace && self.tag_mode == TagMode::Normal && (i == 0 || i == last) {
                if let Node::Literal(text) = child {
                    // would be normalized away
                    if NEWLINES_ONLY.is_match(&text.value) {
                        continue;
                    }
                }
            }
            self.build_node(child)?;
        }
        Ok(())
    }

    /// Makes sure a deferred attribute script can find the element.
    fn build_element_id(
        &mut self,
        element: &ElementNode,
        only_hybrids: bool,
        hybrids: &[HybridAttribute],
    ) -> Result<ElementId> {
        match element.attribute("id") {
            None => {
                let id_decl = next_id(&mut self.view_type);
                let id_ref = id_decl.var_ref();
                self.add(id_decl);

                let write_id = |b: &mut Self| {
                    b.formatter.write_open_attribute(&mut b.buffer, "id");
                    b.flush_buffer();
                    b.add(emit_expression(id_ref.clone()));
                    b.formatter.write_close_attribute(&mut b.buffer);
                };

                if only_hybrids {
                    // only needed when some value turns out undefined
                    let test = hybrids
                        .iter()
                        .map(|hybrid| is_undefined(hybrid.value_ref.clone()))
                        .reduce(|acc, test| binary(BinaryOperator::BooleanOr, acc, test));
                    if let Some(test) = test {
                        self.flush_buffer();
                        let body = self.frame(false, |b| {
                            write_id(b);
                            Ok(())
                        })?;
                        self.add(condition(test, body, Vec::new()));
                    }
                } else {
                    write_id(self);
                }
                Ok(ElementId::Var(id_ref))
            }
            Some(Node::Literal(text)) => Ok(ElementId::Value(text.value.clone())),
            Some(other) => Err(CompilerError::syntax(
                "Invalid ID attribute node type",
                other.position().or(element.position),
            )),
        }
    }

    fn build_deferred_attribute_executions(
        &mut self,
        deferred: IndexMap<String, JsValue>,
        hybrids: Vec<HybridAttribute>,
        element_id: ElementId,
        arg_size: usize,
    ) -> Result<()> {
        let has_tags = !deferred.is_empty();
        let mut has_tags_ref = None;

        if has_tags {
            self.has_scripts = true;
            self.write_script_open(false);
            self.formatter.write_close_element_begin_tag(&mut self.buffer);
            self.build_deferred_attribute_execution(deferred, &element_id, arg_size);
        } else {
            let decl = VariableDeclStatement::new(
                CodeType::Boolean,
                self.view_type.next_ident("hasTags_"),
                Some(primitive(false)),
            );
            has_tags_ref = Some(decl.var_ref());
            self.add(decl);
        }

        for hybrid in hybrids {
            self.flush_buffer();
            let body = self.frame(false, |b| {
                if let Some(has_tags_ref) = &has_tags_ref {
                    b.has_scripts = true;
                    // opens the script tag for the first undefined value only
                    let mut open = vec![expr_stmt(binary(
                        BinaryOperator::Assign,
                        has_tags_ref.clone(),
                        primitive(true),
                    ))];
                    open.extend(b.frame(false, |b| {
                        b.write_script_open(false);
                        b.formatter.write_close_element_begin_tag(&mut b.buffer);
                        Ok(())
                    })?);
                    b.add(condition(
                        unary(UnaryOperator::LogicalNegation, has_tags_ref.clone()),
                        open,
                        Vec::new(),
                    ));
                }

                let mut snippets = IndexMap::new();
                snippets.insert(hybrid.name.clone(), JsValue::snippet(hybrid.client_code.clone()));
                b.build_deferred_attribute_execution(snippets, &element_id, hybrid.arg_size);
                Ok(())
            })?;
            self.add(condition(is_undefined(hybrid.value_ref), body, Vec::new()));
        }

        match has_tags_ref {
            None => self.formatter.write_element_end_tag(&mut self.buffer, "script"),
            Some(has_tags_ref) => {
                let body = self.frame(false, |b| {
                    b.formatter.write_element_end_tag(&mut b.buffer, "script");
                    Ok(())
                })?;
                self.add(condition(has_tags_ref, body, Vec::new()));
            }
        }
        Ok(())
    }

    /// `duel({attrs})(data,...).toDOM(id,1);`
    fn build_deferred_attribute_execution(
        &mut self,
        attributes: IndexMap<String, JsValue>,
        element_id: &ElementId,
        arg_size: usize,
    ) {
        self.ensure_extras(false);

        self.buffer.push_str("duel(");
        self.encoder
            .write(&mut self.buffer, &JsValue::Object(attributes), 1);
        self.buffer.push_str(")(");
        self.emit_bound_args(arg_size);
        self.buffer.push_str(").toDOM(");

        match element_id {
            ElementId::Var(id_ref) => {
                self.flush_buffer();
                self.add(data_encode(id_ref.clone()));
            }
            ElementId::Value(id) => {
                self.encoder
                    .write(&mut self.buffer, &JsValue::from(id.as_str()), 1);
            }
        }

        self.buffer
            .push_str(if self.encoder.is_pretty_print() { ", true);" } else { ",1);" });
    }

    fn build_link_intercept(&mut self, block: &CodeBlockNode) -> Result<Statement> {
        let (block, html_encode) = unwrap_markup(block);
        let translated = self.translate_expression(&block, true)?;
        Ok(self.emit_value(transform_url(translated.expr), html_encode))
    }

    //// Code blocks

    fn build_code_block(&mut self, block: &CodeBlockNode) {
        let (block, html_encode) = unwrap_markup(block);

        let translated = match self.translate_expression(&block, true) {
            Ok(translated) => translated,
            Err(err) => {
                tracing::debug!("Deferring {} to the client: {}", block, err);
                let client_code = self.client_code(&block);
                self.build_deferred_code_block(&client_code, block.arg_size());
                return;
            }
        };

        if !translated.hybrid {
            let write = self.emit_value(translated.expr, html_encode);
            self.flush_buffer();
            self.add(write);
            return;
        }

        // defined values are written server-side, the rest re-evaluated on the client
        let value_decl = VariableDeclStatement::new(
            CodeType::Object,
            self.view_type.next_ident("val_"),
            Some(translated.expr),
        );
        let value_ref = value_decl.var_ref();
        self.flush_buffer();
        self.add(value_decl);

        let write = self.emit_value(value_ref.clone(), html_encode);
        let client_code = self.client_code(&block);
        let fallback = self.scoped(|b| b.build_deferred_code_block(&client_code, block.arg_size()));
        self.add(condition(is_defined(value_ref), vec![write], fallback));
    }

    /// `<script id="...">duel(fn)(data,...).toDOM(id);</script>`
    fn build_deferred_code_block(&mut self, client_code: &str, arg_size: usize) {
        self.has_scripts = true;
        self.write_script_open(true);
        let id = self.emit_client_id();
        self.formatter.write_close_attribute(&mut self.buffer);
        self.formatter.write_close_element_begin_tag(&mut self.buffer);
        self.ensure_extras(false);

        self.buffer.push_str("duel(");
        self.buffer.push_str(client_code);
        self.buffer.push_str(")(");
        self.emit_bound_args(arg_size);
        self.buffer.push_str(").toDOM(");
        self.flush_buffer();
        self.add(data_encode(id));
        self.buffer.push_str(");");
        self.formatter.write_element_end_tag(&mut self.buffer, "script");
    }

    /// Translates a fragment into an expression on the current view type.
    fn translate_expression(&mut self, block: &CodeBlockNode, can_defer: bool) -> Result<Translated> {
        let client_code = self.client_code(block);
        let result = ScriptTranslator::new(&mut self.view_type)
            .translate(&client_code)
            .map_err(|err| remap_error(err, block, &client_code))?;

        let has_extras = result.has_extras();
        let reads_extras = !result.extra_refs.is_empty();

        let method = match result.method() {
            Some(method) => method.clone(),
            None => return Err(CompilerError::syntax("Node should start with method", block.position)),
        };

        let expr = match inline_method(&method) {
            Some(expr) => {
                for member in result.members.into_iter().skip(1) {
                    self.view_type.add(member);
                }
                expr
            }
            None => {
                for member in result.members {
                    self.view_type.add(member);
                }
                invoke_this(
                    method.return_type.clone(),
                    method.name.clone(),
                    render_params().iter().map(Parameter::var_ref).collect(),
                )
            }
        };

        let mut hybrid = false;
        if has_extras {
            if can_defer {
                self.needs_extras = true;
                hybrid = true;
            } else if reads_extras {
                tracing::info!(
                    "Cannot defer block. Ensure extras are passed to {}: {}",
                    self.view_type.full_name(),
                    block
                );
            }
        }

        Ok(Translated { expr, hybrid })
    }

    //// Output helpers

    fn client_code(&self, block: &CodeBlockNode) -> String {
        block.client_code(self.encoder.is_pretty_print())
    }

    fn emit_value(&self, expr: Expression, html_encode: bool) -> Statement {
        if html_encode {
            self.emit_expression_safe(expr)
        } else {
            emit_expression(expr)
        }
    }

    /// Writes `expr` HTML-encoded, encoding at compile time where the value is known.
    fn emit_expression_safe(&self, expr: Expression) -> Statement {
        let result_type = expr.result_type();
        if result_type.is_boolean()
            || result_type.is_number()
            || (result_type.is_scalar() && result_type != CodeType::Char)
        {
            return emit_expression(expr);
        }

        if let Some(value) = expr.as_primitive() {
            let text = match value {
                Primitive::Null | Primitive::Undefined => String::new(),
                other => other.as_string(),
            };
            let encoded = self.formatter.encode_literal(&text, self.settings.encode_non_ascii);
            return emit_expression(primitive(encoded));
        }

        expr_stmt(invoke_this(CodeType::Void, "htmlEncode", vec![context_ref(), expr]))
    }

    /// Emits the one-time client runtime setup unless this path already has it.
    fn ensure_extras(&mut self, needs_tags: bool) {
        if !self.needs_extras {
            return;
        }

        self.flush_buffer();
        self.add(expr_stmt(invoke_this(
            CodeType::Void,
            "writeExtras",
            vec![context_ref(), primitive(needs_tags)],
        )));

        // a branch or loop body may never run
        if self.scopes.iter().all(|scope| scope.method_owned) {
            self.needs_extras = false;
        }
    }

    /// Declares and writes a fresh client id, returning a reference to it.
    fn emit_client_id(&mut self) -> Expression {
        self.flush_buffer();
        let id_decl = next_id(&mut self.view_type);
        let id_ref = id_decl.var_ref();
        self.add(id_decl);
        self.add(emit_expression(id_ref.clone()));
        id_ref
    }

    /// `<script` plus the optional type attribute, and ` id="` when requested.
    fn write_script_open(&mut self, with_id: bool) {
        self.formatter.write_open_element_begin_tag(&mut self.buffer, "script");
        if self.settings.script_type_attr {
            self.formatter
                .write_attribute(&mut self.buffer, "type", Some(SCRIPT_TYPE));
        }
        if with_id {
            self.formatter.write_open_attribute(&mut self.buffer, "id");
        }
    }

    /// Data-encodes the leading `arg_size` bound values into the script.
    fn emit_bound_args(&mut self, arg_size: usize) {
        for (i, param) in render_params().iter().skip(1).take(arg_size).enumerate() {
            if i > 0 {
                self.push_separator();
            }
            self.flush_buffer();
            self.add(data_encode(param.var_ref()));
        }
    }

    fn push_separator(&mut self) {
        self.buffer.push(',');
        if self.encoder.is_pretty_print() {
            self.buffer.push(' ');
        }
    }

    //// Scope stack

    fn add(&mut self, stmt: impl Into<Statement>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.statements.push(stmt.into());
        }
    }

    fn pop_scope(&mut self) -> Vec<Statement> {
        self.scopes.pop().map(|scope| scope.statements).unwrap_or_default()
    }

    /// Collects the statements `build` adds into a nested sequence.
    fn frame<F>(&mut self, method_owned: bool, build: F) -> Result<Vec<Statement>>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.scopes.push(Scope {
            statements: Vec::new(),
            method_owned,
        });
        let built = build(self);
        self.flush_buffer();
        let statements = self.pop_scope();
        built.map(|_| statements)
    }

    /// Infallible variant of [`frame`](Self::frame) for conditional bodies.
    fn scoped<F>(&mut self, build: F) -> Vec<Statement>
    where
        F: FnOnce(&mut Self),
    {
        self.scopes.push(Scope::default());
        build(self);
        self.flush_buffer();
        self.pop_scope()
    }

    fn build_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.build_node(node)?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let literal = std::mem::take(&mut self.buffer);
        let mut chars = literal.chars();
        let value = match (chars.next(), chars.next()) {
            (Some(ch), None) => Primitive::Char(ch),
            _ => Primitive::String(literal),
        };
        self.add(emit_expression(primitive(value)));
    }
}

/// Collapses whitespace runs, dropping leading and trailing line breaks.
pub(crate) fn normalize_literal(value: &str) -> String {
    let trimmed = LEADING_NEWLINES.replace(value, "");
    let trimmed = TRAILING_NEWLINES.replace(&trimmed, "");
    let collapsed = WHITESPACE_RUN.replace_all(&trimmed, " ");
    if collapsed.is_empty() {
        " ".to_string()
    } else {
        collapsed.into_owned()
    }
}

/// Markup expressions translate as plain expressions but skip HTML encoding.
fn unwrap_markup(block: &CodeBlockNode) -> (CodeBlockNode, bool) {
    match block.kind {
        CodeBlockKind::Markup => (block.as_expression(), false),
        _ => (block.clone(), true),
    }
}

/// Command attributes given as literal text are expressions.
fn command_block(node: Option<&Node>) -> Option<CodeBlockNode> {
    match node? {
        Node::CodeBlock(block) => Some(block.clone()),
        Node::Literal(text) => Some(CodeBlockNode {
            kind: CodeBlockKind::Expression,
            value: text.value.clone(),
            position: text.position,
        }),
        _ => None,
    }
}

fn call_view_name(node: Option<&Node>) -> Option<String> {
    match node? {
        Node::Literal(text) => Some(text.value.clone()),
        Node::CodeBlock(block) if block.kind == CodeBlockKind::Expression => Some(block.value.clone()),
        _ => None,
    }
}

fn emit_expression(expr: Expression) -> Statement {
    expr_stmt(invoke_this(CodeType::Void, "write", vec![context_ref(), expr]))
}

fn data_encode(expr: Expression) -> Statement {
    expr_stmt(invoke_this(CodeType::Void, "dataEncode", vec![context_ref(), expr, primitive(1)]))
}

fn transform_url(expr: Expression) -> Expression {
    invoke_this(CodeType::String, "transformURL", vec![context_ref(), ensure_string(expr)])
}

/// `String id_N = this.nextID(context)`
fn next_id(scope: &mut dyn IdentifierScope) -> VariableDeclStatement {
    VariableDeclStatement::new(
        CodeType::String,
        scope.next_ident("id_"),
        Some(invoke_this(CodeType::String, "nextID", vec![context_ref()])),
    )
}

fn is_defined(value: Expression) -> Expression {
    binary(BinaryOperator::IdentityInequality, value, undefined_expr())
}

fn is_undefined(value: Expression) -> Expression {
    binary(BinaryOperator::IdentityEquality, value, undefined_expr())
}

/// Moves a fragment-relative translation error to its place in the template.
fn remap_error(err: CompilerError, block: &CodeBlockNode, client_code: &str) -> CompilerError {
    let (message, index) = match err {
        CompilerError::Translation { message, index, .. } => (message, index),
        other => return other,
    };

    // where the block's value starts inside the wrapper
    let leading = block.value.len() - block.value.trim_start().len();
    let prefix = client_code.find(block.value.trim()).unwrap_or(0);
    let offset = (index + leading).saturating_sub(prefix).min(block.value.len());

    let local = SourcePosition::locate(&block.value, offset);
    let base = block.position.unwrap_or_else(|| SourcePosition::new(0, 1, 0));
    let column = if local.line == 1 {
        base.column + local.column
    } else {
        local.column
    };
    CompilerError::translation(
        message,
        SourcePosition::new(base.index + offset, base.line + local.line - 1, column),
    )
}
