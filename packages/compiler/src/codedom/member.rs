//! CodeDOM Members
//!
//! Methods, fields, constructors and nested type declarations, plus the
//! identifier scope each type declaration owns.

use std::collections::HashMap;

use crate::codedom::expression::Expression;
use crate::codedom::statement::Statement;
use crate::codedom::types::{AccessModifier, CodeType};

/// Issues collision-free local names.
pub trait IdentifierScope {
    /// Generates a fresh name: `prefix` plus the next counter value for that prefix.
    fn next_ident(&mut self, prefix: &str) -> String;

    /// Maps a source-level local to a stable unique name, allocating on first use.
    fn unique_ident(&mut self, ident: &str) -> String;

    fn is_local_ident(&self, ident: &str) -> bool;
}

/// Per-prefix counters and the source-local rename map.
#[derive(Debug, Clone, Default)]
pub struct IdentAllocator {
    counters: HashMap<String, u32>,
    locals: HashMap<String, String>,
}

impl IdentAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentifierScope for IdentAllocator {
    fn next_ident(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}{}", prefix, counter)
    }

    fn unique_ident(&mut self, ident: &str) -> String {
        if let Some(unique) = self.locals.get(ident) {
            return unique.clone();
        }
        let unique = self.next_ident(&format!("{}_", ident));
        self.locals.insert(ident.to_string(), unique.clone());
        unique
    }

    fn is_local_ident(&self, ident: &str) -> bool {
        self.locals.contains_key(ident)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(Method),
    Field(Field),
    Constructor(Constructor),
    Type(TypeDeclaration),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Method(m) => &m.name,
            Member::Field(f) => &f.name,
            Member::Constructor(_) => "",
            Member::Type(t) => &t.name,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Member::Method(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub code_type: CodeType,
    pub name: String,
    pub var_args: bool,
}

impl Parameter {
    pub fn new(code_type: CodeType, name: impl Into<String>) -> Self {
        Parameter {
            code_type,
            name: name.into(),
            var_args: false,
        }
    }

    pub fn var_ref(&self) -> Expression {
        crate::codedom::expression::variable(self.code_type.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub access: AccessModifier,
    pub return_type: CodeType,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub statements: Vec<Statement>,
    pub throws: Vec<CodeType>,
    pub overrides: bool,
}

impl Method {
    pub fn new(
        access: AccessModifier,
        return_type: CodeType,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
    ) -> Self {
        Method {
            access,
            return_type,
            name: name.into(),
            parameters,
            statements: Vec::new(),
            throws: Vec::new(),
            overrides: false,
        }
    }

    pub fn with_statements(mut self, statements: Vec<Statement>) -> Self {
        self.statements = statements;
        self
    }

    pub fn with_throws(mut self, code_type: CodeType) -> Self {
        self.throws.push(code_type);
        self
    }

    pub fn with_override(mut self) -> Self {
        self.overrides = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub access: AccessModifier,
    pub code_type: CodeType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub access: AccessModifier,
    pub parameters: Vec<Parameter>,
    /// Forwarded to the base constructor
    pub base_args: Vec<Expression>,
    pub statements: Vec<Statement>,
}

/// A generated class. The allocator is construction state and does not take part in equality.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub access: AccessModifier,
    pub namespace: Option<String>,
    pub name: String,
    pub base_type: CodeType,
    pub members: Vec<Member>,
    idents: IdentAllocator,
}

impl TypeDeclaration {
    pub fn new(
        access: AccessModifier,
        namespace: Option<String>,
        name: impl Into<String>,
        base_type: CodeType,
    ) -> Self {
        TypeDeclaration {
            access,
            namespace,
            name: name.into(),
            base_type,
            members: Vec::new(),
            idents: IdentAllocator::new(),
        }
    }

    pub fn add(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = Member>) -> Self {
        self.members.extend(members);
        self
    }

    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.members.iter().find_map(|m| match m {
            Member::Method(method) if method.name == name => Some(method),
            _ => None,
        })
    }

    pub fn find_method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.members.iter_mut().find_map(|m| match m {
            Member::Method(method) if method.name == name => Some(method),
            _ => None,
        })
    }

    /// Namespace-qualified type name
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }
}

impl IdentifierScope for TypeDeclaration {
    fn next_ident(&mut self, prefix: &str) -> String {
        self.idents.next_ident(prefix)
    }

    fn unique_ident(&mut self, ident: &str) -> String {
        self.idents.unique_ident(ident)
    }

    fn is_local_ident(&self, ident: &str) -> bool {
        self.idents.is_local_ident(ident)
    }
}

impl PartialEq for TypeDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.access == other.access
            && self.namespace == other.namespace
            && self.name == other.name
            && self.base_type == other.base_type
            && self.members == other.members
    }
}
