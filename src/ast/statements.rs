use std::collections::HashMap;

use crate::lexer::tokens::Token;

use super::{
    ast::{NodeId, Resolution},
    types::AnonymousType,
};

/// The root of a compilation unit.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub methods: Vec<NodeId>,
    overloads: HashMap<String, Vec<NodeId>>,
}

impl Package {
    pub fn new(name: impl Into<String>, methods: Vec<NodeId>) -> Self {
        Package {
            name: name.into(),
            methods,
            overloads: HashMap::new(),
        }
    }

    /// Registers `method` as the next overload of `name`.
    pub fn define_method(&mut self, name: &str, method: NodeId) {
        self.overloads
            .entry(name.to_string())
            .or_default()
            .push(method);
    }

    /// Overloads of `name` in declaration order.
    pub fn overloads(&self, name: &str) -> &[NodeId] {
        self.overloads.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn clear_overloads(&mut self) {
        self.overloads.clear();
    }
}

#[derive(Debug, Clone)]
pub struct MethodParameter {
    pub type_: AnonymousType,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub return_type: AnonymousType,
    pub name: Token,
    pub parameters: Vec<MethodParameter>,
    pub body: NodeId,
}

impl Method {
    pub fn parameter_types(&self) -> Vec<AnonymousType> {
        self.parameters
            .iter()
            .map(|parameter| parameter.type_.clone())
            .collect()
    }

    /// `name(type, type)`, as used in diagnostics.
    pub fn signature(&self) -> String {
        signature(&self.name.value, &self.parameter_types())
    }
}

pub fn signature(name: &str, types: &[AnonymousType]) -> String {
    let types = types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", name, types)
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub statements: Vec<NodeId>,
}

/// `let name = value` or `mut name = value`; the statement kind tells the
/// two apart.
#[derive(Debug, Clone)]
pub struct LocalDeclaration {
    pub keyword: Token,
    pub name: Token,
    pub declared_type: AnonymousType,
    pub value: NodeId,
    pub resolved_type: Resolution<AnonymousType>,
}

#[derive(Debug, Clone)]
pub struct ReturnValue {
    pub keyword: Token,
    pub value: Option<NodeId>,
}
