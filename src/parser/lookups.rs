use std::{collections::HashMap, fmt::Display};

use tracing::debug;

use crate::{
    ast::{
        ast::NodeId,
        operators::Operator,
        types::{AnonymousType, Array, Referencing, TypeName},
    },
    errors::errors::Error,
    lexer::tokens::Token,
};

use super::{expr::*, parser::Parser, stmt::*, types::*};

/// Every construct the parser knows how to read.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Production {
    Referencing,
    TypeName,
    AnonymousType,
    Array,
    ScalarType,
    TupleType,
    Statement,
    Scope,
    Method,
    Literal,
    Value,
    Access,
    ImmutableLocalDeclaration,
    MutableLocalDeclaration,
    LocalAssign,
    Return,
    Operator,
    ArgumentList,
    Package,
}

impl Production {
    pub const ALL: [Production; 19] = [
        Production::Referencing,
        Production::TypeName,
        Production::AnonymousType,
        Production::Array,
        Production::ScalarType,
        Production::TupleType,
        Production::Statement,
        Production::Scope,
        Production::Method,
        Production::Literal,
        Production::Value,
        Production::Access,
        Production::ImmutableLocalDeclaration,
        Production::MutableLocalDeclaration,
        Production::LocalAssign,
        Production::Return,
        Production::Operator,
        Production::ArgumentList,
        Production::Package,
    ];
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What a parser algorithm hands back. Nodes are already in the arena.
#[derive(Debug, Clone)]
pub enum Parsed {
    Referencing(Referencing),
    TypeName(TypeName),
    Type(AnonymousType),
    Array(Array),
    Node(NodeId),
    Operator(Operator, Token),
    Arguments(Vec<NodeId>),
}

pub type ParserAlgorithm = fn(&mut Parser) -> Result<Parsed, Error>;
pub type AlgorithmLookup = HashMap<Production, ParserAlgorithm>;

/// Maps each production to its stateless algorithm. Built once per
/// compilation context and shared by every parser it creates.
pub struct ParserRegistry {
    lookup: AlgorithmLookup,
}

impl ParserRegistry {
    pub fn new() -> Self {
        let mut registry = ParserRegistry {
            lookup: HashMap::new(),
        };
        create_parser_lookups(&mut registry);
        debug!(algorithms = registry.len(), "parser registry built");
        registry
    }

    pub fn register(&mut self, production: Production, algorithm: ParserAlgorithm) {
        self.lookup.insert(production, algorithm);
    }

    pub fn get(&self, production: Production) -> Option<ParserAlgorithm> {
        self.lookup.get(&production).copied()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut productions: Vec<&Production> = self.lookup.keys().collect();
        productions.sort_by_key(|production| format!("{}", production));
        f.debug_struct("ParserRegistry")
            .field("productions", &productions)
            .finish()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry::new()
    }
}

pub fn create_parser_lookups(registry: &mut ParserRegistry) {
    // Types
    registry.register(Production::Referencing, parse_referencing);
    registry.register(Production::TypeName, parse_type_name);
    registry.register(Production::AnonymousType, parse_anonymous_type);
    registry.register(Production::Array, parse_array);
    registry.register(Production::ScalarType, parse_scalar_type);
    registry.register(Production::TupleType, parse_tuple_type);

    // Statements
    registry.register(Production::Package, parse_package);
    registry.register(Production::Method, parse_method);
    registry.register(Production::Scope, parse_scope);
    registry.register(Production::Statement, parse_statement);
    registry.register(Production::ImmutableLocalDeclaration, parse_immutable_local);
    registry.register(Production::MutableLocalDeclaration, parse_mutable_local);
    registry.register(Production::LocalAssign, parse_local_assign);
    registry.register(Production::Return, parse_return);

    // Values
    registry.register(Production::Value, parse_value);
    registry.register(Production::Literal, parse_literal);
    registry.register(Production::Access, parse_access);
    registry.register(Production::ArgumentList, parse_argument_list);
    registry.register(Production::Operator, parse_operator);
}
