//! Parser facade for building the node arena.
//!
//! This module contains the `Parser` struct handed to every parser
//! algorithm. The facade owns the token cursor and borrows the algorithm
//! registry and the arena. Each `next_*` method looks up the algorithm for
//! one production, runs it, and returns its result typed.
//!
//! Algorithms never call each other directly; they always go through the
//! facade, so any production can be replaced in the registry.

use tracing::trace;

use crate::{
    ast::{
        ast::{Ast, Node, NodeId},
        operators::Operator,
        types::{AnonymousType, Array, Referencing, ScalarType, TupleType, TypeName},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::Token,
    Span,
};

use super::{
    cursor::TokenCursor,
    lookups::{Parsed, ParserRegistry, Production},
};

/// Deepest nesting of values a program may use. Every operator in a chain
/// and every argument list adds a level.
pub const MAX_VALUE_DEPTH: usize = 256;

/// The parsing state shared by every algorithm of one run.
pub struct Parser<'a> {
    /// The token stream and read position
    cursor: TokenCursor,
    /// Algorithms by production
    registry: &'a ParserRegistry,
    /// Arena receiving every parsed node
    ast: &'a mut Ast,
    /// Name given to the root package
    package_name: String,
    /// Errors the package algorithm recovered from
    recovered: Vec<Error>,
    /// Values currently being parsed, innermost last
    value_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Tokens to parse, usually ending with EOF
    /// * `registry` - The algorithms to parse with
    /// * `ast` - The arena parsed nodes are allocated in
    ///
    /// # Returns
    ///
    /// A new Parser positioned at the first token.
    pub fn new(tokens: Vec<Token>, registry: &'a ParserRegistry, ast: &'a mut Ast) -> Self {
        Parser {
            cursor: TokenCursor::new(tokens),
            registry,
            ast,
            package_name: String::from("main"),
            recovered: Vec::new(),
            value_depth: 0,
        }
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn cursor(&self) -> &TokenCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut TokenCursor {
        &mut self.cursor
    }

    /// Returns the current token without advancing.
    pub fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    /// Advances to the next token and returns the consumed one.
    pub fn get(&mut self) -> Token {
        self.cursor.get()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = self.ast.alloc(node);
        trace!(id = ?id, kind = ?self.ast.node(id).kind(), "allocated node");
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.ast.node(id)
    }

    pub(crate) fn recover(&mut self, error: Error) {
        self.recovered.push(error);
    }

    /// Errors the parser skipped past, in the order they were met.
    pub fn take_recovered(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.recovered)
    }

    /// Runs the registered algorithm for `production`.
    ///
    /// # Arguments
    ///
    /// * `production` - The construct to parse at the current position
    ///
    /// # Returns
    ///
    /// The algorithm's result, or `MissingAlgorithm` when nothing is
    /// registered for the production
    pub fn parse(&mut self, production: Production) -> Result<Parsed, Error> {
        let algorithm = self
            .registry
            .get(production)
            .ok_or_else(|| missing(production, self.peek().span))?;

        trace!(production = %production, token = %self.peek(), "parsing");
        algorithm(self)
    }

    pub fn next_referencing(&mut self) -> Result<Referencing, Error> {
        match self.parse(Production::Referencing)? {
            Parsed::Referencing(referencing) => Ok(referencing),
            _ => Err(missing(Production::Referencing, self.peek().span)),
        }
    }

    pub fn next_type_name(&mut self) -> Result<TypeName, Error> {
        match self.parse(Production::TypeName)? {
            Parsed::TypeName(name) => Ok(name),
            _ => Err(missing(Production::TypeName, self.peek().span)),
        }
    }

    pub fn next_array(&mut self) -> Result<Array, Error> {
        match self.parse(Production::Array)? {
            Parsed::Array(array) => Ok(array),
            _ => Err(missing(Production::Array, self.peek().span)),
        }
    }

    pub fn next_anonymous_type(&mut self) -> Result<AnonymousType, Error> {
        self.next_type(Production::AnonymousType)
    }

    pub fn next_scalar_type(&mut self) -> Result<ScalarType, Error> {
        match self.next_type(Production::ScalarType)? {
            AnonymousType::Scalar(scalar) => Ok(scalar),
            AnonymousType::Tuple(_) => Err(missing(Production::ScalarType, self.peek().span)),
        }
    }

    pub fn next_tuple_type(&mut self) -> Result<TupleType, Error> {
        match self.next_type(Production::TupleType)? {
            AnonymousType::Tuple(tuple) => Ok(tuple),
            AnonymousType::Scalar(_) => Err(missing(Production::TupleType, self.peek().span)),
        }
    }

    pub fn next_package(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Package)
    }

    pub fn next_method(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Method)
    }

    pub fn next_scope(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Scope)
    }

    pub fn next_statement(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Statement)
    }

    pub fn next_immutable_local(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::ImmutableLocalDeclaration)
    }

    pub fn next_mutable_local(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::MutableLocalDeclaration)
    }

    pub fn next_local_assign(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::LocalAssign)
    }

    pub fn next_return(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Return)
    }

    /// Parses a value one level deeper than the current one, rejecting it
    /// past [`MAX_VALUE_DEPTH`] levels.
    pub fn next_value(&mut self) -> Result<NodeId, Error> {
        if self.value_depth >= MAX_VALUE_DEPTH {
            let token = self.peek().clone();
            return Err(Error::at(
                ErrorImpl::InvalidValue {
                    token: token.to_string(),
                },
                &token,
                format!("values nest deeper than {} levels", MAX_VALUE_DEPTH),
            ));
        }

        self.value_depth += 1;
        let value = self.next_node(Production::Value);
        self.value_depth -= 1;
        value
    }

    pub fn next_literal(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Literal)
    }

    pub fn next_access(&mut self) -> Result<NodeId, Error> {
        self.next_node(Production::Access)
    }

    pub fn next_argument_list(&mut self) -> Result<Vec<NodeId>, Error> {
        match self.parse(Production::ArgumentList)? {
            Parsed::Arguments(arguments) => Ok(arguments),
            _ => Err(missing(Production::ArgumentList, self.peek().span)),
        }
    }

    /// Composes the operator at the current position.
    ///
    /// # Returns
    ///
    /// The operator and a token spanning every character it was built from
    pub fn next_operator(&mut self) -> Result<(Operator, Token), Error> {
        match self.parse(Production::Operator)? {
            Parsed::Operator(operator, token) => Ok((operator, token)),
            _ => Err(missing(Production::Operator, self.peek().span)),
        }
    }

    fn next_type(&mut self, production: Production) -> Result<AnonymousType, Error> {
        match self.parse(production)? {
            Parsed::Type(type_) => Ok(type_),
            _ => Err(missing(production, self.peek().span)),
        }
    }

    fn next_node(&mut self, production: Production) -> Result<NodeId, Error> {
        match self.parse(production)? {
            Parsed::Node(id) => Ok(id),
            _ => Err(missing(production, self.peek().span)),
        }
    }
}

fn missing(production: Production, span: Span) -> Error {
    Error::new(
        ErrorImpl::MissingAlgorithm {
            production: production.to_string(),
        },
        span,
    )
}

/// Parses a whole token stream as one package.
///
/// # Arguments
///
/// * `tokens` - Tokens after semicolon insertion
/// * `registry` - The algorithms to parse with
/// * `ast` - The arena to allocate nodes in
/// * `package_name` - Name of the root package
///
/// # Returns
///
/// The package node and every error the parser recovered from. Errors the
/// package cannot recover from are returned as `Err`.
pub fn parse(
    tokens: Vec<Token>,
    registry: &ParserRegistry,
    ast: &mut Ast,
    package_name: &str,
) -> Result<(NodeId, Vec<Error>), Error> {
    let mut parser = Parser::new(tokens, registry, ast).with_package_name(package_name);
    let package = parser.next_package()?;
    Ok((package, parser.take_recovered()))
}
