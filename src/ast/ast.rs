use crate::{lexer::tokens::Token, MK_ID};

use super::{
    expressions::{BinaryOperation, ConstantLiteral, LocalAssign, MethodCall, NameAccess},
    statements::{LocalDeclaration, Method, Package, ReturnValue, Scope},
    types::AnonymousType,
};

MK_ID!(NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Package,
    Method,
    Scope,
    ImmutableLocalDeclaration,
    MutableLocalDeclaration,
    Return,
    Literal,
    NameAccess,
    MethodCall,
    LocalAssign,
    BinaryOperation,
    Error,
    Eof,
    Empty,
}

impl NodeKind {
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal
                | NodeKind::NameAccess
                | NodeKind::MethodCall
                | NodeKind::LocalAssign
                | NodeKind::BinaryOperation
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Scope
                | NodeKind::ImmutableLocalDeclaration
                | NodeKind::MutableLocalDeclaration
                | NodeKind::Return
                | NodeKind::LocalAssign
        )
    }
}

/// Outcome of resolving one fact about a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Unresolved,
    Resolved(T),
    /// Resolution was attempted and reported, dependents stay silent.
    Failed,
}

impl<T> Resolution<T> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolution::Failed)
    }

    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Resolution::Unresolved => Resolution::Unresolved,
            Resolution::Resolved(value) => f(value),
            Resolution::Failed => Resolution::Failed,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Unresolved => Resolution::Unresolved,
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Failed => Resolution::Failed,
        }
    }
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Resolution::Unresolved
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Package(Package),
    Method(Method),
    Stmt(Stmt),
    Value(Value),
    /// Placeholder for a construct that failed to parse.
    Error(Token),
    Eof,
    Empty,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Scope(Scope),
    ImmutableLocal(LocalDeclaration),
    MutableLocal(LocalDeclaration),
    Return(ReturnValue),
}

#[derive(Debug, Clone)]
pub enum Value {
    Literal(ConstantLiteral),
    NameAccess(NameAccess),
    MethodCall(MethodCall),
    BinaryOperation(BinaryOperation),
    LocalAssign(LocalAssign),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Package(_) => NodeKind::Package,
            Node::Method(_) => NodeKind::Method,
            Node::Stmt(Stmt::Scope(_)) => NodeKind::Scope,
            Node::Stmt(Stmt::ImmutableLocal(_)) => NodeKind::ImmutableLocalDeclaration,
            Node::Stmt(Stmt::MutableLocal(_)) => NodeKind::MutableLocalDeclaration,
            Node::Stmt(Stmt::Return(_)) => NodeKind::Return,
            Node::Value(Value::Literal(_)) => NodeKind::Literal,
            Node::Value(Value::NameAccess(_)) => NodeKind::NameAccess,
            Node::Value(Value::MethodCall(_)) => NodeKind::MethodCall,
            Node::Value(Value::BinaryOperation(_)) => NodeKind::BinaryOperation,
            Node::Value(Value::LocalAssign(_)) => NodeKind::LocalAssign,
            Node::Error(_) => NodeKind::Error,
            Node::Eof => NodeKind::Eof,
            Node::Empty => NodeKind::Empty,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Package(package) => package.methods.clone(),
            Node::Method(method) => vec![method.body],
            Node::Stmt(Stmt::Scope(scope)) => scope.statements.clone(),
            Node::Stmt(Stmt::ImmutableLocal(local)) | Node::Stmt(Stmt::MutableLocal(local)) => {
                vec![local.value]
            }
            Node::Stmt(Stmt::Return(ret)) => ret.value.into_iter().collect(),
            Node::Value(Value::Literal(_)) | Node::Value(Value::NameAccess(_)) => Vec::new(),
            Node::Value(Value::MethodCall(call)) => call.arguments.clone(),
            Node::Value(Value::BinaryOperation(operation)) => {
                vec![operation.left, operation.right]
            }
            Node::Value(Value::LocalAssign(assign)) => vec![assign.value],
            Node::Error(_) | Node::Eof | Node::Empty => Vec::new(),
        }
    }

    /// The token that names or introduces the node, if it has one.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Method(method) => Some(&method.name),
            Node::Stmt(Stmt::ImmutableLocal(local)) | Node::Stmt(Stmt::MutableLocal(local)) => {
                Some(&local.name)
            }
            Node::Stmt(Stmt::Return(ret)) => Some(&ret.keyword),
            Node::Value(Value::Literal(literal)) => Some(&literal.token),
            Node::Value(Value::NameAccess(access)) => Some(&access.name),
            Node::Value(Value::MethodCall(call)) => Some(&call.name),
            Node::Value(Value::BinaryOperation(operation)) => Some(&operation.operator_token),
            Node::Value(Value::LocalAssign(assign)) => Some(&assign.name),
            Node::Error(token) => Some(token),
            Node::Package(_) | Node::Stmt(Stmt::Scope(_)) | Node::Eof | Node::Empty => None,
        }
    }

    /// `false` for the markers that end a sequence of nodes.
    pub fn has_next(&self) -> bool {
        !matches!(self, Node::Error(_) | Node::Eof)
    }

    pub fn as_package(&self) -> Option<&Package> {
        match self {
            Node::Package(package) => Some(package),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Node::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_scope(&self) -> Option<&Scope> {
        match self {
            Node::Stmt(Stmt::Scope(scope)) => Some(scope),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<&LocalDeclaration> {
        match self {
            Node::Stmt(Stmt::ImmutableLocal(local)) | Node::Stmt(Stmt::MutableLocal(local)) => {
                Some(local)
            }
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Arena owning every node of a compilation, plus the parent of each node.
///
/// Children are referenced by `NodeId`; parents are filled in once by the
/// resolver's wiring pass.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        self.parents.push(None);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// # Panics
    ///
    /// Ids are only handed out by [`Ast::alloc`], so this panics only when
    /// an id from another arena is used.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(slot) = self.parents.get_mut(child.index()) {
            *slot = Some(parent);
        }
    }

    pub(crate) fn clear_parents(&mut self) {
        self.parents.iter_mut().for_each(|parent| *parent = None);
    }

    /// Walks from `id` towards the root, `id` excluded.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId::from_raw)
    }

    /// Nodes without a parent, in allocation order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.ids().filter(|id| self.parent(*id).is_none()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A storage location a name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Parameter { method: NodeId, index: usize },
    ImmutableLocal(NodeId),
    MutableLocal(NodeId),
}

impl Variable {
    pub fn is_mutable(&self) -> bool {
        matches!(self, Variable::MutableLocal(_))
    }

    pub fn name<'a>(&self, ast: &'a Ast) -> Option<&'a Token> {
        match self {
            Variable::Parameter { method, index } => ast
                .node(*method)
                .as_method()
                .and_then(|method| method.parameters.get(*index))
                .map(|parameter| &parameter.name),
            Variable::ImmutableLocal(local) | Variable::MutableLocal(local) => {
                ast.node(*local).as_local().map(|local| &local.name)
            }
        }
    }

    /// The declared type of the storage, `mut` included for mutable locals.
    pub fn resolved_type(&self, ast: &Ast) -> Resolution<AnonymousType> {
        match self {
            Variable::Parameter { method, index } => ast
                .node(*method)
                .as_method()
                .and_then(|method| method.parameters.get(*index))
                .map_or(Resolution::Failed, |parameter| {
                    Resolution::Resolved(parameter.type_.clone())
                }),
            Variable::ImmutableLocal(local) | Variable::MutableLocal(local) => ast
                .node(*local)
                .as_local()
                .map_or(Resolution::Failed, |local| local.resolved_type.clone()),
        }
    }
}

/// How a variable read is lowered: load the stored value, or hand out the
/// storage pointer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    LoadPointer,
    KeepPointer,
}
