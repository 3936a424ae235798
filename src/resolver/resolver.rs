use std::fmt::Display;

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Ast, Node, NodeId, NodeKind, Resolution, Stmt, Value, Variable},
        statements::signature,
        types::{AnonymousType, Referencing, Types},
    },
    errors::errors::{Diagnostics, Error, ErrorImpl},
    lexer::tokens::Token,
};

use super::{
    hierarchy::{build_hierarchy, traversal_order},
    scope::{describe, resolve_method, resolve_name, value_type},
};

/// The resolution lifecycle. Every phase visits every node before the next
/// phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Node-local checks; clears any previous resolution.
    Init,
    /// Types that need no name lookup.
    InitTypes,
    /// Package members.
    InitMembers,
    /// Names, overloads, mutability, and every remaining type.
    InitUses,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Init,
        Phase::InitTypes,
        Phase::InitMembers,
        Phase::InitUses,
    ];
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::InitTypes => "initTypes",
            Phase::InitMembers => "initMembers",
            Phase::InitUses => "initUses",
        };
        write!(f, "{}", name)
    }
}

/// Runs the resolution phases over an arena, recording every semantic
/// problem instead of stopping at the first.
pub struct Resolver<'a> {
    ast: &'a mut Ast,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Resolver<'a> {
    pub fn new(ast: &'a mut Ast, diagnostics: &'a mut Diagnostics) -> Self {
        Resolver { ast, diagnostics }
    }

    /// Wires parents, then runs each phase over the nodes reachable from
    /// `roots` in depth-first post-order.
    pub fn resolve(&mut self, roots: &[NodeId]) {
        build_hierarchy(self.ast);
        let order = traversal_order(self.ast, roots);

        for phase in Phase::ALL {
            debug!(phase = %phase, nodes = order.len(), "phase started");
            for id in &order {
                self.visit(phase, *id);
            }
            debug!(
                phase = %phase,
                errors = self.diagnostics.errors().count(),
                "phase finished"
            );
        }
    }

    fn visit(&mut self, phase: Phase, id: NodeId) {
        match phase {
            Phase::Init => self.init(id),
            Phase::InitTypes => self.init_types(id),
            Phase::InitMembers => self.init_members(id),
            Phase::InitUses => self.init_uses(id),
        }
    }

    fn init(&mut self, id: NodeId) {
        match self.ast.node_mut(id) {
            Node::Package(package) => package.clear_overloads(),
            Node::Stmt(Stmt::ImmutableLocal(local)) | Node::Stmt(Stmt::MutableLocal(local)) => {
                local.resolved_type = Resolution::Unresolved;
            }
            Node::Value(Value::Literal(literal)) => literal.value_type = Resolution::Unresolved,
            Node::Value(Value::NameAccess(access)) => access.variable = Resolution::Unresolved,
            Node::Value(Value::MethodCall(call)) => call.method = Resolution::Unresolved,
            Node::Value(Value::BinaryOperation(operation)) => {
                operation.value_type = Resolution::Unresolved;
            }
            Node::Value(Value::LocalAssign(assign)) => assign.variable = Resolution::Unresolved,
            _ => {}
        }

        let Node::Method(method) = self.ast.node(id) else {
            return;
        };

        let mut warnings = Vec::new();
        if !method.return_type.has_consistent_member_names() {
            warnings.push(Error::at(
                ErrorImpl::MixedTupleMemberNames,
                &method.name,
                "in the return type of this method",
            ));
        }
        for parameter in &method.parameters {
            if !parameter.type_.has_consistent_member_names() {
                warnings.push(Error::at(
                    ErrorImpl::MixedTupleMemberNames,
                    &parameter.name,
                    "in the type of this parameter",
                ));
            }
        }
        self.diagnostics.extend(warnings);
    }

    fn init_types(&mut self, id: NodeId) {
        match self.ast.node(id).kind() {
            NodeKind::Literal => {
                if let Node::Value(Value::Literal(literal)) = self.ast.node_mut(id) {
                    literal.value_type = Resolution::Resolved(literal.literal_type());
                }
            }
            NodeKind::BinaryOperation => self.type_operation(id, false),
            NodeKind::ImmutableLocalDeclaration | NodeKind::MutableLocalDeclaration => {
                self.type_local(id, false)
            }
            _ => {}
        }
    }

    fn init_members(&mut self, id: NodeId) {
        let Node::Package(package) = self.ast.node(id) else {
            return;
        };

        let definitions: Vec<(String, NodeId)> = package
            .methods
            .iter()
            .filter_map(|method_id| {
                self.ast
                    .node(*method_id)
                    .as_method()
                    .map(|method| (method.name.value.clone(), *method_id))
            })
            .collect();

        debug!(methods = definitions.len(), "registering package members");
        if let Node::Package(package) = self.ast.node_mut(id) {
            for (name, method) in definitions {
                package.define_method(&name, method);
            }
        }
    }

    fn init_uses(&mut self, id: NodeId) {
        match self.ast.node(id).kind() {
            NodeKind::NameAccess => self.resolve_access(id),
            NodeKind::MethodCall => self.resolve_call(id),
            NodeKind::LocalAssign => self.resolve_assign(id),
            NodeKind::BinaryOperation => self.type_operation(id, true),
            NodeKind::ImmutableLocalDeclaration | NodeKind::MutableLocalDeclaration => {
                self.type_local(id, true)
            }
            NodeKind::Return => self.check_return(id),
            _ => {}
        }
    }

    fn resolve_access(&mut self, id: NodeId) {
        let Node::Value(Value::NameAccess(access)) = self.ast.node(id) else {
            return;
        };
        if !access.variable.is_unresolved() {
            return;
        }

        let name = access.name.clone();
        let resolution = match resolve_name(self.ast, id, &name.value) {
            Some(variable) => {
                trace!(name = %name.value, variable = ?variable, "resolved name");
                Resolution::Resolved(variable)
            }
            None => {
                self.diagnostics.report(unknown_variable(&name));
                Resolution::Failed
            }
        };

        if let Node::Value(Value::NameAccess(access)) = self.ast.node_mut(id) {
            access.variable = resolution;
        }
    }

    fn resolve_call(&mut self, id: NodeId) {
        let Node::Value(Value::MethodCall(call)) = self.ast.node(id) else {
            return;
        };
        if !call.method.is_unresolved() {
            return;
        }
        let name = call.name.clone();
        let arguments = call.arguments.clone();

        let mut types = Vec::with_capacity(arguments.len());
        let mut failed = false;
        for argument in &arguments {
            match value_type(self.ast, *argument) {
                Resolution::Resolved(type_) if type_.is_void() => {
                    self.diagnostics.report(void_value(self.ast, *argument, &name));
                    failed = true;
                }
                Resolution::Resolved(type_) => types.push(type_),
                _ => failed = true,
            }
        }

        let resolution = if failed {
            Resolution::Failed
        } else {
            let signature = signature(&name.value, &types);
            match resolve_method(self.ast, id, &name.value, &types) {
                Some(method) => {
                    debug!(signature = %signature, method = ?method, "resolved overload");
                    Resolution::Resolved(method)
                }
                None => {
                    debug!(signature = %signature, "no matching overload");
                    self.diagnostics.report(Error::at(
                        ErrorImpl::UnknownMethod { signature },
                        &name,
                        "no overload takes these argument types",
                    ));
                    Resolution::Failed
                }
            }
        };

        if let Node::Value(Value::MethodCall(call)) = self.ast.node_mut(id) {
            call.method = resolution;
        }
    }

    fn resolve_assign(&mut self, id: NodeId) {
        let Node::Value(Value::LocalAssign(assign)) = self.ast.node(id) else {
            return;
        };
        if !assign.variable.is_unresolved() {
            return;
        }
        let name = assign.name.clone();
        let operator = assign.operator.clone();
        let value = assign.value;

        let resolution = match resolve_name(self.ast, id, &name.value) {
            None => {
                self.diagnostics.report(unknown_variable(&name));
                Resolution::Failed
            }
            Some(variable) if !variable.is_mutable() => {
                self.diagnostics
                    .report(immutable_assign(self.ast, variable, &name.value, &operator));
                Resolution::Failed
            }
            Some(variable) => {
                let target = variable.resolved_type(self.ast).map(|type_| type_.as_value());
                if produces_no_value(self.ast, value) {
                    self.diagnostics.report(void_value(self.ast, value, &name));
                    Resolution::Resolved(variable)
                } else if let Some(error) = target
                    .as_resolved()
                    .and_then(|target| mismatched(self.ast, target, value))
                {
                    let declared = variable.name(self.ast).unwrap_or(&name).clone();
                    let note = format!("`{}` is declared here", declared.value);
                    self.diagnostics.report(error.with_annotation(&declared, note));
                    Resolution::Failed
                } else {
                    Resolution::Resolved(variable)
                }
            }
        };

        if let Node::Value(Value::LocalAssign(assign)) = self.ast.node_mut(id) {
            assign.variable = resolution;
        }
    }

    /// Computes the result type of an operation once both operands are
    /// typed. With `finalize`, an operand that is still unknown fails it.
    fn type_operation(&mut self, id: NodeId, finalize: bool) {
        let Node::Value(Value::BinaryOperation(operation)) = self.ast.node(id) else {
            return;
        };
        if !operation.value_type.is_unresolved() {
            return;
        }
        let operator = operation.operator;
        let token = operation.operator_token.clone();

        let resolution = match (
            value_type(self.ast, operation.left),
            value_type(self.ast, operation.right),
        ) {
            (Resolution::Resolved(left), Resolution::Resolved(right)) => {
                if !operator.is_arithmetic() {
                    self.diagnostics.report(Error::at(
                        ErrorImpl::UnsupportedOperator {
                            operator: operator.to_string(),
                        },
                        &token,
                        "only arithmetic operators produce values",
                    ));
                    Resolution::Failed
                } else if let Some(result) = Types::binary_result(&left, &right) {
                    Resolution::Resolved(result)
                } else {
                    self.diagnostics.report(Error::at(
                        ErrorImpl::InvalidOperands {
                            operator: operator.to_string(),
                            left: left.to_string(),
                            right: right.to_string(),
                        },
                        &token,
                        format!("`{}` and `{}`", left, right),
                    ));
                    Resolution::Failed
                }
            }
            (Resolution::Failed, _) | (_, Resolution::Failed) => Resolution::Failed,
            _ if finalize => Resolution::Failed,
            _ => return,
        };

        if let Node::Value(Value::BinaryOperation(operation)) = self.ast.node_mut(id) {
            operation.value_type = resolution;
        }
    }

    /// A local takes its initializer's type; a mutable local's type is
    /// marked `mut` unless it already is a pointer.
    fn type_local(&mut self, id: NodeId, finalize: bool) {
        let node = self.ast.node(id);
        let mutable = node.kind() == NodeKind::MutableLocalDeclaration;
        let Some(local) = node.as_local() else {
            return;
        };
        if !local.resolved_type.is_unresolved() {
            return;
        }
        let name = local.name.clone();
        let value = local.value;

        let resolution = match value_type(self.ast, value) {
            Resolution::Resolved(type_) if type_.is_void() => {
                self.diagnostics.report(void_value(self.ast, value, &name));
                Resolution::Failed
            }
            Resolution::Resolved(type_) => Resolution::Resolved(local_type(type_, mutable)),
            Resolution::Failed => Resolution::Failed,
            Resolution::Unresolved if finalize => Resolution::Failed,
            Resolution::Unresolved => return,
        };

        if let Node::Stmt(Stmt::ImmutableLocal(local)) | Node::Stmt(Stmt::MutableLocal(local)) =
            self.ast.node_mut(id)
        {
            local.resolved_type = resolution;
        }
    }

    /// Checks the returned value against the return type of the enclosing
    /// method. A bare `return` counts as returning `void`.
    fn check_return(&mut self, id: NodeId) {
        let Node::Stmt(Stmt::Return(ret)) = self.ast.node(id) else {
            return;
        };
        let keyword = ret.keyword.clone();
        let value = ret.value;
        let Some(method) = self
            .ast
            .ancestors(id)
            .find_map(|ancestor| self.ast.node(ancestor).as_method())
        else {
            return;
        };
        let expected = method.return_type.as_value();
        let note = format!("return type of `{}`", method.signature());
        let method_name = method.name.clone();

        let error = match value {
            Some(value) if produces_no_value(self.ast, value) => {
                Some(void_value(self.ast, value, &keyword))
            }
            Some(value) => mismatched(self.ast, &expected, value)
                .map(|error| error.with_annotation(&method_name, note)),
            None if !expected.is_void() => Some(
                Error::at(
                    ErrorImpl::MismatchedTypes {
                        expected: expected.to_string(),
                        found: Types::VOID.to_string(),
                    },
                    &keyword,
                    "returns without a value",
                )
                .with_annotation(&method_name, note),
            ),
            None => None,
        };

        if let Some(error) = error {
            self.diagnostics.report(error);
        }
    }
}

/// Whether a value of type `found` can be stored where `expected` is
/// required: the types match structurally, or both are arithmetic
/// primitives that lowering converts between.
pub fn is_assignable(expected: &AnonymousType, found: &AnonymousType) -> bool {
    if expected.matches(found) {
        return true;
    }
    matches!(
        (expected.primitive(), found.primitive()),
        (Some(expected), Some(found)) if expected.is_arithmetic() && found.is_arithmetic()
    )
}

/// A 308 anchored at `value` when its type cannot be stored as `expected`.
/// Values whose type is not known yet or failed are left alone.
fn mismatched(ast: &Ast, expected: &AnonymousType, value: NodeId) -> Option<Error> {
    let Resolution::Resolved(found) = value_type(ast, value) else {
        return None;
    };
    if is_assignable(expected, &found) {
        return None;
    }

    let anchor = ast.node(value).token()?;
    Some(Error::at(
        ErrorImpl::MismatchedTypes {
            expected: expected.to_string(),
            found: found.to_string(),
        },
        anchor,
        format!("expected `{}`, found `{}`", expected, found),
    ))
}

fn produces_no_value(ast: &Ast, value: NodeId) -> bool {
    matches!(value_type(ast, value), Resolution::Resolved(type_) if type_.is_void())
}

fn local_type(type_: AnonymousType, mutable: bool) -> AnonymousType {
    match (mutable, type_.referencing()) {
        (_, Referencing::Ref(_)) => type_,
        (true, _) => type_.with_referencing(Referencing::Mut),
        (false, _) => type_.with_referencing(Referencing::None),
    }
}

fn unknown_variable(name: &Token) -> Error {
    Error::at(
        ErrorImpl::UnknownVariable {
            name: name.value.clone(),
        },
        name,
        "not found in this scope",
    )
}

fn void_value(ast: &Ast, value: NodeId, anchor: &Token) -> Error {
    Error::at(
        ErrorImpl::VoidValue {
            name: describe(ast, value),
        },
        anchor,
        "a value is required here",
    )
}

fn immutable_assign(
    ast: &Ast,
    variable: Variable,
    name: &str,
    operator: &Token,
) -> Error {
    let mut error = Error::new(
        ErrorImpl::ImmutableAssign {
            name: name.to_string(),
        },
        operator.span,
    );

    if let Some(declared) = variable.name(ast) {
        let note = match variable {
            Variable::Parameter { .. } => String::from("parameters cannot be assigned to"),
            _ => format!(
                "first assignment to `{}`. Consider changing `let` to `mut` to make it mutable",
                name
            ),
        };
        error = error.with_annotation(declared, note);
    }

    error.with_annotation(operator, "cannot assign twice to immutable variable")
}
