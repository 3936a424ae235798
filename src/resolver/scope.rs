use crate::ast::{
    ast::{Ast, Node, NodeId, Resolution, Stmt, Value, Variable},
    types::AnonymousType,
};

/// Finds the variable `name` refers to at `from`.
///
/// Walking outwards: a scope offers the locals declared by statements
/// before the one containing `from`, the latest first; a method offers its
/// parameters; the package ends the search.
pub fn resolve_name(ast: &Ast, from: NodeId, name: &str) -> Option<Variable> {
    let mut child = from;

    for ancestor in ast.ancestors(from) {
        match ast.node(ancestor) {
            Node::Stmt(Stmt::Scope(scope)) => {
                let position = scope
                    .statements
                    .iter()
                    .position(|statement| *statement == child)
                    .unwrap_or(scope.statements.len());

                for statement in scope.statements[..position].iter().rev() {
                    match ast.node(*statement) {
                        Node::Stmt(Stmt::ImmutableLocal(local)) if local.name.value == name => {
                            return Some(Variable::ImmutableLocal(*statement));
                        }
                        Node::Stmt(Stmt::MutableLocal(local)) if local.name.value == name => {
                            return Some(Variable::MutableLocal(*statement));
                        }
                        _ => {}
                    }
                }
            }
            Node::Method(method) => {
                if let Some(index) = method
                    .parameters
                    .iter()
                    .position(|parameter| parameter.name.value == name)
                {
                    return Some(Variable::Parameter {
                        method: ancestor,
                        index,
                    });
                }
            }
            Node::Package(_) => return None,
            _ => {}
        }
        child = ancestor;
    }

    None
}

/// Picks the first overload of `name`, in declaration order, whose
/// parameter types structurally match `arguments`.
pub fn resolve_method(
    ast: &Ast,
    from: NodeId,
    name: &str,
    arguments: &[AnonymousType],
) -> Option<NodeId> {
    let package = ast
        .ancestors(from)
        .find_map(|ancestor| ast.node(ancestor).as_package())?;

    package.overloads(name).iter().copied().find(|candidate| {
        ast.node(*candidate).as_method().is_some_and(|method| {
            method.parameters.len() == arguments.len()
                && method
                    .parameters
                    .iter()
                    .zip(arguments)
                    .all(|(parameter, argument)| parameter.type_.matches(argument))
        })
    })
}

/// The type a value node evaluates to, as far as it is known.
///
/// Reading a variable yields its type without `mut`; a call yields the
/// callee's return type, `void` included.
pub fn value_type(ast: &Ast, id: NodeId) -> Resolution<AnonymousType> {
    match ast.node(id) {
        Node::Value(Value::Literal(literal)) => literal.value_type.clone(),
        Node::Value(Value::BinaryOperation(operation)) => operation.value_type.clone(),
        Node::Value(Value::NameAccess(access)) => access
            .variable
            .clone()
            .and_then(|variable| variable.resolved_type(ast))
            .map(|type_| type_.as_value()),
        Node::Value(Value::MethodCall(call)) => call.method.clone().and_then(|method| {
            ast.node(method)
                .as_method()
                .map_or(Resolution::Failed, |method| {
                    Resolution::Resolved(method.return_type.clone())
                })
        }),
        Node::Value(Value::LocalAssign(assign)) => value_type(ast, assign.value),
        _ => Resolution::Failed,
    }
}

/// Short description of a value for diagnostics: the callee or variable
/// name when there is one.
pub fn describe(ast: &Ast, id: NodeId) -> String {
    match ast.node(id) {
        Node::Value(Value::MethodCall(call)) => call.name.value.clone(),
        Node::Value(Value::NameAccess(access)) => access.name.value.clone(),
        Node::Value(Value::LocalAssign(assign)) => assign.name.value.clone(),
        Node::Value(Value::Literal(literal)) => literal.token.value.clone(),
        _ => String::from("value"),
    }
}
