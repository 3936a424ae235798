//! Unit tests for the resolver module.
//!
//! This module contains tests for:
//! - Parent wiring and post-order traversal
//! - Name lookup, shadowing and parameters
//! - Overload resolution
//! - Mutability checks on assignment
//! - Type computation for literals, operations and locals
//! - Diagnostic accumulation without duplicates

use rstest::rstest;

use crate::{
    ast::{
        ast::{Ast, Node, NodeId, NodeKind, Resolution, Value, Variable},
        types::{AnonymousType, Referencing, Types},
    },
    errors::errors::{Diagnostics, ErrorImpl, Severity},
    lexer::lexer::tokenize,
    parser::{lookups::ParserRegistry, parser::parse},
};

use super::{
    hierarchy::{build_hierarchy, traversal_order},
    resolver::{is_assignable, Resolver},
    scope::value_type,
};

fn resolve_source(source: &str) -> (Ast, NodeId, Diagnostics) {
    let tokens = tokenize(source).unwrap();
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let (package, recovered) = parse(tokens, &registry, &mut ast, "main").unwrap();
    assert!(recovered.is_empty(), "syntax errors: {:?}", recovered);

    let mut diagnostics = Diagnostics::new();
    Resolver::new(&mut ast, &mut diagnostics).resolve(&[package]);
    (ast, package, diagnostics)
}

fn nodes_of(ast: &Ast, kind: NodeKind) -> Vec<NodeId> {
    ast.ids().filter(|id| ast.node(*id).kind() == kind).collect()
}

fn methods(ast: &Ast, package: NodeId) -> Vec<NodeId> {
    ast.node(package).as_package().unwrap().methods.clone()
}

fn call_target(ast: &Ast, call: NodeId) -> Resolution<NodeId> {
    match ast.node(call) {
        Node::Value(Value::MethodCall(call)) => call.method.clone(),
        other => panic!("expected a call, got {:?}", other),
    }
}

fn access_target(ast: &Ast, access: NodeId) -> Resolution<Variable> {
    match ast.node(access) {
        Node::Value(Value::NameAccess(access)) => access.variable.clone(),
        other => panic!("expected a name access, got {:?}", other),
    }
}

#[test]
fn test_overload_resolution() {
    let source = "int foo(int a) {\n return a\n}\n\
                  int foo(int a, long b) {\n return a\n}\n\
                  int main() {\n return foo(1, 2L)\n}\n";
    let (ast, package, diagnostics) = resolve_source(source);

    assert!(diagnostics.is_empty(), "{:?}", diagnostics.codes());
    let call = nodes_of(&ast, NodeKind::MethodCall)[0];
    assert_eq!(
        call_target(&ast, call),
        Resolution::Resolved(methods(&ast, package)[1])
    );
    assert_eq!(value_type(&ast, call), Resolution::Resolved(Types::INT));
}

#[test]
fn test_unknown_overload() {
    let source = "int foo(int a) {\n return a\n}\n\
                  int foo(int a, long b) {\n return a\n}\n\
                  int main() {\n return foo(1, 2)\n}\n";
    let (ast, _, diagnostics) = resolve_source(source);

    assert_eq!(diagnostics.codes(), vec![302]);
    let error = diagnostics.iter().next().unwrap();
    assert_eq!(
        error.get_internal_error().to_string(),
        "No such method `foo(int, int)`"
    );

    let call = nodes_of(&ast, NodeKind::MethodCall)[0];
    assert_eq!(call_target(&ast, call), Resolution::Failed);
}

#[test]
fn test_forward_and_recursive_calls() {
    let source = "int main() {\n return later(1)\n}\n\
                  int later(int n) {\n return later(n)\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_unknown_variable() {
    let (ast, _, diagnostics) = resolve_source("int main() {\n return x\n}\n");

    assert_eq!(diagnostics.codes(), vec![301]);
    let access = nodes_of(&ast, NodeKind::NameAccess)[0];
    assert_eq!(access_target(&ast, access), Resolution::Failed);
}

#[test]
fn test_locals_are_visible_after_declaration_only() {
    let (_, _, diagnostics) = resolve_source("int main() {\n return a\n let a = 1\n}\n");
    assert_eq!(diagnostics.codes(), vec![301]);

    let (_, _, diagnostics) = resolve_source("int main() {\n let a = a\n return a\n}\n");
    assert_eq!(diagnostics.codes(), vec![301]);
}

#[test]
fn test_latest_declaration_wins() {
    let source = "int main() {\n let a = 1\n let a = 2L\n return a\n}\n";
    let (ast, _, diagnostics) = resolve_source(source);

    assert!(diagnostics.is_empty());
    let locals = nodes_of(&ast, NodeKind::ImmutableLocalDeclaration);
    let access = nodes_of(&ast, NodeKind::NameAccess)[0];

    assert_eq!(
        access_target(&ast, access),
        Resolution::Resolved(Variable::ImmutableLocal(locals[1]))
    );
    assert_eq!(value_type(&ast, access), Resolution::Resolved(Types::LONG));
}

#[test]
fn test_parameters_are_visible() {
    let source = "int echo(int value) {\n return value\n}\n";
    let (ast, package, diagnostics) = resolve_source(source);

    assert!(diagnostics.is_empty());
    let access = nodes_of(&ast, NodeKind::NameAccess)[0];
    assert_eq!(
        access_target(&ast, access),
        Resolution::Resolved(Variable::Parameter {
            method: methods(&ast, package)[0],
            index: 0,
        })
    );
}

#[test]
fn test_locals_do_not_leak_between_methods() {
    let source = "int first() {\n let a = 1\n return a\n}\n\
                  int second() {\n return a\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert_eq!(diagnostics.codes(), vec![301]);
}

#[test]
fn test_immutable_assignment() {
    let source = "int main() {\n let a = 1\n a = 2\n return a\n}\n";
    let (_, _, diagnostics) = resolve_source(source);

    assert_eq!(diagnostics.codes(), vec![303]);
    let error = diagnostics.iter().next().unwrap();
    let annotations = error.annotations();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].token.value, "a");
    assert!(annotations[0].message.contains("Consider changing `let` to `mut`"));
    assert_eq!(annotations[1].token.value, "=");
}

#[test]
fn test_parameter_assignment_is_rejected() {
    let (_, _, diagnostics) =
        resolve_source("int main(int a) {\n a = 2\n return a\n}\n");
    assert_eq!(diagnostics.codes(), vec![303]);
}

#[test]
fn test_mutable_assignment() {
    let source = "int main() {\n mut a = 1\n a = 2\n return a\n}\n";
    let (ast, _, diagnostics) = resolve_source(source);

    assert!(diagnostics.is_empty());
    let local = nodes_of(&ast, NodeKind::MutableLocalDeclaration)[0];
    assert_eq!(
        ast.node(local).as_local().unwrap().resolved_type,
        Resolution::Resolved(Types::INT.with_referencing(Referencing::Mut))
    );

    // reading a mutable local yields a plain value
    let access = nodes_of(&ast, NodeKind::NameAccess)[0];
    assert_eq!(value_type(&ast, access), Resolution::Resolved(Types::INT));
}

#[test]
fn test_mutable_local_passes_as_value() {
    let source = "int foo(int a) {\n return a\n}\n\
                  int main() {\n mut b = 1\n return foo(b)\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty());
}

#[rstest]
#[case("return 1 + 2L", Resolution::Resolved(Types::LONG))]
#[case("return 2.5 * 2", Resolution::Resolved(Types::DOUBLE))]
#[case("return u1 - 1", Resolution::Resolved(Types::UINT))]
#[case("return 7b / 2b", Resolution::Resolved(Types::BYTE))]
fn test_operation_types(
    #[case] statement: &str,
    #[case] expected: Resolution<AnonymousType>,
) {
    let source = format!("int main() {{\n {}\n}}\n", statement);
    let (ast, _, diagnostics) = resolve_source(&source);

    assert!(diagnostics.is_empty());
    let operation = nodes_of(&ast, NodeKind::BinaryOperation)[0];
    assert_eq!(value_type(&ast, operation), expected);
}

#[rstest]
#[case("return \"a\" + 1", vec![304])]
#[case("return 1 == 2", vec![307])]
#[case("return x + 1", vec![301])]
#[case("let b = x\n return b + 1", vec![301])]
#[case("return x + y", vec![301, 301])]
fn test_failures_are_reported_once(#[case] statements: &str, #[case] codes: Vec<u32>) {
    let source = format!("int main() {{\n {}\n}}\n", statements);
    let (_, _, diagnostics) = resolve_source(&source);
    assert_eq!(diagnostics.codes(), codes);
}

#[test]
fn test_void_value() {
    let source = "void nothing() {\n return\n}\n\
                  int main() {\n let a = nothing()\n return a\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert_eq!(diagnostics.codes(), vec![305]);

    let source = "void nothing() {\n return\n}\n\
                  int main() {\n return nothing()\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert_eq!(diagnostics.codes(), vec![305]);
}

#[test]
fn test_mixed_tuple_names_warn() {
    let (_, _, diagnostics) = resolve_source("void f((int a, bool) pair) {\n return\n}\n");

    assert_eq!(diagnostics.codes(), vec![306]);
    assert_eq!(diagnostics.iter().next().unwrap().severity(), Severity::Warning);
    assert!(!diagnostics.has_errors());
}

#[rstest]
#[case(Types::LONG, Types::INT, true)]
#[case(Types::BYTE, Types::DOUBLE, true)]
#[case(Types::INT, Types::BOOL, true)]
#[case(Types::STRING, Types::STRING, true)]
#[case(Types::INT_PTR, Types::INT_PTR, true)]
#[case(Types::INT, Types::STRING, false)]
#[case(Types::STRING, Types::CHAR, false)]
#[case(Types::INT, Types::INT_PTR, false)]
#[case(Types::VOID, Types::INT, false)]
fn test_assignability(
    #[case] expected: AnonymousType,
    #[case] found: AnonymousType,
    #[case] assignable: bool,
) {
    assert_eq!(is_assignable(&expected, &found), assignable);
}

#[rstest]
#[case("int main() {\n return \"hi\"\n}\n", "int", "string")]
#[case("string main() {\n return 1\n}\n", "string", "int")]
#[case("void main() {\n return 1\n}\n", "void", "int")]
#[case("int main() {\n return\n}\n", "int", "void")]
#[case("int main() {\n mut x = 1\n x = \"s\"\n return x\n}\n", "int", "string")]
fn test_mismatched_types(#[case] source: &str, #[case] expected: &str, #[case] found: &str) {
    let (_, _, diagnostics) = resolve_source(source);

    assert_eq!(diagnostics.codes(), vec![308]);
    assert_eq!(
        diagnostics.iter().next().unwrap().get_internal_error(),
        &ErrorImpl::MismatchedTypes {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    );
}

#[test]
fn test_mismatched_assignment_fails_the_node() {
    let source = "int main() {\n mut x = 1\n x = \"s\"\n return x\n}\n";
    let (ast, _, diagnostics) = resolve_source(source);

    let annotations = diagnostics.iter().next().unwrap().annotations();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].token.value, "s");
    assert_eq!(annotations[0].token.span.line_number, 3);
    assert_eq!(annotations[1].token.value, "x");
    assert_eq!(annotations[1].token.span.line_number, 2);

    let assign = nodes_of(&ast, NodeKind::LocalAssign)[0];
    match ast.node(assign) {
        Node::Value(Value::LocalAssign(assign)) => assert!(assign.variable.is_failed()),
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn test_arithmetic_values_convert_on_assignment() {
    let source = "long main() {\n mut x = 1\n x = 2.5\n return x\n}\n";
    let (_, _, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.codes());
}

#[test]
fn test_hierarchy_wiring() {
    let (ast, package, _) = resolve_source("int main() {\n return 1 + 2\n}\n");

    let method = methods(&ast, package)[0];
    let body = ast.node(method).as_method().unwrap().body;
    assert_eq!(ast.parent(method), Some(package));
    assert_eq!(ast.parent(body), Some(method));
    assert_eq!(ast.parent(package), None);
    assert_eq!(ast.roots(), vec![package]);
}

#[test]
fn test_traversal_is_post_order() {
    let tokens = tokenize("int main() {\n let a = 1\n return a + 2\n}\n").unwrap();
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let (package, _) = parse(tokens, &registry, &mut ast, "main").unwrap();

    build_hierarchy(&mut ast);
    let order = traversal_order(&ast, &[package]);

    assert_eq!(order.len(), ast.len());
    assert_eq!(order.last(), Some(&package));
    for (position, id) in order.iter().enumerate() {
        if let Some(parent) = ast.parent(*id) {
            let parent_position = order.iter().position(|other| *other == parent).unwrap();
            assert!(parent_position > position);
        }
    }

    // the declaration is visited before the later return
    let local = nodes_of(&ast, NodeKind::ImmutableLocalDeclaration)[0];
    let ret = nodes_of(&ast, NodeKind::Return)[0];
    let index_of = |id: NodeId| order.iter().position(|other| *other == id).unwrap();
    assert!(index_of(local) < index_of(ret));
}
