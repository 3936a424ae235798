//! Unit tests for the parser module.
//!
//! This module contains tests for parsing the language constructs:
//! - Packages, methods and scopes
//! - Local declarations, assignments and returns
//! - Values, method calls and right-associative operations
//! - Operator composition
//! - Type syntax (referencing, qualified names, arrays, tuples)
//! - Error reporting and recovery

use rstest::rstest;

use crate::{
    ast::{
        ast::{Ast, Node, NodeId, Stmt, Value},
        expressions::Constant,
        operators::Operator,
        types::{AnonymousType, Dimension, PrimitiveType, Referencing, TypeName, Types},
    },
    errors::errors::Error,
    lexer::{
        lexer::tokenize,
        tokens::{Token, TokenKind},
    },
};

use super::{
    cursor::TokenCursor,
    lookups::{Parsed, ParserRegistry, Production},
    parser::{parse, Parser, MAX_VALUE_DEPTH},
};

fn parse_source(source: &str) -> (Ast, Result<(NodeId, Vec<Error>), Error>) {
    let tokens = tokenize(source).unwrap();
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let result = parse(tokens, &registry, &mut ast, "main");
    (ast, result)
}

fn parse_ok(source: &str) -> (Ast, NodeId) {
    let (ast, result) = parse_source(source);
    let (package, recovered) = result.unwrap();
    assert!(recovered.is_empty(), "unexpected errors: {:?}", recovered);
    (ast, package)
}

fn methods(ast: &Ast, package: NodeId) -> Vec<NodeId> {
    ast.node(package).as_package().unwrap().methods.clone()
}

fn body(ast: &Ast, method: NodeId) -> Vec<NodeId> {
    let body = ast.node(method).as_method().unwrap().body;
    ast.node(body).as_scope().unwrap().statements.clone()
}

fn returned_value(ast: &Ast, statement: NodeId) -> NodeId {
    match ast.node(statement) {
        Node::Stmt(Stmt::Return(ret)) => ret.value.unwrap(),
        other => panic!("expected a return, got {:?}", other),
    }
}

#[test]
fn test_parse_single_method() {
    let (ast, package) = parse_ok("int main() {\n    return 10 + 5\n}\n");

    let package_node = ast.node(package).as_package().unwrap();
    assert_eq!(package_node.name, "main");
    assert_eq!(package_node.methods.len(), 1);

    let method = ast.node(package_node.methods[0]).as_method().unwrap();
    assert_eq!(method.name.value, "main");
    assert_eq!(method.return_type, Types::INT);
    assert!(method.parameters.is_empty());

    let statements = body(&ast, package_node.methods[0]);
    assert_eq!(statements.len(), 1);

    let value = returned_value(&ast, statements[0]);
    match ast.node(value) {
        Node::Value(Value::BinaryOperation(operation)) => {
            assert_eq!(operation.operator, Operator::Add);
        }
        other => panic!("expected a binary operation, got {:?}", other),
    }
}

#[test]
fn test_parse_overloads_and_calls() {
    let source = "int foo(int a) {\n return a\n}\n\
                  int foo(int a, long b) {\n return a\n}\n\
                  int main() {\n return foo(1, 2L)\n}\n";
    let (ast, package) = parse_ok(source);

    let methods = methods(&ast, package);
    assert_eq!(methods.len(), 3);
    assert_eq!(ast.node(methods[1]).as_method().unwrap().parameters.len(), 2);

    let call = returned_value(&ast, body(&ast, methods[2])[0]);
    match ast.node(call) {
        Node::Value(Value::MethodCall(call)) => {
            assert_eq!(call.name.value, "foo");
            assert_eq!(call.arguments.len(), 2);
        }
        other => panic!("expected a method call, got {:?}", other),
    }
}

#[test]
fn test_parse_locals_and_assignment() {
    let source = "int main() {\n let a = 1\n mut b = a\n b = 3; return b\n}\n";
    let (ast, package) = parse_ok(source);

    let statements = body(&ast, methods(&ast, package)[0]);
    assert_eq!(statements.len(), 4);
    assert!(matches!(ast.node(statements[0]), Node::Stmt(Stmt::ImmutableLocal(_))));
    assert!(matches!(ast.node(statements[1]), Node::Stmt(Stmt::MutableLocal(_))));
    assert!(matches!(ast.node(statements[2]), Node::Value(Value::LocalAssign(_))));
    assert!(matches!(ast.node(statements[3]), Node::Stmt(Stmt::Return(_))));

    let local = ast.node(statements[0]).as_local().unwrap();
    assert_eq!(local.name.value, "a");
    assert!(local.declared_type.is_inferred());
}

#[test]
fn test_parse_void_return() {
    let (ast, package) = parse_ok("void main() {\n return\n}\n");

    let statements = body(&ast, methods(&ast, package)[0]);
    match ast.node(statements[0]) {
        Node::Stmt(Stmt::Return(ret)) => assert!(ret.value.is_none()),
        other => panic!("expected a return, got {:?}", other),
    }
}

#[test]
fn test_parse_call_statement() {
    let (ast, package) = parse_ok("void main() {\n log(1, x)\n return\n}\n");

    let statements = body(&ast, methods(&ast, package)[0]);
    assert_eq!(statements.len(), 2);
    match ast.node(statements[0]) {
        Node::Value(Value::MethodCall(call)) => {
            assert_eq!(call.name.value, "log");
            assert_eq!(call.arguments.len(), 2);
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_parse_empty_statements_are_skipped() {
    let (ast, package) = parse_ok("int main() { ;; return 0; ; }");
    assert_eq!(body(&ast, methods(&ast, package)[0]).len(), 1);
}

#[test]
fn test_operations_are_right_associative() {
    let (ast, package) = parse_ok("int main() { return 1 - 2 - 3 }");

    let value = returned_value(&ast, body(&ast, methods(&ast, package)[0])[0]);
    let Node::Value(Value::BinaryOperation(outer)) = ast.node(value) else {
        panic!("expected a binary operation");
    };

    assert!(matches!(ast.node(outer.left), Node::Value(Value::Literal(_))));
    assert!(matches!(
        ast.node(outer.right),
        Node::Value(Value::BinaryOperation(_))
    ));
}

#[test]
fn test_literal_values_are_decoded() {
    let (ast, package) = parse_ok("int main() { return 0x10 }");

    let value = returned_value(&ast, body(&ast, methods(&ast, package)[0])[0]);
    match ast.node(value) {
        Node::Value(Value::Literal(literal)) => {
            assert_eq!(literal.constant, Constant::Integer(16));
        }
        other => panic!("expected a literal, got {:?}", other),
    }
}

#[test]
fn test_parse_type_syntax() {
    let source = "ref** int[] foo((int a, bool b) pair, mut long x, std.io.File[3][n] y) {\n return x\n}\n";
    let (ast, package) = parse_ok(source);

    let method = ast.node(methods(&ast, package)[0]).as_method().unwrap();
    assert_eq!(method.return_type.referencing(), Referencing::Ref(3));
    assert_eq!(method.return_type.array().dimensions, vec![Dimension::Inferred]);
    assert_eq!(method.return_type.to_string(), "ref** int[]");

    let pair = &method.parameters[0].type_;
    match pair {
        AnonymousType::Tuple(tuple) => {
            assert_eq!(tuple.members.len(), 2);
            assert_eq!(tuple.members[0].member_name().unwrap().value, "a");
        }
        other => panic!("expected a tuple, got {:?}", other),
    }
    assert_eq!(method.parameters[0].name.value, "pair");

    assert_eq!(method.parameters[1].type_.referencing(), Referencing::Mut);
    assert_eq!(
        method.parameters[1].type_.as_value().primitive(),
        Some(PrimitiveType::Long)
    );

    match &method.parameters[2].type_ {
        AnonymousType::Scalar(scalar) => {
            assert_eq!(
                scalar.name,
                TypeName::Complex(vec!["std".into(), "io".into(), "File".into()])
            );
            assert_eq!(
                scalar.array.dimensions,
                vec![Dimension::Constant(3), Dimension::Dynamic("n".into())]
            );
        }
        other => panic!("expected a scalar, got {:?}", other),
    }
}

#[rstest]
#[case(&["=", "+", "+"], vec![Operator::Assign, Operator::Increment])]
#[case(&["&", "&", "!"], vec![Operator::And, Operator::Not])]
#[case(&["=", "="], vec![Operator::Equal])]
#[case(&["-", ">"], vec![Operator::Arrow])]
#[case(&["+", "="], vec![Operator::AddEqual])]
#[case(&["!"], vec![Operator::Not])]
#[case(&[":", ":"], vec![Operator::Lambda])]
#[case(&[":"], vec![Operator::Slice])]
fn test_operator_composition(#[case] symbols: &[&str], #[case] expected: Vec<Operator>) {
    let tokens = symbols
        .iter()
        .map(|symbol| {
            let kind = if *symbol == ":" {
                TokenKind::Colon
            } else {
                TokenKind::Operator
            };
            Token::of(kind, symbol)
        })
        .collect();

    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let mut parser = Parser::new(tokens, &registry, &mut ast);

    let mut operators = Vec::new();
    while !parser.cursor().is_at_end() {
        operators.push(parser.next_operator().unwrap().0);
    }
    assert_eq!(operators, expected);
}

#[test]
fn test_unknown_operator() {
    let tokens = vec![Token::of(TokenKind::Operator, "&")];
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let mut parser = Parser::new(tokens, &registry, &mut ast);

    assert_eq!(parser.next_operator().unwrap_err().code(), 206);
}

#[test]
fn test_separated_operators_do_not_compose() {
    let (ast, package) = parse_ok("int main() { let a = 1 == 2\n return a }");
    let statements = body(&ast, methods(&ast, package)[0]);
    let local = ast.node(statements[0]).as_local().unwrap();

    let Node::Value(Value::BinaryOperation(operation)) = ast.node(local.value) else {
        panic!("expected a binary operation");
    };
    assert_eq!(operation.operator, Operator::Equal);

    // `=` followed by a detached `=` leaves no value for the right side
    let (_, result) = parse_source("int main() { let a = 1 = = 2\n return a }");
    let (_, recovered) = result.unwrap();
    assert_eq!(recovered[0].code(), 204);
}

#[rstest]
#[case("int main() { return 1 2 }", 204)]
#[case("int main() { return a b }", 201)]
#[case("int main() { return f(1 2) }", 204)]
#[case("int main() { return f(a b) }", 201)]
#[case("int f(int a int b) { return a }", 201)]
#[case("int main() { foo }", 203)]
#[case("int main() { let = 1 }", 201)]
#[case("int main() { return 99999999999 }", 205)]
fn test_method_errors_are_recovered(#[case] source: &str, #[case] code: u32) {
    let (_, result) = parse_source(source);
    let (_, recovered) = result.unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].code(), code);
}

#[test]
fn test_value_nesting_is_limited() {
    let chain = |operators: usize| format!("int main() {{ return {}1 }}", "1 + ".repeat(operators));

    let (_, result) = parse_source(&chain(MAX_VALUE_DEPTH - 1));
    assert!(result.unwrap().1.is_empty());

    for source in [
        chain(MAX_VALUE_DEPTH),
        chain(10_000),
        format!("int main() {{ return {}1{} }}", "f(".repeat(10_000), ")".repeat(10_000)),
    ] {
        let (_, result) = parse_source(&source);
        let (_, recovered) = result.unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].code(), 204);
    }
}

#[test]
fn test_end_of_input_is_distinct() {
    let (_, result) = parse_source("int main() {\n return 1\n");
    let (_, recovered) = result.unwrap();
    assert_eq!(recovered[0].code(), 202);

    let (_, result) = parse_source("int main( {}");
    let (_, recovered) = result.unwrap();
    assert_eq!(recovered[0].code(), 201);
}

#[test]
fn test_recovery_continues_with_next_method() {
    let source = "int broken( {\n}\nint ok() {\n return 1\n}\n";
    let (ast, result) = parse_source(source);
    let (package, recovered) = result.unwrap();

    assert_eq!(recovered.len(), 1);
    let methods = methods(&ast, package);
    assert_eq!(methods.len(), 2);
    assert!(matches!(ast.node(methods[0]), Node::Error(_)));
    assert_eq!(ast.node(methods[1]).as_method().unwrap().name.value, "ok");
}

#[test]
fn test_registry_has_every_production() {
    let registry = ParserRegistry::new();
    assert_eq!(registry.len(), Production::ALL.len());
    assert!(Production::ALL
        .iter()
        .all(|production| registry.get(*production).is_some()));
}

fn wrong_literal(_: &mut Parser) -> Result<Parsed, Error> {
    Ok(Parsed::Arguments(Vec::new()))
}

#[test]
fn test_facade_dispatches_through_registry() {
    let mut registry = ParserRegistry::new();
    registry.register(Production::Literal, wrong_literal);

    let tokens = tokenize("int main() { return 1 }").unwrap();
    let mut ast = Ast::new();
    let (_, recovered) = parse(tokens, &registry, &mut ast, "main").unwrap();

    assert_eq!(recovered[0].code(), 207);
}

#[test]
fn test_cursor_peek_any_does_not_advance() {
    let mut cursor = TokenCursor::new(vec![
        Token::of(TokenKind::Identifier, "a"),
        Token::of(TokenKind::Comma, ","),
    ]);

    let token = cursor.peek_any(&[TokenKind::Close, TokenKind::Identifier]).unwrap();
    assert_eq!(token.value, "a");
    assert_eq!(cursor.cursor(), 0);

    let error = cursor.peek_any(&[TokenKind::Close]).unwrap_err();
    assert_eq!(error.code(), 201);
    assert_eq!(error.annotations()[0].token.value, "a");
    assert_eq!(cursor.cursor(), 0);

    cursor.get();
    cursor.get();
    assert_eq!(cursor.peek_any(&[TokenKind::Close]).unwrap_err().code(), 202);
    assert_eq!(cursor.peek_any(&[TokenKind::EOF]).unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_cursor_reads_eof_past_end() {
    let mut cursor = TokenCursor::new(vec![Token::of(TokenKind::Identifier, "a")]);

    assert_eq!(cursor.get(), Token::of(TokenKind::Identifier, "a"));
    assert!(cursor.is_at_end());
    assert_eq!(cursor.get().kind, TokenKind::EOF);
    assert_eq!(cursor.peek_ahead(5).kind, TokenKind::EOF);
    assert_eq!(cursor.cursor(), 1);

    let error = cursor.get_any(&[TokenKind::Close]).unwrap_err();
    assert_eq!(error.code(), 202);
}
