//! Integration tests for end-to-end compilation.
//!
//! These tests verify that the complete pipeline works correctly from source
//! text through tokenization, parsing, resolution and code generation into
//! the recording backend.

use voidc::{
    ast::ast::{NodeKind, Resolution},
    codegen::recording::{RecordingGenerator, RuntimeValue},
    config::{CompilerConfig, Loader},
    driver::{compile, Compilation},
    lexer::{lexer::tokenize, tokens::TokenKind},
};

fn compile_default(source: &str) -> Compilation {
    compile(source, CompilerConfig::default())
}

fn run(source: &str, method: &str, arguments: &[RuntimeValue]) -> RuntimeValue {
    let compilation = compile_default(source);
    assert!(
        !compilation.has_errors(),
        "unexpected diagnostics: {:?}",
        compilation.diagnostics().codes()
    );

    let mut generator = RecordingGenerator::new();
    assert!(compilation.generate(&mut generator).unwrap());
    generator.run(method, arguments).unwrap()
}

#[test]
fn test_hello_world_tokens() {
    let source = "void main() {\n    println(\"Hello, World\")\n}\n";
    let tokens = tokenize(source).unwrap();

    let rendered: Vec<(TokenKind, &str)> = tokens
        .iter()
        .map(|token| (token.kind, token.value.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (TokenKind::Type, "void"),
            (TokenKind::Identifier, "main"),
            (TokenKind::Open, "("),
            (TokenKind::Close, ")"),
            (TokenKind::Begin, "{"),
            (TokenKind::Identifier, "println"),
            (TokenKind::Open, "("),
            (TokenKind::String, "Hello, World"),
            (TokenKind::Close, ")"),
            (TokenKind::Semicolon, "auto"),
            (TokenKind::End, "}"),
            (TokenKind::Semicolon, "auto"),
            (TokenKind::EOF, ""),
        ]
    );
}

#[test]
fn test_hello_world_compiles_once_println_exists() {
    let source = "void main() {\n    println(\"Hello, World\")\n}\n";
    let compilation = compile_default(source);
    assert_eq!(compilation.diagnostics().codes(), vec![302]);

    let source = "void println(string text) {\n    return\n}\n\
                  void main() {\n    println(\"Hello, World\")\n}\n";
    assert_eq!(run(source, "main", &[]), RuntimeValue::Void);
}

#[test]
fn test_void_call_statement() {
    let source = "void log(int value) {\n    return\n}\n\
                  int main() {\n    log(1); return 1\n}\n";
    assert_eq!(run(source, "main", &[]), RuntimeValue::Int(1));
}

#[test]
fn test_forward_call_across_methods() {
    let source = "int foo() {\n    return bar()\n}\n\nint bar() {\n    return 1337\n}\n";
    assert_eq!(run(source, "foo", &[]), RuntimeValue::Int(1337));
}

#[test]
fn test_return_arithmetic() {
    let source = "int main() {\n    return 10 + 5\n}\n";
    assert_eq!(run(source, "main", &[]), RuntimeValue::Int(15));
}

#[test]
fn test_long_operator_chain() {
    let source = format!("int main() {{\n    return {}1\n}}\n", "1 + ".repeat(200));
    assert_eq!(run(&source, "main", &[]), RuntimeValue::Int(201));
}

#[test]
fn test_parameter_echo() {
    let source = "int echo(int value) {\n    return value\n}\n";
    assert_eq!(
        run(source, "echo", &[RuntimeValue::Int(-12)]),
        RuntimeValue::Int(-12)
    );
}

#[test]
fn test_local_declaration() {
    let source = "int main() {\n    let a = 10\n    return a\n}\n";
    assert_eq!(run(source, "main", &[]), RuntimeValue::Int(10));

    let compilation = compile_default(source);
    let ast = compilation.context().ast();
    let local = ast
        .ids()
        .find(|id| ast.node(*id).kind() == NodeKind::ImmutableLocalDeclaration)
        .unwrap();
    let declaration = ast.node(local).as_local().unwrap();
    assert_eq!(declaration.name.value, "a");
    assert!(declaration.declared_type.is_inferred());
    assert!(declaration.resolved_type.is_resolved());
}

#[test]
fn test_overloads_and_shadowing() {
    let source = "int pick() {\n    return 1\n}\n\
                  int pick(int a) {\n    return a * 2\n}\n\
                  long main() {\n    let x = pick()\n    let x = pick(x + 20)\n    return x + 1L\n}\n";
    assert_eq!(run(source, "main", &[]), RuntimeValue::Int(43));
}

#[test]
fn test_unknown_overload_is_reported() {
    let source = "int foo(int a) {\n    return a\n}\n\
                  int main() {\n    return foo(1, 2)\n}\n";
    let compilation = compile_default(source);

    assert_eq!(compilation.diagnostics().codes(), vec![302]);
    let error = compilation.diagnostics().iter().next().unwrap();
    assert_eq!(
        error.get_internal_error().to_string(),
        "No such method `foo(int, int)`"
    );

    let mut generator = RecordingGenerator::new();
    assert!(!compilation.generate(&mut generator).unwrap());
    assert!(generator.functions().is_empty());
}

#[test]
fn test_immutable_assignment_annotations() {
    let source = "int main() {\n    let a = 1\n    a = 2\n    return a\n}\n";
    let compilation = compile_default(source);

    assert_eq!(compilation.diagnostics().codes(), vec![303]);
    let error = compilation.diagnostics().iter().next().unwrap();
    let annotations = error.annotations();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].token.span.line_number, 2);
    assert_eq!(annotations[1].token.span.line_number, 3);
}

#[test]
fn test_mismatched_types_block_generation() {
    let sources = [
        "int main() {\n    return \"hi\"\n}\n",
        "int main() {\n    mut x = 1\n    x = \"s\"\n    return x\n}\n",
    ];

    for source in sources {
        let compilation = compile_default(source);
        assert_eq!(compilation.diagnostics().codes(), vec![308], "{}", source);

        let mut generator = RecordingGenerator::new();
        assert!(!compilation.generate(&mut generator).unwrap());
        assert!(generator.functions().is_empty());
    }
}

#[test]
fn test_errors_accumulate_across_methods() {
    let source = "int first() {\n    return missing\n}\n\
                  int second() {\n    return nowhere(1)\n}\n\
                  int third() {\n    return \"text\" + 1\n}\n";
    let compilation = compile_default(source);

    // operands are typed in an earlier phase than names and calls resolve
    assert_eq!(compilation.diagnostics().codes(), vec![304, 301, 302]);
    assert!(compilation.has_errors());
}

#[test]
fn test_syntax_errors_do_not_stop_other_methods() {
    let source = "int broken() {\n    let = 1\n}\n\
                  int fine() {\n    return 2\n}\n";
    let compilation = compile_default(source);

    assert_eq!(compilation.diagnostics().codes(), vec![201]);
    let ast = compilation.context().ast();
    let methods = ast
        .ids()
        .filter(|id| ast.node(*id).kind() == NodeKind::Method)
        .count();
    assert_eq!(methods, 1);
    assert!(!compilation.generate(&mut RecordingGenerator::new()).unwrap());
}

#[test]
fn test_warnings_do_not_block_generation() {
    let source = "int first((int a, int) pair) {\n    return 1\n}\n";
    let compilation = compile_default(source);

    assert_eq!(compilation.diagnostics().codes(), vec![306]);
    assert!(!compilation.has_errors());

    let mut generator = RecordingGenerator::new();
    assert!(compilation.generate(&mut generator).unwrap());
}

#[test]
fn test_explicit_semicolons_without_insertion() {
    let config = Loader::new()
        .set_override("lexer.insert_semicolons", false)
        .unwrap()
        .build()
        .unwrap();
    let source = "int main() {\n    let a = 4;\n    return a * a;\n}\n";
    let compilation = compile(source, config);

    assert!(compilation.diagnostics().is_empty());
    let mut generator = RecordingGenerator::new();
    assert!(compilation.generate(&mut generator).unwrap());
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(16));
}

#[test]
fn test_collecting_lexical_errors() {
    let config = Loader::new()
        .set_override("lexer.stop_on_first_error", false)
        .unwrap()
        .build()
        .unwrap();
    let source = "int main() {\n    let a = 1.2.3\n    let b = 13.5L\n    return 1\n}\n";
    let compilation = compile(source, config);

    let lexical: Vec<u32> = compilation
        .diagnostics()
        .iter()
        .filter(|error| error.is_lexical())
        .map(|error| error.code())
        .collect();
    assert_eq!(lexical, vec![105, 106]);
}

#[test]
fn test_resolution_is_complete_before_generation() {
    let source = "int main() {\n    return helper(2)\n}\n\
                  int helper(int n) {\n    return n + 1\n}\n";
    let compilation = compile_default(source);
    let ast = compilation.context().ast();

    for id in ast.ids() {
        if let Some(voidc::ast::ast::Value::MethodCall(call)) = ast.node(id).as_value() {
            assert!(matches!(call.method, Resolution::Resolved(_)));
        }
    }
    assert_eq!(run(source, "main", &[]), RuntimeValue::Int(3));
}
