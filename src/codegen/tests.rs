//! Unit tests for code generation.
//!
//! This module contains tests for:
//! - Declaration order and overload symbols
//! - Lowering of locals, assignments, calls and arithmetic
//! - Implicit conversions between arithmetic primitives
//! - The recording backend's evaluator
//! - The LLVM backend, when the `llvm` feature is enabled

use rstest::rstest;

use crate::{
    ast::{ast::Ast, ast::NodeId, types::PrimitiveType},
    errors::errors::Diagnostics,
    lexer::lexer::tokenize,
    parser::{lookups::ParserRegistry, parser::parse},
    resolver::resolver::Resolver,
};

use super::{
    generator::{BinaryInstruction, NumericKind},
    lowering::generate,
    recording::{RecordedOp, RecordingGenerator, RuntimeValue},
};

fn resolve(source: &str) -> (Ast, NodeId) {
    let tokens = tokenize(source).unwrap();
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let (package, recovered) = parse(tokens, &registry, &mut ast, "main").unwrap();
    assert!(recovered.is_empty(), "syntax errors: {:?}", recovered);

    let mut diagnostics = Diagnostics::new();
    Resolver::new(&mut ast, &mut diagnostics).resolve(&[package]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.codes());
    (ast, package)
}

fn lower(source: &str) -> RecordingGenerator {
    let (ast, package) = resolve(source);
    let mut generator = RecordingGenerator::new();
    generate(&ast, package, &mut generator).unwrap();
    generator
}

fn ops(generator: &RecordingGenerator, name: &str) -> Vec<RecordedOp> {
    generator.function(name).unwrap().instructions().cloned().collect()
}

#[test]
fn test_methods_are_declared_before_bodies() {
    let generator = lower(
        "int main() {\n return later(1)\n}\n\
         int later(int n) {\n return n\n}\n",
    );

    let names: Vec<&str> = generator
        .functions()
        .iter()
        .map(|function| function.name.as_str())
        .collect();
    assert_eq!(names, vec!["main", "later"]);
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(1));
}

#[test]
fn test_overloads_get_distinct_symbols() {
    let generator = lower(
        "int foo(int a) {\n return a\n}\n\
         int foo(int a, long b) {\n return a\n}\n\
         int main() {\n return foo(1, 2L)\n}\n",
    );

    assert!(generator.function("foo").is_some());
    assert!(generator.function("foo.1").is_some());

    let calls: Vec<String> = ops(&generator, "main")
        .into_iter()
        .filter_map(|op| match op {
            RecordedOp::Call { callee, .. } => Some(callee),
            _ => None,
        })
        .collect();
    assert_eq!(calls, vec!["foo.1".to_string()]);
}

#[test]
fn test_scope_opens_a_block() {
    let generator = lower("int main() {\n return 10 + 5\n}\n");
    let main = generator.function("main").unwrap();

    assert_eq!(
        main.body.first(),
        Some(&RecordedOp::Block {
            name: "scope".to_string()
        })
    );
    assert!(main.body.last().unwrap().is_terminator());
}

#[test]
fn test_binary_operation_lowering() {
    let generator = lower("int main() {\n return 10 + 5\n}\n");

    let instructions = ops(&generator, "main");
    assert_eq!(instructions.len(), 4);
    assert!(matches!(
        instructions[2],
        RecordedOp::Binary {
            instruction: BinaryInstruction::Add,
            kind: NumericKind::Signed,
            ..
        }
    ));
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(15));
}

#[test]
fn test_local_is_stored_then_loaded() {
    let generator = lower("int main() {\n let a = 10\n return a\n}\n");

    let kinds: Vec<String> = ops(&generator, "main")
        .iter()
        .map(|op| op.to_string())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "%0 = const int 10",
            "%1 = alloca int",
            "store %0, %1",
            "%2 = load %1",
            "ret %2",
        ]
    );
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(10));
}

#[test]
fn test_mutable_local_assignment() {
    let generator = lower("int main() {\n mut a = 1\n a = a + 41\n return a\n}\n");

    let stores = ops(&generator, "main")
        .iter()
        .filter(|op| matches!(op, RecordedOp::Store { .. }))
        .count();
    assert_eq!(stores, 2);
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(42));
}

#[test]
fn test_parameters_are_read_directly() {
    let generator = lower("int echo(int value) {\n return value\n}\n");

    assert_eq!(
        ops(&generator, "echo"),
        vec![
            RecordedOp::Parameter {
                result: super::recording::Register(0),
                index: 0
            },
            RecordedOp::Return {
                value: super::recording::Register(0)
            },
        ]
    );
    assert_eq!(
        generator.run("echo", &[RuntimeValue::Int(7)]).unwrap(),
        RuntimeValue::Int(7)
    );
}

#[test]
fn test_operands_are_converted_to_the_result_type() {
    let generator = lower("long main() {\n return 1 + 2L\n}\n");

    let conversions: Vec<(PrimitiveType, PrimitiveType)> = ops(&generator, "main")
        .into_iter()
        .filter_map(|op| match op {
            RecordedOp::Convert { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(conversions, vec![(PrimitiveType::Int, PrimitiveType::Long)]);
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(3));
}

#[test]
fn test_return_value_is_converted() {
    let generator = lower("double half() {\n return 1 / 2.0\n}\n");
    assert_eq!(generator.run("half", &[]).unwrap(), RuntimeValue::Float(0.5));

    let generator = lower("byte narrow() {\n return 300\n}\n");
    assert_eq!(generator.run("narrow", &[]).unwrap(), RuntimeValue::Int(44));
}

#[rstest]
#[case("int main() {\n return 7 / 2\n}\n", RuntimeValue::Int(3))]
#[case("int main() {\n return 2 - 5\n}\n", RuntimeValue::Int(-3))]
#[case("uint main() {\n return u7 / u2\n}\n", RuntimeValue::UInt(3))]
#[case("double main() {\n return 2.5 * 2\n}\n", RuntimeValue::Float(5.0))]
#[case("bool main() {\n return true\n}\n", RuntimeValue::Bool(true))]
#[case("string main() {\n return \"void\"\n}\n", RuntimeValue::String("void".into()))]
fn test_evaluation(#[case] source: &str, #[case] expected: RuntimeValue) {
    let generator = lower(source);
    assert_eq!(generator.run("main", &[]).unwrap(), expected);
}

#[rstest]
#[case("int main() {\n return 2147483647 + 1\n}\n", RuntimeValue::Int(-2147483648))]
#[case("byte main() {\n return 100B + 100B\n}\n", RuntimeValue::Int(-56))]
#[case("short main() {\n return 200S * 200S\n}\n", RuntimeValue::Int(-25536))]
#[case("uint main() {\n return u0 - u1\n}\n", RuntimeValue::UInt(4294967295))]
fn test_arithmetic_wraps_at_the_result_width(
    #[case] source: &str,
    #[case] expected: RuntimeValue,
) {
    let generator = lower(source);
    assert_eq!(generator.run("main", &[]).unwrap(), expected);
}

#[test]
fn test_call_statement_lowers_to_a_call() {
    let generator = lower(
        "void tick(int n) {\n return\n}\n\
         int main() {\n tick(3)\n return 0\n}\n",
    );

    let calls: Vec<RecordedOp> = ops(&generator, "main")
        .into_iter()
        .filter(|op| matches!(op, RecordedOp::Call { .. }))
        .collect();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], RecordedOp::Call { result: None, callee, .. } if callee == "tick"));
    assert_eq!(generator.run("main", &[]).unwrap(), RuntimeValue::Int(0));
}

#[test]
fn test_void_method_gets_a_terminator() {
    let generator = lower("void nothing() {\n let a = 1\n}\n");

    assert_eq!(ops(&generator, "nothing").last(), Some(&RecordedOp::ReturnVoid));
    assert_eq!(generator.run("nothing", &[]).unwrap(), RuntimeValue::Void);
}

#[test]
fn test_statements_after_return_are_not_lowered() {
    let generator = lower("int main() {\n return 1\n let a = 2\n}\n");

    let allocas = ops(&generator, "main")
        .iter()
        .filter(|op| matches!(op, RecordedOp::Alloca { .. }))
        .count();
    assert_eq!(allocas, 0);
}

#[test]
fn test_missing_return_value() {
    let (ast, package) = resolve("int main() {\n let a = 1\n}\n");
    let mut generator = RecordingGenerator::new();

    let error = generate(&ast, package, &mut generator).unwrap_err();
    assert_eq!(error.code(), 402);
}

#[test]
fn test_unresolved_tree_is_rejected() {
    let tokens = tokenize("int main() {\n return 1\n}\n").unwrap();
    let registry = ParserRegistry::new();
    let mut ast = Ast::new();
    let (package, _) = parse(tokens, &registry, &mut ast, "main").unwrap();

    let mut generator = RecordingGenerator::new();
    let error = generate(&ast, package, &mut generator).unwrap_err();
    assert_eq!(error.code(), 401);
}

#[test]
fn test_evaluation_errors() {
    let generator = lower("int main() {\n return 1 / 0\n}\n");
    assert_eq!(generator.run("main", &[]).unwrap_err().code(), 402);

    let generator = lower("int spin(int n) {\n return spin(n)\n}\n");
    assert_eq!(
        generator.run("spin", &[RuntimeValue::Int(0)]).unwrap_err().code(),
        402
    );

    let generator = lower("int main() {\n return 1\n}\n");
    assert_eq!(generator.run("missing", &[]).unwrap_err().code(), 402);
}

#[test]
fn test_function_listing() {
    let generator = lower("int main() {\n return 10 + 5\n}\n");
    let listing = generator.function("main").unwrap().to_string();

    assert_eq!(
        listing,
        "define int main() {\n\
         scope:\n  \
         %0 = const int 10\n  \
         %1 = const int 5\n  \
         %2 = sadd %0, %1\n  \
         ret %2\n\
         }"
    );
}

#[cfg(feature = "llvm")]
mod llvm {
    use inkwell::context::Context;

    use crate::codegen::{llvm::LlvmGenerator, lowering::generate};

    use super::resolve;

    #[test]
    fn test_jit_runs_forward_call() {
        let (ast, package) = resolve(
            "int foo() {\n return bar()\n}\n\
             int bar() {\n return 1337\n}\n",
        );

        let context = Context::create();
        let mut generator = LlvmGenerator::new(&context, "main.void");
        generate(&ast, package, &mut generator).unwrap();
        generator.verify().unwrap();

        assert_eq!(generator.run_function("foo", &[]).unwrap(), 1337);
    }

    #[test]
    fn test_jit_arithmetic_and_parameters() {
        let (ast, package) = resolve(
            "long widen(int a) {\n mut b = a\n b = b * 2\n return b + 1L\n}\n",
        );

        let context = Context::create();
        let mut generator = LlvmGenerator::new(&context, "main.void");
        generate(&ast, package, &mut generator).unwrap();

        assert!(generator.print_to_string().contains("define i64 @widen(i32"));
        assert_eq!(generator.run_function("widen", &[20]).unwrap(), 41);
    }
}
