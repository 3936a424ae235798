//! Unit tests for the compilation pipeline.
//!
//! This module contains tests for the configuration modes of the driver
//! and for skipping code generation.

use super::*;
use crate::{codegen::recording::RecordingGenerator, config::Loader};

#[test]
fn test_context_starts_empty() {
    let context = CompilationContext::new(CompilerConfig::default());

    assert_eq!(context.file(), "main.void");
    assert!(context.ast().is_empty());
    assert!(context.diagnostics().is_empty());
    assert!(!context.registry().is_empty());
}

#[test]
fn test_stop_on_first_lexical_error() {
    let compilation = compile("int main() {\n return 1 # 2 # 3\n}\n", CompilerConfig::default());

    assert_eq!(compilation.diagnostics().codes(), vec![101]);
    assert!(compilation.root().is_none());
    assert!(compilation.context().ast().is_empty());
}

#[test]
fn test_collect_every_lexical_error() {
    let config = Loader::new()
        .set_override("lexer.stop_on_first_error", false)
        .unwrap()
        .build()
        .unwrap();
    let compilation = compile("int main() {\n return 1 # 2 # 3\n}\n", config);

    let lexical: Vec<u32> = compilation
        .diagnostics()
        .iter()
        .filter(|error| error.is_lexical())
        .map(|error| error.code())
        .collect();
    assert_eq!(lexical, vec![101, 101]);
    assert!(compilation.root().is_some());
}

#[test]
fn test_generation_is_skipped_on_errors() {
    let compilation = compile("int main() {\n return x\n}\n", CompilerConfig::default());
    let mut generator = RecordingGenerator::new();

    assert!(compilation.has_errors());
    assert!(!compilation.generate(&mut generator).unwrap());
    assert!(generator.functions().is_empty());
}

#[test]
fn test_generation_can_be_disabled() {
    let config = Loader::new()
        .set_override("codegen.enabled", false)
        .unwrap()
        .build()
        .unwrap();
    let compilation = compile("int main() {\n return 1\n}\n", config);
    let mut generator = RecordingGenerator::new();

    assert!(!compilation.generate(&mut generator).unwrap());
    assert!(generator.functions().is_empty());
}

#[test]
fn test_package_name_comes_from_config() {
    let config = Loader::new()
        .set_override("compiler.package_name", "app")
        .unwrap()
        .build()
        .unwrap();
    let compilation = compile("int main() {\n return 1\n}\n", config);

    let root = compilation.root().unwrap();
    let package = compilation.context().ast().node(root).as_package().unwrap();
    assert_eq!(package.name, "app");
}
