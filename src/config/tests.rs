//! Unit tests for configuration loading.

use std::io::Write;

use super::*;

#[test]
fn loads_default_config() {
    let config = load_defaults().expect("defaults to deserialize");
    assert_eq!(config.compiler.package_name, "main");
    assert!(config.lexer.stop_on_first_error);
    assert!(config.lexer.insert_semicolons);
    assert!(config.codegen.enabled);
    assert_eq!(config, CompilerConfig::default());
}

#[test]
fn supports_overrides() {
    let config = Loader::new()
        .set_override("lexer.insert_semicolons", false)
        .expect("override to apply")
        .set_override("compiler.file_name", "lib.void")
        .expect("override to apply")
        .build()
        .expect("config to build");
    assert!(!config.lexer.insert_semicolons);
    assert_eq!(config.compiler.file_name, "lib.void");
}

#[test]
fn layers_files_over_defaults() {
    let path = std::env::temp_dir().join(format!("voidc-config-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).expect("temp file");
    writeln!(file, "[codegen]\nenabled = false").expect("write config");

    let config = Loader::new().with_file(&path).build().expect("config to build");
    std::fs::remove_file(&path).ok();

    assert!(!config.codegen.enabled);
    assert_eq!(config.compiler.package_name, "main");
}

#[test]
fn optional_file_may_be_missing() {
    let config = Loader::new()
        .with_optional_file("does/not/exist.toml")
        .build()
        .expect("config to build");
    assert_eq!(config, CompilerConfig::default());

    assert!(Loader::new().with_file("does/not/exist.toml").build().is_err());
}
