//! Layered configuration for the compiler.
//!
//! `defaults/voidc.default.toml` is embedded into the crate so the documented
//! defaults and the runtime behavior stay in sync. Hosts layer their own files
//! and overrides on top of it through [`Loader`].

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;

const DEFAULT_TOML: &str = include_str!("../defaults/voidc.default.toml");

/// Top-level configuration of one compilation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompilerConfig {
    pub compiler: CompilerSection,
    pub lexer: LexerConfig,
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompilerSection {
    /// Name given to the root package
    pub package_name: String,
    /// File name diagnostics refer to
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LexerConfig {
    /// Abort at the first lexical error instead of collecting all of them
    pub stop_on_first_error: bool,
    /// Turn statement-ending newlines into semicolons
    pub insert_semicolons: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodegenConfig {
    pub enabled: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            compiler: CompilerSection {
                package_name: "main".to_string(),
                file_name: "main.void".to_string(),
            },
            lexer: LexerConfig {
                stop_on_first_error: true,
                insert_semicolons: true,
            },
            codegen: CodegenConfig { enabled: true },
        }
    }
}

/// Layers user files and overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Starts a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layers a configuration file. A missing file fails the build.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layers a configuration file that may be absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Applies a single key/value override.
    ///
    /// # Arguments
    ///
    /// * `key` - Dotted key such as `lexer.insert_semicolons`
    /// * `value` - The value to force
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Builds the layers and deserializes the result.
    pub fn build(self) -> Result<CompilerConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<CompilerConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests;
