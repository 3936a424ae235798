//! The staged compilation pipeline.
//!
//! A [`CompilationContext`] owns everything one compilation touches: the
//! configuration, the node arena, the parser registry and the diagnostics.
//! Nothing is shared between compilations. [`compile`] runs the stages in
//! order (lex, semicolon insertion, parse, wiring, the four resolution
//! phases) and returns a [`Compilation`] that code generation is driven from.

use tracing::{debug, error, info_span};

use crate::{
    ast::ast::{Ast, NodeId},
    codegen::{generator::CodeGenerator, lowering},
    config::CompilerConfig,
    errors::errors::{Diagnostics, Error},
    lexer::{
        asi::{insert_semicolons, strip_newlines},
        lexer::scan,
        tokens::{Token, TokenKind},
    },
    parser::{lookups::ParserRegistry, parser},
    resolver::resolver::Resolver,
};

/// State of a single compilation.
#[derive(Debug)]
pub struct CompilationContext {
    config: CompilerConfig,
    file: String,
    ast: Ast,
    registry: ParserRegistry,
    diagnostics: Diagnostics,
}

impl CompilationContext {
    /// Creates a context with an empty arena and a fresh parser registry.
    pub fn new(config: CompilerConfig) -> Self {
        let file = config.compiler.file_name.clone();
        CompilationContext {
            config,
            file,
            ast: Ast::new(),
            registry: ParserRegistry::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Lexes `source` and terminates statements.
    ///
    /// Lexical diagnostics are recorded in the context. When the lexer
    /// collects every error, the `Unexpected` tokens are dropped so parsing
    /// can go on.
    ///
    /// # Returns
    ///
    /// The tokens ready for parsing, or `None` when lexing stopped at an
    /// error
    pub fn tokenize(&mut self, source: &str) -> Option<Vec<Token>> {
        let stop_on_first_error = self.config.lexer.stop_on_first_error;
        let (tokens, lexical) = scan(source, stop_on_first_error);

        let failed = !lexical.is_empty();
        self.diagnostics.extend(lexical);
        if failed && stop_on_first_error {
            return None;
        }

        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|token| !token.is(TokenKind::Unexpected))
            .collect();

        Some(if self.config.lexer.insert_semicolons {
            insert_semicolons(tokens)
        } else {
            strip_newlines(tokens)
        })
    }

    /// Parses `tokens` as the root package.
    ///
    /// # Returns
    ///
    /// The package node, or `None` when the package itself could not be
    /// parsed. Errors recovered from are recorded either way.
    pub fn parse(&mut self, tokens: Vec<Token>) -> Option<NodeId> {
        let package_name = self.config.compiler.package_name.clone();
        match parser::parse(tokens, &self.registry, &mut self.ast, &package_name) {
            Ok((root, recovered)) => {
                self.diagnostics.extend(recovered);
                Some(root)
            }
            Err(err) => {
                self.diagnostics.report(err);
                None
            }
        }
    }

    /// Wires the tree under `root` and runs the resolution phases.
    pub fn resolve(&mut self, root: NodeId) {
        Resolver::new(&mut self.ast, &mut self.diagnostics).resolve(&[root]);
    }

    /// Lowers the package at `root` into `generator`.
    ///
    /// # Returns
    ///
    /// `Ok(false)` without touching the generator when an error-severity
    /// diagnostic exists or code generation is disabled, `Ok(true)` once
    /// the package has been lowered
    pub fn generate<G: CodeGenerator>(
        &self,
        root: NodeId,
        generator: &mut G,
    ) -> Result<bool, Error> {
        if self.diagnostics.has_errors() {
            error!(
                file = %self.file,
                errors = self.diagnostics.errors().count(),
                "skipping code generation"
            );
            return Ok(false);
        }
        if !self.config.codegen.enabled {
            debug!(file = %self.file, "code generation disabled");
            return Ok(false);
        }

        lowering::generate(&self.ast, root, generator)?;
        Ok(true)
    }
}

/// Outcome of running the front end over one source.
#[derive(Debug)]
pub struct Compilation {
    context: CompilationContext,
    root: Option<NodeId>,
}

impl Compilation {
    pub fn diagnostics(&self) -> &Diagnostics {
        self.context.diagnostics()
    }

    pub fn has_errors(&self) -> bool {
        self.context.diagnostics().has_errors()
    }

    pub fn context(&self) -> &CompilationContext {
        &self.context
    }

    /// The package node, absent when lexing or parsing stopped early.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Lowers the resolved package into `generator`.
    ///
    /// # Arguments
    ///
    /// * `generator` - The backend to drive
    ///
    /// # Returns
    ///
    /// Whether code was generated; `false` when it was skipped because of
    /// errors or configuration
    pub fn generate(&self, generator: &mut impl CodeGenerator) -> Result<bool, Error> {
        match self.root {
            Some(root) => self.context.generate(root, generator),
            None => {
                error!(file = %self.context.file(), "skipping code generation, nothing was parsed");
                Ok(false)
            }
        }
    }
}

/// Runs lexing, parsing and resolution over `source`.
///
/// # Arguments
///
/// * `source` - The source text of one file
/// * `config` - The configuration of this compilation
///
/// # Returns
///
/// The compilation, whose diagnostics hold every problem found on the way
pub fn compile(source: &str, config: CompilerConfig) -> Compilation {
    let span = info_span!("compile", file = %config.compiler.file_name);
    let _enter = span.enter();

    let mut context = CompilationContext::new(config);
    let root = context
        .tokenize(source)
        .and_then(|tokens| context.parse(tokens));

    if let Some(root) = root {
        context.resolve(root);
    }

    debug!(
        nodes = context.ast().len(),
        diagnostics = context.diagnostics().len(),
        "front end finished"
    );
    Compilation { context, root }
}

#[cfg(test)]
mod tests;
