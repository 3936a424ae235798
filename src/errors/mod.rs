//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced by every stage of the
//! front end. It includes:
//!
//! - Coded error structures anchored at a source span
//! - Token annotations pointing at the offending source
//! - Severity levels, where only errors block code generation
//! - Helpful error messages and suggestions

pub mod errors;
