//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Character-by-character scanning with a small state machine
//! - Classification of keywords, types, modifiers and literals
//! - Numeric suffixes, unsigned literals and string escapes
//! - Automatic semicolon insertion from significant newlines

pub mod asi;
pub mod lexer;
pub mod tokens;
