//! Code generation module for the compiler.
//!
//! This module defines the boundary between the resolved tree and an
//! instruction backend. It includes:
//!
//! - The `CodeGenerator` trait every backend implements
//! - The lowering pass walking a resolved package in program order
//! - A recording backend that keeps instructions as data and can run them
//! - An LLVM backend, behind the `llvm` feature

pub mod generator;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod lowering;
pub mod recording;

#[cfg(test)]
mod tests;
