//! AST node definitions for COOL programs.
//!
//! This crate defines only the node vocabulary the semantic analysis core
//! expects to receive: a previously parsed, untyped [`Program`]. Lexing,
//! parsing and AST construction from source text are external concerns —
//! nodes here can be built directly (see `builder` in test code) or
//! deserialized from JSON, which is what `coolc` (the reference driver
//! binary) accepts on its command line.

pub mod ast;
pub mod builder;
pub mod token;

pub use ast::*;
pub use token::Token;
