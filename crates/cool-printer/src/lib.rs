//! Pretty printers for COOL ASTs.
//!
//! Two renderings of the same tree shape: [`ast_printer`] walks the raw
//! AST as parsed, before any pass has run; [`type_printer`] walks the
//! same shape after `cool-checker` has annotated it, showing each
//! binder's resolved type instead of its declared one.

pub mod ast_printer;
pub mod type_printer;

pub use ast_printer::print_ast;
pub use type_printer::print_resolved;
