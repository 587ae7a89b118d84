//! Common types shared across the COOL semantic analysis crates.
//!
//! - Source spans (`Span`, `Spanned`) for diagnostics
//! - Line/column conversion for rendering errors to a terminal
//! - The `Diagnostic` type and the canonical message catalogue

pub mod diagnostics;
pub mod position;
pub mod span;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use position::{LineIndex, Position};
pub use span::{Span, Spanned};
pub use types::{ScopeId, TypeId, TypeRef};
