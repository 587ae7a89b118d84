//! Library surface behind the `coolc` binary: load a JSON-encoded AST,
//! run it through `cool-checker`'s four passes, and render the result.
//!
//! `cool-ast` carries no parser of its own (see its crate doc): this is
//! the layer that actually reads a COOL program off disk, as a
//! previously parsed `Program` serialized to JSON rather than raw
//! source text.

pub mod render;

use std::path::Path;

use anyhow::{Context as _, Result};
use cool_ast::ast::Program;
use cool_checker::AnalysisResult;

/// Deserializes a `Program` from a JSON file.
pub fn load_program(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as a COOL AST", path.display()))
}

/// Loads and fully analyzes a program. Returns the (now-annotated)
/// `Program` alongside the analysis result, since `cool-printer`'s
/// resolved-type rendering needs both.
pub fn analyze_file(path: &Path) -> Result<(Program, AnalysisResult)> {
    let mut program = load_program(path)?;
    let result = cool_checker::analyze(&mut program);
    Ok((program, result))
}
