//! Semantic analysis core for COOL: type collection, type building,
//! type checking and `AUTO_TYPE` inference.
//!
//! [`analyze`] is the single entry point; it drives the four passes in
//! order over one [`Context`] and one [`ScopeTree`], exactly as a
//! front-end would call it after parsing.

pub mod builder;
pub mod checker;
pub mod collector;
pub mod infer;
pub mod scope;
pub mod types;

pub use scope::ScopeTree;
pub use types::Context;

use cool_ast::ast::Program;
use cool_common::Diagnostic;
use tracing::info;

/// The result of running the pipeline: the populated type context, the
/// scope tree built during checking, and every diagnostic accumulated
/// along the way. An empty `errors` list is not itself a guarantee that
/// downstream code generation is safe — callers should also check for
/// unresolved `AUTO_TYPE` slots if that matters to them.
pub struct AnalysisResult {
    pub context: Context,
    pub scopes: ScopeTree,
    pub errors: Vec<Diagnostic>,
}

/// Runs P1 through P4 over `program`, mutating it in place with
/// resolved types and scopes, iterating P4 to a fixed point as the
/// driver is permitted to by the concurrency model (re-running P4 only
/// narrows types and appends errors, so iterating it is safe and
/// deterministic).
pub fn analyze(program: &mut Program) -> AnalysisResult {
    let mut errors = Vec::new();

    let mut context = collector::collect(program, &mut errors);
    info!(classes = program.classes.len(), "P1 collected classes");

    builder::build(program, &mut context, &mut errors);
    info!("P2 built attributes and methods");

    let mut scopes = checker::check(program, &mut context, &mut errors);
    info!(errors = errors.len(), "P3 checked expressions");

    loop {
        let before = errors.len();
        let auto_before = infer::count_auto_types(&context, &scopes);
        infer::infer(program, &mut context, &mut scopes, &mut errors);
        let auto_after = infer::count_auto_types(&context, &scopes);
        info!(auto_before, auto_after, new_errors = errors.len() - before, "P4 pass");
        if auto_after >= auto_before && errors.len() == before {
            break;
        }
    }

    AnalysisResult { context, scopes, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::ast::Feature;
    use cool_ast::builder::*;

    #[test]
    fn e1_hello_world() {
        let mut program = program(vec![class(
            "Main",
            None,
            vec![Feature::Method(method(
                "main",
                vec![],
                "Object",
                dispatch(new_("IO"), None, "out_string", vec![string("hi")]),
            ))],
        )]);
        let result = analyze(&mut program);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[test]
    fn e3_missing_main_method() {
        let mut program = program(vec![class("Main", None, vec![])]);
        let result = analyze(&mut program);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn e4_bad_override() {
        let mut program = program(vec![
            class("A", None, vec![Feature::Method(method("f", vec![param("x", "Int")], "Int", int(0)))]),
            class(
                "B",
                Some("A"),
                vec![Feature::Method(method("f", vec![param("x", "String")], "Int", int(0)))],
            ),
            class("Main", None, vec![Feature::Method(method("main", vec![], "Object", int(0)))]),
        ]);
        let result = analyze(&mut program);
        assert_eq!(result.errors.len(), 1);
    }
}
