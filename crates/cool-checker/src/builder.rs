//! P2 — `TypeBuilder`: resolves each class's parent, installs its
//! attributes and methods into the [`Context`] built by P1, and checks
//! the program defines a usable `Main.main`.

use cool_ast::ast::{self, Feature};
use cool_ast::token::Token;
use cool_common::diagnostics::messages;
use cool_common::{Diagnostic, TypeId, TypeRef};
use tracing::trace;

use crate::types::{AttributeError, Context, MethodError, SEALED_NAMES};

/// Runs P2 over a program already ordered by P1 (parents before
/// children). Returns nothing — every result lands in `ctx` or `errors`.
pub fn build(program: &ast::Program, ctx: &mut Context, errors: &mut Vec<Diagnostic>) {
    for class in &program.classes {
        resolve_parent(class, ctx, errors);
    }
    for class in &program.classes {
        install_features(class, ctx, errors);
    }
    check_main(program, ctx, errors);
}

fn resolve_parent(class: &ast::ClassDecl, ctx: &mut Context, errors: &mut Vec<Diagnostic>) {
    let this_id = ctx
        .get_type_id(&class.name.lexeme)
        .expect("P1 registers every class before P2 runs");

    let parent_id = match &class.parent {
        None => ctx.object,
        Some(parent_tok) => {
            if SEALED_NAMES.contains(&parent_tok.lexeme.as_str()) {
                errors.push(Diagnostic::error(
                    messages::cannot_inherit_from(&parent_tok.lexeme),
                    parent_tok.span,
                ));
                ctx.object
            } else {
                match ctx.get_type_id(&parent_tok.lexeme) {
                    Some(id) => id,
                    None => {
                        errors.push(Diagnostic::error(
                            messages::cannot_inherit_from(&parent_tok.lexeme),
                            parent_tok.span,
                        ));
                        ctx.object
                    }
                }
            }
        }
    };

    ctx.set_parent(this_id, parent_id);
}

fn install_features(class: &ast::ClassDecl, ctx: &mut Context, errors: &mut Vec<Diagnostic>) {
    let owner = ctx
        .get_type_id(&class.name.lexeme)
        .expect("P1 registers every class before P2 runs");

    for feature in &class.features {
        match feature {
            Feature::Attr(attr) => {
                let ty = declared_type_ref(ctx, &attr.declared_type, errors);
                if let Err(AttributeError::Duplicate) = ctx.define_attribute(owner, &attr.name.lexeme, ty) {
                    errors.push(Diagnostic::error(
                        messages::attribute_already_defined(&attr.name.lexeme, &class.name.lexeme),
                        attr.name.span,
                    ));
                }
            }
            Feature::Method(method) => {
                let params: Vec<(String, TypeRef)> = method
                    .params
                    .iter()
                    .map(|p| (p.name.lexeme.clone(), declared_type_ref(ctx, &p.declared_type, errors)))
                    .collect();
                let return_type = declared_type_ref(ctx, &method.return_type, errors);
                if let Err(MethodError::WrongSignature) =
                    ctx.define_method(owner, &method.name.lexeme, params, return_type)
                {
                    errors.push(Diagnostic::error(
                        messages::wrong_signature(&method.name.lexeme, &class.name.lexeme),
                        method.name.span,
                    ));
                }
            }
        }
    }

    trace!(class = %class.name.lexeme, "installed features");
}

/// Resolves a declared-type token, reporting an `undefined_type`
/// diagnostic when the name isn't `SELF_TYPE`/`AUTO_TYPE`/a known class.
fn declared_type_ref(ctx: &Context, token: &Token, errors: &mut Vec<Diagnostic>) -> TypeRef {
    let ty = ctx.resolve_type_name(&token.lexeme);
    if ty == TypeRef::Error {
        errors.push(Diagnostic::error(messages::undefined_type(&token.lexeme), token.span));
    }
    ty
}

fn check_main(program: &ast::Program, ctx: &Context, errors: &mut Vec<Diagnostic>) {
    let Some(main_class) = program.classes.iter().find(|c| c.name.lexeme == "Main") else {
        errors.push(Diagnostic::error(messages::no_main_class(), cool_common::Span::dummy()));
        return;
    };
    let main_id: TypeId = ctx
        .get_type_id("Main")
        .expect("found Main in the AST so it must be registered");

    let Some(main_method) = ctx.lookup_method(main_id, "main") else {
        errors.push(Diagnostic::error(
            messages::main_must_have_main_method(),
            main_class.span,
        ));
        return;
    };

    if !main_method.params.is_empty() {
        errors.push(Diagnostic::error(
            messages::main_takes_no_params(),
            main_class.span,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::builder::*;
    use crate::collector;

    fn analyze(program: &mut ast::Program) -> (Context, Vec<Diagnostic>) {
        let mut errors = Vec::new();
        let mut ctx = collector::collect(program, &mut errors);
        build(program, &mut ctx, &mut errors);
        (ctx, errors)
    }

    #[test]
    fn missing_main_is_reported() {
        let mut program = program(vec![class("A", None, vec![])]);
        let (_, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::no_main_class());
    }

    #[test]
    fn main_without_main_method_is_reported() {
        let mut program = program(vec![class("Main", None, vec![])]);
        let (_, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::main_must_have_main_method());
    }

    #[test]
    fn main_with_args_is_reported() {
        let mut program = program(vec![class(
            "Main",
            None,
            vec![Feature::Method(method(
                "main",
                vec![param("x", "Int")],
                "Object",
                int(0),
            ))],
        )]);
        let (_, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::main_takes_no_params());
    }

    #[test]
    fn well_formed_main_has_no_errors() {
        let mut program = program(vec![class(
            "Main",
            None,
            vec![Feature::Method(method("main", vec![], "Object", int(0)))],
        )]);
        let (_, errors) = analyze(&mut program);
        assert!(errors.is_empty());
    }

    #[test]
    fn inheriting_from_sealed_class_is_rejected() {
        let mut program = program(vec![
            class("A", Some("Int"), vec![]),
            class("Main", None, vec![Feature::Method(method("main", vec![], "Object", int(0)))]),
        ]);
        let (ctx, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        let a = ctx.get_type_id("A").unwrap();
        assert_eq!(ctx.type_data(a).parent, Some(ctx.object));
    }

    #[test]
    fn undefined_attribute_type_is_reported() {
        let mut program = program(vec![
            class("A", None, vec![Feature::Attr(attr("x", "Foo", None))]),
            class("Main", None, vec![Feature::Method(method("main", vec![], "Object", int(0)))]),
        ]);
        let (_, errors) = analyze(&mut program);
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Foo")), "{errors:?}");
    }

    #[test]
    fn undefined_param_and_return_type_are_reported() {
        let mut program = program(vec![
            class(
                "A",
                None,
                vec![Feature::Method(method("f", vec![param("x", "Bar")], "Baz", int(0)))],
            ),
            class("Main", None, vec![Feature::Method(method("main", vec![], "Object", int(0)))]),
        ]);
        let (_, errors) = analyze(&mut program);
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Bar")), "{errors:?}");
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Baz")), "{errors:?}");
    }

    #[test]
    fn overriding_method_with_different_signature_is_rejected() {
        let mut program = program(vec![
            class(
                "A",
                None,
                vec![Feature::Method(method("f", vec![], "Int", int(0)))],
            ),
            class(
                "B",
                Some("A"),
                vec![Feature::Method(method("f", vec![], "Bool", boolean(true)))],
            ),
            class("Main", None, vec![Feature::Method(method("main", vec![], "Object", int(0)))]),
        ]);
        let (_, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::wrong_signature("f", "B"));
    }
}
