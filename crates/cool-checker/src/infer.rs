//! P4 — `InferenceVisitor`: re-walks every class, treating `AUTO_TYPE`
//! as an inference variable instead of a type error.
//!
//! The reference back-propagates with a single recursive `update` pass
//! keyed by node kind. Rust's ownership makes that exact shape awkward
//! (it relies on mutating two objects — a `Type` and a `Scope` entry —
//! reachable from unrelated branches of the same traversal), so this
//! re-implements it as a full, idempotent downward re-visit: every call
//! to [`infer`] narrows whatever it can see this time and leaves
//! everything else untouched. [`crate::analyze`]'s fixed-point loop
//! calls it repeatedly, which reaches the same result the recursive
//! back-propagator would in one pass, just possibly over more than one
//! call — narrowing only ever moves `AUTO_TYPE` to a concrete type, so
//! repeating is always safe (§4.5's monotone-lattice framing).
//!
//! `AUTO_TYPE` resolution is modeled as forced narrowing, never as a
//! post-hoc validation: a slot that turns out to be `AUTO_TYPE` is
//! *set* to whatever the surrounding context demands, not checked
//! against it. Every genuine conformance error was already reported by
//! P3 (which only skips a check when `AUTO_TYPE` makes it unanswerable,
//! never when both sides are already concrete). So this pass never
//! pushes a new [`Diagnostic`] itself — doing so here could re-fire on
//! every fixed-point iteration once a slot settles, which would violate
//! termination. That also makes the monotonicity property (rerunning P4
//! on its own output adds nothing) hold trivially.

use cool_ast::ast::{self, Expr, ExprKind, Feature};
use cool_common::{Diagnostic, ScopeId, TypeId, TypeRef};
use cool_ast::Token;

use crate::scope::ScopeTree;
use crate::types::Context;

/// Runs one downward narrowing pass over every class. Call to a fixed
/// point (see `analyze`): each call only narrows, so repeating is safe.
pub fn infer(program: &mut ast::Program, ctx: &mut Context, scopes: &mut ScopeTree, errors: &mut Vec<Diagnostic>) {
    let _ = errors;
    for class in program.classes.iter_mut() {
        let current = ctx
            .get_type_id(&class.name.lexeme)
            .expect("P1/P2 register every class before P4 runs");
        let mut inf = Inferer { ctx, scopes, current };
        inf.infer_class(class);
    }
}

/// Counts every `AUTO_TYPE` slot still recorded in `Context` — attribute
/// types, method parameter types, and return types. The fixed-point
/// loop in `analyze` stops once this stops decreasing and no pass adds
/// errors (Testable Property 4).
pub fn count_auto_types(ctx: &Context, _scopes: &ScopeTree) -> usize {
    let mut n = 0;
    for id in ctx.type_ids() {
        let data = ctx.type_data(id);
        n += data.attributes.iter().filter(|a| a.ty == TypeRef::Auto).count();
        for m in data.methods.values() {
            if m.return_type == TypeRef::Auto {
                n += 1;
            }
            n += m.params.iter().filter(|(_, t)| *t == TypeRef::Auto).count();
        }
    }
    n
}

struct Inferer<'a> {
    ctx: &'a mut Context,
    scopes: &'a mut ScopeTree,
    current: TypeId,
}

impl<'a> Inferer<'a> {
    fn infer_class(&mut self, class: &mut ast::ClassDecl) {
        let scope = class.scope.expect("P3 always assigns a root scope");

        for feature in class.features.iter_mut() {
            let child = self.scopes.create_child(scope);
            match feature {
                Feature::Attr(attr) => self.infer_attr(attr, child),
                Feature::Method(method) => self.infer_method(method, child),
            }
        }

        // Post-pass class sweep: narrow every still-`AUTO_TYPE` attribute
        // from whatever its scope binding resolved to.
        for attr in self.ctx.attributes_in_order(self.current) {
            if attr.ty != TypeRef::Auto {
                continue;
            }
            if let Some(resolved) = self.scopes.find_variable(scope, &attr.name) {
                if resolved != TypeRef::Auto {
                    self.ctx.narrow_attribute(self.current, &attr.name, resolved);
                }
            }
        }
    }

    fn infer_attr(&mut self, attr: &mut ast::AttrDecl, scope: ScopeId) {
        let Some(init) = attr.init.as_mut() else { return };
        let declared = self
            .ctx
            .attribute_type(self.current, &attr.name.lexeme)
            .unwrap_or(TypeRef::Error);
        let expr_type = self.infer_expr(init, scope);

        if declared == TypeRef::Auto {
            if expr_type != TypeRef::Auto {
                self.scopes.narrow_variable(scope, &attr.name.lexeme, expr_type);
            }
        } else if expr_type == TypeRef::Auto {
            self.force_narrow(init, scope, declared);
        }
    }

    fn infer_method(&mut self, method: &mut ast::FuncDecl, scope: ScopeId) {
        let m = self
            .ctx
            .lookup_method(self.current, &method.name.lexeme)
            .cloned()
            .expect("P2 installs every declared method");

        for (param, (_, ty)) in method.params.iter().zip(m.params.iter()) {
            self.scopes.define_variable(scope, &param.name.lexeme, *ty);
        }

        let body_type = self.infer_expr(&mut method.body, scope);

        if m.return_type == TypeRef::Auto {
            if body_type != TypeRef::Auto {
                self.ctx
                    .narrow_method_return(self.current, &method.name.lexeme, body_type);
            }
        } else if body_type == TypeRef::Auto {
            self.force_narrow(&mut method.body, scope, m.return_type);
        }

        for (idx, param) in method.params.iter().enumerate() {
            if let Some(resolved) = self.scopes.find_variable(scope, &param.name.lexeme) {
                if resolved != TypeRef::Auto {
                    self.ctx
                        .narrow_method_param(self.current, &method.name.lexeme, idx, resolved);
                }
            }
        }
    }

    fn infer_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> TypeRef {
        if let ExprKind::LetIn { bindings, body } = &mut expr.kind {
            let (ty, child) = self.infer_let(bindings, body, scope);
            expr.scope = Some(child);
            expr.computed_type = Some(ty);
            return ty;
        }
        let ty = self.infer_expr_kind(&mut expr.kind, scope);
        expr.computed_type = Some(ty);
        ty
    }

    fn infer_expr_kind(&mut self, kind: &mut ExprKind, scope: ScopeId) -> TypeRef {
        match kind {
            ExprKind::Assign { name, value } => self.infer_assign(name, value, scope),
            ExprKind::If { cond, then_branch, else_branch, .. } => {
                self.infer_if(cond, then_branch, else_branch, scope)
            }
            ExprKind::While { cond, body, .. } => {
                self.infer_expr(cond, scope);
                self.infer_expr(body, scope);
                TypeRef::Void
            }
            ExprKind::Block { exprs } => {
                let mut last = TypeRef::Void;
                for e in exprs.iter_mut() {
                    last = self.infer_expr(e, scope);
                }
                last
            }
            ExprKind::LetIn { bindings, body } => self.infer_let(bindings, body, scope).0,
            ExprKind::CaseOf { subject, branches } => self.infer_case(subject, branches, scope),
            ExprKind::Dispatch { receiver, cast_type, method, args } => {
                self.infer_dispatch(receiver, cast_type.as_ref(), method, args, scope)
            }
            ExprKind::SelfDispatch { method, args } => self.infer_self_dispatch(method, args, scope),
            ExprKind::New { type_name } => self.ctx.resolve_type_name(&type_name.lexeme),
            ExprKind::IsVoid { expr } => {
                self.infer_expr(expr, scope);
                TypeRef::Class(self.ctx.bool_)
            }
            ExprKind::Complement { expr } => self.infer_unary(expr, scope, self.ctx.int_),
            ExprKind::Not { expr } => self.infer_unary(expr, scope, self.ctx.bool_),
            ExprKind::Equal { left, right, .. } => self.infer_equal(left, right, scope),
            ExprKind::Arith { left, right, .. } => self.infer_arith(left, right, scope),
            ExprKind::Compare { left, right, .. } => self.infer_compare(left, right, scope),
            ExprKind::Integer { .. } => TypeRef::Class(self.ctx.int_),
            ExprKind::Str { .. } => TypeRef::Class(self.ctx.string_),
            ExprKind::Bool { .. } => TypeRef::Class(self.ctx.bool_),
            ExprKind::Id { name } => self.infer_id(name, scope),
        }
    }

    fn infer_id(&mut self, name: &Token, scope: ScopeId) -> TypeRef {
        self.scopes.find_variable(scope, &name.lexeme).unwrap_or(TypeRef::Error)
    }

    fn infer_assign(&mut self, name: &Token, value: &mut Expr, scope: ScopeId) -> TypeRef {
        let expr_type = self.infer_expr(value, scope);
        if name.lexeme == "self" || !self.scopes.is_defined(scope, &name.lexeme) {
            return expr_type;
        }
        let var_type = self.scopes.find_variable(scope, &name.lexeme).unwrap();
        if var_type == TypeRef::Auto && expr_type != TypeRef::Auto {
            self.scopes.narrow_variable(scope, &name.lexeme, expr_type);
        }
        expr_type
    }

    fn infer_if(&mut self, cond: &mut Expr, then_branch: &mut Expr, else_branch: &mut Expr, scope: ScopeId) -> TypeRef {
        let cond_type = self.infer_expr(cond, scope);
        if cond_type == TypeRef::Auto {
            self.force_narrow(cond, scope, TypeRef::Class(self.ctx.bool_));
        }
        let then_type = self.infer_expr(then_branch, scope);
        let else_type = self.infer_expr(else_branch, scope);
        if then_type == TypeRef::Error || else_type == TypeRef::Error {
            TypeRef::Error
        } else if then_type == TypeRef::Auto && else_type == TypeRef::Auto {
            TypeRef::Auto
        } else {
            self.ctx.lca(self.current, &[then_type, else_type])
        }
    }

    fn infer_let(&mut self, bindings: &mut [ast::LetBinding], body: &mut Expr, scope: ScopeId) -> (TypeRef, ScopeId) {
        let child = self.scopes.create_child(scope);
        for binding in bindings.iter_mut() {
            let declared = self.ctx.resolve_type_name(&binding.declared_type.lexeme);
            self.scopes.define_variable(child, &binding.name.lexeme, declared);
            if let Some(init) = binding.init.as_mut() {
                let expr_type = self.infer_expr(init, child);
                if declared == TypeRef::Auto {
                    if expr_type != TypeRef::Auto {
                        self.scopes.narrow_variable(child, &binding.name.lexeme, expr_type);
                    }
                } else if expr_type == TypeRef::Auto {
                    self.force_narrow(init, child, declared);
                }
            }
        }
        let body_type = self.infer_expr(body, child);
        (body_type, child)
    }

    fn infer_case(&mut self, subject: &mut Expr, branches: &mut [ast::CaseBranch], scope: ScopeId) -> TypeRef {
        self.infer_expr(subject, scope);

        let mut saw_error = false;
        let mut saw_auto = false;
        let mut concrete = Vec::with_capacity(branches.len());
        for branch in branches.iter_mut() {
            let child = branch.scope.expect("P3 always assigns a branch scope");
            match self.infer_expr(&mut branch.body, child) {
                TypeRef::Error => saw_error = true,
                TypeRef::Auto => saw_auto = true,
                other => concrete.push(other),
            }
        }

        if saw_error {
            TypeRef::Error
        } else if saw_auto {
            TypeRef::Auto
        } else {
            self.ctx.lca(self.current, &concrete)
        }
    }

    fn infer_dispatch(
        &mut self,
        receiver: &mut Expr,
        cast_type: Option<&Token>,
        method: &Token,
        args: &mut [Expr],
        scope: ScopeId,
    ) -> TypeRef {
        let receiver_type = self.infer_expr(receiver, scope);
        let receiver_fixed = self.ctx.fixed_type(receiver_type, self.current);

        let lookup_on = if let Some(cast_tok) = cast_type {
            match self.ctx.resolve_type_name(&cast_tok.lexeme) {
                TypeRef::Class(id) => id,
                _ => {
                    for arg in args.iter_mut() {
                        self.infer_expr(arg, scope);
                    }
                    return TypeRef::Error;
                }
            }
        } else {
            match receiver_fixed {
                TypeRef::Class(id) => id,
                _ => {
                    for arg in args.iter_mut() {
                        self.infer_expr(arg, scope);
                    }
                    return TypeRef::Error;
                }
            }
        };

        self.infer_call(lookup_on, &method.lexeme, args, scope)
    }

    fn infer_self_dispatch(&mut self, method: &Token, args: &mut [Expr], scope: ScopeId) -> TypeRef {
        self.infer_call(self.current, &method.lexeme, args, scope)
    }

    fn infer_call(&mut self, owner: TypeId, method_name: &str, args: &mut [Expr], scope: ScopeId) -> TypeRef {
        let Some(m) = self.ctx.lookup_method(owner, method_name).cloned() else {
            for arg in args.iter_mut() {
                self.infer_expr(arg, scope);
            }
            return TypeRef::Error;
        };

        if args.len() == m.params.len() {
            for (idx, (arg, (_, param_type))) in args.iter_mut().zip(m.params.iter()).enumerate() {
                let arg_type = self.infer_expr(arg, scope);
                if *param_type == TypeRef::Auto && arg_type != TypeRef::Auto {
                    self.ctx.narrow_method_param(owner, method_name, idx, arg_type);
                } else if *param_type != TypeRef::Auto && arg_type == TypeRef::Auto {
                    self.force_narrow(arg, scope, *param_type);
                }
            }
        } else {
            for arg in args.iter_mut() {
                self.infer_expr(arg, scope);
            }
        }

        self.ctx
            .lookup_method(owner, method_name)
            .map(|m| m.return_type)
            .unwrap_or(TypeRef::Error)
    }

    fn infer_unary(&mut self, expr: &mut Expr, scope: ScopeId, expected: TypeId) -> TypeRef {
        let ty = self.infer_expr(expr, scope);
        if ty == TypeRef::Auto {
            self.force_narrow(expr, scope, TypeRef::Class(expected));
            TypeRef::Class(expected)
        } else if ty == TypeRef::Class(expected) {
            TypeRef::Class(expected)
        } else {
            TypeRef::Error
        }
    }

    fn infer_arith(&mut self, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        let mut left_type = self.infer_expr(left, scope);
        let mut right_type = self.infer_expr(right, scope);
        let int_ = TypeRef::Class(self.ctx.int_);
        if left_type == TypeRef::Auto {
            self.force_narrow(left, scope, int_);
            left_type = int_;
        }
        if right_type == TypeRef::Auto {
            self.force_narrow(right, scope, int_);
            right_type = int_;
        }
        if left_type == int_ && right_type == int_ {
            int_
        } else {
            TypeRef::Error
        }
    }

    fn infer_compare(&mut self, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        let left_type = self.infer_expr(left, scope);
        let right_type = self.infer_expr(right, scope);
        let int_ = TypeRef::Class(self.ctx.int_);
        if left_type == TypeRef::Auto {
            self.force_narrow(left, scope, int_);
        }
        if right_type == TypeRef::Auto {
            self.force_narrow(right, scope, int_);
        }
        TypeRef::Class(self.ctx.bool_)
    }

    fn infer_equal(&mut self, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        self.infer_expr(left, scope);
        self.infer_expr(right, scope);
        TypeRef::Class(self.ctx.bool_)
    }

    /// Re-roots a subtree previously typed `AUTO_TYPE`, setting
    /// `computed_type := ntype` and recursing into the children whose
    /// type is structurally determined by their parent (§4.5's
    /// `update`). Anything else just gets its `computed_type` forced.
    fn force_narrow(&mut self, expr: &mut Expr, scope: ScopeId, ntype: TypeRef) {
        match &mut expr.kind {
            ExprKind::Id { name } => {
                self.scopes.narrow_variable(scope, &name.lexeme, ntype);
            }
            ExprKind::Dispatch { receiver, cast_type, method, .. } => {
                let owner = if let Some(cast_tok) = cast_type.as_ref() {
                    self.ctx.resolve_type_name(&cast_tok.lexeme)
                } else {
                    receiver
                        .computed_type
                        .map(|t| self.ctx.fixed_type(t, self.current))
                        .unwrap_or(TypeRef::Error)
                };
                if let TypeRef::Class(id) = owner {
                    self.ctx.narrow_method_return(id, &method.lexeme, ntype);
                }
            }
            ExprKind::SelfDispatch { method, .. } => {
                self.ctx.narrow_method_return(self.current, &method.lexeme, ntype);
            }
            ExprKind::If { then_branch, else_branch, .. } => {
                if then_branch.computed_type == Some(TypeRef::Auto) {
                    self.force_narrow(then_branch, scope, ntype);
                }
                if else_branch.computed_type == Some(TypeRef::Auto) {
                    self.force_narrow(else_branch, scope, ntype);
                }
            }
            ExprKind::Block { exprs } => {
                if let Some(last) = exprs.last_mut() {
                    self.force_narrow(last, scope, ntype);
                }
            }
            ExprKind::LetIn { body, .. } => {
                self.force_narrow(body, scope, ntype);
            }
            ExprKind::CaseOf { branches, .. } => {
                for branch in branches.iter_mut() {
                    if branch.body.computed_type == Some(TypeRef::Auto) {
                        self.force_narrow(&mut branch.body, scope, ntype);
                    }
                }
            }
            _ => {}
        }
        expr.computed_type = Some(ntype);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::builder::*;
    use crate::{builder as p2, checker, collector};

    fn analyze(program: &mut ast::Program) -> (Context, Vec<Diagnostic>) {
        let mut errors = Vec::new();
        let mut ctx = collector::collect(program, &mut errors);
        p2::build(program, &mut ctx, &mut errors);
        let mut scopes = checker::check(program, &mut ctx, &mut errors);
        loop {
            let before = errors.len();
            let auto_before = count_auto_types(&ctx, &scopes);
            infer(program, &mut ctx, &mut scopes, &mut errors);
            let auto_after = count_auto_types(&ctx, &scopes);
            if auto_after >= auto_before && errors.len() == before {
                break;
            }
        }
        (ctx, errors)
    }

    #[test]
    fn e5_auto_attribute_and_return_are_narrowed() {
        let mut program = program(vec![class(
            "Main",
            None,
            vec![
                Feature::Attr(attr("x", "AUTO_TYPE", Some(int(3)))),
                Feature::Method(method(
                    "main",
                    vec![],
                    "AUTO_TYPE",
                    arith(ArithOp::Add, id("x"), int(1)),
                )),
            ],
        )]);
        let (ctx, errors) = analyze(&mut program);
        assert!(errors.is_empty(), "{errors:?}");

        let main = ctx.get_type_id("Main").unwrap();
        assert_eq!(ctx.attribute_type(main, "x"), Some(TypeRef::Class(ctx.int_)));
        let m = ctx.lookup_method(main, "main").unwrap();
        assert_eq!(m.return_type, TypeRef::Class(ctx.int_));
    }

    #[test]
    fn e6_auto_propagates_across_a_call() {
        let mut program = program(vec![
            class(
                "Main",
                None,
                vec![
                    Feature::Method(method(
                        "id",
                        vec![param("x", "AUTO_TYPE")],
                        "AUTO_TYPE",
                        id("x"),
                    )),
                    Feature::Method(method(
                        "main",
                        vec![],
                        "String",
                        self_dispatch("id", vec![string("s")]),
                    )),
                ],
            ),
        ]);
        let (ctx, errors) = analyze(&mut program);
        assert!(errors.is_empty(), "{errors:?}");

        let main = ctx.get_type_id("Main").unwrap();
        let id_method = ctx.lookup_method(main, "id").unwrap();
        assert_eq!(id_method.params[0].1, TypeRef::Class(ctx.string_));
        assert_eq!(id_method.return_type, TypeRef::Class(ctx.string_));
    }
}
