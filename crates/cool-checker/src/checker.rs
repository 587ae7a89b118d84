//! P3 — `TypeChecker`: walks every expression with a scope argument,
//! setting `computed_type` on every node and reporting conformance and
//! arity violations.

use cool_ast::ast::{self, Expr, ExprKind, Feature};
use cool_ast::Token;
use cool_common::diagnostics::messages;
use cool_common::{Diagnostic, ScopeId, Span, TypeId, TypeRef};

use crate::scope::ScopeTree;
use crate::types::Context;

/// Runs P3 over every class, returning the freshly built scope tree
/// (P4 continues narrowing the same tree).
pub fn check(program: &mut ast::Program, ctx: &mut Context, errors: &mut Vec<Diagnostic>) -> ScopeTree {
    let mut scopes = ScopeTree::new();
    for class in program.classes.iter_mut() {
        let current = ctx
            .get_type_id(&class.name.lexeme)
            .expect("P1/P2 register every class before P3 runs");
        let mut checker = Checker {
            ctx,
            scopes: &mut scopes,
            errors,
            current,
        };
        checker.check_class(class);
    }
    scopes
}

pub(crate) struct Checker<'a> {
    pub(crate) ctx: &'a mut Context,
    pub(crate) scopes: &'a mut ScopeTree,
    pub(crate) errors: &'a mut Vec<Diagnostic>,
    pub(crate) current: TypeId,
}

impl<'a> Checker<'a> {
    fn check_class(&mut self, class: &mut ast::ClassDecl) {
        let scope = self.scopes.root();
        self.scopes.define_variable(scope, "self", TypeRef::SelfType);
        for attr in self.ctx.attributes_in_order(self.current) {
            self.scopes.define_variable(scope, &attr.name, attr.ty);
        }
        class.scope = Some(scope);

        for feature in class.features.iter_mut() {
            let child = self.scopes.create_child(scope);
            self.check_feature(feature, child);
        }
    }

    fn check_feature(&mut self, feature: &mut Feature, scope: ScopeId) {
        match feature {
            Feature::Attr(attr) => {
                let declared = self.resolve_declared_type(&attr.declared_type);
                if let Some(init) = attr.init.as_mut() {
                    let expr_type = self.check_expr(init, scope);
                    let expr_type = self.ctx.fixed_type(expr_type, self.current);
                    let real_type = self.ctx.fixed_type(declared, self.current);
                    if !self.ctx.conforms_to(expr_type, real_type, self.current) {
                        self.errors.push(Diagnostic::error(
                            messages::incompatible_types(
                                &self.ctx.display(expr_type),
                                &self.ctx.display(real_type),
                            ),
                            attr.arrow.span,
                        ));
                    }
                }
            }
            Feature::Method(method) => {
                for param in &method.params {
                    let ty = self.resolve_declared_type(&param.declared_type);
                    self.scopes.define_variable(scope, &param.name.lexeme, ty);
                }
                let body_type = self.check_expr(&mut method.body, scope);
                let body_type = self.ctx.fixed_type(body_type, self.current);
                let return_type = self.resolve_declared_type(&method.return_type);
                let return_fixed = self.ctx.fixed_type(return_type, self.current);
                if !self.ctx.conforms_to(body_type, return_fixed, self.current) {
                    self.errors.push(Diagnostic::error(
                        messages::incompatible_types(
                            &self.ctx.display(body_type),
                            &self.ctx.display(return_fixed),
                        ),
                        method.return_type.span,
                    ));
                }
            }
        }
    }

    /// Resolves a declared-type token, reporting `undefined_type` when
    /// the name isn't `SELF_TYPE`/`AUTO_TYPE`/a known class.
    fn resolve_declared_type(&mut self, token: &Token) -> TypeRef {
        let ty = self.ctx.resolve_type_name(&token.lexeme);
        if ty == TypeRef::Error {
            self.errors.push(Diagnostic::error(messages::undefined_type(&token.lexeme), token.span));
        }
        ty
    }

    /// Visits `expr`, sets its `computed_type`, and returns it.
    pub(crate) fn check_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> TypeRef {
        // LetIn is the one expression kind that introduces a scope of its
        // own; record it on the node so the printer (and P4) can revisit
        // the binding without re-walking from the class root.
        if let ExprKind::LetIn { bindings, body } = &mut expr.kind {
            let (ty, child) = self.check_let(bindings, body, scope);
            expr.scope = Some(child);
            expr.computed_type = Some(ty);
            return ty;
        }
        let ty = self.check_expr_kind(&mut expr.kind, scope);
        expr.computed_type = Some(ty);
        ty
    }

    fn check_expr_kind(&mut self, kind: &mut ExprKind, scope: ScopeId) -> TypeRef {
        match kind {
            ExprKind::Assign { name, value } => self.check_assign(name, value, scope),
            ExprKind::If { token, cond, then_branch, else_branch } => {
                self.check_if(token.span, cond, then_branch, else_branch, scope)
            }
            ExprKind::While { token, cond, body } => self.check_while(token.span, cond, body, scope),
            ExprKind::Block { exprs } => self.check_block(exprs, scope),
            ExprKind::LetIn { bindings, body } => self.check_let(bindings, body, scope).0,
            ExprKind::CaseOf { subject, branches } => self.check_case(subject, branches, scope),
            ExprKind::Dispatch { receiver, cast_type, method, args } => {
                self.check_dispatch(receiver, cast_type.as_ref(), method, args, scope)
            }
            ExprKind::SelfDispatch { method, args } => self.check_self_dispatch(method, args, scope),
            ExprKind::New { type_name } => self.check_new(type_name),
            ExprKind::IsVoid { expr } => {
                self.check_expr(expr, scope);
                TypeRef::Class(self.ctx.bool_)
            }
            ExprKind::Complement { expr } => self.check_unary(expr, scope, self.ctx.int_, "Complement"),
            ExprKind::Not { expr } => self.check_unary(expr, scope, self.ctx.bool_, "Not"),
            ExprKind::Equal { symbol, left, right } => self.check_equal(symbol.span, left, right, scope),
            ExprKind::Arith { symbol, left, right, .. } => self.check_arith(symbol.span, left, right, scope),
            ExprKind::Compare { symbol, left, right, .. } => self.check_compare(symbol.span, left, right, scope),
            ExprKind::Integer { .. } => TypeRef::Class(self.ctx.int_),
            ExprKind::Str { .. } => TypeRef::Class(self.ctx.string_),
            ExprKind::Bool { .. } => TypeRef::Class(self.ctx.bool_),
            ExprKind::Id { name } => self.check_id(name, scope),
        }
    }

    fn check_assign(&mut self, name: &Token, value: &mut Expr, scope: ScopeId) -> TypeRef {
        let expr_type = self.check_expr(value, scope);
        let expr_fixed = self.ctx.fixed_type(expr_type, self.current);

        if !self.scopes.is_defined(scope, &name.lexeme) {
            self.errors.push(Diagnostic::error(
                messages::variable_not_defined(&name.lexeme),
                name.span,
            ));
            return TypeRef::Error;
        }
        if name.lexeme == "self" {
            self.errors.push(Diagnostic::error(messages::self_is_readonly(), name.span));
            return expr_type;
        }
        let var_type = self.scopes.find_variable(scope, &name.lexeme).unwrap();
        let var_fixed = self.ctx.fixed_type(var_type, self.current);
        if !self.ctx.conforms_to(expr_fixed, var_fixed, self.current) {
            self.errors.push(Diagnostic::error(
                messages::incompatible_types(&self.ctx.display(expr_fixed), &self.ctx.display(var_fixed)),
                name.span,
            ));
        }
        expr_type
    }

    fn check_if(
        &mut self,
        token: Span,
        cond: &mut Expr,
        then_branch: &mut Expr,
        else_branch: &mut Expr,
        scope: ScopeId,
    ) -> TypeRef {
        let cond_type = self.check_expr(cond, scope);
        if cond_type != TypeRef::Class(self.ctx.bool_) && cond_type != TypeRef::Auto {
            self.errors.push(Diagnostic::error(
                messages::condition_not_bool("If", &self.ctx.display(cond_type)),
                token,
            ));
        }
        let then_type = self.check_expr(then_branch, scope);
        let else_type = self.check_expr(else_branch, scope);
        self.ctx.lca(self.current, &[then_type, else_type])
    }

    fn check_while(&mut self, token: Span, cond: &mut Expr, body: &mut Expr, scope: ScopeId) -> TypeRef {
        let cond_type = self.check_expr(cond, scope);
        if cond_type != TypeRef::Class(self.ctx.bool_) && cond_type != TypeRef::Auto {
            self.errors.push(Diagnostic::error(
                messages::condition_not_bool("While", &self.ctx.display(cond_type)),
                token,
            ));
        }
        self.check_expr(body, scope);
        TypeRef::Void
    }

    fn check_block(&mut self, exprs: &mut [Expr], scope: ScopeId) -> TypeRef {
        let mut last = TypeRef::Void;
        for e in exprs.iter_mut() {
            last = self.check_expr(e, scope);
        }
        last
    }

    fn check_let(&mut self, bindings: &mut [ast::LetBinding], body: &mut Expr, scope: ScopeId) -> (TypeRef, ScopeId) {
        let child = self.scopes.create_child(scope);
        for binding in bindings.iter_mut() {
            let declared = self.resolve_declared_type(&binding.declared_type);
            if self.scopes.is_local(child, &binding.name.lexeme) {
                self.errors.push(Diagnostic::error(
                    messages::local_already_defined(&binding.name.lexeme, "<let>"),
                    binding.name.span,
                ));
            } else {
                self.scopes.define_variable(child, &binding.name.lexeme, declared);
            }
            if let Some(init) = binding.init.as_mut() {
                let expr_type = self.check_expr(init, child);
                let expr_fixed = self.ctx.fixed_type(expr_type, self.current);
                let real_fixed = self.ctx.fixed_type(declared, self.current);
                if !self.ctx.conforms_to(expr_fixed, real_fixed, self.current) {
                    self.errors.push(Diagnostic::error(
                        messages::incompatible_types(
                            &self.ctx.display(expr_fixed),
                            &self.ctx.display(real_fixed),
                        ),
                        binding.arrow.span,
                    ));
                }
            }
        }
        let body_type = self.check_expr(body, child);
        (body_type, child)
    }

    fn check_case(&mut self, subject: &mut Expr, branches: &mut [ast::CaseBranch], scope: ScopeId) -> TypeRef {
        self.check_expr(subject, scope);
        let mut types = Vec::with_capacity(branches.len());
        for branch in branches.iter_mut() {
            let child = self.scopes.create_child(scope);
            let declared = self.resolve_declared_type(&branch.declared_type);
            self.scopes.define_variable(child, &branch.name.lexeme, declared);
            branch.scope = Some(child);
            let branch_type = self.check_expr(&mut branch.body, child);
            types.push(branch_type);
        }
        // §9: P3 leaves this as a placeholder; P4 repairs it to the true
        // LCA of the branch types once AUTO_TYPE has narrowed.
        let _ = types;
        TypeRef::Error
    }

    fn resolve_receiver_method(
        &mut self,
        receiver_type: TypeRef,
        cast_type: Option<&Token>,
        method_name: &str,
        method_span: Span,
    ) -> Option<(TypeId, crate::types::Method)> {
        let receiver_fixed = self.ctx.fixed_type(receiver_type, self.current);
        let lookup_on = if let Some(cast_tok) = cast_type {
            if cast_tok.lexeme == crate::types::SELF_TYPE {
                self.errors.push(Diagnostic::error(
                    messages::invalid_self_type_cast(),
                    cast_tok.span,
                ));
                return None;
            }
            let cast_ty = self.ctx.resolve_type_name(&cast_tok.lexeme);
            match cast_ty {
                TypeRef::Class(id) => {
                    if !self.ctx.conforms_to(receiver_fixed, cast_ty, self.current) {
                        self.errors.push(Diagnostic::error(
                            messages::incompatible_types(
                                &self.ctx.display(receiver_fixed),
                                &self.ctx.display(cast_ty),
                            ),
                            cast_tok.span,
                        ));
                    }
                    id
                }
                _ => {
                    self.errors.push(Diagnostic::error(
                        messages::undefined_type(&cast_tok.lexeme),
                        cast_tok.span,
                    ));
                    return None;
                }
            }
        } else {
            match receiver_fixed {
                TypeRef::Class(id) => id,
                _ => return None,
            }
        };

        match self.ctx.lookup_method(lookup_on, method_name) {
            Some(m) => Some((lookup_on, m.clone())),
            None => {
                self.errors.push(Diagnostic::error(
                    messages::variable_not_defined(method_name),
                    method_span,
                ));
                None
            }
        }
    }

    fn check_args(
        &mut self,
        args: &mut [Expr],
        params: &[(String, TypeRef)],
        method_name: &str,
        class_name: &str,
        call_span: Span,
        scope: ScopeId,
    ) -> bool {
        if args.len() != params.len() {
            self.errors.push(Diagnostic::error(
                messages::wrong_argument_count(method_name, class_name, params.len()),
                call_span,
            ));
            for arg in args.iter_mut() {
                self.check_expr(arg, scope);
            }
            return false;
        }

        let mut ok = true;
        for (arg, (_, param_type)) in args.iter_mut().zip(params.iter()) {
            let arg_type = self.check_expr(arg, scope);
            let arg_fixed = self.ctx.fixed_type(arg_type, self.current);
            let param_fixed = self.ctx.fixed_type(*param_type, self.current);
            if !self.ctx.conforms_to(arg_fixed, param_fixed, self.current) {
                self.errors.push(Diagnostic::error(
                    messages::incompatible_types(&self.ctx.display(arg_fixed), &self.ctx.display(param_fixed)),
                    arg.span,
                ));
                ok = false;
            }
        }
        ok
    }

    fn check_dispatch(
        &mut self,
        receiver: &mut Expr,
        cast_type: Option<&Token>,
        method: &Token,
        args: &mut [Expr],
        scope: ScopeId,
    ) -> TypeRef {
        let receiver_type = self.check_expr(receiver, scope);
        let Some((owner, m)) = self.resolve_receiver_method(receiver_type, cast_type, &method.lexeme, method.span)
        else {
            for arg in args.iter_mut() {
                self.check_expr(arg, scope);
            }
            return TypeRef::Error;
        };
        let class_name = self.ctx.name_of(owner).to_string();
        self.check_args(args, &m.params, &method.lexeme, &class_name, method.span, scope);
        m.return_type
    }

    fn check_self_dispatch(&mut self, method: &Token, args: &mut [Expr], scope: ScopeId) -> TypeRef {
        let Some(m) = self.ctx.lookup_method(self.current, &method.lexeme).cloned() else {
            self.errors.push(Diagnostic::error(
                messages::variable_not_defined(&method.lexeme),
                method.span,
            ));
            for arg in args.iter_mut() {
                self.check_expr(arg, scope);
            }
            return TypeRef::Error;
        };
        let class_name = self.ctx.name_of(self.current).to_string();
        self.check_args(args, &m.params, &method.lexeme, &class_name, method.span, scope);
        m.return_type
    }

    fn check_new(&mut self, type_name: &Token) -> TypeRef {
        let ty = self.ctx.resolve_type_name(&type_name.lexeme);
        match ty {
            TypeRef::Error => {
                self.errors.push(Diagnostic::error(
                    messages::undefined_type(&type_name.lexeme),
                    type_name.span,
                ));
                TypeRef::Error
            }
            other => other,
        }
    }

    fn check_unary(&mut self, expr: &mut Expr, scope: ScopeId, expected: TypeId, op_name: &'static str) -> TypeRef {
        let ty = self.check_expr(expr, scope);
        if ty == TypeRef::Auto {
            // Deferred: P4 narrows the operand and re-checks.
            TypeRef::Auto
        } else if ty != TypeRef::Class(expected) {
            self.errors.push(Diagnostic::error(
                messages::invalid_operation(op_name, &self.ctx.display(ty)),
                expr.span,
            ));
            TypeRef::Error
        } else {
            TypeRef::Class(expected)
        }
    }

    fn check_equal(&mut self, symbol: Span, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        let left_type = self.check_expr(left, scope);
        let right_type = self.check_expr(right, scope);
        let primitive = [self.ctx.int_, self.ctx.string_, self.ctx.bool_];
        let left_primitive = matches!(left_type, TypeRef::Class(id) if primitive.contains(&id));
        let right_primitive = matches!(right_type, TypeRef::Class(id) if primitive.contains(&id));

        if left_primitive || right_primitive {
            if left_type != right_type {
                self.errors.push(Diagnostic::error(
                    messages::invalid_operation(&self.ctx.display(left_type), &self.ctx.display(right_type)),
                    symbol,
                ));
            }
        }
        TypeRef::Class(self.ctx.bool_)
    }

    fn check_arith(&mut self, symbol: Span, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        let left_type = self.check_expr(left, scope);
        let right_type = self.check_expr(right, scope);
        if left_type == TypeRef::Auto || right_type == TypeRef::Auto {
            return TypeRef::Auto;
        }
        if left_type != TypeRef::Class(self.ctx.int_) || right_type != TypeRef::Class(self.ctx.int_) {
            self.errors.push(Diagnostic::error(
                messages::invalid_operation(&self.ctx.display(left_type), &self.ctx.display(right_type)),
                symbol,
            ));
            TypeRef::Error
        } else {
            TypeRef::Class(self.ctx.int_)
        }
    }

    /// Comparisons require `Int` operands (§9: the reference checks
    /// `Bool` here, which is inconsistent with COOL's own specification).
    fn check_compare(&mut self, symbol: Span, left: &mut Expr, right: &mut Expr, scope: ScopeId) -> TypeRef {
        let left_type = self.check_expr(left, scope);
        let right_type = self.check_expr(right, scope);
        let either_auto = left_type == TypeRef::Auto || right_type == TypeRef::Auto;
        if !either_auto
            && (left_type != TypeRef::Class(self.ctx.int_) || right_type != TypeRef::Class(self.ctx.int_))
        {
            self.errors.push(Diagnostic::error(
                messages::invalid_operation(&self.ctx.display(left_type), &self.ctx.display(right_type)),
                symbol,
            ));
        }
        TypeRef::Class(self.ctx.bool_)
    }

    fn check_id(&mut self, name: &Token, scope: ScopeId) -> TypeRef {
        match self.scopes.find_variable(scope, &name.lexeme) {
            Some(ty) => ty,
            None => {
                self.errors.push(Diagnostic::error(
                    messages::variable_not_defined(&name.lexeme),
                    name.span,
                ));
                TypeRef::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::ast::CompareOp;
    use cool_ast::builder::*;
    use crate::{builder as p2, collector};

    fn analyze(program: &mut ast::Program) -> (Context, ScopeTree, Vec<Diagnostic>) {
        let mut errors = Vec::new();
        let mut ctx = collector::collect(program, &mut errors);
        p2::build(program, &mut ctx, &mut errors);
        let scopes = check(program, &mut ctx, &mut errors);
        (ctx, scopes, errors)
    }

    fn main_class(body: Expr) -> ast::ClassDecl {
        class("Main", None, vec![Feature::Method(method("main", vec![], "Object", body))])
    }

    #[test]
    fn hello_world_has_zero_errors() {
        let mut program = program(vec![main_class(dispatch(new_("IO"), None, "out_string", vec![string("hi")]))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn comparison_requires_int_operands() {
        let mut program = program(vec![main_class(compare(CompareOp::Lt, int(1), int(2)))]);
        let (ctx, _, errors) = analyze(&mut program);
        assert!(errors.is_empty());
        let _ = ctx;

        let mut program = program(vec![main_class(compare(CompareOp::Lt, boolean(true), boolean(false)))]);
        let (_, _, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn new_permits_primitive_types() {
        let mut program = program(vec![main_class(new_("Int"))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn self_assignment_is_rejected() {
        let mut program = program(vec![main_class(assign("self", int(1)))]);
        let (_, _, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::self_is_readonly());
    }

    #[test]
    fn if_result_is_lca_of_branches() {
        let mut program = program(vec![main_class(if_then_else(boolean(true), int(1), int(2)))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn undefined_variable_is_reported() {
        let mut program = program(vec![main_class(id("nope"))]);
        let (_, _, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::variable_not_defined("nope"));
    }

    #[test]
    fn equality_between_primitive_and_object_is_rejected() {
        let mut program = program(vec![main_class(equal(int(1), new_("Object")))]);
        let (_, _, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn undefined_let_binding_type_is_reported() {
        let mut program = program(vec![main_class(let_in(vec![let_binding("x", "Foo", None)], int(0)))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Foo")), "{errors:?}");
    }

    #[test]
    fn undefined_case_branch_type_is_reported() {
        let mut program = program(vec![main_class(case_of(int(1), vec![case_branch("x", "Foo", int(0))]))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Foo")), "{errors:?}");
    }

    #[test]
    fn new_on_undefined_type_is_reported_distinctly_from_inheritance() {
        let mut program = program(vec![main_class(new_("Foo"))]);
        let (_, _, errors) = analyze(&mut program);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::undefined_type("Foo"));
    }

    #[test]
    fn static_dispatch_on_undefined_cast_type_is_reported_distinctly_from_inheritance() {
        let mut program = program(vec![main_class(dispatch(new_("Object"), Some("Foo"), "m", vec![]))]);
        let (_, _, errors) = analyze(&mut program);
        assert!(errors.iter().any(|e| e.message == messages::undefined_type("Foo")), "{errors:?}");
    }
}
