//! Renders a [`Program`] the same way [`crate::ast_printer`] does, except
//! at the three sites where a declared type can be `AUTO_TYPE`: an
//! attribute, a method's return type, and a `let` binding each show
//! whatever `cool-checker` resolved them to instead of the raw token.
//!
//! A slot inference never touched (dead code, or a program P4 simply
//! never reached a fixed point on) still reads `AUTO_TYPE` after
//! [`cool_checker::analyze`] returns; this falls back to `Object`
//! rather than printing the sentinel name, the same convention the
//! original checker's tree dump used.

use cool_ast::ast::{self, Expr, ExprKind, Feature, Program};
use cool_checker::{Context, ScopeTree};
use cool_common::TypeRef;

use crate::ast_printer::{arith_name, compare_name, join, line};

pub fn print_resolved(program: &Program, ctx: &Context, scopes: &ScopeTree) -> String {
    let printer = Printer { ctx, scopes };
    printer.print_program(program, 0)
}

fn display_resolved(ctx: &Context, ty: TypeRef) -> String {
    match ty {
        TypeRef::Auto => "Object".to_string(),
        other => ctx.display(other),
    }
}

struct Printer<'a> {
    ctx: &'a Context,
    scopes: &'a ScopeTree,
}

impl<'a> Printer<'a> {
    fn print_program(&self, program: &Program, tabs: usize) -> String {
        let header = line(tabs, "ProgramNode [<class> ... <class>]");
        let body: Vec<String> = program.classes.iter().map(|c| self.print_class(c, tabs + 1)).collect();
        join(header, body)
    }

    fn print_class(&self, class: &ast::ClassDecl, tabs: usize) -> String {
        let parent = class
            .parent
            .as_ref()
            .map(|p| format!("inherits {}", p.lexeme))
            .unwrap_or_default();
        let header = line(
            tabs,
            format!("ClassDeclarationNode: class {} {parent} {{ <feature> ... <feature> }}", class.name.lexeme),
        );
        let owner = self.ctx.get_type_id(&class.name.lexeme);
        let body: Vec<String> = class.features.iter().map(|f| self.print_feature(owner, f, tabs + 1)).collect();
        join(header, body)
    }

    fn print_feature(&self, owner: Option<cool_common::TypeId>, feature: &Feature, tabs: usize) -> String {
        match feature {
            Feature::Attr(attr) => {
                let resolved = owner
                    .and_then(|id| self.ctx.attribute_type(id, &attr.name.lexeme))
                    .unwrap_or(TypeRef::Error);
                let suffix = if attr.init.is_some() { " <- <expr>" } else { "" };
                let header = line(
                    tabs,
                    format!(
                        "AttrDeclarationNode: {} : {}{suffix}",
                        attr.name.lexeme,
                        display_resolved(self.ctx, resolved)
                    ),
                );
                match &attr.init {
                    Some(init) => join(header, vec![self.print_expr(init, tabs + 1)]),
                    None => header,
                }
            }
            Feature::Method(method) => {
                let m = owner.and_then(|id| self.ctx.lookup_method(id, &method.name.lexeme));
                let params: Vec<String> = match m {
                    Some(m) => m
                        .params
                        .iter()
                        .map(|(name, ty)| format!("{name}:{}", display_resolved(self.ctx, *ty)))
                        .collect(),
                    None => method
                        .params
                        .iter()
                        .map(|p| format!("{}:{}", p.name.lexeme, p.declared_type.lexeme))
                        .collect(),
                };
                let return_type = m.map(|m| m.return_type).unwrap_or(TypeRef::Error);
                let header = line(
                    tabs,
                    format!(
                        "FuncDeclarationNode: {}({}) : {} {{<body>}}",
                        method.name.lexeme,
                        params.join(", "),
                        display_resolved(self.ctx, return_type)
                    ),
                );
                join(header, vec![self.print_expr(&method.body, tabs + 1)])
            }
        }
    }

    fn print_expr(&self, expr: &Expr, tabs: usize) -> String {
        match &expr.kind {
            ExprKind::Assign { name, value } => {
                let header = line(tabs, format!("AssignNode: {} <- <expr>", name.lexeme));
                join(header, vec![self.print_expr(value, tabs + 1)])
            }
            ExprKind::If { cond, then_branch, else_branch, .. } => {
                let header = line(tabs, "IfThenElseNode: if <cond> then <body> else <body> fi");
                join(
                    header,
                    vec![
                        self.print_expr(cond, tabs + 1),
                        self.print_expr(then_branch, tabs + 1),
                        self.print_expr(else_branch, tabs + 1),
                    ],
                )
            }
            ExprKind::While { cond, body, .. } => {
                let header = line(tabs, "WhileLoopNode: while <cond> loop <body> pool");
                join(header, vec![self.print_expr(cond, tabs + 1), self.print_expr(body, tabs + 1)])
            }
            ExprKind::Block { exprs } => {
                let header = line(tabs, "BlockNode: {<expr> ... <expr>}");
                join(header, exprs.iter().map(|e| self.print_expr(e, tabs + 1)).collect())
            }
            ExprKind::LetIn { bindings, body } => {
                let header = line(tabs, "LetInNode: let {<attr> ... <attr>} in <expr>");
                let mut children: Vec<String> = bindings
                    .iter()
                    .map(|b| self.print_let_binding(expr.scope, b, tabs + 1))
                    .collect();
                children.push(self.print_expr(body, tabs + 1));
                join(header, children)
            }
            ExprKind::CaseOf { subject, branches } => {
                let header = line(tabs, "CaseOfNode: case <expr> of {<case> ... <case>} esac");
                let mut children = vec![self.print_expr(subject, tabs + 1)];
                children.extend(branches.iter().map(|b| self.print_case_branch(b, tabs + 1)));
                join(header, children)
            }
            ExprKind::Dispatch { receiver, cast_type, method, args } => {
                let target = match cast_type {
                    Some(t) => format!("<obj>@{}.{}(<expr>, ..., <expr>)", t.lexeme, method.lexeme),
                    None => format!("<obj>.{}(<expr>, ..., <expr>)", method.lexeme),
                };
                let header = line(tabs, format!("FunctionCallNode: {target}"));
                let mut children = vec![self.print_expr(receiver, tabs + 1)];
                children.extend(args.iter().map(|a| self.print_expr(a, tabs + 1)));
                join(header, children)
            }
            ExprKind::SelfDispatch { method, args } => {
                let header = line(tabs, format!("MemberCallNode: {}(<expr>, ..., <expr>)", method.lexeme));
                join(header, args.iter().map(|a| self.print_expr(a, tabs + 1)).collect())
            }
            ExprKind::New { type_name } => line(tabs, format!("NewNode: new {}()", type_name.lexeme)),
            ExprKind::IsVoid { expr } => {
                let header = line(tabs, "IsVoidNode <expr>");
                join(header, vec![self.print_expr(expr, tabs + 1)])
            }
            ExprKind::Complement { expr } => {
                let header = line(tabs, "ComplementNode <expr>");
                join(header, vec![self.print_expr(expr, tabs + 1)])
            }
            ExprKind::Not { expr } => {
                let header = line(tabs, "NotNode <expr>");
                join(header, vec![self.print_expr(expr, tabs + 1)])
            }
            ExprKind::Equal { left, right, .. } => {
                let header = line(tabs, "<expr> EqualNode <expr>");
                join(header, vec![self.print_expr(left, tabs + 1), self.print_expr(right, tabs + 1)])
            }
            ExprKind::Arith { op, left, right, .. } => {
                let header = line(tabs, format!("<expr> {} <expr>", arith_name(*op)));
                join(header, vec![self.print_expr(left, tabs + 1), self.print_expr(right, tabs + 1)])
            }
            ExprKind::Compare { op, left, right, .. } => {
                let header = line(tabs, format!("<expr> {} <expr>", compare_name(*op)));
                join(header, vec![self.print_expr(left, tabs + 1), self.print_expr(right, tabs + 1)])
            }
            ExprKind::Integer { value } => line(tabs, format!(" IntegerNode: {value}")),
            ExprKind::Str { value } => line(tabs, format!(" StringNode: {value}")),
            ExprKind::Bool { value } => line(tabs, format!(" BoolNode: {value}")),
            ExprKind::Id { name } => line(tabs, format!(" VariableNode: {}", name.lexeme)),
        }
    }

    fn print_let_binding(&self, scope: Option<cool_common::ScopeId>, binding: &ast::LetBinding, tabs: usize) -> String {
        let resolved = scope
            .and_then(|s| self.scopes.find_variable(s, &binding.name.lexeme))
            .unwrap_or(TypeRef::Error);
        let suffix = if binding.init.is_some() { " <- <expr>" } else { "" };
        let header = line(
            tabs,
            format!(
                "LetAttributeNode: {} : {}{suffix}",
                binding.name.lexeme,
                display_resolved(self.ctx, resolved)
            ),
        );
        match &binding.init {
            Some(init) => join(header, vec![self.print_expr(init, tabs + 1)]),
            None => header,
        }
    }

    // `CaseExpressionNode` keeps its declared branch type even in the
    // resolved rendering: P4 narrows attributes, returns and `let`
    // bindings, but a `case` branch's variable is never itself an
    // inference target, so there is nothing to look up.
    fn print_case_branch(&self, branch: &ast::CaseBranch, tabs: usize) -> String {
        let header = line(
            tabs,
            format!("CaseExpressionNode: {} : {} => <expr>", branch.name.lexeme, branch.declared_type.lexeme),
        );
        join(header, vec![self.print_expr(&branch.body, tabs + 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::ast::Feature as F;
    use cool_ast::builder::*;
    use cool_checker::analyze;

    #[test]
    fn resolves_an_auto_attribute_and_return_type() {
        let mut program = program(vec![class(
            "Main",
            None,
            vec![
                F::Attr(attr("x", "AUTO_TYPE", Some(int(3)))),
                F::Method(method("main", vec![], "AUTO_TYPE", id("x"))),
            ],
        )]);
        let result = analyze(&mut program);
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let out = print_resolved(&program, &result.context, &result.scopes);
        assert!(out.contains("AttrDeclarationNode: x : Int <- <expr>"));
        assert!(out.contains("FuncDeclarationNode: main() : Int {<body>}"));
    }
}
