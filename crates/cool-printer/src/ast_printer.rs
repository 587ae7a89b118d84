//! Renders a [`Program`] as an indented tree of `\__NodeKind: ...`
//! lines, one node per line, children one tab deeper than their parent.
//! Shows only what the parser produced — declared types, not resolved
//! ones (see [`crate::type_printer`] for that).

use cool_ast::ast::{self, ArithOp, CompareOp, Expr, ExprKind, Feature, Program};

pub fn print_ast(program: &Program) -> String {
    print_program(program, 0)
}

pub(crate) fn line(tabs: usize, text: impl AsRef<str>) -> String {
    format!("{}\\__{}", "\t".repeat(tabs), text.as_ref())
}

fn print_program(program: &Program, tabs: usize) -> String {
    let header = line(tabs, "ProgramNode [<class> ... <class>]");
    let body: Vec<String> = program.classes.iter().map(|c| print_class(c, tabs + 1)).collect();
    join(header, body)
}

fn print_class(class: &ast::ClassDecl, tabs: usize) -> String {
    let parent = class
        .parent
        .as_ref()
        .map(|p| format!("inherits {}", p.lexeme))
        .unwrap_or_default();
    let header = line(
        tabs,
        format!("ClassDeclarationNode: class {} {parent} {{ <feature> ... <feature> }}", class.name.lexeme),
    );
    let body: Vec<String> = class.features.iter().map(|f| print_feature(f, tabs + 1)).collect();
    join(header, body)
}

fn print_feature(feature: &Feature, tabs: usize) -> String {
    match feature {
        Feature::Attr(attr) => {
            let suffix = if attr.init.is_some() { " <- <expr>" } else { "" };
            let header = line(
                tabs,
                format!("AttrDeclarationNode: {} : {}{suffix}", attr.name.lexeme, attr.declared_type.lexeme),
            );
            match &attr.init {
                Some(init) => join(header, vec![print_expr(init, tabs + 1)]),
                None => header,
            }
        }
        Feature::Method(method) => {
            let params: Vec<String> = method
                .params
                .iter()
                .map(|p| format!("{}:{}", p.name.lexeme, p.declared_type.lexeme))
                .collect();
            let header = line(
                tabs,
                format!(
                    "FuncDeclarationNode: {}({}) : {} {{<body>}}",
                    method.name.lexeme,
                    params.join(", "),
                    method.return_type.lexeme
                ),
            );
            join(header, vec![print_expr(&method.body, tabs + 1)])
        }
    }
}

pub(crate) fn arith_name(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "PlusNode",
        ArithOp::Sub => "MinusNode",
        ArithOp::Mul => "StarNode",
        ArithOp::Div => "DivNode",
    }
}

pub(crate) fn compare_name(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "LessNode",
        CompareOp::Le => "LessEqualNode",
    }
}

fn print_expr(expr: &Expr, tabs: usize) -> String {
    match &expr.kind {
        ExprKind::Assign { name, value } => {
            let header = line(tabs, format!("AssignNode: {} <- <expr>", name.lexeme));
            join(header, vec![print_expr(value, tabs + 1)])
        }
        ExprKind::If { cond, then_branch, else_branch, .. } => {
            let header = line(tabs, "IfThenElseNode: if <cond> then <body> else <body> fi");
            join(
                header,
                vec![print_expr(cond, tabs + 1), print_expr(then_branch, tabs + 1), print_expr(else_branch, tabs + 1)],
            )
        }
        ExprKind::While { cond, body, .. } => {
            let header = line(tabs, "WhileLoopNode: while <cond> loop <body> pool");
            join(header, vec![print_expr(cond, tabs + 1), print_expr(body, tabs + 1)])
        }
        ExprKind::Block { exprs } => {
            let header = line(tabs, "BlockNode: {<expr> ... <expr>}");
            join(header, exprs.iter().map(|e| print_expr(e, tabs + 1)).collect())
        }
        ExprKind::LetIn { bindings, body } => {
            let header = line(tabs, "LetInNode: let {<attr> ... <attr>} in <expr>");
            let mut children: Vec<String> = bindings.iter().map(|b| print_let_binding(b, tabs + 1)).collect();
            children.push(print_expr(body, tabs + 1));
            join(header, children)
        }
        ExprKind::CaseOf { subject, branches } => {
            let header = line(tabs, "CaseOfNode: case <expr> of {<case> ... <case>} esac");
            let mut children = vec![print_expr(subject, tabs + 1)];
            children.extend(branches.iter().map(|b| print_case_branch(b, tabs + 1)));
            join(header, children)
        }
        ExprKind::Dispatch { receiver, cast_type, method, args } => {
            let target = match cast_type {
                Some(t) => format!("<obj>@{}.{}(<expr>, ..., <expr>)", t.lexeme, method.lexeme),
                None => format!("<obj>.{}(<expr>, ..., <expr>)", method.lexeme),
            };
            let header = line(tabs, format!("FunctionCallNode: {target}"));
            let mut children = vec![print_expr(receiver, tabs + 1)];
            children.extend(args.iter().map(|a| print_expr(a, tabs + 1)));
            join(header, children)
        }
        ExprKind::SelfDispatch { method, args } => {
            let header = line(tabs, format!("MemberCallNode: {}(<expr>, ..., <expr>)", method.lexeme));
            join(header, args.iter().map(|a| print_expr(a, tabs + 1)).collect())
        }
        ExprKind::New { type_name } => line(tabs, format!("NewNode: new {}()", type_name.lexeme)),
        ExprKind::IsVoid { expr } => {
            let header = line(tabs, "IsVoidNode <expr>");
            join(header, vec![print_expr(expr, tabs + 1)])
        }
        ExprKind::Complement { expr } => {
            let header = line(tabs, "ComplementNode <expr>");
            join(header, vec![print_expr(expr, tabs + 1)])
        }
        ExprKind::Not { expr } => {
            let header = line(tabs, "NotNode <expr>");
            join(header, vec![print_expr(expr, tabs + 1)])
        }
        ExprKind::Equal { left, right, .. } => {
            let header = line(tabs, "<expr> EqualNode <expr>");
            join(header, vec![print_expr(left, tabs + 1), print_expr(right, tabs + 1)])
        }
        ExprKind::Arith { op, left, right, .. } => {
            let header = line(tabs, format!("<expr> {} <expr>", arith_name(*op)));
            join(header, vec![print_expr(left, tabs + 1), print_expr(right, tabs + 1)])
        }
        ExprKind::Compare { op, left, right, .. } => {
            let header = line(tabs, format!("<expr> {} <expr>", compare_name(*op)));
            join(header, vec![print_expr(left, tabs + 1), print_expr(right, tabs + 1)])
        }
        ExprKind::Integer { value } => line(tabs, format!(" IntegerNode: {value}")),
        ExprKind::Str { value } => line(tabs, format!(" StringNode: {value}")),
        ExprKind::Bool { value } => line(tabs, format!(" BoolNode: {value}")),
        ExprKind::Id { name } => line(tabs, format!(" VariableNode: {}", name.lexeme)),
    }
}

fn print_let_binding(binding: &ast::LetBinding, tabs: usize) -> String {
    let suffix = if binding.init.is_some() { " <- <expr>" } else { "" };
    let header = line(
        tabs,
        format!("LetAttributeNode: {} : {}{suffix}", binding.name.lexeme, binding.declared_type.lexeme),
    );
    match &binding.init {
        Some(init) => join(header, vec![print_expr(init, tabs + 1)]),
        None => header,
    }
}

fn print_case_branch(branch: &ast::CaseBranch, tabs: usize) -> String {
    let header = line(
        tabs,
        format!("CaseExpressionNode: {} : {} => <expr>", branch.name.lexeme, branch.declared_type.lexeme),
    );
    join(header, vec![print_expr(&branch.body, tabs + 1)])
}

pub(crate) fn join(header: String, children: Vec<String>) -> String {
    if children.is_empty() {
        header
    } else {
        format!("{header}\n{}", children.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::ast::Feature;
    use cool_ast::builder::*;

    #[test]
    fn prints_a_class_with_an_attribute_and_a_method() {
        let program = program(vec![class(
            "Main",
            None,
            vec![
                Feature::Attr(attr("x", "Int", Some(int(3)))),
                Feature::Method(method("main", vec![], "Object", id("x"))),
            ],
        )]);
        let out = print_ast(&program);
        assert!(out.starts_with("\\__ProgramNode"));
        assert!(out.contains("ClassDeclarationNode: class Main"));
        assert!(out.contains("AttrDeclarationNode: x : Int <- <expr>"));
        assert!(out.contains(" IntegerNode: 3"));
        assert!(out.contains("FuncDeclarationNode: main() : Object {<body>}"));
        assert!(out.contains(" VariableNode: x"));
    }

    #[test]
    fn prints_dispatch_with_a_static_cast() {
        let expr = dispatch(new_("B"), Some("A"), "f", vec![int(1)]);
        let out = print_expr(&expr, 0);
        assert!(out.contains("FunctionCallNode: <obj>@A.f(<expr>, ..., <expr>)"));
    }
}
