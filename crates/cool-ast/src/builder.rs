//! Terse constructors for hand-built ASTs, used by the checker's and
//! printer's test suites. None of this is a parser: callers still
//! supply every token themselves.

use cool_common::Span;

use crate::ast::*;
use crate::token::Token;

pub fn tok(lexeme: &str) -> Token {
    Token::synthetic(lexeme)
}

pub fn id(name: &str) -> Expr {
    Expr::new(ExprKind::Id { name: tok(name) }, Span::dummy())
}

pub fn int(value: i32) -> Expr {
    Expr::new(ExprKind::Integer { value }, Span::dummy())
}

pub fn string(value: &str) -> Expr {
    Expr::new(
        ExprKind::Str {
            value: value.to_string(),
        },
        Span::dummy(),
    )
}

pub fn boolean(value: bool) -> Expr {
    Expr::new(ExprKind::Bool { value }, Span::dummy())
}

pub fn new_(type_name: &str) -> Expr {
    Expr::new(
        ExprKind::New {
            type_name: tok(type_name),
        },
        Span::dummy(),
    )
}

pub fn assign(name: &str, value: Expr) -> Expr {
    Expr::new(
        ExprKind::Assign {
            name: tok(name),
            value: Box::new(value),
        },
        Span::dummy(),
    )
}

pub fn block(exprs: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Block { exprs }, Span::dummy())
}

pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    Expr::new(
        ExprKind::If {
            token: tok("if"),
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        Span::dummy(),
    )
}

pub fn while_loop(cond: Expr, body: Expr) -> Expr {
    Expr::new(
        ExprKind::While {
            token: tok("while"),
            cond: Box::new(cond),
            body: Box::new(body),
        },
        Span::dummy(),
    )
}

pub fn let_in(bindings: Vec<LetBinding>, body: Expr) -> Expr {
    Expr::new(
        ExprKind::LetIn {
            bindings,
            body: Box::new(body),
        },
        Span::dummy(),
    )
}

pub fn let_binding(name: &str, declared_type: &str, init: Option<Expr>) -> LetBinding {
    LetBinding {
        name: tok(name),
        declared_type: tok(declared_type),
        init,
        arrow: tok("<-"),
    }
}

pub fn case_of(subject: Expr, branches: Vec<CaseBranch>) -> Expr {
    Expr::new(
        ExprKind::CaseOf {
            subject: Box::new(subject),
            branches,
        },
        Span::dummy(),
    )
}

pub fn case_branch(name: &str, declared_type: &str, body: Expr) -> CaseBranch {
    CaseBranch {
        name: tok(name),
        declared_type: tok(declared_type),
        body: Box::new(body),
        scope: None,
    }
}

pub fn dispatch(receiver: Expr, cast_type: Option<&str>, method: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::Dispatch {
            receiver: Box::new(receiver),
            cast_type: cast_type.map(tok),
            method: tok(method),
            args,
        },
        Span::dummy(),
    )
}

pub fn self_dispatch(method: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::SelfDispatch {
            method: tok(method),
            args,
        },
        Span::dummy(),
    )
}

pub fn isvoid(expr: Expr) -> Expr {
    Expr::new(ExprKind::IsVoid { expr: Box::new(expr) }, Span::dummy())
}

pub fn complement(expr: Expr) -> Expr {
    Expr::new(
        ExprKind::Complement { expr: Box::new(expr) },
        Span::dummy(),
    )
}

pub fn not(expr: Expr) -> Expr {
    Expr::new(ExprKind::Not { expr: Box::new(expr) }, Span::dummy())
}

pub fn equal(left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Equal {
            symbol: tok("="),
            left: Box::new(left),
            right: Box::new(right),
        },
        Span::dummy(),
    )
}

pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Arith {
            op,
            symbol: tok(op.symbol()),
            left: Box::new(left),
            right: Box::new(right),
        },
        Span::dummy(),
    )
}

pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Compare {
            op,
            symbol: tok(op.symbol()),
            left: Box::new(left),
            right: Box::new(right),
        },
        Span::dummy(),
    )
}

pub fn attr(name: &str, declared_type: &str, init: Option<Expr>) -> AttrDecl {
    AttrDecl {
        name: tok(name),
        declared_type: tok(declared_type),
        init,
        arrow: tok("<-"),
    }
}

pub fn param(name: &str, declared_type: &str) -> Param {
    Param {
        name: tok(name),
        declared_type: tok(declared_type),
    }
}

pub fn method(name: &str, params: Vec<Param>, return_type: &str, body: Expr) -> FuncDecl {
    FuncDecl {
        name: tok(name),
        params,
        return_type: tok(return_type),
        body,
    }
}

pub fn class(name: &str, parent: Option<&str>, features: Vec<Feature>) -> ClassDecl {
    ClassDecl::new(tok(name), parent.map(tok), features, Span::dummy())
}

pub fn program(classes: Vec<ClassDecl>) -> Program {
    Program { classes }
}
