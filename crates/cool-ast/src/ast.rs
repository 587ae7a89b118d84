use cool_common::{ScopeId, Span, TypeRef};
use serde::{Deserialize, Serialize};

use crate::token::Token;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Token,
    pub parent: Option<Token>,
    pub features: Vec<Feature>,
    pub span: Span,
    /// The frame holding `self` and every attribute, bound by the checker
    /// the first time the class body is visited.
    #[serde(skip)]
    pub scope: Option<ScopeId>,
}

impl ClassDecl {
    pub fn new(name: Token, parent: Option<Token>, features: Vec<Feature>, span: Span) -> Self {
        ClassDecl {
            name,
            parent,
            features,
            span,
            scope: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Feature {
    Attr(AttrDecl),
    Method(FuncDecl),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrDecl {
    pub name: Token,
    pub declared_type: Token,
    pub init: Option<Expr>,
    /// Position of the `<-` token, or the attribute name when there is no
    /// initializer (used to anchor the "incompatible types" diagnostic).
    pub arrow: Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Token,
    pub declared_type: Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Token,
    pub params: Vec<Param>,
    pub return_type: Token,
    pub body: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: Token,
    pub declared_type: Token,
    pub init: Option<Expr>,
    pub arrow: Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBranch {
    pub name: Token,
    pub declared_type: Token,
    pub body: Box<Expr>,
    #[serde(skip)]
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// One expression node. `kind` carries the shape, `computed_type` is the
/// decoration every pass from P3 onward fills in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    #[serde(skip)]
    pub computed_type: Option<TypeRef>,
    /// Set on `let`/`case` nodes that introduce a child scope, so the
    /// inference pass can revisit the binding without re-walking from the
    /// class root.
    #[serde(skip)]
    pub scope: Option<ScopeId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            computed_type: None,
            scope: None,
        }
    }

    pub fn ty(&self) -> TypeRef {
        self.computed_type
            .expect("computed_type read before the checker visited this node")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    If {
        token: Token,
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    While {
        token: Token,
        cond: Box<Expr>,
        body: Box<Expr>,
    },
    Block {
        exprs: Vec<Expr>,
    },
    LetIn {
        bindings: Vec<LetBinding>,
        body: Box<Expr>,
    },
    CaseOf {
        subject: Box<Expr>,
        branches: Vec<CaseBranch>,
    },
    /// `obj.f(args)`, optionally statically dispatched with `@T.f(args)`.
    Dispatch {
        receiver: Box<Expr>,
        cast_type: Option<Token>,
        method: Token,
        args: Vec<Expr>,
    },
    /// `f(args)`, sugar for `self.f(args)`.
    SelfDispatch {
        method: Token,
        args: Vec<Expr>,
    },
    New {
        type_name: Token,
    },
    IsVoid {
        expr: Box<Expr>,
    },
    Complement {
        expr: Box<Expr>,
    },
    Not {
        expr: Box<Expr>,
    },
    Equal {
        symbol: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        symbol: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        symbol: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Integer {
        value: i32,
    },
    Str {
        value: String,
    },
    Bool {
        value: bool,
    },
    Id {
        name: Token,
    },
}
