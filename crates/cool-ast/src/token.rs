use cool_common::Span;
use serde::{Deserialize, Serialize};

/// A single source token: the text the user wrote plus where it came
/// from. Every position the checker might need to point a diagnostic at
/// (a class id, a parent name, an arrow, an operator symbol, ...) is
/// carried on the AST as one of these rather than a bare `Span`, so error
/// messages can quote the offending name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            lexeme: lexeme.into(),
            span,
        }
    }

    /// A token with no real source position, for nodes synthesized by the
    /// checker itself (e.g. the implicit `self` binding).
    pub fn synthetic(lexeme: impl Into<String>) -> Self {
        Token {
            lexeme: lexeme.into(),
            span: Span::dummy(),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}
