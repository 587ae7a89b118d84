//! The diagnostic surface of the semantic analysis core.
//!
//! Passes never throw: every failure becomes a `Diagnostic` appended to a
//! shared list, paired with the source token that should be underlined.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
}

/// One accumulated error: a rendered message plus the span of the token
/// that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            message: message.into(),
            span,
        }
    }
}

/// Canonical message templates, verbatim from the language's diagnostic
/// catalogue. Kept as functions rather than a `format!` callsite per error
/// so every call site reads the same way a type checker's error table
/// usually does.
pub mod messages {
    pub fn wrong_signature(method: &str, class: &str) -> String {
        format!(r#"Method "{method}" already defined in "{class}" with a different signature."#)
    }

    pub fn self_is_readonly() -> String {
        r#"Variable "self" is read-only."#.to_string()
    }

    pub fn local_already_defined(name: &str, method: &str) -> String {
        format!(r#"Variable "{name}" is already defined in method "{method}"."#)
    }

    pub fn attribute_already_defined(name: &str, class: &str) -> String {
        format!(r#"Attribute "{name}" is already defined in class "{class}"."#)
    }

    pub fn incompatible_types(from: &str, to: &str) -> String {
        format!(r#"Cannot convert "{from}" into "{to}"."#)
    }

    pub fn variable_not_defined(name: &str) -> String {
        format!(r#"Variable "{name}" is not defined."#)
    }

    pub fn invalid_operation(left: &str, right: &str) -> String {
        format!(r#"Operation is not defined between "{left}" and "{right}"."#)
    }

    pub fn condition_not_bool(construct: &str, actual: &str) -> String {
        format!(r#""{construct}" conditions return type must be Bool not "{actual}""#)
    }

    pub fn cyclic_heritage() -> String {
        "Cyclic heritage.".to_string()
    }

    pub fn no_main_class() -> String {
        r#"No definition for class "Main""#.to_string()
    }

    pub fn main_must_have_main_method() -> String {
        r#"Class "Main" must have a method "main""#.to_string()
    }

    pub fn main_takes_no_params() -> String {
        r#"Method "main" must takes no formal parameters"#.to_string()
    }

    pub fn cannot_inherit_from(name: &str) -> String {
        format!(r#"Is not possible to inherits from "{name}""#)
    }

    pub fn invalid_class_name(name: &str) -> String {
        format!(r#""{name}" is an invalid class name"#)
    }

    pub fn wrong_argument_count(method: &str, class: &str, expected: usize) -> String {
        format!(r#"Method "{method}" of "{class}" only accepts {expected} argument(s)"#)
    }

    pub fn invalid_self_type_cast() -> String {
        "Invalid use of SELF_TYPE".to_string()
    }

    pub fn undefined_type(name: &str) -> String {
        format!(r#"Type "{name}" is not defined."#)
    }

    pub fn class_already_defined(name: &str) -> String {
        format!(r#"Class "{name}" is already defined."#)
    }
}
