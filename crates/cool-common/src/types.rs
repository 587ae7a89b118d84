//! The handles shared between the AST and the checker's type context.
//!
//! AST nodes never own a `Type`; they hold one of these small `Copy`
//! handles instead, which is what lets `cool-ast` stay independent of
//! `cool-checker`'s `Context` implementation.

use serde::{Deserialize, Serialize};

/// A non-owning handle to a `Type` registered in a `Context`. Indexes into
/// `Context`'s type table; meaningless outside of the `Context` that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// A resolved type reference as it appears on an AST node or in a
/// method/attribute signature.
///
/// `SelfType` and `Auto` are kept out of `TypeId` deliberately: neither is
/// a real entry in the inheritance forest, so folding them into `TypeId`
/// would let a stray lookup treat them as an ordinary class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A concrete class: a built-in (`Object`, `Int`, `String`, `Bool`,
    /// `IO`) or a user-declared class.
    Class(TypeId),
    /// `SELF_TYPE`, relative to whatever class is "current" at the use
    /// site.
    SelfType,
    /// `AUTO_TYPE`, pending inference.
    Auto,
    /// A sentinel standing in for a type that failed to resolve. Suppresses
    /// further cascading diagnostics at the sites the spec calls out.
    Error,
    /// The type of a `while` loop and other expressions with no usable
    /// value.
    Void,
}

/// A non-owning handle to a lexical scope frame, attached to AST nodes
/// that introduce bindings so later passes can revisit the frame without
/// re-walking the tree from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);
