//! Lexical scoping. Frames form a tree; binder AST nodes (class bodies,
//! method bodies, `let`, `case` branches) each hold the [`ScopeId`] of the
//! frame they introduced, so the inference pass can revisit a binding
//! without re-walking the tree from the class root.

use cool_common::{ScopeId, TypeRef};

struct Frame {
    parent: Option<ScopeId>,
    bindings: Vec<(String, TypeRef)>,
}

pub struct ScopeTree {
    frames: Vec<Frame>,
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree { frames: Vec::new() }
    }

    pub fn root(&mut self) -> ScopeId {
        self.new_frame(None)
    }

    pub fn create_child(&mut self, parent: ScopeId) -> ScopeId {
        self.new_frame(Some(parent))
    }

    fn new_frame(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.frames.len() as u32);
        self.frames.push(Frame {
            parent,
            bindings: Vec::new(),
        });
        id
    }

    pub fn define_variable(&mut self, scope: ScopeId, name: &str, ty: TypeRef) {
        self.frames[scope.0 as usize]
            .bindings
            .push((name.to_string(), ty));
    }

    /// Whether `name` is bound in `scope` itself, ignoring ancestors.
    pub fn is_local(&self, scope: ScopeId, name: &str) -> bool {
        self.frames[scope.0 as usize]
            .bindings
            .iter()
            .any(|(n, _)| n == name)
    }

    pub fn is_defined(&self, scope: ScopeId, name: &str) -> bool {
        self.find_variable(scope, name).is_some()
    }

    pub fn find_variable(&self, scope: ScopeId, name: &str) -> Option<TypeRef> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let frame = &self.frames[s.0 as usize];
            if let Some((_, ty)) = frame.bindings.iter().rev().find(|(n, _)| n == name) {
                return Some(*ty);
            }
            cur = frame.parent;
        }
        None
    }

    /// Narrows the nearest binding of `name` visible from `scope` to
    /// `ty`. Used by the inference pass once an `AUTO_TYPE` slot has been
    /// resolved. Returns whether a binding was found.
    pub fn narrow_variable(&mut self, scope: ScopeId, name: &str, ty: TypeRef) -> bool {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let frame = &mut self.frames[s.0 as usize];
            if let Some(slot) = frame.bindings.iter_mut().rev().find(|(n, _)| n == name) {
                slot.1 = ty;
                return true;
            }
            cur = frame.parent;
        }
        false
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings_but_not_vice_versa() {
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.define_variable(root, "self", TypeRef::Auto);
        let child = scopes.create_child(root);
        scopes.define_variable(child, "x", TypeRef::Auto);

        assert!(scopes.is_defined(child, "self"));
        assert!(!scopes.is_local(child, "self"));
        assert!(!scopes.is_defined(root, "x"));
    }

    #[test]
    fn narrow_variable_updates_the_owning_frame() {
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.define_variable(root, "x", TypeRef::Auto);
        let child = scopes.create_child(root);

        assert!(scopes.narrow_variable(child, "x", TypeRef::Void));
        assert_eq!(scopes.find_variable(child, "x"), Some(TypeRef::Void));
        assert_eq!(scopes.find_variable(root, "x"), Some(TypeRef::Void));
    }
}
