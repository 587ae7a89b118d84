//! The type context: every class the program and the language runtime
//! define, plus the conformance lattice built on top of them.
//!
//! `SELF_TYPE` and `AUTO_TYPE` are deliberately *not* entries in this
//! table (see [`TypeRef`]); only real classes get a [`TypeId`].

use cool_common::{TypeId, TypeRef};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub const OBJECT: &str = "Object";
pub const INT: &str = "Int";
pub const STRING: &str = "String";
pub const BOOL: &str = "Bool";
pub const IO: &str = "IO";
pub const SELF_TYPE: &str = "SELF_TYPE";
pub const AUTO_TYPE: &str = "AUTO_TYPE";

/// Names that are reserved and can never name a user class, whether or
/// not they back a real `TypeId` (`SELF_TYPE`/`AUTO_TYPE` do not).
pub const BUILT_IN_NAMES: &[&str] = &[OBJECT, INT, STRING, BOOL, IO, SELF_TYPE, AUTO_TYPE];

/// Classes that cannot appear as a parent in an `inherits` clause.
pub const SEALED_NAMES: &[&str] = &[INT, STRING, BOOL, SELF_TYPE, AUTO_TYPE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub params: Vec<(String, TypeRef)>,
    pub return_type: TypeRef,
}

impl Method {
    /// Signature equality used to validate overrides: exact match,
    /// `SELF_TYPE` included verbatim (a parent returning `SELF_TYPE` is
    /// overridable only by a child also returning `SELF_TYPE`).
    pub fn same_signature(&self, other: &Method) -> bool {
        self.return_type == other.return_type
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|((_, a), (_, b))| a == b)
    }
}

#[derive(Debug, Clone)]
pub struct TypeData {
    pub name: String,
    pub parent: Option<TypeId>,
    pub sealed: bool,
    pub attributes: Vec<Attribute>,
    pub methods: IndexMap<String, Method>,
}

impl TypeData {
    fn new(name: impl Into<String>, sealed: bool) -> Self {
        TypeData {
            name: name.into(),
            parent: None,
            sealed,
            attributes: Vec::new(),
            methods: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineError {
    /// A class with this name already exists in the context.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeError {
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodError {
    WrongSignature,
}

pub struct Context {
    names: FxHashMap<String, TypeId>,
    types: Vec<TypeData>,
    pub object: TypeId,
    pub int_: TypeId,
    pub string_: TypeId,
    pub bool_: TypeId,
    pub io: TypeId,
}

impl Context {
    pub fn new() -> Self {
        let mut ctx = Context {
            names: FxHashMap::default(),
            types: Vec::new(),
            object: TypeId(0),
            int_: TypeId(0),
            string_: TypeId(0),
            bool_: TypeId(0),
            io: TypeId(0),
        };
        ctx.define_built_ins();
        ctx
    }

    fn push_type(&mut self, name: &str, sealed: bool) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeData::new(name, sealed));
        self.names.insert(name.to_string(), id);
        id
    }

    fn define_built_ins(&mut self) {
        let object = self.push_type(OBJECT, false);
        let int_ = self.push_type(INT, true);
        let string_ = self.push_type(STRING, true);
        let bool_ = self.push_type(BOOL, true);
        let io = self.push_type(IO, false);

        self.types[int_.0 as usize].parent = Some(object);
        self.types[string_.0 as usize].parent = Some(object);
        self.types[bool_.0 as usize].parent = Some(object);
        self.types[io.0 as usize].parent = Some(object);

        self.object = object;
        self.int_ = int_;
        self.string_ = string_;
        self.bool_ = bool_;
        self.io = io;

        let st = TypeRef::SelfType;
        let obj = TypeRef::Class(object);
        let s = TypeRef::Class(string_);
        let i = TypeRef::Class(int_);

        self.install_method(object, "abort", vec![], obj);
        self.install_method(object, "type_name", vec![], s);
        self.install_method(object, "copy", vec![], st);

        self.install_method(io, "out_string", vec![("x".into(), s)], st);
        self.install_method(io, "out_int", vec![("x".into(), i)], st);
        self.install_method(io, "in_string", vec![], s);
        self.install_method(io, "in_int", vec![], i);

        self.install_method(string_, "length", vec![], i);
        self.install_method(string_, "concat", vec![("s".into(), s)], s);
        self.install_method(
            string_,
            "substr",
            vec![("i".into(), i), ("l".into(), i)],
            s,
        );
    }

    fn install_method(&mut self, owner: TypeId, name: &str, params: Vec<(String, TypeRef)>, ret: TypeRef) {
        self.types[owner.0 as usize].methods.insert(
            name.to_string(),
            Method {
                name: name.to_string(),
                params,
                return_type: ret,
            },
        );
    }

    pub fn create_type(&mut self, name: &str) -> Result<TypeId, DefineError> {
        if self.names.contains_key(name) {
            return Err(DefineError::Duplicate);
        }
        Ok(self.push_type(name, false))
    }

    pub fn get_type_id(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Every registered type, built-in and user-defined.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    pub fn type_data_mut(&mut self, id: TypeId) -> &mut TypeData {
        &mut self.types[id.0 as usize]
    }

    pub fn set_parent(&mut self, id: TypeId, parent: TypeId) {
        self.types[id.0 as usize].parent = Some(parent);
    }

    pub fn name_of(&self, id: TypeId) -> &str {
        &self.types[id.0 as usize].name
    }

    /// Human-readable name for error messages; never panics on a
    /// sentinel.
    pub fn display(&self, t: TypeRef) -> String {
        match t {
            TypeRef::Class(id) => self.name_of(id).to_string(),
            TypeRef::SelfType => SELF_TYPE.to_string(),
            TypeRef::Auto => AUTO_TYPE.to_string(),
            TypeRef::Error => "<error>".to_string(),
            TypeRef::Void => "Void".to_string(),
        }
    }

    pub fn define_attribute(&mut self, owner: TypeId, name: &str, ty: TypeRef) -> Result<(), AttributeError> {
        let data = &mut self.types[owner.0 as usize];
        if data.attributes.iter().any(|a| a.name == name) {
            return Err(AttributeError::Duplicate);
        }
        data.attributes.push(Attribute {
            name: name.to_string(),
            ty,
        });
        Ok(())
    }

    /// Installs a method, honoring inheritance: if a same-named method is
    /// already visible (defined locally or inherited), the new signature
    /// must match exactly.
    pub fn define_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: Vec<(String, TypeRef)>,
        return_type: TypeRef,
    ) -> Result<(), MethodError> {
        let new_method = Method {
            name: name.to_string(),
            params,
            return_type,
        };
        if let Some(existing) = self.lookup_method(owner, name) {
            if !existing.same_signature(&new_method) {
                return Err(MethodError::WrongSignature);
            }
        }
        self.types[owner.0 as usize]
            .methods
            .insert(name.to_string(), new_method);
        Ok(())
    }

    /// The current type of `name`, declared directly on `owner` (not
    /// inherited). Unlike the token text in the AST, this reflects any
    /// narrowing the inference pass has already applied.
    pub fn attribute_type(&self, owner: TypeId, name: &str) -> Option<TypeRef> {
        self.types[owner.0 as usize]
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.ty)
    }

    /// Narrows a previously `AUTO_TYPE` attribute to its inferred type.
    /// `owner` must be the class that declares `name` directly — P4's
    /// post-pass class sweep only ever narrows a class's own attributes.
    pub fn narrow_attribute(&mut self, owner: TypeId, name: &str, ty: TypeRef) {
        if let Some(attr) = self.types[owner.0 as usize]
            .attributes
            .iter_mut()
            .find(|a| a.name == name)
        {
            attr.ty = ty;
        }
    }

    /// Narrows a method's return type in place. This is the rank-1
    /// compromise from the design notes: the first call site that
    /// resolves an `AUTO_TYPE` return narrows it for every call site.
    pub fn narrow_method_return(&mut self, owner: TypeId, name: &str, ty: TypeRef) {
        if let Some(m) = self.types[owner.0 as usize].methods.get_mut(name) {
            m.return_type = ty;
        }
    }

    /// Narrows one parameter's type on a method signature in place.
    pub fn narrow_method_param(&mut self, owner: TypeId, name: &str, index: usize, ty: TypeRef) {
        if let Some(m) = self.types[owner.0 as usize].methods.get_mut(name) {
            if let Some(param) = m.params.get_mut(index) {
                param.1 = ty;
            }
        }
    }

    /// Looks up a method on `owner`, walking the parent chain.
    pub fn lookup_method(&self, owner: TypeId, name: &str) -> Option<&Method> {
        let mut cur = Some(owner);
        while let Some(id) = cur {
            let data = &self.types[id.0 as usize];
            if let Some(m) = data.methods.get(name) {
                return Some(m);
            }
            cur = data.parent;
        }
        None
    }

    /// All attributes visible on `owner`, parent-first.
    pub fn attributes_in_order(&self, owner: TypeId) -> Vec<Attribute> {
        let mut chain = Vec::new();
        let mut cur = Some(owner);
        while let Some(id) = cur {
            chain.push(id);
            cur = self.types[id.0 as usize].parent;
        }
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|id| self.types[id.0 as usize].attributes.clone())
            .collect()
    }

    /// Resolves a declared type name to a [`TypeRef`]. `SELF_TYPE` and
    /// `AUTO_TYPE` map to their sentinel variants; an unregistered class
    /// name becomes `ErrorType` rather than panicking, since P2 installs
    /// signatures before every referenced class is guaranteed to exist.
    pub fn resolve_type_name(&self, name: &str) -> TypeRef {
        match name {
            SELF_TYPE => TypeRef::SelfType,
            AUTO_TYPE => TypeRef::Auto,
            _ => self.get_type_id(name).map(TypeRef::Class).unwrap_or(TypeRef::Error),
        }
    }

    /// `current` when `t` is `SELF_TYPE`, otherwise `t` unchanged.
    pub fn fixed_type(&self, t: TypeRef, current: TypeId) -> TypeRef {
        match t {
            TypeRef::SelfType => TypeRef::Class(current),
            other => other,
        }
    }

    fn is_ancestor(&self, ancestor: TypeId, descendant: TypeId) -> bool {
        let mut cur = Some(descendant);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.types[id.0 as usize].parent;
        }
        false
    }

    /// `a <= b`, after resolving any `SELF_TYPE` on either side against
    /// `current`. `ErrorType` conforms to nothing and nothing conforms to
    /// it, so it never masks a real conformance failure as success.
    pub fn conforms_to(&self, a: TypeRef, b: TypeRef, current: TypeId) -> bool {
        if a == TypeRef::Error || b == TypeRef::Error {
            return false;
        }
        // AUTO_TYPE is unresolved during P3: neither side can fail a
        // conformance check against it yet. P4 repairs the real relation
        // once inference has narrowed it to a concrete class.
        if a == TypeRef::Auto || b == TypeRef::Auto {
            return true;
        }
        match (self.fixed_type(a, current), self.fixed_type(b, current)) {
            (TypeRef::Class(x), TypeRef::Class(y)) => self.is_ancestor(y, x),
            _ => false,
        }
    }

    /// Least common ancestor of `types` under `<=`. `AUTO_TYPE` and
    /// `ErrorType` entries are dropped by the caller before this is
    /// reached (see the inference pass's cascade-suppression rules); this
    /// only ever sees concrete classes and `SELF_TYPE`.
    ///
    /// If every input is `SELF_TYPE` the result is `SELF_TYPE` itself,
    /// rather than widening to the enclosing class — two `SELF_TYPE`
    /// branches of an `if` still type as `SELF_TYPE`.
    pub fn lca(&self, current: TypeId, types: &[TypeRef]) -> TypeRef {
        if !types.is_empty() && types.iter().all(|t| *t == TypeRef::SelfType) {
            return TypeRef::SelfType;
        }

        let concrete: Vec<TypeId> = types
            .iter()
            .filter_map(|t| match self.fixed_type(*t, current) {
                TypeRef::Class(id) => Some(id),
                _ => None,
            })
            .collect();
        if concrete.is_empty() {
            return TypeRef::Error;
        }

        let n = concrete.len();
        let mut counter: FxHashMap<TypeId, usize> = FxHashMap::default();
        for start in &concrete {
            let mut node = *start;
            loop {
                let count = counter.entry(node).or_insert(0);
                *count += 1;
                if *count == n {
                    return TypeRef::Class(node);
                }
                match self.types[node.0 as usize].parent {
                    Some(p) => node = p,
                    None => break,
                }
            }
        }
        // Every user type shares `Object`, so this is unreachable for a
        // well-formed context.
        TypeRef::Class(self.object)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
