//! Type registry: interned type handles and the predicates the overload
//! matcher consults.
//!
//! Types are referenced by [`TypeId`] integer handles so that defs and types
//! can reference each other without pointer cycles. The registry is
//! append-only during semantic analysis; [`TypeRegistry::intern`] is the
//! single entry point through which new instantiations (tuples, unions) are
//! created.

use std::collections::HashMap;

/// Integer handle into the type registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// Shape of a registered type.
#[derive(Clone, Debug)]
pub enum TypeKind {
    Object {
        name: String,
        supertype: Option<TypeId>,
        is_abstract: bool,
    },
    Tuple {
        elements: Vec<TypeId>,
    },
    Union {
        members: Vec<TypeId>,
    },
    Alias {
        name: String,
        target: TypeId,
    },
}

/// Handles of the types every program starts with.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub object: TypeId,
    pub value: TypeId,
    pub number: TypeId,
    pub int: TypeId,
    pub int32: TypeId,
    pub int64: TypeId,
    pub float: TypeId,
    pub float64: TypeId,
    pub bool_: TypeId,
    pub char_: TypeId,
    pub symbol: TypeId,
    pub nil: TypeId,
    pub reference: TypeId,
    pub string: TypeId,
    /// Owner of top-level defs.
    pub program: TypeId,
}

/// Process-wide store of types, append-only during semantic analysis.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    kinds: Vec<TypeKind>,
    by_name: HashMap<String, TypeId>,
    tuples: HashMap<Vec<TypeId>, TypeId>,
    unions: HashMap<Vec<TypeId>, TypeId>,
    builtins: Builtins,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: Vec::new(),
            by_name: HashMap::new(),
            tuples: HashMap::new(),
            unions: HashMap::new(),
            // Placeholder ids, fixed up immediately below.
            builtins: Builtins {
                object: TypeId(0),
                value: TypeId(0),
                number: TypeId(0),
                int: TypeId(0),
                int32: TypeId(0),
                int64: TypeId(0),
                float: TypeId(0),
                float64: TypeId(0),
                bool_: TypeId(0),
                char_: TypeId(0),
                symbol: TypeId(0),
                nil: TypeId(0),
                reference: TypeId(0),
                string: TypeId(0),
                program: TypeId(0),
            },
        };

        let object = registry.declare_abstract_class("Object", None);
        let value = registry.declare_abstract_class("Value", Some(object));
        let number = registry.declare_abstract_class("Number", Some(value));
        let int = registry.declare_abstract_class("Int", Some(number));
        let int32 = registry.declare_class("Int32", Some(int));
        let int64 = registry.declare_class("Int64", Some(int));
        let float = registry.declare_abstract_class("Float", Some(number));
        let float64 = registry.declare_class("Float64", Some(float));
        let bool_ = registry.declare_class("Bool", Some(value));
        let char_ = registry.declare_class("Char", Some(value));
        let symbol = registry.declare_class("Symbol", Some(value));
        let nil = registry.declare_class("Nil", Some(value));
        let reference = registry.declare_abstract_class("Reference", Some(object));
        let string = registry.declare_class("String", Some(reference));
        let program = registry.declare_class("Program", Some(object));

        registry.builtins = Builtins {
            object,
            value,
            number,
            int,
            int32,
            int64,
            float,
            float64,
            bool_,
            char_,
            symbol,
            nil,
            reference,
            string,
            program,
        };
        registry
    }

    #[must_use]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Single interning entry point; all type creation funnels through here.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.kinds.len());
        if let TypeKind::Object { name, .. } | TypeKind::Alias { name, .. } = &kind {
            self.by_name.insert(name.clone(), id);
        }
        self.kinds.push(kind);
        id
    }

    pub fn declare_class(&mut self, name: impl Into<String>, supertype: Option<TypeId>) -> TypeId {
        self.intern(TypeKind::Object {
            name: name.into(),
            supertype,
            is_abstract: false,
        })
    }

    pub fn declare_abstract_class(
        &mut self,
        name: impl Into<String>,
        supertype: Option<TypeId>,
    ) -> TypeId {
        self.intern(TypeKind::Object {
            name: name.into(),
            supertype,
            is_abstract: true,
        })
    }

    pub fn declare_alias(&mut self, name: impl Into<String>, target: TypeId) -> TypeId {
        self.intern(TypeKind::Alias {
            name: name.into(),
            target,
        })
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.0]
    }

    /// Follow alias links to the underlying type.
    #[must_use]
    pub fn remove_alias(&self, id: TypeId) -> TypeId {
        let mut current = id;
        // Alias chains are finite; the registry rejects cycles at declaration.
        for _ in 0..self.kinds.len() {
            match self.kind(current) {
                TypeKind::Alias { target, .. } => current = *target,
                _ => return current,
            }
        }
        current
    }

    #[must_use]
    pub fn is_union(&self, id: TypeId) -> bool {
        matches!(self.kind(self.remove_alias(id)), TypeKind::Union { .. })
    }

    #[must_use]
    pub fn union_members(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.kind(self.remove_alias(id)) {
            TypeKind::Union { members } => Some(members),
            _ => None,
        }
    }

    #[must_use]
    pub fn tuple_elements(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.kind(self.remove_alias(id)) {
            TypeKind::Tuple { elements } => Some(elements),
            _ => None,
        }
    }

    #[must_use]
    pub fn supertype(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(self.remove_alias(id)) {
            TypeKind::Object { supertype, .. } => *supertype,
            _ => None,
        }
    }

    /// The type itself followed by its supertype chain, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![self.remove_alias(id)];
        let mut current = self.remove_alias(id);
        while let Some(supertype) = self.supertype(current) {
            current = self.remove_alias(supertype);
            chain.push(current);
        }
        chain
    }

    /// Intern a tuple instantiation.
    pub fn tuple_of(&mut self, elements: Vec<TypeId>) -> TypeId {
        if let Some(existing) = self.tuples.get(&elements) {
            return *existing;
        }
        let id = self.intern(TypeKind::Tuple {
            elements: elements.clone(),
        });
        self.tuples.insert(elements, id);
        id
    }

    /// Intern a union, flattening nested unions and deduplicating members.
    /// A single-member union collapses to the member itself.
    pub fn union_of(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        for member in members {
            let member = self.remove_alias(member);
            match self.kind(member) {
                TypeKind::Union { members: inner } => {
                    for inner_member in inner.clone() {
                        if !flat.contains(&inner_member) {
                            flat.push(inner_member);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        if flat.len() == 1 {
            return flat[0];
        }
        flat.sort();
        if let Some(existing) = self.unions.get(&flat) {
            return *existing;
        }
        let id = self.intern(TypeKind::Union {
            members: flat.clone(),
        });
        self.unions.insert(flat, id);
        id
    }

    /// Subtype test used by restriction checks and specificity ranking.
    #[must_use]
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.remove_alias(a);
        let b = self.remove_alias(b);
        if a == b {
            return true;
        }
        if let TypeKind::Union { members } = self.kind(a) {
            return members.iter().all(|member| self.is_subtype(*member, b));
        }
        if let TypeKind::Union { members } = self.kind(b) {
            return members.iter().any(|member| self.is_subtype(a, *member));
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Tuple { elements: lhs }, TypeKind::Tuple { elements: rhs }) => {
                lhs.len() == rhs.len()
                    && lhs
                        .iter()
                        .zip(rhs.iter())
                        .all(|(l, r)| self.is_subtype(*l, *r))
            }
            (TypeKind::Object { .. }, TypeKind::Object { .. }) => {
                let mut current = a;
                while let Some(supertype) = self.supertype(current) {
                    if supertype == b {
                        return true;
                    }
                    current = supertype;
                }
                false
            }
            // Tuples sit under Object for the purposes of unrestricted slots.
            (TypeKind::Tuple { .. }, TypeKind::Object { .. }) => b == self.builtins.object,
            _ => false,
        }
    }

    /// Human-readable rendering of a type handle.
    #[must_use]
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Object { name, .. } | TypeKind::Alias { name, .. } => name.clone(),
            TypeKind::Tuple { elements } => {
                let inner: Vec<String> = elements.iter().map(|e| self.display(*e)).collect();
                format!("{{{}}}", inner.join(", "))
            }
            TypeKind::Union { members } => {
                let inner: Vec<String> = members.iter().map(|m| self.display(*m)).collect();
                inner.join(" | ")
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
