//! Type representation.
//!
//! Types are stored in a [`TypeTable`] arena and referenced by [`TypeId`],
//! which sidesteps ownership cycles in recursive types (a class whose
//! methods return instances of itself). Primitives are seeded once and
//! shared; everything else is built fresh and compared structurally.

use indexmap::IndexMap;
use jot_core::intern::{InternedString, StringInterner};
use rustc_hash::FxBuildHasher;

/// Comparing deeper than this treats the types as distinct. Only reachable
/// through pathological nesting; ordinary programs stay in single digits.
const MAX_COMPARE_DEPTH: u32 = 32;

/// Rendering deeper than this prints `...` in place of the inner type.
const MAX_DISPLAY_DEPTH: u32 = 20;

/// Longest inheritance chain walked before giving up.
const MAX_SUPER_CHAIN: u32 = 64;

/// Index of a type in the [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Member tables keep declaration order so hover and completion output is
/// stable across runs.
pub type MemberTable = IndexMap<InternedString, TypeId, FxBuildHasher>;

/// A type in the analyzed language.
#[derive(Debug, Clone)]
pub struct Type {
    pub id: TypeId,
    pub kind: TypeKind,
}

/// The closed set of type shapes.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// `string`, `number`, `boolean`, `null`, `undefined`, `any`, `void`.
    Primitive { name: &'static str },
    /// Homogeneous array.
    Array { element: TypeId },
    /// Structural object, `{ x: number }`.
    Object { members: MemberTable },
    /// Function or method signature.
    Function(FunctionType),
    /// A class declaration. Exposes static members only.
    Class(ClassType),
    /// An instance of a class. Exposes instance members only.
    Instance { class: TypeId },
    /// Simplified union. Never nests another union and never holds `any`.
    Union { members: Vec<TypeId> },
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub parameters: Vec<ParameterType>,
    pub return_type: TypeId,
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterType {
    pub name: InternedString,
    pub type_id: TypeId,
}

#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: InternedString,
    /// Superclass `Class` type, when the declaration extends one.
    pub super_class: Option<TypeId>,
    /// Constructor signature as a `Function` type.
    pub constructor: Option<TypeId>,
    pub static_members: MemberTable,
    pub instance_members: MemberTable,
}

/// The type arena. Owns every type produced during one analysis plus the
/// name interner member tables key into.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
    names: StringInterner,
    // Well-known singletons, in seeding order.
    pub any_type: TypeId,
    pub string_type: TypeId,
    pub number_type: TypeId,
    pub boolean_type: TypeId,
    pub null_type: TypeId,
    pub undefined_type: TypeId,
    pub void_type: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::with_capacity(256),
            names: StringInterner::new(),
            any_type: TypeId(0),
            string_type: TypeId(1),
            number_type: TypeId(2),
            boolean_type: TypeId(3),
            null_type: TypeId(4),
            undefined_type: TypeId(5),
            void_type: TypeId(6),
        };
        table.add_type(TypeKind::Primitive { name: "any" });
        table.add_type(TypeKind::Primitive { name: "string" });
        table.add_type(TypeKind::Primitive { name: "number" });
        table.add_type(TypeKind::Primitive { name: "boolean" });
        table.add_type(TypeKind::Primitive { name: "null" });
        table.add_type(TypeKind::Primitive { name: "undefined" });
        table.add_type(TypeKind::Primitive { name: "void" });
        table
    }

    /// Add a type and return its id.
    pub fn add_type(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type { id, kind });
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()].kind
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The name interner shared by every member table in this arena.
    pub fn names(&self) -> &StringInterner {
        &self.names
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub fn array_of(&mut self, element: TypeId) -> TypeId {
        self.add_type(TypeKind::Array { element })
    }

    pub fn object_type(&mut self, members: MemberTable) -> TypeId {
        self.add_type(TypeKind::Object { members })
    }

    pub fn function_type(&mut self, function: FunctionType) -> TypeId {
        self.add_type(TypeKind::Function(function))
    }

    pub fn class_type(&mut self, class: ClassType) -> TypeId {
        self.add_type(TypeKind::Class(class))
    }

    pub fn instance_of(&mut self, class: TypeId) -> TypeId {
        self.add_type(TypeKind::Instance { class })
    }

    /// Build the simplified union of `members`: nested unions are
    /// flattened, structural duplicates dropped, `any` swallows the rest,
    /// and a single survivor is returned as itself.
    pub fn union_of(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = Vec::with_capacity(members.len());
        for &member in &members {
            self.flatten_into(member, &mut flat);
        }
        if flat.iter().any(|&member| member == self.any_type) {
            return self.any_type;
        }
        let mut unique: Vec<TypeId> = Vec::with_capacity(flat.len());
        for candidate in flat {
            if !unique.iter().any(|&kept| self.types_equal(kept, candidate)) {
                unique.push(candidate);
            }
        }
        match unique.len() {
            0 => self.any_type,
            1 => unique[0],
            _ => self.add_type(TypeKind::Union { members: unique }),
        }
    }

    fn flatten_into(&self, id: TypeId, out: &mut Vec<TypeId>) {
        if let TypeKind::Union { members } = self.kind(id) {
            for &member in members {
                self.flatten_into(member, out);
            }
        } else {
            out.push(id);
        }
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Structural equality. Unions compare order-independently; classes
    /// compare by name and superclass, which is enough because each
    /// declaration produces exactly one class type per analysis.
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        self.types_equal_at_depth(a, b, 0)
    }

    fn types_equal_at_depth(&self, a: TypeId, b: TypeId, depth: u32) -> bool {
        if a == b {
            return true;
        }
        if depth > MAX_COMPARE_DEPTH {
            return false;
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Primitive { name: x }, TypeKind::Primitive { name: y }) => x == y,
            (TypeKind::Array { element: x }, TypeKind::Array { element: y }) => {
                self.types_equal_at_depth(*x, *y, depth + 1)
            }
            (TypeKind::Object { members: x }, TypeKind::Object { members: y }) => {
                x.len() == y.len()
                    && x.iter().all(|(name, &xt)| {
                        y.get(name).is_some_and(|&yt| self.types_equal_at_depth(xt, yt, depth + 1))
                    })
            }
            (TypeKind::Function(x), TypeKind::Function(y)) => {
                x.is_async == y.is_async
                    && x.is_generator == y.is_generator
                    && x.parameters.len() == y.parameters.len()
                    && self.types_equal_at_depth(x.return_type, y.return_type, depth + 1)
                    && x.parameters.iter().zip(&y.parameters).all(|(p, q)| {
                        self.types_equal_at_depth(p.type_id, q.type_id, depth + 1)
                    })
            }
            (TypeKind::Class(x), TypeKind::Class(y)) => {
                x.name == y.name
                    && match (x.super_class, y.super_class) {
                        (None, None) => true,
                        (Some(sx), Some(sy)) => self.types_equal_at_depth(sx, sy, depth + 1),
                        _ => false,
                    }
            }
            (TypeKind::Instance { class: x }, TypeKind::Instance { class: y }) => {
                self.types_equal_at_depth(*x, *y, depth + 1)
            }
            (TypeKind::Union { members: x }, TypeKind::Union { members: y }) => {
                x.len() == y.len()
                    && x.iter().all(|&mx| {
                        y.iter().any(|&my| self.types_equal_at_depth(mx, my, depth + 1))
                    })
            }
            _ => false,
        }
    }

    /// Whether a value of `source` can stand where `target` is expected.
    /// `any` flows both ways, unions widen, and subclass instances flow
    /// into superclass instances.
    pub fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        self.is_assignable_at_depth(source, target, 0)
    }

    fn is_assignable_at_depth(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if source == target {
            return true;
        }
        if depth > MAX_COMPARE_DEPTH {
            return false;
        }
        if target == self.any_type || source == self.any_type {
            return true;
        }
        // No strict null mode in the analyzed language.
        if source == self.null_type || source == self.undefined_type {
            return true;
        }
        if let TypeKind::Union { members } = self.kind(target) {
            return members.iter().any(|&t| self.is_assignable_at_depth(source, t, depth + 1));
        }
        if let TypeKind::Union { members } = self.kind(source) {
            return members.iter().all(|&s| self.is_assignable_at_depth(s, target, depth + 1));
        }
        match (self.kind(source), self.kind(target)) {
            (TypeKind::Array { element: s }, TypeKind::Array { element: t }) => {
                self.is_assignable_at_depth(*s, *t, depth + 1)
            }
            (TypeKind::Instance { class: s }, TypeKind::Instance { class: t }) => {
                self.inherits_from(*s, *t, depth)
            }
            _ => self.types_equal_at_depth(source, target, depth),
        }
    }

    /// Walk `class` and its superclass chain looking for `target_class`.
    fn inherits_from(&self, class: TypeId, target_class: TypeId, depth: u32) -> bool {
        let mut current = class;
        for _ in 0..MAX_SUPER_CHAIN {
            if self.types_equal_at_depth(current, target_class, depth) {
                return true;
            }
            match self.kind(current) {
                TypeKind::Class(c) => match c.super_class {
                    Some(parent) => current = parent,
                    None => return false,
                },
                _ => return false,
            }
        }
        false
    }

    /// Superclass of a class type, when it has one.
    pub fn super_class_of(&self, class: TypeId) -> Option<TypeId> {
        match self.kind(class) {
            TypeKind::Class(c) => c.super_class,
            _ => None,
        }
    }

    // ========================================================================
    // Display
    // ========================================================================

    /// Render a type the way hover output shows it.
    pub fn display(&self, id: TypeId) -> String {
        self.display_at_depth(id, 0)
    }

    fn display_at_depth(&self, id: TypeId, depth: u32) -> String {
        if depth > MAX_DISPLAY_DEPTH {
            return "...".to_string();
        }
        match self.kind(id) {
            TypeKind::Primitive { name } => (*name).to_string(),
            TypeKind::Array { element } => {
                let inner = self.display_at_depth(*element, depth + 1);
                if matches!(self.kind(*element), TypeKind::Union { .. } | TypeKind::Function(_)) {
                    format!("({})[]", inner)
                } else {
                    format!("{}[]", inner)
                }
            }
            TypeKind::Object { members } => {
                if members.is_empty() {
                    "{}".to_string()
                } else {
                    let props = members
                        .iter()
                        .map(|(&name, &member)| {
                            format!(
                                "{}: {}",
                                self.names.resolve(name),
                                self.display_at_depth(member, depth + 1)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("; ");
                    format!("{{ {} }}", props)
                }
            }
            TypeKind::Function(function) => {
                let params = function
                    .parameters
                    .iter()
                    .map(|p| {
                        format!(
                            "{}: {}",
                            self.names.resolve(p.name),
                            self.display_at_depth(p.type_id, depth + 1)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({}) => {}", params, self.display_at_depth(function.return_type, depth + 1))
            }
            TypeKind::Class(class) => {
                let name = self.names.resolve(class.name);
                match class.super_class.and_then(|s| self.class_name(s)) {
                    Some(parent) => format!("class {} extends {}", name, parent),
                    None => format!("class {}", name),
                }
            }
            TypeKind::Instance { class } => match self.class_name(*class) {
                Some(name) => name.to_string(),
                None => "object".to_string(),
            },
            TypeKind::Union { members } => members
                .iter()
                .map(|&member| self.display_at_depth(member, depth + 1))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// The declared name of a class type.
    pub fn class_name(&self, id: TypeId) -> Option<&str> {
        match self.kind(id) {
            TypeKind::Class(c) => Some(self.names.resolve(c.name)),
            _ => None,
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
