//! The scope tree: an index-based arena of nested scopes.
//!
//! Scopes are created top-down by the builder and never removed, so plain
//! `Vec` indices serve as ids and the tree stays queryable after the walk
//! finishes. Resolution walks the innermost scope containing an offset
//! outward; the first match wins.

use crate::symbol::{Symbol, SymbolId};
use indexmap::IndexMap;
use jot_core::TextRange;
use rustc_hash::{FxBuildHasher, FxHashSet};

/// Hash map that iterates in insertion order. Completion lists come out in
/// declaration order because of it.
type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Index of a scope within its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const INVALID: ScopeId = ScopeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    /// Arrow function body.
    Lambda,
    Block,
    Catch,
    /// Class body; methods nest inside it.
    Class,
}

impl ScopeKind {
    /// Whether hoisted (`var`, `function`) declarations attach here.
    #[inline]
    pub fn is_hoist_target(self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Function | ScopeKind::Lambda)
    }
}

/// One scope: a source range, a parent, and the symbols declared directly
/// in it, in declaration order.
#[derive(Debug)]
pub struct Scope<'a> {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub range: TextRange,
    pub children: Vec<ScopeId>,
    symbols: FxIndexMap<&'a str, SymbolId>,
}

impl<'a> Scope<'a> {
    fn new(id: ScopeId, parent: Option<ScopeId>, kind: ScopeKind, range: TextRange) -> Self {
        Self {
            id,
            parent,
            kind,
            range,
            children: Vec::new(),
            symbols: FxIndexMap::default(),
        }
    }

    /// Look up a name declared directly in this scope.
    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    /// Symbols declared directly in this scope, in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.values().copied()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

/// The scope tree for one source file, rooted at a single global scope.
#[derive(Debug)]
pub struct ScopeTree<'a> {
    scopes: Vec<Scope<'a>>,
    symbols: Vec<Symbol<'a>>,
}

impl<'a> ScopeTree<'a> {
    pub fn new(file_range: TextRange) -> Self {
        let root = Scope::new(ScopeId(0), None, ScopeKind::Global, file_range);
        Self { scopes: vec![root], symbols: Vec::new() }
    }

    #[inline]
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol<'a> {
        &mut self.symbols[id.index()]
    }

    pub fn scopes(&self) -> &[Scope<'a>] {
        &self.scopes
    }

    pub fn symbols(&self) -> &[Symbol<'a>] {
        &self.symbols
    }

    #[inline]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Add a child scope under `parent`.
    pub fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind, range: TextRange) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, Some(parent), kind, range));
        self.scopes[parent.index()].children.push(id);
        id
    }

    /// Add a symbol to a scope, assigning its id. The caller has already
    /// handled collisions; inserting an existing name replaces the entry.
    pub fn define_symbol(&mut self, scope: ScopeId, mut symbol: Symbol<'a>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        symbol.id = id;
        symbol.scope = scope;
        self.scopes[scope.index()].symbols.insert(symbol.name, id);
        self.symbols.push(symbol);
        id
    }

    /// The nearest enclosing scope of `scope` (itself included) where
    /// hoisted declarations land. The global root terminates the walk.
    pub fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let scope = &self.scopes[current.index()];
            if scope.kind.is_hoist_target() {
                return current;
            }
            match scope.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// The innermost scope whose range contains `offset`. End offsets count
    /// as inside, so a cursor right after a closing brace still lands in
    /// the scope it closes.
    pub fn scope_at(&self, offset: u32) -> ScopeId {
        let mut current = self.root();
        loop {
            let next = self.scopes[current.index()]
                .children
                .iter()
                .copied()
                .find(|&child| self.scopes[child.index()].range.contains_inclusive(offset));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Resolve a name by walking the scope chain from `scope` outward.
    pub fn resolve_in(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(symbol) = scope.symbol(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve a name as seen from a source offset.
    pub fn resolve(&self, name: &str, offset: u32) -> Option<SymbolId> {
        self.resolve_in(self.scope_at(offset), name)
    }

    /// All symbols visible from `scope`: innermost scope first, declaration
    /// order within each scope, shadowed names dropped.
    pub fn visible_symbols(&self, scope: ScopeId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            for symbol in scope.symbols() {
                if seen.insert(self.symbols[symbol.index()].name) {
                    out.push(symbol);
                }
            }
            current = scope.parent;
        }
        out
    }

    /// All symbols visible from a source offset.
    pub fn visible_symbols_at(&self, offset: u32) -> Vec<SymbolId> {
        self.visible_symbols(self.scope_at(offset))
    }

    /// Visible symbols whose names start with `prefix`, matched
    /// case-insensitively. An empty prefix matches everything.
    pub fn symbols_with_prefix(&self, scope: ScopeId, prefix: &str) -> Vec<SymbolId> {
        self.visible_symbols(scope)
            .into_iter()
            .filter(|&id| starts_with_ignore_case(self.symbols[id.index()].name, prefix))
            .collect()
    }

    /// The symbol whose declaring name or recorded reference covers
    /// `offset`, if any.
    pub fn symbol_at(&self, offset: u32) -> Option<SymbolId> {
        self.symbols.iter().find_map(|symbol| {
            let hit = symbol.name_range.contains_inclusive(offset)
                || symbol.references.iter().any(|r| r.contains_inclusive(offset));
            hit.then_some(symbol.id)
        })
    }
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if name.len() < prefix.len() || !name.is_char_boundary(prefix.len()) {
        return false;
    }
    name[..prefix.len()].eq_ignore_ascii_case(prefix)
}
