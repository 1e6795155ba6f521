//! jot_scopes: Scope tree and symbol table construction.
//!
//! One top-down walk over a parsed source file produces a queryable
//! [`ScopeTree`]: which names are visible at an offset, what a name
//! resolves to, where a symbol's declaration and references are. Hoisted
//! declarations (`var`, `function`) attach to the nearest function or
//! global scope; everything else is scoped to the block that declares it.

mod builder;
mod scope;
mod symbol;

pub use builder::{BindOutput, ScopeBuilder};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{Symbol, SymbolDeclaration, SymbolId, SymbolKind};
