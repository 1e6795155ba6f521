//! String interning for symbol and member names.
//!
//! Names are compared and hashed constantly during scope resolution and
//! member lookup, so they are interned once and handled as small copyable
//! keys afterwards.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned string key. Copy, compare, and hash are O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternedString(Spur);

/// The shared interner. Cloning is cheap (reference-counted) and clones
/// observe the same pool, so keys from one clone resolve through any other.
#[derive(Debug, Clone)]
pub struct StringInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self { rodeo: Arc::new(ThreadedRodeo::default()) }
    }

    /// Intern a string, returning its key. Repeated calls with equal text
    /// return equal keys.
    pub fn intern(&self, text: &str) -> InternedString {
        InternedString(self.rodeo.get_or_intern(text))
    }

    /// Look up a string without interning it.
    pub fn get(&self, text: &str) -> Option<InternedString> {
        self.rodeo.get(text).map(InternedString)
    }

    /// Resolve a key back to its text.
    pub fn resolve(&self, key: InternedString) -> &str {
        self.rodeo.resolve(&key.0)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Wrap a key for display through this interner.
    pub fn display(&self, key: InternedString) -> DisplayInterned<'_> {
        DisplayInterned { interner: self, key }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Displays an interned string by resolving it on demand.
pub struct DisplayInterned<'a> {
    interner: &'a StringInterner,
    key: InternedString,
}

impl fmt::Display for DisplayInterned<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interner.resolve(self.key))
    }
}
