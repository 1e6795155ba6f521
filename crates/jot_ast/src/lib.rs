//! jot_ast: Abstract Syntax Tree definitions for the Jot analyzer.
//!
//! This crate defines all AST node types, operator enums, and flag types,
//! plus a visitor for traversal. Nodes live in a [`bumpalo`] arena owned by
//! the caller and borrow from it for the lifetime of one parse.

pub mod node;
pub mod types;
pub mod visit;

// Re-export key types
pub use node::*;
pub use types::*;
pub use visit::{walk_class_member, walk_expression, walk_statement, AstVisitor};

/// Arena that owns every node of one parsed document.
pub type AstArena = bumpalo::Bump;
