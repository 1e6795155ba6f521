//! jot_types: Type representation and ambient builtins.
//!
//! Defines the closed set of type shapes the inference engine works with,
//! the [`TypeTable`] arena they live in, and the [`BuiltinRegistry`] of
//! ambient globals and prototype members. Unions are always simplified at
//! construction; consumers compare types structurally, never by id.

mod builtins;
mod types;

pub use builtins::BuiltinRegistry;
pub use types::{
    ClassType, FunctionType, MemberTable, ParameterType, Type, TypeId, TypeKind, TypeTable,
};
