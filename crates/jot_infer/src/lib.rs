//! jot_infer: On-demand type inference.
//!
//! Lazy and forgiving by design: nothing is typed until somebody asks,
//! results are memoized per node and context, and any construct the rules
//! do not cover is `any` rather than an error. The scope tree supplies
//! name resolution; [`jot_types`] supplies the type representation and
//! the ambient builtin surface.

mod engine;

pub use engine::{ContextFingerprint, InferenceEngine, PathNode};
