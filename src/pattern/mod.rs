//! Pattern construction, the linked node arena and structural checks.
//!
//! Patterns are built as owned [Pat] trees with the free functions in [pat]
//! or parsed from text with [Pat::parse]. Compiling flattens them into a
//! [PatternTree] where every node knows its parent and, inside deconstructors
//! and sequences, its neighbours.

pub mod pat;
mod tree;
mod validate;

pub use pat::{CompareFn, GuardFn, KeyedShape, Pat};
pub use tree::{Literal, Node, NodeId, NodeKind, NodePath, PatternTree};
pub use validate::validate;
