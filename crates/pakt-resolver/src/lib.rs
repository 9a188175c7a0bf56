//! Dependency resolution engine: recursive constraint-driven graph walk with
//! last-writer-wins conflict repair and cycle guard, constraint matching,
//! platform package classification, and dependency graph queries.

pub mod conflict;
pub mod constraint;
pub mod explain;
pub mod graph;
pub mod platform;
pub mod resolver;
pub mod state;

pub use resolver::{resolve_from_lock, ResolveError, ResolvedPackage, Resolver, MAX_REPAIRS};
