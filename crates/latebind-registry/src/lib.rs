//! Latebind Registry crate.
//!
//! Holds the process-wide mirror of the module tree that deferred imports
//! bind against:
//!
//! - [`NamespaceTree`]: a `petgraph` tree of module nodes and type
//!   placeholders, created on demand from dotted names
//! - [`Registry`]: the facade used by the deferred engine and the
//!   substitution engine, adding the substitution record table and static
//!   member propagation
//!
//! The registry is single-threaded: it is populated while modules load and
//! consulted while types are instantiated, both on the loading thread.

mod namespace_tree;
mod registry;

pub use namespace_tree::{NamespaceTree, NodeKind, RegistryEdge, RegistryNode};
pub use registry::{ModuleId, PlaceholderId, Registry, RegistryItem, SubstitutionRecord};

pub use latebind_core::{RegistrationError, TypeHash};
