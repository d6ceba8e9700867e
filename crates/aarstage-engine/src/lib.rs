//! Dependency resolution, prepare-task wiring, and library staging for aarstage.

pub mod checker;
pub mod classify;
pub mod container;
pub mod dependency;
pub mod error;
pub mod prepare;
pub mod project;
pub mod reporter;
pub mod resolution;
pub mod walker;
pub mod wiring;

pub use container::{DependencyContainer, FlatDependencies};
pub use dependency::{DependencyGraph, Node, NodeId};
pub use error::EngineError;
pub use project::{clean, prepare, resolve, Project, ResolveOptions};
pub use reporter::{ErrorReporter, IssueKind, Severity, SyncIssue};
pub use resolution::ResolvedGraph;
pub use walker::{resolve_module, ModuleDependencies, VariantDependencies};
pub use wiring::{wire_module, TaskGraph};
