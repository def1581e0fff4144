pub mod curator;
pub mod graph;
pub mod index;
pub mod scan;

pub use curator::{BuildRequest, ContextCurator, EvaluationReport, ProjectStructure, RETENTION_THRESHOLD};
pub use graph::{CodeDiscovery, CodeElement, DependencyGraph, EdgeResolver, ElementKind, ResolverKind};
pub use index::{ChangeType, ContextIndex, ContextItem, ItemType};
