//! Artifact model, expansion, and metadata extraction.

pub mod expand;
pub mod metadata;
pub mod types;

pub use expand::ArtifactExpander;
pub use metadata::{
    collect_keys, derive_operations, extract_dependencies, extract_path_entities,
    extract_sql_tables, TableRef,
};
pub use types::{
    entities_match, Artifact, ArtifactKind, ArtifactMetadata, ChangedFile, DriftResult, Operation,
    Severity,
};
