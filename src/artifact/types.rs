//! Core artifact types and inbound analyzer schemas.
//!
//! An artifact is the atomic unit of drift: one API endpoint, one
//! database table, one IaC resource, one configuration file. Analyzers
//! report coarser drift results; the expander turns those into
//! artifacts.

use crate::graph::{GraphEdge, GraphMetrics};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of artifact that can drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Api,
    Database,
    Infrastructure,
    Configuration,
    Code,
    Unknown,
}

impl ArtifactKind {
    /// Prefix used when constructing artifact ids of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Database => "db",
            Self::Infrastructure => "iac",
            Self::Configuration => "config",
            Self::Code => "code",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Database => write!(f, "database"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Code => write!(f, "code"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Advisory severity attached by the analyzer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// CRUD-style operation derived from change descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Structured metadata attached to an artifact by the extractor.
///
/// All list fields are kept de-duplicated; merging is a non-destructive
/// union.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactMetadata {
    /// Domain entities this artifact touches (table names, path tokens)
    pub entities: Vec<String>,
    /// CRUD operations the change performs
    pub operations: Vec<Operation>,
    /// Field/key names mentioned by the analyzer
    pub fields: Vec<String>,
    /// Declared package dependencies
    pub dependencies: Vec<String>,
}

impl ArtifactMetadata {
    /// Add an entity if not already present.
    pub fn push_entity(&mut self, entity: impl Into<String>) {
        let entity = entity.into();
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    /// Add an operation if not already present.
    pub fn push_operation(&mut self, op: Operation) {
        if !self.operations.contains(&op) {
            self.operations.push(op);
        }
    }

    /// Add a field name if not already present.
    pub fn push_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    /// Add a dependency if not already present.
    pub fn push_dependency(&mut self, dep: impl Into<String>) {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
    }

    /// Union another metadata record into this one.
    pub fn merge(&mut self, other: &ArtifactMetadata) {
        for entity in &other.entities {
            self.push_entity(entity.clone());
        }
        for op in &other.operations {
            self.push_operation(*op);
        }
        for field in &other.fields {
            self.push_field(field.clone());
        }
        for dep in &other.dependencies {
            self.push_dependency(dep.clone());
        }
    }

    /// Whether any entity matches, case-insensitively and with naive
    /// plural folding.
    pub fn shares_entity_with(&self, other: &ArtifactMetadata) -> Vec<String> {
        let mut shared = Vec::new();
        for a in &self.entities {
            for b in &other.entities {
                if entities_match(a, b) && !shared.contains(a) {
                    shared.push(a.clone());
                }
            }
        }
        shared
    }
}

/// Case-insensitive entity comparison with naive plural folding.
pub fn entities_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return true;
    }
    let a_stem = a.strip_suffix('s').unwrap_or(&a);
    let b_stem = b.strip_suffix('s').unwrap_or(&b);
    !a_stem.is_empty() && a_stem == b_stem
}

/// The atomic unit of drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Deterministic canonical id, `<kind>:<discriminator>`
    pub id: String,
    pub kind: ArtifactKind,
    /// Source path in the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Did this PR modify it?
    pub changed: bool,
    pub severity: Severity,
    /// Logical service grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub metadata: ArtifactMetadata,
    /// Human-readable change descriptors from the analyzer
    pub changes: Vec<String>,
    /// Best impact path, attached after graph analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_path: Option<Vec<GraphEdge>>,
    /// Graph metrics, attached after graph analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_metrics: Option<GraphMetrics>,
}

impl Artifact {
    /// Create a new artifact with the given id and kind.
    pub fn new(id: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            id: id.into(),
            kind,
            file: None,
            changed: false,
            severity: Severity::Low,
            service: None,
            metadata: ArtifactMetadata::default(),
            changes: Vec::new(),
            impact_path: None,
            graph_metrics: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn as_changed(mut self) -> Self {
        self.changed = true;
        self
    }

    pub fn with_change(mut self, change: impl Into<String>) -> Self {
        self.changes.push(change.into());
        self
    }

    /// Merge a later occurrence of the same id into this artifact.
    ///
    /// The first artifact wins on identity fields; later occurrences
    /// contribute their evidence, and `changed`/`severity` escalate
    /// monotonically.
    pub fn absorb(&mut self, other: &Artifact) {
        self.changed |= other.changed;
        self.severity = self.severity.max(other.severity);
        if self.file.is_none() {
            self.file = other.file.clone();
        }
        if self.service.is_none() {
            self.service = other.service.clone();
        }
        self.metadata.merge(&other.metadata);
        for change in &other.changes {
            if !self.changes.contains(change) {
                self.changes.push(change.clone());
            }
        }
    }
}

/// A drift result as reported by a per-format analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftResult {
    /// Artifact kind the analyzer classified this result as
    #[serde(rename = "type")]
    pub kind: Option<ArtifactKind>,
    pub file: Option<String>,
    pub severity: Option<Severity>,
    pub changed: Option<bool>,
    /// API endpoints named by this result, `"GET /users"` form
    pub endpoints: Vec<String>,
    /// Entities named directly by the analyzer (table names, resources)
    pub entities: Vec<String>,
    /// Human-readable change descriptors
    pub changes: Vec<String>,
    /// Free-form analyzer metadata
    pub metadata: Option<Value>,
    pub service: Option<String>,
}

/// A changed file from the pull request file list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

impl ChangedFile {
    pub fn new(filename: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: status.into(),
            additions: 0,
            deletions: 0,
        }
    }
}
