//! Expansion of drift results into atomic artifacts.
//!
//! A single analyzer result may cover several endpoints, tables, or
//! resources. The expander splits those into one artifact each, builds
//! deterministic ids, and attaches extracted metadata. Equivalent ids
//! merge upward: the first occurrence wins, later ones contribute their
//! evidence.

use crate::artifact::metadata::{
    collect_keys, derive_operations, extract_dependencies, extract_path_entities,
    extract_sql_tables,
};
use crate::artifact::types::{Artifact, ArtifactKind, ArtifactMetadata, DriftResult, Severity};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Expands drift results into atomic artifacts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactExpander;

impl ArtifactExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expand all results, merging duplicate ids upward.
    pub fn expand(&self, results: &[DriftResult]) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for result in results {
            for artifact in self.expand_one(result) {
                match index.get(&artifact.id) {
                    Some(&i) => artifacts[i].absorb(&artifact),
                    None => {
                        index.insert(artifact.id.clone(), artifacts.len());
                        artifacts.push(artifact);
                    }
                }
            }
        }

        artifacts
    }

    /// Expand a single result into zero or more artifacts.
    fn expand_one(&self, result: &DriftResult) -> Vec<Artifact> {
        let kind = match result.kind {
            Some(kind) => kind,
            None if result.file.is_none() => {
                warn!("Skipping drift result with no kind and no file");
                return Vec::new();
            }
            None => ArtifactKind::Unknown,
        };

        match kind {
            ArtifactKind::Api => self.expand_api(result),
            ArtifactKind::Database => self.expand_database(result),
            ArtifactKind::Infrastructure => self.expand_infrastructure(result),
            ArtifactKind::Configuration => self.expand_configuration(result),
            ArtifactKind::Code | ArtifactKind::Unknown => {
                vec![self.base_artifact(result, kind, self.file_id(result, kind))]
            }
        }
    }

    /// One artifact per endpoint; atomic fallback when none are named.
    fn expand_api(&self, result: &DriftResult) -> Vec<Artifact> {
        if result.endpoints.is_empty() {
            return vec![self.base_artifact(result, ArtifactKind::Api, self.file_id(result, ArtifactKind::Api))];
        }

        result
            .endpoints
            .iter()
            .map(|endpoint| {
                let (id, path) = match endpoint.split_once(char::is_whitespace) {
                    Some((method, path)) => {
                        let path = path.trim();
                        (format!("api:{}:{}", method.to_uppercase(), path), path)
                    }
                    None => (format!("api:{}", endpoint), endpoint.as_str()),
                };
                let mut artifact = self.base_artifact(result, ArtifactKind::Api, id);
                for entity in extract_path_entities(path) {
                    artifact.metadata.push_entity(entity);
                }
                artifact
            })
            .collect()
    }

    /// One artifact per table, from declared entities and SQL analysis.
    fn expand_database(&self, result: &DriftResult) -> Vec<Artifact> {
        // Declared entities are definitive; SQL extraction backfills.
        let mut tables: Vec<String> = result.entities.iter().map(|e| e.to_lowercase()).collect();
        for change in &result.changes {
            for table_ref in extract_sql_tables(change) {
                if !tables.contains(&table_ref.name) {
                    tables.push(table_ref.name);
                }
            }
        }

        if tables.is_empty() {
            return vec![self.base_artifact(
                result,
                ArtifactKind::Database,
                self.file_id(result, ArtifactKind::Database),
            )];
        }

        tables
            .into_iter()
            .map(|table| {
                let mut artifact =
                    self.base_artifact(result, ArtifactKind::Database, format!("db:table:{}", table));
                artifact.metadata.push_entity(table);
                artifact
            })
            .collect()
    }

    /// One artifact per resource; `<type>.<logical-id>` entities split
    /// into the id's discriminator.
    fn expand_infrastructure(&self, result: &DriftResult) -> Vec<Artifact> {
        if result.entities.is_empty() {
            return vec![self.base_artifact(
                result,
                ArtifactKind::Infrastructure,
                self.file_id(result, ArtifactKind::Infrastructure),
            )];
        }

        result
            .entities
            .iter()
            .map(|entity| {
                let (resource_type, logical_id) = match entity.split_once(['.', ':']) {
                    Some((t, l)) => (t.to_string(), l.to_string()),
                    None => ("resource".to_string(), entity.clone()),
                };
                let mut artifact = self.base_artifact(
                    result,
                    ArtifactKind::Infrastructure,
                    format!("iac:{}:{}", resource_type, logical_id),
                );
                artifact.metadata.push_entity(logical_id);
                artifact.metadata.push_entity(resource_type);
                artifact
            })
            .collect()
    }

    /// Atomic per file; a result bundling several files (metadata
    /// `files` array) expands into one artifact each.
    fn expand_configuration(&self, result: &DriftResult) -> Vec<Artifact> {
        let bundled: Vec<String> = result
            .metadata
            .as_ref()
            .and_then(|m| m.get("files"))
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if bundled.is_empty() {
            return vec![self.base_artifact(
                result,
                ArtifactKind::Configuration,
                self.file_id(result, ArtifactKind::Configuration),
            )];
        }

        bundled
            .into_iter()
            .map(|file| {
                let mut artifact = self.base_artifact(
                    result,
                    ArtifactKind::Configuration,
                    format!("config:{}", file),
                );
                artifact.file = Some(file);
                artifact
            })
            .collect()
    }

    /// Shared artifact construction: identity fields, change
    /// descriptors, and extracted metadata.
    fn base_artifact(&self, result: &DriftResult, kind: ArtifactKind, id: String) -> Artifact {
        let mut artifact = Artifact::new(id, kind);
        artifact.file = result.file.clone();
        artifact.changed = result.changed.unwrap_or(true);
        artifact.severity = result.severity.unwrap_or(Severity::Low);
        artifact.service = result.service.clone();
        artifact.changes = result.changes.clone();
        artifact.metadata = self.extract_metadata(result, kind);
        artifact
    }

    fn extract_metadata(&self, result: &DriftResult, kind: ArtifactKind) -> ArtifactMetadata {
        let mut meta = ArtifactMetadata::default();

        for op in derive_operations(&result.changes) {
            meta.push_operation(op);
        }
        for dep in extract_dependencies(&result.changes) {
            meta.push_dependency(dep);
        }

        // A file stem is an entity for config/code artifacts so that
        // name-based strategies can see them.
        if matches!(kind, ArtifactKind::Configuration | ArtifactKind::Code) {
            if let Some(stem) = result.file.as_deref().and_then(file_stem) {
                meta.push_entity(stem);
            }
        }

        if let Some(value) = &result.metadata {
            if let Some(deps) = value.get("dependencies").and_then(Value::as_array) {
                for dep in deps.iter().filter_map(Value::as_str) {
                    meta.push_dependency(dep);
                }
            }
            if let Some(entities) = value.get("entities").and_then(Value::as_array) {
                for entity in entities.iter().filter_map(Value::as_str) {
                    meta.push_entity(entity);
                }
            }
            for key in collect_keys(value) {
                meta.push_field(key);
            }
        }

        meta
    }

    /// File-discriminated fallback id for results that stay atomic.
    fn file_id(&self, result: &DriftResult, kind: ArtifactKind) -> String {
        match &result.file {
            Some(file) => format!("{}:{}", kind.id_prefix(), file),
            None => format!("{}:unknown", kind.id_prefix()),
        }
    }
}

/// Basename minus extension, used as a name-matching entity.
fn file_stem(path: &str) -> Option<String> {
    let base = path.rsplit('/').next()?;
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
