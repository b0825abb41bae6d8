//! Metadata extraction from analyzer output.
//!
//! The extractor turns free-form change descriptors into structured
//! metadata: SQL table references with ranked confidence, API path
//! entities, CRUD operations, and declared dependencies. All patterns
//! are bounded; pathological input degrades to fewer matches, never to
//! a failure.

use crate::artifact::types::Operation;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// SQL keywords that regex captures must never treat as table names.
const SQL_KEYWORDS: &[&str] = &["select", "from", "where", "and", "or", "as", "on", "set"];

/// Maximum recursion depth when walking analyzer metadata JSON.
const MAX_KEY_DEPTH: usize = 10;

// Table-reference patterns, ranked by how definitively they name a
// table. Scanned in rank order; the first (highest) confidence wins
// per name.
static CREATE_DROP_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:create|drop)\s+table\s+(?:if\s+(?:not\s+)?exists\s+)?[`"']?([a-zA-Z_][a-zA-Z0-9_]*)"#,
    )
    .expect("invalid regex")
});

static ALTER_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\balter\s+table\s+(?:only\s+)?[`"']?([a-zA-Z_][a-zA-Z0-9_]*)"#)
        .expect("invalid regex")
});

static DML_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:update|insert\s+into|delete\s+from)\s+[`"']?([a-zA-Z_][a-zA-Z0-9_]*)"#)
        .expect("invalid regex")
});

static FROM_JOIN_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:from|join)\s+[`"']?([a-zA-Z_][a-zA-Z0-9_]*)"#).expect("invalid regex")
});

static CREATE_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(post|create|insert)\b").expect("invalid regex"));

static READ_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(get|read|select|fetch)\b").expect("invalid regex"));

static UPDATE_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(put|patch|update|alter)\b").expect("invalid regex"));

static DELETE_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(delete|drop|remove)\b").expect("invalid regex"));

static DEPENDENCY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdependency:\s*([@a-zA-Z0-9._/-]+)").expect("invalid regex")
});

/// A table reference extracted from SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Lowercased table name
    pub name: String,
    /// How definitively the pattern names a table
    pub confidence: f64,
}

/// Extract table references from SQL-ish change text.
///
/// Names are lowercased; the highest-confidence occurrence is kept per
/// name, in first-seen order.
pub fn extract_sql_tables(text: &str) -> Vec<TableRef> {
    let patterns: [(&Regex, f64); 4] = [
        (&CREATE_DROP_TABLE, 1.0),
        (&ALTER_TABLE, 0.9),
        (&DML_TABLE, 0.8),
        (&FROM_JOIN_TABLE, 0.7),
    ];

    let mut refs: Vec<TableRef> = Vec::new();
    for (pattern, confidence) in patterns {
        for caps in pattern.captures_iter(text) {
            let name = caps[1].to_lowercase();
            if SQL_KEYWORDS.contains(&name.as_str()) {
                continue;
            }
            if !refs.iter().any(|r| r.name == name) {
                refs.push(TableRef { name, confidence });
            }
        }
    }
    refs
}

/// Derive entities from an API path: split on `/`, drop empty segments
/// and extensions, trim parameter placeholders to their bare name.
pub fn extract_path_entities(path: &str) -> Vec<String> {
    let mut entities = Vec::new();
    for segment in path.split('/') {
        let segment = segment
            .trim_start_matches(':')
            .trim_start_matches('{')
            .trim_end_matches('}');
        let segment = match segment.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => segment,
        };
        if segment.is_empty() {
            continue;
        }
        let entity = segment.to_string();
        if !entities.contains(&entity) {
            entities.push(entity);
        }
    }
    entities
}

/// Derive CRUD operations from change descriptors.
pub fn derive_operations(changes: &[String]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for change in changes {
        for (pattern, op) in [
            (&*CREATE_OP, Operation::Create),
            (&*READ_OP, Operation::Read),
            (&*UPDATE_OP, Operation::Update),
            (&*DELETE_OP, Operation::Delete),
        ] {
            if pattern.is_match(change) && !ops.contains(&op) {
                ops.push(op);
            }
        }
    }
    ops
}

/// Extract declared dependencies from `DEPENDENCY: <name>` descriptors.
pub fn extract_dependencies(changes: &[String]) -> Vec<String> {
    let mut deps = Vec::new();
    for change in changes {
        for caps in DEPENDENCY_DECL.captures_iter(change) {
            let dep = caps[1].to_string();
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
    }
    deps
}

/// Collect object keys from free-form analyzer metadata, recursing to a
/// bounded depth.
pub fn collect_keys(value: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    collect_keys_inner(value, 0, &mut keys);
    keys
}

fn collect_keys_inner(value: &Value, depth: usize, keys: &mut Vec<String>) {
    if depth >= MAX_KEY_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
                collect_keys_inner(nested, depth + 1, keys);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keys_inner(item, depth + 1, keys);
            }
        }
        _ => {}
    }
}
