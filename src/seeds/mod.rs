//! Seed packs: the knowledge base as data.
//!
//! A seed pack is a TOML-defined bundle of concept nodes, dependency
//! edges, reasoning rules, and response templates. One pack,
//! `porsa-core`, is bundled into the binary; alternative packs can be
//! loaded from disk. Cross-references inside a pack (edge endpoints,
//! rule conditions, rule actions) are validated at parse time so a
//! broken pack fails at load, not mid-query.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::entity::EntityKind;
use crate::graph::{Node, NodeId, NodeKind};
use crate::intent::Intent;
use crate::reason::{ActionId, Condition, Rule};
use crate::respond::{ResponseTemplate, TemplateKey};

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("failed to parse seed pack \"{id}\": {message}")]
    #[diagnostic(
        code(porsa::seed::parse),
        help("Check the pack TOML syntax. Conditions are inline tables tagged with a `kind` field.")
    )]
    Parse { id: String, message: String },

    #[error("failed to read seed file: {path}")]
    #[diagnostic(code(porsa::seed::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate node id \"{id}\" in seed pack")]
    #[diagnostic(
        code(porsa::seed::duplicate_node),
        help("Node ids must be unique within a pack.")
    )]
    DuplicateNode { id: String },

    #[error("unknown node \"{id}\" referenced by {referenced_by}")]
    #[diagnostic(
        code(porsa::seed::unknown_node),
        help("Declare the node under [[nodes]] before referencing it.")
    )]
    UnknownNode { id: String, referenced_by: String },

    #[error("rule \"{rule}\" produces action \"{action}\" but no template renders it")]
    #[diagnostic(
        code(porsa::seed::missing_template),
        help("Every rule action needs at least one [[templates]] entry with that `action`.")
    )]
    MissingTemplate { action: String, rule: String },

    #[error("invalid response template: {message}")]
    #[diagnostic(
        code(porsa::seed::template),
        help("Each [[templates]] entry takes exactly one key: `action = \"...\"` or `intent = \"...\"`.")
    )]
    Template { message: String },
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;

// ── Pack data model ──────────────────────────────────────────────────────

/// A knowledge pack: everything the engine needs to answer questions.
#[derive(Debug, Clone)]
pub struct KnowledgePack {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    /// Source: `Bundled` or `External(path)`.
    pub source: SeedSource,
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeSeed>,
    pub rules: Vec<Rule>,
    pub templates: Vec<ResponseTemplate>,
}

/// Where a seed pack came from.
#[derive(Debug, Clone)]
pub enum SeedSource {
    /// Bundled into the binary via `include_str!`.
    Bundled,
    /// Loaded from an external file.
    External(PathBuf),
}

/// A directed dependency edge between two declared nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSeed {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f32,
}

// ── TOML deserialization helpers ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PackToml {
    pack: PackMeta,
    #[serde(default)]
    nodes: Vec<NodeSeed>,
    #[serde(default)]
    edges: Vec<EdgeSeed>,
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    templates: Vec<TemplateSeed>,
}

#[derive(Debug, Deserialize)]
struct PackMeta {
    id: String,
    name: String,
    version: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct NodeSeed {
    id: String,
    kind: NodeKind,
    weight: f32,
    #[serde(default)]
    patterns: Vec<String>,
}

/// Raw template row. Exactly one of `action` and `intent` keys it.
#[derive(Debug, Deserialize)]
struct TemplateSeed {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    intent: Option<Intent>,
    text: String,
    #[serde(default)]
    requires: Vec<EntityKind>,
}

impl TemplateSeed {
    fn into_template(self) -> SeedResult<ResponseTemplate> {
        let key = match (self.action, self.intent) {
            (Some(action), None) => TemplateKey::Action(ActionId::from(action)),
            (None, Some(intent)) => TemplateKey::Intent(intent),
            (Some(action), Some(intent)) => {
                return Err(SeedError::Template {
                    message: format!("keyed by both action \"{action}\" and intent \"{intent}\""),
                });
            }
            (None, None) => {
                return Err(SeedError::Template {
                    message: format!("\"{}\" has neither an action nor an intent key", self.text),
                });
            }
        };
        Ok(ResponseTemplate {
            key,
            text: self.text,
            requires: self.requires,
        })
    }
}

// ── Bundled pack ─────────────────────────────────────────────────────────

const CORE_TOML: &str = include_str!("../../data/seeds/knowledge.toml");

/// Parse the pack bundled into the binary.
pub fn bundled() -> SeedResult<KnowledgePack> {
    parse_pack(CORE_TOML, SeedSource::Bundled)
}

/// Load a pack from a TOML file on disk.
pub fn load(path: &Path) -> SeedResult<KnowledgePack> {
    let content = std::fs::read_to_string(path).map_err(|e| SeedError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_pack(&content, SeedSource::External(path.to_path_buf()))
}

fn parse_pack(toml_str: &str, source: SeedSource) -> SeedResult<KnowledgePack> {
    let parsed: PackToml = toml::from_str(toml_str).map_err(|e| SeedError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;

    let nodes = parsed
        .nodes
        .into_iter()
        .map(|n| Node::new(n.id, n.kind, n.weight).with_patterns(n.patterns))
        .collect();
    let templates = parsed
        .templates
        .into_iter()
        .map(TemplateSeed::into_template)
        .collect::<SeedResult<Vec<_>>>()?;

    let pack = KnowledgePack {
        id: parsed.pack.id,
        name: parsed.pack.name,
        version: parsed.pack.version,
        description: parsed.pack.description,
        source,
        nodes,
        edges: parsed.edges,
        rules: parsed.rules,
        templates,
    };
    validate(&pack)?;
    tracing::debug!(
        pack = %pack.id,
        nodes = pack.nodes.len(),
        edges = pack.edges.len(),
        rules = pack.rules.len(),
        templates = pack.templates.len(),
        "Seed pack parsed"
    );
    Ok(pack)
}

// ── Validation ───────────────────────────────────────────────────────────

/// Cross-reference checks. The general-inquiry fallback template is not
/// checked here; `TemplateTable::new` owns that requirement.
fn validate(pack: &KnowledgePack) -> SeedResult<()> {
    let mut declared: HashSet<&NodeId> = HashSet::new();
    for node in &pack.nodes {
        if !declared.insert(&node.id) {
            return Err(SeedError::DuplicateNode {
                id: node.id.to_string(),
            });
        }
    }

    for edge in &pack.edges {
        for id in [&edge.from, &edge.to] {
            if !declared.contains(id) {
                return Err(SeedError::UnknownNode {
                    id: id.to_string(),
                    referenced_by: format!("edge {} -> {}", edge.from, edge.to),
                });
            }
        }
    }

    for rule in &pack.rules {
        for condition in &rule.conditions {
            if let Condition::NodeActive { node } = condition {
                if !declared.contains(node) {
                    return Err(SeedError::UnknownNode {
                        id: node.to_string(),
                        referenced_by: format!("rule \"{}\"", rule.id),
                    });
                }
            }
        }
        let rendered = pack
            .templates
            .iter()
            .any(|t| matches!(&t.key, TemplateKey::Action(a) if a == &rule.action));
        if !rendered {
            return Err(SeedError::MissingTemplate {
                action: rule.action.to_string(),
                rule: rule.id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINI: &str = r#"
[pack]
id = "mini"
name = "Mini"
version = "0.1.0"
description = "Two nodes and a greeting."

[[nodes]]
id = "ai"
kind = "topic"
weight = 0.9
patterns = ["هوش مصنوعی"]

[[nodes]]
id = "ml"
kind = "topic"
weight = 0.8

[[edges]]
from = "ml"
to = "ai"
weight = 0.9

[[rules]]
id = "greet"
action = "greet"
base_confidence = 0.9
conditions = [{ kind = "intent-is", intent = "greeting" }]

[[templates]]
action = "greet"
text = "سلام!"

[[templates]]
intent = "general_inquiry"
text = "پرسش شما دریافت شد."
"#;

    #[test]
    fn bundled_pack_parses_and_validates() {
        let pack = bundled().unwrap();
        assert_eq!(pack.id, "porsa-core");
        assert!(
            pack.nodes.len() >= 10,
            "expected 10+ nodes, got {}",
            pack.nodes.len()
        );
        assert!(pack.edges.len() >= 10);
        assert!(!pack.rules.is_empty());
        assert!(!pack.templates.is_empty());
        assert!(matches!(pack.source, SeedSource::Bundled));
    }

    #[test]
    fn bundled_node_patterns_are_normalized() {
        let pack = bundled().unwrap();
        for node in &pack.nodes {
            for pattern in &node.patterns {
                assert_eq!(
                    pattern,
                    &crate::text::normalize(pattern),
                    "node {} carries a non-normalized pattern",
                    node.id
                );
            }
        }
    }

    #[test]
    fn mini_pack_parses() {
        let pack = parse_pack(MINI, SeedSource::Bundled).unwrap();
        assert_eq!(pack.id, "mini");
        assert_eq!(pack.nodes.len(), 2);
        assert_eq!(pack.edges.len(), 1);
        assert_eq!(pack.rules.len(), 1);
        assert_eq!(pack.templates.len(), 2);
        assert_eq!(pack.rules[0].conditions.len(), 1);
    }

    #[test]
    fn load_reads_external_pack() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINI.as_bytes()).unwrap();

        let pack = load(file.path()).unwrap();
        assert_eq!(pack.id, "mini");
        assert!(matches!(pack.source, SeedSource::External(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/pack.toml")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse_pack("not toml [", SeedSource::Bundled).unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let toml = r#"
[pack]
id = "dup"
name = "Dup"
version = "0.1.0"
description = "Duplicate node."

[[nodes]]
id = "ai"
kind = "topic"
weight = 0.9

[[nodes]]
id = "ai"
kind = "skill"
weight = 0.5
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        assert!(matches!(err, SeedError::DuplicateNode { id } if id == "ai"));
    }

    #[test]
    fn edge_to_undeclared_node_is_rejected() {
        let toml = r#"
[pack]
id = "dangling-edge"
name = "Dangling"
version = "0.1.0"
description = "Edge to nowhere."

[[nodes]]
id = "ai"
kind = "topic"
weight = 0.9

[[edges]]
from = "ai"
to = "ghost"
weight = 0.5
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        match err {
            SeedError::UnknownNode { id, referenced_by } => {
                assert_eq!(id, "ghost");
                assert!(referenced_by.contains("edge"));
            }
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn rule_condition_on_undeclared_node_is_rejected() {
        let toml = r#"
[pack]
id = "dangling-rule"
name = "Dangling"
version = "0.1.0"
description = "Rule gated on a missing node."

[[rules]]
id = "haunted"
action = "haunt"
base_confidence = 0.5
conditions = [{ kind = "node-active", node = "ghost" }]

[[templates]]
action = "haunt"
text = "بو!"
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        match err {
            SeedError::UnknownNode { id, referenced_by } => {
                assert_eq!(id, "ghost");
                assert!(referenced_by.contains("haunted"));
            }
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn rule_without_template_is_rejected() {
        let toml = r#"
[pack]
id = "untemplated"
name = "Untemplated"
version = "0.1.0"
description = "Rule whose action nothing renders."

[[rules]]
id = "silent"
action = "speak"
base_confidence = 0.5
conditions = [{ kind = "intent-is", intent = "greeting" }]
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        assert!(
            matches!(err, SeedError::MissingTemplate { ref action, ref rule } if action == "speak" && rule == "silent"),
            "got {err:?}"
        );
    }

    #[test]
    fn template_with_both_keys_is_rejected() {
        let toml = r#"
[pack]
id = "ambiguous"
name = "Ambiguous"
version = "0.1.0"
description = "Template keyed twice."

[[templates]]
action = "greet"
intent = "greeting"
text = "سلام!"
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        assert!(matches!(err, SeedError::Template { .. }));
    }

    #[test]
    fn template_with_no_key_is_rejected() {
        let toml = r#"
[pack]
id = "keyless"
name = "Keyless"
version = "0.1.0"
description = "Template keyed by nothing."

[[templates]]
text = "سلام!"
"#;
        let err = parse_pack(toml, SeedSource::Bundled).unwrap_err();
        assert!(matches!(err, SeedError::Template { .. }));
    }
}
