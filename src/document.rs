//! Pedigree documents
//!
//! A small TOML format that supplies the relations and box sizes the layout
//! engine consumes:
//!
//! ```toml
//! [[mates]]
//! pair = ["Alice", "Bob"]
//!
//! [[children]]
//! parents = ["Alice", "Bob"]
//! child = "Carol"
//!
//! [sizes]
//! default = [120, 40]
//!
//! [sizes.people]
//! Carol = [160, 40]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::layout::{ChildTriple, LayoutConfig, LayoutError, NodeSizer, Pedigree, PersonId};

/// Errors that can occur when loading a pedigree document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse document TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid relation: {0}")]
    Relation(#[from] LayoutError),
    #[error("Child '{child}' lists {count} parents, at most 2 are allowed")]
    TooManyParents { child: String, count: usize },
    #[error("Invalid size for '{name}': {reason}")]
    InvalidSize { name: String, reason: String },
    #[error("Size given for unknown person '{name}'{}", format_suggestions(.suggestions))]
    UnknownPerson {
        name: String,
        suggestions: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

/// TOML structure for deserializing documents
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocument {
    #[serde(default)]
    mates: Vec<TomlMates>,
    #[serde(default)]
    children: Vec<TomlChild>,
    sizes: Option<TomlSizes>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlMates {
    pair: (String, String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlChild {
    #[serde(default)]
    parents: Vec<String>,
    child: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSizes {
    default: Option<(f64, f64)>,
    #[serde(default)]
    people: HashMap<String, (f64, f64)>,
}

/// Relations and sizes of one pedigree
#[derive(Debug, Clone, Default)]
pub struct PedigreeDocument {
    pub mates: Vec<(PersonId, PersonId)>,
    pub children: Vec<ChildTriple>,
    /// Size used for persons without an override
    pub default_size: Option<(f64, f64)>,
    pub sizes: HashMap<PersonId, (f64, f64)>,
}

/// Per-person sizes with a fallback
#[derive(Debug, Clone)]
pub struct DocumentSizer {
    fallback: (f64, f64),
    sizes: HashMap<PersonId, (f64, f64)>,
}

impl NodeSizer for DocumentSizer {
    fn size_of(&self, id: &PersonId) -> (f64, f64) {
        self.sizes.get(id).copied().unwrap_or(self.fallback)
    }
}

impl PedigreeDocument {
    /// Load a document from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a document from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, DocumentError> {
        let parsed: TomlDocument = toml::from_str(content)?;

        let mates: Vec<(PersonId, PersonId)> = parsed
            .mates
            .into_iter()
            .map(|m| (PersonId::from(m.pair.0), PersonId::from(m.pair.1)))
            .collect();

        let mut children = Vec::with_capacity(parsed.children.len());
        for entry in parsed.children {
            if entry.parents.len() > 2 {
                return Err(DocumentError::TooManyParents {
                    child: entry.child,
                    count: entry.parents.len(),
                });
            }
            let mut parents = entry.parents.into_iter().map(PersonId::from);
            children.push(ChildTriple::new(
                parents.next(),
                parents.next(),
                PersonId::from(entry.child),
            ));
        }

        let (default_size, people) = match parsed.sizes {
            Some(sizes) => (sizes.default, sizes.people),
            None => (None, HashMap::new()),
        };

        let doc = Self {
            mates,
            children,
            default_size,
            sizes: people
                .into_iter()
                .map(|(k, v)| (PersonId::from(k), v))
                .collect(),
        };

        if let Some(size) = doc.default_size {
            check_size("default", size)?;
        }
        let pedigree = doc.pedigree()?;
        doc.check_sizes(&pedigree)?;
        Ok(doc)
    }

    /// Normalize the document's relations
    pub fn pedigree(&self) -> Result<Pedigree, LayoutError> {
        Pedigree::build(self.mates.iter().cloned(), self.children.iter().cloned())
    }

    /// Sizer using the document's sizes, then `config.default_node_size`
    pub fn sizer(&self, config: &LayoutConfig) -> DocumentSizer {
        DocumentSizer {
            fallback: self.default_size.unwrap_or(config.default_node_size),
            sizes: self.sizes.clone(),
        }
    }

    fn check_sizes(&self, pedigree: &Pedigree) -> Result<(), DocumentError> {
        let known: HashSet<String> = pedigree.ids().iter().map(|id| id.0.clone()).collect();
        let mut names: Vec<&PersonId> = self.sizes.keys().collect();
        names.sort();
        for name in names {
            if !known.contains(name.as_str()) {
                return Err(DocumentError::UnknownPerson {
                    name: name.0.clone(),
                    suggestions: find_similar(&known, name.as_str(), 2),
                });
            }
            if let Some(size) = self.sizes.get(name) {
                check_size(name.as_str(), *size)?;
            }
        }
        Ok(())
    }
}

/// Widths and heights must be finite and non-negative
fn check_size(name: &str, (width, height): (f64, f64)) -> Result<(), DocumentError> {
    if width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0 {
        Ok(())
    } else {
        Err(DocumentError::InvalidSize {
            name: name.to_string(),
            reason: format!("expected a non-negative [width, height], got [{}, {}]", width, height),
        })
    }
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Find similar names within a maximum edit distance, closest first
fn find_similar(known: &HashSet<String>, target: &str, max_distance: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &String)> = known
        .iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            (dist > 0 && dist <= max_distance).then_some((dist, name))
        })
        .collect();

    candidates.sort();
    candidates
        .into_iter()
        .map(|(_, name)| name.clone())
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("alice", "alice"), 0);
        assert_eq!(levenshtein_distance("alice", "alise"), 1);
        assert_eq!(levenshtein_distance("", "bob"), 3);
        assert_eq!(levenshtein_distance("cat", "dog"), 3);
    }

    #[test]
    fn test_find_similar() {
        let known: HashSet<String> = ["Carol", "Carl", "Dave"].iter().map(|s| s.to_string()).collect();
        let suggestions = find_similar(&known, "Caro", 2);
        assert_eq!(suggestions, vec!["Carl".to_string(), "Carol".to_string()]);
    }

    #[test]
    fn test_load_document() {
        let doc = PedigreeDocument::from_toml_str(
            r#"
[[mates]]
pair = ["Alice", "Bob"]

[[children]]
parents = ["Alice", "Bob"]
child = "Carol"

[[children]]
parents = ["Carol"]
child = "Dan"

[sizes.people]
Carol = [160, 40]
"#,
        )
        .unwrap();
        assert_eq!(doc.mates.len(), 1);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[1].parent2, None);

        let sizer = doc.sizer(&LayoutConfig::default());
        assert_eq!(sizer.size_of(&PersonId::from("Carol")), (160.0, 40.0));
        assert_eq!(sizer.size_of(&PersonId::from("Dan")), (120.0, 40.0));
    }

    #[test]
    fn test_document_default_size_beats_config() {
        let doc = PedigreeDocument::from_toml_str(
            r#"
[[children]]
child = "Solo"

[sizes]
default = [50, 20]
"#,
        )
        .unwrap();
        let sizer = doc.sizer(&LayoutConfig::default());
        assert_eq!(sizer.size_of(&PersonId::from("Solo")), (50.0, 20.0));
    }

    #[test]
    fn test_unknown_person_suggests_names() {
        let err = PedigreeDocument::from_toml_str(
            r#"
[[mates]]
pair = ["Alice", "Bob"]

[sizes.people]
Alise = [10, 10]
"#,
        )
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Size given for unknown person 'Alise' (did you mean Alice?)");
    }

    #[test]
    fn test_negative_default_size_rejected() {
        let err = PedigreeDocument::from_toml_str(
            r#"
[[mates]]
pair = ["A", "B"]

[sizes]
default = [-100, 40]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidSize { ref name, .. } if name == "default"));
    }

    #[test]
    fn test_negative_person_size_rejected() {
        let err = PedigreeDocument::from_toml_str(
            r#"
[[mates]]
pair = ["A", "B"]

[sizes.people]
B = [100, -1]
"#,
        )
        .unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Invalid size for 'B': expected a non-negative [width, height], got [100, -1]"
        );
    }

    #[test]
    fn test_too_many_parents() {
        let err = PedigreeDocument::from_toml_str(
            r#"
[[children]]
parents = ["A", "B", "C"]
child = "D"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::TooManyParents { count: 3, .. }));
    }

    #[test]
    fn test_self_mate_rejected() {
        let err = PedigreeDocument::from_toml_str(
            r#"
[[mates]]
pair = ["A", "A"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::Relation(LayoutError::SelfRelation { .. })));
    }
}
