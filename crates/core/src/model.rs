//! The specification value: classes, methods, and their payload shapes.
//!
//! A [`Specification`] is an ordinary owned value. Edits never touch a
//! specification in place; the patch engine clones it, works on the copy,
//! and hands back the result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version marker of a freshly created specification.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Maximum number of doc notes kept per class or method. Oldest notes are
/// evicted first.
pub const MAX_DOC_NOTES: usize = 10;

/// One field of an input or output model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Type tag, e.g. "str", "int", or the name of another model.
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub description: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            type_tag: type_tag.into(),
            optional: false,
            default: None,
            description: String::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Named, ordered field list describing a method's input or output payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        ModelSpec {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// A timestamped documentation note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNote {
    /// RFC 3339 timestamp of the batch that appended the note.
    pub at: String,
    pub note: String,
}

/// Append a note, evicting the oldest entries beyond [`MAX_DOC_NOTES`].
pub(crate) fn push_note(notes: &mut Vec<DocNote>, at: &str, note: String) {
    notes.push(DocNote {
        at: at.to_string(),
        note,
    });
    if notes.len() > MAX_DOC_NOTES {
        let excess = notes.len() - MAX_DOC_NOTES;
        notes.drain(..excess);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub inputs: ModelSpec,
    pub outputs: ModelSpec,
    pub doc_summary: String,
    #[serde(default)]
    pub doc_notes: Vec<DocNote>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    /// Retired names that still resolve to this method.
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodSpec>,
    pub doc_summary: String,
    #[serde(default)]
    pub doc_notes: Vec<DocNote>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    /// Retired names that still resolve to this class.
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

impl ClassSpec {
    /// Resolve a method name (canonical or alias) to its canonical key.
    ///
    /// Canonical names win over aliases.
    pub fn resolve_method_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.methods.get_key_value(name) {
            return Some(key.as_str());
        }
        self.methods
            .iter()
            .find(|(_, m)| m.aliases.contains(name))
            .map(|(key, _)| key.as_str())
    }

    pub fn resolve_method(&self, name: &str) -> Option<&MethodSpec> {
        let key = self.resolve_method_name(name)?;
        self.methods.get(key)
    }
}

/// Root of the specification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub version: String,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassSpec>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for Specification {
    fn default() -> Self {
        Specification::empty()
    }
}

impl Specification {
    /// A specification with zero classes at [`INITIAL_VERSION`].
    pub fn empty() -> Self {
        Specification {
            version: INITIAL_VERSION.to_string(),
            classes: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Resolve a class name (canonical or alias) to its canonical key.
    pub fn resolve_class_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.classes.get_key_value(name) {
            return Some(key.as_str());
        }
        self.classes
            .iter()
            .find(|(_, c)| c.aliases.contains(name))
            .map(|(key, _)| key.as_str())
    }

    pub fn resolve_class(&self, name: &str) -> Option<&ClassSpec> {
        let key = self.resolve_class_name(name)?;
        self.classes.get(key)
    }

    /// Resolve `class_name` and `method_name`, each through aliases.
    pub fn resolve_method(
        &self,
        class_name: &str,
        method_name: &str,
    ) -> Option<(&ClassSpec, &MethodSpec)> {
        let class = self.resolve_class(class_name)?;
        let method = class.resolve_method(method_name)?;
        Some((class, method))
    }

    /// SHA-256 etag of the compact JSON representation.
    ///
    /// All maps are `BTreeMap`s, so the serialized form is canonical.
    pub fn etag(&self) -> String {
        let canonical = serde_json::to_vec(self)
            .unwrap_or_else(|e| panic!("serialization error computing etag: {}", e));
        format!("{:x}", Sha256::digest(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, aliases: &[&str]) -> ClassSpec {
        ClassSpec {
            name: name.to_string(),
            methods: BTreeMap::new(),
            doc_summary: String::new(),
            doc_notes: vec![],
            deprecated: false,
            deprecation_message: None,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn push_note_evicts_oldest_beyond_bound() {
        let mut notes = Vec::new();
        for i in 0..13 {
            push_note(&mut notes, "t", format!("n{}", i));
        }
        assert_eq!(notes.len(), MAX_DOC_NOTES);
        assert_eq!(notes[0].note, "n3");
        assert_eq!(notes[9].note, "n12");
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let mut spec = Specification::empty();
        spec.classes.insert("B".to_string(), class("B", &["A"]));
        assert_eq!(spec.resolve_class_name("A"), Some("B"));

        spec.classes.insert("A".to_string(), class("A", &[]));
        assert_eq!(spec.resolve_class_name("A"), Some("A"));
        assert_eq!(spec.resolve_class_name("B"), Some("B"));
        assert_eq!(spec.resolve_class_name("C"), None);
    }

    #[test]
    fn etag_is_stable_and_content_sensitive() {
        let a = Specification::empty();
        let mut b = Specification::empty();
        assert_eq!(a.etag(), b.etag());
        assert_eq!(a.etag().len(), 64);

        b.classes.insert("X".to_string(), class("X", &[]));
        assert_ne!(a.etag(), b.etag());
    }

    #[test]
    fn field_spec_serializes_type_tag_as_type() {
        let f = FieldSpec::new("email", "str");
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["type"], "str");
        assert_eq!(v["optional"], false);
    }
}
