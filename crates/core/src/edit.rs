//! The closed edit vocabulary.
//!
//! Every change to a [`Specification`](crate::Specification) is one of the
//! five [`Edit`] kinds. Batches serialize as
//! `{"changes": [{"kind": "ADD_CLASS", ...}, ...]}`.

use serde::{Deserialize, Serialize};

use crate::model::{FieldSpec, ModelSpec};

/// Whether a rename or deprecation targets a class or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Class,
    Method,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Class => "class",
            TargetType::Method => "method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddClass {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMethod {
    pub class_name: String,
    pub method_name: String,
    pub inputs: ModelSpec,
    pub outputs: ModelSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyMethodSignature {
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub add_params: Vec<FieldSpec>,
    #[serde(default)]
    pub remove_params: Vec<String>,
    /// Replaces the output model wholesale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_return: Option<ModelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_note: Option<String>,
    #[serde(default)]
    pub replace_doc_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_doc_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    pub target_type: TargetType,
    /// Class name, or `Class.method` for methods.
    pub from: String,
    pub to: String,
    #[serde(default = "default_alias_old")]
    pub alias_old: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_note: Option<String>,
}

fn default_alias_old() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deprecate {
    pub target_type: TargetType,
    /// Class name, or `Class.method` for methods.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_note: Option<String>,
}

/// One atomic edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Edit {
    AddClass(AddClass),
    AddMethod(AddMethod),
    ModifyMethodSignature(ModifyMethodSignature),
    Rename(Rename),
    Deprecate(Deprecate),
}

impl Edit {
    /// Wire name of this edit's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Edit::AddClass(_) => "ADD_CLASS",
            Edit::AddMethod(_) => "ADD_METHOD",
            Edit::ModifyMethodSignature(_) => "MODIFY_METHOD_SIGNATURE",
            Edit::Rename(_) => "RENAME",
            Edit::Deprecate(_) => "DEPRECATE",
        }
    }
}

/// All edit kind names accepted on the wire.
pub const EDIT_KINDS: [&str; 5] = [
    "ADD_CLASS",
    "ADD_METHOD",
    "MODIFY_METHOD_SIGNATURE",
    "RENAME",
    "DEPRECATE",
];

/// Ordered edits applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditBatch {
    #[serde(default)]
    pub changes: Vec<Edit>,
}

impl EditBatch {
    pub fn new(changes: Vec<Edit>) -> Self {
        EditBatch { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.changes.iter()
    }
}

/// Split a `Class.method` target into its two parts.
pub fn split_method_target(target: &str) -> Option<(&str, &str)> {
    let (class, method) = target.split_once('.')?;
    if class.is_empty() || method.is_empty() || method.contains('.') {
        return None;
    }
    Some((class, method))
}
