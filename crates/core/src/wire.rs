//! Decoding of untrusted edit batch JSON.
//!
//! Generator output is never deserialized straight into [`EditBatch`].
//! It is walked field by field so every shape problem comes back as a
//! [`ValidationIssue`] with an exact path, and nothing is coerced. In
//! particular a bare `{"field": {...}}` mapping where a ModelSpec belongs is
//! reported, never reinterpreted.

use serde_json::{Map, Value};

use crate::edit::{
    AddClass, AddMethod, Deprecate, Edit, EditBatch, ModifyMethodSignature, Rename, TargetType,
    EDIT_KINDS,
};
use crate::error::{format_issues, ValidationIssue};
use crate::model::{FieldSpec, ModelSpec};

const MODEL_SHAPE: &str = r#"{"name": str, "fields": [FieldSpec, ...]}"#;

/// Why raw text could not be turned into an [`EditBatch`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON at all.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Valid JSON that does not have the edit batch shape.
    #[error("edit batch does not match the wire format:\n{}", format_issues(.0))]
    Shape(Vec<ValidationIssue>),
}

impl DecodeError {
    /// The issues to report back, one per problem.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        match self {
            DecodeError::Malformed(msg) => vec![ValidationIssue::new("$", msg.clone())],
            DecodeError::Shape(issues) => issues.clone(),
        }
    }
}

/// Parse raw text as an edit batch.
pub fn parse_batch(text: &str) -> Result<EditBatch, DecodeError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| DecodeError::Malformed(format!("invalid JSON: {}", e)))?;
    decode_batch(&value).map_err(DecodeError::Shape)
}

/// Decode a JSON value as an edit batch, collecting every shape issue.
pub fn decode_batch(value: &Value) -> Result<EditBatch, Vec<ValidationIssue>> {
    let Some(root) = value.as_object() else {
        return Err(vec![ValidationIssue::new(
            "$",
            r#"edit batch must be a JSON object {"changes": [...]}"#,
        )]);
    };

    let items = match root.get("changes") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(vec![ValidationIssue::new(
                "changes",
                "must be an array of edits",
            )])
        }
        None => {
            return Err(vec![ValidationIssue::new(
                "changes",
                "missing required field",
            )])
        }
    };

    let mut issues = Vec::new();
    let mut changes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("changes[{}]", index);
        if let Some(edit) = decode_edit(item, &path, &mut issues) {
            changes.push(edit);
        }
    }

    if issues.is_empty() {
        Ok(EditBatch::new(changes))
    } else {
        Err(issues)
    }
}

// ── Field readers ───────────────────────────────────────────────────

fn child(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

/// A JSON object together with its path, for issue reporting.
struct Obj<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

impl Obj<'_> {
    fn required_str(&self, key: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
        match self.map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                issues.push(ValidationIssue::new(
                    child(self.path, key),
                    "must be a string",
                ));
                None
            }
            None => {
                issues.push(ValidationIssue::new(
                    child(self.path, key),
                    "missing required field",
                ));
                None
            }
        }
    }

    /// `Some(None)` when absent or null, `None` on a type error.
    fn optional_str(
        &self,
        key: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Option<String>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                issues.push(ValidationIssue::new(
                    child(self.path, key),
                    "must be a string",
                ));
                None
            }
        }
    }

    fn bool_or(&self, key: &str, default: bool, issues: &mut Vec<ValidationIssue>) -> Option<bool> {
        match self.map.get(key) {
            None | Some(Value::Null) => Some(default),
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                issues.push(ValidationIssue::new(
                    child(self.path, key),
                    "must be a boolean",
                ));
                None
            }
        }
    }

    fn str_list(&self, key: &str, issues: &mut Vec<ValidationIssue>) -> Option<Vec<String>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(s) => out.push(s.to_string()),
                        None => {
                            issues.push(ValidationIssue::new(
                                format!("{}.{}[{}]", self.path, key, i),
                                "must be a string",
                            ));
                            ok = false;
                        }
                    }
                }
                ok.then_some(out)
            }
            Some(_) => {
                issues.push(ValidationIssue::new(
                    child(self.path, key),
                    "must be an array of strings",
                ));
                None
            }
        }
    }

    fn target_type(&self, issues: &mut Vec<ValidationIssue>) -> Option<TargetType> {
        let raw = self.required_str("target_type", issues)?;
        match raw.as_str() {
            "class" => Some(TargetType::Class),
            "method" => Some(TargetType::Method),
            other => {
                issues.push(ValidationIssue::new(
                    child(self.path, "target_type"),
                    format!(r#"must be "class" or "method", got "{}""#, other),
                ));
                None
            }
        }
    }
}

// ── Edits ───────────────────────────────────────────────────────────

fn decode_edit(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<Edit> {
    let Some(map) = value.as_object() else {
        issues.push(ValidationIssue::new(path, "edit must be a JSON object"));
        return None;
    };
    let obj = Obj { map, path };
    let kind = obj.required_str("kind", issues)?;

    // Every field is read before any `?` so that one pass reports all issues.
    match kind.as_str() {
        "ADD_CLASS" => {
            let class_name = obj.required_str("class_name", issues);
            let doc = obj.optional_str("doc", issues);
            Some(Edit::AddClass(AddClass {
                class_name: class_name?,
                doc: doc?,
            }))
        }
        "ADD_METHOD" => {
            let class_name = obj.required_str("class_name", issues);
            let method_name = obj.required_str("method_name", issues);
            let inputs = required_model(&obj, "inputs", issues);
            let outputs = required_model(&obj, "outputs", issues);
            let doc = obj.optional_str("doc", issues);
            Some(Edit::AddMethod(AddMethod {
                class_name: class_name?,
                method_name: method_name?,
                inputs: inputs?,
                outputs: outputs?,
                doc: doc?,
            }))
        }
        "MODIFY_METHOD_SIGNATURE" => {
            let class_name = obj.required_str("class_name", issues);
            let method_name = obj.required_str("method_name", issues);
            let add_params = field_list(&obj, "add_params", issues);
            let remove_params = obj.str_list("remove_params", issues);
            let change_return = match map.get("change_return") {
                None | Some(Value::Null) => Some(None),
                Some(v) => decode_model(v, &child(path, "change_return"), issues).map(Some),
            };
            let doc_note = obj.optional_str("doc_note", issues);
            let replace_doc_summary = obj.bool_or("replace_doc_summary", false, issues);
            let new_doc_summary = obj.optional_str("new_doc_summary", issues);
            Some(Edit::ModifyMethodSignature(ModifyMethodSignature {
                class_name: class_name?,
                method_name: method_name?,
                add_params: add_params?,
                remove_params: remove_params?,
                change_return: change_return?,
                doc_note: doc_note?,
                replace_doc_summary: replace_doc_summary?,
                new_doc_summary: new_doc_summary?,
            }))
        }
        "RENAME" => {
            let target_type = obj.target_type(issues);
            let from = obj.required_str("from", issues);
            let to = obj.required_str("to", issues);
            let alias_old = obj.bool_or("alias_old", true, issues);
            let doc_note = obj.optional_str("doc_note", issues);
            Some(Edit::Rename(Rename {
                target_type: target_type?,
                from: from?,
                to: to?,
                alias_old: alias_old?,
                doc_note: doc_note?,
            }))
        }
        "DEPRECATE" => {
            let target_type = obj.target_type(issues);
            let target = obj.required_str("target", issues);
            let message = obj.optional_str("message", issues);
            let doc_note = obj.optional_str("doc_note", issues);
            Some(Edit::Deprecate(Deprecate {
                target_type: target_type?,
                target: target?,
                message: message?,
                doc_note: doc_note?,
            }))
        }
        other => {
            issues.push(ValidationIssue::new(
                child(path, "kind"),
                format!(
                    "unknown edit kind '{}'; expected one of {}",
                    other,
                    EDIT_KINDS.join(", ")
                ),
            ));
            None
        }
    }
}

// ── Models and fields ───────────────────────────────────────────────

fn required_model(obj: &Obj<'_>, key: &str, issues: &mut Vec<ValidationIssue>) -> Option<ModelSpec> {
    let path = child(obj.path, key);
    match obj.map.get(key) {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new(path, "missing required field"));
            None
        }
        Some(v) => decode_model(v, &path, issues),
    }
}

fn decode_model(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<ModelSpec> {
    let Some(map) = value.as_object() else {
        issues.push(ValidationIssue::new(
            path,
            format!("must be a ModelSpec object {}", MODEL_SHAPE),
        ));
        return None;
    };

    // The classic generator mistake: {"email": {"type": "str"}} instead of a ModelSpec.
    if !map.is_empty()
        && !map.contains_key("name")
        && !map.contains_key("fields")
        && map.values().all(Value::is_object)
    {
        issues.push(ValidationIssue::new(
            path,
            format!(
                "got a mapping of field name to field; expected a ModelSpec object {}",
                MODEL_SHAPE
            ),
        ));
        return None;
    }

    let obj = Obj { map, path };
    let name = obj.required_str("name", issues);
    let fields = field_list(&obj, "fields", issues);
    Some(ModelSpec {
        name: name?,
        fields: fields?,
    })
}

fn field_list(obj: &Obj<'_>, key: &str, issues: &mut Vec<ValidationIssue>) -> Option<Vec<FieldSpec>> {
    match obj.map.get(key) {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => {
            let mut fields = Vec::with_capacity(items.len());
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                let path = format!("{}.{}[{}]", obj.path, key, i);
                match decode_field(item, &path, issues) {
                    Some(f) => fields.push(f),
                    None => ok = false,
                }
            }
            ok.then_some(fields)
        }
        Some(Value::Object(_)) => {
            issues.push(ValidationIssue::new(
                child(obj.path, key),
                "must be an array of FieldSpec objects, not a mapping of field name to field",
            ));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new(
                child(obj.path, key),
                "must be an array of FieldSpec objects",
            ));
            None
        }
    }
}

fn decode_field(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<FieldSpec> {
    let Some(map) = value.as_object() else {
        issues.push(ValidationIssue::new(path, "FieldSpec must be a JSON object"));
        return None;
    };
    let obj = Obj { map, path };
    let name = obj.required_str("name", issues);
    let type_tag = obj.required_str("type", issues);
    let optional = obj.bool_or("optional", false, issues);
    let description = obj.optional_str("description", issues);
    let default = match map.get("default") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.clone()),
    };
    Some(FieldSpec {
        name: name?,
        type_tag: type_tag?,
        optional: optional?,
        default,
        description: description?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn decodes_add_class_and_add_method() {
        let batch = decode_batch(&json!({
            "changes": [
                {"kind": "ADD_CLASS", "class_name": "UserService", "doc": "Manages users"},
                {
                    "kind": "ADD_METHOD",
                    "class_name": "UserService",
                    "method_name": "create_user",
                    "inputs": {"name": "CreateUserInput", "fields": [{"name": "email", "type": "str"}]},
                    "outputs": {"name": "User", "fields": [{"name": "id", "type": "str", "optional": false, "default": null}]}
                }
            ]
        }))
        .unwrap();

        assert_eq!(batch.len(), 2);
        match &batch.changes[1] {
            Edit::AddMethod(m) => {
                assert_eq!(m.inputs.name, "CreateUserInput");
                assert_eq!(m.inputs.fields[0].type_tag, "str");
                assert_eq!(m.outputs.fields[0].default, None);
            }
            other => panic!("unexpected edit {:?}", other),
        }
    }

    #[test]
    fn bare_field_mapping_is_rejected_not_coerced() {
        let issues = decode_batch(&json!({
            "changes": [{
                "kind": "ADD_METHOD",
                "class_name": "UserService",
                "method_name": "create_user",
                "inputs": {"email": {"type": "str"}},
                "outputs": {"name": "User", "fields": []}
            }]
        }))
        .unwrap_err();

        assert_eq!(paths(&issues), vec!["changes[0].inputs"]);
        assert!(issues[0].message.contains("mapping of field name to field"));
    }

    #[test]
    fn fields_as_mapping_is_rejected() {
        let issues = decode_batch(&json!({
            "changes": [{
                "kind": "ADD_METHOD",
                "class_name": "UserService",
                "method_name": "create_user",
                "inputs": {"name": "In", "fields": {"email": {"type": "str"}}},
                "outputs": {"name": "User"}
            }]
        }))
        .unwrap_err();

        assert_eq!(paths(&issues), vec!["changes[0].inputs.fields"]);
    }

    #[test]
    fn reports_every_issue_in_one_pass() {
        let issues = decode_batch(&json!({
            "changes": [
                {"kind": "ADD_CLASS"},
                {"kind": "RENAME", "target_type": "module", "from": 3, "to": "B"},
                {"kind": "DELETE_CLASS", "class_name": "X"}
            ]
        }))
        .unwrap_err();

        assert_eq!(
            paths(&issues),
            vec![
                "changes[0].class_name",
                "changes[1].target_type",
                "changes[1].from",
                "changes[2].kind",
            ]
        );
        assert!(issues[3].message.contains("unknown edit kind 'DELETE_CLASS'"));
    }

    #[test]
    fn missing_changes_array_is_a_shape_issue() {
        let issues = decode_batch(&json!({"edits": []})).unwrap_err();
        assert_eq!(issues, vec![ValidationIssue::new("changes", "missing required field")]);
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_batch("Sure! Here is your change set.").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert_eq!(err.issues()[0].path, "$");
    }

    #[test]
    fn decoded_batch_matches_serde_form() {
        let v = json!({
            "changes": [
                {"kind": "RENAME", "target_type": "method", "from": "A.b", "to": "c", "alias_old": false},
                {"kind": "DEPRECATE", "target_type": "class", "target": "A", "message": "gone"}
            ]
        });
        let decoded = decode_batch(&v).unwrap();
        let derived: EditBatch = serde_json::from_value(v).unwrap();
        assert_eq!(decoded, derived);
    }
}
