//! Structural and semantic checks for edit batches.
//!
//! Each edit is checked against the working state as of its position in
//! the batch: an ADD_METHOD may target a class added by an earlier
//! ADD_CLASS in the same batch. The caller's specification is never
//! touched; the working state is a private copy.

use std::collections::HashSet;

use crate::edit::{
    split_method_target, AddClass, AddMethod, Deprecate, Edit, EditBatch, ModifyMethodSignature,
    Rename, TargetType,
};
use crate::error::ValidationIssue;
use crate::model::{FieldSpec, ModelSpec, Specification};
use crate::patch;

/// Validate `batch` against `spec`.
///
/// Returns every issue found, in batch order.
pub fn validate(spec: &Specification, batch: &EditBatch) -> Result<(), Vec<ValidationIssue>> {
    if batch.is_empty() {
        return Err(vec![ValidationIssue::new(
            "changes",
            "edit batch contains no changes",
        )]);
    }

    let mut working = spec.clone();
    let mut issues = Vec::new();

    for (index, edit) in batch.iter().enumerate() {
        let path = format!("changes[{}]", index);
        let found = check_edit(&working, edit, &path);
        if !found.is_empty() {
            issues.extend(found);
            continue;
        }
        // Advance the working state so later edits see this one. Note
        // timestamps are irrelevant here; the copy is discarded.
        if let Err(e) = patch::apply_edit(&mut working, edit, "") {
            issues.push(ValidationIssue::new(path, e.to_string()));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Names of classes, methods, fields, and models.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check a single edit against `spec` without modifying it.
pub(crate) fn check_edit(spec: &Specification, edit: &Edit, path: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    match edit {
        Edit::AddClass(e) => check_add_class(spec, e, path, &mut issues),
        Edit::AddMethod(e) => check_add_method(spec, e, path, &mut issues),
        Edit::ModifyMethodSignature(e) => check_modify(spec, e, path, &mut issues),
        Edit::Rename(e) => check_rename(spec, e, path, &mut issues),
        Edit::Deprecate(e) => check_deprecate(spec, e, path, &mut issues),
    }
    issues
}

fn check_name(name: &str, path: String, what: &str, issues: &mut Vec<ValidationIssue>) {
    if name.is_empty() {
        issues.push(ValidationIssue::new(path, format!("{} must not be empty", what)));
    } else if !is_identifier(name) {
        issues.push(ValidationIssue::new(
            path,
            format!("'{}' is not a valid {} identifier", name, what),
        ));
    }
}

fn check_field(field: &FieldSpec, path: &str, issues: &mut Vec<ValidationIssue>) {
    check_name(&field.name, format!("{}.name", path), "field name", issues);
    if field.type_tag.trim().is_empty() {
        issues.push(ValidationIssue::new(
            format!("{}.type", path),
            "field type must not be empty",
        ));
    }
}

fn check_model(model: &ModelSpec, path: &str, issues: &mut Vec<ValidationIssue>) {
    check_name(&model.name, format!("{}.name", path), "model name", issues);
    let mut seen = HashSet::new();
    for (i, field) in model.fields.iter().enumerate() {
        let field_path = format!("{}.fields[{}]", path, i);
        check_field(field, &field_path, issues);
        if !seen.insert(field.name.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{}.name", field_path),
                format!("duplicate field name '{}' in model {}", field.name, model.name),
            ));
        }
    }
}

fn check_add_class(
    spec: &Specification,
    edit: &AddClass,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let name_path = format!("{}.class_name", path);
    check_name(&edit.class_name, name_path.clone(), "class name", issues);
    // Only canonical names block creation; a retired alias does not.
    if spec.classes.contains_key(&edit.class_name) {
        issues.push(ValidationIssue::new(
            name_path,
            format!("class {} already exists", edit.class_name),
        ));
    }
}

fn check_add_method(
    spec: &Specification,
    edit: &AddMethod,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    check_name(
        &edit.method_name,
        format!("{}.method_name", path),
        "method name",
        issues,
    );
    match spec.resolve_class(&edit.class_name) {
        None => issues.push(ValidationIssue::new(
            format!("{}.class_name", path),
            format!("class {} does not exist", edit.class_name),
        )),
        Some(class) => {
            if class.methods.contains_key(&edit.method_name) {
                issues.push(ValidationIssue::new(
                    format!("{}.method_name", path),
                    format!("method {}.{} already exists", class.name, edit.method_name),
                ));
            }
        }
    }
    check_model(&edit.inputs, &format!("{}.inputs", path), issues);
    check_model(&edit.outputs, &format!("{}.outputs", path), issues);
}

fn check_modify(
    spec: &Specification,
    edit: &ModifyMethodSignature,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some((class, method)) = spec.resolve_method(&edit.class_name, &edit.method_name) else {
        issues.push(ValidationIssue::new(
            format!("{}.method_name", path),
            format!(
                "method {}.{} does not exist",
                edit.class_name, edit.method_name
            ),
        ));
        return;
    };

    let mut removed = HashSet::new();
    for (i, param) in edit.remove_params.iter().enumerate() {
        let param_path = format!("{}.remove_params[{}]", path, i);
        if !method.inputs.has_field(param) {
            issues.push(ValidationIssue::new(
                param_path,
                format!(
                    "parameter '{}' does not exist on {}.{}",
                    param, class.name, method.name
                ),
            ));
        } else if !removed.insert(param.as_str()) {
            issues.push(ValidationIssue::new(
                param_path,
                format!("parameter '{}' is removed more than once", param),
            ));
        }
    }

    let mut added = HashSet::new();
    for (i, field) in edit.add_params.iter().enumerate() {
        let field_path = format!("{}.add_params[{}]", path, i);
        check_field(field, &field_path, issues);
        let name = field.name.as_str();
        if !added.insert(name) {
            issues.push(ValidationIssue::new(
                format!("{}.name", field_path),
                format!("parameter '{}' is added more than once", name),
            ));
        } else if method.inputs.has_field(name) && !removed.contains(name) {
            issues.push(ValidationIssue::new(
                format!("{}.name", field_path),
                format!(
                    "parameter '{}' already exists on {}.{}",
                    name, class.name, method.name
                ),
            ));
        }
    }

    if let Some(model) = &edit.change_return {
        check_model(model, &format!("{}.change_return", path), issues);
    }

    if edit.replace_doc_summary
        && edit
            .new_doc_summary
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    {
        issues.push(ValidationIssue::new(
            format!("{}.new_doc_summary", path),
            "new_doc_summary is required when replace_doc_summary is true",
        ));
    }
}

fn check_rename(
    spec: &Specification,
    edit: &Rename,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let to_path = format!("{}.to", path);
    match edit.target_type {
        TargetType::Class => {
            check_name(&edit.to, to_path.clone(), "class name", issues);
            let Some(canonical) = spec.resolve_class_name(&edit.from) else {
                issues.push(ValidationIssue::new(
                    format!("{}.from", path),
                    format!("class {} does not exist", edit.from),
                ));
                return;
            };
            // Another class's alias does not block the name; the rename
            // retires it, as ADD_CLASS does.
            if canonical == edit.to {
                issues.push(ValidationIssue::new(
                    to_path,
                    format!("class {} is already named {}", edit.from, edit.to),
                ));
            } else if spec.classes.contains_key(&edit.to) {
                issues.push(ValidationIssue::new(
                    to_path,
                    format!("class {} already exists", edit.to),
                ));
            }
        }
        TargetType::Method => {
            let Some((class_name, method_name)) = split_method_target(&edit.from) else {
                issues.push(ValidationIssue::new(
                    format!("{}.from", path),
                    format!("method target must be 'Class.method', got '{}'", edit.from),
                ));
                return;
            };
            let to = rename_target_name(&edit.to);
            check_name(to, to_path.clone(), "method name", issues);
            let Some(class) = spec.resolve_class(class_name) else {
                issues.push(ValidationIssue::new(
                    format!("{}.from", path),
                    format!("class {} does not exist", class_name),
                ));
                return;
            };
            if edit.to.contains('.') {
                let prefix = split_method_target(&edit.to).map(|(prefix, _)| prefix);
                if prefix.and_then(|p| spec.resolve_class_name(p)) != Some(class.name.as_str()) {
                    issues.push(ValidationIssue::new(
                        to_path,
                        format!(
                            "rename target '{}' must stay in class {}",
                            edit.to, class.name
                        ),
                    ));
                    return;
                }
            }
            let Some(canonical) = class.resolve_method_name(method_name) else {
                issues.push(ValidationIssue::new(
                    format!("{}.from", path),
                    format!("method {}.{} does not exist", class.name, method_name),
                ));
                return;
            };
            if canonical == to {
                issues.push(ValidationIssue::new(
                    to_path,
                    format!("method {}.{} is already named {}", class.name, method_name, to),
                ));
            } else if class.methods.contains_key(to) {
                issues.push(ValidationIssue::new(
                    to_path,
                    format!("method {}.{} already exists", class.name, to),
                ));
            }
        }
    }
}

fn check_deprecate(
    spec: &Specification,
    edit: &Deprecate,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let target_path = format!("{}.target", path);
    match edit.target_type {
        TargetType::Class => {
            if spec.resolve_class(&edit.target).is_none() {
                issues.push(ValidationIssue::new(
                    target_path,
                    format!("class {} does not exist", edit.target),
                ));
            }
        }
        TargetType::Method => match split_method_target(&edit.target) {
            None => issues.push(ValidationIssue::new(
                target_path,
                format!("method target must be 'Class.method', got '{}'", edit.target),
            )),
            Some((class_name, method_name)) => {
                if spec.resolve_method(class_name, method_name).is_none() {
                    issues.push(ValidationIssue::new(
                        target_path,
                        format!("method {} does not exist", edit.target),
                    ));
                }
            }
        },
    }
}

/// A method rename's `to` may be written `Class.new_name`; only the last
/// segment is the new name.
pub(crate) fn rename_target_name(to: &str) -> &str {
    to.rsplit('.').next().unwrap_or(to)
}
