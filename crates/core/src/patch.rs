//! The patch engine: applies a validated [`EditBatch`] to a specification.
//!
//! [`apply`] is a pure function of the prior specification, the batch, and
//! the record metadata. The only wall-clock input is the timestamp the
//! caller passes in, which is stored but never branched on. Replaying a
//! history log with the recorded timestamps therefore reproduces the same
//! specification bit for bit.

use crate::edit::{
    split_method_target, AddClass, AddMethod, Deprecate, Edit, EditBatch, ModifyMethodSignature,
    Rename, TargetType,
};
use crate::error::PatchError;
use crate::history::HistoryRecord;
use crate::model::{push_note, ClassSpec, MethodSpec, Specification};
use crate::validate::{check_edit, rename_target_name};

/// Metadata for the history record produced by [`apply`].
#[derive(Debug, Clone)]
pub struct RecordMeta {
    /// 1-based position of the record in the log.
    pub sequence: u64,
    /// RFC 3339 timestamp; also stamped onto every doc note the batch appends.
    pub timestamp: String,
    pub source_text: Option<String>,
}

/// Apply `batch` to `spec`, returning the new specification and its record.
///
/// `spec` is left untouched. The batch must already have passed
/// [`validate`](crate::validate::validate); an invalid batch yields a
/// [`PatchError`], which is a caller bug rather than a user error.
pub fn apply(
    spec: &Specification,
    batch: &EditBatch,
    meta: RecordMeta,
) -> Result<(Specification, HistoryRecord), PatchError> {
    if batch.is_empty() {
        return Err(PatchError::EmptyBatch);
    }

    let mut working = spec.clone();
    let mut summary = Vec::with_capacity(batch.len());

    for (index, edit) in batch.iter().enumerate() {
        let issues = check_edit(&working, edit, &format!("changes[{}]", index));
        if !issues.is_empty() {
            return Err(PatchError::Unvalidated { index, issues });
        }
        summary.push(apply_edit(&mut working, edit, &meta.timestamp)?);
    }

    working.version = bump_version(&working.version);

    let record = HistoryRecord {
        sequence: meta.sequence,
        batch: batch.clone(),
        timestamp: meta.timestamp,
        version: working.version.clone(),
        etag: working.etag(),
        summary: summary.join("; "),
        source_text: meta.source_text,
    };

    Ok((working, record))
}

/// Apply one edit to `working`, returning a one-line summary.
pub(crate) fn apply_edit(
    working: &mut Specification,
    edit: &Edit,
    at: &str,
) -> Result<String, PatchError> {
    match edit {
        Edit::AddClass(e) => Ok(add_class(working, e)),
        Edit::AddMethod(e) => add_method(working, e),
        Edit::ModifyMethodSignature(e) => modify_method(working, e, at),
        Edit::Rename(e) => match e.target_type {
            TargetType::Class => rename_class(working, e, at),
            TargetType::Method => rename_method(working, e, at),
        },
        Edit::Deprecate(e) => deprecate(working, e, at),
    }
}

/// Bump the semver patch component; other version strings are kept as-is.
pub fn bump_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if let [major, minor, patch] = parts.as_slice() {
        if let Ok(patch) = patch.parse::<u64>() {
            return format!("{}.{}.{}", major, minor, patch + 1);
        }
    }
    version.to_string()
}

// ── Lookups ─────────────────────────────────────────────────────────

fn class_key(spec: &Specification, name: &str) -> Result<String, PatchError> {
    spec.resolve_class_name(name)
        .map(str::to_owned)
        .ok_or_else(|| PatchError::MissingTarget(format!("class {}", name)))
}

fn class_mut<'a>(spec: &'a mut Specification, name: &str) -> Result<&'a mut ClassSpec, PatchError> {
    let key = class_key(spec, name)?;
    spec.classes
        .get_mut(&key)
        .ok_or_else(|| PatchError::MissingTarget(format!("class {}", name)))
}

fn method_key(class: &ClassSpec, name: &str) -> Result<String, PatchError> {
    class
        .resolve_method_name(name)
        .map(str::to_owned)
        .ok_or_else(|| PatchError::MissingTarget(format!("method {}.{}", class.name, name)))
}

fn method_mut<'a>(class: &'a mut ClassSpec, name: &str) -> Result<&'a mut MethodSpec, PatchError> {
    let key = method_key(class, name)?;
    let class_name = class.name.clone();
    class
        .methods
        .get_mut(&key)
        .ok_or_else(|| PatchError::MissingTarget(format!("method {}.{}", class_name, name)))
}

fn method_target(target: &str) -> Result<(&str, &str), PatchError> {
    split_method_target(target)
        .ok_or_else(|| PatchError::MissingTarget(format!("method {}", target)))
}

// ── Edit kinds ──────────────────────────────────────────────────────

fn add_class(spec: &mut Specification, edit: &AddClass) -> String {
    let name = edit.class_name.clone();
    // A re-created name stops resolving to the entity that retired it.
    for class in spec.classes.values_mut() {
        class.aliases.remove(&name);
    }
    let doc_summary = edit
        .doc
        .clone()
        .unwrap_or_else(|| format!("{} service generated from instruction specs.", name));
    spec.classes.insert(
        name.clone(),
        ClassSpec {
            name: name.clone(),
            methods: Default::default(),
            doc_summary,
            doc_notes: Vec::new(),
            deprecated: false,
            deprecation_message: None,
            aliases: Default::default(),
        },
    );
    format!("Added class {}", name)
}

fn add_method(spec: &mut Specification, edit: &AddMethod) -> Result<String, PatchError> {
    let class = class_mut(spec, &edit.class_name)?;
    let name = edit.method_name.clone();
    for method in class.methods.values_mut() {
        method.aliases.remove(&name);
    }
    let doc_summary = edit
        .doc
        .clone()
        .unwrap_or_else(|| format!("{} method", name));
    class.methods.insert(
        name.clone(),
        MethodSpec {
            name: name.clone(),
            inputs: edit.inputs.clone(),
            outputs: edit.outputs.clone(),
            doc_summary,
            doc_notes: Vec::new(),
            deprecated: false,
            deprecation_message: None,
            aliases: Default::default(),
        },
    );
    Ok(format!("Added method {}.{}", class.name, name))
}

fn modify_method(
    spec: &mut Specification,
    edit: &ModifyMethodSignature,
    at: &str,
) -> Result<String, PatchError> {
    let class = class_mut(spec, &edit.class_name)?;
    let class_name = class.name.clone();
    let method = method_mut(class, &edit.method_name)?;

    method
        .inputs
        .fields
        .retain(|f| !edit.remove_params.contains(&f.name));
    method.inputs.fields.extend(edit.add_params.iter().cloned());

    if let Some(model) = &edit.change_return {
        method.outputs = model.clone();
    }

    if edit.replace_doc_summary {
        if let Some(summary) = &edit.new_doc_summary {
            method.doc_summary = summary.clone();
        }
    }

    let note = edit
        .doc_note
        .clone()
        .unwrap_or_else(|| "Method signature modified".to_string());
    push_note(&mut method.doc_notes, at, note);

    Ok(format!("Modified {}.{}", class_name, method.name))
}

fn rename_class(spec: &mut Specification, edit: &Rename, at: &str) -> Result<String, PatchError> {
    let old = class_key(spec, &edit.from)?;
    let mut class = spec
        .classes
        .remove(&old)
        .ok_or_else(|| PatchError::MissingTarget(format!("class {}", edit.from)))?;

    for other in spec.classes.values_mut() {
        other.aliases.remove(&edit.to);
    }
    class.name = edit.to.clone();
    class.aliases.remove(&edit.to);
    if edit.alias_old {
        class.aliases.insert(old.clone());
    }
    let note = edit
        .doc_note
        .clone()
        .unwrap_or_else(|| format!("Renamed from {}", old));
    push_note(&mut class.doc_notes, at, note);

    spec.classes.insert(edit.to.clone(), class);
    Ok(format!("Renamed class {} -> {}", old, edit.to))
}

fn rename_method(spec: &mut Specification, edit: &Rename, at: &str) -> Result<String, PatchError> {
    let (class_name, method_name) = method_target(&edit.from)?;
    let to = rename_target_name(&edit.to).to_string();
    let class = class_mut(spec, class_name)?;
    let old = method_key(class, method_name)?;
    let mut method = class
        .methods
        .remove(&old)
        .ok_or_else(|| PatchError::MissingTarget(format!("method {}", edit.from)))?;

    for other in class.methods.values_mut() {
        other.aliases.remove(&to);
    }
    method.name = to.clone();
    method.aliases.remove(&to);
    if edit.alias_old {
        method.aliases.insert(old.clone());
    }
    let note = edit
        .doc_note
        .clone()
        .unwrap_or_else(|| format!("Renamed from {}", old));
    push_note(&mut method.doc_notes, at, note);

    class.methods.insert(to.clone(), method);
    Ok(format!("Renamed method {}.{} -> {}", class.name, old, to))
}

fn deprecate(spec: &mut Specification, edit: &Deprecate, at: &str) -> Result<String, PatchError> {
    let note = edit.doc_note.clone().unwrap_or_else(|| match &edit.message {
        Some(msg) => format!("Deprecated: {}", msg),
        None => "Deprecated".to_string(),
    });

    match edit.target_type {
        TargetType::Class => {
            let class = class_mut(spec, &edit.target)?;
            class.deprecated = true;
            class.deprecation_message = edit.message.clone();
            push_note(&mut class.doc_notes, at, note);
            Ok(format!("Deprecated class {}", class.name))
        }
        TargetType::Method => {
            let (class_name, method_name) = method_target(&edit.target)?;
            let class = class_mut(spec, class_name)?;
            let class_name = class.name.clone();
            let method = method_mut(class, method_name)?;
            method.deprecated = true;
            method.deprecation_message = edit.message.clone();
            push_note(&mut method.doc_notes, at, note);
            Ok(format!("Deprecated method {}.{}", class_name, method.name))
        }
    }
}
