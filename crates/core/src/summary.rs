//! Compact textual view of a specification.
//!
//! This is what the external generator sees of the current state: enough
//! to name existing classes and methods correctly, nothing more.

use std::fmt::Write;

use crate::model::{MethodSpec, Specification};

/// Summarize `spec` for a generation prompt.
pub fn spec_view(spec: &Specification) -> String {
    if spec.classes.is_empty() {
        return "Empty specification (no classes defined yet).".to_string();
    }

    let mut out = format!("Current specification (version {}):\n", spec.version);
    for (name, class) in &spec.classes {
        let _ = writeln!(out, "\n{}:", name);
        if !class.doc_summary.is_empty() {
            let _ = writeln!(out, "  Doc: {}", class.doc_summary);
        }
        if !class.aliases.is_empty() {
            let aliases: Vec<&str> = class.aliases.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  Aliases: {}", aliases.join(", "));
        }
        if class.deprecated {
            let _ = writeln!(out, "  [DEPRECATED]");
        }
        if class.methods.is_empty() {
            let _ = writeln!(out, "  Methods: (none)");
        } else {
            let _ = writeln!(out, "  Methods:");
            for method in class.methods.values() {
                let _ = writeln!(out, "    {}", signature(method));
            }
        }
    }
    out
}

fn signature(method: &MethodSpec) -> String {
    let params: Vec<String> = method
        .inputs
        .fields
        .iter()
        .map(|f| {
            let optional = if f.optional { "?" } else { "" };
            format!("{}: {}{}", f.name, f.type_tag, optional)
        })
        .collect();
    let mut sig = format!(
        "{}({}) -> {}",
        method.name,
        params.join(", "),
        method.outputs.name
    );
    if !method.aliases.is_empty() {
        let aliases: Vec<&str> = method.aliases.iter().map(String::as_str).collect();
        sig.push_str(&format!(" (aliases: {})", aliases.join(", ")));
    }
    if method.deprecated {
        sig.push_str(" [DEPRECATED]");
    }
    sig
}
