//! Prompt construction for the generator.

use specledger_core::format_issues;

use crate::generator::GenerationRequest;

/// System prompt: the edit vocabulary and the exact wire shapes.
pub const SYSTEM_PROMPT: &str = r#"You convert natural language instructions into structured JSON edits for a service specification.

CRITICAL RULES:
1. Output ONLY a JSON object. No markdown, no code fences, no explanation.
2. The object MUST have a "changes" array: {"changes": [...]}
3. Produce minimal edits: change only what the instruction asks for.
4. Do not touch unrelated classes or methods.
5. Preserve existing documentation unless explicitly asked to replace it.
6. Use doc_note to describe modifications concisely.

EDIT KINDS:
1. ADD_CLASS: {"kind": "ADD_CLASS", "class_name": "ServiceName", "doc": "optional description"}
2. ADD_METHOD: {"kind": "ADD_METHOD", "class_name": "ServiceName", "method_name": "method_name", "inputs": ModelSpec, "outputs": ModelSpec, "doc": "optional"}
3. MODIFY_METHOD_SIGNATURE: {"kind": "MODIFY_METHOD_SIGNATURE", "class_name": "...", "method_name": "...", "add_params": [FieldSpec, ...], "remove_params": ["name", ...], "change_return": ModelSpec, "doc_note": "...", "replace_doc_summary": false, "new_doc_summary": "..."}
4. RENAME: {"kind": "RENAME", "target_type": "class"|"method", "from": "OldName"|"ClassName.old_method", "to": "NewName", "alias_old": true, "doc_note": "..."}
5. DEPRECATE: {"kind": "DEPRECATE", "target_type": "class"|"method", "target": "ClassName"|"ClassName.method_name", "message": "...", "doc_note": "..."}

SHAPES:
- FieldSpec: {"name": "field_name", "type": "str"|"int"|"float"|"bool"|"ModelName", "optional": false, "default": null, "description": "optional"}
- ModelSpec: {"name": "ModelName", "fields": [FieldSpec, ...]}  (fields is an ARRAY, not an object)

ADD_METHOD inputs and outputs MUST be ModelSpec objects with "name" and "fields":
  "inputs": {"name": "CreateUserInput", "fields": [{"name": "email", "type": "str"}]}
WRONG: "inputs": {"email": {"type": "str"}}  (a mapping of field name to field is rejected)

NAMES:
- Class, method, model and field names are identifiers: letters, digits and underscore, not starting with a digit.
- For renames set alias_old to true so the old name keeps resolving.
- Prefer rename with alias plus deprecation over breaking changes.

EXAMPLE:
{"changes": [{"kind": "ADD_CLASS", "class_name": "UserService", "doc": "Manages users"}, {"kind": "ADD_METHOD", "class_name": "UserService", "method_name": "create_user", "inputs": {"name": "CreateUserInput", "fields": [{"name": "email", "type": "str"}]}, "outputs": {"name": "User", "fields": [{"name": "id", "type": "str"}]}, "doc": "Creates a new user"}]}
"#;

/// Render the user message for `request`: a first-draft prompt, or a
/// repair prompt when the request carries a rejected output.
pub fn render(request: &GenerationRequest) -> String {
    match &request.repair {
        None => user_prompt(&request.instruction, &request.spec_view),
        Some(repair) => repair_prompt(
            &request.instruction,
            &request.spec_view,
            &repair.previous_output,
            &format_issues(&repair.errors),
        ),
    }
}

fn user_prompt(instruction: &str, spec_view: &str) -> String {
    format!(
        "Convert this instruction into an edit batch:

INSTRUCTION:
{instruction}

CURRENT SPECIFICATION:
{spec_view}

RULES:
- Produce minimal edits matching the instruction exactly
- For renames, use alias_old=true to keep backward compatibility
- Do not remove anything unless explicitly requested
- Use doc_note to describe changes concisely
- Preserve existing documentation unless replace_doc_summary=true

Return ONLY the JSON object with the \"changes\" array."
    )
}

fn repair_prompt(instruction: &str, spec_view: &str, previous: &str, errors: &str) -> String {
    format!(
        "The previous output was rejected. Return a corrected edit batch.

ORIGINAL INSTRUCTION:
{instruction}

CURRENT SPECIFICATION:
{spec_view}

REJECTED OUTPUT:
{previous}

ERRORS:
{errors}

Return ONLY the corrected JSON object with the \"changes\" array."
    )
}
