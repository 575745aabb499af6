// merge.rs — Per-tool revision merge rules.
//
// Free-text tools concatenate the operator's revision input onto the
// stored text with a labeled separator, so earlier rounds stay visible.
// Structured tools define no rule and reject revise; the operation stays
// pending with its original args and preview.

use serde_json::{Map, Value};

use crate::error::OpsError;
use crate::tools;

/// Labeled separator between the stored text and each revision round.
pub const REVISION_SEPARATOR: &str = "\n\n--- Revision ---\n";

/// Merge `input` into `args` according to the tool's rule. On error the
/// args are left untouched.
pub fn merge_revision(
    tool_name: &str,
    args: &mut Map<String, Value>,
    input: &str,
) -> Result<(), OpsError> {
    let field = match tool_name {
        tools::ISSUE_CREATE_SIMPLE => "initialInput",
        tools::PR_CREATE | tools::REPORT_PUBLISH => "body",
        other => return Err(OpsError::NoMergeRule(other.to_string())),
    };
    let existing = args.get(field).and_then(Value::as_str).unwrap_or("");
    let merged = if existing.trim().is_empty() {
        input.to_string()
    } else {
        format!("{}{}{}", existing, REVISION_SEPARATOR, input)
    };
    args.insert(field.to_string(), Value::String(merged));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn free_text_revision_appends_with_separator() {
        let mut args = Map::new();
        args.insert("initialInput".into(), json!("Add dark mode"));
        merge_revision(tools::ISSUE_CREATE_SIMPLE, &mut args, "Also support light theme").unwrap();

        let merged = args["initialInput"].as_str().unwrap();
        assert!(merged.starts_with("Add dark mode"));
        assert!(merged.contains(REVISION_SEPARATOR));
        assert!(merged.ends_with("Also support light theme"));
    }

    #[test]
    fn second_revision_keeps_both_rounds() {
        let mut args = Map::new();
        args.insert("initialInput".into(), json!("Add dark mode"));
        merge_revision(tools::ISSUE_CREATE_SIMPLE, &mut args, "round one").unwrap();
        merge_revision(tools::ISSUE_CREATE_SIMPLE, &mut args, "round two").unwrap();

        let merged = args["initialInput"].as_str().unwrap();
        assert_eq!(merged.matches(REVISION_SEPARATOR).count(), 2);
        assert!(merged.contains("round one"));
        assert!(merged.ends_with("round two"));
    }

    #[test]
    fn empty_stored_text_takes_input_without_separator() {
        let mut args = Map::new();
        merge_revision(tools::PR_CREATE, &mut args, "fresh body").unwrap();
        assert_eq!(args["body"], "fresh body");
    }

    #[test]
    fn structured_tool_has_no_rule() {
        let mut args = Map::new();
        args.insert("issueNumber".into(), json!(7));
        let before = args.clone();

        let result = merge_revision(tools::ISSUE_UPDATE, &mut args, "change the title");
        assert!(matches!(result, Err(OpsError::NoMergeRule(_))));
        assert_eq!(args, before);
    }

    #[test]
    fn unknown_tool_has_no_rule() {
        let mut args = Map::new();
        let result = merge_revision("fs:Write", &mut args, "x");
        assert!(matches!(result, Err(OpsError::NoMergeRule(_))));
    }
}
