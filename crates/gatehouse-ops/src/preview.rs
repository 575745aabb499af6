// preview.rs — Pure preview rendering for proposed operations.
//
// Previews are plain markdown built from the stored args: a header naming
// the action, the salient parameters, and a decision footer. Proposers
// render at create time; the dispatcher re-renders after every revision
// so the stored preview always reflects the stored args.

use serde_json::{Map, Value};

use crate::tools;

/// Maximum length of a title derived from free text.
const TITLE_MAX: usize = 80;

const DECISION_FOOTER: &str = "_Confirm to execute, revise to amend, or cancel to discard._";

/// Split one block of free text into an issue title and body. The title is
/// the first line, truncated at a word-agnostic character limit; the body
/// is the full text.
pub fn split_initial_input(text: &str) -> (String, String) {
    let first_line = text.lines().next().unwrap_or("").trim();
    let title = if first_line.chars().count() > TITLE_MAX {
        let truncated: String = first_line.chars().take(TITLE_MAX).collect();
        format!("{}…", truncated.trim_end())
    } else if first_line.is_empty() {
        "(untitled)".to_string()
    } else {
        first_line.to_string()
    };
    (title, text.trim().to_string())
}

/// Render the preview document for a proposed operation.
pub fn render(tool_name: &str, args: &Map<String, Value>) -> String {
    match tool_name {
        tools::ISSUE_CREATE_SIMPLE => render_issue_create(args),
        tools::ISSUE_UPDATE => render_issue_update(args),
        tools::PR_CREATE => render_pr_create(args),
        tools::REPORT_PUBLISH => render_report(args),
        other => render_generic(other, args),
    }
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn u64_arg(args: &Map<String, Value>, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

fn render_issue_create(args: &Map<String, Value>) -> String {
    let text = str_arg(args, "initialInput").unwrap_or("");
    let (title, body) = split_initial_input(text);
    format!(
        "## Proposed issue\n\n**Title:** {}\n\n{}\n\n{}",
        title, body, DECISION_FOOTER
    )
}

fn render_issue_update(args: &Map<String, Value>) -> String {
    let number = u64_arg(args, "issueNumber");
    let mut lines = vec![format!(
        "## Proposed update to issue #{}",
        number.map_or_else(|| "?".to_string(), |n| n.to_string())
    )];
    if let Some(title) = str_arg(args, "title") {
        lines.push(format!("- New title: {}", title));
    }
    if let Some(body) = str_arg(args, "body") {
        lines.push(format!("- New body:\n\n{}", body));
    }
    if let Some(comment) = str_arg(args, "comment") {
        lines.push(format!("- Comment to add:\n\n{}", comment));
    }
    if lines.len() == 1 {
        lines.push("- No changes specified.".to_string());
    }
    format!("{}\n\n{}", lines.join("\n"), DECISION_FOOTER)
}

fn render_pr_create(args: &Map<String, Value>) -> String {
    let title = str_arg(args, "title").unwrap_or("(untitled)");
    let head = str_arg(args, "head").unwrap_or("?");
    let base = str_arg(args, "base").unwrap_or("?");
    let body = str_arg(args, "body").unwrap_or("");
    format!(
        "## Proposed pull request\n\n**Title:** {}\n**Branches:** `{}` → `{}`\n\n{}\n\n{}",
        title, head, base, body, DECISION_FOOTER
    )
}

fn render_report(args: &Map<String, Value>) -> String {
    let number = u64_arg(args, "issueNumber");
    let body = str_arg(args, "body").unwrap_or("");
    format!(
        "## Proposed report on issue #{}\n\n{}\n\n{}",
        number.map_or_else(|| "?".to_string(), |n| n.to_string()),
        body,
        DECISION_FOOTER
    )
}

fn render_generic(tool_name: &str, args: &Map<String, Value>) -> String {
    let dump = serde_json::to_string_pretty(&Value::Object(args.clone()))
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "## Proposed operation\n\n**Tool:** {}\n\n```json\n{}\n```\n\n{}",
        tool_name, dump, DECISION_FOOTER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_issue_title_is_first_line() {
        let (title, body) = split_initial_input("Add dark mode\n\nUsers keep asking for it.");
        assert_eq!(title, "Add dark mode");
        assert!(body.contains("Users keep asking"));
    }

    #[test]
    fn long_first_line_is_truncated_with_ellipsis() {
        let long = "x".repeat(200);
        let (title, _) = split_initial_input(&long);
        assert_eq!(title.chars().count(), 81);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn empty_text_gets_placeholder_title() {
        let (title, body) = split_initial_input("");
        assert_eq!(title, "(untitled)");
        assert_eq!(body, "");
    }

    #[test]
    fn issue_create_preview_shows_title_and_body() {
        let mut args = Map::new();
        args.insert("initialInput".into(), json!("Add dark mode\n\nDetails here."));
        let preview = render(crate::tools::ISSUE_CREATE_SIMPLE, &args);
        assert!(preview.contains("## Proposed issue"));
        assert!(preview.contains("**Title:** Add dark mode"));
        assert!(preview.contains("Details here."));
        assert!(preview.contains("Confirm to execute"));
    }

    #[test]
    fn issue_update_preview_lists_only_present_fields() {
        let mut args = Map::new();
        args.insert("issueNumber".into(), json!(12));
        args.insert("comment".into(), json!("Triaged."));
        let preview = render(crate::tools::ISSUE_UPDATE, &args);
        assert!(preview.contains("issue #12"));
        assert!(preview.contains("Comment to add"));
        assert!(!preview.contains("New title"));
    }

    #[test]
    fn pr_preview_names_branches() {
        let mut args = Map::new();
        args.insert("title".into(), json!("Fix login race"));
        args.insert("head".into(), json!("fix/login-race"));
        args.insert("base".into(), json!("main"));
        args.insert("body".into(), json!("Serialize the session refresh."));
        let preview = render(crate::tools::PR_CREATE, &args);
        assert!(preview.contains("`fix/login-race` → `main`"));
        assert!(preview.contains("Fix login race"));
    }

    #[test]
    fn unknown_tool_falls_back_to_json_dump() {
        let mut args = Map::new();
        args.insert("path".into(), json!("src/lib.rs"));
        let preview = render("fs:Write", &args);
        assert!(preview.contains("fs:Write"));
        assert!(preview.contains("src/lib.rs"));
    }
}
