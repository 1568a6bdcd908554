//! Extract the structured metadata block embedded in a resource file
//!
//! Agents are markdown with metadata either as YAML frontmatter (between the
//! first two `---` lines) or as the first fenced `yaml` code block. Teams are
//! plain YAML files and the whole file is the metadata.

use serde_yaml::Value;

/// Split content into raw frontmatter and body
///
/// Returns `None` if the content does not open with a `---` delimited block.
pub fn split_frontmatter(content: &str) -> Option<(String, String)> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 || lines[0].trim() != "---" {
        return None;
    }
    let end_idx = lines[1..].iter().position(|l| l.trim() == "---")? + 1;
    let frontmatter = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");
    Some((frontmatter, body))
}

/// The contents of the first fenced block tagged `yaml` or `yml`
pub fn first_fenced_yaml(content: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.find(|l| {
        let tag = l.trim_start().trim_start_matches('`');
        l.trim_start().starts_with("```") && matches!(tag.trim(), "yaml" | "yml")
    })?;

    let mut block = Vec::new();
    for line in lines {
        if line.trim_start().starts_with("```") {
            return Some(block.join("\n"));
        }
        block.push(line);
    }
    None
}

/// Extract and parse a resource's metadata block
///
/// `Ok(None)` means the resource declares no metadata at all. `Err` carries a
/// human-readable reason when a block exists but is not a YAML mapping.
pub fn extract(content: &str, whole_file_is_yaml: bool) -> Result<Option<Value>, String> {
    let raw = if whole_file_is_yaml {
        Some(content.to_string())
    } else if let Some((frontmatter, _body)) = split_frontmatter(content) {
        Some(frontmatter)
    } else {
        first_fenced_yaml(content)
    };

    let Some(raw) = raw else {
        return Ok(None);
    };

    let value: Value = serde_yaml::from_str(&raw).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(None),
        Value::Mapping(_) => Ok(Some(value)),
        other => Err(format!(
            "metadata must be a mapping, found {}",
            describe(&other)
        )),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_metadata() {
        assert_eq!(extract("just body\nno delimiters", false), Ok(None));
    }

    #[test]
    fn test_frontmatter_wins() {
        let content = "---\nagent:\n  id: dev\n---\n\n```yaml\nagent:\n  id: other\n```\n";
        let value = extract(content, false).unwrap().unwrap();
        assert_eq!(value["agent"]["id"].as_str(), Some("dev"));
    }

    #[test]
    fn test_fenced_block() {
        let content = "# Dev agent\n\nSome text.\n\n```yaml\nagent:\n  id: dev\ndependencies:\n  tasks:\n    - create-doc.md\n```\n\nMore text.\n";
        let value = extract(content, false).unwrap().unwrap();
        assert_eq!(value["dependencies"]["tasks"][0].as_str(), Some("create-doc.md"));
    }

    #[test]
    fn test_fenced_block_ignores_other_languages() {
        let content = "```bash\nls\n```\n\n```yml\nagent:\n  id: qa\n```\n";
        let value = extract(content, false).unwrap().unwrap();
        assert_eq!(value["agent"]["id"].as_str(), Some("qa"));
    }

    #[test]
    fn test_unterminated_fence_is_no_metadata() {
        assert_eq!(extract("```yaml\nagent: {id: x}\n", false), Ok(None));
    }

    #[test]
    fn test_whole_yaml_file() {
        let value = extract("agents:\n  - dev\n", true).unwrap().unwrap();
        assert_eq!(value["agents"][0].as_str(), Some("dev"));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        assert!(extract("---\ndependencies: [unclosed\n---\n", false).is_err());
    }

    #[test]
    fn test_non_mapping_is_error() {
        let err = extract("- a\n- b\n", true).unwrap_err();
        assert!(err.contains("a list"));
    }

    #[test]
    fn test_split_frontmatter_body() {
        let (fm, body) = split_frontmatter("---\ndescription: hello\n---\n\nbody here").unwrap();
        assert_eq!(fm, "description: hello");
        assert_eq!(body.trim(), "body here");
    }
}
