use serde::Deserialize;

use super::EnrichmentResult;

const RAW_SUMMARY_MAX_CHARS: usize = 280;

/// Shape the provider is asked to produce. Anything that does not decode
/// into this exactly (wrong-typed `summary` or `tags` included) is treated
/// as unstructured text and handed to the line scan instead.
#[derive(Debug, Deserialize)]
struct ProviderPayload {
    summary: Option<String>,
    tags: Option<TagsField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    CommaSeparated(String),
}

/// Best-effort interpretation of free-form provider output. Degrades
/// stage by stage instead of failing: structured decode, then line-scan
/// heuristics, then the raw text itself.
pub fn parse(raw_text: &str, manual_tags: Option<&[String]>) -> EnrichmentResult {
    let text = strip_code_fences(raw_text);

    if let Ok(payload) = serde_json::from_str::<ProviderPayload>(&text) {
        let tags = payload
            .tags
            .and_then(resolve_tags)
            .or_else(|| manual_tags.map(|t| t.to_vec()));

        return EnrichmentResult {
            summary: payload.summary,
            tags,
        };
    }

    let lower = text.to_lowercase();
    if lower.contains("summary") || lower.contains("tag") {
        return scan_lines(&text, manual_tags);
    }

    // No recognizable structure at all: the text is the summary
    let summary: String = text.chars().take(RAW_SUMMARY_MAX_CHARS).collect();
    EnrichmentResult {
        summary: Some(summary),
        tags: manual_tags.map(|t| t.to_vec()),
    }
}

/// Removes triple-backtick fences, dropping a language tag glued to the
/// opening fence ("```json").
fn strip_code_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(idx) = rest.find("```") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 3..];

        let tag_len: usize = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .map(|c| c.len_utf8())
            .sum();
        rest = &rest[tag_len..];
    }

    out.push_str(rest);
    out.trim().to_string()
}

fn resolve_tags(field: TagsField) -> Option<Vec<String>> {
    let tags = match field {
        TagsField::List(list) => list,
        TagsField::CommaSeparated(s) => s
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect(),
    };

    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Scans for "summary"/"tag" marker lines independently; the value is
/// whatever follows the first colon on that line (the whole line when there
/// is no colon). First matching line wins for each marker.
fn scan_lines(text: &str, manual_tags: Option<&[String]>) -> EnrichmentResult {
    let summary = text
        .lines()
        .find(|line| line.to_lowercase().contains("summary"))
        .map(|line| after_colon(line).trim().to_string());

    let tags = text
        .lines()
        .filter(|line| line.to_lowercase().contains("tag"))
        .find_map(|line| {
            let parsed: Vec<String> = after_colon(line)
                .split(',')
                .map(|piece| piece.trim_matches(|c| c == '-' || c == ' ').to_string())
                .filter(|piece| !piece.is_empty())
                .collect();
            if parsed.is_empty() {
                None
            } else {
                Some(parsed)
            }
        })
        .or_else(|| manual_tags.map(|t| t.to_vec()));

    EnrichmentResult { summary, tags }
}

fn after_colon(line: &str) -> &str {
    match line.split_once(':') {
        Some((_, rest)) => rest,
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual() -> Vec<String> {
        vec!["manual".to_string()]
    }

    #[test]
    fn test_structured_payload_roundtrip() {
        let result = parse(r#"{"summary":"S","tags":["a","b"]}"#, None);
        assert_eq!(result.summary.as_deref(), Some("S"));
        assert_eq!(result.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_structured_payload_with_code_fences() {
        let raw = "```json\n{\"summary\":\"S\",\"tags\":[\"a\"]}\n```";
        let result = parse(raw, None);
        assert_eq!(result.summary.as_deref(), Some("S"));
        assert_eq!(result.tags, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_string_valued_tags_split_on_commas() {
        let result = parse(r#"{"summary":"S","tags":"a, b ,c"}"#, None);
        assert_eq!(
            result.tags,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_structured_without_tags_falls_back_to_manual() {
        let result = parse(r#"{"summary":"S"}"#, Some(&manual()));
        assert_eq!(result.summary.as_deref(), Some("S"));
        assert_eq!(result.tags, Some(manual()));
    }

    #[test]
    fn test_structured_with_empty_tags_falls_back_to_manual() {
        let result = parse(r#"{"summary":"S","tags":[]}"#, Some(&manual()));
        assert_eq!(result.tags, Some(manual()));
    }

    #[test]
    fn test_wrong_typed_summary_falls_through_to_line_scan() {
        let result = parse(r#"{"summary": 42, "tags": ["a"]}"#, None);
        // Decode fails on the non-string summary; the line scan takes over
        // and extracts whatever follows the first colon
        assert_eq!(result.summary.as_deref(), Some(r#"42, "tags": ["a"]}"#));
    }

    #[test]
    fn test_wrong_typed_tags_is_a_decode_failure() {
        let result = parse(r#"{"summary":"S","tags":{"a":1}}"#, Some(&manual()));
        // Not propagated as structured data; the line scan produces a
        // best-effort summary instead of failing
        assert!(result.summary.is_some());
        assert!(result.tags.is_some());
    }

    #[test]
    fn test_line_scan_extracts_summary_and_tags() {
        let raw = "Summary: hello\nTags: x, y";
        let result = parse(raw, None);
        assert_eq!(result.summary.as_deref(), Some("hello"));
        assert_eq!(result.tags, Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn test_line_scan_strips_hyphens_from_tags() {
        let raw = "Summary: s\nTags: - alpha, - beta -";
        let result = parse(raw, None);
        assert_eq!(
            result.tags,
            Some(vec!["alpha".to_string(), "beta".to_string()])
        );
    }

    #[test]
    fn test_line_scan_keeps_manual_tags_when_no_tag_line() {
        let raw = "Summary: just a summary";
        let result = parse(raw, Some(&manual()));
        assert_eq!(result.summary.as_deref(), Some("just a summary"));
        assert_eq!(result.tags, Some(manual()));
    }

    #[test]
    fn test_marker_line_without_colon_uses_whole_line() {
        let raw = "A summary of sorts";
        let result = parse(raw, None);
        assert_eq!(result.summary.as_deref(), Some("A summary of sorts"));
    }

    #[test]
    fn test_no_markers_treats_text_as_summary() {
        let raw = "Just some prose the model produced.";
        let result = parse(raw, Some(&manual()));
        assert_eq!(result.summary.as_deref(), Some(raw));
        assert_eq!(result.tags, Some(manual()));
    }

    #[test]
    fn test_no_markers_truncates_to_280_chars() {
        let raw = "x".repeat(400);
        let result = parse(&raw, None);
        assert_eq!(result.summary.unwrap().chars().count(), 280);
        assert_eq!(result.tags, None);
    }

    #[test]
    fn test_first_matching_line_wins() {
        let raw = "Summary: first\nSummary: second\nTags: a\nTags: b";
        let result = parse(raw, None);
        assert_eq!(result.summary.as_deref(), Some("first"));
        assert_eq!(result.tags, Some(vec!["a".to_string()]));
    }
}
