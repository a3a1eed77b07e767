use super::EnrichmentResult;

const SUMMARY_MAX_CHARS: usize = 280;
const MAX_KEYWORDS: usize = 5;

/// Deterministic enrichment used whenever the AI provider is unavailable or
/// fails. Pure and total: no I/O, never errors.
pub fn fallback(title: &str, content: &str, manual_tags: Option<&[String]>) -> EnrichmentResult {
    let full_text = format!("{} {}", title.trim(), content.trim());
    let full_text = full_text.trim();

    let summary = if full_text.chars().count() > SUMMARY_MAX_CHARS {
        let truncated: String = full_text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        full_text.to_string()
    };

    let tags = match manual_tags {
        Some(tags) if !tags.is_empty() => tags.to_vec(),
        _ => keywordize(content),
    };

    EnrichmentResult {
        summary: Some(summary),
        tags: Some(tags),
    }
}

/// Derives up to five pseudo-tags from the content: lowercased tokens with
/// trailing punctuation stripped, at least four characters, alphabetic only,
/// deduplicated in first-seen order.
fn keywordize(content: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for token in content.split_whitespace() {
        let word = token
            .to_lowercase()
            .trim_end_matches(['.', ',', '!', '?'])
            .to_string();

        if word.chars().count() < 4 || !word.chars().all(|c| c.is_alphabetic()) {
            continue;
        }
        if keywords.contains(&word) {
            continue;
        }

        keywords.push(word);
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    if keywords.is_empty() {
        keywords.push("notes".to_string());
    }
    keywords
}
