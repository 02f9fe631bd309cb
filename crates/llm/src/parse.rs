//! Tolerant extraction of a JSON object from free-form model output.
//!
//! Models asked for "only JSON" still wrap it in markdown fences or
//! append commentary. The extractor strips fences, tries a direct
//! parse, then scans for the first balanced top-level object.

use serde_json::Value;

use crate::error::LlmError;

/// Max characters kept from each end of the input in a parse-error
/// diagnostic.
const EXCERPT_CHARS: usize = 120;

/// Parse the single JSON object a model response is supposed to
/// contain. Handles fenced code blocks and trailing commentary; raises
/// a parse error carrying a bounded excerpt when no balanced object is
/// found.
pub fn parse_llm_json(response: &str) -> Result<Value, LlmError> {
    let candidate = strip_code_fence(response.trim());

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        if value.is_object() {
            return Ok(value);
        }
    }

    if let Some(object) = balanced_object(candidate) {
        if let Ok(value) = serde_json::from_str::<Value>(object) {
            return Ok(value);
        }
    }

    Err(LlmError::Parse(format!(
        "no parseable JSON object in model output: {}",
        excerpt(response)
    )))
}

/// Strip a leading/trailing markdown code fence (``` or ```json).
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag on the opening fence line.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Find the first balanced top-level `{…}` by walking brace depth and
/// quoted-string state (with escape handling). Recovers JSON followed
/// by trailing prose.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Bounded head/tail excerpt for diagnostics, safe on any char content.
fn excerpt(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= EXCERPT_CHARS * 2 {
        return text.to_string();
    }
    let head: String = chars[..EXCERPT_CHARS].iter().collect();
    let tail: String = chars[chars.len() - EXCERPT_CHARS..].iter().collect();
    format!("{head} … {tail}")
}
