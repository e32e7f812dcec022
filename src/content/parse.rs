/// Helpers for turning raw model output into a task list.
use anyhow::{bail, Result};

/// Cap on tasks taken from one response.
pub const MAX_TASKS: usize = 8;

/// Strip code fences, normalize smart quotes and drop trailing commas.
pub fn sanitize(raw: &str) -> String {
    let cleaned = raw
        .replace("```json", "")
        .replace("```", "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    remove_trailing_commas(&cleaned).trim().to_string()
}

/// Remove commas that directly precede `}` or `]`, outside strings.
pub fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escape_next {
            escape_next = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Byte range of the first balanced `open ... close` span, string aware.
fn balanced_span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = text.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

fn strings_of(value: &serde_json::Value) -> Option<Vec<String>> {
    match value {
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        serde_json::Value::Object(map) => map.get("tasks").and_then(strings_of),
        _ => None,
    }
}

/// Strip list markers such as `- `, `* `, `1. ` or `2) `.
fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return rest.trim();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }
    line
}

/// Extract task strings from a model response.
///
/// Tries a JSON array, then an object with a `tasks` array, then falls back
/// to list-formatted lines.
pub fn extract_tasks(raw: &str) -> Result<Vec<String>> {
    let text = sanitize(raw);
    if text.is_empty() {
        bail!("empty response");
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some((start, end)) = balanced_span(&text, open, close) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[start..end]) {
                if let Some(tasks) = strings_of(&value).filter(|t| !t.is_empty()) {
                    return Ok(tasks.into_iter().take(MAX_TASKS).collect());
                }
            }
        }
    }

    let listed: Vec<String> = raw
        .lines()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with(['-', '*', '•']) || t.chars().next().is_some_and(|c| c.is_ascii_digit())
        })
        .map(|l| strip_marker(l).to_string())
        .filter(|l| !l.is_empty())
        .take(MAX_TASKS)
        .collect();

    if listed.is_empty() {
        bail!("no task list found in response");
    }
    Ok(listed)
}
