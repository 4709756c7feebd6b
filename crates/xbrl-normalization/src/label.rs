//! Label shortening for rendered messages.

/// Last `/`-separated segment, whitespace collapsed, stray quotes trimmed.
pub fn short_label(label: &str) -> String {
    let segment = label
        .split('/')
        .map(str::trim)
        .rfind(|part| !part.is_empty())
        .unwrap_or(label);
    let collapsed = segment.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(|c| c == ' ' || c == '"').to_string()
}

/// Truncates to at most `max_chars` characters, ending with `…` when cut.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let kept: String = label.chars().take(max_chars - 1).collect();
    format!("{}…", kept.trim_end())
}

/// Shortened and bounded label ready for insertion into message text.
pub fn display_label(label: &str, max_chars: usize) -> String {
    truncate_label(&short_label(label), max_chars)
}

/// Removes a leading `"{table_id}:"` or `"{table_id} -"` catalog prefix.
pub fn strip_table_prefix<'a>(label: &'a str, table_id: &str) -> &'a str {
    let trimmed = label.trim();
    if table_id.is_empty() {
        return trimmed;
    }
    let Some(rest) = trimmed.strip_prefix(table_id) else {
        return trimmed;
    };
    let rest = rest.trim_start();
    rest.strip_prefix(':')
        .or_else(|| rest.strip_prefix('-'))
        .or_else(|| rest.strip_prefix('–'))
        .map_or(trimmed, str::trim_start)
}
