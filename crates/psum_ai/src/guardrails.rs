use psum_core::error::AppError;

/// Strip a surrounding markdown code fence (```html ... ```) if the model added one.
pub fn strip_code_fences(output: &str) -> &str {
    let t = output.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Reject outputs that are not HTML. Formatted summaries must contain at least one element.
pub fn enforce_html(output: &str) -> Result<(), AppError> {
    let t = output.trim();
    if t.is_empty() {
        return Err(AppError::new("AI_SCHEMA_VIOLATION", "Formatted output is empty")
            .with_retryable(true));
    }
    if !contains_element(t) {
        return Err(AppError::new(
            "AI_SCHEMA_VIOLATION",
            "Formatted output does not contain HTML markup",
        )
        .with_details(format!("starts_with={}", t.chars().take(60).collect::<String>()))
        .with_retryable(true));
    }
    Ok(())
}

fn contains_element(text: &str) -> bool {
    // Minimal check: an opening tag `<x...>` whose name starts with a letter or `!`.
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'<' {
            continue;
        }
        let Some(&next) = bytes.get(i + 1) else {
            break;
        };
        if (next.is_ascii_alphabetic() || next == b'!') && text[i..].contains('>') {
            return true;
        }
    }
    false
}
