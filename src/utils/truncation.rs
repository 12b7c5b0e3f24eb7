const MAX_OUTPUT_LENGTH: usize = 15_000;
const MAX_ERROR_LENGTH: usize = 2_000;

/// Largest index <= `idx` that sits on a char boundary of `s`.
fn floor_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut i = idx;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest index >= `idx` that sits on a char boundary of `s`.
fn ceil_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Bound a captured stdout/stderr stream, keeping its head and tail.
pub fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_LENGTH {
        output.to_string()
    } else {
        let half = MAX_OUTPUT_LENGTH / 2;
        let start = &output[..floor_boundary(output, half)];
        let end = &output[ceil_boundary(output, output.len() - half)..];
        format!(
            "{}\n\n... [truncated {} chars] ...\n\n{}",
            start,
            output.len() - start.len() - end.len(),
            end
        )
    }
}

pub fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LENGTH {
        error.to_string()
    } else {
        format!("{}...", &error[..floor_boundary(error, MAX_ERROR_LENGTH)])
    }
}

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
