/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Same text once case and whitespace are ignored.
pub fn is_duplicate(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
