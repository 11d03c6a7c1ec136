use std::sync::OnceLock;

use regex::Regex;

const MAX_KEY_LEN: usize = 40;

fn patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"[^a-z0-9\s]").expect("valid regex"),
            Regex::new(r"\s+").expect("valid regex"),
            Regex::new(r"_+").expect("valid regex"),
        )
    })
}

/// Derives a snake_case field key from a question label.
pub fn generate_key(label: &str) -> String {
    let (invalid, whitespace, underscores) = patterns();
    let lowered = label.to_lowercase();
    let cleaned = invalid.replace_all(&lowered, "");
    let joined = whitespace.replace_all(&cleaned, "_");
    let collapsed = underscores.replace_all(&joined, "_");
    collapsed
        .trim_matches('_')
        .chars()
        .take(MAX_KEY_LEN)
        .collect()
}
