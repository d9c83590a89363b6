//! Utility modules shared by the pipeline and the CLI.

pub mod exec;
pub mod mime;

/// Make a string safe as one file-name component.
///
/// Path separators, control characters and characters Windows rejects
/// become `-`; surrounding whitespace and dots are trimmed.
pub fn sanitize_file_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    replaced.trim().trim_matches('.').trim().to_string()
}

/// Format count with noun, handling pluralization
///
/// - `plural_count(1, "artifact")` -> `"1 artifact"`
/// - `plural_count(5, "artifact")` -> `"5 artifacts"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("Acme"), "Acme");
        assert_eq!(sanitize_file_component("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_file_component("  ..x\ty.. "), "x-y");
        assert_eq!(sanitize_file_component("Acme Co."), "Acme Co");
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "file"), "0 files");
        assert_eq!(plural_count(1, "file"), "1 file");
    }
}
