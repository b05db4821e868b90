//! Slug derivation
//!
//! identity = lower-case, trim, collapse every run of non-alphanumeric
//! characters into a single `-`, then drop leading and trailing `-`.

use std::sync::OnceLock;

use regex::Regex;

/// Separator placed between alphanumeric runs
pub const SEPARATOR: char = '-';

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static pattern is valid"))
}

/// Derives a record identity from a human label.
///
/// Returns an empty string when the label has no alphanumeric characters.
pub fn slugify(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let replaced = non_alphanumeric().replace_all(&lowered, "-");
    replaced.trim_matches(SEPARATOR).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(slugify("My First Post"), "my-first-post");
    }

    #[test]
    fn test_runs_collapse() {
        assert_eq!(slugify("  Rust -- & __ WebAssembly!! "), "rust-webassembly");
    }

    #[test]
    fn test_digits_kept() {
        assert_eq!(slugify("Top 10 Tips (2024)"), "top-10-tips-2024");
    }

    #[test]
    fn test_unicode_letters_kept() {
        assert_eq!(slugify("Café Über"), "café-über");
    }

    #[test]
    fn test_no_alphanumerics_is_empty() {
        assert_eq!(slugify(" --- !! "), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_idempotent() {
        let once = slugify("Hello, World: Again");
        assert_eq!(slugify(&once), once);
    }
}
