pub mod cover_letter;
pub mod job_posting;

/// Record ids double as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_id() {
        assert!(is_safe_id("job_20250101_000000_ab12cd34"));
        assert!(is_safe_id("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("../etc/passwd"));
        assert!(!is_safe_id("a/b"));
    }
}
