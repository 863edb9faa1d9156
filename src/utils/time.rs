use chrono::Utc;

/// Filesystem-safe timestamp used to name report files.
pub fn timestamp_slug() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_is_filesystem_safe() {
        let slug = timestamp_slug();
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
