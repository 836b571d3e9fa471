/// Longest canonical key and display name, in characters.
pub const MAX_NAME_LEN: usize = 40;

/// Turns free text into the canonical key used to claim a group name.
///
/// Whitespace runs become single hyphens, anything outside `[a-z0-9-]` is
/// dropped, hyphen runs collapse, and the result carries no leading or
/// trailing hyphen. Never fails: an empty string means the input had nothing
/// usable and must be rejected by the caller.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let mut key = String::with_capacity(lowered.len().min(MAX_NAME_LEN));
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !key.is_empty() {
                key.push('-');
            }
            pending_hyphen = false;
            key.push(c);
        }
    }

    // key is pure ASCII here, so byte truncation is char truncation
    key.truncate(MAX_NAME_LEN);
    while key.ends_with('-') {
        key.pop();
    }
    key
}

/// Trims a display name and caps it at [`MAX_NAME_LEN`] characters.
pub fn display_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let capped: String = trimmed.chars().take(MAX_NAME_LEN).collect();
    Some(capped.trim_end().to_string())
}

pub fn validate_nickname(nickname: &str) -> Result<String, String> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err("Nickname cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Nickname cannot exceed {MAX_NAME_LEN} characters"
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        let bytes = key.as_bytes();
        let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
        key.len() <= MAX_NAME_LEN
            && edge_ok(bytes[0])
            && edge_ok(bytes[bytes.len() - 1])
            && bytes.iter().all(|&b| edge_ok(b) || b == b'-')
            && !key.contains("--")
    }

    const SAMPLES: &[&str] = &[
        "",
        " ",
        "---",
        "  Magnus Home!! ",
        "magnus home",
        "MAGNUS\tHOME",
        "a ! b",
        "a!b",
        "--Leading and trailing--",
        "Ünïcödé Strasse 5",
        "émoji 🏠 house",
        "tabs\t\tand\nnewlines",
        "one-two--three---four",
        "0123456789012345678901234567890123456789extra",
        "abcdefghijklmnopqrstuvwxyzabcdefghijklm nopq",
        "   -  -  -   x",
        "İstanbul flat",
    ];

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Magnus Home!! "), "magnus-home");
        assert_eq!(normalize("magnus home"), "magnus-home");
        assert_eq!(normalize("MAGNUS\tHOME"), "magnus-home");
    }

    #[test]
    fn test_normalize_empty_results() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("---"), "");
        assert_eq!(normalize("!!! ???"), "");
    }

    #[test]
    fn test_normalize_drops_invalid_chars_between_words() {
        assert_eq!(normalize("a ! b"), "a-b");
        assert_eq!(normalize("a!b"), "ab");
        assert_eq!(normalize("one-two--three---four"), "one-two-three-four");
    }

    #[test]
    fn test_normalize_truncates_without_trailing_hyphen() {
        let key = normalize("abcdefghijklmnopqrstuvwxyzabcdefghijklm nopq");
        assert_eq!(key, "abcdefghijklmnopqrstuvwxyzabcdefghijklm");
        assert_eq!(
            normalize("0123456789012345678901234567890123456789extra").len(),
            MAX_NAME_LEN
        );
    }

    #[test]
    fn test_normalize_idempotent_and_canonical() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
            assert!(is_canonical(&once), "bad key {once:?} for {sample:?}");
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("  Magnus Home  ").as_deref(), Some("Magnus Home"));
        assert_eq!(display_name("   "), None);
        let long = "x".repeat(60);
        assert_eq!(display_name(&long).map(|s| s.chars().count()), Some(MAX_NAME_LEN));
    }

    #[test]
    fn test_validate_nickname() {
        assert_eq!(validate_nickname("  Ada ").unwrap(), "Ada");
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname(&"n".repeat(41)).is_err());
    }
}
