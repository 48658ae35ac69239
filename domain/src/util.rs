//! Shared utility functions.

use regex::Regex;
use std::sync::LazyLock;

/// Secret patterns and their replacements
#[allow(clippy::expect_used)]
static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(sk-[A-Za-z0-9_-]{8})[A-Za-z0-9_-]+", "${1}..."),
        (r"(key-[A-Za-z0-9]{8})[A-Za-z0-9]+", "${1}..."),
        (r"(AIza[A-Za-z0-9_-]{8})[A-Za-z0-9_-]+", "${1}..."),
        (r"(ya29\.)[A-Za-z0-9_.-]+", "${1}..."),
        (r"(Bearer\s+)[A-Za-z0-9_./+-]+", "${1}[REDACTED]"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

/// Mask API keys and bearer tokens embedded in error text.
///
/// Keys keep a short recognizable prefix followed by `...`; bearer tokens
/// are replaced entirely.
pub fn redact_secrets(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Format an integer with `,` thousands separators (`1234567` -> `1,234,567`)
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_openai_key() {
        let text = "Incorrect API key provided: sk-proj-abcdefghijklmnop";
        assert_eq!(
            redact_secrets(text),
            "Incorrect API key provided: sk-proj-abc..."
        );
    }

    #[test]
    fn redact_google_and_oauth_tokens() {
        let text = "key=AIzaSyA1234567890abcdef token ya29.a0AfH6SMB-xyz";
        let redacted = redact_secrets(text);
        assert!(redacted.contains("AIzaSyA12345..."));
        assert!(redacted.contains("ya29...."));
        assert!(!redacted.contains("abcdef"));
        assert!(!redacted.contains("SMB-xyz"));
    }

    #[test]
    fn redact_bearer_token() {
        assert_eq!(
            redact_secrets("Authorization: Bearer abc.def/ghi+jkl"),
            "Authorization: Bearer [REDACTED]"
        );
    }

    #[test]
    fn redact_leaves_plain_text() {
        let text = "503 Service Unavailable: model overloaded";
        assert_eq!(redact_secrets(text), text);
    }

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        // 'の' is 3 bytes (U+306E): bytes 0xe3 0x81 0xae
        let s = "あのね"; // 9 bytes: 3+3+3
        // Cutting at byte 4 would land inside 'の', should back up to 3
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }
}
