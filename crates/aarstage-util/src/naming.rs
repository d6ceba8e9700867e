//! Filesystem-safe path segments and task names derived from coordinates.

/// Characters that are illegal in a path segment on at least one supported OS.
pub const ILLEGAL_PATH_CHARS: [char; 9] = ['%', '<', '>', ':', '"', '/', '?', '*', '\\'];

/// Replacement for illegal characters and for trailing dots/spaces.
pub const SUBSTITUTE: char = '@';

/// Normalize one coordinate component into a safe path segment.
///
/// Every illegal character becomes [`SUBSTITUTE`]; each trailing `.` or space
/// is also replaced so that `"1.0."` and `"1.0"` stay distinct. The function
/// is total and idempotent. An empty input cannot be made safe and is returned
/// unchanged with a warning.
pub fn normalize_segment(segment: &str) -> String {
    if segment.is_empty() {
        tracing::warn!("cannot normalize an empty path segment, keeping it as is");
        return String::new();
    }

    let replaced: String = segment
        .chars()
        .map(|c| {
            if ILLEGAL_PATH_CHARS.contains(&c) {
                SUBSTITUTE
            } else {
                c
            }
        })
        .collect();

    let kept = replaced.trim_end_matches(|c: char| c == '.' || c == ' ');
    // Dots and spaces are single-byte, so the byte difference is the char count.
    let stripped = replaced.len() - kept.len();
    if stripped == 0 {
        return replaced;
    }

    let mut normalized = String::with_capacity(replaced.len());
    normalized.push_str(kept);
    normalized.extend(std::iter::repeat(SUBSTITUTE).take(stripped));
    normalized
}

/// Convert free text into an upper camel-case identifier.
///
/// Words are split on any non-alphanumeric character and each word gets its
/// first letter upper-cased: `"com.example:my-lib:1.0"` becomes
/// `"ComExampleMyLib10"`.
pub fn to_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
