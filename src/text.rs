/// Canonicalize label text for matching: every whitespace character is removed.
///
/// `None` normalizes to an empty string.
pub fn normalize(text: Option<&str>) -> String {
    text.unwrap_or_default().chars().filter(|c| !c.is_whitespace()).collect()
}
