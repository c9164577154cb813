/// File extensions stripped from the final path segment before splitting
pub const KNOWN_EXTENSIONS: &[&str] = &[
    ".mp4", ".webm", ".m3u8", ".gif", ".webp", ".jpg", ".jpeg", ".png",
];

/// Separator between the base filename and its encoding-variant tag
const VARIANT_SEPARATOR: char = '_';

/// Derives the content identity of an asset reference
///
/// # Derivation Steps
///
/// 1. Drop any query string or fragment
/// 2. Take the final path segment
/// 3. Strip a known file extension (case-insensitive)
/// 4. Keep everything before the first `_`
///
/// Returns `None` for empty references and for references whose derivation
/// ends in an empty identity. Callers treat `None` as "no identity-level
/// dedup available", never as an error.
///
/// # Examples
///
/// ```
/// use sumi_harvest::asset::resolve_identity;
///
/// let a = resolve_identity("https://img-9gag-fun.9cache.com/photo/aE0jr5o_460sv.mp4");
/// let b = resolve_identity("https://img-9gag-fun.9cache.com/photo/aE0jr5o_460svav1.mp4");
/// assert_eq!(a, Some("aE0jr5o".to_string()));
/// assert_eq!(a, b);
/// assert_eq!(resolve_identity(""), None);
/// ```
pub fn resolve_identity(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let without_query = reference
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let segment = without_query.rsplit('/').next().unwrap_or_default();
    let stem = strip_known_extension(segment);

    let identity = stem.split(VARIANT_SEPARATOR).next().unwrap_or_default();
    if identity.is_empty() {
        None
    } else {
        Some(identity.to_string())
    }
}

/// Removes a trailing known extension from a filename, if present
fn strip_known_extension(segment: &str) -> &str {
    let lower = segment.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &segment[..segment.len() - ext.len()])
        .unwrap_or(segment)
}
