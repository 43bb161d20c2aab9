//! Helpers for colon-namespaced keys (`root:child:leaf`).
//!
//! Pure string functions, no network access.

/// Separator between namespace segments
pub const KEY_SEPARATOR: char = ':';

/// Last segment of a namespaced key.
///
/// ```
/// use fusion_kv::utils::keys::get_end_key;
/// assert_eq!(get_end_key("a:b:c"), "c");
/// assert_eq!(get_end_key("plain"), "plain");
/// ```
pub fn get_end_key(key: &str) -> &str {
    key.rsplit(KEY_SEPARATOR).next().unwrap_or(key)
}

/// First segment of a namespaced key.
pub fn get_start_key(key: &str) -> &str {
    key.split(KEY_SEPARATOR).next().unwrap_or(key)
}

/// Everything before `:<end>`.
///
/// Returns `None` when `key` does not end with the separator followed by `end`.
pub fn get_prefix_key<'a>(key: &'a str, end: &str) -> Option<&'a str> {
    key.strip_suffix(end)?.strip_suffix(KEY_SEPARATOR)
}

/// Segments of `key` that follow `root`.
///
/// `get_end_keys("a", "a:b:c")` yields `["b", "c"]`. Returns `None` when
/// `key` is not under `root` or nothing follows it.
pub fn get_end_keys<'a>(root: &str, key: &'a str) -> Option<Vec<&'a str>> {
    let rest = key.strip_prefix(root)?;
    let rest = if root.is_empty() || root.ends_with(KEY_SEPARATOR) || rest.is_empty() {
        rest
    } else {
        rest.strip_prefix(KEY_SEPARATOR)?
    };
    if rest.is_empty() {
        return None;
    }
    Some(rest.split(KEY_SEPARATOR).collect())
}

/// Join segments into a namespaced key, skipping empty segments.
pub fn join_key<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments.iter().map(AsRef::as_ref).filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push(KEY_SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

/// Escape glob metacharacters so `text` matches itself in a SCAN pattern.
pub fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
