//! Untrusted path fragment reduction.

/// Reduce an untrusted path or name to its final component.
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// remains: an empty component, `.`, `..`, or anything containing NUL.
#[must_use]
pub fn basename(raw: &str) -> Option<&str> {
    let candidate = raw
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    if candidate.is_empty() || candidate == "." || candidate == ".." || candidate.contains('\0') {
        None
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::basename;

    #[test]
    fn keeps_final_component() {
        assert_eq!(basename("clip.mp4"), Some("clip.mp4"));
        assert_eq!(basename("/srv/downloads/abc/clip.mp4"), Some("clip.mp4"));
        assert_eq!(basename(r"C:\worker\out\photo 1.jpg"), Some("photo 1.jpg"));
        assert_eq!(basename("../../etc/passwd"), Some("passwd"));
        assert_eq!(basename("session/"), Some("session"));
    }

    #[test]
    fn rejects_empty_and_dot_components() {
        for raw in ["", "/", "\\", ".", "..", "a/..", "../", "bad\0name"] {
            assert_eq!(basename(raw), None, "{raw:?}");
        }
    }
}
