//! Path-segment helpers shared by the structural-shape commands.
//!
//! Paths in a dump stream are raw bytes; these helpers operate bytewise so
//! non-UTF-8 paths survive untouched where they are not rewritten.

/// Removes the first segment of `path`.
///
/// Returns an empty path for a single-segment input.
pub(crate) fn pop_segment(path: &[u8]) -> Vec<u8> {
    match path.iter().position(|&b| b == b'/') {
        Some(idx) => path[idx + 1..].to_vec(),
        None => Vec::new(),
    }
}

/// Exchanges the first two segments of `path`.
///
/// Returns `None` for a single-segment path; such operations are dropped by
/// the caller because the swapped directory is created implicitly under its
/// new parent.
pub(crate) fn swap_segments(path: &[u8]) -> Option<Vec<u8>> {
    let mut parts: Vec<&[u8]> = path.split(|&b| b == b'/').collect();
    if parts.len() < 2 {
        return None;
    }
    parts.swap(0, 1);
    Some(parts.join(&b'/'))
}

/// Applies `f` to each `/`-separated segment of `path`, rejoining the
/// results.
pub(crate) fn map_segments(path: &[u8], mut f: impl FnMut(&[u8]) -> Vec<u8>) -> Vec<u8> {
    let parts: Vec<Vec<u8>> = path.split(|&b| b == b'/').map(|seg| f(seg)).collect();
    parts.join(&b'/')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn pop_segment_removes_the_first_component() {
        assert_eq!(pop_segment(b"project/trunk/a.c"), b"trunk/a.c");
        assert_eq!(pop_segment(b"trunk"), b"");
    }

    #[test]
    fn swap_segments_exchanges_the_top_two() {
        assert_eq!(
            swap_segments(b"project/trunk/a.c").unwrap(),
            b"trunk/project/a.c"
        );
        assert_eq!(swap_segments(b"a/b").unwrap(), b"b/a");
        assert_eq!(swap_segments(b"solo"), None);
    }

    #[test]
    fn swap_twice_is_the_identity_on_deep_paths() {
        let path = b"project/trunk/src/a.c";
        let swapped = swap_segments(path).unwrap();
        assert_eq!(swap_segments(&swapped).unwrap(), path);
    }

    #[test]
    fn map_segments_visits_every_component() {
        let mapped = map_segments(b"a/b/c", |seg| seg.to_ascii_uppercase());
        assert_eq!(mapped, b"A/B/C");
    }
}
