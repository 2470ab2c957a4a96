//! Utilities over raw RFC-822-style header blocks.
//!
//! Node and revision headers are kept as raw bytes so that everything the
//! engine does not deliberately rewrite survives byte-for-byte. These
//! helpers extract and rewrite individual header lines in place.

/// Returns the value of the `name: value` header line in `header`, if any.
pub fn payload<'a>(header: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let name = name.as_bytes();
    for line in header.split(|&b| b == b'\n') {
        if line.len() > name.len() + 1
            && line.starts_with(name)
            && line[name.len()] == b':'
            && line[name.len() + 1] == b' '
        {
            return Some(&line[name.len() + 2..]);
        }
    }
    None
}

/// Rewrites the `{name}-length` header in `header` to `value`.
///
/// A header already present is rewritten in place. An absent header is
/// appended at the end of the block when `value` is nonzero and left absent
/// when it is zero.
pub fn set_length(name: &str, header: &[u8], value: usize) -> Vec<u8> {
    let prefix = format!("{name}-length: ");
    let mut out = Vec::with_capacity(header.len() + 16);
    let mut replaced = false;
    let mut blank_at = None;
    let mut pos = 0;
    while pos < header.len() {
        let end = header[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i + 1)
            .unwrap_or(header.len());
        let line = &header[pos..end];
        if line.starts_with(prefix.as_bytes()) {
            out.extend_from_slice(prefix.as_bytes());
            out.extend_from_slice(value.to_string().as_bytes());
            out.push(b'\n');
            replaced = true;
        } else {
            if blank_at.is_none() && line == b"\n" {
                blank_at = Some(out.len());
            }
            out.extend_from_slice(line);
        }
        pos = end;
    }
    if !replaced && value > 0 {
        let line = format!("{prefix}{value}\n").into_bytes();
        match blank_at {
            Some(at) => {
                out.splice(at..at, line);
            }
            None => out.extend_from_slice(&line),
        }
    }
    out
}

const CHECKSUM_HEADERS: [&[u8]; 4] = [
    b"Text-content-md5:",
    b"Text-content-sha1:",
    b"Text-copy-source-md5:",
    b"Text-copy-source-sha1:",
];

/// Removes checksum headers from a node header block.
///
/// Rewritten content invalidates the recorded checksums; the engine removes
/// them rather than recomputing.
pub fn strip_checksums(header: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(header.len());
    let mut pos = 0;
    while pos < header.len() {
        let end = header[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i + 1)
            .unwrap_or(header.len());
        let line = &header[pos..end];
        if !CHECKSUM_HEADERS.iter().any(|h| line.starts_with(h)) {
            out.extend_from_slice(line);
        }
        pos = end;
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const NODE_HEADER: &str = "Node-path: branches/testbranch/placeholder\n\
Node-kind: file\n\
Node-action: add\n\
Prop-content-length: 10\n\
Text-content-length: 80\n\
Content-length: 90\n\
\n";

    #[test]
    fn payload_extracts_header_values() {
        let header = NODE_HEADER.as_bytes();
        assert_eq!(
            payload(header, "Node-path").unwrap(),
            b"branches/testbranch/placeholder"
        );
        assert_eq!(payload(header, "Node-kind").unwrap(), b"file");
        assert_eq!(payload(header, "Node-copyfrom-rev"), None);
    }

    #[test]
    fn payload_does_not_match_suffixes_of_longer_names() {
        let header = b"Prop-content-length: 10\nContent-length: 90\n\n";
        assert_eq!(payload(header, "Content-length").unwrap(), b"90");
    }

    #[test]
    fn set_length_rewrites_only_the_requested_header() {
        let after = set_length("Text-content", NODE_HEADER.as_bytes(), 23);
        assert_eq!(
            String::from_utf8(after).unwrap(),
            "Node-path: branches/testbranch/placeholder\n\
Node-kind: file\n\
Node-action: add\n\
Prop-content-length: 10\n\
Text-content-length: 23\n\
Content-length: 90\n\
\n"
        );
    }

    #[test]
    fn set_length_appends_missing_header_when_nonzero() {
        let before = "Node-path: branches/testbranch/placeholder\n\
Node-kind: file\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 90\n\
\n";
        let after = set_length("Text-content", before.as_bytes(), 23);
        assert_eq!(
            String::from_utf8(after).unwrap(),
            "Node-path: branches/testbranch/placeholder\n\
Node-kind: file\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 90\n\
Text-content-length: 23\n\
\n"
        );
    }

    #[test]
    fn set_length_does_not_create_zero_headers() {
        let before = "Node-path: branches/testbranch/placeholder\n\
Node-kind: file\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 90\n\
\n";
        let after = set_length("Text-content", before.as_bytes(), 0);
        assert_eq!(after, before.as_bytes());
    }

    #[test]
    fn strip_checksums_removes_all_four_headers() {
        let header = "Node-path: trunk/a\n\
Text-content-md5: deadbeef\n\
Text-content-sha1: cafebabe\n\
Text-copy-source-md5: 0123\n\
Text-copy-source-sha1: 4567\n\
Text-content-length: 3\n\
\n";
        let stripped = strip_checksums(header.as_bytes());
        assert_eq!(
            String::from_utf8(stripped).unwrap(),
            "Node-path: trunk/a\nText-content-length: 3\n\n"
        );
    }
}
