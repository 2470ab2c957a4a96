//! The `obscure` command: replace path segments and committer IDs with
//! generated names.

use std::cell::RefCell;
use std::io::{Read, Write};

use crate::dumpfile::{DumpfileSource, NodeRecord};
use crate::names::NameSequence;
use crate::path::map_segments;
use crate::range::SubversionRange;
use crate::Result;

use super::paths::mutate_paths;

const LITERAL_SEGMENTS: [&[u8]; 3] = [b"trunk", b"tags", b"branches"];

/// Replaces every path segment (except the standard layout literals) and
/// every committer ID with a consistent generated name. Symbolic-link
/// targets are rewritten in place up to the shorter of the old and new
/// lengths; mergeinfo ranges are canonicalized on the way through.
pub fn obscure<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    let seq = RefCell::new(NameSequence::new());

    let obscure_path = |path: &[u8]| -> Vec<u8> {
        map_segments(path, |segment| {
            if segment.is_empty() || LITERAL_SEGMENTS.contains(&segment) {
                return segment.to_vec();
            }
            match std::str::from_utf8(segment) {
                Ok(token) => seq.borrow_mut().obscure_token(token).into_bytes(),
                Err(_) => segment.to_vec(),
            }
        })
    };

    let path_mutator = |path: &[u8]| Some(obscure_path(path));

    let name_mutator = |userid: &str| seq.borrow_mut().obscure_token(userid).to_lowercase();

    // Link targets cannot change length (the length headers are left
    // alone), so the rewritten target is copied over the old one up to the
    // shorter of the two.
    let content_mutator = |record: &NodeRecord| {
        let mut content = record.content.clone();
        if let Some(target) = record.content.strip_prefix(b"link ") {
            let obscured = obscure_path(target);
            let n = target.len().min(obscured.len());
            content[5..5 + n].copy_from_slice(&obscured[..n]);
        }
        content
    };

    mutate_paths(
        source,
        out,
        selection,
        &path_mutator,
        Some(&name_mutator),
        Some(&content_mutator),
        true,
        true,
    )
}
