//! Node filtering by path: `sift` and `expunge`.

use std::io::{Read, Write};

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::range::SubversionRange;
use crate::Result;

use super::compile_patterns;

/// Keeps only nodes whose path matches one of `patterns`. A revision left
/// with no nodes loses its revision record as well.
pub fn sift<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    patterns: &[String],
) -> Result<()> {
    let regexps = compile_patterns(patterns)?;
    let mut hook = |record: &NodeRecord| {
        let matched = record
            .path()
            .is_some_and(|p| regexps.iter().any(|r| r.is_match(p)));
        if matched {
            Ok(record.serialize())
        } else {
            Ok(Vec::new())
        }
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut hook),
            ..ReportOptions::default()
        },
    )
}

/// Drops nodes whose path matches one of `patterns` (the opposite of
/// `sift`). A revision left with no nodes loses its revision record as
/// well.
///
/// This is the one command honoring node-granular selections: with a spec
/// like `-r 2.1:2.3`, only the named nodes are candidates for deletion.
pub fn expunge<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    patterns: &[String],
) -> Result<()> {
    let regexps = compile_patterns(patterns)?;
    let node_selection = selection.clone();
    let mut hook = |record: &NodeRecord| {
        let matched = record
            .path()
            .is_some_and(|p| regexps.iter().any(|r| r.is_match(p)));
        if matched && node_selection.contains_node(record.revision, record.index) {
            Ok(Vec::new())
        } else {
            Ok(record.serialize())
        }
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut hook),
            ..ReportOptions::default()
        },
    )
}
