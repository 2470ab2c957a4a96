//! Structural path surgery: `pop`, `swap`, and `pathrename`.
//!
//! All three rewrite the same three places: `Node-path` headers,
//! `Node-copyfrom-path` headers, and the path part of every line in
//! `svn:mergeinfo` values. The shared driver [`mutate_paths`] is also the
//! substrate for `obscure`.

use std::io::{Read, Write};

use tracing::warn;

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::path::{pop_segment, swap_segments};
use crate::props::Properties;
use crate::range::{MergeinfoRange, SubversionRange};
use crate::{DumpError, Result};

const PATH_HEADERS: [&str; 2] = ["Node-path: ", "Node-copyfrom-path: "];

/// Rewrites the path headers of a node header block through `mutate`.
///
/// Returns `None` when the mutator asks for the node to be dropped.
pub(crate) fn rewrite_header_paths(
    header: &[u8],
    mutate: &dyn Fn(&[u8]) -> Option<Vec<u8>>,
) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(header.len());
    let mut pos = 0;
    while pos < header.len() {
        let end = header[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i + 1)
            .unwrap_or(header.len());
        let line = &header[pos..end];
        pos = end;
        let Some(prefix) = PATH_HEADERS.iter().find(|h| line.starts_with(h.as_bytes())) else {
            out.extend_from_slice(line);
            continue;
        };
        let value_end = if line.ends_with(b"\n") {
            line.len() - 1
        } else {
            line.len()
        };
        let mutated = mutate(&line[prefix.len()..value_end])?;
        out.extend_from_slice(prefix.as_bytes());
        out.extend_from_slice(&mutated);
        out.push(b'\n');
    }
    Some(out)
}

/// Rewrites the path part of each `svn:mergeinfo` line through `mutate`,
/// optionally canonicalizing the revision ranges.
///
/// Lines whose path the mutator declines to rewrite keep their original
/// path; a non-UTF-8 value is left untouched.
pub(crate) fn rewrite_mergeinfo(
    props: &mut Properties,
    mutate: &dyn Fn(&[u8]) -> Option<Vec<u8>>,
    optimize_ranges: bool,
) {
    let Some(value) = props.get("svn:mergeinfo") else {
        return;
    };
    let Ok(text) = std::str::from_utf8(value) else {
        return;
    };
    if text.is_empty() {
        return;
    }
    let mut rewritten = String::new();
    for line in text.trim_end_matches('\n').split('\n') {
        match line.rsplit_once(':') {
            Some((path, ranges)) => {
                let path = mutate(path.as_bytes())
                    .and_then(|p| String::from_utf8(p).ok())
                    .unwrap_or_else(|| path.to_string());
                let ranges = if optimize_ranges {
                    match MergeinfoRange::parse(ranges) {
                        Ok(mut span) => {
                            span.optimize();
                            span.dump()
                        }
                        Err(_) => ranges.to_string(),
                    }
                } else {
                    ranges.to_string()
                };
                rewritten.push_str(&path);
                rewritten.push(':');
                rewritten.push_str(&ranges);
            }
            None => rewritten.push_str(line),
        }
        rewritten.push('\n');
    }
    props.set("svn:mergeinfo", rewritten.into_bytes());
}

/// Drives a pass rewriting node paths, copyfrom paths, and mergeinfo paths
/// through `path_mutator`, with optional committer and content mutation.
pub(crate) fn mutate_paths<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    path_mutator: &dyn Fn(&[u8]) -> Option<Vec<u8>>,
    name_mutator: Option<&dyn Fn(&str) -> String>,
    content_mutator: Option<&dyn Fn(&NodeRecord) -> Vec<u8>>,
    optimize_ranges: bool,
    passempty: bool,
) -> Result<()> {
    let mut prop_hook = |_rev: u64, props: &mut Properties| {
        rewrite_mergeinfo(props, path_mutator, optimize_ranges);
        if let Some(name_mutator) = name_mutator
            && let Some(userid) = props.get_str("svn:author").map(str::to_string)
        {
            props.set("svn:author", name_mutator(&userid).into_bytes());
        }
        Ok(())
    };
    let mut node_hook = |record: &NodeRecord| {
        let Some(header) = rewrite_header_paths(&record.header, path_mutator) else {
            return Ok(Vec::new());
        };
        let content = match content_mutator {
            Some(mutator) => mutator(record),
            None => record.content.clone(),
        };
        let mut all = header;
        all.extend_from_slice(&record.properties);
        all.extend_from_slice(&content);
        Ok(all)
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut node_hook),
            prop_hook: Some(&mut prop_hook),
            passthrough: true,
            passempty,
        },
    )
}

/// Pops the first segment off every path.
pub fn pop<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    let mutator = |path: &[u8]| Some(pop_segment(path));
    mutate_paths(source, out, selection, &mutator, None, None, false, false)
}

// Synthetic replacement for the first node of revision 1: creates the
// standard three-directory layout the swapped paths land in.
const SWAP_LAYOUT: &str = "Node-path: branches\n\
Node-kind: dir\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 10\n\
\n\
PROPS-END\n\
\n\
\n\
Node-path: tags\n\
Node-kind: dir\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 10\n\
\n\
PROPS-END\n\
\n\
\n\
Node-path: trunk\n\
Node-kind: dir\n\
Node-action: add\n\
Prop-content-length: 10\n\
Content-length: 10\n\
\n\
PROPS-END\n\
\n";

/// Exchanges the first two segments of every path, injecting the standard
/// branches/tags/trunk layout in place of revision 1's first node. Paths
/// that collapse to a single segment are dropped.
pub fn swap<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    let mutator = |path: &[u8]| swap_segments(path);
    let mut latched = false;
    let mut prop_hook = |rev: u64, props: &mut Properties| {
        rewrite_mergeinfo(props, &mutator, false);
        if rev == 1 && props.contains("svn:log") {
            props.set("svn:log", b"Synthetic branch-structure creation.\n".to_vec());
        }
        Ok(())
    };
    let mut node_hook = |record: &NodeRecord| {
        if record.revision == 1 && !latched {
            latched = true;
            if record
                .path()
                .is_some_and(|p| matches!(p, b"trunk" | b"tags" | b"branches"))
            {
                warn!(
                    path = %String::from_utf8_lossy(record.path().unwrap_or_default()),
                    "standard layout already present; injecting it anyway"
                );
            }
            return Ok(SWAP_LAYOUT.as_bytes().to_vec());
        }
        let Some(header) = rewrite_header_paths(&record.header, &mutator) else {
            return Ok(Vec::new());
        };
        let mut all = header;
        all.extend_from_slice(&record.properties);
        all.extend_from_slice(&record.content);
        Ok(all)
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut node_hook),
            prop_hook: Some(&mut prop_hook),
            passthrough: true,
            passempty: true,
        },
    )
}

/// Regular-expression replace over every path; `to` may carry `${n}`
/// back-references.
pub fn pathrename<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    from: &str,
    to: &str,
) -> Result<()> {
    let re = regex::bytes::Regex::new(from)
        .map_err(|err| DumpError::usage(format!("illegal regular expression: {err}")))?;
    let to = to.as_bytes().to_vec();
    let mutator =
        move |path: &[u8]| Some(re.replace_all(path, to.as_slice()).into_owned());
    mutate_paths(source, out, selection, &mutator, None, None, false, true)
}
