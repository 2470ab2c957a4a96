//! The `renumber` command.
//!
//! Rewrites every `Revision-number` to a contiguous sequence from a
//! configurable base, patching `Node-copyfrom-rev` headers and the revision
//! numbers inside `svn:mergeinfo` values through the same mapping. This
//! walks the stream with its own record loop rather than the generic
//! report driver because mergeinfo values have to be rewritten inline and
//! the affected length headers recomputed before the record is flushed.

use std::collections::HashMap;
use std::io::{Read, Write};

use tracing::warn;

use crate::dumpfile::DumpfileSource;
use crate::header::{payload, set_length};
use crate::props::Properties;
use crate::source::LineBufferedSource;
use crate::{DumpError, Result};

fn parse_number(value: &[u8], lineno: u64, what: &str) -> Result<u64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| DumpError::parse(lineno, format!("malformed {what}")))
}

fn renumber_ranges(ranges: &str, renumbering: &HashMap<u64, u64>) -> String {
    let mut out = String::new();
    let mut digits = String::new();
    let mut flush = |digits: &mut String, out: &mut String| {
        if digits.is_empty() {
            return;
        }
        match digits.parse::<u64>().ok().and_then(|n| renumbering.get(&n)) {
            Some(new) => out.push_str(&new.to_string()),
            None => {
                warn!(revision = %digits, "mergeinfo references a revision not in the stream");
                out.push_str(digits);
            }
        }
        digits.clear();
    };
    for c in ranges.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            flush(&mut digits, &mut out);
            out.push(c);
        }
    }
    flush(&mut digits, &mut out);
    out
}

fn renumber_mergeinfo(value: &[u8], renumbering: &HashMap<u64, u64>) -> Vec<u8> {
    let Ok(text) = std::str::from_utf8(value) else {
        return value.to_vec();
    };
    if text.is_empty() {
        return value.to_vec();
    }
    let mut rewritten = String::new();
    for line in text.trim_end_matches('\n').split('\n') {
        match line.rsplit_once(':') {
            Some((path, ranges)) => {
                rewritten.push_str(path);
                rewritten.push(':');
                rewritten.push_str(&renumber_ranges(ranges, renumbering));
            }
            None => rewritten.push_str(line),
        }
        rewritten.push('\n');
    }
    rewritten.into_bytes()
}

// Reads the rest of one record (header lines, property block, content),
// patching copyfrom and mergeinfo revisions, and flushes it to `out` with
// corrected length headers.
fn emit_record_rest<R: Read, W: Write>(
    lbs: &mut LineBufferedSource<R>,
    out: &mut W,
    mut header: Vec<u8>,
    renumbering: &HashMap<u64, u64>,
) -> Result<()> {
    let mut prop_len = 0usize;
    let mut text_len: Option<usize> = None;
    loop {
        let line = lbs.readline()?;
        if line.is_empty() {
            return Err(DumpError::parse(
                lbs.line_number(),
                "unexpected EOF in record header",
            ));
        }
        if line == b"\n" {
            break;
        }
        if let Some(v) = payload(&line, "Node-copyfrom-rev") {
            let old = parse_number(v, lbs.line_number(), "Node-copyfrom-rev")?;
            let new = renumbering.get(&old).ok_or_else(|| {
                DumpError::parse(
                    lbs.line_number(),
                    format!("Node-copyfrom-rev {old} precedes any revision header"),
                )
            })?;
            header.extend_from_slice(format!("Node-copyfrom-rev: {new}\n").as_bytes());
            continue;
        }
        if let Some(v) = payload(&line, "Prop-content-length") {
            prop_len = parse_number(v, lbs.line_number(), "Prop-content-length")? as usize;
        }
        if let Some(v) = payload(&line, "Text-content-length") {
            text_len = Some(parse_number(v, lbs.line_number(), "Text-content-length")? as usize);
        }
        header.extend_from_slice(&line);
    }
    let mut props_bytes = Vec::new();
    if prop_len > 0 {
        let mut props = Properties::parse(lbs)?;
        if let Some(mergeinfo) = props.get("svn:mergeinfo") {
            let rewritten = renumber_mergeinfo(mergeinfo, renumbering);
            props.set("svn:mergeinfo", rewritten);
        }
        props_bytes = props.serialize();
        header = set_length("Prop-content", &header, props_bytes.len());
        header = set_length(
            "Content",
            &header,
            props_bytes.len() + text_len.unwrap_or(0),
        );
    }
    out.write_all(&header)?;
    out.write_all(b"\n")?;
    out.write_all(&props_bytes)?;
    if let Some(n) = text_len {
        out.write_all(&lbs.read_bytes(n)?)?;
    }
    Ok(())
}

/// Renumbers all revisions to a contiguous sequence starting at `base`,
/// patching copyfrom headers and mergeinfo values as required. The whole
/// stream is processed; any selection is ignored.
pub fn renumber<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    base: u64,
) -> Result<()> {
    let lbs = &mut source.lbs;
    let mut renumbering: HashMap<u64, u64> = HashMap::new();
    let mut counter = base;
    loop {
        let line = lbs.readline()?;
        if line.is_empty() {
            return Ok(());
        }
        if let Some(v) = payload(&line, "Revision-number") {
            let old = parse_number(v, lbs.line_number(), "Revision-number")?;
            renumbering.insert(old, counter);
            let header = format!("Revision-number: {counter}\n").into_bytes();
            counter += 1;
            emit_record_rest(lbs, out, header, &renumbering)?;
        } else if line.starts_with(b"Node-") {
            emit_record_rest(lbs, out, line, &renumbering)?;
        } else {
            // Preamble lines and inter-record whitespace pass verbatim.
            out.write_all(&line)?;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;
    use crate::testkit::{DumpBuilder, NodeSpec};

    fn fixture() -> Vec<u8> {
        DumpBuilder::new()
            .revision(0, &[("svn:date", "2011-11-30T16:40:02.180831Z")])
            .revision(1, &[("svn:log", "one\n"), ("svn:author", "alice")])
            .node(NodeSpec::dir_add("trunk"))
            .revision(2, &[("svn:log", "two\n"), ("svn:author", "alice")])
            .node(NodeSpec::file_add("trunk/a.txt", b"hello\n"))
            .revision(
                3,
                &[
                    ("svn:log", "three\n"),
                    ("svn:author", "bob"),
                ],
            )
            .node(
                NodeSpec::dir_add("branches/b1")
                    .with_copyfrom(2, "trunk")
                    .with_props(&[("svn:mergeinfo", "/trunk:1-2\n")]),
            )
            .build()
    }

    fn run(base: u64) -> String {
        let mut source = DumpfileSource::new(Cursor::new(fixture()));
        let mut out = Vec::new();
        renumber(&mut source, &mut out, base).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn revisions_become_contiguous_from_zero() {
        let text = run(0);
        for rev in 0..=3 {
            assert!(text.contains(&format!("Revision-number: {rev}\n")));
        }
    }

    #[test]
    fn base_offsets_the_whole_sequence() {
        let text = run(10);
        for rev in 10..=13 {
            assert!(text.contains(&format!("Revision-number: {rev}\n")));
        }
        assert!(!text.contains("Revision-number: 0\n"));
        assert!(text.contains("Node-copyfrom-rev: 12\n"));
    }

    #[test]
    fn mergeinfo_revisions_follow_the_mapping() {
        let text = run(10);
        assert!(text.contains("/trunk:11-12\n"));
        // The value grew by two bytes and the V length follows.
        assert!(text.contains("V 13\n/trunk:11-12\n"));
    }

    #[test]
    fn copyfrom_before_any_revision_is_rejected() {
        let mut dump = b"SVN-fs-dump-format-version: 2\n\n".to_vec();
        dump.extend_from_slice(
            b"Node-path: a\nNode-action: add\nNode-copyfrom-rev: 1\nNode-copyfrom-path: b\n\n",
        );
        let mut source = DumpfileSource::new(Cursor::new(dump));
        let mut out = Vec::new();
        let err = renumber(&mut source, &mut out, 0).unwrap_err();
        assert!(matches!(err, DumpError::Parse { .. }));
    }

    #[test]
    fn lengths_stay_consistent_after_mergeinfo_growth() {
        let text = run(10);
        // The branch node's property block is reserialized with corrected
        // Prop-content-length and Content-length.
        let idx = text.find("Node-path: branches/b1").unwrap();
        let tail = &text[idx..];
        let prop_len: usize = tail
            .lines()
            .find(|l| l.starts_with("Prop-content-length: "))
            .and_then(|l| l.trim_start_matches("Prop-content-length: ").parse().ok())
            .unwrap();
        let props_start = tail.find("\n\n").unwrap() + 2;
        let block = &tail[props_start..props_start + prop_len];
        assert!(block.ends_with("PROPS-END\n"));
    }
}
