//! The `testify` command: neutralize a stream for use as a test load.

use std::io::{Read, Write};

use chrono::DateTime;

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::props::Properties;
use crate::range::SubversionRange;
use crate::Result;

const NEUTRAL_USER: &str = "fred";

fn neutral_date(commit_index: u64) -> String {
    let secs = (commit_index.saturating_sub(1) * 10) as i64;
    let date = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    format!("{}.000000Z", date.format("%Y-%m-%dT%H:%M:%S"))
}

fn strip_uuid(preamble: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(preamble.len());
    let mut pos = 0;
    let mut eat_blank = false;
    while pos < preamble.len() {
        let end = preamble[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i + 1)
            .unwrap_or(preamble.len());
        let line = &preamble[pos..end];
        pos = end;
        if line.starts_with(b"UUID: ") {
            eat_blank = true;
            continue;
        }
        if eat_blank && line == b"\n" {
            eat_blank = false;
            continue;
        }
        eat_blank = false;
        out.extend_from_slice(line);
    }
    out
}

/// Discards the UUID, rewrites commit timestamps to a 10-second clock tick
/// starting at the Unix epoch, and rewrites every committer to a fixed
/// neutral name.
pub fn testify<R: Read, W: Write>(source: &mut DumpfileSource<R>, out: &mut W) -> Result<()> {
    let preamble = source.read_preamble()?;
    out.write_all(&strip_uuid(&preamble))?;

    let mut commit_index = 0u64;
    let mut last_rev = None;
    let mut prop_hook = |rev: u64, props: &mut Properties| {
        if last_rev != Some(rev) {
            last_rev = Some(rev);
            commit_index += 1;
        }
        if props.contains("svn:author") {
            props.set("svn:author", NEUTRAL_USER.as_bytes().to_vec());
        }
        if props.contains("svn:date") {
            props.set("svn:date", neutral_date(commit_index).into_bytes());
        }
        Ok(())
    };
    let mut node_hook = |record: &NodeRecord| Ok(record.serialize());
    source.report_revisions(
        out,
        &SubversionRange::all(),
        ReportOptions {
            node_hook: Some(&mut node_hook),
            prop_hook: Some(&mut prop_hook),
            passthrough: true,
            passempty: true,
        },
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;
    use crate::testkit::{DumpBuilder, NodeSpec};

    fn run() -> String {
        let dump = DumpBuilder::new()
            .revision(0, &[("svn:date", "2011-11-30T16:40:02.180831Z")])
            .revision(
                1,
                &[
                    ("svn:log", "one\n"),
                    ("svn:author", "alice"),
                    ("svn:date", "2011-11-30T16:41:00.000000Z"),
                ],
            )
            .node(NodeSpec::dir_add("trunk"))
            .revision(
                2,
                &[
                    ("svn:log", "two\n"),
                    ("svn:author", "bob"),
                    ("svn:date", "2011-11-30T16:42:00.000000Z"),
                ],
            )
            .node(NodeSpec::file_add("trunk/a.txt", b"hello\n"))
            .build();
        let mut source = DumpfileSource::new(Cursor::new(dump));
        let mut out = Vec::new();
        testify(&mut source, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn uuid_is_discarded() {
        let text = run();
        assert!(!text.contains("UUID"));
        assert!(text.contains("SVN-fs-dump-format-version: 2\n"));
    }

    #[test]
    fn dates_tick_from_the_epoch() {
        let text = run();
        assert!(text.contains("1970-01-01T00:00:00.000000Z"));
        assert!(text.contains("1970-01-01T00:00:10.000000Z"));
        assert!(text.contains("1970-01-01T00:00:20.000000Z"));
        assert!(!text.contains("2011-11-30"));
    }

    #[test]
    fn committers_become_the_neutral_user() {
        let text = run();
        assert!(!text.contains("alice"));
        assert!(!text.contains("\nbob\n"));
        assert_eq!(text.matches("\nfred\n").count(), 2);
    }
}
