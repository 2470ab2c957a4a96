//! Analytic commands: `log`, `see`, and `reduce`.
//!
//! These produce reports (or a reduced dump) instead of transforming the
//! stream in place; the report driver runs with pass-through off and the
//! hooks write to the caller's output directly.

use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use chrono::DateTime;
use tracing::warn;

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::header::payload;
use crate::logfile::LOG_DELIMITER;
use crate::props::Properties;
use crate::range::SubversionRange;
use crate::types::{NodeAction, NodeKind};
use crate::{DumpError, Result};

use super::select;

/// Emits a Subversion-style log listing of the selected revisions.
pub fn log<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    let mut hook = |rev: u64, props: &mut Properties| {
        let Some(logentry) = props.get_str("svn:log").map(str::to_string) else {
            return Ok(());
        };
        // Revision 0 carries no log message and is skipped with everything
        // else that has an empty one.
        if logentry.is_empty() {
            return Ok(());
        }
        let author = props.get_str("svn:author").unwrap_or("(no author)").to_string();
        let raw_date = props.get_str("svn:date").unwrap_or("").to_string();
        let date = DateTime::parse_from_rfc3339(&raw_date)
            .map_err(|err| DumpError::usage(format!("ill-formed date {raw_date:?}: {err}")))?;
        let drep = date.format("%Y-%m-%d %H:%M:%S +0000 (%a, %d %b %Y)");
        writeln!(out, "{LOG_DELIMITER}")?;
        writeln!(
            out,
            "r{rev} | {author} | {drep} | {} lines",
            logentry.matches('\n').count()
        )?;
        writeln!(out)?;
        writeln!(out, "{logentry}")?;
        Ok(())
    };
    let mut sink = std::io::sink();
    source.report(
        &mut sink,
        selection,
        ReportOptions {
            node_hook: None,
            prop_hook: Some(&mut hook),
            passthrough: false,
            passempty: true,
        },
    )
}

/// Emits one condensed line per node: `REV-INDEX ACTION PATH`, with the
/// copy source appended and `add` reclassified as `copy` when a copyfrom
/// is present. Directory paths carry a trailing slash.
pub fn see<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    let mut hook = |record: &NodeRecord| {
        let mut path = record.path().unwrap_or_default().to_vec();
        let is_dir = record.kind() == Some(NodeKind::Dir);
        if is_dir {
            path.push(b'/');
        }
        let mut action = String::from_utf8_lossy(
            payload(&record.header, "Node-action").unwrap_or_default(),
        )
        .into_owned();
        if let (Some(fromrev), Some(frompath)) = (record.copyfrom_rev(), record.copyfrom_path()) {
            let mut frompath = frompath.to_vec();
            if is_dir {
                frompath.push(b'/');
            }
            path.extend_from_slice(
                format!(" from {fromrev}:{}", String::from_utf8_lossy(&frompath)).as_bytes(),
            );
            action = "copy".to_string();
        }
        let leader = format!("{}-{}", record.revision, record.index);
        writeln!(
            out,
            "{leader:<5} {action:<8} {}",
            String::from_utf8_lossy(&path)
        )?;
        Ok(Vec::new())
    };
    let mut sink = std::io::sink();
    source.report(
        &mut sink,
        selection,
        ReportOptions {
            node_hook: Some(&mut hook),
            prop_hook: None,
            passthrough: false,
            passempty: true,
        },
    )
}

fn mark_neighbors(interesting: &mut HashSet<u64>, rev: u64) {
    interesting.insert(rev.saturating_sub(1));
    interesting.insert(rev);
    interesting.insert(rev + 1);
}

/// Topologically reduces a dump: keeps revisions containing anything other
/// than plain file modifications, revisions referenced by later copies, and
/// their immediate neighbors. Requires a seekable input because interest is
/// only known once the whole stream has been scanned.
pub fn reduce<R: Read + Seek, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
) -> Result<()> {
    let mut interesting: HashSet<u64> = HashSet::new();
    interesting.insert(0);
    let mut max_rev = 0u64;
    {
        let mut hook = |record: &NodeRecord| {
            if record.action().is_none() {
                warn!(
                    revision = record.revision,
                    "node with no Node-action; keeping its revision"
                );
            }
            let plain_change = record.kind() == Some(NodeKind::File)
                && record.action() == Some(NodeAction::Change);
            if !plain_change || !record.properties.is_empty() {
                mark_neighbors(&mut interesting, record.revision);
            }
            if let Some(copysource) = record.copyfrom_rev() {
                mark_neighbors(&mut interesting, copysource);
            }
            max_rev = record.revision;
            Ok(Vec::new())
        };
        let mut sink = std::io::sink();
        source.report(
            &mut sink,
            &SubversionRange::all(),
            ReportOptions {
                node_hook: Some(&mut hook),
                prop_hook: None,
                passthrough: false,
                passempty: true,
            },
        )?;
    }
    // Neighbor marks beyond the last revision fall away here.
    let revisions: Vec<u64> = (0..=max_rev).filter(|r| interesting.contains(r)).collect();
    let range = SubversionRange::from_revisions(&revisions);
    source.rewind()?;
    select(source, out, &range)
}
