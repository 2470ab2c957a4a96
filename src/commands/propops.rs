//! Property surgery: `propdel`, `propset`, `proprename`, and `setlog`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::logfile::Logfile;
use crate::props::Properties;
use crate::range::SubversionRange;
use crate::{DumpError, Result};

fn dumpall(record: &NodeRecord) -> Result<Vec<u8>> {
    Ok(record.serialize())
}

fn report_props<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    prop_hook: &mut dyn FnMut(u64, &mut Properties) -> Result<()>,
) -> Result<()> {
    let mut node_hook = dumpall;
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut node_hook),
            prop_hook: Some(prop_hook),
            passthrough: true,
            passempty: true,
        },
    )
}

/// Removes the named properties from every property block, including their
/// ordering records and any deletion markers.
pub fn propdel<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    propnames: &[String],
) -> Result<()> {
    let mut hook = |_rev: u64, props: &mut Properties| {
        for name in propnames {
            props.remove(name);
        }
        Ok(())
    };
    report_props(source, out, selection, &mut hook)
}

/// Assigns `name=value` pairs, appending new names to the key order.
pub fn propset<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    assignments: &[String],
) -> Result<()> {
    let assignments: Vec<(&str, &str)> = assignments
        .iter()
        .map(|a| {
            a.split_once('=')
                .ok_or_else(|| DumpError::usage(format!("ill-formed property setting {a:?}")))
        })
        .collect::<Result<_>>()?;
    let mut hook = |_rev: u64, props: &mut Properties| {
        for (name, value) in &assignments {
            props.set(name, value.as_bytes().to_vec());
        }
        Ok(())
    };
    report_props(source, out, selection, &mut hook)
}

/// Renames properties given as `old->new` pairs, preserving order and
/// deletion-marker position.
pub fn proprename<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    renames: &[String],
) -> Result<()> {
    let renames: Vec<(&str, &str)> = renames
        .iter()
        .map(|r| {
            r.split_once("->")
                .ok_or_else(|| DumpError::usage(format!("ill-formed property rename {r:?}")))
        })
        .collect::<Result<_>>()?;
    let mut hook = |_rev: u64, props: &mut Properties| {
        for (old, new) in &renames {
            props.rename(old, new);
        }
        Ok(())
    };
    report_props(source, out, selection, &mut hook)
}

fn author_of(props: &Properties) -> String {
    props
        .get_str("svn:author")
        .unwrap_or("(no author)")
        .to_string()
}

/// Replaces `svn:log` entries from an svn-log-format patch file, aborting
/// if the author recorded on the input does not match the patch.
pub fn setlog<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    logpath: &Path,
) -> Result<()> {
    let file = File::open(logpath)
        .map_err(|err| DumpError::usage(format!("couldn't open {}: {err}", logpath.display())))?;
    let logpatch = Logfile::parse(file, Some(selection))?;
    let mut hook = |rev: u64, props: &mut Properties| {
        if !props.contains("svn:log") {
            return Ok(());
        }
        if let Some(entry) = logpatch.get(rev) {
            if entry.author != author_of(props).as_bytes() {
                return Err(DumpError::usage(format!(
                    "author of revision {rev} doesn't look right, aborting"
                )));
            }
            props.set("svn:log", entry.text.clone());
        }
        Ok(())
    };
    report_props(source, out, selection, &mut hook)
}
