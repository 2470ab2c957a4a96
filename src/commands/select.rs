//! Revision selection: `select` and `deselect`.

use std::io::{Read, Write};

use crate::dumpfile::DumpfileSource;
use crate::header::payload;
use crate::range::SubversionRange;
use crate::{DumpError, Result};

fn revision_of(line: &[u8], lineno: u64) -> Result<u64> {
    payload(line, "Revision-number")
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| DumpError::parse(lineno, "invalid revision number"))
}

fn do_select<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    invert: bool,
) -> Result<()> {
    let mut emit = selection.contains(0) != invert;
    loop {
        let stash = source.read_until_next_revision()?;
        if emit {
            out.write_all(&stash)?;
        }
        if !source.lbs.has_line_buffered() {
            return Ok(());
        }
        let lineno = source.lbs.line_number();
        let revision = match source.lbs.buffered() {
            Some(line) => revision_of(line, lineno)?,
            None => return Ok(()),
        };
        emit = selection.contains(revision) != invert;
        if emit {
            let line = source.lbs.flush();
            out.write_all(&line)?;
        }
        if !invert && revision > selection.upperbound() {
            return Ok(());
        }
        source.lbs.flush();
    }
}

/// Emits only the revisions inside `selection`; a selection beginning at
/// revision 0 includes the preamble.
pub fn select<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    do_select(source, out, selection, false)
}

/// Emits only the revisions outside `selection`.
pub fn deselect<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
) -> Result<()> {
    do_select(source, out, selection, true)
}
