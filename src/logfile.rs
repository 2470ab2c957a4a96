//! Parser for svn-log-format patch files consumed by `setlog`.

use std::collections::HashMap;
use std::io::Read;

use crate::range::SubversionRange;
use crate::source::LineBufferedSource;
use crate::{DumpError, Result};

/// The revision-separator line used by `svn log` output.
pub(crate) const LOG_DELIMITER: &str =
    "------------------------------------------------------------------------";

/// One parsed log entry: the recorded author, date, and message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logentry {
    /// Author field of the `rN | author | date | n lines` header.
    pub author: Vec<u8>,
    /// Date field of the header.
    pub date: Vec<u8>,
    /// Message text, trimmed of surrounding blank lines.
    pub text: Vec<u8>,
}

/// A parsed svn-log file: revision number to log entry.
#[derive(Debug)]
pub struct Logfile {
    comments: HashMap<u64, Logentry>,
}

enum LogState {
    AwaitingHeader,
    InLogEntry,
}

impl Logfile {
    /// Parses svn-log output from `readable`, keeping only entries whose
    /// revision is inside `restrict` when a restriction is given.
    pub fn parse<R: Read>(readable: R, restrict: Option<&SubversionRange>) -> Result<Self> {
        let mut source = LineBufferedSource::new(readable);
        let mut comments = HashMap::new();
        let mut state = LogState::AwaitingHeader;
        let mut author = Vec::new();
        let mut date = Vec::new();
        let mut logentry: Vec<u8> = Vec::new();
        let mut rev: Option<u64> = None;
        loop {
            let line = source.readline()?;
            if let LogState::InLogEntry = state {
                if line.is_empty() || line.starts_with(LOG_DELIMITER.as_bytes()) {
                    if let Some(r) = rev.take() {
                        let text = trim_bytes(&logentry).to_vec();
                        if restrict.is_none_or(|s| s.contains(r)) {
                            comments.insert(
                                r,
                                Logentry {
                                    author: author.clone(),
                                    date: date.clone(),
                                    text,
                                },
                            );
                        }
                        logentry.clear();
                    }
                    if line.is_empty() {
                        break;
                    }
                    state = LogState::AwaitingHeader;
                } else {
                    logentry.extend_from_slice(&line);
                    continue;
                }
            }
            if let LogState::AwaitingHeader = state {
                if line.is_empty() {
                    break;
                }
                if line.starts_with(b"-----------") {
                    continue;
                }
                let header = parse_header(&line).ok_or_else(|| {
                    DumpError::parse(
                        source.line_number(),
                        "did not see a comment header where one was expected",
                    )
                })?;
                rev = Some(header.0);
                author = header.1;
                date = header.2;
                state = LogState::InLogEntry;
            }
        }
        Ok(Logfile { comments })
    }

    /// Whether the file carries an entry for `revision`.
    pub fn contains(&self, revision: u64) -> bool {
        self.comments.contains_key(&revision)
    }

    /// Returns the entry for `revision`, if any.
    pub fn get(&self, revision: u64) -> Option<&Logentry> {
        self.comments.get(&revision)
    }
}

fn trim_bytes(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);
    &bytes[start..end]
}

// A header line looks like `r3 | alice | 2011-11-30 ... | 1 line`.
fn parse_header(line: &[u8]) -> Option<(u64, Vec<u8>, Vec<u8>)> {
    if !line.starts_with(b"r") || !line.get(1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let fields: Vec<&[u8]> = line.split(|&b| b == b'|').collect();
    if fields.len() < 3 {
        return None;
    }
    let revstr = trim_bytes(fields[0]);
    let rev: u64 = std::str::from_utf8(&revstr[1..]).ok()?.parse().ok()?;
    Some((rev, trim_bytes(fields[1]).to_vec(), trim_bytes(fields[2]).to_vec()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    const LOG: &str = "\
------------------------------------------------------------------------
r2 | alice | 2011-11-30 16:42:00 +0000 (Wed, 30 Nov 2011) | 1 line

Second thoughts.
------------------------------------------------------------------------
r1 | bob | 2011-11-30 16:41:00 +0000 (Wed, 30 Nov 2011) | 2 lines

First cut,
now with detail.
------------------------------------------------------------------------
";

    #[test]
    fn parse_collects_entries_by_revision() {
        let lf = Logfile::parse(Cursor::new(LOG.as_bytes().to_vec()), None).unwrap();
        assert!(lf.contains(1));
        assert!(lf.contains(2));
        let entry = lf.get(2).unwrap();
        assert_eq!(entry.author, b"alice");
        assert_eq!(entry.text, b"Second thoughts.");
        assert_eq!(lf.get(1).unwrap().text, b"First cut,\nnow with detail.");
    }

    #[test]
    fn parse_honors_a_revision_restriction() {
        let restrict = SubversionRange::parse("2").unwrap();
        let lf = Logfile::parse(Cursor::new(LOG.as_bytes().to_vec()), Some(&restrict)).unwrap();
        assert!(lf.contains(2));
        assert!(!lf.contains(1));
    }

    #[test]
    fn parse_rejects_a_missing_header() {
        let garbage = "not a header\n";
        let err = Logfile::parse(Cursor::new(garbage.as_bytes().to_vec()), None).unwrap_err();
        assert!(matches!(err, DumpError::Parse { .. }));
    }
}
