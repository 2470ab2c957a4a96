//! The dump-stream record reader and transformation driver.
//!
//! A dump stream is a preamble followed by revisions, each revision a
//! property block plus zero or more nodes. The reader materializes one
//! record at a time, hands it to the active command's hooks, and re-emits
//! the returned bytes. Headers the hooks do not rewrite are preserved
//! byte-for-byte; content bodies are read by length and never scanned as
//! text.

use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use tracing::debug;

use crate::header::{payload, set_length};
use crate::props::Properties;
use crate::range::SubversionRange;
use crate::source::LineBufferedSource;
use crate::types::{NodeAction, NodeKind};
use crate::{DumpError, Result};

/// A property hook: mutates a parsed property block in place.
///
/// Invoked for every property block (revision and node) of a selected
/// revision. The first argument is the owning revision number.
pub type PropHook<'a> = &'a mut dyn FnMut(u64, &mut Properties) -> Result<()>;

/// Re-borrows a [`PropHook`] with a fresh, shorter lifetime.
///
/// `Option::as_deref_mut` ties the returned reference's lifetime to the
/// hook's own `'a` instead of the borrow of `hook`, so repeated calls in a
/// loop are rejected as conflicting mutable borrows. This performs the
/// reborrow explicitly so each call only borrows for as long as it is used.
fn reborrow_prop_hook<'b>(hook: &'b mut Option<PropHook<'_>>) -> Option<PropHook<'b>> {
    match hook {
        Some(h) => Some(&mut **h),
        None => None,
    }
}

/// A node hook: maps a parsed node to the bytes to emit for it.
///
/// Returning an empty buffer elides the node.
pub type NodeHook<'a> = &'a mut dyn FnMut(&NodeRecord) -> Result<Vec<u8>>;

/// Hook and emission settings for one [`DumpfileSource::report`] pass.
pub struct ReportOptions<'a> {
    /// Invoked once per node of each selected revision.
    pub node_hook: Option<NodeHook<'a>>,
    /// Invoked for every property block of each selected revision.
    pub prop_hook: Option<PropHook<'a>>,
    /// Whether the pass writes a dump stream at all. Analytic commands set
    /// this false and produce their own output inside the hooks.
    pub passthrough: bool,
    /// Whether revision headers with no nodes on input are preserved.
    pub passempty: bool,
}

impl<'a> Default for ReportOptions<'a> {
    fn default() -> Self {
        ReportOptions {
            node_hook: None,
            prop_hook: None,
            passthrough: true,
            passempty: true,
        }
    }
}

/// One node of a revision, parsed into its header block, serialized
/// properties, and raw content body.
#[derive(Clone, Debug)]
pub struct NodeRecord {
    /// The revision this node belongs to.
    pub revision: u64,
    /// 1-origin index of this node within its revision.
    pub index: u32,
    /// The raw header block, including its terminating blank line.
    pub header: Vec<u8>,
    /// The serialized property block, or empty if the node has none.
    pub properties: Vec<u8>,
    /// The raw content body, or empty.
    pub content: Vec<u8>,
}

impl NodeRecord {
    /// Re-serializes the node: header, properties, content.
    pub fn serialize(&self) -> Vec<u8> {
        let mut all =
            Vec::with_capacity(self.header.len() + self.properties.len() + self.content.len());
        all.extend_from_slice(&self.header);
        all.extend_from_slice(&self.properties);
        all.extend_from_slice(&self.content);
        all
    }

    /// The `Node-path` header value.
    pub fn path(&self) -> Option<&[u8]> {
        payload(&self.header, "Node-path")
    }

    /// The `Node-kind` header, if present.
    pub fn kind(&self) -> Option<NodeKind> {
        payload(&self.header, "Node-kind")
            .and_then(|w| std::str::from_utf8(w).ok())
            .map(NodeKind::from_word)
    }

    /// The `Node-action` header, if present.
    pub fn action(&self) -> Option<NodeAction> {
        payload(&self.header, "Node-action")
            .and_then(|w| std::str::from_utf8(w).ok())
            .map(NodeAction::from_word)
    }

    /// The `Node-copyfrom-rev` header, if present.
    pub fn copyfrom_rev(&self) -> Option<u64> {
        payload(&self.header, "Node-copyfrom-rev")
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|v| v.parse().ok())
    }

    /// The `Node-copyfrom-path` header, if present.
    pub fn copyfrom_path(&self) -> Option<&[u8]> {
        payload(&self.header, "Node-copyfrom-path")
    }
}

fn revision_of(line: &[u8]) -> Option<u64> {
    payload(line, "Revision-number")
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(|v| v.trim().parse().ok())
}

/// A reader that knows the Subversion dumpfile grammar.
pub struct DumpfileSource<R> {
    /// The underlying line-buffered byte source.
    pub lbs: LineBufferedSource<R>,
    revision: u64,
    index: u32,
    emitted_revisions: HashSet<u64>,
}

impl<R: Read> DumpfileSource<R> {
    /// Wraps `reader` in a new dumpfile source.
    pub fn new(reader: R) -> Self {
        DumpfileSource {
            lbs: LineBufferedSource::new(reader),
            revision: 0,
            index: 0,
            emitted_revisions: HashSet::new(),
        }
    }

    /// The revision number of the record currently materialized.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Reads raw bytes up to (not including) the next `Revision-number`
    /// line, which is left in the pushback slot.
    ///
    /// Content bodies encountered on the way are read by their
    /// `Content-length`, so body bytes are never mistaken for headers.
    pub fn read_until_next_revision(&mut self) -> Result<Vec<u8>> {
        let mut stash = Vec::new();
        let mut content_length = 0usize;
        loop {
            let line = self.lbs.readline()?;
            if line.is_empty() {
                return Ok(stash);
            }
            if line == b"\n" {
                stash.extend_from_slice(&line);
                if content_length > 0 {
                    stash.extend_from_slice(&self.lbs.read_bytes(content_length)?);
                    content_length = 0;
                }
                continue;
            }
            if line.starts_with(b"Revision-number:") {
                self.lbs.push(line);
                return Ok(stash);
            }
            if let Some(v) = payload(&line, "Content-length") {
                content_length = std::str::from_utf8(v)
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .ok_or_else(|| {
                        DumpError::parse(self.lbs.line_number(), "malformed Content-length")
                    })?;
            }
            stash.extend_from_slice(&line);
        }
    }

    /// Reads the preamble (format version, UUID, and surrounding blank
    /// lines), leaving the first `Revision-number` line pushed back.
    pub fn read_preamble(&mut self) -> Result<Vec<u8>> {
        self.read_until_next_revision()
    }

    /// Reads one revision header including its property block.
    ///
    /// When `prop_hook` is given, the block is parsed, passed to the hook,
    /// re-serialized, and the `Prop-content-length` and `Content-length`
    /// headers are rewritten to match.
    pub fn read_revision_header(&mut self, mut prop_hook: Option<PropHook<'_>>) -> Result<Vec<u8>> {
        let mut stash = self.lbs.require(b"Revision-number:")?;
        let rev = revision_of(&stash).ok_or_else(|| {
            DumpError::parse(self.lbs.line_number(), "invalid revision number")
        })?;
        self.revision = rev;
        self.index = 0;
        stash.extend_from_slice(&self.lbs.require(b"Prop-content-length:")?);
        stash.extend_from_slice(&self.lbs.require(b"Content-length:")?);
        stash.extend_from_slice(&self.lbs.require(b"\n")?);
        let mut props = Properties::parse(&mut self.lbs)?;
        let serialized = if let Some(hook) = prop_hook.as_deref_mut() {
            hook(rev, &mut props)?;
            let serialized = props.serialize();
            stash = set_length("Prop-content", &stash, serialized.len());
            stash = set_length("Content", &stash, serialized.len());
            serialized
        } else {
            props.serialize()
        };
        stash.extend_from_slice(&serialized);
        while self.lbs.peek()? == b"\n" {
            let line = self.lbs.readline()?;
            stash.extend_from_slice(&line);
        }
        debug!(revision = rev, "read revision header");
        Ok(stash)
    }

    /// Reads one node: header block, optional property block, content body.
    ///
    /// When `prop_hook` is given it is applied to the node's property block
    /// and the two affected length headers are rewritten.
    pub fn read_node(&mut self, mut prop_hook: Option<PropHook<'_>>) -> Result<NodeRecord> {
        let mut header = self.lbs.require(b"Node-")?;
        loop {
            let line = self.lbs.readline()?;
            if line.is_empty() {
                return Err(DumpError::parse(
                    self.lbs.line_number(),
                    "unexpected EOF in node header",
                ));
            }
            if let Some(rev) = payload(&line, "Node-copyfrom-rev")
                .and_then(|v| std::str::from_utf8(v).ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                && !self.emitted_revisions.contains(&rev)
            {
                header.extend_from_slice(&line);
                header.extend_from_slice(&self.lbs.require(b"Node-copyfrom-path")?);
                continue;
            }
            header.extend_from_slice(&line);
            if line == b"\n" {
                break;
            }
        }
        let mut properties = Vec::new();
        if payload(&header, "Prop-content-length").is_some() {
            let mut props = Properties::parse(&mut self.lbs)?;
            if let Some(hook) = prop_hook.as_deref_mut() {
                hook(self.revision, &mut props)?;
            }
            properties = props.serialize();
        }
        let mut content = Vec::new();
        if let Some(n) = payload(&header, "Text-content-length")
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            content = self.lbs.read_bytes(n)?;
        }
        if prop_hook.is_some() {
            header = set_length("Prop-content", &header, properties.len());
            header = set_length("Content", &header, properties.len() + content.len());
        }
        Ok(NodeRecord {
            revision: self.revision,
            index: self.index,
            header,
            properties,
            content,
        })
    }

    /// Writes `text`, recording the revision number if `text` opens with a
    /// revision header. The record is consulted while reading copy-from
    /// headers, so dangling references can be recognized.
    fn say<W: Write>(&mut self, out: &mut W, text: &[u8]) -> Result<()> {
        if text.starts_with(b"Revision-number:")
            && let Some(rev) = revision_of(text.split(|&b| b == b'\n').next().unwrap_or(text))
        {
            self.emitted_revisions.insert(rev);
        }
        out.write_all(text)?;
        Ok(())
    }

    /// Runs a full transformation pass: preamble, then every revision.
    pub fn report<W: Write>(
        &mut self,
        out: &mut W,
        selection: &SubversionRange,
        opts: ReportOptions<'_>,
    ) -> Result<()> {
        let preamble = self.read_preamble()?;
        if opts.passthrough {
            out.write_all(&preamble)?;
        }
        self.report_revisions(out, selection, opts)
    }

    /// Runs the per-revision transformation loop. The preamble must already
    /// have been consumed with [`DumpfileSource::read_preamble`].
    pub fn report_revisions<W: Write>(
        &mut self,
        out: &mut W,
        selection: &SubversionRange,
        opts: ReportOptions<'_>,
    ) -> Result<()> {
        let ReportOptions {
            mut node_hook,
            mut prop_hook,
            passthrough,
            passempty,
        } = opts;
        if !self.lbs.has_line_buffered() {
            return Ok(());
        }
        let mut emit = passthrough;
        loop {
            let Some(revline) = self.lbs.buffered() else {
                return Ok(());
            };
            let rev = revision_of(revline).ok_or_else(|| {
                DumpError::parse(self.lbs.line_number(), "invalid revision number")
            })?;
            if !selection.contains(rev) {
                // Unselected revisions pass verbatim (or are skipped on an
                // analytic pass); hooks do not see them.
                let revline = self.lbs.flush();
                let body = self.read_until_next_revision()?;
                if passthrough {
                    self.say(out, &revline)?;
                    out.write_all(&body)?;
                } else if rev > selection.upperbound() {
                    return Ok(());
                }
                if !self.lbs.has_line_buffered() {
                    return Ok(());
                }
                continue;
            }
            let mut stash = self.read_revision_header(reborrow_prop_hook(&mut prop_hook))?;
            let mut nodecount = 0u32;
            loop {
                let line = self.lbs.readline()?;
                if line.is_empty() {
                    if !stash.is_empty() && nodecount == 0 && passempty && passthrough {
                        self.say(out, &stash)?;
                    }
                    return Ok(());
                }
                if line == b"\n" {
                    if passthrough && emit {
                        out.write_all(&line)?;
                    }
                    continue;
                }
                if line.starts_with(b"Revision-number:") {
                    self.lbs.push(line);
                    if !stash.is_empty() && nodecount == 0 && passempty && passthrough {
                        self.say(out, &stash)?;
                    }
                    break;
                }
                if line.starts_with(b"Node-") {
                    nodecount += 1;
                    if line.starts_with(b"Node-path: ") {
                        self.index += 1;
                    }
                    self.lbs.push(line);
                    let record = self.read_node(reborrow_prop_hook(&mut prop_hook))?;
                    debug!(
                        revision = record.revision,
                        index = record.index,
                        path = ?record.path().map(String::from_utf8_lossy),
                        "read node"
                    );
                    let mut nodetxt = match node_hook.as_deref_mut() {
                        Some(hook) => hook(&record)?,
                        None => Vec::new(),
                    };
                    emit = !nodetxt.is_empty();
                    if emit && !stash.is_empty() {
                        let mut combined = std::mem::take(&mut stash);
                        combined.extend_from_slice(&nodetxt);
                        nodetxt = combined;
                    }
                    if passthrough && !nodetxt.is_empty() {
                        self.say(out, &nodetxt)?;
                    }
                    continue;
                }
                return Err(DumpError::parse(
                    self.lbs.line_number(),
                    format!(
                        "parse of revision {} doesn't look right ({:?})",
                        self.revision,
                        String::from_utf8_lossy(&line)
                    ),
                ));
            }
        }
    }
}

impl<R: Read + Seek> DumpfileSource<R> {
    /// Repositions the source to the beginning of the stream, clearing all
    /// per-pass state. Used by the two-pass `reduce` command.
    pub fn rewind(&mut self) -> Result<()> {
        self.lbs.rewind()?;
        self.revision = 0;
        self.index = 0;
        self.emitted_revisions.clear();
        Ok(())
    }
}
