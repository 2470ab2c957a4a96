//! Test-only builder for well-formed dump streams.
//!
//! Length headers are computed from the actual serialized bytes, so
//! fixtures stay well-formed as tests evolve.

use crate::props::Properties;

const PREAMBLE: &str =
    "SVN-fs-dump-format-version: 2\n\nUUID: 65390d28-7d35-4d29-9e5e-41e0c4b3a557\n\n";

/// Description of one node for [`DumpBuilder::node`].
pub(crate) struct NodeSpec<'a> {
    path: &'a str,
    kind: Option<&'a str>,
    action: &'a str,
    copyfrom: Option<(u64, &'a str)>,
    props: Option<Vec<(&'a str, &'a str)>>,
    content: Option<Vec<u8>>,
    checksums: bool,
}

impl<'a> NodeSpec<'a> {
    pub fn dir_add(path: &'a str) -> Self {
        NodeSpec {
            path,
            kind: Some("dir"),
            action: "add",
            copyfrom: None,
            props: Some(Vec::new()),
            content: None,
            checksums: false,
        }
    }

    pub fn file_add(path: &'a str, content: &[u8]) -> Self {
        NodeSpec {
            path,
            kind: Some("file"),
            action: "add",
            copyfrom: None,
            props: None,
            content: Some(content.to_vec()),
            checksums: false,
        }
    }

    pub fn file_change(path: &'a str, content: &[u8]) -> Self {
        NodeSpec {
            content: Some(content.to_vec()),
            action: "change",
            ..NodeSpec::file_add(path, content)
        }
    }

    pub fn file_copy(path: &'a str, rev: u64, from: &'a str) -> Self {
        NodeSpec {
            path,
            kind: Some("file"),
            action: "add",
            copyfrom: Some((rev, from)),
            props: None,
            content: None,
            checksums: false,
        }
    }

    pub fn with_props(mut self, props: &[(&'a str, &'a str)]) -> Self {
        self.props = Some(props.to_vec());
        self
    }

    pub fn with_copyfrom(mut self, rev: u64, from: &'a str) -> Self {
        self.copyfrom = Some((rev, from));
        self
    }

    pub fn with_checksums(mut self) -> Self {
        self.checksums = true;
        self
    }
}

fn serialize_props(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut props = Properties::new();
    for (name, value) in entries {
        props.set(name, value.as_bytes().to_vec());
    }
    props.serialize()
}

/// Assembles a dump stream with consistent length headers.
pub(crate) struct DumpBuilder {
    out: Vec<u8>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        DumpBuilder {
            out: PREAMBLE.as_bytes().to_vec(),
        }
    }

    pub fn revision(mut self, rev: u64, props: &[(&str, &str)]) -> Self {
        let block = serialize_props(props);
        self.out.extend_from_slice(
            format!(
                "Revision-number: {rev}\nProp-content-length: {0}\nContent-length: {0}\n\n",
                block.len()
            )
            .as_bytes(),
        );
        self.out.extend_from_slice(&block);
        self.out.push(b'\n');
        self
    }

    pub fn node(mut self, spec: NodeSpec<'_>) -> Self {
        let block = spec.props.as_deref().map(serialize_props);
        let content = spec.content.as_deref().unwrap_or_default();
        self.out
            .extend_from_slice(format!("Node-path: {}\n", spec.path).as_bytes());
        if let Some(kind) = spec.kind {
            self.out
                .extend_from_slice(format!("Node-kind: {kind}\n").as_bytes());
        }
        self.out
            .extend_from_slice(format!("Node-action: {}\n", spec.action).as_bytes());
        if let Some((rev, from)) = spec.copyfrom {
            self.out.extend_from_slice(
                format!("Node-copyfrom-rev: {rev}\nNode-copyfrom-path: {from}\n").as_bytes(),
            );
        }
        if let Some(block) = &block {
            self.out
                .extend_from_slice(format!("Prop-content-length: {}\n", block.len()).as_bytes());
        }
        if spec.content.is_some() {
            self.out
                .extend_from_slice(format!("Text-content-length: {}\n", content.len()).as_bytes());
        }
        if spec.checksums && spec.content.is_some() {
            self.out.extend_from_slice(
                b"Text-content-md5: d41d8cd98f00b204e9800998ecf8427e\n\
Text-content-sha1: da39a3ee5e6b4b0d3255bfef95601890afd80709\n",
            );
        }
        if block.is_some() || spec.content.is_some() {
            let total = block.as_deref().map(<[u8]>::len).unwrap_or(0) + content.len();
            self.out
                .extend_from_slice(format!("Content-length: {total}\n").as_bytes());
        }
        self.out.push(b'\n');
        if let Some(block) = &block {
            self.out.extend_from_slice(block);
        }
        self.out.extend_from_slice(content);
        self.out.extend_from_slice(b"\n\n");
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.out
    }
}
