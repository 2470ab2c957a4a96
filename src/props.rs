//! Codec for the `K/V/D ... PROPS-END` property block.
//!
//! Property blocks carry per-revision and per-node metadata. Insertion order
//! is observable in the serialized form, so the codec keeps an ordered key
//! list beside the value map and re-serialization of an untouched block
//! reproduces the input bytes exactly.

use std::collections::HashMap;
use std::io::Read;

use crate::source::LineBufferedSource;
use crate::{DumpError, Result};

/// An ordered property block: `name -> raw bytes` plus deletion markers.
///
/// Values can be binary; callers should treat them as opaque bytes unless
/// they know a property is UTF-8 (as `svn:log`, `svn:author`, `svn:date`
/// and `svn:mergeinfo` are in practice).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    values: HashMap<String, Vec<u8>>,
    keys: Vec<String>,
    del_keys: Vec<String>,
}

fn field_count(line: &[u8], lineno: u64) -> Result<usize> {
    let text = String::from_utf8_lossy(line);
    text.split_whitespace()
        .nth(1)
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(|| DumpError::parse(lineno, format!("malformed property count line {text:?}")))
}

fn key_from_line(line: Vec<u8>, want: usize, lineno: u64) -> Result<String> {
    let mut line = line;
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.len() != want {
        return Err(DumpError::parse(
            lineno,
            format!("property key length {} does not match header {want}", line.len()),
        ));
    }
    String::from_utf8(line)
        .map_err(|_| DumpError::parse(lineno, "property key is not valid UTF-8"))
}

impl Properties {
    /// Creates an empty property block.
    pub fn new() -> Self {
        Properties::default()
    }

    /// Parses a property block up to and including its `PROPS-END` line.
    pub fn parse<R: Read>(lbs: &mut LineBufferedSource<R>) -> Result<Self> {
        let mut props = Properties::new();
        loop {
            let current = lbs.peek()?;
            if current.starts_with(b"PROPS-END") {
                break;
            }
            if current.starts_with(b"D ") {
                let dline = lbs.require(b"D")?;
                let want = field_count(&dline, lbs.line_number())?;
                let key = key_from_line(lbs.readline()?, want, lbs.line_number())?;
                props.del_keys.push(key);
                continue;
            }
            let kline = lbs.require(b"K")?;
            let want = field_count(&kline, lbs.line_number())?;
            let key = key_from_line(lbs.readline()?, want, lbs.line_number())?;
            let vline = lbs.require(b"V")?;
            let vlen = field_count(&vline, lbs.line_number())?;
            let value = lbs.read_bytes(vlen)?;
            lbs.require(b"\n")?;
            props.values.insert(key.clone(), value);
            props.keys.push(key);
        }
        lbs.flush();
        Ok(props)
    }

    /// Serializes the block, regenerating lengths from the current bytes.
    ///
    /// Keys are emitted in stored order, then deletion markers, then the
    /// `PROPS-END` terminator.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for key in &self.keys {
            let value = self.values.get(key).map(Vec::as_slice).unwrap_or_default();
            out.extend_from_slice(format!("K {}\n", key.len()).as_bytes());
            out.extend_from_slice(key.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
            out.extend_from_slice(value);
            out.push(b'\n');
        }
        for key in &self.del_keys {
            out.extend_from_slice(format!("D {}\n", key.len()).as_bytes());
            out.extend_from_slice(key.as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(b"PROPS-END\n");
        out
    }

    /// Whether the block carries a value for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the raw value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Returns the value of `name` as UTF-8 text, if present and valid.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Assigns `name = value`, appending to the key order if `name` is new.
    pub fn set(&mut self, name: &str, value: Vec<u8>) {
        if !self.values.contains_key(name) {
            self.keys.push(name.to_string());
        }
        self.values.insert(name.to_string(), value);
    }

    /// Removes `name` entirely: value, key-order entry, and any deletion
    /// marker.
    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
        self.keys.retain(|k| k != name);
        self.del_keys.retain(|k| k != name);
    }

    /// Renames `old` to `new`, preserving key order and deletion-marker
    /// position.
    pub fn rename(&mut self, old: &str, new: &str) {
        if let Some(value) = self.values.remove(old) {
            self.values.insert(new.to_string(), value);
            for key in &mut self.keys {
                if key == old {
                    *key = new.to_string();
                }
            }
        }
        for key in &mut self.del_keys {
            if key == old {
                *key = new.to_string();
            }
        }
    }

    /// The ordered keys carrying values.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// The ordered deletion-marker keys.
    pub fn deleted_keys(&self) -> impl Iterator<Item = &str> {
        self.del_keys.iter().map(String::as_str)
    }
}
