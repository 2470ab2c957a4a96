//! Word enums for the dump-stream node headers.

use std::fmt::{Display, Formatter};

/// The kind of a node, as carried by the `Node-kind` header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// No node exists at the path (absent marker).
    None,
    /// A file node.
    File,
    /// A directory node.
    Dir,
    /// An unknown kind (forward-compatibility fallback).
    Unknown,
}

impl NodeKind {
    /// Parses the `Node-kind` header word.
    pub fn from_word(word: &str) -> Self {
        match word {
            "none" => Self::None,
            "file" => Self::File,
            "dir" => Self::Dir,
            _ => Self::Unknown,
        }
    }

    /// Returns the stable dump-stream spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::File => "file",
            Self::Dir => "dir",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The action of a node, as carried by the `Node-action` header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeAction {
    /// Creates the path.
    Add,
    /// Modifies an existing path.
    Change,
    /// Removes the path.
    Delete,
    /// Atomically deletes and re-adds the path.
    Replace,
    /// An unknown action (forward-compatibility fallback).
    Unknown,
}

impl NodeAction {
    /// Parses the `Node-action` header word.
    pub fn from_word(word: &str) -> Self {
        match word {
            "add" => Self::Add,
            "change" => Self::Change,
            "delete" => Self::Delete,
            "replace" => Self::Replace,
            _ => Self::Unknown,
        }
    }

    /// Returns the stable dump-stream spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for NodeAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
