//! Stream surgery on Subversion dump files.
//!
//! This crate parses the interchange format produced by `svnadmin dump`
//! into a stream of typed records, applies one of a family of structural
//! transformations, and emits a well-formed dump stream. Headers that a
//! transformation does not rewrite are preserved byte-for-byte; content
//! bodies are treated as opaque bytes; the three interlocking length
//! fields of every record are kept consistent on output.
//!
//! The engine is strictly streaming and single-threaded: one record is
//! materialized at a time and written before the next is read.
//!
//! ## Getting started
//!
//! ```rust,no_run
//! use repocutter::{DumpfileSource, SubversionRange, commands};
//!
//! fn main() -> repocutter::Result<()> {
//!     let mut source = DumpfileSource::new(std::io::stdin().lock());
//!     let mut out = std::io::stdout().lock();
//!     let range = SubversionRange::parse("2:HEAD")?;
//!     commands::select(&mut source, &mut out, &range)
//! }
//! ```
//!
//! ## Layers
//!
//! - [`LineBufferedSource`]: byte input with one-line pushback.
//! - [`Properties`]: the ordered `K/V/D ... PROPS-END` block codec.
//! - [`DumpfileSource`]: the record reader and transformation driver.
//! - [`SubversionRange`]: the `-r` selection polyrange.
//! - [`commands`]: one function per subcommand, built on the layers above.

#![deny(unsafe_code)]

pub mod commands;
mod dumpfile;
mod error;
mod header;
mod logfile;
mod names;
mod path;
mod props;
mod range;
mod source;
#[cfg(test)]
mod testkit;
mod types;

pub use dumpfile::{DumpfileSource, NodeHook, NodeRecord, PropHook, ReportOptions};
pub use error::DumpError;
pub use logfile::{Logentry, Logfile};
pub use names::NameSequence;
pub use props::Properties;
pub use range::{HEAD_REVISION, MergeinfoRange, SubversionRange};
pub use source::LineBufferedSource;
pub use types::{NodeAction, NodeKind};

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, DumpError>;
