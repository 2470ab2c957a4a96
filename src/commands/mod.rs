//! The transformation command family.
//!
//! Each command installs a node hook, a property hook, or both into the
//! record reader and drives one pass over the input. Hooks never panic on
//! input-shape problems; they fail through [`crate::DumpError`] and the
//! driver stops before emitting a partial record.

mod analytic;
mod content;
mod filter;
mod obscure;
mod paths;
mod propops;
mod renumber;
mod select;
mod testify;

pub use analytic::{log, reduce, see};
pub use content::{replace, strip};
pub use filter::{expunge, sift};
pub use obscure::obscure;
pub use paths::{pathrename, pop, swap};
pub use propops::{propdel, proprename, propset, setlog};
pub use renumber::renumber;
pub use select::{deselect, select};
pub use testify::testify;

use crate::{DumpError, Result};

/// Compiles a list of path patterns, mapping failures to a usage error.
pub(crate) fn compile_patterns(patterns: &[String]) -> Result<Vec<regex::bytes::Regex>> {
    patterns
        .iter()
        .map(|p| {
            regex::bytes::Regex::new(p)
                .map_err(|err| DumpError::usage(format!("illegal regular expression: {err}")))
        })
        .collect()
}
