//! Revision selection ranges.
//!
//! A [`SubversionRange`] is the user-facing polyrange given with
//! `-r`/`--range`: comma-separated closed intervals over revision numbers,
//! `HEAD` allowed as the upper bound of the last interval, and optional
//! `REV.NODE` qualifiers for node-granular selection. A [`MergeinfoRange`]
//! is the hyphen-separated form that appears inside `svn:mergeinfo` values;
//! it supports the interval merging used when mergeinfo is rewritten.

use crate::{DumpError, Result};

/// Sentinel revision number for the symbolic `HEAD` upper bound.
pub const HEAD_REVISION: u64 = u64::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Endpoint {
    rev: u64,
    node: Option<u32>,
}

impl Endpoint {
    fn parse(text: &str, spec: &str) -> Result<Self> {
        let bad = || DumpError::Range(format!("ill-formed range specification {spec:?}"));
        match text.split_once('.') {
            Some((rev, node)) => Ok(Endpoint {
                rev: rev.parse().map_err(|_| bad())?,
                node: Some(node.parse().map_err(|_| bad())?),
            }),
            None => Ok(Endpoint {
                rev: text.parse().map_err(|_| bad())?,
                node: None,
            }),
        }
    }
}

/// A sorted union of closed revision intervals.
#[derive(Clone, Debug)]
pub struct SubversionRange {
    intervals: Vec<(Endpoint, Endpoint)>,
}

impl SubversionRange {
    /// Parses a selection spec such as `0:HEAD`, `2:4,6`, or `2.1:3.1`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut intervals = Vec::new();
        let mut floor = 0u64;
        for item in text.split(',') {
            if item.contains('-') {
                return Err(DumpError::Range(
                    "use ':' for version ranges instead of '-'".into(),
                ));
            }
            let (lo, hi) = match item.split_once(':') {
                Some((lo, hi)) => {
                    if lo == "HEAD" {
                        return Err(DumpError::Range(
                            "can't accept HEAD as lower bound of a range".into(),
                        ));
                    }
                    let lo = Endpoint::parse(lo, text)?;
                    let hi = if hi == "HEAD" {
                        Endpoint {
                            rev: HEAD_REVISION,
                            node: None,
                        }
                    } else {
                        Endpoint::parse(hi, text)?
                    };
                    (lo, hi)
                }
                None => {
                    let point = Endpoint::parse(item, text)?;
                    (point, point)
                }
            };
            if lo.rev < floor {
                return Err(DumpError::Range(format!(
                    "ill-formed range specification {text:?}"
                )));
            }
            floor = lo.rev;
            intervals.push((lo, hi));
        }
        if intervals.is_empty() {
            return Err(DumpError::Range("empty range specification".into()));
        }
        Ok(SubversionRange { intervals })
    }

    /// The selection covering the whole stream, `0:HEAD`.
    pub fn all() -> Self {
        SubversionRange {
            intervals: vec![(
                Endpoint { rev: 0, node: None },
                Endpoint {
                    rev: HEAD_REVISION,
                    node: None,
                },
            )],
        }
    }

    /// Builds a selection from an ascending list of revision numbers,
    /// merging consecutive runs into intervals.
    pub(crate) fn from_revisions(revisions: &[u64]) -> Self {
        let mut intervals = Vec::new();
        let mut run: Option<(u64, u64)> = None;
        for &rev in revisions {
            run = match run {
                Some((lo, hi)) if rev <= hi + 1 => Some((lo, rev.max(hi))),
                Some((lo, hi)) => {
                    intervals.push((
                        Endpoint { rev: lo, node: None },
                        Endpoint { rev: hi, node: None },
                    ));
                    Some((rev, rev))
                }
                None => Some((rev, rev)),
            };
        }
        if let Some((lo, hi)) = run {
            intervals.push((
                Endpoint { rev: lo, node: None },
                Endpoint { rev: hi, node: None },
            ));
        }
        SubversionRange { intervals }
    }

    /// Whether any interval includes revision `rev`.
    ///
    /// Node qualifiers are ignored; a revision is in range if any node of it
    /// could be.
    pub fn contains(&self, rev: u64) -> bool {
        self.intervals
            .iter()
            .any(|(lo, hi)| rev >= lo.rev && rev <= hi.rev)
    }

    /// Whether any interval includes node `node` (1-origin) of revision
    /// `rev`, comparing `(revision, node)` pairs lexicographically.
    ///
    /// An endpoint without a node qualifier covers the whole revision.
    pub fn contains_node(&self, rev: u64, node: u32) -> bool {
        self.intervals.iter().any(|(lo, hi)| {
            let lo_key = (lo.rev, lo.node.unwrap_or(0));
            let hi_key = (hi.rev, hi.node.unwrap_or(u32::MAX));
            lo_key <= (rev, node) && (rev, node) <= hi_key
        })
    }

    /// The high revision of the last interval.
    pub fn upperbound(&self) -> u64 {
        self.intervals.last().map(|(_, hi)| hi.rev).unwrap_or(0)
    }

    /// Whether any endpoint carries a node qualifier.
    pub fn has_node_qualifiers(&self) -> bool {
        self.intervals
            .iter()
            .any(|(lo, hi)| lo.node.is_some() || hi.node.is_some())
    }
}

/// The hyphen-separated range list found inside `svn:mergeinfo` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeinfoRange {
    intervals: Vec<(u64, u64)>,
}

impl MergeinfoRange {
    /// Parses a range list such as `1-2,4-5` or `1,3,7-9`.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = || DumpError::Range(format!("ill-formed mergeinfo range {text:?}"));
        let mut intervals = Vec::new();
        for item in text.split(',') {
            let (lo, hi) = match item.split_once('-') {
                Some((lo, hi)) => (
                    lo.parse().map_err(|_| bad())?,
                    hi.parse().map_err(|_| bad())?,
                ),
                None => {
                    let rev = item.parse().map_err(|_| bad())?;
                    (rev, rev)
                }
            };
            intervals.push((lo, hi));
        }
        Ok(MergeinfoRange { intervals })
    }

    /// Merges overlapping and adjacent intervals in place.
    pub fn optimize(&mut self) {
        self.intervals.sort_unstable();
        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(self.intervals.len());
        for &(lo, hi) in &self.intervals {
            match merged.last_mut() {
                Some((_, prev_hi)) if lo <= prev_hi.saturating_add(1) => {
                    *prev_hi = (*prev_hi).max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        self.intervals = merged;
    }

    /// Renders the list, collapsing singleton intervals to bare numbers.
    pub fn dump(&self) -> String {
        let items: Vec<String> = self
            .intervals
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    format!("{lo}-{hi}")
                }
            })
            .collect();
        items.join(",")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn contains_covers_closed_intervals() {
        let range = SubversionRange::parse("2:4,6").unwrap();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(range.contains(6));
        assert_eq!(range.upperbound(), 6);
    }

    #[test]
    fn head_is_the_maximum_representable_revision() {
        let range = SubversionRange::parse("3:HEAD").unwrap();
        assert!(range.contains(3));
        assert!(range.contains(u64::MAX));
        assert_eq!(range.upperbound(), HEAD_REVISION);
    }

    #[test]
    fn hyphen_separators_are_rejected() {
        let err = SubversionRange::parse("1-3").unwrap_err();
        assert!(matches!(err, DumpError::Range(_)));
    }

    #[test]
    fn head_lower_bound_is_rejected() {
        assert!(SubversionRange::parse("HEAD:HEAD").is_err());
    }

    #[test]
    fn decreasing_interval_order_is_rejected() {
        assert!(SubversionRange::parse("5,2:3").is_err());
    }

    #[test]
    fn node_granular_membership_is_lexicographic() {
        struct Case {
            spec: &'static str,
            check: &'static [(u64, u32)],
        }
        // Node counts per revision are [0, 1, 3, 2].
        let node_counts: [u32; 4] = [0, 1, 3, 2];
        let cases = [
            Case { spec: "1", check: &[(1, 1)] },
            Case { spec: "2", check: &[(2, 1), (2, 2), (2, 3)] },
            Case { spec: "3", check: &[(3, 1), (3, 2)] },
            Case { spec: "4", check: &[] },
            Case { spec: "1:2", check: &[(1, 1), (2, 1), (2, 2), (2, 3)] },
            Case { spec: "2.2:3", check: &[(2, 2), (2, 3), (3, 1), (3, 2)] },
            Case { spec: "2.1:2.2", check: &[(2, 1), (2, 2)] },
            Case { spec: "2.1:3.1", check: &[(2, 1), (2, 2), (2, 3), (3, 1)] },
            Case { spec: "2.2:3.1", check: &[(2, 2), (2, 3), (3, 1)] },
            Case { spec: "0:1", check: &[(1, 1)] },
            Case { spec: "2,2.3", check: &[(2, 1), (2, 2), (2, 3)] },
            Case { spec: "2.1,2.3", check: &[(2, 1), (2, 3)] },
            Case { spec: "2.1,3", check: &[(2, 1), (3, 1), (3, 2)] },
        ];
        for case in cases {
            let range = SubversionRange::parse(case.spec).unwrap();
            let mut results = Vec::new();
            for (rev, &count) in node_counts.iter().enumerate() {
                for node in 1..=count {
                    if range.contains_node(rev as u64, node) {
                        results.push((rev as u64, node));
                    }
                }
            }
            assert_eq!(results, case.check, "range test of {}", case.spec);
        }
    }

    #[test]
    fn from_revisions_merges_consecutive_runs() {
        let range = SubversionRange::from_revisions(&[0, 1, 2, 4, 7, 8]);
        assert!(range.contains(1));
        assert!(!range.contains(3));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(range.contains(8));
        assert_eq!(range.upperbound(), 8);
    }

    #[test]
    fn optimize_merges_overlapping_and_adjacent_intervals() {
        let cases = [
            ("1-1", "1"),
            ("1-2,4-5", "1-2,4-5"),
            ("1-2,3-4", "1-4"),
            ("1-2,2-3", "1-3"),
            ("1-1,2-2,3-3,5-5", "1-3,5"),
            ("1-1,2-2,3-3,5-5,7-7,8-8", "1-3,5,7-8"),
            ("1,2,3,5-5,7,8", "1-3,5,7-8"),
        ];
        for (before, after) in cases {
            let mut span = MergeinfoRange::parse(before).unwrap();
            span.optimize();
            assert_eq!(span.dump(), after, "optimizing {before}");
        }
    }

    #[test]
    fn mergeinfo_range_rejects_garbage() {
        assert!(MergeinfoRange::parse("1-x").is_err());
        assert!(MergeinfoRange::parse("").is_err());
    }
}
