//! Content surgery: `strip` and `replace`.

use std::io::{Read, Write};

use crate::dumpfile::{DumpfileSource, NodeRecord, ReportOptions};
use crate::header::{set_length, strip_checksums};
use crate::range::SubversionRange;
use crate::{DumpError, Result};

use super::compile_patterns;

fn emit_with_content(record: &NodeRecord, header: Vec<u8>, content: &[u8]) -> Vec<u8> {
    let mut all = header;
    all.extend_from_slice(&record.properties);
    all.extend_from_slice(content);
    all
}

/// Replaces the content of nodes whose path matches one of `patterns` (all
/// nodes when no patterns are given) with a cookie naming the revision and
/// path. Symbolic-link bodies are preserved; length headers are updated and
/// checksums removed.
pub fn strip<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    patterns: &[String],
) -> Result<()> {
    let regexps = compile_patterns(patterns)?;
    let mut hook = |record: &NodeRecord| {
        let matched = regexps.is_empty()
            || record
                .path()
                .is_some_and(|p| regexps.iter().any(|r| r.is_match(p)));
        if !matched || record.content.is_empty() || record.content.starts_with(b"link ") {
            return Ok(record.serialize());
        }
        let cookie = format!(
            "Revision is {}, file path is {}.\n",
            record.revision,
            String::from_utf8_lossy(record.path().unwrap_or_default())
        );
        let mut header = set_length("Text-content", &record.header, cookie.len());
        header = set_length(
            "Content",
            &header,
            record.properties.len() + cookie.len(),
        );
        header = strip_checksums(&header);
        Ok(emit_with_content(record, header, cookie.as_bytes()))
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut hook),
            ..ReportOptions::default()
        },
    )
}

fn parse_transform(transform: &str) -> Result<(String, String)> {
    let mut chars = transform.chars();
    let delimiter = chars
        .next()
        .ok_or_else(|| DumpError::usage("ill-formed transform specification"))?;
    let parts: Vec<&str> = chars.as_str().split(delimiter).collect();
    if parts.len() != 3 || !parts[2].is_empty() {
        return Err(DumpError::usage("ill-formed transform specification"));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Performs a `/regex/replacement/` substitution on every content body.
/// The delimiter is the first character of `transform` and must also
/// terminate it.
pub fn replace<R: Read, W: Write>(
    source: &mut DumpfileSource<R>,
    out: &mut W,
    selection: &SubversionRange,
    transform: &str,
) -> Result<()> {
    let (pattern, replacement) = parse_transform(transform)?;
    let re = regex::bytes::Regex::new(&pattern)
        .map_err(|err| DumpError::usage(format!("illegal regular expression: {err}")))?;
    let replacement = replacement.into_bytes();
    let mut hook = |record: &NodeRecord| {
        let newcontent = re
            .replace_all(&record.content, replacement.as_slice())
            .into_owned();
        if newcontent == record.content {
            return Ok(record.serialize());
        }
        let mut header = set_length("Text-content", &record.header, newcontent.len());
        header = set_length(
            "Content",
            &header,
            record.properties.len() + newcontent.len(),
        );
        header = strip_checksums(&header);
        Ok(emit_with_content(record, header, &newcontent))
    };
    source.report(
        out,
        selection,
        ReportOptions {
            node_hook: Some(&mut hook),
            ..ReportOptions::default()
        },
    )
}
