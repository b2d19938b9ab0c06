//! Header text normalization and the per-line [`HeaderView`].
//!
//! Matchers never see a document directly. Every physical line is wrapped in
//! a [`HeaderView`] carrying the verbatim text (`raw`) and the comparison
//! form produced by [`prune`] (`pruned`).

use std::fmt;

use crate::error::MatchError;

/// Comment markers removed from the start of a line, longest first.
/// Matched against lowercased text.
const LEADING_MARKERS: &[&str] = &[
    "<!--", "-->", "/*", "*/", "//", "~~", "--", "&copy;", "\u{a9}", "*", "#", ";",
];

/// Block comment closers and box borders removed from the end of a line.
/// `;` is left alone: it ends sentences.
const TRAILING_MARKERS: &[&str] = &["*/", "-->", "//", "--", "*", "#"];

/// Produce the pruned comparison form of `text`.
///
/// The text is lowercased, comment markers are stripped from both ends of
/// every physical line, whitespace runs collapse to a single space and lines
/// are joined with a space. Word order is never changed.
pub fn prune(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut words: Vec<&str> = Vec::new();
    for line in lower.lines() {
        words.extend(strip_markers(line).split_whitespace());
    }
    words.join(" ")
}

/// Whitespace and case folding only. Used for configured phrases, which
/// must keep any leading punctuation they were written with.
pub fn fold(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn strip_markers(line: &str) -> &str {
    let mut rest = line.trim();
    loop {
        let before = rest.len();
        if let Some(marker) = LEADING_MARKERS.iter().find(|m| rest.starts_with(**m)) {
            rest = rest[marker.len()..].trim_start();
        }
        if let Some(marker) = TRAILING_MARKERS.iter().find(|m| rest.ends_with(**m)) {
            rest = rest[..rest.len() - marker.len()].trim_end();
        }
        if rest.len() == before {
            return rest;
        }
    }
}

/// Which projection of a header line a matcher reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Raw,
    Pruned,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Raw => write!(f, "raw"),
            Projection::Pruned => write!(f, "pruned"),
        }
    }
}

/// One line of header text as presented to matchers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderView {
    raw: Option<String>,
    pruned: Option<String>,
}

impl HeaderView {
    /// Build both projections of `line`.
    pub fn new(line: &str) -> Self {
        Self {
            raw: Some(line.to_string()),
            pruned: Some(prune(line)),
        }
    }

    /// A view exposing only the verbatim text.
    pub fn raw_only(line: &str) -> Self {
        Self {
            raw: Some(line.to_string()),
            pruned: None,
        }
    }

    /// A view exposing only the pruned text.
    pub fn pruned_only(line: &str) -> Self {
        Self {
            raw: None,
            pruned: Some(prune(line)),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn pruned(&self) -> Option<&str> {
        self.pruned.as_deref()
    }

    /// Fetch `projection` on behalf of `matcher`, failing if the view was
    /// built without it.
    pub fn require(&self, projection: Projection, matcher: &'static str) -> Result<&str, MatchError> {
        let text = match projection {
            Projection::Raw => self.raw(),
            Projection::Pruned => self.pruned(),
        };
        text.ok_or(MatchError::UnsupportedProjection {
            matcher,
            projection,
        })
    }
}
