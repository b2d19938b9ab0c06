//! Copyright statement matcher.
//!
//! The statement is matched on raw text so that line breaks are visible.
//! A small window of consecutive lines is joined with `\n` and tested as a
//! whole, which lets the marker, the date range and the owner wrap onto the
//! next line of a comment block.

use std::collections::VecDeque;
use std::fmt;

use regex::Regex;

use crate::error::{ConfigError, MatchError};
use crate::header::{HeaderView, Projection};

use super::{HeaderMatcher, MatchState, Sticky};

/// Number of consecutive raw lines tested together.
pub const WINDOW_LINES: usize = 3;

const MARKER: &str = r"(?:(?i:\bcopyright\b)|\([Cc]\)|©|&copy;)";

/// Whitespace on one line, or a line break followed by an optional comment
/// continuation marker.
const GAP: &str = r"(?:[ \t]*\r?\n[ \t]*(?:\*|//|#)?[ \t]*|[ \t]+)";

/// Compiled copyright statement.
#[derive(Debug, Clone)]
pub struct CopyrightPattern {
    start: Option<String>,
    stop: Option<String>,
    owner: Option<String>,
    regex: Regex,
}

impl CopyrightPattern {
    /// Build the statement expression. Years must be numeric; a stop year
    /// needs a start year. The owner is a regular expression fragment.
    pub fn new(start: Option<&str>, stop: Option<&str>, owner: Option<&str>) -> Result<Self, ConfigError> {
        let start = non_blank(start);
        let stop = non_blank(stop);
        let owner = non_blank(owner);

        for year in [&start, &stop].into_iter().flatten() {
            if !year.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::InvalidMatcher {
                    kind: "copyright".to_string(),
                    reason: format!("year '{}' is not numeric", year),
                });
            }
        }
        if stop.is_some() && start.is_none() {
            return Err(ConfigError::InvalidMatcher {
                kind: "copyright".to_string(),
                reason: "stop year given without a start year".to_string(),
            });
        }

        let source = expression(start.as_deref(), stop.as_deref(), owner.as_deref());
        let regex = Regex::new(&source).map_err(|err| ConfigError::Regex {
            pattern: source.clone(),
            source: err,
        })?;

        Ok(Self {
            start,
            stop,
            owner,
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Display for CopyrightPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(start) = &self.start {
            parts.push(format!("start={}", start));
        }
        if let Some(stop) = &self.stop {
            parts.push(format!("stop={}", stop));
        }
        if let Some(owner) = &self.owner {
            parts.push(format!("owner={:?}", owner));
        }
        write!(f, "copyright({})", parts.join(", "))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// marker+ [date [- date]] [owner], each separated by a gap.
fn expression(start: Option<&str>, stop: Option<&str>, owner: Option<&str>) -> String {
    let optional_gap = format!("{}?", GAP);
    let mut source = format!("{m}(?:[ \\t]*{m})*", m = MARKER);

    if let Some(start) = start {
        source.push_str(&optional_gap);
        source.push_str(&format!(r"\b{}\b", regex::escape(start)));
        if let Some(stop) = stop {
            source.push_str(&format!(
                r"{gap}-{gap}{stop}\b",
                gap = optional_gap,
                stop = regex::escape(stop)
            ));
        }
    }

    if let Some(owner) = owner {
        if start.is_some() {
            source.push_str(GAP);
        } else {
            source.push_str(&optional_gap);
        }
        source.push_str(&format!("(?:{})", owner));
    }

    source
}

#[derive(Debug, Clone)]
pub struct CopyrightMatcher<'t> {
    pattern: &'t CopyrightPattern,
    sticky: Sticky,
    window: VecDeque<String>,
}

impl<'t> CopyrightMatcher<'t> {
    pub fn new(pattern: &'t CopyrightPattern) -> Self {
        Self {
            pattern,
            sticky: Sticky::default(),
            window: VecDeque::with_capacity(WINDOW_LINES),
        }
    }

    fn window_text(&self) -> String {
        self.window
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HeaderMatcher for CopyrightMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        if self.sticky.state().is_resolved() {
            return Ok(self.sticky.state());
        }
        let line = header.require(Projection::Raw, "copyright")?;
        if self.window.len() == WINDOW_LINES {
            self.window.pop_front();
        }
        self.window.push_back(line.to_string());

        let hit = self.pattern.is_match(&self.window_text());
        if hit {
            tracing::trace!(pattern = %self.pattern, "copyright statement matched");
            self.window.clear();
        }
        Ok(self.sticky.mark(hit))
    }

    fn current_state(&self) -> MatchState {
        self.sticky.state()
    }

    fn finalize(&mut self) -> MatchState {
        self.window.clear();
        self.sticky.finalize()
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sticky.reset();
    }
}
