//! Regular expression matcher over pruned lines.

use regex::{Regex, RegexBuilder};

use crate::error::{ConfigError, MatchError};
use crate::header::{HeaderView, Projection};

use super::{HeaderMatcher, MatchState, Sticky};

/// A compiled, case-insensitive pattern.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|source_err| ConfigError::Regex {
                pattern: source.to_string(),
                source: source_err,
            })?;
        Ok(Self { regex })
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[derive(Debug, Clone)]
pub struct RegexMatcher<'t> {
    pattern: &'t RegexPattern,
    sticky: Sticky,
}

impl<'t> RegexMatcher<'t> {
    pub fn new(pattern: &'t RegexPattern) -> Self {
        Self {
            pattern,
            sticky: Sticky::default(),
        }
    }
}

impl HeaderMatcher for RegexMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        let pattern = self.pattern;
        self.sticky.observe(|| {
            let line = header.require(Projection::Pruned, "regex")?;
            Ok(pattern.is_match(line))
        })
    }

    fn current_state(&self) -> MatchState {
        self.sticky.state()
    }

    fn finalize(&mut self) -> MatchState {
        self.sticky.finalize()
    }

    fn reset(&mut self) {
        self.sticky.reset();
    }
}
