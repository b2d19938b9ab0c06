//! Header matchers.
//!
//! A matcher tree exists in two forms:
//!
//! - [`MatcherTemplate`] is the immutable description built once from the
//!   configuration. It holds compiled patterns only and is shared across
//!   threads.
//! - [`Matcher`] is the per-document evaluation value produced by
//!   [`MatcherTemplate::instantiate`]. It borrows its patterns from the
//!   template and carries the mutable [`MatchState`].
//!
//! Leaf matchers live in [`text`], [`pattern`], [`copyright`] and [`spdx`];
//! the AND/OR/NOT combinators live in [`combinator`].

use std::fmt;

use serde::Serialize;

use crate::error::MatchError;
use crate::header::HeaderView;

pub mod combinator;
pub mod copyright;
pub mod pattern;
pub mod spdx;
pub mod text;

use combinator::{AllMatcher, AnyMatcher, NotMatcher};
use copyright::{CopyrightMatcher, CopyrightPattern};
use pattern::{RegexMatcher, RegexPattern};
use spdx::{LicenseTagMatcher, LicenseTagPattern};
use text::{FullTextMatcher, FullTextPattern, TextMatcher, TextPattern};

/// Three-valued matcher state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MatchState {
    #[default]
    Indeterminate,
    True,
    False,
}

impl MatchState {
    /// `true` once the state can no longer change within a pass.
    pub fn is_resolved(self) -> bool {
        self != MatchState::Indeterminate
    }

    /// Boolean reading, `None` while indeterminate.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            MatchState::Indeterminate => None,
            MatchState::True => Some(true),
            MatchState::False => Some(false),
        }
    }

    /// Logical complement; unknown stays unknown.
    pub fn negate(self) -> MatchState {
        match self {
            MatchState::Indeterminate => MatchState::Indeterminate,
            MatchState::True => MatchState::False,
            MatchState::False => MatchState::True,
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchState::Indeterminate => write!(f, "indeterminate"),
            MatchState::True => write!(f, "true"),
            MatchState::False => write!(f, "false"),
        }
    }
}

/// The capability set shared by every matcher.
pub trait HeaderMatcher {
    /// Feed one header line and return the state after it.
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError>;

    fn current_state(&self) -> MatchState;

    /// Collapse any indeterminate state to a concrete answer.
    fn finalize(&mut self) -> MatchState;

    /// Back to `Indeterminate`, dropping buffered text.
    fn reset(&mut self);
}

/// Sticky `Indeterminate -> True` machine shared by the line-oriented leaves.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Sticky {
    state: MatchState,
}

impl Sticky {
    /// Run `test` unless already resolved; a hit moves the state to `True`.
    pub(crate) fn observe<F>(&mut self, test: F) -> Result<MatchState, MatchError>
    where
        F: FnOnce() -> Result<bool, MatchError>,
    {
        if self.state.is_resolved() {
            return Ok(self.state);
        }
        if test()? {
            self.state = MatchState::True;
        }
        Ok(self.state)
    }

    /// Record the outcome of a test the caller already ran.
    pub(crate) fn mark(&mut self, hit: bool) -> MatchState {
        if hit && !self.state.is_resolved() {
            self.state = MatchState::True;
        }
        self.state
    }

    pub(crate) fn state(&self) -> MatchState {
        self.state
    }

    pub(crate) fn finalize(&mut self) -> MatchState {
        if self.state == MatchState::Indeterminate {
            self.state = MatchState::False;
        }
        self.state
    }

    pub(crate) fn reset(&mut self) {
        self.state = MatchState::Indeterminate;
    }
}

/// Immutable matcher tree, built once from configuration.
#[derive(Debug, Clone)]
pub enum MatcherTemplate {
    Text(TextPattern),
    FullText(FullTextPattern),
    Regex(RegexPattern),
    Copyright(CopyrightPattern),
    LicenseTag(LicenseTagPattern),
    And(Vec<MatcherTemplate>),
    Or(Vec<MatcherTemplate>),
    Not(Box<MatcherTemplate>),
}

impl MatcherTemplate {
    /// Fresh evaluation state for one document.
    pub fn instantiate(&self) -> Matcher<'_> {
        match self {
            MatcherTemplate::Text(p) => Matcher::Text(TextMatcher::new(p)),
            MatcherTemplate::FullText(p) => Matcher::FullText(FullTextMatcher::new(p)),
            MatcherTemplate::Regex(p) => Matcher::Regex(RegexMatcher::new(p)),
            MatcherTemplate::Copyright(p) => Matcher::Copyright(CopyrightMatcher::new(p)),
            MatcherTemplate::LicenseTag(p) => Matcher::LicenseTag(LicenseTagMatcher::new(p)),
            MatcherTemplate::And(children) => Matcher::And(AllMatcher::new(
                children.iter().map(MatcherTemplate::instantiate).collect(),
            )),
            MatcherTemplate::Or(children) => Matcher::Or(AnyMatcher::new(
                children.iter().map(MatcherTemplate::instantiate).collect(),
            )),
            MatcherTemplate::Not(child) => Matcher::Not(NotMatcher::new(child.instantiate())),
        }
    }
}

impl fmt::Display for MatcherTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, children: &[MatcherTemplate]) -> fmt::Result {
            write!(f, "{}(", name)?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        }

        match self {
            MatcherTemplate::Text(p) => write!(f, "text({:?})", p.phrase()),
            MatcherTemplate::FullText(p) => write!(f, "fulltext({:?})", p.first_line()),
            MatcherTemplate::Regex(p) => write!(f, "regex({:?})", p.source()),
            MatcherTemplate::Copyright(p) => write!(f, "{}", p),
            MatcherTemplate::LicenseTag(p) => write!(f, "spdx({})", p.identifier()),
            MatcherTemplate::And(children) => list(f, "all", children),
            MatcherTemplate::Or(children) => list(f, "any", children),
            MatcherTemplate::Not(child) => write!(f, "not({})", child),
        }
    }
}

/// Per-document evaluation state of a matcher tree.
#[derive(Debug, Clone)]
pub enum Matcher<'t> {
    Text(TextMatcher<'t>),
    FullText(FullTextMatcher<'t>),
    Regex(RegexMatcher<'t>),
    Copyright(CopyrightMatcher<'t>),
    LicenseTag(LicenseTagMatcher<'t>),
    And(AllMatcher<'t>),
    Or(AnyMatcher<'t>),
    Not(NotMatcher<'t>),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Matcher::Text($m) => $body,
            Matcher::FullText($m) => $body,
            Matcher::Regex($m) => $body,
            Matcher::Copyright($m) => $body,
            Matcher::LicenseTag($m) => $body,
            Matcher::And($m) => $body,
            Matcher::Or($m) => $body,
            Matcher::Not($m) => $body,
        }
    };
}

impl HeaderMatcher for Matcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        dispatch!(self, m => m.consume(header))
    }

    fn current_state(&self) -> MatchState {
        dispatch!(self, m => m.current_state())
    }

    fn finalize(&mut self) -> MatchState {
        dispatch!(self, m => m.finalize())
    }

    fn reset(&mut self) {
        dispatch!(self, m => m.reset())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Leaf controlled directly by tests, used to exercise combinators.
    pub(crate) fn text(phrase: &str) -> MatcherTemplate {
        MatcherTemplate::Text(TextPattern::new(phrase))
    }

    pub(crate) fn feed(matcher: &mut Matcher<'_>, lines: &[&str]) -> MatchState {
        let mut state = matcher.current_state();
        for line in lines {
            state = matcher
                .consume(&HeaderView::new(line))
                .expect("full view supported by every matcher");
        }
        state
    }

    fn every_kind() -> Vec<MatcherTemplate> {
        vec![
            text("mit license"),
            MatcherTemplate::FullText(FullTextPattern::new("mit\nlicense")),
            MatcherTemplate::Regex(RegexPattern::new("mit\\s+license").unwrap()),
            MatcherTemplate::Copyright(CopyrightPattern::new(None, None, None).unwrap()),
            MatcherTemplate::LicenseTag(LicenseTagPattern::new("MIT")),
            MatcherTemplate::And(vec![text("mit"), text("license")]),
            MatcherTemplate::Or(vec![text("mit"), text("bsd")]),
            MatcherTemplate::Not(Box::new(text("gpl"))),
        ]
    }

    #[test]
    fn test_match_state_helpers() {
        assert!(!MatchState::Indeterminate.is_resolved());
        assert!(MatchState::True.is_resolved());
        assert_eq!(MatchState::False.as_bool(), Some(false));
        assert_eq!(MatchState::True.negate(), MatchState::False);
        assert_eq!(MatchState::Indeterminate.negate(), MatchState::Indeterminate);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        for template in every_kind() {
            let mut matcher = template.instantiate();
            feed(&mut matcher, &["Copyright 2020 MIT License", "SPDX-License-Identifier: MIT"]);
            matcher.finalize();
            matcher.reset();
            assert_eq!(
                matcher.current_state(),
                MatchState::Indeterminate,
                "{} did not reset",
                template
            );
        }
    }

    #[test]
    fn test_finalize_collapses_indeterminate() {
        for template in every_kind() {
            let mut matcher = template.instantiate();
            feed(&mut matcher, &["nothing to see here"]);
            if matcher.current_state() == MatchState::Indeterminate {
                let finalized = matcher.finalize();
                assert!(finalized.is_resolved(), "{} stayed indeterminate", template);
                feed(&mut matcher, &["Copyright 2020 MIT License GPL"]);
                assert_eq!(matcher.current_state(), finalized, "{} changed after finalize", template);
            }
        }
    }

    #[test]
    fn test_history_does_not_leak_across_reset() {
        let template = MatcherTemplate::FullText(FullTextPattern::new("mit\nlicense text"));
        let mut matcher = template.instantiate();
        feed(&mut matcher, &["mit"]);
        matcher.reset();
        assert_eq!(feed(&mut matcher, &["license text"]), MatchState::Indeterminate);
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_template_display() {
        let template = MatcherTemplate::Or(vec![
            text("MIT License"),
            MatcherTemplate::Not(Box::new(MatcherTemplate::LicenseTag(LicenseTagPattern::new("GPL-2.0")))),
        ]);
        assert_eq!(template.to_string(), "any(text(\"mit license\"), not(spdx(GPL-2.0)))");
    }
}
