//! Literal phrase matchers.
//!
//! [`TextMatcher`] looks for a single phrase inside one pruned line.
//! [`FullTextMatcher`] looks for a whole paragraph that may be wrapped over
//! any number of lines.

use crate::error::MatchError;
use crate::header::{fold, prune, HeaderView, Projection};

use super::{HeaderMatcher, MatchState, Sticky};

/// A phrase, folded to the pruned comparison form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPattern {
    phrase: String,
}

impl TextPattern {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: fold(phrase),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

#[derive(Debug, Clone)]
pub struct TextMatcher<'t> {
    pattern: &'t TextPattern,
    sticky: Sticky,
}

impl<'t> TextMatcher<'t> {
    pub fn new(pattern: &'t TextPattern) -> Self {
        Self {
            pattern,
            sticky: Sticky::default(),
        }
    }
}

impl HeaderMatcher for TextMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        let phrase = self.pattern.phrase();
        self.sticky.observe(|| {
            let line = header.require(Projection::Pruned, "text")?;
            Ok(line.contains(phrase))
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

/// A multi-line paragraph. The first line of the paragraph must appear
/// within a single header line; the rest may wrap freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTextPattern {
    first_line: String,
    full_text: String,
}

impl FullTextPattern {
    pub fn new(text: &str) -> Self {
        let first_line = text
            .lines()
            .map(prune)
            .find(|line| !line.is_empty())
            .unwrap_or_default();
        Self {
            first_line,
            full_text: prune(text),
        }
    }

    pub fn first_line(&self) -> &str {
        &self.first_line
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }
}

#[derive(Debug, Clone)]
pub struct FullTextMatcher<'t> {
    pattern: &'t FullTextPattern,
    sticky: Sticky,
    seen_first_line: bool,
    buffer: String,
}

impl<'t> FullTextMatcher<'t> {
    pub fn new(pattern: &'t FullTextPattern) -> Self {
        Self {
            pattern,
            sticky: Sticky::default(),
            seen_first_line: false,
            buffer: String::new(),
        }
    }

    fn accept(&mut self, line: &str) -> bool {
        let pattern = self.pattern;
        if self.seen_first_line {
            if line.is_empty() {
                return false;
            }
            self.buffer.push(' ');
            self.buffer.push_str(line);
        } else {
            match line.find(pattern.first_line()) {
                Some(offset) => {
                    self.buffer.push_str(&line[offset..]);
                    self.seen_first_line = true;
                }
                None => return false,
            }
        }

        if self.buffer.len() < pattern.full_text().len() {
            return false;
        }
        if self.buffer.contains(pattern.full_text()) {
            return true;
        }

        // Too long to be a prefix of the paragraph: restart from the next
        // occurrence of the first line, if any.
        let skip = self.buffer.chars().next().map_or(0, char::len_utf8);
        match self.buffer[skip..].find(pattern.first_line()) {
            Some(offset) => {
                self.buffer.drain(..skip + offset);
            }
            None => self.clear(),
        }
        false
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.seen_first_line = false;
    }
}

impl HeaderMatcher for FullTextMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        if self.sticky.state().is_resolved() {
            return Ok(self.sticky.state());
        }
        let line = header.require(Projection::Pruned, "full-text")?;
        let hit = self.accept(line);
        if hit {
            self.clear();
        }
        Ok(self.sticky.mark(hit))
    }

    fn current_state(&self) -> MatchState {
        self.sticky.state()
    }

    fn finalize(&mut self) -> MatchState {
        self.clear();
        self.sticky.finalize()
    }

    fn reset(&mut self) {
        self.clear();
        self.sticky.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consume(matcher: &mut impl HeaderMatcher, line: &str) -> MatchState {
        matcher.consume(&HeaderView::new(line)).unwrap()
    }

    #[test]
    fn test_text_matches_within_pruned_line() {
        let pattern = TextPattern::new("MIT   License");
        let mut matcher = TextMatcher::new(&pattern);
        assert_eq!(consume(&mut matcher, "/* nothing */"), MatchState::Indeterminate);
        assert_eq!(
            consume(&mut matcher, " * Released under the mit LICENSE"),
            MatchState::True
        );
    }

    #[test]
    fn test_text_true_is_always_true() {
        let pattern = TextPattern::new("MIT License");
        let mut matcher = TextMatcher::new(&pattern);
        consume(&mut matcher, "MIT License");
        for line in ["", "GPL", "something else entirely"] {
            assert_eq!(consume(&mut matcher, line), MatchState::True);
        }
        assert_eq!(matcher.finalize(), MatchState::True);
    }

    #[test]
    fn test_text_finalize_without_match_is_false() {
        let pattern = TextPattern::new("MIT License");
        let mut matcher = TextMatcher::new(&pattern);
        consume(&mut matcher, "Apache License");
        assert_eq!(matcher.finalize(), MatchState::False);
        assert_eq!(consume(&mut matcher, "MIT License"), MatchState::False);
        matcher.reset();
        assert_eq!(consume(&mut matcher, "MIT License"), MatchState::True);
    }

    #[test]
    fn test_text_requires_pruned_projection() {
        let pattern = TextPattern::new("MIT");
        let mut matcher = TextMatcher::new(&pattern);
        assert!(matcher.consume(&HeaderView::raw_only("MIT")).is_err());
        assert_eq!(
            matcher.consume(&HeaderView::pruned_only("MIT")).unwrap(),
            MatchState::True
        );
    }

    const APACHE: &str = "Licensed under the Apache License, Version 2.0 (the \"License\");\n\
                          you may not use this file except in compliance with the License.\n\
                          You may obtain a copy of the License at";

    #[test]
    fn test_full_text_matches_rewrapped_paragraph() {
        let pattern = FullTextPattern::new(APACHE);
        let mut matcher = FullTextMatcher::new(&pattern);
        let lines = [
            "/*",
            " * Licensed under the Apache License, Version 2.0 (the \"License\"); you may",
            " * not use this file except in compliance with the License. You may",
            " * obtain a copy of the License at",
            " */",
        ];
        let states: Vec<MatchState> = lines.iter().map(|l| consume(&mut matcher, l)).collect();
        assert_eq!(states[2], MatchState::Indeterminate);
        assert_eq!(states[3], MatchState::True);
        assert_eq!(states[4], MatchState::True);
    }

    #[test]
    fn test_full_text_matches_boxed_paragraph() {
        let pattern = FullTextPattern::new(APACHE);
        let mut matcher = FullTextMatcher::new(&pattern);
        let lines = [
            "/*********************************************************************",
            " * Licensed under the Apache License, Version 2.0 (the \"License\");  *",
            " * you may not use this file except in compliance with the License. *",
            " * You may obtain a copy of the License at                           *",
            " *********************************************************************/",
        ];
        let states: Vec<MatchState> = lines.iter().map(|l| consume(&mut matcher, l)).collect();
        assert_eq!(states[2], MatchState::Indeterminate);
        assert_eq!(states[3], MatchState::True);
    }

    #[test]
    fn test_full_text_rejects_broken_paragraph() {
        let pattern = FullTextPattern::new(APACHE);
        let mut matcher = FullTextMatcher::new(&pattern);
        let lines = [
            "Licensed under the Apache License, Version 2.0 (the \"License\");",
            "you may use this file as you please, whatever the License says.",
            "You may obtain a copy of the License at",
            "http://example.com",
        ];
        for line in lines {
            assert_eq!(consume(&mut matcher, line), MatchState::Indeterminate);
        }
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_full_text_restarts_on_repeated_first_line() {
        let pattern = FullTextPattern::new("alpha beta\ngamma delta");
        let mut matcher = FullTextMatcher::new(&pattern);
        assert_eq!(consume(&mut matcher, "alpha beta"), MatchState::Indeterminate);
        assert_eq!(consume(&mut matcher, "zeta alpha beta"), MatchState::Indeterminate);
        assert_eq!(consume(&mut matcher, "gamma delta"), MatchState::True);
    }

    #[test]
    fn test_full_text_pattern_forms() {
        let pattern = FullTextPattern::new("\n  # First Line\nsecond   LINE\n");
        assert_eq!(pattern.first_line(), "first line");
        assert_eq!(pattern.full_text(), "first line second line");
    }
}
