//! AND / OR / NOT combinators.
//!
//! Combinators never read text themselves. Every line is forwarded to every
//! child so each child's own state stays consistent, and the aggregate is
//! recomputed from the children's current states.

use crate::error::MatchError;
use crate::header::HeaderView;

use super::{HeaderMatcher, MatchState, Matcher};

/// `True` only when every child is `True`; `False` as soon as one is `False`.
#[derive(Debug, Clone)]
pub struct AllMatcher<'t> {
    children: Vec<Matcher<'t>>,
    state: MatchState,
}

impl<'t> AllMatcher<'t> {
    pub fn new(children: Vec<Matcher<'t>>) -> Self {
        let mut matcher = Self {
            children,
            state: MatchState::Indeterminate,
        };
        matcher.recompute();
        matcher
    }

    pub fn children(&self) -> &[Matcher<'t>] {
        &self.children
    }

    fn recompute(&mut self) -> MatchState {
        self.state = all_of(self.children.iter().map(HeaderMatcher::current_state));
        self.state
    }
}

/// `True` as soon as one child is `True`; `False` only when every child is.
#[derive(Debug, Clone)]
pub struct AnyMatcher<'t> {
    children: Vec<Matcher<'t>>,
    state: MatchState,
}

impl<'t> AnyMatcher<'t> {
    pub fn new(children: Vec<Matcher<'t>>) -> Self {
        let mut matcher = Self {
            children,
            state: MatchState::Indeterminate,
        };
        matcher.recompute();
        matcher
    }

    pub fn children(&self) -> &[Matcher<'t>] {
        &self.children
    }

    fn recompute(&mut self) -> MatchState {
        self.state = any_of(self.children.iter().map(HeaderMatcher::current_state));
        self.state
    }
}

/// Complement of the enclosed matcher.
#[derive(Debug, Clone)]
pub struct NotMatcher<'t> {
    child: Box<Matcher<'t>>,
}

impl<'t> NotMatcher<'t> {
    pub fn new(child: Matcher<'t>) -> Self {
        Self {
            child: Box::new(child),
        }
    }
}

/// Aggregate for AND.
pub fn all_of(states: impl IntoIterator<Item = MatchState>) -> MatchState {
    let mut result = MatchState::True;
    for state in states {
        match state {
            MatchState::False => return MatchState::False,
            MatchState::Indeterminate => result = MatchState::Indeterminate,
            MatchState::True => {}
        }
    }
    result
}

/// Aggregate for OR.
pub fn any_of(states: impl IntoIterator<Item = MatchState>) -> MatchState {
    let mut result = MatchState::False;
    for state in states {
        match state {
            MatchState::True => return MatchState::True,
            MatchState::Indeterminate => result = MatchState::Indeterminate,
            MatchState::False => {}
        }
    }
    result
}

fn consume_all(children: &mut [Matcher<'_>], header: &HeaderView) -> Result<(), MatchError> {
    for child in children.iter_mut() {
        child.consume(header)?;
    }
    Ok(())
}

fn finalize_all(children: &mut [Matcher<'_>]) {
    for child in children.iter_mut() {
        child.finalize();
    }
}

fn reset_all(children: &mut [Matcher<'_>]) {
    for child in children.iter_mut() {
        child.reset();
    }
}

impl HeaderMatcher for AllMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        consume_all(&mut self.children, header)?;
        Ok(self.recompute())
    }

    fn current_state(&self) -> MatchState {
        self.state
    }

    fn finalize(&mut self) -> MatchState {
        finalize_all(&mut self.children);
        self.recompute()
    }

    fn reset(&mut self) {
        reset_all(&mut self.children);
        self.recompute();
    }
}

impl HeaderMatcher for AnyMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        consume_all(&mut self.children, header)?;
        Ok(self.recompute())
    }

    fn current_state(&self) -> MatchState {
        self.state
    }

    fn finalize(&mut self) -> MatchState {
        finalize_all(&mut self.children);
        self.recompute()
    }

    fn reset(&mut self) {
        reset_all(&mut self.children);
        self.recompute();
    }
}

impl HeaderMatcher for NotMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        Ok(self.child.consume(header)?.negate())
    }

    fn current_state(&self) -> MatchState {
        self.child.current_state().negate()
    }

    fn finalize(&mut self) -> MatchState {
        self.child.finalize().negate()
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::copyright::CopyrightPattern;
    use crate::matcher::pattern::RegexPattern;
    use crate::matcher::spdx::LicenseTagPattern;
    use crate::matcher::tests::{feed, text};
    use crate::matcher::text::FullTextPattern;
    use crate::matcher::MatcherTemplate;
    use proptest::prelude::*;

    fn state_strategy() -> impl Strategy<Value = MatchState> {
        prop_oneof![
            Just(MatchState::Indeterminate),
            Just(MatchState::True),
            Just(MatchState::False),
        ]
    }

    fn leaf_strategy() -> impl Strategy<Value = MatcherTemplate> {
        prop_oneof![
            Just(text("alpha")),
            Just(MatcherTemplate::FullText(FullTextPattern::new("alpha beta\ngamma delta"))),
            Just(MatcherTemplate::Regex(RegexPattern::new("gam+a").unwrap())),
            Just(MatcherTemplate::Copyright(
                CopyrightPattern::new(Some("2020"), None, Some("Acme")).unwrap()
            )),
            Just(MatcherTemplate::LicenseTag(LicenseTagPattern::new("MIT"))),
        ]
    }

    fn tree_strategy() -> impl Strategy<Value = MatcherTemplate> {
        leaf_strategy().prop_recursive(3, 16, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 1..4).prop_map(MatcherTemplate::And),
                prop::collection::vec(inner.clone(), 1..4).prop_map(MatcherTemplate::Or),
                inner.prop_map(|child| MatcherTemplate::Not(Box::new(child))),
            ]
        })
    }

    fn line_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "alpha beta",
            "gamma delta",
            " * Copyright 2020",
            " *   Acme",
            "// SPDX-License-Identifier: MIT",
            "# SPDX-License-Identifier: GPL-2.0",
            "gammmma",
            "nothing to see",
            "",
        ])
    }

    #[test]
    fn test_or_is_true_as_soon_as_any_child_is() {
        let template = MatcherTemplate::Or(vec![text("alpha"), text("beta")]);
        let mut matcher = template.instantiate();
        assert_eq!(feed(&mut matcher, &["nothing"]), MatchState::Indeterminate);
        assert_eq!(feed(&mut matcher, &["beta"]), MatchState::True);
        assert_eq!(matcher.finalize(), MatchState::True);
    }

    #[test]
    fn test_or_is_false_only_when_all_children_are() {
        let template = MatcherTemplate::Or(vec![text("alpha"), text("beta")]);
        let mut matcher = template.instantiate();
        feed(&mut matcher, &["gamma"]);
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_and_needs_every_child() {
        let template = MatcherTemplate::And(vec![text("alpha"), text("beta")]);
        let mut matcher = template.instantiate();
        assert_eq!(feed(&mut matcher, &["alpha"]), MatchState::Indeterminate);
        assert_eq!(feed(&mut matcher, &["beta"]), MatchState::True);
    }

    #[test]
    fn test_and_is_false_when_one_child_fails() {
        let template = MatcherTemplate::And(vec![
            text("alpha"),
            MatcherTemplate::Not(Box::new(text("beta"))),
        ]);
        let mut matcher = template.instantiate();
        feed(&mut matcher, &["alpha"]);
        // not(beta) turns false the moment beta is seen
        assert_eq!(feed(&mut matcher, &["beta"]), MatchState::False);
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_not_complements_child() {
        let template = MatcherTemplate::Not(Box::new(text("alpha")));
        let mut matcher = template.instantiate();
        assert_eq!(feed(&mut matcher, &["beta"]), MatchState::Indeterminate);
        assert_eq!(matcher.finalize(), MatchState::True);

        matcher.reset();
        assert_eq!(feed(&mut matcher, &["alpha"]), MatchState::False);
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_children_see_every_line() {
        let template = MatcherTemplate::Or(vec![text("alpha"), text("beta")]);
        let mut matcher = template.instantiate();
        feed(&mut matcher, &["alpha", "beta"]);
        let Matcher::Or(any) = &matcher else {
            panic!("expected an OR matcher");
        };
        assert!(any
            .children()
            .iter()
            .all(|child| child.current_state() == MatchState::True));
    }

    #[test]
    fn test_reset_is_recursive() {
        let template = MatcherTemplate::And(vec![
            text("alpha"),
            MatcherTemplate::Or(vec![text("beta"), text("gamma")]),
        ]);
        let mut matcher = template.instantiate();
        assert_eq!(feed(&mut matcher, &["alpha", "gamma"]), MatchState::True);
        matcher.reset();
        assert_eq!(matcher.current_state(), MatchState::Indeterminate);
        assert_eq!(feed(&mut matcher, &["beta"]), MatchState::Indeterminate);
        assert_eq!(matcher.finalize(), MatchState::False);
    }

    #[test]
    fn test_empty_combinators() {
        assert_eq!(all_of(Vec::<MatchState>::new()), MatchState::True);
        assert_eq!(any_of(Vec::<MatchState>::new()), MatchState::False);
    }

    proptest! {
        #[test]
        fn aggregates_ignore_child_order(mut states in prop::collection::vec(state_strategy(), 1..6)) {
            let all = all_of(states.clone());
            let any = any_of(states.clone());
            states.reverse();
            prop_assert_eq!(all_of(states.clone()), all);
            prop_assert_eq!(any_of(states), any);
        }

        #[test]
        fn and_or_identities(states in prop::collection::vec(state_strategy(), 1..6)) {
            let has = |s: MatchState| states.contains(&s);
            let all = all_of(states.clone());
            let any = any_of(states.clone());
            prop_assert_eq!(all == MatchState::False, has(MatchState::False));
            prop_assert_eq!(all == MatchState::True, states.iter().all(|s| *s == MatchState::True));
            prop_assert_eq!(any == MatchState::True, has(MatchState::True));
            prop_assert_eq!(any == MatchState::False, states.iter().all(|s| *s == MatchState::False));
        }

        #[test]
        fn resolved_states_are_sticky(
            template in tree_strategy(),
            lines in prop::collection::vec(line_strategy(), 1..16),
        ) {
            let mut matcher = template.instantiate();
            let mut resolved: Option<MatchState> = None;
            for line in &lines {
                let state = feed(&mut matcher, &[*line]);
                if let Some(previous) = resolved {
                    prop_assert_eq!(state, previous);
                } else if state.is_resolved() {
                    resolved = Some(state);
                }
            }
            let last = matcher.finalize();
            prop_assert!(last.is_resolved());
            if let Some(previous) = resolved {
                prop_assert_eq!(last, previous);
            }
        }
    }
}
