//! `SPDX-License-Identifier:` tag matcher.
//!
//! The tag prefix is matched case-insensitively on the raw line. The text
//! after the colon is read as a license expression; the matcher fires when
//! any license identifier in it equals the configured id exactly.

use crate::error::MatchError;
use crate::header::{HeaderView, Projection};

use super::{HeaderMatcher, MatchState, Sticky};

const TAG_PREFIX: &str = "spdx-license-identifier";

/// The identifier a [`LicenseTagMatcher`] looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseTagPattern {
    identifier: String,
}

impl LicenseTagPattern {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.trim().to_string(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone)]
pub struct LicenseTagMatcher<'t> {
    pattern: &'t LicenseTagPattern,
    sticky: Sticky,
}

impl<'t> LicenseTagMatcher<'t> {
    pub fn new(pattern: &'t LicenseTagPattern) -> Self {
        Self {
            pattern,
            sticky: Sticky::default(),
        }
    }
}

impl HeaderMatcher for LicenseTagMatcher<'_> {
    fn consume(&mut self, header: &HeaderView) -> Result<MatchState, MatchError> {
        let target = self.pattern.identifier();
        self.sticky.observe(|| {
            let line = header.require(Projection::Raw, "spdx")?;
            Ok(tagged_identifiers(line).iter().any(|id| id == target))
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

/// All license identifiers named by `SPDX-License-Identifier:` tags on
/// `line`. Exception ids following `WITH` are not included.
pub fn tagged_identifiers(line: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets aligned with `line`.
    let folded = line.to_ascii_lowercase();
    let mut ids = Vec::new();
    let mut from = 0;
    while let Some(found) = folded[from..].find(TAG_PREFIX) {
        let after_prefix = from + found + TAG_PREFIX.len();
        from = after_prefix;
        let rest = line[after_prefix..].trim_start();
        if let Some(expr) = rest.strip_prefix(':') {
            ids.extend(license_ids(&tokenize_expression(expr)));
        }
    }
    ids
}

/// Tokens of an SPDX license expression.
#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | ':')
}

/// Tokenize up to the first character that cannot be part of an expression.
fn tokenize_expression(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '(' {
            tokens.push(Token::LParen);
            chars.next();
        } else if c == ')' {
            tokens.push(Token::RParen);
            chars.next();
        } else if is_id_char(c) {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if !is_id_char(c) {
                    break;
                }
                s.push(c);
                chars.next();
            }
            let token = match s.as_str() {
                "AND" | "and" => Token::And,
                "OR" | "or" => Token::Or,
                "WITH" | "with" => Token::With,
                _ => Token::Id(s),
            };
            tokens.push(token);
        } else {
            break;
        }
    }
    tokens
}

fn license_ids(tokens: &[Token]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut after_with = false;
    for token in tokens {
        match token {
            Token::Id(id) if !after_with => ids.push(id.clone()),
            Token::With => {
                after_with = true;
                continue;
            }
            _ => {}
        }
        after_with = false;
    }
    ids
}
