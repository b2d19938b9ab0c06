use crate::error::ConfigError;
use crate::matcher::copyright::CopyrightPattern;
use crate::matcher::pattern::RegexPattern;
use crate::matcher::spdx::LicenseTagPattern;
use crate::matcher::text::{FullTextPattern, TextPattern};
use crate::matcher::MatcherTemplate;

use super::MatcherExpr;

/// Validate a declarative matcher tree and compile it.
///
/// A `text` phrase that spans several lines becomes a full-text matcher;
/// single-line phrases become plain substring matchers. `license_ref`
/// leaves are rejected: they need the registry to resolve them, see
/// [`build_matcher_with`].
pub fn build_matcher(expr: &MatcherExpr) -> Result<MatcherTemplate, ConfigError> {
    build_matcher_with(expr, &mut |id: &str| {
        Err(ConfigError::InvalidMatcher {
            kind: "license_ref".to_string(),
            reason: format!("reference to '{}' outside a license registry", id),
        })
    })
}

/// Like [`build_matcher`], with `resolve` supplying the compiled matcher of
/// each license named by a `license_ref` leaf.
pub fn build_matcher_with<F>(expr: &MatcherExpr, resolve: &mut F) -> Result<MatcherTemplate, ConfigError>
where
    F: FnMut(&str) -> Result<MatcherTemplate, ConfigError>,
{
    match expr {
        MatcherExpr::Text { text } => {
            let phrase = text.trim();
            if phrase.is_empty() {
                return Err(missing("text matcher", "text"));
            }
            if phrase.contains('\n') {
                let pattern = FullTextPattern::new(phrase);
                // a paragraph of comment markers prunes to nothing
                if pattern.full_text().is_empty() {
                    return Err(missing("text matcher", "text"));
                }
                Ok(MatcherTemplate::FullText(pattern))
            } else {
                Ok(MatcherTemplate::Text(TextPattern::new(phrase)))
            }
        }
        MatcherExpr::Regex { pattern } => {
            if pattern.trim().is_empty() {
                return Err(missing("regex matcher", "pattern"));
            }
            Ok(MatcherTemplate::Regex(RegexPattern::new(pattern.trim())?))
        }
        MatcherExpr::Copyright { start, stop, owner } => Ok(MatcherTemplate::Copyright(
            CopyrightPattern::new(start.as_deref(), stop.as_deref(), owner.as_deref())?,
        )),
        MatcherExpr::Spdx { name } => {
            if name.trim().is_empty() {
                return Err(missing("spdx matcher", "name"));
            }
            Ok(MatcherTemplate::LicenseTag(LicenseTagPattern::new(name)))
        }
        MatcherExpr::Any { matchers } => Ok(MatcherTemplate::Or(build_children(expr, matchers, resolve)?)),
        MatcherExpr::All { matchers } => Ok(MatcherTemplate::And(build_children(expr, matchers, resolve)?)),
        MatcherExpr::Not { matcher } => Ok(MatcherTemplate::Not(Box::new(build_matcher_with(matcher, resolve)?))),
        MatcherExpr::LicenseRef { id } => {
            if id.trim().is_empty() {
                return Err(missing("license_ref matcher", "id"));
            }
            resolve(id.trim())
        }
    }
}

fn build_children<F>(
    parent: &MatcherExpr,
    children: &[MatcherExpr],
    resolve: &mut F,
) -> Result<Vec<MatcherTemplate>, ConfigError>
where
    F: FnMut(&str) -> Result<MatcherTemplate, ConfigError>,
{
    if children.is_empty() {
        return Err(ConfigError::InvalidMatcher {
            kind: parent.kind().to_string(),
            reason: "at least one enclosed matcher is required".to_string(),
        });
    }
    let mut built = Vec::with_capacity(children.len());
    for child in children {
        built.push(build_matcher_with(child, resolve)?);
    }
    Ok(built)
}

fn missing(context: &str, field: &'static str) -> ConfigError {
    ConfigError::MissingField {
        context: context.to_string(),
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> MatcherExpr {
        MatcherExpr::Text { text: s.to_string() }
    }

    #[test]
    fn test_single_line_text_is_substring_matcher() {
        let template = build_matcher(&text("  The MIT License ")).unwrap();
        assert!(matches!(template, MatcherTemplate::Text(ref p) if p.phrase() == "the mit license"));
    }

    #[test]
    fn test_multi_line_text_is_full_text_matcher() {
        let template = build_matcher(&text("Licensed under the Apache License\nVersion 2.0")).unwrap();
        assert!(matches!(template, MatcherTemplate::FullText(_)));
    }

    #[test]
    fn test_blank_leaves_are_rejected() {
        assert!(matches!(
            build_matcher(&text("   ")),
            Err(ConfigError::MissingField { field: "text", .. })
        ));
        assert!(matches!(
            build_matcher(&text("/*\n *\n */")),
            Err(ConfigError::MissingField { field: "text", .. })
        ));
        assert!(matches!(
            build_matcher(&MatcherExpr::Regex { pattern: "".to_string() }),
            Err(ConfigError::MissingField { field: "pattern", .. })
        ));
        assert!(matches!(
            build_matcher(&MatcherExpr::Spdx { name: " ".to_string() }),
            Err(ConfigError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = build_matcher(&MatcherExpr::Regex {
            pattern: "[a-".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Regex { .. }));
    }

    #[test]
    fn test_combinators_need_children() {
        let err = build_matcher(&MatcherExpr::Any { matchers: vec![] }).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatcher { ref kind, .. } if kind == "any"));
        let err = build_matcher(&MatcherExpr::All { matchers: vec![] }).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatcher { ref kind, .. } if kind == "all"));
    }

    #[test]
    fn test_nested_errors_surface() {
        let expr = MatcherExpr::Not {
            matcher: Box::new(MatcherExpr::All {
                matchers: vec![
                    text("alpha"),
                    MatcherExpr::Copyright {
                        start: Some("twenty".to_string()),
                        stop: None,
                        owner: None,
                    },
                ],
            }),
        };
        assert!(matches!(build_matcher(&expr), Err(ConfigError::InvalidMatcher { .. })));
    }

    #[test]
    fn test_empty_copyright_is_legal() {
        let template = build_matcher(&MatcherExpr::Copyright {
            start: None,
            stop: None,
            owner: None,
        })
        .unwrap();
        assert_eq!(template.to_string(), "copyright()");
    }

    #[test]
    fn test_reference_is_resolved_by_caller() {
        let expr = MatcherExpr::All {
            matchers: vec![
                text("variant"),
                MatcherExpr::LicenseRef { id: " MIT ".to_string() },
            ],
        };
        let mut asked = Vec::new();
        let template = build_matcher_with(&expr, &mut |id: &str| {
            asked.push(id.to_string());
            build_matcher(&MatcherExpr::Spdx { name: "MIT".to_string() })
        })
        .unwrap();
        assert_eq!(asked, vec!["MIT".to_string()]);
        assert_eq!(template.to_string(), "all(text(\"variant\"), spdx(MIT))");

        assert!(matches!(
            build_matcher(&expr),
            Err(ConfigError::InvalidMatcher { ref kind, .. }) if kind == "license_ref"
        ));
        assert!(matches!(
            build_matcher(&MatcherExpr::LicenseRef { id: "".to_string() }),
            Err(ConfigError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn test_tree_shape() {
        let expr = MatcherExpr::Any {
            matchers: vec![
                text("MIT License"),
                MatcherExpr::Spdx { name: "MIT".to_string() },
                MatcherExpr::Not {
                    matcher: Box::new(MatcherExpr::Regex {
                        pattern: "gpl".to_string(),
                    }),
                },
            ],
        };
        assert_eq!(
            build_matcher(&expr).unwrap().to_string(),
            "any(text(\"mit license\"), spdx(MIT), not(regex(\"gpl\")))"
        );
    }
}
