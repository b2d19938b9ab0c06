//! License identities, families and the rules that approve them.
//!
//! - [`builder`] turns declarative [`MatcherExpr`] trees into
//!   [`MatcherTemplate`]s.
//! - [`registry`] holds every [`LicenseDefinition`] plus the approval sets
//!   and answers the All/Approved/None queries.
//! - [`xml`] reads license definitions from XML, including the built-in
//!   default set.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matcher::MatcherTemplate;

pub mod builder;
pub mod registry;
pub mod xml;

/// Width of a family category code.
pub const CATEGORY_WIDTH: usize = 5;

/// Family category of documents that matched nothing.
pub const UNKNOWN_CATEGORY: &str = "?????";

/// Normalize a family code to exactly [`CATEGORY_WIDTH`] characters,
/// truncating or padding with spaces.
pub fn make_category(code: &str) -> String {
    let mut category: String = code.trim().chars().take(CATEGORY_WIDTH).collect();
    let len = category.chars().count();
    category.extend(std::iter::repeat(' ').take(CATEGORY_WIDTH - len));
    category
}

/// A group of related license identities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LicenseFamily {
    category: String,
    name: String,
}

impl LicenseFamily {
    pub fn new(category: &str, name: &str) -> Result<Self, ConfigError> {
        if category.trim().is_empty() {
            return Err(ConfigError::MissingField {
                context: format!("family '{}'", name),
                field: "category",
            });
        }
        if name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                context: format!("family '{}'", category.trim()),
                field: "name",
            });
        }
        Ok(Self {
            category: make_category(category),
            name: name.trim().to_string(),
        })
    }

    /// The sentinel family of unmatched documents.
    pub fn unknown() -> Self {
        Self {
            category: UNKNOWN_CATEGORY.to_string(),
            name: "Unknown license".to_string(),
        }
    }

    /// Fixed-width category code.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declarative matcher tree, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatcherExpr {
    /// Phrase within one line; a phrase with line breaks is matched as a
    /// full paragraph.
    Text { text: String },
    Regex { pattern: String },
    Copyright {
        start: Option<String>,
        #[serde(alias = "end")]
        stop: Option<String>,
        owner: Option<String>,
    },
    /// `SPDX-License-Identifier` tag.
    Spdx { name: String },
    Any { matchers: Vec<MatcherExpr> },
    All { matchers: Vec<MatcherExpr> },
    Not { matcher: Box<MatcherExpr> },
    /// Reuse the matcher tree of another license.
    #[serde(rename = "license_ref")]
    LicenseRef { id: String },
}

impl MatcherExpr {
    pub fn kind(&self) -> &'static str {
        match self {
            MatcherExpr::Text { .. } => "text",
            MatcherExpr::Regex { .. } => "regex",
            MatcherExpr::Copyright { .. } => "copyright",
            MatcherExpr::Spdx { .. } => "spdx",
            MatcherExpr::Any { .. } => "any",
            MatcherExpr::All { .. } => "all",
            MatcherExpr::Not { .. } => "not",
            MatcherExpr::LicenseRef { .. } => "license_ref",
        }
    }
}

/// Declared license family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySpec {
    pub id: String,
    pub name: String,
}

/// Declarative license definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSpec {
    pub id: String,
    pub family: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Id of the license this one is a variant of.
    #[serde(default, alias = "derived-from")]
    pub derived_from: Option<String>,
    pub matcher: MatcherExpr,
}

/// Everything one configuration source contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    pub families: Vec<FamilySpec>,
    pub licenses: Vec<LicenseSpec>,
    pub approved_families: Vec<String>,
    pub approved_licenses: Vec<String>,
}

impl Definitions {
    /// Append the contents of `other`.
    pub fn merge(&mut self, other: Definitions) {
        self.families.extend(other.families);
        self.licenses.extend(other.licenses);
        self.approved_families.extend(other.approved_families);
        self.approved_licenses.extend(other.approved_licenses);
    }
}

/// A configured license: identity, family, and the matcher that recognizes
/// it. Immutable once built.
#[derive(Debug, Clone)]
pub struct LicenseDefinition {
    id: String,
    family: LicenseFamily,
    name: String,
    notes: Option<String>,
    derived_from: Option<String>,
    matcher: MatcherTemplate,
}

/// Trimmed license id, rejecting blanks.
pub(crate) fn license_id(spec: &LicenseSpec) -> Result<&str, ConfigError> {
    let id = spec.id.trim();
    if id.is_empty() {
        return Err(ConfigError::MissingField {
            context: format!("license in family '{}'", spec.family.trim()),
            field: "id",
        });
    }
    Ok(id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl LicenseDefinition {
    /// Build from a declarative spec. `family` must already be resolved.
    /// A `license_ref` matcher can only be built through a registry.
    pub fn build(spec: &LicenseSpec, family: LicenseFamily) -> Result<Self, ConfigError> {
        license_id(spec)?;
        let matcher = builder::build_matcher(&spec.matcher)?;
        Self::with_matcher(spec, family, matcher)
    }

    pub(crate) fn with_matcher(
        spec: &LicenseSpec,
        family: LicenseFamily,
        matcher: MatcherTemplate,
    ) -> Result<Self, ConfigError> {
        let id = license_id(spec)?;
        Ok(Self {
            id: id.to_string(),
            family,
            name: non_blank(spec.name.as_deref()).unwrap_or(id).to_string(),
            notes: non_blank(spec.notes.as_deref()).map(str::to_string),
            derived_from: non_blank(spec.derived_from.as_deref()).map(str::to_string),
            matcher,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn family(&self) -> &LicenseFamily {
        &self.family
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Id of the license this one is a variant of.
    pub fn derived_from(&self) -> Option<&str> {
        self.derived_from.as_deref()
    }

    pub fn matcher(&self) -> &MatcherTemplate {
        &self.matcher
    }
}
