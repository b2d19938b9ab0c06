//! Registry of license definitions and the approval rules over them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::ConfigError;
use crate::matcher::MatcherTemplate;

use super::builder::build_matcher_with;
use super::{license_id, make_category, Definitions, FamilySpec, LicenseDefinition, LicenseFamily, LicenseSpec};

/// Selects which part of the registry a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseFilter {
    #[default]
    All,
    Approved,
    None,
}

impl fmt::Display for LicenseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseFilter::All => write!(f, "all"),
            LicenseFilter::Approved => write!(f, "approved"),
            LicenseFilter::None => write!(f, "none"),
        }
    }
}

/// Immutable set of license definitions, shared across evaluations.
#[derive(Debug)]
pub struct LicenseRegistry {
    families: BTreeMap<String, LicenseFamily>,
    licenses: BTreeMap<String, LicenseDefinition>,
    approved_categories: BTreeSet<String>,
    removed_categories: BTreeSet<String>,
    approved_ids: BTreeSet<String>,
    removed_ids: BTreeSet<String>,
}

impl LicenseRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LicenseDefinition> {
        self.licenses.get(id)
    }

    /// Every definition, ordered by id.
    pub fn definitions(&self) -> impl Iterator<Item = &LicenseDefinition> {
        self.licenses.values()
    }

    fn is_approved_category(&self, category: &str) -> bool {
        self.approved_categories.contains(category) && !self.removed_categories.contains(category)
    }

    /// `(category approved and not removed, or id approved) and id not removed`.
    pub fn is_approved(&self, license: &LicenseDefinition) -> bool {
        let id = license.id();
        if self.removed_ids.contains(id) {
            return false;
        }
        self.is_approved_category(license.family().category()) || self.approved_ids.contains(id)
    }

    pub fn licenses(&self, filter: LicenseFilter) -> Vec<&LicenseDefinition> {
        match filter {
            LicenseFilter::All => self.licenses.values().collect(),
            LicenseFilter::Approved => self.licenses.values().filter(|l| self.is_approved(l)).collect(),
            LicenseFilter::None => Vec::new(),
        }
    }

    pub fn families(&self, filter: LicenseFilter) -> Vec<&LicenseFamily> {
        match filter {
            LicenseFilter::All => self.families.values().collect(),
            LicenseFilter::Approved => self
                .families
                .values()
                .filter(|f| self.is_approved_category(f.category()))
                .collect(),
            LicenseFilter::None => Vec::new(),
        }
    }

    pub fn license_ids(&self, filter: LicenseFilter) -> BTreeSet<String> {
        self.licenses(filter).into_iter().map(|l| l.id().to_string()).collect()
    }

    /// Category codes. `Approved` also includes categories of licenses
    /// approved by id.
    pub fn family_categories(&self, filter: LicenseFilter) -> BTreeSet<String> {
        match filter {
            LicenseFilter::All => self.families.keys().cloned().collect(),
            LicenseFilter::Approved => {
                let mut categories: BTreeSet<String> = self
                    .approved_categories
                    .difference(&self.removed_categories)
                    .cloned()
                    .collect();
                categories.extend(
                    self.licenses(LicenseFilter::Approved)
                        .into_iter()
                        .map(|l| l.family().category().to_string()),
                );
                categories
            }
            LicenseFilter::None => BTreeSet::new(),
        }
    }
}

/// Collects families, license specs and approval rules, then validates and
/// compiles them into a [`LicenseRegistry`].
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    families: Vec<FamilySpec>,
    licenses: Vec<LicenseSpec>,
    approved_categories: BTreeSet<String>,
    removed_categories: BTreeSet<String>,
    approved_ids: BTreeSet<String>,
    removed_ids: BTreeSet<String>,
}

impl RegistryBuilder {
    pub fn family(&mut self, family: FamilySpec) -> &mut Self {
        self.families.push(family);
        self
    }

    pub fn license(&mut self, license: LicenseSpec) -> &mut Self {
        self.licenses.push(license);
        self
    }

    /// Add everything one definitions source declared, approvals included.
    pub fn definitions(&mut self, definitions: Definitions) -> &mut Self {
        self.families.extend(definitions.families);
        self.licenses.extend(definitions.licenses);
        for family in &definitions.approved_families {
            self.approve_family(family);
        }
        for id in &definitions.approved_licenses {
            self.approve_license(id);
        }
        self
    }

    pub fn approve_family(&mut self, family: &str) -> &mut Self {
        self.approved_categories.insert(make_category(family));
        self
    }

    pub fn remove_family(&mut self, family: &str) -> &mut Self {
        self.removed_categories.insert(make_category(family));
        self
    }

    pub fn approve_license(&mut self, id: &str) -> &mut Self {
        self.approved_ids.insert(id.trim().to_string());
        self
    }

    pub fn remove_license(&mut self, id: &str) -> &mut Self {
        self.removed_ids.insert(id.trim().to_string());
        self
    }

    pub fn build(&self) -> Result<LicenseRegistry, ConfigError> {
        if self.licenses.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        let mut families = BTreeMap::new();
        for spec in &self.families {
            let family = LicenseFamily::new(&spec.id, &spec.name)?;
            families.insert(family.category().to_string(), family);
        }

        let mut specs: BTreeMap<String, &LicenseSpec> = BTreeMap::new();
        let mut license_families = Vec::with_capacity(self.licenses.len());
        for spec in &self.licenses {
            let family_code = spec.family.trim();
            if family_code.is_empty() {
                return Err(ConfigError::MissingField {
                    context: format!("license '{}'", spec.id.trim()),
                    field: "family",
                });
            }
            let category = make_category(family_code);
            let family = match families.get(&category) {
                Some(family) => family.clone(),
                None => {
                    debug!(family = %family_code, license = %spec.id, "registering undeclared family");
                    let family = LicenseFamily::new(family_code, family_code)?;
                    families.insert(category, family.clone());
                    family
                }
            };

            let id = license_id(spec)?;
            if specs.insert(id.to_string(), spec).is_some() {
                return Err(ConfigError::DuplicateLicense(id.to_string()));
            }
            license_families.push(family);
        }

        for (id, spec) in &specs {
            if let Some(parent) = spec.derived_from.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                if !specs.contains_key(parent) {
                    return Err(ConfigError::UnknownLicenseRef {
                        license: id.clone(),
                        reference: parent.to_string(),
                    });
                }
            }
        }

        let mut resolver = MatcherResolver {
            specs: &specs,
            built: BTreeMap::new(),
            path: Vec::new(),
        };
        let mut licenses = BTreeMap::new();
        for (spec, family) in self.licenses.iter().zip(license_families) {
            let matcher = resolver.resolve(spec.id.trim())?;
            let definition = LicenseDefinition::with_matcher(spec, family, matcher)?;
            licenses.insert(definition.id().to_string(), definition);
        }

        debug!(
            licenses = licenses.len(),
            families = families.len(),
            approved_families = self.approved_categories.len(),
            approved_licenses = self.approved_ids.len(),
            "license registry built"
        );

        Ok(LicenseRegistry {
            families,
            licenses,
            approved_categories: self.approved_categories.clone(),
            removed_categories: self.removed_categories.clone(),
            approved_ids: self.approved_ids.clone(),
            removed_ids: self.removed_ids.clone(),
        })
    }
}

/// Compiles license matchers by id, following `license_ref` links. Each
/// license is compiled once; a reference receives a copy of the tree.
struct MatcherResolver<'a> {
    specs: &'a BTreeMap<String, &'a LicenseSpec>,
    built: BTreeMap<String, MatcherTemplate>,
    /// Licenses currently being compiled, outermost first.
    path: Vec<String>,
}

impl MatcherResolver<'_> {
    fn resolve(&mut self, id: &str) -> Result<MatcherTemplate, ConfigError> {
        if let Some(template) = self.built.get(id) {
            return Ok(template.clone());
        }
        if let Some(start) = self.path.iter().position(|p| p == id) {
            let mut cycle = self.path[start..].to_vec();
            cycle.push(id.to_string());
            return Err(ConfigError::LicenseRefCycle(cycle.join(" -> ")));
        }
        let specs = self.specs;
        let spec = specs.get(id).ok_or_else(|| ConfigError::UnknownLicenseRef {
            license: self.path.last().cloned().unwrap_or_default(),
            reference: id.to_string(),
        })?;

        self.path.push(id.to_string());
        let template = build_matcher_with(&spec.matcher, &mut |reference: &str| self.resolve(reference));
        self.path.pop();

        let template = template?;
        self.built.insert(id.to_string(), template.clone());
        Ok(template)
    }
}
