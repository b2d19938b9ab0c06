use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::analysis::HeaderLimits;
use crate::error::ConfigError;
use crate::license::registry::{LicenseRegistry, RegistryBuilder};
use crate::license::xml::{default_definitions, read_definitions_file};
use crate::license::{FamilySpec, LicenseSpec};

/// Root configuration structure, deserialized from `.header-checkr/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How much of each document is scanned.
    pub header: HeaderLimits,
    /// Where license definitions come from.
    pub licenses: LicenseSources,
    /// Approval rules applied on top of the definitions.
    pub approval: ApprovalConfig,
    /// Families declared inline.
    #[serde(rename = "family")]
    pub families: Vec<FamilySpec>,
    /// Licenses declared inline.
    #[serde(rename = "license")]
    pub inline_licenses: Vec<LicenseSpec>,
    /// File the configuration was read from; relative definition paths are
    /// resolved against its directory.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LicenseSources {
    /// Load the built-in definitions. Defaults to `true`.
    pub defaults: bool,
    /// Additional XML definition files.
    pub definitions: Vec<PathBuf>,
}

impl Default for LicenseSources {
    fn default() -> Self {
        Self {
            defaults: true,
            definitions: Vec::new(),
        }
    }
}

/// Family codes and license ids to approve or withdraw.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    pub families: Vec<String>,
    pub licenses: Vec<String>,
    pub remove_families: Vec<String>,
    pub remove_licenses: Vec<String>,
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.source.as_deref().and_then(Path::parent) {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Collect every definition source and approval rule, validate and
    /// compile the registry.
    pub fn build_registry(&self) -> Result<LicenseRegistry, ConfigError> {
        let mut builder = RegistryBuilder::default();
        if self.licenses.defaults {
            builder.definitions(default_definitions()?);
        }
        for path in &self.licenses.definitions {
            let path = self.resolve(path);
            debug!(path = %path.display(), "reading license definitions");
            builder.definitions(read_definitions_file(&path)?);
        }
        for family in &self.families {
            builder.family(family.clone());
        }
        for license in &self.inline_licenses {
            builder.license(license.clone());
        }

        for family in &self.approval.families {
            builder.approve_family(family);
        }
        for id in &self.approval.licenses {
            builder.approve_license(id);
        }
        for family in &self.approval.remove_families {
            builder.remove_family(family);
        }
        for id in &self.approval.remove_licenses {
            builder.remove_license(id);
        }

        builder.build()
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.header-checkr/config.toml`
/// 3. `~/.config/header-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = config_override {
        return Config::read(path);
    }

    let project_config = project_path.join(".header-checkr").join("config.toml");
    if project_config.exists() {
        return Config::read(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("header-checkr")
            .join("config.toml");
        if home_config.exists() {
            return Config::read(&home_config);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::registry::LicenseFilter;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.licenses.defaults);
        assert_eq!(config.header.max_lines, 50);
        let registry = config.build_registry().unwrap();
        assert!(registry.get("MIT").is_some());
        assert!(registry.get("AL2.0").is_some());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
[header]
max_lines = 20
max_bytes = 4096

[licenses]
defaults = false

[approval]
families = ["ACME"]
remove_licenses = ["ACME-OLD"]

[[family]]
id = "ACME"
name = "Acme Corporate"

[[license]]
id = "ACME-1"
family = "ACME"
name = "Acme License 1"
matcher = { type = "all", matchers = [
  { type = "copyright", owner = "Acme" },
  { type = "text", text = "Acme License" },
] }

[[license]]
id = "ACME-OLD"
family = "ACME"
matcher = { type = "text", text = "Acme Legacy License" }
"#,
        )
        .unwrap();

        assert_eq!(config.header.max_lines, 20);
        assert_eq!(config.header.max_bytes, Some(4096));
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("ACME-1").unwrap().family().name(), "Acme Corporate");
        assert_eq!(
            registry.license_ids(LicenseFilter::Approved).into_iter().collect::<Vec<_>>(),
            vec!["ACME-1".to_string()]
        );
    }

    #[test]
    fn test_inline_license_refers_to_built_in() {
        let config = Config::from_toml(
            r#"
[[license]]
id = "MIT-VARIANT"
family = "MIT"
derived_from = "MIT"
matcher = { type = "license_ref", id = "MIT" }
"#,
        )
        .unwrap();
        let registry = config.build_registry().unwrap();
        let variant = registry.get("MIT-VARIANT").unwrap();
        assert_eq!(variant.derived_from(), Some("MIT"));
        assert_eq!(
            variant.matcher().to_string(),
            registry.get("MIT").unwrap().matcher().to_string()
        );

        let config = Config::from_toml(
            r#"
[[license]]
id = "MIT-VARIANT"
family = "MIT"
matcher = { type = "license_ref", id = "MIT-9" }
"#,
        )
        .unwrap();
        assert!(matches!(
            config.build_registry(),
            Err(ConfigError::UnknownLicenseRef { ref license, ref reference })
                if license == "MIT-VARIANT" && reference == "MIT-9"
        ));
    }

    #[test]
    fn test_no_licenses_is_an_error() {
        let config = Config::from_toml("[licenses]\ndefaults = false\n").unwrap();
        assert!(matches!(config.build_registry(), Err(ConfigError::EmptyRegistry)));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(Config::from_toml("[header\n"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_config_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".header-checkr");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("extra.xml"),
            r#"<header-checkr><licenses>
  <license id="X-1" family="XFAM"><text>X License</text></license>
</licenses></header-checkr>"#,
        )
        .unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[header]\nmax_lines = 7\n\n[licenses]\ndefinitions = [\"extra.xml\"]\n",
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.header.max_lines, 7);
        let registry = config.build_registry().unwrap();
        assert!(registry.get("X-1").is_some());
        assert!(registry.get("MIT").is_some());
    }

    #[test]
    fn test_load_config_override_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(dir.path(), Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
