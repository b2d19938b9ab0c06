//! Error types for configuration, matching and document analysis.
//!
//! - [`ConfigError`] is raised while loading definitions and building the
//!   registry. It is fatal and always reported before any document is read.
//! - [`MatchError`] signals a matcher/view contract violation during a pass.
//! - [`AnalysisError`] wraps everything that can stop a single document
//!   evaluation.

use std::path::PathBuf;

use crate::header::Projection;

/// Configuration errors. Fatal, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No license definitions were loaded.
    #[error("at least one license must be defined")]
    EmptyRegistry,

    /// Two definitions share an id.
    #[error("duplicate license id '{0}'")]
    DuplicateLicense(String),

    /// A required attribute or element is missing or blank.
    #[error("missing required field '{field}' in {context}")]
    MissingField {
        /// Where the field was expected (e.g. `license MIT`, `spdx matcher`).
        context: String,
        /// Field name.
        field: &'static str,
    },

    /// A matcher expression is structurally invalid.
    #[error("invalid '{kind}' matcher: {reason}")]
    InvalidMatcher {
        /// Matcher kind as written in the configuration.
        kind: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Regex {
        /// The offending pattern.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Malformed XML license definitions.
    #[error("xml error in {origin}: {reason}")]
    Xml {
        /// File path or `<built-in>`.
        origin: String,
        /// Parser or structure message.
        reason: String,
    },

    /// Malformed TOML configuration.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A `license_ref` matcher or `derived_from` names an undefined license.
    #[error("license '{license}' refers to undefined license '{reference}'")]
    UnknownLicenseRef {
        /// License holding the reference.
        license: String,
        /// Id it refers to.
        reference: String,
    },

    /// `license_ref` matchers refer back to themselves.
    #[error("circular license reference: {0}")]
    LicenseRefCycle(String),

    /// Header scanning limits out of range.
    #[error("invalid header limits: {0}")]
    InvalidLimits(String),

    /// A configuration file could not be read.
    #[error("io error: {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A matcher was handed a header view it cannot work with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The view was built without the projection the matcher reads.
    #[error("{matcher} matcher requires the {projection} projection")]
    UnsupportedProjection {
        /// Matcher kind.
        matcher: &'static str,
        /// Projection that was missing.
        projection: Projection,
    },
}

/// Failure while evaluating one document.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The document could not be read.
    #[error("cannot read header of {document}: {source}")]
    Io {
        /// Document name.
        document: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal matcher contract violation.
    #[error(transparent)]
    Match(#[from] MatchError),
}
