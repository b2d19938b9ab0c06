//! `header-checkr`: decide which license a source file's header declares and
//! whether that license is approved.
//!
//! # Flow
//! 1. Load configuration ([`config::load_config`]) and build the
//!    [`LicenseRegistry`] from the built-in, XML and inline definitions.
//! 2. For each document, instantiate every license's matcher tree and feed
//!    it the header lines ([`HeaderAnalyser`]).
//! 3. Finalize the trees and resolve a [`Verdict`]: every license whose
//!    tree is `True` is a match; the document is approved when at least one
//!    match is approved.

pub mod analysis;
pub mod config;
pub mod error;
pub mod header;
pub mod license;
pub mod matcher;
pub mod models;

pub use analysis::{Document, FileDocument, HeaderAnalyser, HeaderEvaluation, HeaderLimits, TextDocument};
pub use error::{AnalysisError, ConfigError, MatchError};
pub use header::{fold, prune, HeaderView, Projection};
pub use license::builder::build_matcher;
pub use license::registry::{LicenseFilter, LicenseRegistry, RegistryBuilder};
pub use license::{LicenseDefinition, LicenseFamily, LicenseSpec, MatcherExpr};
pub use matcher::{HeaderMatcher, MatchState, Matcher, MatcherTemplate};
pub use models::{MatchedLicense, Verdict, VerdictStatus};
