//! Report renderers for header check results.
//!
//! - [`terminal`]: colored, tabular output with summary box; respects `--verbose` / `--quiet`.
//!   Also renders the `--list-licenses` / `--list-families` tables.

pub mod terminal;
