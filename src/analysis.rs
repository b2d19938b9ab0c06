//! Header analysis: stream the first lines of a document through a fresh
//! instance of every registered matcher tree and resolve the verdict.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AnalysisError, ConfigError, MatchError};
use crate::header::HeaderView;
use crate::license::registry::LicenseRegistry;
use crate::license::LicenseDefinition;
use crate::matcher::{HeaderMatcher, MatchState, Matcher};
use crate::models::{MatchedLicense, Verdict};

/// Default number of header lines scanned per document.
pub const DEFAULT_MAX_LINES: usize = 50;

/// A source of header text.
pub trait Document {
    fn name(&self) -> &str;

    /// Declared character encoding, if known. Text is decoded as UTF-8
    /// regardless; invalid sequences are replaced.
    fn encoding(&self) -> Option<&str> {
        None
    }

    /// A fresh reader positioned at the start of the document.
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
}

/// A document on disk.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    name: String,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Document for FileDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

/// An in-memory document.
#[derive(Debug, Clone)]
pub struct TextDocument {
    name: String,
    content: String,
}

impl TextDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl Document for TextDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn encoding(&self) -> Option<&str> {
        Some("UTF-8")
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.content.as_bytes())))
    }
}

/// How much of a document counts as its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderLimits {
    pub max_lines: usize,
    /// Optional byte cap, applied in addition to `max_lines`.
    pub max_bytes: Option<usize>,
}

impl Default for HeaderLimits {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_bytes: None,
        }
    }
}

impl HeaderLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lines == 0 {
            return Err(ConfigError::InvalidLimits("max_lines must be at least 1".to_string()));
        }
        if self.max_bytes == Some(0) {
            return Err(ConfigError::InvalidLimits("max_bytes must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Evaluation state for one document. Lines are fed in order with
/// [`consume_line`](Self::consume_line); [`finish`](Self::finish) finalizes
/// every tree and produces the verdict.
pub struct HeaderEvaluation<'r> {
    registry: &'r LicenseRegistry,
    matchers: Vec<(&'r LicenseDefinition, Matcher<'r>)>,
    lines: usize,
}

impl<'r> HeaderEvaluation<'r> {
    pub fn new(registry: &'r LicenseRegistry) -> Self {
        let matchers = registry
            .definitions()
            .map(|license| (license, license.matcher().instantiate()))
            .collect();
        Self {
            registry,
            matchers,
            lines: 0,
        }
    }

    /// Feed one header line. Returns `true` once every tree has resolved and
    /// further lines cannot change the outcome.
    pub fn consume_line(&mut self, line: &str) -> Result<bool, MatchError> {
        let view = HeaderView::new(line);
        for (license, matcher) in self.matchers.iter_mut() {
            if matcher.current_state().is_resolved() {
                continue;
            }
            let state = matcher.consume(&view)?;
            if state.is_resolved() {
                trace!(license = %license.id(), %state, line = self.lines + 1, "matcher resolved");
            }
        }
        self.lines += 1;
        Ok(self.is_settled())
    }

    pub fn lines_read(&self) -> usize {
        self.lines
    }

    pub fn is_settled(&self) -> bool {
        self.matchers.iter().all(|(_, m)| m.current_state().is_resolved())
    }

    /// Verdict from the licenses already matched, without finalizing.
    /// Later lines may add matches but never remove one.
    pub fn provisional(&self, document: &str) -> Verdict {
        let matches = self
            .matchers
            .iter()
            .filter(|(_, m)| m.current_state() == MatchState::True)
            .map(|(license, _)| MatchedLicense::new(license, self.registry.is_approved(license)))
            .collect();
        Verdict::new(document, matches, self.lines)
    }

    pub fn finish(mut self, document: &str) -> Verdict {
        let registry = self.registry;
        let mut matches = Vec::new();
        for (license, matcher) in self.matchers.iter_mut() {
            if matcher.finalize() == MatchState::True {
                let license: &LicenseDefinition = license;
                matches.push(MatchedLicense::new(license, registry.is_approved(license)));
            }
        }
        Verdict::new(document, matches, self.lines)
    }
}

/// Evaluates documents against a shared registry.
#[derive(Debug, Clone)]
pub struct HeaderAnalyser {
    registry: Arc<LicenseRegistry>,
    limits: HeaderLimits,
}

impl HeaderAnalyser {
    pub fn new(registry: Arc<LicenseRegistry>, limits: HeaderLimits) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(Self { registry, limits })
    }

    /// Read the header of `document` and resolve its verdict.
    pub fn evaluate(&self, document: &dyn Document) -> Result<Verdict, AnalysisError> {
        let name = document.name();
        let io_error = |source: io::Error| AnalysisError::Io {
            document: name.to_string(),
            source,
        };
        if let Some(encoding) = document.encoding() {
            trace!(document = %name, %encoding, "decoding as UTF-8");
        }

        let reader = document.open().map_err(io_error)?;
        let mut reader: Box<dyn BufRead + '_> = match self.limits.max_bytes {
            Some(max_bytes) => Box::new(reader.take(max_bytes as u64)),
            None => reader,
        };

        let mut evaluation = HeaderEvaluation::new(&self.registry);
        let mut buf = Vec::new();
        while evaluation.lines_read() < self.limits.max_lines {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(io_error)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.strip_suffix('\n').unwrap_or(&line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            if evaluation.consume_line(line)? {
                break;
            }
        }

        Ok(self.conclude(name, evaluation))
    }

    /// Evaluate text that is already split into lines. The same header
    /// limits apply; a line crossing the byte limit is cut short.
    pub fn evaluate_lines<I, S>(&self, name: &str, lines: I) -> Result<Verdict, MatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut evaluation = HeaderEvaluation::new(&self.registry);
        let mut bytes_left = self.limits.max_bytes;
        for line in lines.into_iter().take(self.limits.max_lines) {
            let mut line = line.as_ref();
            if let Some(left) = bytes_left.as_mut() {
                if *left == 0 {
                    break;
                }
                line = clip(line, *left);
                // one byte for the line break
                *left = left.saturating_sub(line.len() + 1);
            }
            if evaluation.consume_line(line)? {
                break;
            }
        }
        Ok(self.conclude(name, evaluation))
    }

    /// Evaluate many documents in parallel. Results keep the input order.
    pub fn evaluate_all<D>(&self, documents: &[D]) -> Vec<Result<Verdict, AnalysisError>>
    where
        D: Document + Sync,
    {
        use rayon::prelude::*;

        documents
            .par_iter()
            .map(|document| self.evaluate(document))
            .collect()
    }

    fn conclude(&self, name: &str, evaluation: HeaderEvaluation<'_>) -> Verdict {
        let verdict = evaluation.finish(name);
        debug!(
            document = %verdict.document,
            status = %verdict.status,
            matches = verdict.matches.len(),
            lines = verdict.lines_scanned,
            "header evaluated"
        );
        verdict
    }
}

/// Longest prefix of `line` within `max` bytes, on a char boundary.
fn clip(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
