use serde::Serialize;

use crate::license::{LicenseDefinition, UNKNOWN_CATEGORY};

/// One license whose matcher tree resolved to `True` for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedLicense {
    pub id: String,
    /// Five-character family category.
    pub family: String,
    pub name: String,
    pub approved: bool,
    pub note: Option<String>,
}

impl MatchedLicense {
    pub fn new(license: &LicenseDefinition, approved: bool) -> Self {
        Self {
            id: license.id().to_string(),
            family: license.family().category().to_string(),
            name: license.name().to_string(),
            approved,
            note: license.notes().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Approved,
    Unapproved,
    Unknown,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Approved => write!(f, "approved"),
            VerdictStatus::Unapproved => write!(f, "unapproved"),
            VerdictStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of evaluating one document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub document: String,
    pub status: VerdictStatus,
    /// Every matching license, ordered by id.
    pub matches: Vec<MatchedLicense>,
    /// Header lines read before the verdict was settled.
    pub lines_scanned: usize,
}

impl Verdict {
    pub fn new(document: impl Into<String>, matches: Vec<MatchedLicense>, lines_scanned: usize) -> Self {
        let status = if matches.is_empty() {
            VerdictStatus::Unknown
        } else if matches.iter().any(|m| m.approved) {
            VerdictStatus::Approved
        } else {
            VerdictStatus::Unapproved
        };
        Self {
            document: document.into(),
            status,
            matches,
            lines_scanned,
        }
    }

    pub fn matched_licenses(&self) -> &[MatchedLicense] {
        &self.matches
    }

    /// At least one matching license is approved. Unknown is never approved.
    pub fn is_approved(&self) -> bool {
        self.status == VerdictStatus::Approved
    }

    pub fn is_unknown(&self) -> bool {
        self.status == VerdictStatus::Unknown
    }

    /// Family categories of the matches, or the unknown sentinel.
    pub fn families(&self) -> Vec<&str> {
        if self.matches.is_empty() {
            return vec![UNKNOWN_CATEGORY];
        }
        let mut families: Vec<&str> = self.matches.iter().map(|m| m.family.as_str()).collect();
        families.sort_unstable();
        families.dedup();
        families
    }

    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().filter_map(|m| m.note.as_deref())
    }
}
