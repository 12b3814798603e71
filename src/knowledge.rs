//! Drug knowledge base loaded best-effort from a local JSON file.
//!
//! The file is read fresh on every request, never cached. A missing or
//! unreadable file degrades to an empty knowledge base carrying a warning;
//! it never fails the caller.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Relative paths searched for the knowledge file, in order.
pub const KNOWLEDGE_PATHS: [&str; 2] = ["data/medical_knowledge.json", "medical_knowledge.json"];

/// Minimum normalized similarity for fuzzy name resolution.
const RESOLVE_THRESHOLD: f64 = 0.65;

/// One drug in the reference database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugEntry {
    /// Standardized clinical name.
    pub name: String,
    /// Regional brand name, if distinct.
    pub brand: String,
    /// What the drug is prescribed for.
    pub usage: String,
    /// Safety warnings and contraindications.
    pub restrictions: String,
    /// Dietary guidance while on the drug.
    pub diet: String,
    /// Home remedies commonly used alongside it.
    pub home_remedies: String,
}

/// A fuzzy-resolution hit against the drug database.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedDrug<'a> {
    /// The database entry that matched.
    pub entry: &'a DrugEntry,
    /// The name or brand string that produced the match.
    pub matched: &'a str,
    /// Similarity as a percentage (65-100).
    pub confidence: u8,
}

/// Static reference data used only as additional prompt context.
///
/// All keys are best-effort: absent keys deserialize to their defaults and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Knowledge {
    /// Flat list of frequently prescribed drug names.
    pub common_drugs: Vec<String>,
    /// Prescription shorthand to plain meaning (e.g. `TDS` -> three times daily).
    pub abbreviations: BTreeMap<String, String>,
    /// Detailed reference entries.
    pub drug_database: Vec<DrugEntry>,
    #[serde(skip)]
    warning: Option<String>,
}

impl Knowledge {
    /// Loads the knowledge base from the default search paths, degrading to
    /// an empty base when no file can be read.
    pub fn load() -> Self {
        Self::load_from_candidates(&KNOWLEDGE_PATHS)
    }

    /// Loads the first readable candidate path, degrading to an empty base
    /// with a warning when none works.
    pub fn load_from_candidates<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut last_failure = None;

        for path in paths {
            let path = path.as_ref();
            match Self::load_from(path) {
                Ok(kb) => {
                    tracing::debug!(path = %path.display(), "loaded knowledge base");
                    return kb;
                }
                Err(e) => last_failure = Some(format!("{}: {e}", path.display())),
            }
        }

        let warning = match last_failure {
            Some(detail) => {
                format!("knowledge base unavailable ({detail}); continuing without reference data")
            }
            None => "knowledge base unavailable; continuing without reference data".to_string(),
        };
        tracing::warn!("{warning}");
        Self {
            warning: Some(warning),
            ..Self::default()
        }
    }

    /// Reads and parses one exact path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// True when the base carries no reference data at all.
    pub fn is_empty(&self) -> bool {
        self.common_drugs.is_empty() && self.abbreviations.is_empty() && self.drug_database.is_empty()
    }

    /// The degradation warning, when loading fell back to an empty base.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Renders the short prompt-context block; empty string for an empty base.
    pub fn context_block(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let drugs = self.common_drugs.join(", ");
        let abbreviations = serde_json::to_string(&self.abbreviations).unwrap_or_default();
        format!("MEDICAL KNOWLEDGE BASE:\n- DRUGS: {drugs}\n- ABBREVIATIONS: {abbreviations}\n")
    }

    /// Renders the whole document as pretty JSON for prompt embedding.
    pub fn master_dataset(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Resolves a possibly misspelled drug name against database names and
    /// brands, returning the best match at or above the similarity threshold.
    pub fn resolve_name(&self, raw: &str) -> Option<ResolvedDrug<'_>> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let mut best: Option<(f64, &DrugEntry, &str)> = None;
        for entry in &self.drug_database {
            for candidate in [entry.name.as_str(), entry.brand.as_str()] {
                if candidate.is_empty() {
                    continue;
                }
                let score = strsim::normalized_levenshtein(&needle, &candidate.to_lowercase());
                if best.map_or(true, |(b, _, _)| score > b) {
                    best = Some((score, entry, candidate));
                }
            }
        }

        best.filter(|(score, _, _)| *score >= RESOLVE_THRESHOLD)
            .map(|(score, entry, matched)| ResolvedDrug {
                entry,
                matched,
                confidence: (score * 100.0).round() as u8,
            })
    }
}
