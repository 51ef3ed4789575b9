// src/extractors/catalog.rs

// --- Imports ---
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::utils::error::CatalogError;

// --- Data Structures ---

/// Declarative description of one target section: where it may be anchored and how
/// its paragraphs are recognised when no anchor exists.
///
/// Thresholds and weights are calibration values, tuned per section against real
/// documents. They are not derived from a common formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub id: String,
    /// Display label, reported in `matched_labels` and in the not-found message.
    pub label: String,
    /// Tried in order against heading text; any match makes the heading the anchor.
    pub anchor_terms: Vec<String>,
    /// Keyword -> weight tier used by the fallback scan.
    pub scan_keywords: BTreeMap<String, f64>,
    /// A block containing any of these is never a scan candidate.
    #[serde(default)]
    pub blacklist_terms: BTreeSet<String>,
    pub score_threshold: f64,
    pub max_anchor_scan_text_length: usize,
    pub max_collected_paragraphs: usize,
    pub max_collector_steps: usize,
    pub max_scan_candidates: usize,
}

impl SectionDefinition {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::Invalid {
            section: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is empty"));
        }
        if self.label.trim().is_empty() {
            return Err(invalid("label is empty"));
        }
        if self.anchor_terms.is_empty() || self.anchor_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("anchor_terms must be non-empty and contain no blank term"));
        }
        if self.scan_keywords.is_empty() {
            return Err(invalid("scan_keywords is empty"));
        }
        if let Some((keyword, weight)) = self
            .scan_keywords
            .iter()
            .find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(invalid(&format!(
                "weight of '{}' must be positive, got {}",
                keyword, weight
            )));
        }
        if !self.score_threshold.is_finite() || self.score_threshold <= 0.0 {
            return Err(invalid("score_threshold must be positive"));
        }
        if self.max_anchor_scan_text_length == 0
            || self.max_collected_paragraphs == 0
            || self.max_collector_steps == 0
            || self.max_scan_candidates == 0
        {
            return Err(invalid("limits must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCatalog {
    pub sections: Vec<SectionDefinition>,
}

impl SectionCatalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> SectionCatalog {
        BUILTIN_CATALOG.clone()
    }

    pub fn get(&self, id: &str) -> Result<&SectionDefinition, CatalogError> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CatalogError::UnknownSection(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.id.as_str())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for section in &self.sections {
            section.validate()?;
            if !seen.insert(section.id.as_str()) {
                return Err(CatalogError::Invalid {
                    section: section.id.clone(),
                    reason: "duplicate section id".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON catalog.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: SectionCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded catalog from {} ({} sections)",
            path.display(),
            catalog.sections.len()
        );
        Ok(catalog)
    }
}

// --- Built-in Sections ---

fn weighted(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

static BUILTIN_CATALOG: Lazy<SectionCatalog> = Lazy::new(|| SectionCatalog {
    sections: vec![
        SectionDefinition {
            id: "process_flow".to_string(),
            label: "İş Akışı".to_string(),
            anchor_terms: terms(&[
                "iş akışı",
                "süreç akışı",
                "iş süreci",
                "süreç adımları",
                "akış diyagramı",
                "process flow",
            ]),
            scan_keywords: weighted(&[
                ("iş akışı", 40.0),
                ("süreç akışı", 40.0),
                ("süreç", 35.0),
                ("akış", 35.0),
                ("adım", 30.0),
                ("onay", 30.0),
                ("başvuru", 20.0),
                ("talep", 20.0),
                ("kullanıcı", 20.0),
                ("ekran", 15.0),
                ("sistem", 15.0),
                ("işlem", 5.0),
                ("kayıt", 5.0),
            ]),
            blacklist_terms: terms(&[
                "içindekiler",
                "revizyon geçmişi",
                "doküman onay",
                "versiyon",
                "hazırlayan",
            ])
            .into_iter()
            .collect(),
            score_threshold: 15.0,
            max_anchor_scan_text_length: 100,
            max_collected_paragraphs: 30,
            max_collector_steps: 60,
            max_scan_candidates: 5,
        },
        SectionDefinition {
            id: "accounting_pattern".to_string(),
            label: "İşlem Muhasebe Deseni".to_string(),
            anchor_terms: terms(&[
                "muhasebe deseni",
                "işlem muhasebe",
                "muhasebe kayıtları",
                "muhasebeleştirme",
                "muhasebe kaydı",
                "accounting pattern",
            ]),
            scan_keywords: weighted(&[
                ("muhasebe deseni", 40.0),
                ("muhasebe fişi", 40.0),
                ("borç", 35.0),
                ("alacak", 35.0),
                ("muhasebe", 30.0),
                ("hesap", 30.0),
                ("tutar", 20.0),
                ("kayıt", 20.0),
                ("komisyon", 15.0),
                ("vergi", 15.0),
                ("masraf", 15.0),
                ("gider", 5.0),
                ("işlem", 5.0),
            ]),
            blacklist_terms: terms(&[
                "içindekiler",
                "revizyon geçmişi",
                "iş akışı",
                "süreç akışı",
                "versiyon",
            ])
            .into_iter()
            .collect(),
            score_threshold: 35.0,
            max_anchor_scan_text_length: 100,
            max_collected_paragraphs: 30,
            max_collector_steps: 60,
            max_scan_candidates: 5,
        },
    ],
});
