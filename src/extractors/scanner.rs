// src/extractors/scanner.rs
//! Fallback search: score every body paragraph against the section's keyword table
//! and keep the best ones.

use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::SectionDefinition;
use super::collector::PARAGRAPH_SEPARATOR;
use super::normalize::normalize;
use super::trace::{ScanRejection, TraceEvent, TraceObserver};
use crate::document::{BlockId, BlockKind, DocumentTree};

const MIN_SCAN_TEXT_LEN: usize = 20;
const LENGTH_BONUS_DIVISOR: f64 = 20.0;
const MAX_LENGTH_BONUS: f64 = 20.0;

// Page numbers, outline numbering, dates written with dots.
static NUMERIC_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d.\s()\-]+$").expect("Failed to compile NUMERIC_ONLY_RE"));

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'t> {
    pub block: BlockId,
    pub score: f64,
    /// Raw trimmed text of the block.
    pub text: &'t str,
}

/// Keyword table with the keywords already in matching form.
struct Scorer<'s> {
    keywords: Vec<(String, f64)>,
    blacklist: Vec<(String, &'s str)>,
}

impl<'s> Scorer<'s> {
    fn new(section: &'s SectionDefinition) -> Self {
        let keywords = section
            .scan_keywords
            .iter()
            .map(|(keyword, weight)| (normalize(keyword), *weight))
            .filter(|(keyword, _)| !keyword.is_empty())
            .collect();
        let blacklist = section
            .blacklist_terms
            .iter()
            .map(|term| (normalize(term), term.as_str()))
            .filter(|(term, _)| !term.is_empty())
            .collect();
        Self {
            keywords,
            blacklist,
        }
    }

    fn blacklisted(&self, normalized: &str) -> Option<&'s str> {
        self.blacklist
            .iter()
            .find(|(term, _)| normalized.contains(term.as_str()))
            .map(|(_, original)| *original)
    }

    fn score(&self, normalized: &str, raw_len: usize) -> f64 {
        let keyword_score: f64 = self
            .keywords
            .iter()
            .map(|(keyword, weight)| normalized.matches(keyword.as_str()).count() as f64 * weight)
            .sum();
        keyword_score + length_bonus(raw_len)
    }
}

fn length_bonus(raw_len: usize) -> f64 {
    (raw_len as f64 / LENGTH_BONUS_DIVISOR).min(MAX_LENGTH_BONUS)
}

fn reject(observer: &mut dyn TraceObserver, block: BlockId, reason: ScanRejection) {
    observer.observe(&TraceEvent::ScanRejected { block, reason });
}

/// Every eligible block scoring above the section threshold, best first.
/// Equal scores keep document order.
pub fn find_candidates<'t>(
    tree: &'t DocumentTree,
    section: &SectionDefinition,
    observer: &mut dyn TraceObserver,
) -> Vec<Candidate<'t>> {
    let scorer = Scorer::new(section);
    let mut candidates = Vec::new();

    let eligible = tree.blocks().filter(|(id, block)| {
        matches!(block.kind, BlockKind::Paragraph | BlockKind::Container) && !tree.is_inside_table(*id)
    });

    for (id, block) in eligible {
        let text = block.text();
        let length = block.text_len();
        if length < MIN_SCAN_TEXT_LEN {
            reject(observer, id, ScanRejection::TooShort);
            continue;
        }
        let normalized = normalize(text);
        if let Some(term) = scorer.blacklisted(&normalized) {
            reject(observer, id, ScanRejection::Blacklisted(term.to_string()));
            continue;
        }
        if NUMERIC_ONLY_RE.is_match(text) {
            reject(observer, id, ScanRejection::NumericOnly);
            continue;
        }

        let score = scorer.score(&normalized, length);
        if score > section.score_threshold {
            observer.observe(&TraceEvent::ScanCandidate { block: id, score });
            candidates.push(Candidate {
                block: id,
                score,
                text,
            });
        } else {
            reject(observer, id, ScanRejection::BelowThreshold(score));
        }
    }

    // sort_by is stable: ties stay in document order.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Joins the raw text of the top `max_scan_candidates` candidates. Empty when none qualify.
pub fn scan_content(
    tree: &DocumentTree,
    section: &SectionDefinition,
    observer: &mut dyn TraceObserver,
) -> String {
    let candidates = find_candidates(tree, section, observer);
    let selected: Vec<&str> = candidates
        .iter()
        .take(section.max_scan_candidates)
        .enumerate()
        .map(|(rank, candidate)| {
            observer.observe(&TraceEvent::ScanSelected {
                block: candidate.block,
                rank,
            });
            candidate.text
        })
        .collect();
    selected.join(PARAGRAPH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::catalog::SectionCatalog;
    use crate::extractors::trace::{NoopObserver, RecordingObserver};
    use std::collections::BTreeMap;

    fn score_text(section: &SectionDefinition, text: &str) -> f64 {
        let text = text.trim();
        Scorer::new(section).score(&normalize(text), text.chars().count())
    }

    fn section_with(keywords: &[(&str, f64)], threshold: f64) -> SectionDefinition {
        let mut section = SectionCatalog::builtin().get("process_flow").unwrap().clone();
        section.scan_keywords = keywords
            .iter()
            .map(|(k, w)| (k.to_string(), *w))
            .collect::<BTreeMap<_, _>>();
        section.score_threshold = threshold;
        section
    }

    #[test]
    fn test_score_counts_occurrences_and_length_bonus() {
        let section = section_with(&[("onay", 30.0), ("red", 5.0)], 15.0);
        // 3 x 30 + 25 / 20
        assert_eq!(score_text(&section, "Onay onay ONAY bekleniyor"), 91.25);
        // Length bonus is capped at 20.
        let long = "x".repeat(1000);
        assert_eq!(score_text(&section, &long), 20.0);
    }

    #[test]
    fn test_blacklisted_block_is_never_a_candidate() {
        let section = section_with(&[("süreç", 40.0)], 15.0);
        let mut tree = DocumentTree::new();
        let listed = tree.push(
            BlockKind::Paragraph,
            "İçindekiler: süreç süreç süreç süreç süreç süreç",
        );

        let mut recorder = RecordingObserver::new();
        let candidates = find_candidates(&tree, &section, &mut recorder);
        assert!(candidates.is_empty());
        assert_eq!(
            recorder.events,
            vec![TraceEvent::ScanRejected {
                block: listed,
                reason: ScanRejection::Blacklisted("içindekiler".to_string()),
            }]
        );
    }

    #[test]
    fn test_ties_keep_document_order() {
        let section = section_with(&[("onay", 30.0)], 15.0);
        let mut tree = DocumentTree::new();
        let first = tree.push(BlockKind::Paragraph, "İlk onay paragrafı metni A");
        let best = tree.push(BlockKind::Paragraph, "Onay onay daha güçlü paragraf");
        let second = tree.push(BlockKind::Paragraph, "İlk onay paragrafı metni B");

        let candidates = find_candidates(&tree, &section, &mut NoopObserver);
        let order: Vec<BlockId> = candidates.iter().map(|c| c.block).collect();
        assert_eq!(order, vec![best, first, second]);
        assert_eq!(candidates[1].score, candidates[2].score);
    }

    #[test]
    fn test_filters_short_numeric_and_table_blocks() {
        let section = section_with(&[("onay", 30.0)], 15.0);
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::Paragraph, "kısa onay");
        tree.push(BlockKind::Paragraph, "1.2.3 (4) - 5 6 7 8 9 10");
        let table = tree.push(BlockKind::Table, "");
        let cell = tree.append(table, BlockKind::TableCell, "").unwrap();
        tree.append(cell, BlockKind::Paragraph, "tablo içi onay onay onay metni").unwrap();
        tree.push(BlockKind::heading(2), "Onay onay onay başlığı uzun");

        let mut recorder = RecordingObserver::new();
        assert!(find_candidates(&tree, &section, &mut recorder).is_empty());
        let reasons: Vec<&ScanRejection> = recorder
            .events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::ScanRejected { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(reasons, vec![&ScanRejection::TooShort, &ScanRejection::NumericOnly]);
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let section = section_with(&[("onay", 30.0)], 35.0);
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::Paragraph, "Tek bir onay içeren paragraf");

        assert!(scan_content(&tree, &section, &mut NoopObserver).is_empty());
    }

    #[test]
    fn test_scan_content_takes_top_candidates_raw_text() {
        let mut section = section_with(&[("onay", 30.0)], 15.0);
        section.max_scan_candidates = 2;
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::Paragraph, "  Onay: birinci, (önemli) paragraf  ");
        tree.push(BlockKind::Paragraph, "Onay onay ikinci paragraf metni");
        tree.push(BlockKind::Paragraph, "Onay üçüncü kısa metin");

        let content = scan_content(&tree, &section, &mut NoopObserver);
        assert_eq!(
            content,
            "Onay onay ikinci paragraf metni\n\nOnay: birinci, (önemli) paragraf"
        );
    }
}
