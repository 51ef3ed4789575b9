// src/extractors/locator.rs

use super::catalog::SectionDefinition;
use super::normalize::normalize;
use super::trace::{TraceEvent, TraceObserver};
use crate::document::{BlockId, DocumentTree};

/// Block chosen as the start of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub block: BlockId,
    /// Anchor term that matched, as written in the catalog.
    #[allow(dead_code)]
    pub term: String,
    /// Found by the loose scan over text blocks rather than among headings.
    #[allow(dead_code)]
    pub loose: bool,
}

/// Finds the anchor for `section`: first among headings, then among short text blocks.
pub fn locate_anchor(
    tree: &DocumentTree,
    section: &SectionDefinition,
    observer: &mut dyn TraceObserver,
) -> Option<Anchor> {
    let terms: Vec<(String, &str)> = section
        .anchor_terms
        .iter()
        .map(|term| (normalize(term), term.as_str()))
        .filter(|(normalized, _)| !normalized.is_empty())
        .collect();

    let matching_term = |text: &str| {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }
        terms
            .iter()
            .find(|(needle, _)| normalized.contains(needle.as_str()))
            .map(|(_, original)| *original)
    };

    // Phase A: the first heading in document order wins.
    for (id, block) in tree.headings() {
        if let Some(term) = matching_term(block.text()) {
            observer.observe(&TraceEvent::HeadingAnchor {
                block: id,
                term: term.to_string(),
            });
            return Some(Anchor {
                block: id,
                term: term.to_string(),
                loose: false,
            });
        }
    }

    // Phase B: short text blocks that mention an anchor term.
    for (id, block) in tree.blocks().filter(|(_, b)| b.kind.is_text_bearing()) {
        let Some(term) = matching_term(block.text()) else {
            continue;
        };
        let length = block.text_len();
        if length < section.max_anchor_scan_text_length {
            observer.observe(&TraceEvent::LooseAnchor {
                block: id,
                term: term.to_string(),
            });
            return Some(Anchor {
                block: id,
                term: term.to_string(),
                loose: true,
            });
        }
        observer.observe(&TraceEvent::LooseAnchorTooLong { block: id, length });
    }

    observer.observe(&TraceEvent::AnchorNotFound);
    None
}
