// src/extractors/section.rs

// --- Imports ---
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use super::catalog::{SectionCatalog, SectionDefinition};
use super::collector::collect_content;
use super::locator::locate_anchor;
use super::scanner::scan_content;
use super::trace::{ExtractionState, LogObserver, TraceEvent, TraceObserver};
use crate::document::DocumentTree;
use crate::utils::error::ExtractError;

pub const SCAN_FALLBACK_WARNING: &str = "content found via fallback scan";

// --- Data Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Anchor found and content collected after it.
    Strict,
    /// Content assembled from the best-scoring paragraphs.
    Scan,
}

/// Outcome of extracting one section from one document.
///
/// When `found` is true, `content` is non-empty after trimming and
/// `content_length` is its length in characters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub section_id: String,
    pub found: bool,
    pub mode: ExtractionMode,
    pub content: String,
    pub content_length: usize,
    pub matched_labels: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    fn found(section: &SectionDefinition, mode: ExtractionMode, content: String) -> Self {
        let mut result = Self {
            section_id: section.id.clone(),
            found: true,
            mode,
            content_length: content.chars().count(),
            content,
            matched_labels: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        match mode {
            ExtractionMode::Strict => result.matched_labels.push(section.label.clone()),
            ExtractionMode::Scan => result.warnings.push(SCAN_FALLBACK_WARNING.to_string()),
        }
        result
    }

    fn not_found(section: &SectionDefinition) -> Self {
        Self {
            section_id: section.id.clone(),
            found: false,
            mode: ExtractionMode::Strict,
            content: String::new(),
            content_length: 0,
            matched_labels: Vec::new(),
            errors: vec![format!("{} content not found", section.label)],
            warnings: Vec::new(),
        }
    }

    /// Appends caller-side warnings, e.g. those reported by the converter.
    pub fn with_warnings<I>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.warnings.extend(warnings);
        self
    }
}

// --- Main Extractor Structure ---

/// Runs the anchor search, content collection and fallback scan for a section.
/// Holds no state; one instance can serve any number of threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionExtractor;

impl SectionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts `section` from `tree`, logging decisions through `tracing`.
    #[allow(dead_code)]
    pub fn extract(
        &self,
        tree: &DocumentTree,
        section: &SectionDefinition,
    ) -> Result<ParseResult, ExtractError> {
        let mut observer = LogObserver::new(section.id.as_str());
        self.extract_with_observer(tree, section, &mut observer)
    }

    /// Extracts `section` from `tree`, reporting every decision to `observer`.
    ///
    /// Absence of content is a normal outcome (`found == false`). Errors are reserved for
    /// an invalid section definition and for failures during traversal.
    pub fn extract_with_observer(
        &self,
        tree: &DocumentTree,
        section: &SectionDefinition,
        observer: &mut dyn TraceObserver,
    ) -> Result<ParseResult, ExtractError> {
        section.validate()?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(tree, section, observer)));
        let result = outcome.map_err(|payload| ExtractError::Unexpected {
            section: section.id.clone(),
            message: panic_message(&*payload),
        })?;

        tracing::debug!(
            section = %section.id,
            found = result.found,
            mode = ?result.mode,
            length = result.content_length,
            "Extraction finished"
        );
        Ok(result)
    }

    /// One result per catalog section, in catalog order.
    #[allow(dead_code)]
    pub fn extract_all(
        &self,
        tree: &DocumentTree,
        catalog: &SectionCatalog,
    ) -> Result<Vec<ParseResult>, ExtractError> {
        catalog
            .sections
            .iter()
            .map(|section| self.extract(tree, section))
            .collect()
    }
}

fn run(
    tree: &DocumentTree,
    section: &SectionDefinition,
    observer: &mut dyn TraceObserver,
) -> ParseResult {
    enter(ExtractionState::NotStarted, observer);

    let anchor = locate_anchor(tree, section, observer);
    enter(ExtractionState::AnchorSearched, observer);

    if let Some(anchor) = anchor {
        let content = collect_content(tree, anchor.block, section, observer);
        enter(ExtractionState::ContentCollected, observer);
        if !content.trim().is_empty() {
            enter(ExtractionState::FoundStrict, observer);
            return ParseResult::found(section, ExtractionMode::Strict, content);
        }
    } else {
        enter(ExtractionState::NoAnchor, observer);
    }

    let content = scan_content(tree, section, observer);
    enter(ExtractionState::ScanSearched, observer);
    if !content.trim().is_empty() {
        enter(ExtractionState::FoundScan, observer);
        return ParseResult::found(section, ExtractionMode::Scan, content);
    }

    enter(ExtractionState::NotFound, observer);
    ParseResult::not_found(section)
}

fn enter(state: ExtractionState, observer: &mut dyn TraceObserver) {
    observer.observe(&TraceEvent::StateChanged(state));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::convert::{Converter, HtmlConverter};
    use crate::document::BlockKind;
    use crate::extractors::trace::{NoopObserver, RecordingObserver};

    fn catalog() -> SectionCatalog {
        SectionCatalog::builtin()
    }

    fn process_flow() -> SectionDefinition {
        catalog().get("process_flow").unwrap().clone()
    }

    #[test]
    fn test_strict_extraction_from_heading() {
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::heading(1), "Giriş");
        tree.push(BlockKind::Paragraph, "Doküman amacı anlatılır.");
        tree.push(BlockKind::heading(1), "İş Akışı");
        tree.push(BlockKind::Paragraph, "Müşteri başvuru formunu doldurur.");
        tree.push(BlockKind::Paragraph, "Operasyon ekibi başvuruyu onaylar.");

        let mut recorder = RecordingObserver::new();
        let result = SectionExtractor::new()
            .extract_with_observer(&tree, &process_flow(), &mut recorder)
            .unwrap();

        assert!(result.found);
        assert_eq!(result.mode, ExtractionMode::Strict);
        assert_eq!(result.matched_labels, vec!["İş Akışı".to_string()]);
        assert_eq!(
            result.content,
            "Müşteri başvuru formunu doldurur.\n\nOperasyon ekibi başvuruyu onaylar."
        );
        assert_eq!(result.content_length, result.content.chars().count());
        assert!(result.errors.is_empty() && result.warnings.is_empty());
        assert_eq!(
            recorder.states(),
            vec![
                ExtractionState::NotStarted,
                ExtractionState::AnchorSearched,
                ExtractionState::ContentCollected,
                ExtractionState::FoundStrict,
            ]
        );
    }

    #[test]
    fn test_scan_fallback_without_anchor() {
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::heading(1), "Genel Bilgiler");
        tree.push(
            BlockKind::Paragraph,
            "Onay onay onay onay onay beklenen kullanıcı görevleri",
        );
        tree.push(BlockKind::Paragraph, "Kısa not");

        let mut recorder = RecordingObserver::new();
        let result = SectionExtractor::new()
            .extract_with_observer(&tree, &process_flow(), &mut recorder)
            .unwrap();

        assert!(result.found);
        assert_eq!(result.mode, ExtractionMode::Scan);
        assert_eq!(result.content, "Onay onay onay onay onay beklenen kullanıcı görevleri");
        assert_eq!(result.warnings, vec![SCAN_FALLBACK_WARNING.to_string()]);
        assert!(result.matched_labels.is_empty());
        assert_eq!(
            recorder.states(),
            vec![
                ExtractionState::NotStarted,
                ExtractionState::AnchorSearched,
                ExtractionState::NoAnchor,
                ExtractionState::ScanSearched,
                ExtractionState::FoundScan,
            ]
        );
    }

    #[test]
    fn test_blacklisted_only_document_is_not_found() {
        let mut tree = DocumentTree::new();
        tree.push(
            BlockKind::Paragraph,
            "İçindekiler: onay onay onay adım adım kullanıcı talep",
        );

        let result = SectionExtractor::new().extract(&tree, &process_flow()).unwrap();

        assert!(!result.found);
        assert_eq!(result.mode, ExtractionMode::Strict);
        assert!(result.content.is_empty());
        assert_eq!(result.content_length, 0);
        assert_eq!(result.errors, vec!["İş Akışı content not found".to_string()]);
    }

    #[test]
    fn test_anchor_without_content_falls_back_to_scan() {
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::heading(2), "İş Akışı");
        tree.push(BlockKind::heading(2), "Ekran Tasarımları");
        tree.push(
            BlockKind::Paragraph,
            "Kullanıcı talep oluşturur, süreç adım adım ilerler ve onay alınır.",
        );

        let mut recorder = RecordingObserver::new();
        let result = SectionExtractor::new()
            .extract_with_observer(&tree, &process_flow(), &mut recorder)
            .unwrap();

        assert_eq!(result.mode, ExtractionMode::Scan);
        assert!(result.found);
        assert_eq!(
            recorder.states(),
            vec![
                ExtractionState::NotStarted,
                ExtractionState::AnchorSearched,
                ExtractionState::ContentCollected,
                ExtractionState::ScanSearched,
                ExtractionState::FoundScan,
            ]
        );
    }

    #[test]
    fn test_extract_all_from_html() {
        let html = r#"<html><body>
            <h1>İş Akışı</h1>
            <p>Şube personeli talebi sisteme girer.</p>
            <table><tr><td>Adım</td><td>Rol</td></tr></table>
            <p>Yönetici talebi onaylar.</p>
            <h1>İşlem Muhasebe Deseni</h1>
            <p>Müşteri hesabı borçlandırılır, komisyon geliri alacaklandırılır.</p>
            <h1>Ekler</h1>
        </body></html>"#;
        let conversion = HtmlConverter.convert(html.as_bytes()).unwrap();

        let results = SectionExtractor::new()
            .extract_all(&conversion.tree, &catalog())
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].section_id, "process_flow");
        assert_eq!(
            results[0].content,
            "Şube personeli talebi sisteme girer.\n\nYönetici talebi onaylar."
        );
        assert_eq!(results[1].section_id, "accounting_pattern");
        assert_eq!(results[1].mode, ExtractionMode::Strict);
        assert_eq!(
            results[1].content,
            "Müşteri hesabı borçlandırılır, komisyon geliri alacaklandırılır."
        );
    }

    #[test]
    fn test_numbered_list_after_heading_is_strict_content() {
        let html = "<h1>İş Akışı</h1><ol><li>Müşteri formu doldurur.</li>\
                    <li>Yönetici formu inceler.</li></ol><h1>Ekler</h1>";
        let conversion = HtmlConverter.convert(html.as_bytes()).unwrap();

        let result = SectionExtractor::new()
            .extract(&conversion.tree, &process_flow())
            .unwrap();
        assert!(result.found);
        assert_eq!(result.mode, ExtractionMode::Strict);
        assert_eq!(
            result.content,
            "Müşteri formu doldurur.\n\nYönetici formu inceler."
        );
    }

    #[test]
    fn test_loose_body_text_stays_under_its_heading() {
        let html = "<body><h1>İş Akışı</h1>Müşteri formu doldurur.<h1>Ekler</h1>Ek metin burada</body>";
        let conversion = HtmlConverter.convert(html.as_bytes()).unwrap();

        let result = SectionExtractor::new()
            .extract(&conversion.tree, &process_flow())
            .unwrap();
        assert!(result.found);
        assert_eq!(result.mode, ExtractionMode::Strict);
        assert_eq!(result.content, "Müşteri formu doldurur.");
    }

    #[test]
    fn test_invalid_section_is_an_error() {
        let mut section = process_flow();
        section.scan_keywords.clear();
        let tree = DocumentTree::new();

        let err = SectionExtractor::new()
            .extract_with_observer(&tree, &section, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSection(_)));
    }

    struct ExplodingObserver;

    impl TraceObserver for ExplodingObserver {
        fn observe(&mut self, event: &TraceEvent) {
            if matches!(event, TraceEvent::AnchorNotFound) {
                panic!("observer exploded");
            }
        }
    }

    #[test]
    fn test_traversal_failure_is_wrapped_with_context() {
        let mut tree = DocumentTree::new();
        tree.push(BlockKind::Paragraph, "Alakasız metin");

        let err = SectionExtractor::new()
            .extract_with_observer(&tree, &process_flow(), &mut ExplodingObserver)
            .unwrap_err();
        match err {
            ExtractError::Unexpected { section, message } => {
                assert_eq!(section, "process_flow");
                assert_eq!(message, "observer exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_with_warnings_appends() {
        let tree = {
            let mut tree = DocumentTree::new();
            tree.push(BlockKind::Paragraph, "Alakasız metin");
            tree
        };
        let result = SectionExtractor::new()
            .extract(&tree, &process_flow())
            .unwrap()
            .with_warnings(vec!["1 HTML parse errors".to_string()]);
        assert_eq!(result.warnings, vec!["1 HTML parse errors".to_string()]);
    }
}
