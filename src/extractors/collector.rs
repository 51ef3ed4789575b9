// src/extractors/collector.rs

use super::catalog::SectionDefinition;
use super::trace::{CollectorSkip, CollectorStop, TraceEvent, TraceObserver};
use crate::document::{BlockId, BlockKind, DocumentTree};

/// Separator placed between collected paragraphs and between scan candidates.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

// A heading this short ("1.", "A)") does not open a new section.
const MIN_TERMINAL_HEADING_LEN: usize = 3;
// Length window for ALL CAPS lines treated as headings.
const CAPS_HEADING_MIN_LEN: usize = 5;
const CAPS_HEADING_MAX_LEN: usize = 50;
const MIN_PARAGRAPH_LEN: usize = 3;

fn is_caps_pseudo_heading(text: &str, length: usize) -> bool {
    length > CAPS_HEADING_MIN_LEN
        && length < CAPS_HEADING_MAX_LEN
        && text == text.to_uppercase()
        && !text.contains('.')
}

/// Walks forward from `anchor` in document order and gathers the section's paragraphs.
///
/// A block is judged by its own text. A text-less container without tables is stepped
/// into; any other visited block is left with its descendants, and a block holding a
/// table is skipped as a whole. An anchor inside a table cell only reaches the rest of
/// its row. Returns an empty string when nothing qualifies.
pub fn collect_content(
    tree: &DocumentTree,
    anchor: BlockId,
    section: &SectionDefinition,
    observer: &mut dyn TraceObserver,
) -> String {
    let scope = tree.enclosing_row(anchor);
    let mut collected: Vec<&str> = Vec::new();
    let mut next = tree.next_in_flow_within(anchor, scope);
    let mut steps = 0;

    loop {
        if steps >= section.max_collector_steps {
            observer.observe(&TraceEvent::CollectorStopped {
                block: None,
                reason: CollectorStop::StepLimit,
            });
            break;
        }
        let Some(current) = next else {
            let reason = if scope.is_some() {
                CollectorStop::EndOfRow
            } else {
                CollectorStop::EndOfDocument
            };
            observer.observe(&TraceEvent::CollectorStopped { block: None, reason });
            break;
        };
        steps += 1;
        next = tree.next_in_flow_within(current, scope);

        let Some(block) = tree.block(current) else {
            break;
        };
        let text = block.text();
        let length = block.text_len();

        if block.kind.is_heading() && length > MIN_TERMINAL_HEADING_LEN {
            observer.observe(&TraceEvent::CollectorStopped {
                block: Some(current),
                reason: CollectorStop::Heading,
            });
            break;
        }
        if is_caps_pseudo_heading(text, length) {
            observer.observe(&TraceEvent::CollectorStopped {
                block: Some(current),
                reason: CollectorStop::CapsPseudoHeading,
            });
            break;
        }
        if length < MIN_PARAGRAPH_LEN {
            let wrapper = block.kind == BlockKind::Container && !tree.contains_table(current);
            match tree.first_child(current).filter(|_| wrapper) {
                Some(child) => {
                    next = Some(child);
                    observer.observe(&TraceEvent::CollectorSkipped {
                        block: current,
                        reason: CollectorSkip::Wrapper,
                    });
                }
                None => observer.observe(&TraceEvent::CollectorSkipped {
                    block: current,
                    reason: CollectorSkip::TooShort,
                }),
            }
            continue;
        }
        if tree.contains_table(current) {
            observer.observe(&TraceEvent::CollectorSkipped {
                block: current,
                reason: CollectorSkip::Table,
            });
            continue;
        }

        collected.push(text);
        observer.observe(&TraceEvent::Collected { block: current });

        if collected.len() >= section.max_collected_paragraphs {
            observer.observe(&TraceEvent::CollectorStopped {
                block: Some(current),
                reason: CollectorStop::ParagraphLimit,
            });
            break;
        }
    }

    collected.join(PARAGRAPH_SEPARATOR)
}
