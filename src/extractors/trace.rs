// src/extractors/trace.rs
//! Decision events emitted while a section is extracted.

use std::fmt;

use crate::document::BlockId;

/// States of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    NotStarted,
    AnchorSearched,
    ContentCollected,
    NoAnchor,
    ScanSearched,
    FoundStrict,
    FoundScan,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStop {
    Heading,
    CapsPseudoHeading,
    ParagraphLimit,
    StepLimit,
    EndOfRow,
    EndOfDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorSkip {
    TooShort,
    /// Text-less container; the walk continues with its children.
    Wrapper,
    Table,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanRejection {
    TooShort,
    Blacklisted(String),
    NumericOnly,
    BelowThreshold(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    StateChanged(ExtractionState),
    HeadingAnchor { block: BlockId, term: String },
    LooseAnchor { block: BlockId, term: String },
    LooseAnchorTooLong { block: BlockId, length: usize },
    AnchorNotFound,
    Collected { block: BlockId },
    CollectorSkipped { block: BlockId, reason: CollectorSkip },
    CollectorStopped { block: Option<BlockId>, reason: CollectorStop },
    ScanRejected { block: BlockId, reason: ScanRejection },
    ScanCandidate { block: BlockId, score: f64 },
    ScanSelected { block: BlockId, rank: usize },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::StateChanged(state) => write!(f, "state -> {:?}", state),
            TraceEvent::HeadingAnchor { block, term } => {
                write!(f, "heading {:?} matched anchor term '{}'", block, term)
            }
            TraceEvent::LooseAnchor { block, term } => {
                write!(f, "block {:?} matched anchor term '{}' (loose)", block, term)
            }
            TraceEvent::LooseAnchorTooLong { block, length } => {
                write!(f, "block {:?} contains an anchor term but is too long ({} chars)", block, length)
            }
            TraceEvent::AnchorNotFound => write!(f, "no anchor found"),
            TraceEvent::Collected { block } => write!(f, "collected {:?}", block),
            TraceEvent::CollectorSkipped { block, reason } => {
                write!(f, "skipped {:?}: {:?}", block, reason)
            }
            TraceEvent::CollectorStopped { block, reason } => {
                write!(f, "collector stopped at {:?}: {:?}", block, reason)
            }
            TraceEvent::ScanRejected { block, reason } => {
                write!(f, "scan rejected {:?}: {:?}", block, reason)
            }
            TraceEvent::ScanCandidate { block, score } => {
                write!(f, "scan candidate {:?} score {:.1}", block, score)
            }
            TraceEvent::ScanSelected { block, rank } => {
                write!(f, "scan selected {:?} at rank {}", block, rank)
            }
        }
    }
}

/// Receives every decision the extractor takes, in order.
pub trait TraceObserver {
    fn observe(&mut self, event: &TraceEvent);
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {
    fn observe(&mut self, _event: &TraceEvent) {}
}

/// Re-emits events as `tracing` records tagged with the section id.
#[derive(Debug, Clone)]
pub struct LogObserver {
    section: String,
}

impl LogObserver {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }
}

impl TraceObserver for LogObserver {
    fn observe(&mut self, event: &TraceEvent) {
        match event {
            // Per-block scan noise
            TraceEvent::ScanRejected { .. } | TraceEvent::CollectorSkipped { .. } => {
                tracing::trace!(section = %self.section, "{}", event)
            }
            _ => tracing::debug!(section = %self.section, "{}", event),
        }
    }
}

/// Keeps every event, for tests and debug rendering.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<TraceEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<ExtractionState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::StateChanged(state) => Some(*state),
                _ => None,
            })
            .collect()
    }
}

impl TraceObserver for RecordingObserver {
    fn observe(&mut self, event: &TraceEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards each event to two observers.
pub struct Tee<'a> {
    first: &'a mut dyn TraceObserver,
    second: &'a mut dyn TraceObserver,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a mut dyn TraceObserver, second: &'a mut dyn TraceObserver) -> Self {
        Self { first, second }
    }
}

impl TraceObserver for Tee<'_> {
    fn observe(&mut self, event: &TraceEvent) {
        self.first.observe(event);
        self.second.observe(event);
    }
}
