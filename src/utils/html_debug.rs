// src/utils/html_debug.rs
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::document::{BlockId, BlockKind, DocumentTree};
use crate::extractors::trace::TraceEvent;
use crate::utils::error::AppError;

/// How a block took part in the extraction, strongest role last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Highlight {
    Rejected,
    Candidate,
    Selected,
    Collected,
    Stop,
    Anchor,
}

impl Highlight {
    fn css_class(self) -> &'static str {
        match self {
            Highlight::Rejected => "highlight-rejected",
            Highlight::Candidate => "highlight-candidate",
            Highlight::Selected => "highlight-selected",
            Highlight::Collected => "highlight-collected",
            Highlight::Stop => "highlight-stop",
            Highlight::Anchor => "highlight-anchor",
        }
    }
}

fn highlight_of(event: &TraceEvent) -> Option<(BlockId, Highlight)> {
    match event {
        TraceEvent::HeadingAnchor { block, .. } | TraceEvent::LooseAnchor { block, .. } => {
            Some((*block, Highlight::Anchor))
        }
        TraceEvent::Collected { block } => Some((*block, Highlight::Collected)),
        TraceEvent::CollectorStopped {
            block: Some(block), ..
        } => Some((*block, Highlight::Stop)),
        TraceEvent::ScanSelected { block, .. } => Some((*block, Highlight::Selected)),
        TraceEvent::ScanCandidate { block, .. } => Some((*block, Highlight::Candidate)),
        TraceEvent::ScanRejected { block, .. }
        | TraceEvent::CollectorSkipped { block, .. }
        | TraceEvent::LooseAnchorTooLong { block, .. } => Some((*block, Highlight::Rejected)),
        _ => None,
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn depth(tree: &DocumentTree, id: BlockId) -> usize {
    let mut depth: usize = 0;
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        depth += 1;
        current = parent;
    }
    depth.saturating_sub(1)
}

fn kind_label(kind: BlockKind) -> String {
    match kind {
        BlockKind::Heading(level) => format!("h{}", level),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Renders every block of `tree` with the role the trace `events` gave it,
/// followed by the event log itself.
pub fn render_trace_html(title: &str, tree: &DocumentTree, events: &[TraceEvent]) -> String {
    let mut roles: HashMap<BlockId, Highlight> = HashMap::new();
    let mut notes: HashMap<BlockId, Vec<String>> = HashMap::new();
    for event in events {
        if let Some((block, highlight)) = highlight_of(event) {
            let role = roles.entry(block).or_insert(highlight);
            *role = (*role).max(highlight);
            notes.entry(block).or_default().push(event.to_string());
        }
    }

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n<style>\n", escape(title)));
    html.push_str(".block { margin: 2px 0; padding: 2px 4px; font-family: sans-serif; }\n");
    html.push_str(".kind { color: #888; font-size: 0.8em; margin-right: 6px; }\n");
    html.push_str(".highlight-anchor { background-color: #FFFF00; }\n");
    html.push_str(".highlight-collected { background-color: #90EE90; }\n");
    html.push_str(".highlight-stop { background-color: #FFA500; }\n");
    html.push_str(".highlight-selected { background-color: #ADD8E6; }\n");
    html.push_str(".highlight-candidate { background-color: #E0F0FF; }\n");
    html.push_str(".highlight-rejected { background-color: #FFC0CB; }\n");
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(title)));

    for (id, block) in tree.blocks() {
        let class = roles
            .get(&id)
            .map(|h| format!("block {}", h.css_class()))
            .unwrap_or_else(|| "block".to_string());
        let title_attr = notes
            .get(&id)
            .map(|n| escape(&n.join("\n")))
            .unwrap_or_default();
        html.push_str(&format!(
            "<div class=\"{}\" style=\"margin-left: {}em\" title=\"{}\"><span class=\"kind\">{}</span>{}</div>\n",
            class,
            depth(tree, id) * 2,
            title_attr,
            kind_label(block.kind),
            escape(block.text())
        ));
    }

    html.push_str("<h2>Trace</h2>\n<ol>\n");
    for event in events {
        html.push_str(&format!("<li>{}</li>\n", escape(&event.to_string())));
    }
    html.push_str("</ol>\n</body>\n</html>");
    html
}

/// Writes a rendered debug page to `filename`.
pub fn save_debug_html<P: AsRef<Path>>(filename: P, html: &str) -> Result<(), AppError> {
    let path = filename.as_ref();
    let mut file = File::create(path)?;
    file.write_all(html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}
