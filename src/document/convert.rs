// src/document/convert.rs

// --- Imports ---
use std::borrow::Cow;
use std::path::Path;

use scraper::{Html, Node};

use super::tree::{BlockId, BlockKind, BlockNode, DocumentTree};
use crate::utils::error::ConvertError;

/// Parse errors beyond this count are summarised instead of listed.
const MAX_LISTED_PARSE_ERRORS: usize = 3;

/// Output of a successful conversion: the block tree plus non-fatal issues.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub tree: DocumentTree,
    pub warnings: Vec<String>,
}

/// Boundary to the markup conversion step. Implementations turn document bytes into a block tree.
pub trait Converter {
    fn name(&self) -> &str;

    fn convert(&self, bytes: &[u8]) -> Result<Conversion, ConvertError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Xml,
    JsonTree,
}

impl SourceFormat {
    /// Picks the format from the file name extension, falling back to sniffing the content.
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        let bare = name.split(['?', '#']).next().unwrap_or(name);
        let extension = Path::new(bare)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("html") | Some("htm") => return SourceFormat::Html,
            Some("xhtml") | Some("xml") => return SourceFormat::Xml,
            Some("json") => return SourceFormat::JsonTree,
            _ => {}
        }

        let head = bytes
            .iter()
            .skip_while(|b| b.is_ascii_whitespace())
            .take(5)
            .copied()
            .collect::<Vec<u8>>();
        if head.first() == Some(&b'{') || head.first() == Some(&b'[') {
            SourceFormat::JsonTree
        } else if head.starts_with(b"<?xml") {
            SourceFormat::Xml
        } else {
            SourceFormat::Html
        }
    }

    pub fn converter(self) -> Box<dyn Converter + Send + Sync> {
        match self {
            SourceFormat::Html => Box::new(HtmlConverter),
            SourceFormat::Xml => Box::new(XmlConverter),
            SourceFormat::JsonTree => Box::new(JsonTreeConverter),
        }
    }
}

/// Detects the format of `bytes` and converts them.
pub fn convert_document(name: &str, bytes: &[u8]) -> Result<Conversion, ConvertError> {
    let format = SourceFormat::detect(name, bytes);
    let converter = format.converter();
    tracing::debug!("Converting '{}' with {} converter", name, converter.name());
    converter.convert(bytes)
}

fn finish(
    converter: &str,
    tree: DocumentTree,
    warnings: Vec<String>,
) -> Result<Conversion, ConvertError> {
    if !tree.has_content() {
        return Err(ConvertError::NoContent {
            converter: converter.to_string(),
        });
    }
    tracing::debug!(
        "{} conversion produced {} blocks, {} warnings",
        converter,
        tree.len(),
        warnings.len()
    );
    Ok(Conversion { tree, warnings })
}

// --- Markup element roles ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Block(BlockKind),
    /// Structural wrapper whose children attach to the enclosing block.
    Transparent,
    LineBreak,
    Skip,
    Inline,
}

fn role_of(tag: &str) -> Role {
    let tag = tag.to_ascii_lowercase();
    match tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<u8>().unwrap_or(1);
            Role::Block(BlockKind::heading(level))
        }
        "p" | "li" | "blockquote" | "pre" | "dt" | "dd" | "caption" | "figcaption" => {
            Role::Block(BlockKind::Paragraph)
        }
        "div" | "section" | "article" | "main" | "header" | "footer" | "nav" | "aside"
        | "figure" | "form" => Role::Block(BlockKind::Container),
        // A row keeps its cells together so a label cell only reaches its own row.
        "tr" => Role::Block(BlockKind::Container),
        "table" => Role::Block(BlockKind::Table),
        "td" | "th" => Role::Block(BlockKind::TableCell),
        // List items sit in the flow of the surrounding blocks.
        "html" | "body" | "thead" | "tbody" | "tfoot" | "colgroup" | "ul" | "ol" | "dl" => {
            Role::Transparent
        }
        "br" | "hr" => Role::LineBreak,
        "head" | "script" | "style" | "title" | "noscript" | "template" | "col" => Role::Skip,
        _ => Role::Inline,
    }
}

/// Read access shared by the HTML and XML walkers.
trait MarkupNode: Copy {
    fn markup_tag(&self) -> Option<&str>;
    fn markup_text(&self) -> Option<&str>;
    fn markup_children(&self) -> Vec<Self>;
}

impl<'a> MarkupNode for ego_tree::NodeRef<'a, Node> {
    fn markup_tag(&self) -> Option<&str> {
        self.value().as_element().map(|element| element.name())
    }

    fn markup_text(&self) -> Option<&str> {
        self.value().as_text().map(|text| &**text)
    }

    fn markup_children(&self) -> Vec<Self> {
        self.children().collect()
    }
}

impl<'a, 'input> MarkupNode for roxmltree::Node<'a, 'input> {
    fn markup_tag(&self) -> Option<&str> {
        if self.is_element() {
            Some(self.tag_name().name())
        } else {
            None
        }
    }

    fn markup_text(&self) -> Option<&str> {
        if self.is_text() {
            self.text()
        } else {
            None
        }
    }

    fn markup_children(&self) -> Vec<Self> {
        self.children().collect()
    }
}

/// Collects the block's own text: text nodes and inline descendants, stopping at nested blocks.
fn own_text<N: MarkupNode>(node: N, out: &mut String) {
    for child in node.markup_children() {
        if let Some(text) = child.markup_text() {
            out.push_str(text);
            continue;
        }
        match child.markup_tag().map(role_of) {
            Some(Role::Inline) => own_text(child, out),
            Some(Role::Skip) | None => {}
            Some(_) => out.push(' '),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn append_block<N: MarkupNode>(node: N, kind: BlockKind, parent: BlockId, tree: &mut DocumentTree) {
    let mut text = String::new();
    own_text(node, &mut text);
    if let Some(id) = tree.append(parent, kind, collapse_whitespace(&text)) {
        build(node, id, tree);
    }
}

/// Emits the pending loose text as a paragraph, if any.
fn flush_loose(pending: &mut String, parent: BlockId, tree: &mut DocumentTree) {
    let text = collapse_whitespace(pending);
    pending.clear();
    if !text.is_empty() {
        tree.append(parent, BlockKind::Paragraph, text);
    }
}

/// Children of a block. Its own text is already taken, so only nested blocks matter here.
fn build<N: MarkupNode>(node: N, parent: BlockId, tree: &mut DocumentTree) {
    for child in node.markup_children() {
        let Some(tag) = child.markup_tag() else {
            continue;
        };
        match role_of(tag) {
            Role::Block(kind) => append_block(child, kind, parent, tree),
            Role::Transparent => {
                let mut pending = String::new();
                build_flow(child, parent, tree, &mut pending);
                flush_loose(&mut pending, parent, tree);
            }
            // Inline wrappers may still hold block elements.
            Role::Inline => build(child, parent, tree),
            Role::LineBreak | Role::Skip => {}
        }
    }
}

/// Children of a transparent wrapper. Loose text runs become paragraphs in place,
/// split at every block child.
fn build_flow<N: MarkupNode>(
    node: N,
    parent: BlockId,
    tree: &mut DocumentTree,
    pending: &mut String,
) {
    for child in node.markup_children() {
        if let Some(text) = child.markup_text() {
            pending.push_str(text);
            continue;
        }
        let Some(tag) = child.markup_tag() else {
            continue;
        };
        match role_of(tag) {
            Role::Block(kind) => {
                flush_loose(pending, parent, tree);
                append_block(child, kind, parent, tree);
            }
            Role::Transparent => {
                pending.push(' ');
                build_flow(child, parent, tree, pending);
                pending.push(' ');
            }
            Role::Inline => build_flow(child, parent, tree, pending),
            Role::LineBreak => pending.push(' '),
            Role::Skip => {}
        }
    }
}

// --- Converters ---

/// HTML (e.g. Word documents already rendered to HTML) via `scraper`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlConverter;

impl Converter for HtmlConverter {
    fn name(&self) -> &str {
        "html"
    }

    fn convert(&self, bytes: &[u8]) -> Result<Conversion, ConvertError> {
        let mut warnings = Vec::new();
        let text = String::from_utf8_lossy(bytes);
        if let Cow::Owned(_) = text {
            warnings.push("Invalid UTF-8 sequences were replaced".to_string());
        }

        let document = Html::parse_document(&text);
        if !document.errors.is_empty() {
            let listed = document
                .errors
                .iter()
                .take(MAX_LISTED_PARSE_ERRORS)
                .map(|e| e.as_ref())
                .collect::<Vec<_>>()
                .join("; ");
            warnings.push(format!(
                "{} HTML parse errors (first: {})",
                document.errors.len(),
                listed
            ));
        }

        let mut tree = DocumentTree::new();
        let root = tree.root();
        // The synthetic <html> root of the parse; walk from the tree root so it is handled like any wrapper.
        build(document.tree.root(), root, &mut tree);

        finish(self.name(), tree, warnings)
    }
}

/// Well-formed XHTML / XML via `roxmltree`. Namespaces are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlConverter;

impl Converter for XmlConverter {
    fn name(&self) -> &str {
        "xml"
    }

    fn convert(&self, bytes: &[u8]) -> Result<Conversion, ConvertError> {
        let text = std::str::from_utf8(bytes)?;
        let document = roxmltree::Document::parse(text)?;

        let mut tree = DocumentTree::new();
        let root = tree.root();
        build(document.root(), root, &mut tree);

        finish(self.name(), tree, Vec::new())
    }
}

/// Nested JSON block form, see [`BlockNode`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeConverter;

impl JsonTreeConverter {
    fn clamp_levels(nodes: &mut [BlockNode], warnings: &mut Vec<String>) {
        for node in nodes {
            if let BlockKind::Heading(level) = node.kind {
                let clamped = BlockKind::heading(level);
                if clamped != node.kind {
                    warnings.push(format!("Heading level {} clamped into 1..=6", level));
                    node.kind = clamped;
                }
            }
            Self::clamp_levels(&mut node.children, warnings);
        }
    }
}

impl Converter for JsonTreeConverter {
    fn name(&self) -> &str {
        "json"
    }

    fn convert(&self, bytes: &[u8]) -> Result<Conversion, ConvertError> {
        let mut nodes: Vec<BlockNode> = serde_json::from_slice(bytes)?;
        let mut warnings = Vec::new();
        Self::clamp_levels(&mut nodes, &mut warnings);
        finish(self.name(), DocumentTree::from(nodes), warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(tree: &DocumentTree) -> Vec<(BlockKind, String)> {
        tree.blocks()
            .map(|(_, b)| (b.kind, b.text().to_string()))
            .collect()
    }

    #[test]
    fn test_html_block_mapping() {
        let html = r#"<html><head><title>x</title><style>p{}</style></head><body>
            <h2>İş <b>Akışı</b></h2>
            <p>Birinci   paragraf<br/>devamı</p>
            <div>Kap <span>metni</span><p>iç paragraf</p></div>
            <table><tbody><tr><td>hücre</td><td><p>hücre paragrafı</p></td></tr></tbody></table>
        </body></html>"#;
        let conversion = HtmlConverter.convert(html.as_bytes()).unwrap();
        let blocks = kinds_and_texts(&conversion.tree);

        assert_eq!(blocks[0], (BlockKind::Heading(2), "İş Akışı".to_string()));
        assert_eq!(blocks[1], (BlockKind::Paragraph, "Birinci paragraf devamı".to_string()));
        assert_eq!(blocks[2], (BlockKind::Container, "Kap metni".to_string()));
        assert_eq!(blocks[3], (BlockKind::Paragraph, "iç paragraf".to_string()));
        assert_eq!(blocks[4], (BlockKind::Table, String::new()));
        assert_eq!(blocks[5], (BlockKind::Container, String::new()));
        assert_eq!(blocks[6], (BlockKind::TableCell, "hücre".to_string()));
        assert_eq!(blocks[7], (BlockKind::TableCell, String::new()));
        assert_eq!(blocks[8], (BlockKind::Paragraph, "hücre paragrafı".to_string()));
        assert_eq!(blocks.len(), 9);
    }

    #[test]
    fn test_html_rows_group_their_cells() {
        let html = "<table><tr><td>Etiket</td><td>Değer</td></tr><tr><td>Diğer</td></tr></table>";
        let tree = HtmlConverter.convert(html.as_bytes()).unwrap().tree;
        let ids: Vec<BlockId> = tree.blocks().map(|(id, _)| id).collect();
        // table, row, cell, cell, row, cell
        assert_eq!(ids.len(), 6);
        assert_eq!(tree.parent(ids[2]), Some(ids[1]));
        assert_eq!(tree.parent(ids[3]), Some(ids[1]));
        assert_eq!(tree.parent(ids[5]), Some(ids[4]));
        assert_eq!(tree.enclosing_row(ids[2]), Some(ids[1]));
    }

    #[test]
    fn test_html_list_items_join_the_flow() {
        let html = "<h1>İş Akışı</h1><ol><li>Müşteri formu doldurur.</li><li>Yönetici formu inceler.</li></ol><h1>Ekler</h1>";
        let tree = HtmlConverter.convert(html.as_bytes()).unwrap().tree;
        let blocks = kinds_and_texts(&tree);
        assert_eq!(
            blocks,
            vec![
                (BlockKind::Heading(1), "İş Akışı".to_string()),
                (BlockKind::Paragraph, "Müşteri formu doldurur.".to_string()),
                (BlockKind::Paragraph, "Yönetici formu inceler.".to_string()),
                (BlockKind::Heading(1), "Ekler".to_string()),
            ]
        );
    }

    #[test]
    fn test_html_loose_text_keeps_its_place() {
        let html = "<body><h1>İş Akışı</h1>Müşteri <b>formu</b> doldurur.<h1>Ekler</h1>Ek metin burada</body>";
        let tree = HtmlConverter.convert(html.as_bytes()).unwrap().tree;
        let blocks = kinds_and_texts(&tree);
        assert_eq!(
            blocks,
            vec![
                (BlockKind::Heading(1), "İş Akışı".to_string()),
                (BlockKind::Paragraph, "Müşteri formu doldurur.".to_string()),
                (BlockKind::Heading(1), "Ekler".to_string()),
                (BlockKind::Paragraph, "Ek metin burada".to_string()),
            ]
        );
    }

    #[test]
    fn test_html_nested_blocks_are_children() {
        let html = "<div><p>a paragraph</p></div><p>after</p>";
        let tree = HtmlConverter.convert(html.as_bytes()).unwrap().tree;
        let ids: Vec<BlockId> = tree.blocks().map(|(id, _)| id).collect();
        assert_eq!(tree.parent(ids[1]), Some(ids[0]));
        assert_eq!(tree.next_sibling(ids[0]), Some(ids[2]));
    }

    #[test]
    fn test_html_loose_body_text_becomes_paragraph() {
        let tree = HtmlConverter
            .convert("<body>loose body text</body>".as_bytes())
            .unwrap()
            .tree;
        let blocks = kinds_and_texts(&tree);
        assert_eq!(blocks, vec![(BlockKind::Paragraph, "loose body text".to_string())]);
    }

    #[test]
    fn test_empty_html_is_a_conversion_error() {
        let result = HtmlConverter.convert(b"<html><body>  <table></table> </body></html>");
        assert!(matches!(result, Err(ConvertError::NoContent { .. })));
    }

    #[test]
    fn test_invalid_utf8_html_warns() {
        let mut bytes = b"<p>metin ".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b"</p>");
        let conversion = HtmlConverter.convert(&bytes).unwrap();
        assert!(conversion
            .warnings
            .iter()
            .any(|w| w.contains("Invalid UTF-8")));
    }

    #[test]
    fn test_xhtml_conversion() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <html xmlns="http://www.w3.org/1999/xhtml"><body>
              <h1>Muhasebe Deseni</h1><p>Borç <em>kaydı</em> yapılır.</p>
            </body></html>"#;
        let conversion = XmlConverter.convert(xml.as_bytes()).unwrap();
        let blocks = kinds_and_texts(&conversion.tree);
        assert_eq!(
            blocks,
            vec![
                (BlockKind::Heading(1), "Muhasebe Deseni".to_string()),
                (BlockKind::Paragraph, "Borç kaydı yapılır.".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_xml_is_a_conversion_error() {
        let result = XmlConverter.convert(b"<html><body><p>open</body></html>");
        assert!(matches!(result, Err(ConvertError::Xml(_))));
    }

    #[test]
    fn test_json_tree_clamps_heading_levels() {
        let json = r#"[{"kind": {"type": "heading", "level": 9}, "text": "Derin"}]"#;
        let conversion = JsonTreeConverter.convert(json.as_bytes()).unwrap();
        let (_, block) = conversion.tree.blocks().next().unwrap();
        assert_eq!(block.kind, BlockKind::Heading(6));
        assert_eq!(conversion.warnings.len(), 1);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::detect("a/b.HTM", b""), SourceFormat::Html);
        assert_eq!(SourceFormat::detect("doc.xhtml", b""), SourceFormat::Xml);
        assert_eq!(
            SourceFormat::detect("https://host/tree.json?v=2", b""),
            SourceFormat::JsonTree
        );
        assert_eq!(SourceFormat::detect("noext", b"  [ {}"), SourceFormat::JsonTree);
        assert_eq!(SourceFormat::detect("noext", b"<?xml version"), SourceFormat::Xml);
        assert_eq!(SourceFormat::detect("noext", b"<p>x</p>"), SourceFormat::Html);
    }
}
