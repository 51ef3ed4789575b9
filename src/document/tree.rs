// src/document/tree.rs

use ego_tree::{NodeRef, Tree};
use serde::{Deserialize, Serialize};

/// Handle to a block inside a [`DocumentTree`]. Only meaningful for the tree that issued it.
pub type BlockId = ego_tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "level")]
pub enum BlockKind {
    /// Synthetic root, never matched or collected.
    Document,
    Heading(u8),
    Paragraph,
    Container,
    Table,
    TableCell,
}

impl BlockKind {
    /// Heading with the level clamped into 1..=6.
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading(level.clamp(1, 6))
    }

    pub fn is_heading(self) -> bool {
        matches!(self, BlockKind::Heading(_))
    }

    /// Blocks the loose anchor scan looks at.
    pub fn is_text_bearing(self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Container | BlockKind::TableCell
        )
    }

    pub fn is_table(self) -> bool {
        matches!(self, BlockKind::Table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    raw_text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            raw_text: text.into(),
        }
    }

    /// Own text of the block, trimmed.
    pub fn text(&self) -> &str {
        self.raw_text.trim()
    }

    /// Length of the trimmed text in characters.
    pub fn text_len(&self) -> usize {
        self.text().chars().count()
    }
}

/// Ordered block tree handed over by a converter. Read-only for the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<BlockNode>", into = "Vec<BlockNode>")]
pub struct DocumentTree {
    tree: Tree<Block>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(Block::new(BlockKind::Document, "")),
        }
    }

    pub fn root(&self) -> BlockId {
        self.tree.root().id()
    }

    /// Appends a block as the last child of `parent`. Returns `None` if `parent` is not in this tree.
    pub fn append(
        &mut self,
        parent: BlockId,
        kind: BlockKind,
        text: impl Into<String>,
    ) -> Option<BlockId> {
        let mut node = self.tree.get_mut(parent)?;
        Some(node.append(Block::new(kind, text)).id())
    }

    /// Appends a top-level block.
    pub fn push(&mut self, kind: BlockKind, text: impl Into<String>) -> BlockId {
        self.tree.root_mut().append(Block::new(kind, text)).id()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.tree.get(id).map(|node| node.value())
    }

    /// All blocks in document order (depth-first, source order), root excluded.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.tree
            .root()
            .descendants()
            .skip(1)
            .map(|node| (node.id(), node.value()))
    }

    pub fn headings(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.blocks().filter(|(_, block)| block.kind.is_heading())
    }

    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.tree.get(id)?.parent().map(|node| node.id())
    }

    #[allow(dead_code)]
    pub fn next_sibling(&self, id: BlockId) -> Option<BlockId> {
        self.tree.get(id)?.next_sibling().map(|node| node.id())
    }

    pub fn first_child(&self, id: BlockId) -> Option<BlockId> {
        self.tree.get(id)?.first_child().map(|node| node.id())
    }

    /// Next block after `id` in document order that is not one of its descendants:
    /// the next sibling, or else the next sibling of the nearest ancestor that has one.
    pub fn next_in_flow(&self, id: BlockId) -> Option<BlockId> {
        self.next_in_flow_within(id, None)
    }

    /// Like [`next_in_flow`](Self::next_in_flow), but never leaves `scope`:
    /// returns `None` once the walk would climb out of it.
    pub fn next_in_flow_within(&self, id: BlockId, scope: Option<BlockId>) -> Option<BlockId> {
        let mut node: NodeRef<'_, Block> = self.tree.get(id)?;
        loop {
            if Some(node.id()) == scope {
                return None;
            }
            if let Some(sibling) = node.next_sibling() {
                return Some(sibling.id());
            }
            node = node.parent()?;
        }
    }

    /// Row holding `id`: the parent of the nearest table cell at or above `id`.
    pub fn enclosing_row(&self, id: BlockId) -> Option<BlockId> {
        let node = self.tree.get(id)?;
        let cell = std::iter::once(node)
            .chain(node.ancestors())
            .find(|n| n.value().kind == BlockKind::TableCell)?;
        cell.parent().map(|row| row.id())
    }

    /// True when some ancestor of `id` is a table.
    pub fn is_inside_table(&self, id: BlockId) -> bool {
        self.tree
            .get(id)
            .map(|node| node.ancestors().any(|a| a.value().kind.is_table()))
            .unwrap_or(false)
    }

    /// True when `id` is a table or has a table among its descendants.
    pub fn contains_table(&self, id: BlockId) -> bool {
        self.tree
            .get(id)
            .map(|node| node.descendants().any(|d| d.value().kind.is_table()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tree.root().descendants().count() - 1
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when at least one heading or text-bearing block carries text.
    pub fn has_content(&self) -> bool {
        self.blocks().any(|(_, block)| {
            (block.kind.is_heading() || block.kind.is_text_bearing()) && !block.text().is_empty()
        })
    }

    fn attach(&mut self, parent: BlockId, node: BlockNode) {
        let Some(id) = self.append(parent, node.kind, node.text) else {
            return;
        };
        for child in node.children {
            self.attach(id, child);
        }
    }

    fn detach(node: NodeRef<'_, Block>) -> BlockNode {
        BlockNode {
            kind: node.value().kind,
            text: node.value().raw_text.clone(),
            children: node.children().map(Self::detach).collect(),
        }
    }
}

/// Nested exchange form of a block, used for JSON trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockNode {
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockNode>,
}

impl From<Vec<BlockNode>> for DocumentTree {
    fn from(nodes: Vec<BlockNode>) -> Self {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        for node in nodes {
            tree.attach(root, node);
        }
        tree
    }
}

impl From<DocumentTree> for Vec<BlockNode> {
    fn from(tree: DocumentTree) -> Self {
        tree.tree.root().children().map(DocumentTree::detach).collect()
    }
}
