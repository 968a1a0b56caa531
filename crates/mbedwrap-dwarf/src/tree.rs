//! Arena-backed symbol tree rebuilt from the flat record stream.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Children are
//! owned through their parent's `children` list; `type` links are plain ids
//! and may form cycles (a class whose method takes a pointer to the class).

use crate::record::SymbolRecord;
use crate::tag::Tag;
use indexmap::IndexMap;
use mbedwrap_common::{Diagnostic, Diagnostics};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use std::ops::Index;

/// Stable index of a node in a [`SymbolTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The `DW_AT_type` link of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// No `type` attribute (e.g. a `void` return).
    None,
    /// Reference text as it appeared in the dump, e.g. `<0x4a>`.
    Raw(String),
    Resolved(NodeId),
}

impl TypeRef {
    pub fn resolved(&self) -> Option<NodeId> {
        match self {
            TypeRef::Resolved(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TypeRef::None)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolNode {
    pub level: i32,
    pub address: SmolStr,
    pub abbrev: u32,
    pub tag: Tag,
    pub name: Option<SmolStr>,
    pub full_name: Option<String>,
    pub attributes: IndexMap<SmolStr, String>,
    pub type_ref: TypeRef,
    pub children: Vec<NodeId>,
    /// 0-based header line in the dump; `None` for the synthetic root.
    pub line: Option<usize>,
    parent: Option<NodeId>,
}

impl SymbolNode {
    fn root() -> Self {
        Self {
            level: -1,
            address: SmolStr::default(),
            abbrev: 0,
            tag: Tag::Other(SmolStr::new_static("root")),
            name: None,
            full_name: None,
            attributes: IndexMap::new(),
            type_ref: TypeRef::None,
            children: Vec::new(),
            line: None,
            parent: None,
        }
    }

    fn from_record(mut record: SymbolRecord, parent: NodeId) -> Self {
        let type_ref = match record.attributes.shift_remove("type") {
            Some(raw) => TypeRef::Raw(raw),
            None => TypeRef::None,
        };
        Self {
            level: i32::try_from(record.level).unwrap_or(i32::MAX),
            address: record.address,
            abbrev: record.abbrev,
            tag: record.tag,
            name: record.name,
            full_name: record.full_name,
            attributes: record.attributes,
            type_ref,
            children: Vec::new(),
            line: Some(record.line),
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// True for forward declarations (`DW_AT_declaration : 1`).
    pub fn is_declaration(&self) -> bool {
        self.attr("declaration").is_some_and(|v| v.trim() == "1")
    }
}

/// The resolved symbol forest of one dump.
#[derive(Debug, Clone)]
pub struct SymbolTree {
    nodes: Vec<SymbolNode>,
    by_address: FxHashMap<SmolStr, NodeId>,
}

impl SymbolTree {
    pub const ROOT: NodeId = NodeId(0);

    fn new() -> Self {
        Self {
            nodes: vec![SymbolNode::root()],
            by_address: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&SymbolNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut SymbolNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The node a `type` link resolved to.
    pub fn type_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.type_ref.resolved())
    }

    /// Find the node declared at `address` (hex, with or without `0x`).
    pub fn lookup(&self, address: &str) -> Option<NodeId> {
        let key = address.trim_start_matches("0x").to_ascii_lowercase();
        self.by_address.get(key.as_str()).copied()
    }

    /// Every real node (the synthetic root excluded) in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SymbolNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(ix, node)| (NodeId(ix as u32), node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (1..self.nodes.len() as u32).map(NodeId)
    }

    /// Number of real nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, node: SymbolNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn build_index(&mut self) {
        let mut index = FxHashMap::default();
        for (ix, node) in self.nodes.iter().enumerate().skip(1) {
            if let Some(previous) = index.insert(node.address.clone(), NodeId(ix as u32)) {
                tracing::debug!(address = %node.address, ?previous, "duplicate address; later node wins");
            }
        }
        self.by_address = index;
    }
}

impl Index<NodeId> for SymbolTree {
    type Output = SymbolNode;

    fn index(&self, id: NodeId) -> &SymbolNode {
        &self.nodes[id.index()]
    }
}

/// Rebuilds parent/child structure from a depth-first, level-tagged stream.
///
/// `stack[i]` holds the open node at level `i - 1`; slot 0 is the root.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: SymbolTree,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            tree: SymbolTree::new(),
            stack: vec![SymbolTree::ROOT],
        }
    }

    /// Level of the most recently attached node (`-1` before the first).
    pub fn leaf_level(&self) -> i32 {
        self.stack.len() as i32 - 2
    }

    /// Attach `record` below the open node one level up from it.
    ///
    /// Returns `None` and records a warning when the record skips a level.
    pub fn push(&mut self, record: SymbolRecord, diags: &mut Diagnostics) -> Option<NodeId> {
        // The deepest level that may attach is one below the current leaf.
        let level = match usize::try_from(record.level) {
            Ok(level) if level < self.stack.len() => level,
            _ => {
                diags.push(
                    Diagnostic::warning(format!(
                        "Dropping {} at <{}>: level {} follows level {}",
                        record.tag,
                        record.address,
                        record.level,
                        self.leaf_level()
                    ))
                    .at_line(record.line)
                    .with_help("each record may be at most one level deeper than the one before it"),
                );
                return None;
            }
        };

        // Same level pops the leaf; shallower levels pop back to the ancestor.
        self.stack.truncate(level + 1);
        let parent = *self.stack.last()?;

        let id = self.tree.alloc(SymbolNode::from_record(record, parent));
        if let Some(parent_node) = self.tree.get_mut(parent) {
            parent_node.children.push(id);
        }
        self.stack.push(id);
        Some(id)
    }

    /// Finish building and index every node by address.
    pub fn finish(mut self) -> SymbolTree {
        self.tree.build_index();
        self.tree
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an (unresolved) tree from records in document order.
pub fn build_tree(records: Vec<SymbolRecord>, diags: &mut Diagnostics) -> SymbolTree {
    let mut builder = TreeBuilder::new();
    for record in records {
        builder.push(record, diags);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: u32, address: &str) -> SymbolRecord {
        SymbolRecord {
            level,
            address: address.into(),
            abbrev: 1,
            tag: Tag::BaseType,
            name: Some(address.into()),
            full_name: None,
            attributes: IndexMap::new(),
            line: 0,
        }
    }

    fn names(tree: &SymbolTree, id: NodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|c| tree[*c].address.to_string())
            .collect()
    }

    #[test]
    fn test_sibling_child_and_ancestor() {
        let mut diags = Diagnostics::new();
        let tree = build_tree(
            vec![
                record(0, "a"),
                record(1, "b"),
                record(2, "c"),
                record(2, "d"),
                record(1, "e"),
                record(0, "f"),
            ],
            &mut diags,
        );

        assert_eq!(names(&tree, tree.root()), vec!["a", "f"]);
        let a = tree.lookup("a").unwrap();
        assert_eq!(names(&tree, a), vec!["b", "e"]);
        let b = tree.lookup("b").unwrap();
        assert_eq!(names(&tree, b), vec!["c", "d"]);
        assert_eq!(tree.parent(tree.lookup("d").unwrap()), Some(b));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_multi_level_ascent() {
        let mut diags = Diagnostics::new();
        let tree = build_tree(
            vec![
                record(0, "a"),
                record(1, "b"),
                record(2, "c"),
                record(3, "d"),
                record(1, "e"),
            ],
            &mut diags,
        );

        let a = tree.lookup("a").unwrap();
        assert_eq!(names(&tree, a), vec!["b", "e"]);
    }

    #[test]
    fn test_level_jump_is_dropped() {
        let mut diags = Diagnostics::new();
        let mut builder = TreeBuilder::new();
        assert!(builder.push(record(0, "a"), &mut diags).is_some());
        assert!(builder.push(record(2, "b"), &mut diags).is_none());
        assert_eq!(builder.leaf_level(), 0);
        assert!(builder.push(record(1, "c"), &mut diags).is_some());

        let tree = builder.finish();
        assert_eq!(tree.len(), 2);
        assert!(tree.lookup("b").is_none());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_level_beyond_i32_range_is_dropped() {
        let mut diags = Diagnostics::new();
        let mut builder = TreeBuilder::new();
        assert!(builder.push(record(0, "a"), &mut diags).is_some());
        assert!(builder.push(record(u32::MAX, "b"), &mut diags).is_none());
        assert!(builder.push(record(i32::MAX as u32 + 1, "c"), &mut diags).is_none());
        assert_eq!(builder.leaf_level(), 0);
        assert!(builder.push(record(1, "d"), &mut diags).is_some());

        let tree = builder.finish();
        let a = tree.lookup("a").unwrap();
        assert_eq!(names(&tree, a), vec!["d"]);
        assert_eq!(diags.warnings().count(), 2);
    }

    #[test]
    fn test_first_record_must_be_top_level() {
        let mut diags = Diagnostics::new();
        let tree = build_tree(vec![record(1, "a"), record(0, "b")], &mut diags);

        assert_eq!(names(&tree, tree.root()), vec!["b"]);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_type_attribute_becomes_raw_ref() {
        let mut rec = record(0, "a");
        rec.attributes.insert("type".into(), "<0x4a>".into());
        rec.attributes.insert("byte_size".into(), "4".into());

        let mut diags = Diagnostics::new();
        let tree = build_tree(vec![rec], &mut diags);
        let node = &tree[tree.lookup("0xa").unwrap()];

        assert_eq!(node.type_ref, TypeRef::Raw("<0x4a>".into()));
        assert!(node.attr("type").is_none());
        assert_eq!(node.attr("byte_size"), Some("4"));
    }
}
