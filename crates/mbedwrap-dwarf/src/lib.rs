//! DWARF info dump parsing for mbedwrap.
//!
//! This crate provides:
//! - Record parsing of `objdump --dwarf=info` text
//! - Symbol tree reconstruction from level-tagged records
//! - Resolution of `DW_AT_type` references into tree links
//! - Class and member queries used by the binding generator
//!
//! # Architecture
//!
//! ```text
//! dump text → SymbolRecord stream → SymbolTree → resolved SymbolTree
//! ```

mod error;
mod export;
mod query;
mod record;
mod resolve;
mod tag;
mod tree;

pub use error::{DwarfError, Result};
pub use query::{Accessibility, EnumValue};
pub use record::{parse_records, RecordParser, SymbolRecord};
pub use resolve::{resolve_references, ResolveStats};
pub use tag::Tag;
pub use tree::{build_tree, NodeId, SymbolNode, SymbolTree, TreeBuilder, TypeRef};

use mbedwrap_common::Diagnostics;

/// A resolved tree plus everything that went wrong on the way.
#[derive(Debug)]
pub struct ParsedDump {
    pub tree: SymbolTree,
    pub diagnostics: Diagnostics,
}

impl SymbolTree {
    /// Parse, build and resolve in one go.
    pub fn from_dump(text: &str, diags: &mut Diagnostics) -> Result<SymbolTree> {
        let records = parse_records(text, diags)?;
        if records.is_empty() {
            return Err(DwarfError::Empty);
        }
        let mut tree = build_tree(records, diags);
        resolve_references(&mut tree, diags)?;
        tracing::info!(nodes = tree.len(), "symbol tree ready");
        Ok(tree)
    }
}

/// Parse a dump into a resolved symbol tree.
pub fn parse_dump(text: &str) -> Result<ParsedDump> {
    let mut diagnostics = Diagnostics::new();
    let tree = SymbolTree::from_dump(text, &mut diagnostics)?;
    Ok(ParsedDump { tree, diagnostics })
}
