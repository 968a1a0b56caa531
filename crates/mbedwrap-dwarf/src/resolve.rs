//! Replace raw `<0x..>` type references with links into the tree.

use crate::error::Result;
use crate::tree::{SymbolTree, TypeRef};
use mbedwrap_common::{Diagnostic, Diagnostics};
use regex::Regex;

/// Counters from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub resolved: usize,
    pub unresolved: usize,
}

/// Resolve every `Raw` type reference against the address index.
///
/// All nodes are indexed before this runs, so forward references resolve in
/// the same single pass. Already-resolved links are left alone, which makes a
/// second call a no-op.
pub fn resolve_references(tree: &mut SymbolTree, diags: &mut Diagnostics) -> Result<ResolveStats> {
    let reference = Regex::new(r"^<0x([0-9a-fA-F]+)>")?;
    let mut stats = ResolveStats::default();

    let ids: Vec<_> = tree.node_ids().collect();
    for id in ids {
        let raw = match &tree[id].type_ref {
            TypeRef::Raw(raw) => raw.clone(),
            _ => continue,
        };
        let Some(caps) = reference.captures(raw.trim()) else {
            continue;
        };
        let target = tree.lookup(&caps[1]);
        match target {
            Some(target) => {
                if let Some(node) = tree.get_mut(id) {
                    node.type_ref = TypeRef::Resolved(target);
                }
                stats.resolved += 1;
            }
            None => {
                let node = &tree[id];
                let mut diag = Diagnostic::warning(format!(
                    "Unresolved type reference {} on <{}>",
                    raw.trim(),
                    node.address
                ));
                if let Some(line) = node.line {
                    diag = diag.at_line(line);
                }
                diags.push(diag);
                stats.unresolved += 1;
            }
        }
    }

    tracing::debug!(
        resolved = stats.resolved,
        unresolved = stats.unresolved,
        "resolved type references"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SymbolRecord;
    use crate::tag::Tag;
    use crate::tree::build_tree;
    use indexmap::IndexMap;

    fn record(level: u32, address: &str, tag: Tag, ty: Option<&str>) -> SymbolRecord {
        let mut attributes = IndexMap::new();
        if let Some(ty) = ty {
            attributes.insert("type".into(), ty.to_string());
        }
        SymbolRecord {
            level,
            address: address.into(),
            abbrev: 1,
            tag,
            name: None,
            full_name: None,
            attributes,
            line: 0,
        }
    }

    #[test]
    fn test_forward_and_backward_references() {
        let mut diags = Diagnostics::new();
        let mut tree = build_tree(
            vec![
                record(0, "10", Tag::PointerType, Some("<0x30>")),
                record(0, "20", Tag::BaseType, None),
                record(0, "30", Tag::ClassType, None),
                record(0, "40", Tag::Typedef, Some("<0x20>")),
            ],
            &mut diags,
        );

        let stats = resolve_references(&mut tree, &mut diags).unwrap();

        assert_eq!(stats, ResolveStats { resolved: 2, unresolved: 0 });
        let ptr = tree.lookup("10").unwrap();
        assert_eq!(tree.type_of(ptr), tree.lookup("30"));
        let td = tree.lookup("40").unwrap();
        assert_eq!(tree.type_of(td), tree.lookup("20"));
    }

    #[test]
    fn test_missing_target_stays_raw() {
        let mut diags = Diagnostics::new();
        let mut tree = build_tree(
            vec![record(0, "10", Tag::PointerType, Some("<0x99>"))],
            &mut diags,
        );

        let stats = resolve_references(&mut tree, &mut diags).unwrap();

        assert_eq!(stats.unresolved, 1);
        let ptr = tree.lookup("10").unwrap();
        assert_eq!(tree[ptr].type_ref, TypeRef::Raw("<0x99>".into()));
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_self_referencing_cycle() {
        let mut diags = Diagnostics::new();
        let mut tree = build_tree(
            vec![
                record(0, "10", Tag::ClassType, None),
                record(1, "11", Tag::Subprogram, None),
                record(2, "12", Tag::FormalParameter, Some("<0x20>")),
                record(0, "20", Tag::PointerType, Some("<0x10>")),
            ],
            &mut diags,
        );

        resolve_references(&mut tree, &mut diags).unwrap();

        let param = tree.lookup("12").unwrap();
        let ptr = tree.type_of(param).unwrap();
        assert_eq!(tree.type_of(ptr), tree.lookup("10"));
    }
}
