//! Read-only queries over a resolved [`SymbolTree`].

use crate::tag::Tag;
use crate::tree::{NodeId, SymbolTree};

/// C++ member access, from `DW_AT_accessibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

impl Accessibility {
    /// Parse dump values like `1\t(public)` or a bare `3`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.contains("public") || value == "1" {
            Some(Accessibility::Public)
        } else if value.contains("protected") || value == "2" {
            Some(Accessibility::Protected)
        } else if value.contains("private") || value == "3" {
            Some(Accessibility::Private)
        } else {
            None
        }
    }
}

/// An enumeration constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

impl SymbolTree {
    /// The class or struct named `name`.
    ///
    /// Definitions win over forward declarations; among equals the first in
    /// document order wins.
    pub fn find_class_by_name(&self, name: &str) -> Option<NodeId> {
        let mut declaration = None;
        for (id, node) in self.iter() {
            if !node.tag.is_record() || node.name() != Some(name) {
                continue;
            }
            if !node.is_declaration() {
                return Some(id);
            }
            declaration.get_or_insert(id);
        }
        declaration
    }

    /// Effective accessibility of a class member.
    ///
    /// Without an explicit attribute, struct members are public and class
    /// members private.
    pub fn accessibility(&self, member: NodeId) -> Accessibility {
        if let Some(access) = self[member].attr("accessibility").and_then(Accessibility::parse) {
            return access;
        }
        match self.parent(member).map(|p| &self[p].tag) {
            Some(Tag::StructureType) => Accessibility::Public,
            _ => Accessibility::Private,
        }
    }

    /// Public member functions of `class`, in declaration order.
    pub fn public_members(&self, class: NodeId) -> Vec<NodeId> {
        self.children(class)
            .iter()
            .copied()
            .filter(|&c| {
                self[c].tag == Tag::Subprogram && self.accessibility(c) == Accessibility::Public
            })
            .collect()
    }

    /// Formal parameters of a function, receiver included.
    pub fn formal_parameters(&self, function: NodeId) -> Vec<NodeId> {
        self.children(function)
            .iter()
            .copied()
            .filter(|&c| self[c].tag == Tag::FormalParameter)
            .collect()
    }

    /// `ns::Outer::Name` for a named node, following enclosing namespaces and
    /// records.
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        let mut parts = vec![self[id].name()?.to_string()];
        let mut current = self.parent(id);
        while let Some(parent) = current {
            let node = &self[parent];
            match (&node.tag, node.name()) {
                (Tag::Namespace | Tag::ClassType | Tag::StructureType, Some(name)) => {
                    parts.push(name.to_string());
                }
                _ => {}
            }
            current = self.parent(parent);
        }
        parts.reverse();
        Some(parts.join("::"))
    }

    /// Constants of an enumeration type, in declaration order.
    ///
    /// A missing or unparsable `DW_AT_const_value` falls back to the
    /// constant's position.
    pub fn enumerators(&self, enumeration: NodeId) -> Vec<EnumValue> {
        self.children(enumeration)
            .iter()
            .filter(|&&c| self[c].tag == Tag::Enumerator)
            .enumerate()
            .filter_map(|(ordinal, &c)| {
                let node = &self[c];
                let value = node
                    .attr("const_value")
                    .and_then(parse_const)
                    .unwrap_or(ordinal as i64);
                Some(EnumValue {
                    name: node.name()?.to_string(),
                    value,
                })
            })
            .collect()
    }
}

fn parse_const(raw: &str) -> Option<i64> {
    let raw = raw.split_whitespace().next()?;
    match raw.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_dump;

    const DUMP: &str = r#"
 <0><b>: Abbrev Number: 1 (DW_TAG_compile_unit)
 <1><10>: Abbrev Number: 2 (DW_TAG_namespace)
    <11>   DW_AT_name        : hw
 <2><20>: Abbrev Number: 3 (DW_TAG_class_type)
    <21>   DW_AT_name        : Led
    <22>   DW_AT_declaration : 1
 <2><30>: Abbrev Number: 3 (DW_TAG_class_type)
    <31>   DW_AT_name        : Led
 <3><40>: Abbrev Number: 4 (DW_TAG_subprogram)
    <41>   DW_AT_name        : on
    <42>   DW_AT_accessibility: 1	(public)
 <3><50>: Abbrev Number: 4 (DW_TAG_subprogram)
    <51>   DW_AT_name        : reset
 <3><60>: Abbrev Number: 5 (DW_TAG_enumeration_type)
    <61>   DW_AT_name        : Mode
 <4><62>: Abbrev Number: 6 (DW_TAG_enumerator)
    <63>   DW_AT_name        : Off
    <64>   DW_AT_const_value : 0
 <4><65>: Abbrev Number: 6 (DW_TAG_enumerator)
    <66>   DW_AT_name        : Blink
    <67>   DW_AT_const_value : 0x4
 <4><68>: Abbrev Number: 6 (DW_TAG_enumerator)
    <69>   DW_AT_name        : On
 <4><6a>: Abbrev Number: 0
 <3><70>: Abbrev Number: 4 (DW_TAG_subprogram)
    <71>   DW_AT_name        : off
    <72>   DW_AT_accessibility: 3	(private)
 <1><80>: Abbrev Number: 7 (DW_TAG_structure_type)
    <81>   DW_AT_name        : Pin
 <2><90>: Abbrev Number: 4 (DW_TAG_subprogram)
    <91>   DW_AT_name        : read
"#;

    #[test]
    fn test_find_class_prefers_definition() {
        let parsed = parse_dump(DUMP).unwrap();
        let led = parsed.tree.find_class_by_name("Led").unwrap();
        assert_eq!(parsed.tree[led].address, "30");
        assert!(parsed.tree.find_class_by_name("Missing").is_none());
    }

    #[test]
    fn test_public_members_respect_defaults() {
        let parsed = parse_dump(DUMP).unwrap();
        let tree = &parsed.tree;

        let led = tree.find_class_by_name("Led").unwrap();
        let members: Vec<_> = tree
            .public_members(led)
            .into_iter()
            .map(|m| tree[m].name().unwrap().to_string())
            .collect();
        assert_eq!(members, vec!["on"]);

        let pin = tree.find_class_by_name("Pin").unwrap();
        assert_eq!(tree.public_members(pin).len(), 1);
    }

    #[test]
    fn test_qualified_name_and_enumerators() {
        let parsed = parse_dump(DUMP).unwrap();
        let tree = &parsed.tree;

        let mode = tree.lookup("60").unwrap();
        assert_eq!(tree.qualified_name(mode).as_deref(), Some("hw::Led::Mode"));

        let values = tree.enumerators(mode);
        let pairs: Vec<_> = values.iter().map(|v| (v.name.as_str(), v.value)).collect();
        assert_eq!(pairs, vec![("Off", 0), ("Blink", 4), ("On", 2)]);
    }

    #[test]
    fn test_accessibility_parse() {
        assert_eq!(Accessibility::parse("1\t(public)"), Some(Accessibility::Public));
        assert_eq!(Accessibility::parse("2\t(protected)"), Some(Accessibility::Protected));
        assert_eq!(Accessibility::parse("3"), Some(Accessibility::Private));
        assert_eq!(Accessibility::parse("weird"), None);
    }
}
