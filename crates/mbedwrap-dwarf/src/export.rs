//! JSON view of a subtree, for `mbedwrap dump`.
//!
//! Children are emitted in full. `type` links are inlined without their
//! children and only `type_depth` links deep, so self-referencing types
//! terminate.

use crate::tree::{NodeId, SymbolTree, TypeRef};
use serde_json::{Map, Value};

impl SymbolTree {
    pub fn export(&self, id: NodeId, type_depth: usize) -> Value {
        let mut object = self.export_fields(id, type_depth);
        let children = self
            .children(id)
            .iter()
            .map(|&c| self.export(c, type_depth))
            .collect();
        object.insert("children".into(), Value::Array(children));
        Value::Object(object)
    }

    fn export_type(&self, id: NodeId, depth: usize) -> Value {
        Value::Object(self.export_fields(id, depth))
    }

    fn export_fields(&self, id: NodeId, type_depth: usize) -> Map<String, Value> {
        let node = &self[id];
        let mut object = Map::new();
        object.insert("level".into(), node.level.into());
        object.insert("address".into(), node.address.as_str().into());
        object.insert("tag".into(), node.tag.as_dwarf().into());
        if let Some(name) = node.name() {
            object.insert("name".into(), name.into());
        }
        if let Some(full_name) = &node.full_name {
            object.insert("fullName".into(), full_name.as_str().into());
        }
        for (key, value) in &node.attributes {
            object.insert(key.to_string(), value.as_str().into());
        }
        match &node.type_ref {
            TypeRef::None => {}
            TypeRef::Raw(raw) => {
                object.insert("type".into(), raw.as_str().into());
            }
            TypeRef::Resolved(target) if type_depth > 0 => {
                object.insert("type".into(), self.export_type(*target, type_depth - 1));
            }
            TypeRef::Resolved(target) => {
                let address = format!("<0x{}>", self[*target].address);
                object.insert("type".into(), address.into());
            }
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_dump;

    #[test]
    fn test_export_terminates_on_cycles() {
        let dump = r#"
 <0><b>: Abbrev Number: 9 (DW_TAG_compile_unit)
 <1><10>: Abbrev Number: 1 (DW_TAG_class_type)
    <11>   DW_AT_name        : Node
 <2><20>: Abbrev Number: 2 (DW_TAG_subprogram)
    <21>   DW_AT_name        : next
    <22>   DW_AT_type        : <0x30>
 <1><30>: Abbrev Number: 3 (DW_TAG_pointer_type)
    <31>   DW_AT_type        : <0x10>
"#;
        let parsed = parse_dump(dump).unwrap();
        let class = parsed.tree.find_class_by_name("Node").unwrap();

        let json = parsed.tree.export(class, 2);

        assert_eq!(json["name"], "Node");
        let method = &json["children"][0];
        assert_eq!(method["name"], "next");
        assert_eq!(method["type"]["tag"], "pointer_type");
        assert_eq!(method["type"]["type"]["name"], "Node");
        assert!(method["type"]["type"].get("children").is_none());
    }
}
