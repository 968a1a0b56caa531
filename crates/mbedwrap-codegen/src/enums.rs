//! Enumerations exposed to scripts as global objects.

use crate::writer::CodeWriter;
use indexmap::IndexMap;
use mbedwrap_common::Diagnostics;
use mbedwrap_dwarf::{EnumValue, NodeId, SymbolTree};
use smol_str::SmolStr;

/// One exported enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBinding {
    pub name: String,
    pub node: NodeId,
    pub address: SmolStr,
    pub values: Vec<EnumValue>,
}

/// Enumerations keyed by name, in first-registration order.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    entries: IndexMap<String, EnumBinding>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the enumeration at `id`.
    ///
    /// Registering the same node again is a no-op. A different node reusing an
    /// already registered name is refused with a warning, so the first
    /// registration keeps its values. Returns whether a new entry was added.
    pub fn register(&mut self, tree: &SymbolTree, id: NodeId, diags: &mut Diagnostics) -> bool {
        let node = &tree[id];
        let Some(name) = node.name() else {
            diags.warn(format!(
                "anonymous enumeration at <0x{}> cannot be exported",
                node.address
            ));
            return false;
        };

        if let Some(existing) = self.entries.get(name) {
            if existing.node != id {
                diags.warn(format!(
                    "enumeration '{name}' at <0x{}> clashes with <0x{}>; keeping the first",
                    node.address, existing.address
                ));
            }
            return false;
        }

        tracing::debug!(name, values = tree.enumerators(id).len(), "registering enum");
        self.entries.insert(
            name.to_string(),
            EnumBinding {
                name: name.to_string(),
                node: id,
                address: node.address.clone(),
                values: tree.enumerators(id),
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&EnumBinding> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumBinding> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `void mbed_js_<Js>_setup()`, which publishes each enumeration as a
    /// global object of name to value properties.
    pub fn render_setup(&self, js_name: &str) -> String {
        let mut w = CodeWriter::new();
        w.block(&format!("void mbed_js_{js_name}_setup() {{"), "}", |w| {
            for (ix, binding) in self.iter().enumerate() {
                if ix > 0 {
                    w.blank();
                }
                w.block("{", "}", |w| {
                    w.writeln("jerry_value_t enum_obj = jerry_create_object();");
                    w.blank();
                    for value in &binding.values {
                        w.writeln(&format!(
                            "jerry_set_property(enum_obj, jerry_create_string((const jerry_char_t*)\"{}\"), jerry_create_number((double) {}));",
                            value.name, value.value
                        ));
                    }
                    w.blank();
                    w.writeln("jerry_value_t global_obj = jerry_get_global_object();");
                    w.writeln(&format!(
                        "jerry_set_property(global_obj, jerry_create_string((const jerry_char_t*)\"{}\"), enum_obj);",
                        binding.name
                    ));
                    w.writeln("jerry_release_value(global_obj);");
                });
            }
        });
        w.finish()
    }
}

impl<'a> IntoIterator for &'a EnumRegistry {
    type Item = &'a EnumBinding;
    type IntoIter = indexmap::map::Values<'a, String, EnumBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
