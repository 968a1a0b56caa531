//! Per-class binding generation.
//!
//! [`BindingGenerator`] walks the public member functions of one class,
//! classifies and lowers each of them through the policy table, groups
//! overloads by name and hands the result to [`ClassEmitter`], which renders
//! the C++ translation unit body.

use crate::category::{categorize, TypeCategory};
use crate::classify::{classify, MemberKind};
use crate::enums::EnumRegistry;
use crate::error::{CodegenError, Result};
use crate::policy::{param_policy, return_policy, ParamLowering, ReturnLowering, WRAP_NATIVE_OBJECT};
use crate::writer::CodeWriter;
use indexmap::IndexMap;
use mbedwrap_common::{Diagnostic, Diagnostics};
use mbedwrap_dwarf::{NodeId, SymbolTree};

/// Macro name constructors are registered under.
pub const CONSTRUCTOR_NAME: &str = "__constructor";

/// One generated entry point: a member name or the constructor.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    pub name: String,
    pub kind: MemberKind,
    /// Script-visible argument counts, ascending.
    pub arities: Vec<usize>,
    pub text: String,
}

/// A public member left out of the bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFunction {
    pub name: String,
    pub reason: String,
}

/// Everything generated for one class.
#[derive(Debug, Clone)]
pub struct ClassBindings {
    /// Name as it appears in the dump, e.g. `Queue<int>`.
    pub class_name: String,
    /// Spelling used in C++ casts, e.g. `rtos::Queue<int>`.
    pub native_name: String,
    pub js_name: String,
    pub functions: Vec<FunctionBinding>,
    pub dropped: Vec<DroppedFunction>,
    pub enums: EnumRegistry,
    /// Member bodies, class support and the constructor, in that order.
    pub source: String,
}

impl ClassBindings {
    pub fn function(&self, name: &str) -> Option<&FunctionBinding> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn constructor(&self) -> Option<&FunctionBinding> {
        self.function(CONSTRUCTOR_NAME)
    }
}

/// A single declaration lowered through the policy table.
#[derive(Debug, Clone)]
struct Overload {
    arity: usize,
    params: Vec<ParamLowering>,
    args: String,
    /// `None` for constructors.
    ret: Option<ReturnLowering>,
    enums: Vec<NodeId>,
}

impl Overload {
    fn conversions(&self) -> impl Iterator<Item = &String> {
        self.params.iter().flat_map(|p| p.conversion.iter())
    }

    fn cleanups(&self) -> impl Iterator<Item = &String> {
        self.params.iter().flat_map(|p| p.cleanup.iter())
    }
}

/// Same-named declarations keyed by arity; a later one replaces an earlier
/// one with the same arity.
type OverloadGroup = IndexMap<usize, Overload>;

/// Generates JerryScript bindings for one class of a resolved tree.
pub struct BindingGenerator<'a> {
    tree: &'a SymbolTree,
    class: NodeId,
    class_name: String,
    native_name: String,
    js_name: String,
}

impl<'a> BindingGenerator<'a> {
    /// `js_name` is the script-visible class name used in every macro.
    pub fn new(tree: &'a SymbolTree, class: NodeId, js_name: impl Into<String>) -> Self {
        let class_name = tree[class].name().unwrap_or_default().to_string();
        let native_name = tree
            .qualified_name(class)
            .unwrap_or_else(|| class_name.clone());
        Self {
            tree,
            class,
            class_name,
            native_name,
            js_name: js_name.into(),
        }
    }

    pub fn generate(&self, diags: &mut Diagnostics) -> ClassBindings {
        let mut members: IndexMap<String, OverloadGroup> = IndexMap::new();
        let mut constructors = OverloadGroup::new();
        let mut dropped = Vec::new();

        for function in self.tree.public_members(self.class) {
            let name = self.tree[function].name().unwrap_or("<anonymous>").to_string();
            let kind = classify(self.tree, self.class, function);
            let group = match &kind {
                MemberKind::Constructor => &mut constructors,
                MemberKind::Member => members.entry(name.clone()).or_default(),
                MemberKind::Rejected(reason) => {
                    self.drop_function(&mut dropped, diags, &name, reason.clone());
                    continue;
                }
                other => {
                    diags.push(Diagnostic::info(format!(
                        "{}#{name} skipped: {other:?}",
                        self.js_name
                    )));
                    continue;
                }
            };

            match self.lower(function, &kind) {
                Ok(overload) => {
                    tracing::debug!(class = %self.js_name, function = %name, arity = overload.arity, "lowered");
                    if group.insert(overload.arity, overload).is_some() {
                        self.drop_function(
                            &mut dropped,
                            diags,
                            &name,
                            "replaced by a later overload with the same argument count".into(),
                        );
                    }
                }
                Err(err) => self.drop_function(&mut dropped, diags, &name, err.to_string()),
            }
        }

        members.retain(|_, group| !group.is_empty());

        // Only declarations that survived grouping contribute enums.
        let mut enums = EnumRegistry::new();
        for overload in members.values().chain(std::iter::once(&constructors)).flat_map(|g| g.values()) {
            for &id in &overload.enums {
                enums.register(self.tree, id, diags);
            }
        }

        let emitter = ClassEmitter {
            js_name: &self.js_name,
            native_name: &self.native_name,
        };
        let mut functions = Vec::new();
        let mut parts = Vec::new();

        for (name, group) in &mut members {
            group.sort_keys();
            let text = emitter.member(name, group);
            parts.push(text.clone());
            functions.push(FunctionBinding {
                name: name.clone(),
                kind: MemberKind::Member,
                arities: group.keys().copied().collect(),
                text,
            });
        }

        let member_names: Vec<&str> = members.keys().map(String::as_str).collect();
        parts.push(emitter.support(&member_names));

        constructors.sort_keys();
        let text = if constructors.is_empty() {
            diags.warn(format!("{} has no usable public constructor", self.js_name));
            emitter.missing_constructor()
        } else {
            emitter.constructor(&constructors)
        };
        parts.push(text.clone());
        functions.push(FunctionBinding {
            name: CONSTRUCTOR_NAME.to_string(),
            kind: MemberKind::Constructor,
            arities: constructors.keys().copied().collect(),
            text,
        });

        tracing::info!(
            class = %self.js_name,
            functions = functions.len(),
            dropped = dropped.len(),
            enums = enums.len(),
            "generated bindings"
        );

        ClassBindings {
            class_name: self.class_name.clone(),
            native_name: self.native_name.clone(),
            js_name: self.js_name.clone(),
            functions,
            dropped,
            enums,
            source: parts.join("\n\n"),
        }
    }

    fn drop_function(
        &self,
        dropped: &mut Vec<DroppedFunction>,
        diags: &mut Diagnostics,
        name: &str,
        reason: String,
    ) {
        diags.warn(format!("{}#{name} not bound: {reason}", self.js_name));
        dropped.push(DroppedFunction {
            name: name.to_string(),
            reason,
        });
    }

    /// Lower a constructor or member; the receiver parameter is skipped.
    fn lower(&self, function: NodeId, kind: &MemberKind) -> Result<Overload> {
        let tree = self.tree;
        let formals = tree.formal_parameters(function);
        let mut params = Vec::new();
        let mut enums = Vec::new();

        for (index, &param) in formals.iter().skip(1).enumerate() {
            let ty = categorize(tree, &tree[param].type_ref)?;
            match ty.category {
                TypeCategory::Void => return Err(CodegenError::MissingParameterType(index)),
                TypeCategory::Enum(id) => enums.push(id),
                _ => {}
            }
            params.push(param_policy(tree, &ty, index)?);
        }

        let arity = params.len();
        let args = (0..arity)
            .map(|ix| format!("arg{ix}"))
            .collect::<Vec<_>>()
            .join(", ");

        let ret = match kind {
            MemberKind::Constructor => None,
            _ => {
                let name = tree[function].name().ok_or(CodegenError::Anonymous)?;
                let ty = categorize(tree, &tree[function].type_ref)?;
                if let TypeCategory::Enum(id) = ty.category {
                    enums.push(id);
                }
                Some(return_policy(
                    tree,
                    self.class,
                    &ty,
                    &format!("native_ptr->{name}({args})"),
                )?)
            }
        };

        Ok(Overload {
            arity,
            params,
            args,
            ret,
            enums,
        })
    }
}

/// Renders the C++ text for one class.
pub struct ClassEmitter<'a> {
    js_name: &'a str,
    native_name: &'a str,
}

impl ClassEmitter<'_> {
    fn count_guard(group: &OverloadGroup) -> String {
        let alternatives: Vec<String> = group
            .keys()
            .map(|arity| format!("args_count == {arity}"))
            .collect();
        format!("({})", alternatives.join(" || "))
    }

    fn guards(&self, w: &mut CodeWriter, name: &str, group: &OverloadGroup) {
        let js = self.js_name;
        w.writeln(&format!(
            "CHECK_ARGUMENT_COUNT({js}, {name}, {});",
            Self::count_guard(group)
        ));
        let single = group.len() == 1;
        for overload in group.values() {
            for (index, param) in overload.params.iter().enumerate() {
                let check = param.check;
                if single {
                    w.writeln(&format!("CHECK_ARGUMENT_TYPE_ALWAYS({js}, {name}, {index}, {check});"));
                } else {
                    w.writeln(&format!(
                        "CHECK_ARGUMENT_TYPE_ON_CONDITION({js}, {name}, {index}, {check}, (args_count == {}));",
                        overload.arity
                    ));
                }
            }
        }
    }

    /// Body of one overload: conversions, call, cleanups and return.
    fn member_call(w: &mut CodeWriter, overload: &Overload) {
        w.lines(overload.conversions());
        if overload.params.iter().any(|p| !p.conversion.is_empty()) {
            w.blank();
        }
        if let Some(ret) = &overload.ret {
            w.lines(&ret.call);
            w.lines(overload.cleanups());
            w.lines(&ret.ret);
        }
    }

    fn member(&self, name: &str, group: &OverloadGroup) -> String {
        let (js, native) = (self.js_name, self.native_name);
        let mut w = CodeWriter::new();
        w.writeln("/**");
        w.writeln(&format!(" * {js}#{name} (native JavaScript method)"));
        w.writeln(" */");
        w.block(&format!("DECLARE_CLASS_FUNCTION({js}, {name}) {{"), "}", |w| {
            self.guards(w, name, group);
            w.blank();
            w.writeln("uintptr_t ptr_val;");
            w.writeln("jerry_get_object_native_handle(this_obj, &ptr_val);");
            w.writeln(&format!("{native}* native_ptr = reinterpret_cast<{native}*>(ptr_val);"));
            w.blank();

            if group.len() == 1 {
                if let Some(overload) = group.values().next() {
                    Self::member_call(w, overload);
                }
                return;
            }
            for overload in group.values() {
                w.block(&format!("if (args_count == {}) {{", overload.arity), "}", |w| {
                    Self::member_call(w, overload);
                });
            }
            w.blank();
            w.writeln("return jerry_create_undefined();");
        });
        w.finish().trim_end().to_string()
    }

    /// Destructor trampoline plus the object wrapper holding the attachment
    /// block. Emitted once per class.
    fn support(&self, members: &[&str]) -> String {
        let (js, native) = (self.js_name, self.native_name);
        let mut w = CodeWriter::new();
        w.writeln("/**");
        w.writeln(&format!(" * {js}#destructor"));
        w.writeln(" *");
        w.writeln(&format!(" * Called if/when the {js} is GC'ed."));
        w.writeln(" */");
        w.block(
            &format!("void NAME_FOR_CLASS_NATIVE_DESTRUCTOR({js})(const uintptr_t native_handle) {{"),
            "}",
            |w| w.writeln(&format!("delete reinterpret_cast<{native}*>(native_handle);")),
        );
        w.blank();
        w.writeln("/**");
        w.writeln(&format!(" * Wrap a native {js} in a JavaScript object."));
        w.writeln(" */");
        w.block(
            &format!("jerry_value_t {WRAP_NATIVE_OBJECT}({native}* ptr) {{"),
            "}",
            |w| {
                w.writeln("uintptr_t native_ptr = (uintptr_t) ptr;");
                w.blank();
                w.writeln("jerry_value_t js_object = jerry_create_object();");
                w.writeln(&format!(
                    "jerry_set_object_native_handle(js_object, native_ptr, NAME_FOR_CLASS_NATIVE_DESTRUCTOR({js}));"
                ));
                if !members.is_empty() {
                    w.blank();
                    for name in members {
                        w.writeln(&format!("ATTACH_CLASS_FUNCTION(js_object, {js}, {name});"));
                    }
                }
                w.blank();
                w.writeln("return js_object;");
            },
        );
        w.finish().trim_end().to_string()
    }

    fn constructor(&self, group: &OverloadGroup) -> String {
        let (js, native) = (self.js_name, self.native_name);
        let mut w = CodeWriter::new();
        w.writeln("/**");
        w.writeln(&format!(" * {js} (native JavaScript constructor)"));
        w.writeln(" */");
        w.block(&format!("DECLARE_CLASS_CONSTRUCTOR({js}) {{"), "}", |w| {
            self.guards(w, CONSTRUCTOR_NAME, group);
            w.blank();

            if group.len() == 1 {
                if let Some(overload) = group.values().next() {
                    w.lines(overload.conversions());
                    w.writeln(&format!("{native}* native_ptr = new {native}({});", overload.args));
                    w.lines(overload.cleanups());
                }
            } else {
                w.writeln(&format!("{native}* native_ptr = NULL;"));
                for overload in group.values() {
                    w.block(&format!("if (args_count == {}) {{", overload.arity), "}", |w| {
                        w.lines(overload.conversions());
                        w.writeln(&format!("native_ptr = new {native}({});", overload.args));
                        w.lines(overload.cleanups());
                    });
                }
            }
            w.blank();
            w.writeln(&format!("return {WRAP_NATIVE_OBJECT}(native_ptr);"));
        });
        w.finish().trim_end().to_string()
    }

    /// Keeps the registration header linkable when nothing can construct
    /// the class from script.
    fn missing_constructor(&self) -> String {
        let js = self.js_name;
        let mut w = CodeWriter::new();
        w.writeln("/**");
        w.writeln(&format!(" * {js} (no constructor available from JavaScript)"));
        w.writeln(" */");
        w.block(&format!("DECLARE_CLASS_CONSTRUCTOR({js}) {{"), "}", |w| {
            w.writeln(&format!(
                "return jerry_create_error(JERRY_ERROR_TYPE, (const jerry_char_t*) \"{js} cannot be constructed from JavaScript\");"
            ));
        });
        w.finish().trim_end().to_string()
    }
}
