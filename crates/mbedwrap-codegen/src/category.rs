//! Mapping DWARF type chains onto marshalling categories.

use crate::classify::peel_const;
use crate::error::{CodegenError, Result};
use mbedwrap_dwarf::{NodeId, SymbolTree, Tag, TypeRef};

/// Links followed before a type chain is considered malformed.
pub const MAX_TYPE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// A string class held by value, e.g. `std::string`.
    Owned,
    /// `char*` / `const char*`.
    CStr,
}

/// The closed set of shapes the policy table knows how to marshal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Void,
    Numeric,
    Boolean,
    String(StringKind),
    Enum(NodeId),
    /// Pointer to a class or struct.
    Handle(NodeId),
    /// Reference to a class or struct.
    ByRef(NodeId),
    /// Class or struct by value.
    Object(NodeId),
}

/// A categorised type plus its C++ spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub category: TypeCategory,
    pub spelling: String,
}

impl NativeType {
    fn new(category: TypeCategory, spelling: impl Into<String>) -> Self {
        Self {
            category,
            spelling: spelling.into(),
        }
    }
}

const NUMERIC_BASE_TYPES: &[&str] = &[
    "int",
    "unsigned int",
    "short int",
    "short unsigned int",
    "long int",
    "long unsigned int",
    "long long int",
    "long long unsigned int",
    "char",
    "signed char",
    "unsigned char",
    "float",
    "double",
    "long double",
];

/// Only plain `char` pointers are text; `signed char` and `unsigned char`
/// pointers (`uint8_t*`) are byte buffers.
const TEXT_CHAR: &str = "char";

/// Integer aliases treated as numbers even when their typedef chain is
/// missing from the dump.
fn is_integer_alias(name: &str) -> bool {
    let name = name.rsplit("::").next().unwrap_or(name);
    matches!(name, "size_t" | "ssize_t" | "uintptr_t" | "intptr_t")
        || ["int8_t", "int16_t", "int32_t", "int64_t"]
            .iter()
            .any(|alias| name == *alias || name.strip_prefix('u') == Some(alias))
}

fn is_string_like(name: &str) -> bool {
    matches!(name, "string" | "String") || name.starts_with("basic_string<char")
}

/// Categorise the type a `DW_AT_type` link points at.
///
/// A missing link is `void`.
pub fn categorize(tree: &SymbolTree, ty: &TypeRef) -> Result<NativeType> {
    match ty {
        TypeRef::None => Ok(NativeType::new(TypeCategory::Void, "void")),
        TypeRef::Raw(raw) => Err(CodegenError::UnresolvedType(raw.clone())),
        TypeRef::Resolved(id) => categorize_node(tree, *id, 0),
    }
}

fn categorize_node(tree: &SymbolTree, id: NodeId, depth: usize) -> Result<NativeType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(CodegenError::TooDeep(MAX_TYPE_DEPTH));
    }
    let node = &tree[id];
    match &node.tag {
        Tag::BaseType => {
            let name = node.name().ok_or(CodegenError::Anonymous)?;
            if name == "bool" {
                Ok(NativeType::new(TypeCategory::Boolean, name))
            } else if NUMERIC_BASE_TYPES.contains(&name) {
                Ok(NativeType::new(TypeCategory::Numeric, name))
            } else {
                Err(CodegenError::UnknownBaseType(name.to_string()))
            }
        }
        Tag::Typedef => categorize_typedef(tree, id, depth),
        Tag::ConstType => {
            let inner = inner(tree, id)?;
            categorize_node(tree, inner, depth + 1)
        }
        Tag::PointerType => categorize_pointer(tree, id, depth),
        Tag::ReferenceType => categorize_reference(tree, id, depth),
        Tag::ClassType | Tag::StructureType => {
            let spelling = spelling(tree, id)?;
            if node.name().is_some_and(is_string_like) {
                Ok(NativeType::new(TypeCategory::String(StringKind::Owned), spelling))
            } else {
                Ok(NativeType::new(TypeCategory::Object(id), spelling))
            }
        }
        Tag::EnumerationType => Ok(NativeType::new(TypeCategory::Enum(id), spelling(tree, id)?)),
        other => Err(CodegenError::UnknownTag(other.to_string())),
    }
}

/// Unwrap one level and dispatch again, keeping the typedef's own spelling
/// for value categories so casts read `uint8_t` rather than `unsigned char`.
fn categorize_typedef(tree: &SymbolTree, id: NodeId, depth: usize) -> Result<NativeType> {
    let node = &tree[id];
    let name = node.name().ok_or(CodegenError::Anonymous)?;
    let alias = spelling(tree, id)?;
    if is_string_like(name) {
        return Ok(NativeType::new(TypeCategory::String(StringKind::Owned), alias));
    }

    let Some(inner) = tree.type_of(id) else {
        if is_integer_alias(name) {
            return Ok(NativeType::new(TypeCategory::Numeric, alias));
        }
        return match &node.type_ref {
            TypeRef::Raw(raw) => Err(CodegenError::UnresolvedType(raw.clone())),
            _ => Err(CodegenError::OpaqueTypedef(name.to_string())),
        };
    };

    let mut resolved = categorize_node(tree, inner, depth + 1)?;
    if matches!(
        resolved.category,
        TypeCategory::Numeric
            | TypeCategory::Boolean
            | TypeCategory::Enum(_)
            | TypeCategory::String(StringKind::Owned)
            | TypeCategory::Object(_)
    ) {
        resolved.spelling = alias;
    }
    Ok(resolved)
}

fn categorize_pointer(tree: &SymbolTree, id: NodeId, depth: usize) -> Result<NativeType> {
    let pointee = tree
        .type_of(id)
        .ok_or_else(|| CodegenError::UnsupportedPointer("void*".into()))?;
    let target = peel_typedefs(tree, pointee, depth)?;
    let target_node = &tree[target];

    if target_node.tag == Tag::BaseType
        && target_node.name() == Some(TEXT_CHAR)
    {
        let is_const = tree[pointee].tag == Tag::ConstType;
        let spelling = if is_const { "const char*" } else { "char*" };
        return Ok(NativeType::new(TypeCategory::String(StringKind::CStr), spelling));
    }
    if target_node.tag.is_record() {
        // Spell from the pointee so `const Board*` keeps its qualifier.
        return Ok(NativeType::new(
            TypeCategory::Handle(target),
            format!("{}*", spelling(tree, pointee)?),
        ));
    }
    Err(CodegenError::UnsupportedPointer(format!(
        "{}*",
        spelling(tree, pointee).unwrap_or_else(|_| target_node.tag.to_string())
    )))
}

fn categorize_reference(tree: &SymbolTree, id: NodeId, depth: usize) -> Result<NativeType> {
    let referent = inner(tree, id)?;
    let target = peel_typedefs(tree, referent, depth)?;
    let target_node = &tree[target];

    if target_node.tag.is_record() {
        let spelling = spelling(tree, target)?;
        if target_node.name().is_some_and(is_string_like) {
            return Ok(NativeType::new(TypeCategory::String(StringKind::Owned), spelling));
        }
        return Ok(NativeType::new(TypeCategory::ByRef(target), format!("{spelling}&")));
    }
    Err(CodegenError::UnsupportedReference(
        spelling(tree, referent).unwrap_or_else(|_| target_node.tag.to_string()),
    ))
}

/// Follow `const` and typedef links down to the underlying type.
fn peel_typedefs(tree: &SymbolTree, mut id: NodeId, depth: usize) -> Result<NodeId> {
    for _ in depth..MAX_TYPE_DEPTH {
        id = peel_const(tree, id)
            .ok_or_else(|| CodegenError::UnsupportedPointer("const void".into()))?;
        if tree[id].tag != Tag::Typedef {
            return Ok(id);
        }
        // A string typedef counts as the record it names.
        if tree[id].name().is_some_and(is_string_like) {
            return Ok(tree
                .type_of(id)
                .map_or(id, |inner| peel_const(tree, inner).unwrap_or(inner)));
        }
        id = inner(tree, id)?;
    }
    Err(CodegenError::TooDeep(MAX_TYPE_DEPTH))
}

fn inner(tree: &SymbolTree, id: NodeId) -> Result<NodeId> {
    match &tree[id].type_ref {
        TypeRef::Resolved(inner) => Ok(*inner),
        TypeRef::Raw(raw) => Err(CodegenError::UnresolvedType(raw.clone())),
        TypeRef::None => Err(CodegenError::UnknownTag(format!("{} without a type", tree[id].tag))),
    }
}

/// C++ spelling of a named type or of a pointer/reference/const chain.
pub fn spelling(tree: &SymbolTree, id: NodeId) -> Result<String> {
    spelling_at(tree, id, 0)
}

fn spelling_at(tree: &SymbolTree, id: NodeId, depth: usize) -> Result<String> {
    if depth > MAX_TYPE_DEPTH {
        return Err(CodegenError::TooDeep(MAX_TYPE_DEPTH));
    }
    let node = &tree[id];
    match &node.tag {
        Tag::PointerType => match tree.type_of(id) {
            Some(inner) => Ok(format!("{}*", spelling_at(tree, inner, depth + 1)?)),
            None => Ok("void*".into()),
        },
        Tag::ReferenceType => Ok(format!("{}&", spelling_at(tree, inner(tree, id)?, depth + 1)?)),
        Tag::ConstType => match tree.type_of(id) {
            Some(inner) => Ok(format!("const {}", spelling_at(tree, inner, depth + 1)?)),
            None => Ok("const void".into()),
        },
        Tag::BaseType => node.name().map(str::to_string).ok_or(CodegenError::Anonymous),
        Tag::ClassType | Tag::StructureType
            if node.name().is_some_and(|n| n.starts_with("basic_string<char")) =>
        {
            Ok("std::string".into())
        }
        _ => tree.qualified_name(id).ok_or(CodegenError::Anonymous),
    }
}
