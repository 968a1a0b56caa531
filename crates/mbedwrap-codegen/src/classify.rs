//! Deciding what kind of class member a function node is.

use mbedwrap_dwarf::{NodeId, SymbolTree, Tag, TypeRef};

/// Classification of one member function against its owning class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Constructor,
    /// `Class(const Class&)`; never bound.
    CopyConstructor,
    Destructor,
    Operator,
    /// Instance method taking the receiver as its first parameter.
    Member,
    Rejected(String),
}

impl MemberKind {
    /// Constructors and instance members get bindings.
    pub fn is_bindable(&self) -> bool {
        matches!(self, MemberKind::Constructor | MemberKind::Member)
    }
}

/// The class name up to any template argument list: `Queue<int>` -> `Queue`.
pub fn base_name(name: &str) -> &str {
    name.split('<').next().unwrap_or(name).trim_end()
}

/// Classify `function` as a member of `class`.
///
/// The checks are ordered so that exactly one kind applies.
pub fn classify(tree: &SymbolTree, class: NodeId, function: NodeId) -> MemberKind {
    let Some(class_name) = tree[class].name() else {
        return MemberKind::Rejected("owning class has no name".into());
    };
    let Some(name) = tree[function].name() else {
        return MemberKind::Rejected("function has no name".into());
    };
    let class_base = base_name(class_name);
    let params = tree.formal_parameters(function);

    if name.starts_with("operator") {
        return MemberKind::Operator;
    }
    if name.strip_prefix('~').is_some_and(|rest| base_name(rest) == class_base) {
        return MemberKind::Destructor;
    }
    if base_name(name) == class_base {
        if params.len() == 2 && is_const_ref_to(tree, &tree[params[1]].type_ref, class) {
            return MemberKind::CopyConstructor;
        }
        if is_pointer_to(tree, &tree[function].type_ref, class) {
            return MemberKind::Constructor;
        }
    }

    match params.first() {
        Some(&receiver) if is_pointer_to(tree, &tree[receiver].type_ref, class) => {
            MemberKind::Member
        }
        Some(_) => MemberKind::Rejected("first parameter is not a receiver pointer".into()),
        None => MemberKind::Rejected("no receiver parameter (static or free function)".into()),
    }
}

/// Skip `const` wrappers.
pub(crate) fn peel_const(tree: &SymbolTree, mut id: NodeId) -> Option<NodeId> {
    for _ in 0..8 {
        if tree[id].tag != Tag::ConstType {
            return Some(id);
        }
        id = tree.type_of(id)?;
    }
    None
}

/// `Class*` or `const Class*`, optionally itself const-qualified.
pub(crate) fn is_pointer_to(tree: &SymbolTree, ty: &TypeRef, class: NodeId) -> bool {
    let Some(ptr) = ty.resolved().and_then(|id| peel_const(tree, id)) else {
        return false;
    };
    tree[ptr].tag == Tag::PointerType
        && tree
            .type_of(ptr)
            .and_then(|target| peel_const(tree, target))
            == Some(class)
}

/// Exactly `const Class&`.
fn is_const_ref_to(tree: &SymbolTree, ty: &TypeRef, class: NodeId) -> bool {
    let Some(reference) = ty.resolved() else {
        return false;
    };
    if tree[reference].tag != Tag::ReferenceType {
        return false;
    }
    let Some(konst) = tree.type_of(reference) else {
        return false;
    };
    tree[konst].tag == Tag::ConstType && tree.type_of(konst) == Some(class)
}
