//! DWARF tags that the binding generator distinguishes.

use smol_str::SmolStr;
use std::fmt;

/// The `DW_TAG_*` category of a symbol node.
///
/// Only the tags the generator reasons about get their own variant; every
/// other tag is preserved verbatim in [`Tag::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    BaseType,
    Typedef,
    PointerType,
    ReferenceType,
    ConstType,
    ClassType,
    StructureType,
    EnumerationType,
    Enumerator,
    Subprogram,
    FormalParameter,
    Member,
    Namespace,
    CompileUnit,
    Other(SmolStr),
}

impl Tag {
    /// Map the suffix of a `DW_TAG_<name>` header onto a tag.
    pub fn from_dwarf(name: &str) -> Self {
        match name {
            "base_type" => Tag::BaseType,
            "typedef" => Tag::Typedef,
            "pointer_type" => Tag::PointerType,
            "reference_type" => Tag::ReferenceType,
            "const_type" => Tag::ConstType,
            "class_type" => Tag::ClassType,
            "structure_type" => Tag::StructureType,
            "enumeration_type" => Tag::EnumerationType,
            "enumerator" => Tag::Enumerator,
            "subprogram" => Tag::Subprogram,
            "formal_parameter" => Tag::FormalParameter,
            "member" => Tag::Member,
            "namespace" => Tag::Namespace,
            "compile_unit" => Tag::CompileUnit,
            other => Tag::Other(SmolStr::new(other)),
        }
    }

    /// The `DW_TAG_` suffix as it appears in a dump.
    pub fn as_dwarf(&self) -> &str {
        match self {
            Tag::BaseType => "base_type",
            Tag::Typedef => "typedef",
            Tag::PointerType => "pointer_type",
            Tag::ReferenceType => "reference_type",
            Tag::ConstType => "const_type",
            Tag::ClassType => "class_type",
            Tag::StructureType => "structure_type",
            Tag::EnumerationType => "enumeration_type",
            Tag::Enumerator => "enumerator",
            Tag::Subprogram => "subprogram",
            Tag::FormalParameter => "formal_parameter",
            Tag::Member => "member",
            Tag::Namespace => "namespace",
            Tag::CompileUnit => "compile_unit",
            Tag::Other(name) => name.as_str(),
        }
    }

    /// Class or structure type.
    pub fn is_record(&self) -> bool {
        matches!(self, Tag::ClassType | Tag::StructureType)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DW_TAG_{}", self.as_dwarf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_tags() {
        assert_eq!(Tag::from_dwarf("class_type"), Tag::ClassType);
        assert!(Tag::from_dwarf("structure_type").is_record());
        let other = Tag::from_dwarf("volatile_type");
        assert_eq!(other, Tag::Other("volatile_type".into()));
        assert_eq!(other.to_string(), "DW_TAG_volatile_type");
    }
}
