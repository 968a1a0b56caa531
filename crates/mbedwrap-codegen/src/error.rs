//! Reasons a member function cannot be bound.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Why a function was dropped from the generated bindings.
///
/// None of these abort a run: the function is left out, a warning is
/// recorded, and generation continues with the remaining members.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("unsupported type tag {0}")]
    UnknownTag(String),

    #[error("unknown base type '{0}'")]
    UnknownBaseType(String),

    #[error("unresolved type reference {0}")]
    UnresolvedType(String),

    #[error("typedef '{0}' has no underlying type")]
    OpaqueTypedef(String),

    #[error("unsupported pointer type '{0}'")]
    UnsupportedPointer(String),

    #[error("unsupported reference type '{0}'")]
    UnsupportedReference(String),

    #[error("cannot return '{0}' to JavaScript")]
    UnsupportedReturn(String),

    #[error("parameter {0} has no type")]
    MissingParameterType(usize),

    #[error("type chain deeper than {0} links")]
    TooDeep(usize),

    #[error("unnamed type")]
    Anonymous,
}
