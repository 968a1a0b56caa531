//! Error types for mbedwrap-dwarf.

use thiserror::Error;

/// Result type for dump parsing operations.
pub type Result<T> = std::result::Result<T, DwarfError>;

/// Fatal errors while turning a dump into a symbol tree.
///
/// Malformed input is never fatal; it ends up in the caller's
/// [`Diagnostics`](mbedwrap_common::Diagnostics) instead.
#[derive(Error, Debug)]
pub enum DwarfError {
    /// One of the built-in line patterns failed to compile.
    #[error("Invalid dump pattern: {0}")]
    Regex(#[from] regex::Error),

    /// The dump contained no debug-info records at all.
    #[error("No debug-info records found in dump")]
    Empty,
}
