//! Error types for mbedwrap-driver.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Fatal errors of a generation run. Nothing is written once one is raised.
#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
    #[error("'{0}' is a generic class name and needs an explicit JavaScript class name")]
    #[diagnostic(
        code(mbedwrap::generic_class_name),
        help("usage: mbedwrap generate <symbols> <class> --js-class-name <name> [--library-name <name>]")
    )]
    GenericClassName(String),

    #[error("Could not find object '{0}'")]
    #[diagnostic(code(mbedwrap::class_not_found), help("Are you sure it's linked in?"))]
    ClassNotFound(String),

    #[error("Failed to read symbols file {path}")]
    #[diagnostic(code(mbedwrap::read_symbols))]
    ReadSymbols {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(mbedwrap::config))]
    Config(String),

    #[error("Failed to write {path}")]
    #[diagnostic(code(mbedwrap::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize package descriptor: {0}")]
    #[diagnostic(code(mbedwrap::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse symbols: {0}")]
    #[diagnostic(code(mbedwrap::dwarf))]
    Dwarf(#[from] mbedwrap_dwarf::DwarfError),
}
