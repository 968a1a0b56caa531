//! Non-fatal findings collected while parsing a dump or generating bindings.
//!
//! Malformed dump lines, dropped records and unsupported member functions do
//! not stop a run. They are pushed into a [`Diagnostics`] sink, logged through
//! `tracing` as they arrive, and reported to the caller at the end.
//!
//! Warnings are things the user should look at. Notes record members that are
//! left out on purpose (operators, destructors) and only show up in debug
//! logs.

use miette::Diagnostic as MietteDiagnostic;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Info,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("{message}")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// 1-based line in the dump the finding refers to, if any.
    pub line: Option<usize>,
    #[help]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
            help: None,
        }
    }

    /// Attach a 0-based line index; stored and displayed 1-based.
    pub fn at_line(mut self, index: usize) -> Self {
        self.line = Some(index + 1);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Ordered collection of diagnostics for one run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        let line = diagnostic.line.unwrap_or_default();
        match diagnostic.level {
            DiagnosticLevel::Warning => tracing::warn!(line, "{}", diagnostic.message),
            DiagnosticLevel::Info => tracing::debug!(line, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::warning(message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.level == DiagnosticLevel::Info)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
