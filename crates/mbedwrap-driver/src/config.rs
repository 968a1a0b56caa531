//! Generation options and the `mbedwrap.toml` file format.

use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "mbedwrap.toml";

/// Root of `mbedwrap.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub generate: GenerateSection,
}

/// The `[generate]` table. Every key is optional so that command-line values
/// can be layered on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerateSection {
    #[serde(default)]
    pub symbols: Option<PathBuf>,

    #[serde(default)]
    pub class: Option<String>,

    #[serde(default)]
    pub js_class: Option<String>,

    #[serde(default)]
    pub library: Option<String>,

    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
            .map_err(|e| DriverError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl GenerateSection {
    /// Values from `overrides` replace ours where present.
    pub fn overlay(self, overrides: GenerateSection) -> Self {
        Self {
            symbols: overrides.symbols.or(self.symbols),
            class: overrides.class.or(self.class),
            js_class: overrides.js_class.or(self.js_class),
            library: overrides.library.or(self.library),
            output: overrides.output.or(self.output),
        }
    }

    pub fn into_options(self) -> Result<GenerateOptions> {
        let symbols = self
            .symbols
            .ok_or_else(|| DriverError::Config("no symbols file given".into()))?;
        let class = self
            .class
            .ok_or_else(|| DriverError::Config("no class name given".into()))?;

        let mut options = GenerateOptions::new(symbols, class);
        options.js_class_name = self.js_class;
        options.library_name = self.library;
        if let Some(output) = self.output {
            options.output_dir = output;
        }
        Ok(options)
    }
}

/// Fully resolved inputs of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub symbols: PathBuf,
    /// Class as named in the dump, template arguments included.
    pub class_name: String,
    pub js_class_name: Option<String>,
    pub library_name: Option<String>,
    pub output_dir: PathBuf,
}

impl GenerateOptions {
    pub fn new(symbols: impl Into<PathBuf>, class_name: impl Into<String>) -> Self {
        Self {
            symbols: symbols.into(),
            class_name: class_name.into(),
            js_class_name: None,
            library_name: None,
            output_dir: PathBuf::from("output"),
        }
    }

    pub fn with_js_class_name(mut self, name: impl Into<String>) -> Self {
        self.js_class_name = Some(name.into());
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Script-visible class name; defaults to the native class name.
    pub fn js_class_name(&self) -> &str {
        self.js_class_name.as_deref().unwrap_or(&self.class_name)
    }

    /// Library name; defaults to the lowercased JS class name.
    pub fn library_name(&self) -> String {
        match &self.library_name {
            Some(name) => name.clone(),
            None => self.js_class_name().to_lowercase(),
        }
    }

    /// Checks that need no symbols file.
    pub fn validate(&self) -> Result<()> {
        if self.class_name.trim().is_empty() {
            return Err(DriverError::Config("class name is empty".into()));
        }
        if self.class_name.contains('<') && self.js_class_name.is_none() {
            return Err(DriverError::GenericClassName(self.class_name.clone()));
        }
        let js = self.js_class_name();
        if !is_identifier(js) {
            return Err(DriverError::Config(format!(
                "JavaScript class name '{js}' is not a valid identifier"
            )));
        }
        let library = self.library_name();
        if library.is_empty() || library.contains(['/', '\\']) {
            return Err(DriverError::Config(format!("invalid library name '{library}'")));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
