//! Generation pipeline for mbedwrap.
//!
//! The [`Driver`] reads an objdump symbols file, finds the requested class,
//! runs the binding generator and lays the results out as a
//! `jerryscript-mbed-<lib>-<millis>` package. All validation and lookup happen
//! before anything touches the filesystem.

mod config;
mod error;
pub mod templates;

pub use config::{ConfigFile, GenerateOptions, GenerateSection, CONFIG_FILE_NAME};
pub use error::{DriverError, Result};

use mbedwrap_codegen::{BindingGenerator, ClassBindings};
use mbedwrap_common::Diagnostics;
use mbedwrap_dwarf::SymbolTree;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use templates::PackageNames;

/// One file of a generated package, relative to the package folder.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// A package rendered in memory.
#[derive(Debug)]
pub struct GeneratedPackage {
    /// `jerryscript-mbed-<lib>-<millis>`
    pub folder_name: String,
    pub library_name: String,
    pub files: Vec<GeneratedFile>,
    pub bindings: ClassBindings,
    pub diagnostics: Diagnostics,
}

impl GeneratedPackage {
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    /// Write every file under `output_dir/<folder_name>` and return that
    /// folder.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let folder = output_dir.join(&self.folder_name);
        for file in &self.files {
            let path = folder.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| DriverError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, &file.contents)
                .map_err(|source| DriverError::Write { path: path.clone(), source })?;
            tracing::debug!(path = %path.display(), bytes = file.contents.len(), "wrote");
        }
        Ok(folder)
    }
}

/// Drives one generation run.
pub struct Driver {
    options: GenerateOptions,
}

impl Driver {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Read the symbols file and render the package in memory.
    pub fn generate(&self) -> Result<GeneratedPackage> {
        self.options.validate()?;
        let text = read_symbols(&self.options.symbols)?;
        self.generate_from_dump(&text)
    }

    /// Render the package from dump text already in memory.
    pub fn generate_from_dump(&self, text: &str) -> Result<GeneratedPackage> {
        self.options.validate()?;
        let mut diagnostics = Diagnostics::new();
        let tree = SymbolTree::from_dump(text, &mut diagnostics)?;

        let class_name = &self.options.class_name;
        let class = tree
            .find_class_by_name(class_name)
            .ok_or_else(|| DriverError::ClassNotFound(class_name.clone()))?;

        let js_class = self.options.js_class_name();
        let bindings = BindingGenerator::new(&tree, class, js_class).generate(&mut diagnostics);

        let names = PackageNames {
            library: self.options.library_name(),
            js_class: js_class.to_string(),
            native_class: bindings.native_name.clone(),
        };
        let package_dir = PathBuf::from(names.package());
        let files = vec![
            GeneratedFile {
                path: package_dir.join(names.class_header()),
                contents: templates::class_header(&names),
            },
            GeneratedFile {
                path: package_dir.join(names.lib_header()),
                contents: templates::lib_header(&names),
            },
            GeneratedFile {
                path: Path::new("source").join(names.source_file()),
                contents: templates::source(&names, &bindings),
            },
            GeneratedFile {
                path: PathBuf::from("mbedjs.json"),
                contents: templates::mbedjs_json(&names)?,
            },
            GeneratedFile {
                path: PathBuf::from("package.json"),
                contents: templates::package_json(&names)?,
            },
        ];

        tracing::info!(
            class = %class_name,
            js_class,
            library = %names.library,
            warnings = diagnostics.warnings().count(),
            "package rendered"
        );

        Ok(GeneratedPackage {
            folder_name: format!("jerryscript-mbed-{}-{}", names.library, timestamp_millis()),
            library_name: names.library,
            files,
            bindings,
            diagnostics,
        })
    }

    /// Generate and write into the configured output directory.
    pub fn run(&self) -> Result<(PathBuf, GeneratedPackage)> {
        let package = self.generate()?;
        let folder = package.write(&self.options.output_dir)?;
        tracing::info!(folder = %folder.display(), "done");
        Ok((folder, package))
    }
}

/// JSON view of a class subtree, with type chains inlined `type_depth` deep.
pub fn dump_class(symbols: &Path, class_name: &str, type_depth: usize) -> Result<serde_json::Value> {
    let text = read_symbols(symbols)?;
    let mut diagnostics = Diagnostics::new();
    let tree = SymbolTree::from_dump(&text, &mut diagnostics)?;
    let class = tree
        .find_class_by_name(class_name)
        .ok_or_else(|| DriverError::ClassNotFound(class_name.to_string()))?;
    Ok(tree.export(class, type_depth))
}

fn read_symbols(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| DriverError::ReadSymbols {
        path: path.to_path_buf(),
        source,
    })
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
