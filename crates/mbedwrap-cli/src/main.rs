use clap::{Parser, Subcommand};
use mbedwrap_common::{init_logging, LogLevel};
use mbedwrap_driver::{dump_class, ConfigFile, Driver, GenerateSection, CONFIG_FILE_NAME};
use miette::Result;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mbedwrap")]
#[command(author, version, about = "Generate JerryScript bindings for mbed C++ classes from objdump symbols")]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level: error, warn, info, debug or trace (overrides --verbose)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a JerryScript wrapper package for a class
    Generate {
        /// Output of `objdump --dwarf=info`
        symbols: Option<PathBuf>,

        /// Class to wrap, as named in the symbols (e.g. `Queue<int>`)
        class: Option<String>,

        /// Class name exposed to JavaScript (required for generic classes)
        #[arg(long)]
        js_class_name: Option<String>,

        /// Library name (default: lowercased JavaScript class name)
        #[arg(long)]
        library_name: Option<String>,

        /// Directory the package folder is created in
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: ./mbedwrap.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a class subtree as JSON
    Dump {
        /// Output of `objdump --dwarf=info`
        symbols: PathBuf,

        /// Class to print
        class: String,

        /// How many levels of type links to inline
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => LogLevel::Debug,
            (None, false) => LogLevel::Warn,
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => Ok(ConfigFile::from_file(path)?),
        None => {
            let default = Path::new(CONFIG_FILE_NAME);
            if default.is_file() {
                tracing::debug!(path = %default.display(), "using config file");
                Ok(ConfigFile::from_file(default)?)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.log_level());

    match cli.command {
        Commands::Generate {
            symbols,
            class,
            js_class_name,
            library_name,
            output,
            config,
        } => {
            let file = load_config(config.as_deref())?;
            let options = file
                .generate
                .overlay(GenerateSection {
                    symbols,
                    class,
                    js_class: js_class_name,
                    library: library_name,
                    output,
                })
                .into_options()?;

            let (folder, package) = Driver::new(options).run()?;

            for dropped in &package.bindings.dropped {
                println!("Skipped {}: {}", dropped.name, dropped.reason);
            }
            let warnings = package.diagnostics.warnings().count();
            if warnings > 0 {
                println!("{warnings} warning(s) reported");
            }
            println!("Done {}", folder.display());
            println!(
                "Do not forget to add 'mbed-js-{}' to your package.json dependencies",
                package.library_name
            );
        }

        Commands::Dump {
            symbols,
            class,
            depth,
        } => {
            let json = dump_class(&symbols, &class, depth)?;
            println!("{json:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(args: &[&str]) -> LogLevel {
        Cli::try_parse_from(args).unwrap().log_level()
    }

    #[test]
    fn test_log_level_flag() {
        assert_eq!(level(&["mbedwrap", "dump", "syms.txt", "Led"]), LogLevel::Warn);
        assert_eq!(level(&["mbedwrap", "-v", "dump", "syms.txt", "Led"]), LogLevel::Debug);
        assert_eq!(
            level(&["mbedwrap", "dump", "syms.txt", "Led", "--log-level", "TRACE"]),
            LogLevel::Trace
        );
        assert_eq!(
            level(&["mbedwrap", "-v", "--log-level", "error", "dump", "syms.txt", "Led"]),
            LogLevel::Error
        );
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let err = Cli::try_parse_from(["mbedwrap", "--log-level", "loud", "dump", "s", "Led"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown log level: loud"));
    }
}
