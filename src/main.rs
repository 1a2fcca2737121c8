//! Command-line interface for xsd-engine

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use tracing::debug;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsd_engine::{compile_from_uri, Diagnostic, Document, Grammar, ValidationReport};

/// Every document is valid
#[cfg(feature = "cli")]
const EXIT_VALID: u8 = 0;
/// At least one document is invalid
#[cfg(feature = "cli")]
const EXIT_INVALID: u8 = 1;
/// The schema or a document could not be read or compiled
#[cfg(feature = "cli")]
const EXIT_FAILURE: u8 = 2;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsd-engine")]
#[command(author, version, about = "XML Schema 1.0 validation tool", long_about = None)]
struct Cli {
    /// Log compilation and validation progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate XML documents against an XSD schema
    Validate {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// XML files to validate
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print one JSON report per file
        #[arg(long)]
        json: bool,
    },

    /// Compile a schema and list its global components
    Inspect {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Validate {
            schema,
            files,
            json,
        } => cmd_validate(&schema, &files, json),
        Commands::Inspect { schema } => cmd_inspect(&schema),
    };
    ExitCode::from(code)
}

/// `RUST_LOG` wins over `--verbose`
#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "xsd_engine=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn load_grammar(schema: &Path) -> Option<Grammar> {
    match compile_from_uri(&schema.to_string_lossy()) {
        Ok(grammar) => Some(grammar),
        Err(e) => {
            eprintln!("{}: {}", schema.display(), e);
            None
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(schema: &Path, files: &[PathBuf], json: bool) -> u8 {
    let Some(grammar) = load_grammar(schema) else {
        return EXIT_FAILURE;
    };

    let mut code = EXIT_VALID;
    for file in files {
        let document = match Document::from_file(file) {
            Ok(document) => document,
            Err(e) => {
                eprintln!("{}: {}", file.display(), e);
                code = EXIT_FAILURE;
                continue;
            }
        };

        let report = grammar.validate(&document);
        debug!(file = %file.display(), valid = report.valid, "validated");
        if json {
            print_json_report(file, &report);
        } else {
            print_text_report(file, &report);
        }
        if !report.valid && code == EXIT_VALID {
            code = EXIT_INVALID;
        }
    }
    code
}

#[cfg(feature = "cli")]
fn print_text_report(file: &Path, report: &ValidationReport) {
    for diagnostic in &report.diagnostics {
        println!("{}:{}", file.display(), render(diagnostic));
    }
    let errors = report.errors().count();
    if report.valid {
        println!("{}: valid", file.display());
    } else {
        println!("{}: invalid ({} error(s))", file.display(), errors);
    }
}

#[cfg(feature = "cli")]
fn render(diagnostic: &Diagnostic) -> String {
    match &diagnostic.location {
        Some(location) => format!("{}: {}: {}", location, diagnostic.severity, diagnostic.message),
        None => format!(" {}: {}", diagnostic.severity, diagnostic.message),
    }
}

#[cfg(feature = "cli")]
fn print_json_report(file: &Path, report: &ValidationReport) {
    let value = serde_json::json!({
        "file": file.display().to_string(),
        "valid": report.valid,
        "diagnostics": report.diagnostics,
    });
    match serde_json::to_string(&value) {
        Ok(line) => println!("{}", line),
        Err(e) => eprintln!("{}: {}", file.display(), e),
    }
}

#[cfg(feature = "cli")]
fn cmd_inspect(schema: &Path) -> u8 {
    let Some(grammar) = load_grammar(schema) else {
        return EXIT_FAILURE;
    };

    println!("xsd-engine v{}", xsd_engine::VERSION);
    println!();
    println!("Schema: {}", schema.display());
    println!(
        "  Target Namespace: {}",
        grammar.target_namespace().unwrap_or("(none)")
    );
    println!("  Global Elements: {}", grammar.element_count());
    println!("  Global Types: {}", grammar.type_count());

    println!("\n=== Global Elements ===");
    for name in grammar.element_names() {
        if let Some(id) = grammar.lookup_element(name) {
            let type_name = grammar.type_display_name(grammar.element_type(id));
            println!("  {} : {}", name, type_name);
        }
    }

    println!("\n=== Global Types ===");
    for name in grammar.type_names() {
        if let Some(id) = grammar.lookup_type(name) {
            let kind = if grammar.type_definition(id).is_simple() {
                "simple"
            } else {
                "complex"
            };
            println!("  {} ({})", name, kind);
        }
    }
    EXIT_VALID
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
