//! Expression Inspector CLI
//!
//! Classifies, validates and converts FigTree expressions from the command
//! line. This is a hosting application for the core library, not part of it.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fig_tree_edit::{
    classify, from_shorthand, summary_label, to_shorthand, to_v2, validate_expression,
    EditorConfig, NodeContext, NodeKind, Registry, RegistryData, Severity,
};

#[derive(Parser)]
#[command(name = "figtree-inspect")]
#[command(about = "Inspect and convert FigTree expressions")]
struct Cli {
    /// Path to a serialized registry catalog (JSON)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the root node of an expression
    Classify {
        /// Expression file (JSON)
        file: PathBuf,
    },

    /// Validate a whole expression
    Validate {
        /// Expression file (JSON)
        file: PathBuf,
    },

    /// Convert an expression between syntaxes
    Convert {
        /// Expression file (JSON)
        file: PathBuf,
        /// Target form
        #[arg(short, long, value_enum)]
        to: Target,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List or search registered operators
    Operators {
        /// Fuzzy search query
        query: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Shorthand,
    Canonical,
    V2,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load_from(Some(path))?,
        None => EditorConfig::load().unwrap_or_default(),
    };

    let registry = load_registry(&cli, &config)?;

    match cli.command {
        Commands::Classify { file } => {
            let expression = read_expression(&file)?;
            let kind = classify(&expression, &NodeContext::root(), &registry);
            let label = match kind {
                NodeKind::Literal => "Literal".to_string(),
                NodeKind::Operator(Some(meta)) => format!("Operator ({})", meta.name),
                NodeKind::Operator(None) => "Operator (unresolved)".to_string(),
                NodeKind::CustomFunction(Some(func)) => {
                    format!("Custom function ({})", func.name)
                }
                NodeKind::CustomFunction(None) => "Custom function (unresolved)".to_string(),
                NodeKind::Fragment(Some(frag)) => format!("Fragment ({})", frag.name),
                NodeKind::Fragment(None) => "Fragment (unresolved)".to_string(),
                NodeKind::ShorthandSimple(target) => {
                    format!("Shorthand, simple value ({})", target.name())
                }
                NodeKind::ShorthandCollection(target) => {
                    format!("Shorthand, collection ({})", target.name())
                }
            };
            println!("{label}");
            if let Some(summary) = summary_label(&expression, &registry) {
                println!("{summary}");
            }
            Ok(())
        }

        Commands::Validate { file } => {
            let expression = read_expression(&file)?;
            let report = validate_expression(&expression, &registry);

            for diagnostic in &report.diagnostics {
                let glyph = match diagnostic.severity {
                    Severity::Error => "❌",
                    Severity::Warning => "⚠️ ",
                };
                let at = if diagnostic.path.is_empty() {
                    "<root>".to_string()
                } else {
                    diagnostic.path.clone()
                };
                println!("{glyph} [{}] {} at {}", diagnostic.code, diagnostic.message, at);
            }

            if report.is_clean() {
                println!("✅ Expression is valid");
                Ok(())
            } else {
                std::process::exit(1);
            }
        }

        Commands::Convert { file, to, output } => {
            let expression = read_expression(&file)?;
            let converted = match to {
                Target::Shorthand => to_shorthand(&expression, &registry)?,
                Target::Canonical => from_shorthand(&expression, &registry)?,
                Target::V2 => to_v2(&expression, &registry)?,
            };
            let rendered = serde_json::to_string_pretty(&converted)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)?;
                    println!("✅ Written to {}", path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }

        Commands::Operators { query } => {
            let operators: Vec<_> = match query {
                Some(q) => registry.search_operators(&q),
                None => registry.operators().iter().collect(),
            };
            for op in operators {
                let aliases = op.aliases.join(", ");
                match &op.description {
                    Some(desc) => println!("{:<20} [{}] - {}", op.name, aliases, desc),
                    None => println!("{:<20} [{}]", op.name, aliases),
                }
            }
            Ok(())
        }
    }
}

fn load_registry(cli: &Cli, config: &EditorConfig) -> anyhow::Result<Registry> {
    let catalog_path = cli
        .registry
        .clone()
        .or_else(|| config.catalog_path());

    let catalog: RegistryData = match &catalog_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading registry catalog {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing registry catalog {}", path.display()))?
        }
        None => RegistryData::default(),
    };

    let mut operators = catalog.operators;
    if config.registry.use_builtins || operators.is_empty() {
        operators.extend(fig_tree_edit::builtins::builtin_operators());
    }

    Ok(Registry::new(operators, catalog.fragments, catalog.functions))
}

fn read_expression(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading expression {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing expression {}", path.display()))
}
