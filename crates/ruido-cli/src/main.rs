//! ruido command line interface

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use ruido_error::{Diagnostics, SourceCache};
use ruido_fuzz::{fuzz_module, FuzzConfig};
use ruido_ir::{validate_module, Module};
use ruido_lexer::{Lexer, TokenKind};

use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "ruido")]
#[command(author = "Guilherme Mendes")]
#[command(version = "0.1.0")]
#[command(about = "Type-directed fuzzer for expression-tree IR modules", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mutates every function of a module and prints the result
    Fuzz {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// JSON file with a fuzz configuration; flags override its fields
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Seed of the decision source (default: 42)
        #[arg(long)]
        seed: Option<u64>,

        /// Synthesized nodes allowed per function
        #[arg(long)]
        budget: Option<u32>,

        /// Percent chance that a node is replaced
        #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u32).range(0..=100))]
        chance: Option<u32>,

        /// Percent chance that a synthesis attempt yields `unreachable`
        #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u32).range(0..=100))]
        unreachable_chance: Option<u32>,

        /// Longest synthesized block
        #[arg(long, value_name = "LEN", value_parser = clap::value_parser!(u32).range(1..))]
        max_block_len: Option<u32>,

        /// Print run statistics as JSON on stderr
        #[arg(long)]
        stats: bool,
    },

    /// Checks a module for errors
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parses a module and prints it back
    Print {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows file tokens (debug)
    Lex {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Fuzz {
            input,
            output,
            config,
            seed,
            budget,
            chance,
            unreachable_chance,
            max_block_len,
            stats,
        } => {
            let base = match &config {
                Some(path) => load_config(path)?,
                None => FuzzConfig::default(),
            };
            let config = base
                .with_seed(seed.unwrap_or(base.seed))
                .with_budget(budget.unwrap_or(base.budget))
                .with_replace_chance(chance.unwrap_or(base.replace_chance))
                .with_unreachable_chance(unreachable_chance.unwrap_or(base.unreachable_chance))
                .with_max_block_len(max_block_len.unwrap_or(base.max_block_len));
            tracing::debug!(?config, "fuzz configuration");
            let seed = config.seed;

            let (mut module, cache) = load(&input)?;
            let run_stats = fuzz_module(&mut module, &config);

            // A failure here is a bug in the pass, not in the input
            let diagnostics = validate_module(&module);
            if diagnostics.has_errors() {
                tracing::error!(seed, "fuzzed module failed validation");
                return Err(rendered(&diagnostics, &cache));
            }

            match output {
                Some(path) => fs::write(&path, module.to_string()).map_err(|source| CliError::Io { path, source })?,
                None => print!("{}", module),
            }
            if stats {
                eprintln!("{}", serde_json::to_string_pretty(&run_stats)?);
            }
        }

        Commands::Check { input } => {
            println!("Checking: {}\n", input.display());
            let (module, _) = load(&input)?;
            println!(
                "  [ok] {} function(s), {} import(s), {} table entries",
                module.functions.len(),
                module.imports.len(),
                module.table.as_ref().map_or(0, |t| t.len())
            );
            println!("\nNo errors found!");
        }

        Commands::Print { input } => {
            let (module, _) = load(&input)?;
            print!("{}", module);
        }

        Commands::Lex { input } => {
            let (source, cache, file_id) = read(&input)?;
            let mut lexer = Lexer::new(&source, file_id);
            let tokens = lexer.tokenize();
            let diagnostics = lexer.take_diagnostics();

            for token in &tokens {
                let kind_str = format!("{:?}", token.kind);
                let display = match &token.kind {
                    TokenKind::Eof => "EOF".to_string(),
                    _ => format!("{}", token.kind),
                };
                println!(
                    "  {:4}:{:<3}  {:<20}  {}",
                    token.span.start.line,
                    token.span.start.column,
                    kind_str.chars().take(20).collect::<String>(),
                    display
                );
            }
            println!("\nTotal: {} tokens", tokens.len());

            if diagnostics.has_errors() {
                return Err(rendered(&diagnostics, &cache));
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<(String, SourceCache, u32)> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cache = SourceCache::new();
    let file_id = cache.add(path.display().to_string(), &source);
    Ok((source, cache, file_id))
}

/// Reads a JSON fuzz configuration; missing fields keep their defaults
fn load_config(path: &Path) -> Result<FuzzConfig> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads, parses and validates a module
fn load(path: &Path) -> Result<(Module, SourceCache)> {
    let (source, cache, file_id) = read(path)?;

    let (module, diagnostics) = ruido_parser::parse_source(&source, file_id);
    if diagnostics.has_errors() {
        return Err(rendered(&diagnostics, &cache));
    }

    let diagnostics = validate_module(&module);
    if diagnostics.has_errors() {
        return Err(rendered(&diagnostics, &cache));
    }
    tracing::info!(path = %path.display(), functions = module.functions.len(), "module loaded");
    Ok((module, cache))
}

fn rendered(diagnostics: &Diagnostics, cache: &SourceCache) -> CliError {
    CliError::Diagnostics {
        rendered: diagnostics.render(cache),
        count: diagnostics.error_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fuzz_flags() {
        let cli = Cli::try_parse_from([
            "ruido", "fuzz", "in.wast", "--config", "fuzz.json", "--max-block-len", "2", "--chance", "30",
        ])
        .unwrap();
        let Commands::Fuzz { config, seed, max_block_len, chance, .. } = cli.command else {
            panic!("expected the fuzz command");
        };
        assert_eq!(config, Some(PathBuf::from("fuzz.json")));
        assert_eq!(seed, None);
        assert_eq!(max_block_len, Some(2));
        assert_eq!(chance, Some(30));

        assert!(Cli::try_parse_from(["ruido", "fuzz", "in.wast", "--max-block-len", "0"]).is_err());
        assert!(Cli::try_parse_from(["ruido", "fuzz", "in.wast", "--chance", "101"]).is_err());
    }

    #[test]
    fn test_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fuzz.json");
        fs::write(&path, r#"{"seed": 7, "max_block_len": 2}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config, FuzzConfig::default().with_seed(7).with_max_block_len(2));
    }

    #[test]
    fn test_load_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ seed: ").unwrap();
        assert!(matches!(load_config(&path), Err(CliError::Config { .. })));
        assert!(matches!(load_config(&dir.path().join("missing.json")), Err(CliError::Io { .. })));
    }
}
