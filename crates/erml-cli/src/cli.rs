//! Command-line interface for the erml compiler
//!
//! Reads ER notation from a file or stdin and writes DOT, a validation
//! verdict, or the compiled model as JSON.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;

use erml::plugins::Orchestrator;
use erml::RenderConfig;

/// erml - Compile ER notation into Graphviz DOT
#[derive(Parser)]
#[command(name = "erml")]
#[command(about = "Compile a compact entity-relationship notation into Graphviz DOT")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Log level and format to install, read from the environment first
    /// and the flags second
    pub fn log_settings(&self) -> (String, String) {
        self.log_settings_from(|key| std::env::var(key).ok())
    }

    fn log_settings_from(&self, env: impl Fn(&str) -> Option<String>) -> (String, String) {
        let level = env("ERML_LOG_LEVEL")
            .or_else(|| env("RUST_LOG"))
            .unwrap_or_else(|| self.log_level.as_str().to_string());
        let format = env("ERML_LOG_FORMAT")
            .unwrap_or_else(|| self.log_format.as_str().to_string());
        (level, format)
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile ER notation to Graphviz DOT
    Convert {
        /// Input file containing ER notation (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the DOT graph (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum node separation hint
        #[arg(long)]
        nodesep: Option<f64>,

        /// Allow overlapping nodes
        #[arg(long)]
        overlap: bool,

        /// Draw straight edges instead of splines
        #[arg(long)]
        no_splines: bool,
    },

    /// Check ER notation without rendering
    Validate {
        /// Input file to validate (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the compiled model as JSON
    Inspect {
        /// Input file to compile (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
}

/// Main CLI application
pub struct ErmlApp {
    orchestrator: Orchestrator,
}

impl ErmlApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    /// Create a new application instance with a render config
    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            orchestrator: Orchestrator::with_config(config),
        }
    }

    fn build_config(nodesep: Option<f64>, overlap: bool, no_splines: bool) -> RenderConfig {
        let mut config = RenderConfig::default()
            .with_overlap(overlap)
            .with_splines(!no_splines);
        if let Some(nodesep) = nodesep {
            config = config.with_nodesep(nodesep);
        }
        config
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        if cli.verbose {
            eprintln!("erml v{}", env!("CARGO_PKG_VERSION"));
        }
        debug!(verbose = cli.verbose, "Dispatching command");

        match cli.command {
            Commands::Convert {
                input,
                output,
                nodesep,
                overlap,
                no_splines,
            } => {
                let config = Self::build_config(nodesep, overlap, no_splines);
                self.convert_command(input, output, config, cli.verbose)
            }
            Commands::Validate { input } => self.validate_command(input, cli.verbose),
            Commands::Inspect { input, compact } => {
                self.inspect_command(input, compact, cli.verbose)
            }
        }
    }

    /// Handle the convert command
    fn convert_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        config: RenderConfig,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let dot = if config == *self.orchestrator.render_config() {
            self.orchestrator.process(&content)?
        } else {
            Orchestrator::with_config(config).process(&content)?
        };

        if verbose {
            eprintln!("Successfully compiled ER model to DOT");
        }

        self.write_output(output, &dot)
    }

    /// Handle the validate command
    fn validate_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        match erml::parse(&content) {
            Ok(database) => {
                println!(
                    "✓ Valid ER model ({} entities, {} relationships)",
                    database.entity_count(),
                    database.relationship_count()
                );
                Ok(())
            }
            Err(e) => {
                println!("✗ Invalid ER model: {}", e);
                Err(e)
            }
        }
    }

    /// Handle the inspect command
    fn inspect_command(&self, input: Option<PathBuf>, compact: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let database = erml::parse(&content)?;
        let json = if compact {
            serde_json::to_string(&database)?
        } else {
            serde_json::to_string_pretty(&database)?
        };
        self.write_output(None, &json)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", content)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for ErmlApp {
    fn default() -> Self {
        Self::new()
    }
}
