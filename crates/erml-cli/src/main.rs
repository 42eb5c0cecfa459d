//! erml CLI - Compile ER notation into Graphviz DOT

mod cli;

use clap::Parser;
use erml::core::logging::init_logging;

fn main() {
    let cli_args = cli::Cli::parse();

    let (log_level, log_format) = cli_args.log_settings();
    if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let app = cli::ErmlApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
