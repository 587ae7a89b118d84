//! `coolc` — runs the COOL semantic analysis core over a JSON-encoded
//! AST and reports what it finds.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cool_driver::render::render_diagnostics;

/// Semantic analysis for COOL programs, read as a JSON-encoded AST.
#[derive(Parser, Debug)]
#[command(name = "coolc", version, about)]
struct Cli {
    /// Path to a JSON-encoded COOL AST.
    ast: PathBuf,

    /// Original source file, used only to render line:column positions
    /// on diagnostics. Without it, diagnostics show raw byte offsets.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Print the raw parsed tree and exit without analyzing.
    #[arg(long = "print-ast")]
    print_ast: bool,

    /// Print the tree with every type resolved after analysis.
    #[arg(long = "print-resolved")]
    print_resolved: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cool_checker=info,warn".to_string()))
        .init();

    let cli = Cli::parse();

    if cli.print_ast {
        let program = cool_driver::load_program(&cli.ast)?;
        println!("{}", cool_printer::print_ast(&program));
        return Ok(());
    }

    let (program, result) = cool_driver::analyze_file(&cli.ast)?;

    let source = cli.source.map(std::fs::read_to_string).transpose()?;
    print!("{}", render_diagnostics(&result.errors, source.as_deref()));

    if cli.print_resolved {
        println!("{}", cool_printer::print_resolved(&program, &result.context, &result.scopes));
    }

    if !result.errors.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
