//! Command-line front end for the flow analyzer

use anyhow::Result;
use clap::Parser;
use jsflow::analyze_selection;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jsflow")]
#[command(about = "Flow analysis for JavaScript/TypeScript selections", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file to analyze (.js, .jsx, .ts, .tsx)
    file: PathBuf,

    /// Function whose body contains the selection
    #[arg(short, long)]
    function: String,

    /// First selected statement, 0-based (defaults to the body start)
    #[arg(long)]
    from: Option<usize>,

    /// Last selected statement, inclusive (defaults to the body end)
    #[arg(long)]
    to: Option<usize>,

    /// Pretty-print the JSON summary
    #[arg(short, long)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let code = std::fs::read_to_string(&cli.file)?;
    let summary = analyze_selection(&code, &cli.file, &cli.function, cli.from, cli.to)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{json}");
    Ok(())
}
