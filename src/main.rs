use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use defjump::config::{load_config, DefjumpConfig};
use defjump::resolution::DefinitionResolver;
use defjump::types::parse_query;
use defjump::vfs::Overlay;

/// Jump to the definition of the identifier at a byte offset in a Go
/// source file.
///
/// Examples:
///   defjump ./main.go:#1042            # point query
///   defjump ./main.go:#1042,#1047      # range query
///   defjump -m ./main.go:#1042 < buf   # query against unsaved content
#[derive(Parser)]
#[command(name = "defjump", about = "Jump to definition for Go source", long_about = None)]
struct Cli {
    /// Query position: <path>:#<offset> or <path>:#<start>,#<end>
    position: String,

    /// Read the queried file's modified content from standard input
    #[arg(short, long)]
    modified: bool,

    /// Output the result as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (JSON); defaults derive from GOPATH/GOROOT
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> defjump::errors::Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DefjumpConfig::from_env(),
    };

    let qpos = parse_query(&cli.position)?;
    let mut overlay = Overlay::new();
    if cli.modified {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        overlay.insert(qpos.path.clone(), buf);
    }

    let resolver = DefinitionResolver::new(config);
    let definition = resolver.define(&cli.position, &overlay)?;

    if cli.json {
        let out = serde_json::json!({
            "path": definition.position.path,
            "offset": definition.position.offset,
            "line": definition.position.line,
            "column": definition.position.column,
            "label": definition.label,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_default()
        );
    } else {
        println!("{}", definition.position);
        println!("{}", definition.label);
    }
    Ok(())
}
