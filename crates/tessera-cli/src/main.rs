//! Tessera CLI - ingestion server, batch submission and consensus primitives.

use clap::{Parser, Subcommand};

mod commands;
mod input;

use commands::{block, canonicalize, hashes, merkle, serve, submit, validate};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera transaction ingestion and consensus primitives CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion server until Ctrl+C
    Serve(serve::ServeArgs),
    /// Encode a JSON array of rows as one batch and submit it
    Submit {
        /// Server address
        #[arg(long, env = "TESSERA_ADDR", default_value = "127.0.0.1:9400")]
        addr: String,
        /// Shared token, if the server requires one
        #[arg(long, env = "TESSERA_AUTH_TOKEN")]
        auth_token: Option<String>,
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Print the Merkle root of a JSON array of events
    MerkleRoot {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Print the hash of a JSON block header
    BlockHash {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Check that every record carries the required fields
    Validate {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Exit with error code if any record is invalid
        #[arg(long)]
        strict: bool,
    },
    /// Print one content hash per item of a JSON array
    Hashes {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Show canonical bytes for input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Submit {
            addr,
            auth_token,
            input,
        } => submit::run(addr, auth_token, input).await,
        Commands::MerkleRoot { input } => merkle::run(input),
        Commands::BlockHash { input } => block::run(input),
        Commands::Validate {
            input,
            json,
            strict,
        } => validate::run(input, json, strict),
        Commands::Hashes { input } => hashes::run(input),
        Commands::Canonicalize { input } => canonicalize::run(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
