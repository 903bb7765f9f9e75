use std::path::PathBuf;
use std::{fmt, fs, io};

use bsonkit::{dump, to_relaxed_json, DecodeError, Decoder, DecoderOptions, DEFAULT_MAX_DEPTH};
use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bson-inspect", about = "Dump the BSON documents stored in a file")]
struct Cli {
    /// File holding one or more concatenated documents.
    path: PathBuf,
    /// Print each document as relaxed extended JSON.
    #[arg(long)]
    json: bool,
    /// Maximum document nesting accepted by the decoder.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Reject arrays whose keys are not "0", "1", ... in order.
    #[arg(long)]
    strict_array_keys: bool,
}

#[derive(Debug, Error)]
enum InspectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document #{index} at byte {offset}: {source}")]
    Decode {
        index: usize,
        offset: usize,
        #[source]
        source: DecodeError,
    },
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to format document: {0}")]
    Fmt(#[from] fmt::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), InspectError> {
    let data = fs::read(&cli.path).map_err(|source| InspectError::Io {
        path: cli.path.clone(),
        source,
    })?;
    info!(path = %cli.path.display(), len = data.len(), "read input");

    let decoder = Decoder::with_options(DecoderOptions {
        max_depth: cli.max_depth,
        strict_array_keys: cli.strict_array_keys,
    });
    let mut stream = decoder.stream(&data);
    let mut index = 0;
    loop {
        let offset = stream.offset();
        let Some(item) = stream.next() else { break };
        index += 1;
        let doc = item.map_err(|source| InspectError::Decode {
            index,
            offset,
            source,
        })?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&to_relaxed_json(&doc))?);
        } else {
            let mut out = String::new();
            dump(&doc, 1, &mut out)?;
            println!("Document #{index}:");
            print!("{out}");
        }
    }
    info!(documents = index, "done");
    Ok(())
}
