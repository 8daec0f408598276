//! protoc-gen-protots: TypeScript JSON-RPC clients from a compiled schema
//!
//! Reads a JSON `CodeGeneratorRequest` from stdin (or `--input`) and prints
//! the JSON `CodeGeneratorResponse` on stdout. With `--out-dir` the files
//! are written there instead. Logs go to stderr, filtered by `RUST_LOG`.

use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;

use facet::Facet;
use facet_args as args;
use protots_schema::CodeGeneratorRequest;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Generate TypeScript JSON-RPC clients from a compiled schema
#[derive(Facet)]
struct Cli {
    /// Read the request from this file instead of stdin
    #[facet(args::named, default)]
    input: Option<String>,
    /// Write the generated files under this directory instead of printing the response
    #[facet(args::named, default)]
    out_dir: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli: Cli = args::from_std_args()?;

    let input = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request = CodeGeneratorRequest::from_json(&input)?;
    tracing::debug!(
        files = request.file_to_generate.len(),
        parameter = request.parameter.as_deref().unwrap_or_default(),
        "read request"
    );

    let Some(out_dir) = cli.out_dir else {
        let response = protots_codegen::generate_response(&request);
        let json = facet_json::to_string(&response);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(ExitCode::SUCCESS);
    };

    let files = match protots_codegen::generate(&request) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    for file in files {
        let path = Path::new(&out_dir).join(&file.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, file.content)?;
        tracing::info!(path = %path.display(), "wrote");
    }
    Ok(ExitCode::SUCCESS)
}
