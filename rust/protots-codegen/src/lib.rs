#![deny(unsafe_code)]

//! TypeScript declarations and JSON-RPC clients from compiled protobuf schemas.
//!
//! # The Pipeline
//!
//! ```text
//! .proto files  →  protoc  →  CodeGeneratorRequest (JSON)  →  protots-codegen  →  *_service.ts
//! ```
//!
//! The request carries every schema file the compiler saw, dependencies
//! included; only the files listed in `file_to_generate` produce output. All
//! of them are indexed into one [`SchemaGraph`] first, so a field in one file
//! can name a message declared in another.
//!
//! # Usage
//!
//! ```ignore
//! let request = CodeGeneratorRequest::from_json(&input)?;
//! let files = protots_codegen::generate(&request)?;
//! for file in files {
//!     std::fs::write(out_dir.join(&file.name), file.content)?;
//! }
//! ```
//!
//! Generation is all or nothing: the first inconsistency in the schema
//! aborts the run and no file is returned. The `protoc-gen-protots` binary
//! turns that into the `error` field of the response.

pub mod code_writer;
pub mod config;
pub mod error;
mod render;
pub mod targets;

use protots_schema::{CodeGeneratorRequest, CodeGeneratorResponse, GeneratedFile, SchemaGraph};

pub use config::Config;
pub use error::{CodegenError, Result};
use targets::typescript::{self, Context};

/// Generate every output file for the request.
pub fn generate(request: &CodeGeneratorRequest) -> Result<Vec<GeneratedFile>> {
    let config = Config::from_parameter(request.parameter.as_deref())?;
    let graph = SchemaGraph::build(&request.proto_file);
    let ctx = Context::new(&graph, &config);
    tracing::debug!(
        files = request.file_to_generate.len(),
        types = graph.len(),
        "indexed schema"
    );

    let mut generated = Vec::new();
    for name in &request.file_to_generate {
        let file = request
            .file(name)
            .ok_or_else(|| CodegenError::UnknownFile { file: name.clone() })?;

        if config.emit_messages {
            generated.push(GeneratedFile {
                name: ctx.message_file_name(file),
                content: typescript::generate_message_module(ctx, file)?,
            });
        }
        generated.push(GeneratedFile {
            name: ctx.service_file_name(file),
            content: typescript::generate_service_file(ctx, file)?,
        });
    }
    Ok(generated)
}

/// Like [`generate`], with failures reported in the response instead.
pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match generate(request) {
        Ok(file) => CodeGeneratorResponse { error: None, file },
        Err(err) => CodeGeneratorResponse {
            error: Some(err.to_string()),
            file: Vec::new(),
        },
    }
}

/// Message declarations of one file, as raw text.
pub fn render_messages(request: &CodeGeneratorRequest, file_name: &str) -> Result<String> {
    let config = Config::from_parameter(request.parameter.as_deref())?;
    let graph = SchemaGraph::build(&request.proto_file);
    let file = request
        .file(file_name)
        .ok_or_else(|| CodegenError::UnknownFile {
            file: file_name.to_string(),
        })?;
    typescript::render_messages(Context::new(&graph, &config), file)
}
