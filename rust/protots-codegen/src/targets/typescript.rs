//! TypeScript target.
//!
//! Two kinds of module come out of a schema file:
//!
//! - the service module `<stem><service_suffix>.ts` with the JSON-RPC client
//! - optionally, the message module `<stem><message_suffix>.ts` with the
//!   interfaces, enums and oneof unions the service module imports
//!
//! Every schema file is imported under its namespace token, so references
//! from the service module are always qualified (`acme_user.User`).

pub mod client;
pub mod enums;
pub mod message;
pub mod namespace;
pub mod service_view;
pub mod types;

use protots_schema::{SchemaFile, SchemaGraph};

use crate::code_writer::CodeWriter;
use crate::config::Config;
use crate::error::Result;
use crate::render::file_stem;

use self::client::{ServiceModel, write_header, write_imports, write_service_module};
use self::message::MessageEmitter;
use self::namespace::NamespaceResolver;
use self::service_view::{ImportRef, ServiceView, imports};

const INDENT: usize = 2;

/// Everything generation needs that outlives a single file.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub graph: &'a SchemaGraph,
    pub config: &'a Config,
}

impl<'a> Context<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a Config) -> Self {
        Self { graph, config }
    }

    pub fn service_file_name(&self, file: &SchemaFile) -> String {
        format!("{}{}.ts", file_stem(&file.name), self.config.service_suffix)
    }

    pub fn message_file_name(&self, file: &SchemaFile) -> String {
        format!("{}{}.ts", file_stem(&file.name), self.config.message_suffix)
    }

    fn namespaces(&self) -> NamespaceResolver<'a> {
        NamespaceResolver::new(self.graph, self.config)
    }
}

/// Render the service module for `file`.
///
/// A file without services gets the header and nothing else.
pub fn generate_service_file(ctx: Context<'_>, file: &SchemaFile) -> Result<String> {
    let mut out = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut out, INDENT);
    write_header(&mut w, file.package(), &file.name)?;

    if file.service.is_empty() {
        tracing::debug!(file = %file.name, "no services, header only");
        return Ok(out);
    }

    let imports = imports(&ctx.namespaces(), file)?;
    let services = file
        .service
        .iter()
        .map(|service| {
            let view = ServiceView::new(ctx.graph, file, service);
            let methods = view.methods()?;
            for method in methods.iter().filter(|m| m.is_streaming()) {
                tracing::debug!(
                    method = %method.rpc_method(),
                    client_streaming = method.client_streaming,
                    server_streaming = method.server_streaming,
                    "streaming method has no client stub"
                );
            }
            tracing::debug!(
                file = %file.name,
                service = %view.full_name(),
                methods = methods.len(),
                "rendering service"
            );
            Ok(ServiceModel {
                name: view.name(),
                full_name: view.full_name(),
                methods,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    write_service_module(&mut w, &imports, &services)?;
    Ok(out)
}

/// Render the messages, enums and extensions declared at the top of `file`,
/// without header or imports.
pub fn render_messages(ctx: Context<'_>, file: &SchemaFile) -> Result<String> {
    MessageEmitter::new(ctx.graph, file, ctx.config.keep_case).render_file()
}

/// Render the full message module for `file`: header, one namespace import
/// per dependency, then the message block.
pub fn generate_message_module(ctx: Context<'_>, file: &SchemaFile) -> Result<String> {
    let namespaces = ctx.namespaces();
    namespaces.ensure_distinct(file.dependency.iter().map(String::as_str))?;
    let dependencies: Vec<ImportRef> = file
        .dependency
        .iter()
        .map(|dependency| ImportRef {
            namespace: namespaces.namespace(dependency),
            path: namespaces.import_path(&file.name, dependency),
        })
        .collect();
    let body = render_messages(ctx, file)?;

    let mut out = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut out, INDENT);
    write_header(&mut w, file.package(), &file.name)?;
    if !dependencies.is_empty() {
        write_imports(&mut w, &dependencies)?;
        w.blank_line()?;
    }
    w.write(&body)?;

    tracing::debug!(file = %file.name, imports = dependencies.len(), "rendered message module");
    Ok(out)
}
