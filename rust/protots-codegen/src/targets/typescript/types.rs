//! Field type → TypeScript type expression.
//!
//! This is the single place that decides how a schema type looks in
//! generated code:
//!
//! - scalars go through a fixed table, with the field's `jstype` override
//!   consulted first for integer types
//! - `bytes` is always `Uint8Array | string` (raw buffer or base64 text)
//! - enum and message references become dotted paths, prefixed with the
//!   defining file's namespace when they cross a module boundary
//! - references to synthetic map-entry messages become `Record<K, V>`
//! - `repeated` wraps in `T[]`, except maps which are never wrapped twice

use protots_schema::{
    FieldDef, FieldType, JsType, Label, SchemaFile, SchemaGraph, Syntax, TypeEntry, TypeKind,
};

use super::namespace::namespace_token;
use crate::error::{CodegenError, Result};

const BYTES: &str = "Uint8Array | string";

/// Which module the resolved expression will be written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The file's own message module: same-file types are in scope unqualified.
    Local,
    /// A module that reaches every schema file, its own included, through a
    /// namespace import (the service module).
    Imported,
}

/// A field's type expression and whether the member may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub expr: String,
    pub optional: bool,
}

struct Element {
    expr: String,
    is_map: bool,
    is_union: bool,
}

impl Element {
    fn plain(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            is_map: false,
            is_union: false,
        }
    }
}

#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> TypeResolver<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }

    /// Resolve a field declared in `file`.
    pub fn field(&self, field: &FieldDef, file: &SchemaFile, scope: Scope) -> Result<ResolvedType> {
        let field_type = field.field_type()?;
        let label = field.label()?;
        let element = self.element(field, field_type, file, scope)?;

        if label == Label::Repeated || element.is_map {
            let expr = if element.is_map {
                element.expr
            } else if element.is_union {
                format!("({})[]", element.expr)
            } else {
                format!("{}[]", element.expr)
            };
            return Ok(ResolvedType {
                expr,
                optional: false,
            });
        }

        let legacy = file.syntax()? == Syntax::Proto2;
        let optional = if field_type == FieldType::Message {
            !(legacy && label == Label::Required)
        } else {
            (legacy && label != Label::Required) || field.is_proto3_optional()
        };

        Ok(ResolvedType {
            expr: element.expr,
            optional,
        })
    }

    /// Resolve a named message or enum referenced from `from` on behalf of
    /// `context` (a field or method name).
    ///
    /// The type must be declared in `from` itself or in one of its direct
    /// dependencies; nothing else gets imported into the generated module.
    pub fn reference(
        &self,
        type_name: &str,
        from: &SchemaFile,
        scope: Scope,
        context: &str,
    ) -> Result<(String, &'a TypeEntry)> {
        let entry = self.lookup(type_name, &from.name)?;
        let same_file = entry.file == from.name;
        if !same_file && !from.dependency.contains(&entry.file) {
            return Err(CodegenError::UnimportedType {
                context: context.to_string(),
                file: from.name.clone(),
                type_name: type_name.to_string(),
                defined_in: entry.file.clone(),
            });
        }

        let local = entry.local_name();
        let expr = if scope == Scope::Local && same_file {
            local
        } else {
            format!("{}.{local}", namespace_token(&entry.file))
        };
        Ok((expr, entry))
    }

    /// Resolve a message used as a whole payload (RPC request or response).
    pub fn message(
        &self,
        type_name: &str,
        from: &SchemaFile,
        scope: Scope,
        context: &str,
    ) -> Result<(String, &'a TypeEntry)> {
        let (expr, entry) = self.reference(type_name, from, scope, context)?;
        let actual = match (entry.kind, entry.is_map_entry()) {
            (TypeKind::Message, false) => return Ok((expr, entry)),
            (TypeKind::Message, true) => "map entry",
            (TypeKind::Enum, _) => "enum",
        };
        Err(CodegenError::KindMismatch {
            type_name: type_name.to_string(),
            context: context.to_string(),
            expected: "message",
            actual,
        })
    }

    fn lookup(&self, type_name: &str, from_file: &str) -> Result<&'a TypeEntry> {
        self.graph
            .lookup(type_name)
            .ok_or_else(|| CodegenError::MissingExport {
                type_name: type_name.to_string(),
                file: from_file.to_string(),
            })
    }

    fn element(
        &self,
        field: &FieldDef,
        field_type: FieldType,
        from: &SchemaFile,
        scope: Scope,
    ) -> Result<Element> {
        let js_type = field.js_type()?;
        if js_type != JsType::Normal && !field_type.is_integer() {
            return Err(CodegenError::UnsupportedOverride {
                field: field.name.clone(),
                file: from.name.clone(),
                js_type,
                field_type,
            });
        }

        match field_type {
            FieldType::Message | FieldType::Enum => {
                let type_name = field.type_name.as_deref().unwrap_or_default();
                let (expr, entry) = self.reference(type_name, from, scope, &field.name)?;
                let expected = if field_type == FieldType::Enum {
                    TypeKind::Enum
                } else {
                    TypeKind::Message
                };
                if entry.kind != expected {
                    return Err(CodegenError::KindMismatch {
                        type_name: type_name.to_string(),
                        context: field.name.clone(),
                        expected: kind_name(expected),
                        actual: kind_name(entry.kind),
                    });
                }
                match &entry.map_entry {
                    Some(_) => self.map(type_name, entry, from, scope),
                    None => Ok(Element::plain(expr)),
                }
            }
            FieldType::Bytes => Ok(Element {
                expr: BYTES.to_string(),
                is_map: false,
                is_union: true,
            }),
            other => scalar_type(other, js_type)
                .map(Element::plain)
                .ok_or_else(|| CodegenError::UnsupportedFieldType {
                    field: field.name.clone(),
                    file: from.name.clone(),
                    field_type: other,
                }),
        }
    }

    fn map(
        &self,
        type_name: &str,
        entry: &TypeEntry,
        from: &SchemaFile,
        scope: Scope,
    ) -> Result<Element> {
        let malformed = |missing| CodegenError::MalformedMapEntry {
            type_name: type_name.to_string(),
            missing,
        };
        let map = entry.map_entry.as_ref().ok_or_else(|| malformed("key"))?;
        let key_field = map.key.as_ref().ok_or_else(|| malformed("key"))?;
        let value_field = map.value.as_ref().ok_or_else(|| malformed("value"))?;

        let key_type = key_field.field_type()?;
        let key = match key_type {
            FieldType::Bool => Some("\"true\" | \"false\""),
            FieldType::String => Some("string"),
            t if t.is_integer() => scalar_type(t, key_field.js_type()?),
            _ => None,
        }
        .ok_or_else(|| CodegenError::UnsupportedFieldType {
            field: format!("{type_name}.{}", key_field.name),
            file: entry.file.clone(),
            field_type: key_type,
        })?;

        // The entry lives in the same file as the map field, so the value's
        // own references resolve relative to that file as well.
        let value = self.element(value_field, value_field.field_type()?, from, scope)?;
        if value.is_map {
            return Err(CodegenError::MalformedMapEntry {
                type_name: type_name.to_string(),
                missing: "non-map value",
            });
        }

        Ok(Element {
            expr: format!("Record<{key}, {}>", value.expr),
            is_map: true,
            is_union: false,
        })
    }
}

/// The primitive table. `None` for anything that is not a plain scalar.
fn scalar_type(field_type: FieldType, js_type: JsType) -> Option<&'static str> {
    let ts = match field_type {
        FieldType::Bool => "boolean",
        FieldType::String => "string",
        FieldType::Double | FieldType::Float => "number",
        t if t.is_integer() => match js_type {
            JsType::Number => "number",
            JsType::String => "string",
            JsType::Normal if t.is_64_bit() => "string",
            JsType::Normal => "number",
        },
        _ => return None,
    };
    Some(ts)
}

fn kind_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Message => "message",
        TypeKind::Enum => "enum",
    }
}
