//! Message declarations.
//!
//! A message becomes an `export interface` (or an intersection type when it
//! has oneof groups) followed by an `export namespace` of the same name that
//! holds everything nested in it:
//!
//! ```text
//! export type User = {
//!   id: string;
//!   address?: User.Address;
//! } & User.ContactOneof;
//! export namespace User {
//!   export interface Address { ... }
//!
//!   export type ContactOneof =
//!     | { email: string; phone?: never }
//!     | { phone: string; email?: never }
//!     | { email?: never; phone?: never };
//! }
//! ```
//!
//! Synthetic map-entry messages produce no output; fields pointing at them
//! are rendered as `Record<K, V>` by the type resolver.

use std::fmt;

use protots_schema::{EnumDef, FieldDef, MessageDef, OneofGroup, SchemaFile, SchemaGraph};

use super::enums::write_enum;
use super::types::{Scope, TypeResolver};
use crate::code_writer::CodeWriter;
use crate::{cw_write, cw_writeln};
use crate::error::{CodegenError, Result};
use crate::render::{member_name, property_key, type_ident};

/// Something declared inside a message's namespace.
enum Nested<'m> {
    Message(&'m MessageDef),
    Enum(&'m EnumDef),
    Oneof(&'m OneofGroup, Vec<&'m FieldDef>),
    Extension(&'m FieldDef),
}

pub struct MessageEmitter<'a> {
    resolver: TypeResolver<'a>,
    file: &'a SchemaFile,
    keep_case: bool,
}

impl<'a> MessageEmitter<'a> {
    pub fn new(graph: &'a SchemaGraph, file: &'a SchemaFile, keep_case: bool) -> Self {
        Self {
            resolver: TypeResolver::new(graph),
            file,
            keep_case,
        }
    }

    /// Render one message and everything nested in it.
    pub fn render(&self, message: &MessageDef) -> Result<String> {
        let mut out = String::new();
        let mut w = CodeWriter::with_indent_spaces(&mut out, 2);
        self.write_message(&mut w, message, &[])?;
        Ok(out)
    }

    /// Top-level messages, enums and extensions of the file, blank-line separated.
    pub fn render_file(&self) -> Result<String> {
        let mut out = String::new();
        let mut w = CodeWriter::with_indent_spaces(&mut out, 2);
        let mut first = true;

        for message in self.file.message_type.iter().filter(|m| !m.is_map_entry()) {
            if !std::mem::take(&mut first) {
                w.blank_line()?;
            }
            self.write_message(&mut w, message, &[])?;
        }
        for en in &self.file.enum_type {
            if !std::mem::take(&mut first) {
                w.blank_line()?;
            }
            write_enum(&mut w, en)?;
        }
        for extension in &self.file.extension {
            if !std::mem::take(&mut first) {
                w.blank_line()?;
            }
            self.write_extension(&mut w, extension, &[])?;
        }

        Ok(out)
    }

    pub fn write_message<W: fmt::Write>(
        &self,
        w: &mut CodeWriter<W>,
        message: &MessageDef,
        parents: &[&str],
    ) -> Result<()> {
        if message.is_map_entry() {
            return Ok(());
        }

        let name = message.name.as_str();
        let (plain, unions) = partition(message)?;

        if unions.is_empty() {
            cw_writeln!(w, "export interface {name} {{")?;
            self.write_members(w, &plain)?;
            w.writeln("}")?;
        } else {
            cw_writeln!(w, "export type {name} = {{")?;
            self.write_members(w, &plain)?;
            w.write("} & ")?;
            w.write_separated(&unions, " & ", |w, (group, _)| {
                cw_write!(w, "{name}.{}", oneof_type_name(group))
            })?;
            w.writeln(";")?;
        }

        let nested: Vec<Nested<'_>> = message
            .nested_type
            .iter()
            .filter(|m| !m.is_map_entry())
            .map(Nested::Message)
            .chain(message.enum_type.iter().map(Nested::Enum))
            .chain(unions.into_iter().map(|(g, f)| Nested::Oneof(g, f)))
            .chain(message.extension.iter().map(Nested::Extension))
            .collect();
        if nested.is_empty() {
            return Ok(());
        }

        let mut path = parents.to_vec();
        path.push(name);

        cw_writeln!(w, "export namespace {name} {{")?;
        {
            let _indent = w.indent();
            for (i, item) in nested.iter().enumerate() {
                if i > 0 {
                    w.blank_line()?;
                }
                match item {
                    Nested::Message(m) => self.write_message(w, m, &path)?,
                    Nested::Enum(en) => write_enum(w, en)?,
                    Nested::Oneof(group, fields) => self.write_oneof(w, group, fields)?,
                    Nested::Extension(ext) => self.write_extension(w, ext, &path)?,
                }
            }
        }
        w.writeln("}")?;
        Ok(())
    }

    fn write_members<W: fmt::Write>(
        &self,
        w: &mut CodeWriter<W>,
        fields: &[&FieldDef],
    ) -> Result<()> {
        let _indent = w.indent();
        for field in fields {
            let resolved = self.resolver.field(field, self.file, Scope::Local)?;
            let marker = if resolved.optional { "?" } else { "" };
            cw_writeln!(w, "{}{marker}: {};", self.key(field), resolved.expr)?;
        }
        Ok(())
    }

    /// One alternative per member, with that member set and the others
    /// absent, plus the alternative where none is set.
    fn write_oneof<W: fmt::Write>(
        &self,
        w: &mut CodeWriter<W>,
        group: &OneofGroup,
        fields: &[&FieldDef],
    ) -> Result<()> {
        let members = fields
            .iter()
            .map(|f| {
                let resolved = self.resolver.field(f, self.file, Scope::Local)?;
                Ok((self.key(f), resolved.expr))
            })
            .collect::<Result<Vec<_>>>()?;

        cw_writeln!(w, "export type {} =", oneof_type_name(group))?;
        let _indent = w.indent();
        for (i, (key, expr)) in members.iter().enumerate() {
            let mut parts = vec![format!("{key}: {expr}")];
            parts.extend(
                members
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, (other, _))| format!("{other}?: never")),
            );
            cw_writeln!(w, "| {{ {} }}", parts.join("; "))?;
        }
        let none = members
            .iter()
            .map(|(key, _)| format!("{key}?: never"))
            .collect::<Vec<_>>()
            .join("; ");
        cw_writeln!(w, "| {{ {none} }};")?;
        Ok(())
    }

    /// `export type <Name>Extension = { "[pkg.Scope.name]"?: T };`
    fn write_extension<W: fmt::Write>(
        &self,
        w: &mut CodeWriter<W>,
        extension: &FieldDef,
        parents: &[&str],
    ) -> Result<()> {
        let resolved = self.resolver.field(extension, self.file, Scope::Local)?;
        let full_name = self
            .file
            .package
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .chain(parents.iter().copied())
            .chain(std::iter::once(extension.name.as_str()))
            .collect::<Vec<_>>()
            .join(".");
        cw_writeln!(
            w,
            "export type {}Extension = {{ \"[{full_name}]\"?: {} }};",
            type_ident(&extension.name),
            resolved.expr
        )?;
        Ok(())
    }

    fn key(&self, field: &FieldDef) -> String {
        property_key(&member_name(field, self.keep_case))
    }
}

fn oneof_type_name(group: &OneofGroup) -> String {
    format!("{}Oneof", type_ident(&group.name))
}

type Unions<'m> = Vec<(&'m OneofGroup, Vec<&'m FieldDef>)>;

/// Split fields into plain members and real oneof groups, both in declared
/// order. Groups left empty (synthetic proto3 `optional` oneofs) are dropped.
fn partition(message: &MessageDef) -> Result<(Vec<&FieldDef>, Unions<'_>)> {
    let mut plain = Vec::new();
    let mut groups: Vec<Vec<&FieldDef>> = vec![Vec::new(); message.oneof_decl.len()];

    for field in &message.field {
        match field.real_oneof_index() {
            None => plain.push(field),
            Some(index) => groups
                .get_mut(index)
                .ok_or_else(|| CodegenError::InvalidOneofIndex {
                    message: message.name.clone(),
                    field: field.name.clone(),
                    index,
                })?
                .push(field),
        }
    }

    let unions = message
        .oneof_decl
        .iter()
        .zip(groups)
        .filter(|(_, fields)| !fields.is_empty())
        .collect();
    Ok((plain, unions))
}
