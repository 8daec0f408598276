//! Cross-file type index.

use std::collections::BTreeMap;

use crate::{EnumDef, FieldDef, MessageDef, SchemaFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// Key and value fields recorded for a synthetic map-entry message.
///
/// Either side may be missing in a malformed input; the resolver reports that.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub key: Option<FieldDef>,
    pub value: Option<FieldDef>,
}

/// Where a fully-qualified type is defined.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    /// Name of the defining file.
    pub file: String,
    pub package: String,
    /// Enclosing message names followed by the type's own name.
    pub path: Vec<String>,
    pub kind: TypeKind,
    /// Present only for messages flagged `map_entry`.
    pub map_entry: Option<MapEntry>,
}

impl TypeEntry {
    /// The dotted path of the type inside its file, e.g. `User.Address`.
    pub fn local_name(&self) -> String {
        self.path.join(".")
    }

    pub fn is_map_entry(&self) -> bool {
        self.map_entry.is_some()
    }
}

/// Immutable index of every message and enum in a request, keyed by
/// fully-qualified name with a leading dot (`.acme.v1.User.Address`).
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    types: BTreeMap<String, TypeEntry>,
}

impl SchemaGraph {
    pub fn build(files: &[SchemaFile]) -> Self {
        let mut graph = Self::default();
        for file in files {
            let package = file.package();
            for message in &file.message_type {
                graph.index_message(file, package, &[], message);
            }
            for en in &file.enum_type {
                graph.index_enum(file, package, &[], en);
            }
        }
        graph
    }

    fn index_message(
        &mut self,
        file: &SchemaFile,
        package: &str,
        parents: &[String],
        message: &MessageDef,
    ) {
        let mut path = parents.to_vec();
        path.push(message.name.clone());

        let map_entry = message.is_map_entry().then(|| MapEntry {
            key: message.field.iter().find(|f| f.number == 1).cloned(),
            value: message.field.iter().find(|f| f.number == 2).cloned(),
        });

        for nested in &message.nested_type {
            self.index_message(file, package, &path, nested);
        }
        for en in &message.enum_type {
            self.index_enum(file, package, &path, en);
        }

        self.types.insert(
            qualify(package, &path),
            TypeEntry {
                file: file.name.clone(),
                package: package.to_string(),
                path,
                kind: TypeKind::Message,
                map_entry,
            },
        );
    }

    fn index_enum(&mut self, file: &SchemaFile, package: &str, parents: &[String], en: &EnumDef) {
        let mut path = parents.to_vec();
        path.push(en.name.clone());
        self.types.insert(
            qualify(package, &path),
            TypeEntry {
                file: file.name.clone(),
                package: package.to_string(),
                path,
                kind: TypeKind::Enum,
                map_entry: None,
            },
        );
    }

    /// Look up a type by fully-qualified name. The leading dot is optional.
    pub fn lookup(&self, name: &str) -> Option<&TypeEntry> {
        if name.starts_with('.') {
            self.types.get(name)
        } else {
            self.types.get(&format!(".{name}"))
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn qualify(package: &str, path: &[String]) -> String {
    if package.is_empty() {
        format!(".{}", path.join("."))
    } else {
        format!(".{package}.{}", path.join("."))
    }
}
