//! Pseudo-namespaces and import paths.
//!
//! Every schema file becomes a TypeScript module imported as
//! `import * as <token> from "<path>"`; the token doubles as the prefix of
//! every cross-file type reference.

use std::collections::BTreeMap;

use protots_schema::{SchemaFile, SchemaGraph};

use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::render::file_stem;

/// `acme/user/v1/user.proto` → `acme_user_v1_user`.
pub fn namespace_token(file_name: &str) -> String {
    let mut token: String = file_stem(file_name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if token.is_empty() || token.starts_with(|c: char| c.is_ascii_digit()) {
        token.insert(0, '_');
    }
    token
}

pub struct NamespaceResolver<'a> {
    graph: &'a SchemaGraph,
    config: &'a Config,
}

impl<'a> NamespaceResolver<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a Config) -> Self {
        Self { graph, config }
    }

    pub fn namespace(&self, file_name: &str) -> String {
        namespace_token(file_name)
    }

    /// Module specifier used by `from_file`'s generated code to import `target_file`'s messages.
    pub fn import_path(&self, from_file: &str, target_file: &str) -> String {
        if let Some(path) = self.config.well_known.get(target_file) {
            return path.clone();
        }

        let target = format!("{}{}", file_stem(target_file), self.config.message_suffix);
        if let Some(root) = &self.config.import_root {
            return format!("{root}/{target}");
        }
        relative_module_path(from_file, &target)
    }

    /// Fail when two of `files` map to the same namespace token, e.g.
    /// `a/b.proto` and `a_b.proto`.
    pub fn ensure_distinct<'f>(&self, files: impl IntoIterator<Item = &'f str>) -> Result<()> {
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for file in files {
            let namespace = self.namespace(file);
            if let Some(first) = seen.insert(namespace.clone(), file) {
                return Err(CodegenError::NamespaceCollision {
                    namespace,
                    first: first.to_string(),
                    second: file.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether some method of some service in `file` takes or returns a type
    /// declared in `dependency`.
    pub fn is_used(&self, file: &SchemaFile, dependency: &str) -> Result<bool> {
        for service in &file.service {
            for method in &service.method {
                for type_name in [&method.input_type, &method.output_type] {
                    let entry = self.graph.lookup(type_name).ok_or_else(|| {
                        CodegenError::MissingExport {
                            type_name: type_name.clone(),
                            file: file.name.clone(),
                        }
                    })?;
                    if entry.file == dependency {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

/// Relative module specifier from the directory of `from_file` to `target`
/// (a slash-separated path without extension), always `./` or `../` prefixed.
fn relative_module_path(from_file: &str, target: &str) -> String {
    let from_dir: Vec<&str> = match from_file.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target_parts: Vec<&str> = target.split('/').collect();
    let (target_dir, _) = target_parts.split_at(target_parts.len() - 1);

    let common = from_dir
        .iter()
        .zip(target_dir)
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;
    let rest = target_parts[common..].join("/");

    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_identifiers() {
        assert_eq!(namespace_token("acme/user/v1/user.proto"), "acme_user_v1_user");
        assert_eq!(namespace_token("my-api.proto"), "my_api");
        assert_eq!(namespace_token("3d/mesh.proto"), "_3d_mesh");
        assert_eq!(namespace_token("a/b.proto"), namespace_token("a_b.proto"));
    }

    #[test]
    fn colliding_tokens_are_rejected() {
        let graph = SchemaGraph::default();
        let config = Config::default();
        let resolver = NamespaceResolver::new(&graph, &config);

        resolver
            .ensure_distinct(["a/b.proto", "a/c.proto", "google/protobuf/empty.proto"])
            .unwrap();
        let err = resolver.ensure_distinct(["a/b.proto", "a_b.proto"]).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::NamespaceCollision { ref namespace, ref first, ref second }
                if namespace == "a_b" && first == "a/b.proto" && second == "a_b.proto"
        ));
        assert_eq!(
            namespace_token("google/protobuf/empty.proto"),
            "google_protobuf_empty"
        );
    }

    #[test]
    fn relative_paths() {
        assert_eq!(relative_module_path("acme/user.proto", "acme/user"), "./user");
        assert_eq!(relative_module_path("user.proto", "common/types"), "./common/types");
        assert_eq!(
            relative_module_path("acme/user/v1/user.proto", "acme/common/v1/types"),
            "../../common/v1/types"
        );
        assert_eq!(relative_module_path("a/b/c.proto", "d"), "../../d");
    }

    #[test]
    fn import_paths_honor_config() {
        let graph = SchemaGraph::default();
        let mut config = Config::default();
        let resolver = NamespaceResolver::new(&graph, &config);
        assert_eq!(
            resolver.import_path("acme/user.proto", "google/protobuf/timestamp.proto"),
            "@protots/runtime/wkt/timestamp"
        );
        assert_eq!(
            resolver.import_path("acme/user.proto", "acme/common.proto"),
            "./common"
        );

        config.import_root = Some("@gen".into());
        config.message_suffix = "_pb".into();
        let resolver = NamespaceResolver::new(&graph, &config);
        assert_eq!(
            resolver.import_path("acme/user.proto", "acme/common.proto"),
            "@gen/acme/common_pb"
        );
        assert_eq!(
            resolver.import_path("acme/user.proto", "google/protobuf/empty.proto"),
            "@protots/runtime/wkt/empty"
        );
    }
}
