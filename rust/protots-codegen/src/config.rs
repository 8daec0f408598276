//! Generator options, parsed from the plugin parameter string.
//!
//! The parameter is a comma-separated list of `key=value` pairs and bare
//! flags, e.g. `import_root=@gen,keep_case,well_known=google/type/date.proto:@acme/date`.

use std::collections::BTreeMap;

use crate::error::{CodegenError, Result};

pub const DEFAULT_WELL_KNOWN_ROOT: &str = "@protots/runtime/wkt";

/// Standard schema files shipped pre-generated with the runtime package.
pub const WELL_KNOWN_FILES: &[&str] = &[
    "google/protobuf/any.proto",
    "google/protobuf/api.proto",
    "google/protobuf/duration.proto",
    "google/protobuf/empty.proto",
    "google/protobuf/field_mask.proto",
    "google/protobuf/source_context.proto",
    "google/protobuf/struct.proto",
    "google/protobuf/timestamp.proto",
    "google/protobuf/type.proto",
    "google/protobuf/wrappers.proto",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// When set, imports are `<import_root>/<stem><message_suffix>` instead of relative paths.
    pub import_root: Option<String>,
    /// Appended to a schema file's stem to name its message module.
    pub message_suffix: String,
    /// Appended to a schema file's stem to name its service module.
    pub service_suffix: String,
    /// Use field names as declared instead of their JSON names.
    pub keep_case: bool,
    /// Also return message modules from `generate`.
    pub emit_messages: bool,
    /// Schema file → fixed import path.
    pub well_known: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import_root: None,
            message_suffix: String::new(),
            service_suffix: "_service".to_string(),
            keep_case: false,
            emit_messages: false,
            well_known: well_known_table(DEFAULT_WELL_KNOWN_ROOT),
        }
    }
}

fn well_known_table(root: &str) -> BTreeMap<String, String> {
    WELL_KNOWN_FILES
        .iter()
        .map(|file| {
            let stem = file
                .trim_start_matches("google/protobuf/")
                .trim_end_matches(".proto");
            (file.to_string(), format!("{root}/{stem}"))
        })
        .collect()
}

impl Config {
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        let Some(parameter) = parameter else {
            return Ok(config);
        };

        // Overrides are applied after the root so their order in the string doesn't matter.
        let mut overrides = Vec::new();

        for item in parameter.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (item, None),
            };
            let invalid = |reason: &str| CodegenError::InvalidParameter {
                parameter: item.to_string(),
                reason: reason.to_string(),
            };

            match (key, value) {
                ("import_root", Some(v)) if !v.is_empty() => {
                    config.import_root = Some(v.trim_end_matches('/').to_string());
                }
                ("message_suffix", Some(v)) => config.message_suffix = v.to_string(),
                ("service_suffix", Some(v)) if !v.is_empty() => {
                    config.service_suffix = v.to_string();
                }
                ("well_known_root", Some(v)) if !v.is_empty() => {
                    config.well_known = well_known_table(v.trim_end_matches('/'));
                }
                ("well_known", Some(v)) => {
                    let (file, path) = v
                        .split_once(':')
                        .filter(|(f, p)| !f.is_empty() && !p.is_empty())
                        .ok_or_else(|| invalid("expected `<file>:<import path>`"))?;
                    overrides.push((file.to_string(), path.to_string()));
                }
                ("keep_case", None) => config.keep_case = true,
                ("emit_messages", None) => config.emit_messages = true,
                (
                    "import_root" | "message_suffix" | "service_suffix" | "well_known_root"
                    | "well_known",
                    _,
                ) => return Err(invalid("expected a non-empty value")),
                ("keep_case" | "emit_messages", Some(_)) => {
                    return Err(invalid("flag takes no value"));
                }
                _ => return Err(invalid("unknown option")),
            }
        }

        config.well_known.extend(overrides);
        Ok(config)
    }
}
