use protots_schema::{FieldType, JsType, SchemaError};

/// Everything that can abort a generation run.
///
/// Generation is a pure function of its input, so every variant points at an
/// inconsistent or unsupported schema; none of them is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("missing export: `{type_name}` (referenced from `{file}`) is not defined by any input file")]
    MissingExport { type_name: String, file: String },

    #[error("malformed map entry `{type_name}`: no {missing} field recorded")]
    MalformedMapEntry {
        type_name: String,
        missing: &'static str,
    },

    #[error("field `{field}` in `{file}` has unsupported type {field_type:?}")]
    UnsupportedFieldType {
        field: String,
        file: String,
        field_type: FieldType,
    },

    #[error("field `{field}` in `{file}`: jstype {js_type:?} does not apply to {field_type:?}")]
    UnsupportedOverride {
        field: String,
        file: String,
        js_type: JsType,
        field_type: FieldType,
    },

    #[error("`{type_name}` is a {actual}, but `{context}` needs a {expected}")]
    KindMismatch {
        type_name: String,
        context: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field `{field}` of `{message}` points at oneof #{index}, which does not exist")]
    InvalidOneofIndex {
        message: String,
        field: String,
        index: usize,
    },

    #[error("`{file}` is listed for generation but missing from the request")]
    UnknownFile { file: String },

    #[error("`{context}` in `{file}` uses `{type_name}` from `{defined_in}`, which `{file}` does not import")]
    UnimportedType {
        context: String,
        file: String,
        type_name: String,
        defined_in: String,
    },

    #[error("`{first}` and `{second}` would both be imported as `{namespace}`")]
    NamespaceCollision {
        namespace: String,
        first: String,
        second: String,
    },

    #[error("`{method}` would generate `{member}` on `{service}Client`, which {owner} already defines")]
    ClientMemberClash {
        service: String,
        method: String,
        member: String,
        owner: String,
    },

    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to write generated text")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T, E = CodegenError> = std::result::Result<T, E>;
