#![deny(unsafe_code)]

//! Compiled protobuf schema model for protots.
//!
//! The types in this crate mirror the JSON rendering of protobuf descriptors
//! (`FileDescriptorProto` and friends) as produced by `protoc` / `buf` with
//! camelCase keys. Only the subset the generator needs is modelled.
//!
//! Enumerated descriptor values (`TYPE_INT32`, `LABEL_REPEATED`, `JS_STRING`,
//! `proto3`) are kept as raw strings when deserializing and parsed on access,
//! so an unknown value surfaces as a [`SchemaError`] at the point of use
//! instead of being silently defaulted.
//!
//! [`SchemaGraph`] indexes every message and enum of a request by its
//! fully-qualified name, so cross-file references can be resolved without
//! walking the file trees again.

mod graph;

pub use graph::{MapEntry, SchemaGraph, TypeEntry, TypeKind};

use facet::Facet;

/// Errors raised when a descriptor carries a value this crate does not understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown field type `{0}`")]
    UnknownFieldType(String),

    #[error("unknown field label `{0}`")]
    UnknownLabel(String),

    #[error("unknown jstype `{0}`")]
    UnknownJsType(String),

    #[error("unsupported syntax `{0}`")]
    UnsupportedSyntax(String),

    #[error("invalid descriptor JSON: {0}")]
    InvalidJson(String),
}

/// The request handed to the generator: the files to generate plus every
/// file they (transitively) depend on.
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct CodeGeneratorRequest {
    #[facet(default)]
    pub file_to_generate: Vec<String>,
    /// Plugin parameter string, e.g. `import_root=@gen,keep_case`.
    #[facet(default)]
    pub parameter: Option<String>,
    /// All files in dependency order (dependencies before dependents).
    #[facet(default)]
    pub proto_file: Vec<SchemaFile>,
}

impl CodeGeneratorRequest {
    /// Parse a request from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        facet_json::from_str(text).map_err(|e| SchemaError::InvalidJson(e.to_string()))
    }

    pub fn file(&self, name: &str) -> Option<&SchemaFile> {
        self.proto_file.iter().find(|f| f.name == name)
    }
}

/// What the generator hands back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct CodeGeneratorResponse {
    /// Set when generation failed; `file` is empty in that case.
    #[facet(default)]
    pub error: Option<String>,
    #[facet(default)]
    pub file: Vec<GeneratedFile>,
}

/// A single generated file.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// One compiled `.proto` file.
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct SchemaFile {
    /// Path relative to the include root, e.g. `acme/user/v1/user.proto`.
    pub name: String,
    #[facet(default)]
    pub package: Option<String>,
    /// Imported files, in declaration order.
    #[facet(default)]
    pub dependency: Vec<String>,
    #[facet(default)]
    pub message_type: Vec<MessageDef>,
    #[facet(default)]
    pub enum_type: Vec<EnumDef>,
    #[facet(default)]
    pub service: Vec<ServiceDef>,
    #[facet(default)]
    pub extension: Vec<FieldDef>,
    #[facet(default)]
    pub syntax: Option<String>,
}

impl SchemaFile {
    pub fn package(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }

    pub fn syntax(&self) -> Result<Syntax, SchemaError> {
        Syntax::from_descriptor(self.syntax.as_deref().unwrap_or(""))
    }
}

/// A message definition, possibly with nested definitions.
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct MessageDef {
    pub name: String,
    #[facet(default)]
    pub field: Vec<FieldDef>,
    #[facet(default)]
    #[facet(recursive_type)]
    pub nested_type: Vec<MessageDef>,
    #[facet(default)]
    pub enum_type: Vec<EnumDef>,
    #[facet(default)]
    pub oneof_decl: Vec<OneofGroup>,
    #[facet(default)]
    pub extension: Vec<FieldDef>,
    #[facet(default)]
    pub options: Option<MessageOptions>,
}

impl MessageDef {
    /// Synthetic `FooEntry` messages protoc creates for `map<K, V>` fields.
    pub fn is_map_entry(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.map_entry)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "camelCase")]
pub struct MessageOptions {
    #[facet(default)]
    pub map_entry: Option<bool>,
}

/// A field of a message, or an extension when `extendee` is set.
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[facet(default)]
    pub number: i32,
    #[facet(default)]
    pub label: Option<String>,
    #[facet(rename = "type")]
    pub kind: String,
    /// Fully-qualified referenced type with a leading dot, e.g. `.acme.User`.
    #[facet(default)]
    pub type_name: Option<String>,
    #[facet(default)]
    pub extendee: Option<String>,
    #[facet(default)]
    pub json_name: Option<String>,
    #[facet(default)]
    pub oneof_index: Option<i32>,
    #[facet(default)]
    pub proto3_optional: Option<bool>,
    #[facet(default)]
    pub options: Option<FieldOptions>,
}

impl FieldDef {
    pub fn field_type(&self) -> Result<FieldType, SchemaError> {
        FieldType::from_descriptor(&self.kind)
    }

    pub fn label(&self) -> Result<Label, SchemaError> {
        match self.label.as_deref() {
            None => Ok(Label::Optional),
            Some(raw) => Label::from_descriptor(raw),
        }
    }

    /// The representation override attached to this field (`JS_NORMAL` when absent).
    pub fn js_type(&self) -> Result<JsType, SchemaError> {
        match self.options.as_ref().and_then(|o| o.jstype.as_deref()) {
            None => Ok(JsType::Normal),
            Some(raw) => JsType::from_descriptor(raw),
        }
    }

    pub fn oneof_index(&self) -> Option<usize> {
        self.oneof_index.and_then(|i| usize::try_from(i).ok())
    }

    pub fn is_proto3_optional(&self) -> bool {
        self.proto3_optional.unwrap_or(false)
    }

    /// Index of the real (non-synthetic) oneof this field belongs to.
    ///
    /// proto3 `optional` fields sit in a synthetic single-member oneof that
    /// is not a union at all.
    pub fn real_oneof_index(&self) -> Option<usize> {
        if self.is_proto3_optional() {
            None
        } else {
            self.oneof_index()
        }
    }
}

#[derive(Debug, Clone, Default, Facet)]
pub struct FieldOptions {
    #[facet(default)]
    pub jstype: Option<String>,
}

#[derive(Debug, Clone, Facet)]
pub struct OneofGroup {
    pub name: String,
}

#[derive(Debug, Clone, Facet)]
pub struct EnumDef {
    pub name: String,
    #[facet(default)]
    pub value: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, Facet)]
pub struct EnumValueDef {
    pub name: String,
    #[facet(default)]
    pub number: i32,
}

#[derive(Debug, Clone, Facet)]
pub struct ServiceDef {
    pub name: String,
    #[facet(default)]
    pub method: Vec<MethodDef>,
}

#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct MethodDef {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    #[facet(default)]
    pub client_streaming: Option<bool>,
    #[facet(default)]
    pub server_streaming: Option<bool>,
}

impl MethodDef {
    pub fn is_client_streaming(&self) -> bool {
        self.client_streaming.unwrap_or(false)
    }

    pub fn is_server_streaming(&self) -> bool {
        self.server_streaming.unwrap_or(false)
    }
}

/// Wire type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl FieldType {
    pub fn from_descriptor(raw: &str) -> Result<Self, SchemaError> {
        Ok(match raw {
            "TYPE_DOUBLE" => Self::Double,
            "TYPE_FLOAT" => Self::Float,
            "TYPE_INT64" => Self::Int64,
            "TYPE_UINT64" => Self::Uint64,
            "TYPE_INT32" => Self::Int32,
            "TYPE_FIXED64" => Self::Fixed64,
            "TYPE_FIXED32" => Self::Fixed32,
            "TYPE_BOOL" => Self::Bool,
            "TYPE_STRING" => Self::String,
            "TYPE_GROUP" => Self::Group,
            "TYPE_MESSAGE" => Self::Message,
            "TYPE_BYTES" => Self::Bytes,
            "TYPE_UINT32" => Self::Uint32,
            "TYPE_ENUM" => Self::Enum,
            "TYPE_SFIXED32" => Self::Sfixed32,
            "TYPE_SFIXED64" => Self::Sfixed64,
            "TYPE_SINT32" => Self::Sint32,
            "TYPE_SINT64" => Self::Sint64,
            other => return Err(SchemaError::UnknownFieldType(other.to_string())),
        })
    }

    /// Integer wire types: the ones a `jstype` override may apply to.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int64
                | Self::Uint64
                | Self::Int32
                | Self::Fixed64
                | Self::Fixed32
                | Self::Uint32
                | Self::Sfixed32
                | Self::Sfixed64
                | Self::Sint32
                | Self::Sint64
        )
    }

    /// 64-bit integers, which JSON carries as strings by default.
    pub fn is_64_bit(self) -> bool {
        matches!(
            self,
            Self::Int64 | Self::Uint64 | Self::Fixed64 | Self::Sfixed64 | Self::Sint64
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

impl Label {
    pub fn from_descriptor(raw: &str) -> Result<Self, SchemaError> {
        match raw {
            "LABEL_OPTIONAL" => Ok(Self::Optional),
            "LABEL_REQUIRED" => Ok(Self::Required),
            "LABEL_REPEATED" => Ok(Self::Repeated),
            other => Err(SchemaError::UnknownLabel(other.to_string())),
        }
    }
}

/// Per-field representation override for integer-like fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsType {
    #[default]
    Normal,
    String,
    Number,
}

impl JsType {
    pub fn from_descriptor(raw: &str) -> Result<Self, SchemaError> {
        match raw {
            "JS_NORMAL" => Ok(Self::Normal),
            "JS_STRING" => Ok(Self::String),
            "JS_NUMBER" => Ok(Self::Number),
            other => Err(SchemaError::UnknownJsType(other.to_string())),
        }
    }
}

/// Schema dialect of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// The legacy dialect with `required` fields and explicit presence everywhere.
    Proto2,
    Proto3,
}

impl Syntax {
    /// protoc leaves `syntax` empty for proto2 files.
    pub fn from_descriptor(raw: &str) -> Result<Self, SchemaError> {
        match raw {
            "" | "proto2" => Ok(Self::Proto2),
            "proto3" => Ok(Self::Proto3),
            other => Err(SchemaError::UnsupportedSyntax(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_descriptor_json_with_defaults() {
        let request = CodeGeneratorRequest::from_json(
            r#"{
                "fileToGenerate": ["a.proto"],
                "protoFile": [{
                    "name": "a.proto",
                    "package": "a",
                    "syntax": "proto3",
                    "messageType": [{
                        "name": "Thing",
                        "field": [{
                            "name": "id",
                            "number": 1,
                            "label": "LABEL_OPTIONAL",
                            "type": "TYPE_INT64",
                            "jsonName": "id",
                            "options": { "jstype": "JS_NUMBER" }
                        }]
                    }]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(request.file_to_generate, vec!["a.proto".to_string()]);
        assert!(request.parameter.is_none());
        let file = request.file("a.proto").unwrap();
        assert_eq!(file.package(), "a");
        assert_eq!(file.syntax().unwrap(), Syntax::Proto3);
        assert!(file.service.is_empty());

        let field = &file.message_type[0].field[0];
        assert_eq!(field.field_type().unwrap(), FieldType::Int64);
        assert_eq!(field.label().unwrap(), Label::Optional);
        assert_eq!(field.js_type().unwrap(), JsType::Number);
        assert_eq!(field.oneof_index(), None);
        assert!(!file.message_type[0].is_map_entry());
    }

    #[test]
    fn unknown_descriptor_values_are_errors() {
        assert_eq!(
            FieldType::from_descriptor("TYPE_VARINT"),
            Err(SchemaError::UnknownFieldType("TYPE_VARINT".into()))
        );
        assert!(Label::from_descriptor("LABEL_MAYBE").is_err());
        assert!(JsType::from_descriptor("JS_BIGINT").is_err());
        assert_eq!(
            Syntax::from_descriptor("editions"),
            Err(SchemaError::UnsupportedSyntax("editions".into()))
        );
    }

    #[test]
    fn missing_syntax_means_proto2() {
        assert_eq!(Syntax::from_descriptor("").unwrap(), Syntax::Proto2);
    }

    #[test]
    fn integer_classification() {
        assert!(FieldType::Sint64.is_integer());
        assert!(FieldType::Sint64.is_64_bit());
        assert!(FieldType::Fixed32.is_integer());
        assert!(!FieldType::Fixed32.is_64_bit());
        assert!(!FieldType::Double.is_integer());
        assert!(!FieldType::String.is_integer());
    }

    #[test]
    fn proto3_optional_is_not_a_real_oneof() {
        let field = FieldDef {
            name: "nickname".into(),
            number: 3,
            label: Some("LABEL_OPTIONAL".into()),
            kind: "TYPE_STRING".into(),
            type_name: None,
            extendee: None,
            json_name: None,
            oneof_index: Some(0),
            proto3_optional: Some(true),
            options: None,
        };
        assert_eq!(field.oneof_index(), Some(0));
        assert_eq!(field.real_oneof_index(), None);
    }
}
