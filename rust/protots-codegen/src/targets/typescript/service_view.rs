//! Rendering-ready views of services, methods and imports.
//!
//! Views are recomputed on every access and hold only borrowed schema data
//! plus the resolved type expressions.

use std::collections::BTreeMap;

use protots_schema::{MethodDef, SchemaFile, SchemaGraph, ServiceDef};

use super::namespace::NamespaceResolver;
use super::types::{Scope, TypeResolver};
use crate::error::{CodegenError, Result};
use crate::render::{call_identifier, rpc_method};

/// Members every generated client class declares for itself.
const CLIENT_MEMBERS: &[&str] = &["constructor", "serviceHost", "transport", "call", "callBatch"];

/// One `import * as <namespace> from "<path>"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub namespace: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct MethodView<'a> {
    /// `getUser`
    pub call_name: String,
    /// `GetUser`
    pub declared_name: &'a str,
    pub service_name: &'a str,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub request_type: String,
    pub response_type: String,
}

impl MethodView<'_> {
    pub fn is_streaming(&self) -> bool {
        self.client_streaming || self.server_streaming
    }

    /// The JSON-RPC `method` string, `Service.Method`.
    pub fn rpc_method(&self) -> String {
        rpc_method(self.service_name, self.declared_name)
    }

    /// Name of the per-method type alias, `ServiceMethod`.
    pub fn alias_name(&self) -> String {
        format!("{}{}", self.service_name, self.declared_name)
    }
}

pub struct ServiceView<'a> {
    resolver: TypeResolver<'a>,
    file: &'a SchemaFile,
    service: &'a ServiceDef,
}

impl<'a> ServiceView<'a> {
    pub fn new(graph: &'a SchemaGraph, file: &'a SchemaFile, service: &'a ServiceDef) -> Self {
        Self {
            resolver: TypeResolver::new(graph),
            file,
            service,
        }
    }

    pub fn name(&self) -> &'a str {
        &self.service.name
    }

    /// `acme.UserService`, or just the service name outside a package.
    pub fn full_name(&self) -> String {
        match self.file.package() {
            "" => self.service.name.clone(),
            package => format!("{package}.{}", self.service.name),
        }
    }

    /// Resolved methods in declared order.
    ///
    /// Fails when the client stubs of two methods, or a stub and one of the
    /// client's own members, would share a name (`Call` → `call`).
    pub fn methods(&self) -> Result<Vec<MethodView<'a>>> {
        let methods = self
            .service
            .method
            .iter()
            .map(|method| self.method(method))
            .collect::<Result<Vec<_>>>()?;

        let mut taken: BTreeMap<String, String> = CLIENT_MEMBERS
            .iter()
            .map(|member| (member.to_string(), "the client".to_string()))
            .collect();
        for method in methods.iter().filter(|m| !m.is_streaming()) {
            for member in [method.call_name.clone(), format!("{}Batch", method.call_name)] {
                if let Some(owner) = taken.get(&member) {
                    return Err(CodegenError::ClientMemberClash {
                        service: self.service.name.clone(),
                        method: method.rpc_method(),
                        member,
                        owner: owner.clone(),
                    });
                }
                taken.insert(member, format!("`{}`", method.rpc_method()));
            }
        }
        Ok(methods)
    }

    fn method(&self, method: &'a MethodDef) -> Result<MethodView<'a>> {
        let context = rpc_method(&self.service.name, &method.name);
        let request_type = self.payload(&method.input_type, &context)?;
        let response_type = self.payload(&method.output_type, &context)?;

        Ok(MethodView {
            call_name: call_identifier(&method.name),
            declared_name: &method.name,
            service_name: &self.service.name,
            client_streaming: method.is_client_streaming(),
            server_streaming: method.is_server_streaming(),
            request_type,
            response_type,
        })
    }

    fn payload(&self, type_name: &str, context: &str) -> Result<String> {
        let (expr, _) = self
            .resolver
            .message(type_name, self.file, Scope::Imported, context)?;
        Ok(expr)
    }
}

/// The host file's own module first, then every dependency some method
/// actually references, in declaration order.
pub fn imports(namespaces: &NamespaceResolver<'_>, file: &SchemaFile) -> Result<Vec<ImportRef>> {
    let mut files = vec![file.name.as_str()];
    for dependency in &file.dependency {
        if namespaces.is_used(file, dependency)? {
            files.push(dependency.as_str());
        }
    }
    namespaces.ensure_distinct(files.iter().copied())?;

    Ok(files
        .into_iter()
        .map(|target| ImportRef {
            namespace: namespaces.namespace(target),
            path: namespaces.import_path(&file.name, target),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use protots_schema::CodeGeneratorRequest;

    fn request() -> CodeGeneratorRequest {
        CodeGeneratorRequest::from_json(
            r#"{
                "fileToGenerate": ["acme/user.proto"],
                "protoFile": [
                    {
                        "name": "google/protobuf/empty.proto",
                        "package": "google.protobuf",
                        "syntax": "proto3",
                        "messageType": [{ "name": "Empty" }]
                    },
                    {
                        "name": "acme/common.proto",
                        "package": "acme",
                        "syntax": "proto3",
                        "messageType": [{ "name": "PageToken" }]
                    },
                    {
                        "name": "acme/deep.proto",
                        "package": "acme",
                        "syntax": "proto3",
                        "messageType": [{ "name": "Hidden" }]
                    },
                    {
                        "name": "acme/user.proto",
                        "package": "acme",
                        "syntax": "proto3",
                        "dependency": ["acme/common.proto", "google/protobuf/empty.proto"],
                        "messageType": [
                            { "name": "GetUserRequest" },
                            { "name": "User" }
                        ],
                        "service": [{
                            "name": "UserService",
                            "method": [
                                { "name": "GetUser", "inputType": ".acme.GetUserRequest", "outputType": ".acme.User" },
                                { "name": "Ping", "inputType": ".google.protobuf.Empty", "outputType": ".google.protobuf.Empty" },
                                { "name": "WatchUsers", "inputType": ".acme.GetUserRequest", "outputType": ".acme.User", "serverStreaming": true }
                            ]
                        }]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn method_views() {
        let request = request();
        let graph = SchemaGraph::build(&request.proto_file);
        let file = request.file("acme/user.proto").unwrap();
        let view = ServiceView::new(&graph, file, &file.service[0]);

        assert_eq!(view.name(), "UserService");
        assert_eq!(view.full_name(), "acme.UserService");

        let methods = view.methods().unwrap();
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[0].call_name, "getUser");
        assert_eq!(methods[0].rpc_method(), "UserService.GetUser");
        assert_eq!(methods[0].alias_name(), "UserServiceGetUser");
        assert_eq!(methods[0].request_type, "acme_user.GetUserRequest");
        assert_eq!(methods[1].response_type, "google_protobuf_empty.Empty");
        assert!(!methods[1].is_streaming());
        assert!(methods[2].is_streaming());
    }

    #[test]
    fn unused_dependencies_are_not_imported() {
        let request = request();
        let graph = SchemaGraph::build(&request.proto_file);
        let config = Config::default();
        let namespaces = NamespaceResolver::new(&graph, &config);
        let file = request.file("acme/user.proto").unwrap();

        let refs = imports(&namespaces, file).unwrap();
        assert_eq!(
            refs,
            vec![
                ImportRef {
                    namespace: "acme_user".into(),
                    path: "./user".into(),
                },
                ImportRef {
                    namespace: "google_protobuf_empty".into(),
                    path: "@protots/runtime/wkt/empty".into(),
                },
            ]
        );
    }

    #[test]
    fn types_outside_direct_dependencies_are_rejected() {
        let mut request = request();
        let host = request
            .proto_file
            .iter_mut()
            .find(|f| f.name == "acme/user.proto")
            .unwrap();
        host.service[0].method[0].output_type = ".acme.Hidden".into();

        let graph = SchemaGraph::build(&request.proto_file);
        let file = request.file("acme/user.proto").unwrap();
        let err = ServiceView::new(&graph, file, &file.service[0])
            .methods()
            .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnimportedType { ref defined_in, .. } if defined_in == "acme/deep.proto"
        ));
    }

    fn service_with(methods: &str) -> CodeGeneratorRequest {
        CodeGeneratorRequest::from_json(&format!(
            r#"{{
                "protoFile": [{{
                    "name": "svc.proto",
                    "package": "svc",
                    "syntax": "proto3",
                    "messageType": [{{ "name": "M" }}],
                    "service": [{{ "name": "S", "method": {methods} }}]
                }}]
            }}"#
        ))
        .unwrap()
    }

    fn clash(methods: &str) -> Option<(String, String)> {
        let request = service_with(methods);
        let graph = SchemaGraph::build(&request.proto_file);
        let file = &request.proto_file[0];
        match ServiceView::new(&graph, file, &file.service[0]).methods() {
            Ok(_) => None,
            Err(CodegenError::ClientMemberClash { member, owner, .. }) => Some((member, owner)),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stubs_may_not_shadow_client_members() {
        assert_eq!(
            clash(r#"[{ "name": "Call", "inputType": ".svc.M", "outputType": ".svc.M" }]"#),
            Some(("call".into(), "the client".into()))
        );
        assert_eq!(
            clash(r#"[{ "name": "Transport", "inputType": ".svc.M", "outputType": ".svc.M" }]"#),
            Some(("transport".into(), "the client".into()))
        );
        assert_eq!(
            clash(
                r#"[
                    { "name": "Get", "inputType": ".svc.M", "outputType": ".svc.M" },
                    { "name": "GetBatch", "inputType": ".svc.M", "outputType": ".svc.M" }
                ]"#
            ),
            Some(("getBatch".into(), "`S.Get`".into()))
        );
    }

    #[test]
    fn streaming_methods_have_no_stub_to_clash() {
        assert_eq!(
            clash(
                r#"[{ "name": "Call", "inputType": ".svc.M", "outputType": ".svc.M", "clientStreaming": true }]"#
            ),
            None
        );
    }

    fn lookalikes(method_input: &str) -> CodeGeneratorRequest {
        CodeGeneratorRequest::from_json(&format!(
            r#"{{
                "protoFile": [
                    {{ "name": "a_b.proto", "package": "ab", "syntax": "proto3", "messageType": [{{ "name": "Flat" }}] }},
                    {{
                        "name": "a/b.proto",
                        "package": "a",
                        "syntax": "proto3",
                        "dependency": ["a_b.proto"],
                        "messageType": [{{ "name": "Nested" }}],
                        "service": [{{
                            "name": "S",
                            "method": [{{ "name": "Get", "inputType": "{method_input}", "outputType": ".a.Nested" }}]
                        }}]
                    }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn lookalike_dependency_is_only_imported_when_used() {
        let config = Config::default();

        let request = lookalikes(".a.Nested");
        let graph = SchemaGraph::build(&request.proto_file);
        let file = request.file("a/b.proto").unwrap();
        let refs = imports(&NamespaceResolver::new(&graph, &config), file).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "./b");

        let request = lookalikes(".ab.Flat");
        let graph = SchemaGraph::build(&request.proto_file);
        let file = request.file("a/b.proto").unwrap();
        let err = imports(&NamespaceResolver::new(&graph, &config), file).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::NamespaceCollision { ref namespace, .. } if namespace == "a_b"
        ));
    }
}
